//! Components, their client-callable methods, and how an incoming invocation finds and runs one.

use crate::{
	decode::{Arg, Args, DecodeError, DecoderRegistry, ParamType},
	node::DisabledUpdateMode,
	tree::StateTree,
	ui::{JsInvocation, Ui, PROMISE_CALLBACK_NAME},
	value::{NodeId, Redacted, Value},
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use serde_json::Value as Json;
use thiserror::Error;
use tracing::{error, instrument, trace};

/// What a method handler may fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type Handler = Box<dyn FnMut(&mut MethodContext<'_>, Args) -> Result<Value, HandlerError>>;

/// How a method is exposed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
	/// Callable through `this.$server`.
	ClientCallable,
	/// Callable from template event bindings.
	EventHandler,
	/// Known to the server only. Invoking it from the client is an error.
	Private,
}

/// What a handler sees of its surroundings.
pub struct MethodContext<'a> {
	pub tree: &'a mut StateTree,
	/// The component that declares the running method.
	pub component: ComponentId,
	pub node: NodeId,
	pending_js: &'a mut Vec<JsInvocation>,
}
impl<'a> MethodContext<'a> {
	/// Queues `expression` to run on the client, with `this` bound to the component's element.
	pub fn execute_js(&mut self, expression: impl Into<String>, mut parameters: Vec<Value>) {
		parameters.push(Value::Node(self.node));
		self.pending_js.push(JsInvocation {
			expression: expression.into(),
			parameters,
		});
	}
}

/// A named method on a component.
///
/// Parameters are positional. With [`varargs`](`ClientMethod::varargs`), the trailing wire arguments are collected into one [`Arg::Array`](`crate::decode::Arg::Array`).
pub struct ClientMethod {
	name: String,
	publish: Publish,
	params: Vec<ParamType>,
	varargs: Option<ParamType>,
	disabled_mode: DisabledUpdateMode,
	allow_inert: bool,
	handler: Handler,
}
impl Debug for ClientMethod {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientMethod")
			.field("name", &self.name)
			.field("publish", &self.publish)
			.field("params", &self.params)
			.field("varargs", &self.varargs)
			.field("disabled_mode", &self.disabled_mode)
			.field("allow_inert", &self.allow_inert)
			.finish()
	}
}
impl ClientMethod {
	pub fn new(name: &str, publish: Publish, handler: impl FnMut(&mut MethodContext<'_>, Args) -> Result<Value, HandlerError> + 'static) -> Self {
		Self {
			name: name.to_owned(),
			publish,
			params: Vec::new(),
			varargs: None,
			disabled_mode: DisabledUpdateMode::default(),
			allow_inert: false,
			handler: Box::new(handler),
		}
	}

	pub fn client_callable(name: &str, handler: impl FnMut(&mut MethodContext<'_>, Args) -> Result<Value, HandlerError> + 'static) -> Self {
		Self::new(name, Publish::ClientCallable, handler)
	}

	pub fn event_handler(name: &str, handler: impl FnMut(&mut MethodContext<'_>, Args) -> Result<Value, HandlerError> + 'static) -> Self {
		Self::new(name, Publish::EventHandler, handler)
	}

	pub fn private(name: &str, handler: impl FnMut(&mut MethodContext<'_>, Args) -> Result<Value, HandlerError> + 'static) -> Self {
		Self::new(name, Publish::Private, handler)
	}

	/// Appends a positional parameter.
	#[must_use]
	pub fn param(mut self, ty: ParamType) -> Self {
		self.params.push(ty);
		self
	}

	/// Collects trailing arguments of type `element`.
	#[must_use]
	pub fn varargs(mut self, element: ParamType) -> Self {
		self.varargs = Some(element);
		self
	}

	#[must_use]
	pub fn disabled_mode(mut self, mode: DisabledUpdateMode) -> Self {
		self.disabled_mode = mode;
		self
	}

	/// Lets the client invoke this method while the node is inert.
	#[must_use]
	pub fn allow_inert(mut self) -> Self {
		self.allow_inert = true;
		self
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn publish(&self) -> Publish {
		self.publish
	}

	#[must_use]
	pub fn get_disabled_mode(&self) -> DisabledUpdateMode {
		self.disabled_mode
	}

	#[must_use]
	pub fn allows_inert(&self) -> bool {
		self.allow_inert
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

/// Server-side logic bound to one node.
///
/// A composite wraps its content component on the same node. Method lookup starts at the composite and falls through to the content.
#[derive(Debug)]
pub struct Component {
	node: NodeId,
	content: Option<ComponentId>,
	methods: Vec<ClientMethod>,
}
impl Component {
	#[must_use]
	pub fn node(&self) -> NodeId {
		self.node
	}

	#[must_use]
	pub fn content(&self) -> Option<ComponentId> {
		self.content
	}

	pub fn methods(&self) -> impl Iterator<Item = &ClientMethod> {
		self.methods.iter()
	}
}

#[derive(Debug, Default)]
pub struct ComponentRegistry {
	components: HashMap<ComponentId, Component>,
	/// The outermost component of each node.
	by_node: HashMap<NodeId, ComponentId>,
	next: u32,
}
impl ComponentRegistry {
	#[must_use]
	pub fn get(&self, id: ComponentId) -> Option<&Component> {
		self.components.get(&id)
	}

	/// The outermost component bound to `node`.
	#[must_use]
	pub fn for_node(&self, node: NodeId) -> Option<ComponentId> {
		self.by_node.get(&node).copied()
	}

	pub(crate) fn insert(&mut self, node: NodeId, content: Option<ComponentId>, methods: Vec<ClientMethod>) -> ComponentId {
		let id = ComponentId(self.next);
		self.next += 1;
		self.components.insert(id, Component { node, content, methods });
		self.by_node.insert(node, id);
		id
	}

	pub(crate) fn remove_node(&mut self, node: NodeId) {
		self.by_node.remove(&node);
		self.components.retain(|_, component| component.node != node);
	}

	/// Finds the single published method `name`, searching `target` and then the components it wraps.
	///
	/// # Errors
	///
	/// Iff there is no such method, it is [`Publish::Private`], or one component publishes it more than once.
	pub fn resolve(&self, target: ComponentId, name: &str) -> Result<(ComponentId, &ClientMethod), DispatchError> {
		let mut current = target;
		loop {
			let component = self.components.get(&current).ok_or(DispatchError::UnknownComponent(current))?;
			let named: Vec<&ClientMethod> = component.methods.iter().filter(|method| method.name == name).collect();
			let published: Vec<&ClientMethod> = named.iter().copied().filter(|method| method.publish != Publish::Private).collect();

			match (published.as_slice(), named.is_empty()) {
				([method], _) => return Ok((current, *method)),
				([], true) => match component.content {
					Some(content) => current = content,
					None => {
						return Err(DispatchError::NoSuchMethod {
							component: target,
							method: name.to_owned(),
						})
					}
				},
				([], false) => return Err(DispatchError::NotPublished { method: name.to_owned() }),
				(published, _) => {
					return Err(DispatchError::Ambiguous {
						method: name.to_owned(),
						count: published.len(),
					})
				}
			}
		}
	}
}

#[derive(Debug, Error)]
pub enum DispatchError {
	#[error("{0:?} is not a registered component")]
	UnknownComponent(ComponentId),
	#[error("no component is bound to {0}")]
	NoComponent(NodeId),
	#[error("no method `{method}` on {component:?} or the components it wraps")]
	NoSuchMethod { component: ComponentId, method: String },
	#[error("method `{method}` is not published to the client")]
	NotPublished { method: String },
	#[error("there may be only one published method named `{method}`, found {count}")]
	Ambiguous { method: String, count: usize },
	#[error("method `{method}` takes {expected} argument(s) but received {received}")]
	ArgumentCount { method: String, expected: String, received: usize },
	#[error("argument {index} of `{method}`: {source}")]
	Argument {
		method: String,
		index: usize,
		#[source]
		source: DecodeError,
	},
	#[error("`{method}` failed: {source}")]
	Invocation {
		method: String,
		#[source]
		source: HandlerError,
	},
}

/// Decodes `wire` against the parameters of `method`.
fn decode_args(decoders: &DecoderRegistry, method: &ClientMethod, wire: &[Json]) -> Result<Args, DispatchError> {
	let fixed = method.params.len();
	let count_matches = match method.varargs {
		None => wire.len() == fixed,
		Some(_) => wire.len() >= fixed,
	};
	if !count_matches {
		return Err(DispatchError::ArgumentCount {
			method: method.name.clone(),
			expected: if method.varargs.is_some() { format!("at least {}", fixed) } else { fixed.to_string() },
			received: wire.len(),
		});
	}

	let argument_error = |index: usize| {
		let method = method.name.clone();
		move |source| DispatchError::Argument { method, index, source }
	};

	let mut decoded = Vec::with_capacity(fixed + 1);
	for (index, (value, ty)) in wire.iter().zip(&method.params).enumerate() {
		decoded.push(decoders.decode(value, ty).map_err(argument_error(index))?);
	}

	if let Some(element) = &method.varargs {
		let rest = &wire[fixed..];
		let varargs = match rest {
			// An array in the last position is the whole variable argument list.
			[array] if array.is_array() => decoders.decode_elements(array, &ParamType::array(element.clone()), element),
			_ => rest
				.iter()
				.enumerate()
				.map(|(index, value)| {
					decoders.decode(value, element).map_err(|source| DecodeError::Element {
						index,
						source: Box::new(source),
					})
				})
				.collect::<Result<Vec<_>, _>>()
				.map(Arg::Array),
		};
		decoded.push(varargs.map_err(argument_error(fixed))?);
	}

	Ok(Args::new(decoded))
}

impl Ui {
	/// Binds a new component with `methods` to `node`.
	pub fn add_component(&mut self, node: NodeId, methods: Vec<ClientMethod>) -> ComponentId {
		self.components.insert(node, None, methods)
	}

	/// Binds a composite that wraps `content` to the same node.
	///
	/// # Panics
	///
	/// Iff `content` is not registered.
	#[track_caller]
	pub fn add_composite(&mut self, content: ComponentId, methods: Vec<ClientMethod>) -> ComponentId {
		let node = self
			.components
			.get(content)
			.unwrap_or_else(|| panic!("{:?} is not a registered component.", content))
			.node;
		self.components.insert(node, Some(content), methods)
	}

	/// Resolves `method` on `target`, decodes `args` for it and runs it.
	///
	/// With a `promise`, the outcome is reported back to the client through a queued [`JsInvocation`],
	/// which carries the target's node as context.
	///
	/// # Errors
	///
	/// Iff resolution or decoding fails, in which case nothing ran, or the handler fails.
	#[instrument(skip(self, args), fields(args = ?Redacted(args)))]
	pub fn invoke_method(&mut self, target: ComponentId, method: &str, args: &[Json], promise: Option<u32>) -> Result<Value, DispatchError> {
		let (owner, _) = self.components.resolve(target, method)?;
		let target_node = self.components.get(target).map(Component::node).ok_or(DispatchError::UnknownComponent(target))?;

		let Self {
			tree,
			components,
			decoders,
			pending_js,
			..
		} = self;
		let component = components.components.get_mut(&owner).ok_or(DispatchError::UnknownComponent(owner))?;
		let node = component.node;
		let client_method = component
			.methods
			.iter_mut()
			.find(|candidate| candidate.name == method && candidate.publish != Publish::Private)
			.ok_or_else(|| DispatchError::NoSuchMethod {
				component: target,
				method: method.to_owned(),
			})?;

		let decoded = decode_args(decoders, client_method, args)?;
		trace!(decoded = ?Redacted(&decoded), "Arguments decoded.");

		let mut context = MethodContext {
			tree,
			component: owner,
			node,
			pending_js,
		};
		match ((client_method.handler)(&mut context, decoded), promise) {
			(Ok(value), Some(promise)) => {
				pending_js.push(JsInvocation {
					expression: format!("this.$server['{}']($0, true, $1)", PROMISE_CALLBACK_NAME),
					parameters: vec![Value::Int(promise.into()), value.clone(), Value::Node(target_node)],
				});
				Ok(value)
			}
			(Ok(value), None) => Ok(value),
			(Err(source), promise) => {
				error!(%source, "Client-callable method failed.");
				if let Some(promise) = promise {
					pending_js.push(JsInvocation {
						expression: format!("this.$server['{}']($0, false)", PROMISE_CALLBACK_NAME),
						parameters: vec![Value::Int(promise.into()), Value::Node(target_node)],
					});
				}
				Err(DispatchError::Invocation {
					method: method.to_owned(),
					source,
				})
			}
		}
	}
}
