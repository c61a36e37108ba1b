//! The per-session aggregate that ties the state tree to its server-side registries.

use crate::{
	attach::AttachExistingElementFeature,
	change::NodeChange,
	decode::DecoderRegistry,
	dispatch::ComponentRegistry,
	listeners::{ListenerRegistry, ReturnChannelRegistry},
	node::FeatureError,
	tree::StateTree,
	value::{NodeId, Value},
};
use hashbrown::HashMap;
use serde_json::Value as Json;
use tracing::{debug, instrument};

/// Name of the client-side callback that settles promises of client-callable methods.
pub const PROMISE_CALLBACK_NAME: &str = "}p";

/// A JavaScript expression queued for execution on the client.
///
/// Parameters are available to the expression as `$0`, `$1` and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct JsInvocation {
	pub expression: String,
	pub parameters: Vec<Value>,
}
impl JsInvocation {
	/// Wire form: the encoded parameters followed by the expression.
	#[must_use]
	pub fn to_json(&self) -> Json {
		let mut array: Vec<Json> = self.parameters.iter().map(Value::to_json).collect();
		array.push(Json::String(self.expression.clone()));
		Json::Array(array)
	}
}

/// A [`StateTree`] together with the components, listeners and pending client work that belong to it.
#[derive(Debug, Default)]
pub struct Ui {
	pub(crate) tree: StateTree,
	pub(crate) components: ComponentRegistry,
	pub(crate) decoders: DecoderRegistry,
	pub(crate) listeners: ListenerRegistry,
	pub(crate) channels: ReturnChannelRegistry,
	pub(crate) attach_existing: HashMap<NodeId, AttachExistingElementFeature>,
	pub(crate) pending_js: Vec<JsInvocation>,
}
impl Ui {
	/// Creates a session with an element root and the default decoders.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_decoders(decoders: DecoderRegistry) -> Self {
		Self {
			decoders,
			..Self::default()
		}
	}

	#[must_use]
	pub fn tree(&self) -> &StateTree {
		&self.tree
	}

	pub fn tree_mut(&mut self) -> &mut StateTree {
		&mut self.tree
	}

	#[must_use]
	pub fn components(&self) -> &ComponentRegistry {
		&self.components
	}

	#[must_use]
	pub fn listeners(&self) -> &ListenerRegistry {
		&self.listeners
	}

	#[must_use]
	pub fn return_channels(&self) -> &ReturnChannelRegistry {
		&self.channels
	}

	#[must_use]
	pub fn decoders(&self) -> &DecoderRegistry {
		&self.decoders
	}

	pub fn decoders_mut(&mut self) -> &mut DecoderRegistry {
		&mut self.decoders
	}

	/// Queues `expression` to run on the client.
	///
	/// `node`, if any, is appended as the last parameter and is what `this` refers to on the client.
	pub fn execute_js(&mut self, node: Option<NodeId>, expression: impl Into<String>, mut parameters: Vec<Value>) {
		parameters.extend(node.map(Value::Node));
		self.pending_js.push(JsInvocation {
			expression: expression.into(),
			parameters,
		});
	}

	#[must_use]
	pub fn pending_js(&self) -> &[JsInvocation] {
		&self.pending_js
	}

	pub fn take_pending_js(&mut self) -> Vec<JsInvocation> {
		core::mem::take(&mut self.pending_js)
	}

	/// Collects the changes of all dirty nodes, see [`StateTree::collect_changes`].
	#[must_use]
	pub fn collect_changes(&mut self) -> Vec<NodeChange> {
		let mut changes = Vec::new();
		self.tree.collect_changes(|change| changes.push(change));
		changes
	}

	/// Destroys a detached subtree and forgets everything registered for its nodes.
	///
	/// # Errors
	///
	/// Iff `node` still has a parent or is the root.
	#[instrument(skip(self))]
	pub fn destroy_node(&mut self, node: NodeId) -> Result<Vec<NodeId>, FeatureError> {
		let destroyed = self.tree.destroy(node)?;
		for &id in &destroyed {
			self.components.remove_node(id);
			self.listeners.remove_node(id);
			self.channels.remove_node(id);
			self.attach_existing.remove(&id);
		}
		debug!(count = destroyed.len(), "Purged registrations of destroyed nodes.");
		Ok(destroyed)
	}
}
