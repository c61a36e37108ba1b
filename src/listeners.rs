//! Server-side listeners for client events, property changes and return channels.

use crate::{
	change::FeatureId,
	node::{DisabledUpdateMode, FeatureError},
	rc_hash_map::RcHashMap,
	tree::StateTree,
	ui::Ui,
	value::{NodeId, Value},
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use tracing::{instrument, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

/// How a DOM event listener is registered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListenerOptions {
	pub disabled_mode: DisabledUpdateMode,
	pub allow_inert: bool,
	/// Client-side expressions whose values are sent along with the event.
	pub event_data: Vec<String>,
}
impl ListenerOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Also deliver events while the node is disabled.
	#[must_use]
	pub fn always(mut self) -> Self {
		self.disabled_mode = DisabledUpdateMode::Always;
		self
	}

	#[must_use]
	pub fn allow_inert(mut self) -> Self {
		self.allow_inert = true;
		self
	}

	#[must_use]
	pub fn event_data(mut self, expression: &str) -> Self {
		self.event_data.push(expression.to_owned());
		self
	}
}

/// A client event as delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
	pub node: NodeId,
	pub event_type: String,
	/// Values of the requested event-data expressions, keyed by expression.
	pub data: Map<String, Json>,
}

/// A change of an element property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyChangeEvent<'a> {
	pub node: NodeId,
	pub property: &'a str,
	pub old_value: Option<&'a Value>,
	pub value: Option<&'a Value>,
	/// Whether the change came from the client.
	pub user_originated: bool,
}

struct DomListener {
	node: NodeId,
	event_type: String,
	options: ListenerOptions,
	callback: Box<dyn FnMut(&mut StateTree, &DomEvent)>,
}

struct PropertyListener {
	node: NodeId,
	property: String,
	callback: Box<dyn FnMut(&PropertyChangeEvent<'_>)>,
}

#[derive(Default)]
pub struct ListenerRegistry {
	dom: IndexMap<ListenerId, DomListener>,
	/// Listener count and requested event data per node and event type.
	event_types: RcHashMap<(NodeId, String), u16, Vec<String>>,
	property: IndexMap<ListenerId, PropertyListener>,
	next: u32,
}
impl Debug for ListenerRegistry {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerRegistry")
			.field("dom", &self.dom.len())
			.field("event_types", &self.event_types.len())
			.field("property", &self.property.len())
			.finish()
	}
}
impl ListenerRegistry {
	fn next_id(&mut self) -> ListenerId {
		let id = ListenerId(self.next);
		self.next += 1;
		id
	}

	/// Number of live DOM listeners for `event_type` on `node`.
	#[must_use]
	pub fn count(&self, node: NodeId, event_type: &str) -> u16 {
		self.event_types.count(&(node, event_type.to_owned()))
	}

	/// Whether any listener for `event_type` on `node` accepts events while the node is inert.
	#[must_use]
	pub fn allows_inert(&self, node: NodeId, event_type: &str) -> bool {
		self.dom.values().any(|listener| listener.node == node && listener.event_type == event_type && listener.options.allow_inert)
	}

	pub(crate) fn remove_node(&mut self, node: NodeId) {
		let Self { dom, event_types, property, .. } = self;
		dom.retain(|_, listener| {
			if listener.node != node {
				return true;
			}
			if event_types.weak_decrement(&(node, listener.event_type.clone())).is_err() {
				warn!(event_type = listener.event_type.as_str(), "Listener count was already zero.");
			}
			false
		});
		property.retain(|_, listener| listener.node != node);
		for ((_, event_type), _) in event_types.drain_weak() {
			trace!(event_type = event_type.as_str(), "Dropped unused event type.");
		}
	}
}

/// Where a return channel lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelRegistration {
	pub node: NodeId,
	pub channel: u32,
}

struct ReturnChannel {
	mode: DisabledUpdateMode,
	consumer: Box<dyn FnMut(&mut StateTree, &[Json])>,
}

/// Server-side callbacks the client can invoke by id, e.g. to deliver the result of a client-side computation.
#[derive(Default)]
pub struct ReturnChannelRegistry {
	channels: HashMap<ChannelRegistration, ReturnChannel>,
	next: u32,
}
impl Debug for ReturnChannelRegistry {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReturnChannelRegistry").field("channels", &self.channels.len()).finish()
	}
}
impl ReturnChannelRegistry {
	#[must_use]
	pub fn contains(&self, registration: ChannelRegistration) -> bool {
		self.channels.contains_key(&registration)
	}

	#[must_use]
	pub fn mode(&self, registration: ChannelRegistration) -> Option<DisabledUpdateMode> {
		self.channels.get(&registration).map(|channel| channel.mode)
	}

	pub(crate) fn remove_node(&mut self, node: NodeId) {
		self.channels.retain(|registration, _| registration.node != node);
	}
}

/// Outcome of [`Ui::invoke_return_channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelInvocation {
	Invoked,
	Unregistered,
	Disabled,
}

impl Ui {
	/// Registers `callback` for `event_type` events of `node`.
	///
	/// The event type is announced to the client through the node's [`FeatureId::ElementListeners`] map
	/// for as long as at least one listener for it remains.
	///
	/// # Panics
	///
	/// Iff `node` has no listener map, or more than 65k listeners are registered for the same event type on the same node.
	#[instrument(skip(self, options, callback))]
	pub fn add_event_listener(&mut self, node: NodeId, event_type: &str, options: ListenerOptions, callback: impl FnMut(&mut StateTree, &DomEvent) + 'static) -> ListenerId {
		let (expressions, revived) = self
			.listeners
			.event_types
			.increment_or_insert_with((node, event_type.to_owned()), Vec::new)
			.expect("Too many (more than 65k) listeners for the same event type on the same node");
		let mut announce = revived;
		for expression in &options.event_data {
			if !expressions.contains(expression) {
				expressions.push(expression.clone());
				announce = true;
			}
		}
		let announced = announce.then(|| Json::Array(expressions.iter().cloned().map(Json::String).collect()));
		if revived {
			trace!(event_type, "Event type became live.");
		}

		let id = self.listeners.next_id();
		self.listeners.dom.insert(
			id,
			DomListener {
				node,
				event_type: event_type.to_owned(),
				options,
				callback: Box::new(callback),
			},
		);

		if let Some(announced) = announced {
			let stored = self.tree.map_mut(node, FeatureId::ElementListeners).put(event_type, Value::Json(announced));
			debug_assert!(stored.is_ok());
		}
		id
	}

	/// Registers `callback` for changes of `property` on `node`.
	pub fn add_property_change_listener(&mut self, node: NodeId, property: &str, callback: impl FnMut(&PropertyChangeEvent<'_>) + 'static) -> ListenerId {
		let id = self.listeners.next_id();
		self.listeners.property.insert(
			id,
			PropertyListener {
				node,
				property: property.to_owned(),
				callback: Box::new(callback),
			},
		);
		id
	}

	/// Removes a DOM event or property change listener.
	///
	/// Returns `false` if it wasn't registered.
	#[instrument(skip(self))]
	pub fn remove_listener(&mut self, id: ListenerId) -> bool {
		if self.listeners.property.shift_remove(&id).is_some() {
			return true;
		}
		let listener = match self.listeners.dom.shift_remove(&id) {
			Some(listener) => listener,
			None => return false,
		};

		if self.listeners.event_types.weak_decrement(&(listener.node, listener.event_type)).is_err() {
			warn!("Listener count was already zero.");
		}
		let unused: Vec<(NodeId, String)> = self.listeners.event_types.drain_weak().map(|(key, _)| key).collect();
		for (node, event_type) in unused {
			trace!(%node, event_type = event_type.as_str(), "No listeners left for event type.");
			if self.tree.contains(node) {
				self.tree.map_mut(node, FeatureId::ElementListeners).remove(&event_type);
			}
		}
		true
	}

	/// Runs the listeners `event` is deliverable to, in registration order.
	///
	/// Inert nodes only deliver to listeners that allow it, disabled nodes only to [`DisabledUpdateMode::Always`] listeners.
	/// Returns how many listeners ran.
	#[instrument(skip(self, event), fields(node = %event.node, event_type = event.event_type.as_str()))]
	pub fn fire_event(&mut self, event: &DomEvent) -> usize {
		let inert = self.tree.is_inert(event.node);
		let enabled = self.tree.is_enabled(event.node);

		let Self { tree, listeners, .. } = self;
		let mut invoked = 0;
		for listener in listeners.dom.values_mut() {
			if listener.node != event.node || listener.event_type != event.event_type {
				continue;
			}
			if inert && !listener.options.allow_inert {
				trace!("Skipping listener for inert node.");
				continue;
			}
			if !enabled && listener.options.disabled_mode != DisabledUpdateMode::Always {
				trace!("Skipping listener for disabled node.");
				continue;
			}
			(listener.callback)(tree, event);
			invoked += 1;
		}
		invoked
	}

	/// Stores an element property from server code, notifying property change listeners.
	///
	/// # Errors
	///
	/// Iff `value` can't be stored.
	pub fn set_property(&mut self, node: NodeId, property: &str, value: impl Into<Value>) -> Result<Option<Value>, FeatureError> {
		let value = value.into();
		let previous = self.tree.map_mut(node, FeatureId::ElementProperties).put(property, value.clone())?;
		if previous.as_ref() != Some(&value) {
			self.fire_property_change(node, property, previous.as_ref(), Some(&value), false);
		}
		Ok(previous)
	}

	pub(crate) fn fire_property_change(&mut self, node: NodeId, property: &str, old_value: Option<&Value>, value: Option<&Value>, user_originated: bool) {
		let event = PropertyChangeEvent {
			node,
			property,
			old_value,
			value,
			user_originated,
		};
		for listener in self.listeners.property.values_mut() {
			if listener.node == node && listener.property == property {
				(listener.callback)(&event);
			}
		}
	}

	/// Registers `consumer` as a return channel of `node`.
	pub fn register_return_channel(&mut self, node: NodeId, consumer: impl FnMut(&mut StateTree, &[Json]) + 'static) -> ChannelRegistration {
		let registration = ChannelRegistration {
			node,
			channel: self.channels.next,
		};
		self.channels.next += 1;
		self.channels.channels.insert(
			registration,
			ReturnChannel {
				mode: DisabledUpdateMode::default(),
				consumer: Box::new(consumer),
			},
		);
		registration
	}

	/// Returns `false` if the channel isn't registered.
	pub fn set_return_channel_mode(&mut self, registration: ChannelRegistration, mode: DisabledUpdateMode) -> bool {
		match self.channels.channels.get_mut(&registration) {
			Some(channel) => {
				channel.mode = mode;
				true
			}
			None => false,
		}
	}

	/// Returns `false` if the channel wasn't registered.
	pub fn unregister_return_channel(&mut self, registration: ChannelRegistration) -> bool {
		self.channels.channels.remove(&registration).is_some()
	}

	/// Passes `args` to the channel, unless it was unregistered or the node is disabled and the channel doesn't allow that.
	#[instrument(skip(self, args))]
	pub fn invoke_return_channel(&mut self, registration: ChannelRegistration, args: &[Json]) -> ChannelInvocation {
		let enabled = self.tree.is_enabled(registration.node);
		let Self { tree, channels, .. } = self;
		let channel = match channels.channels.get_mut(&registration) {
			Some(channel) => channel,
			None => return ChannelInvocation::Unregistered,
		};
		if !enabled && channel.mode != DisabledUpdateMode::Always {
			return ChannelInvocation::Disabled;
		}
		(channel.consumer)(tree, args);
		ChannelInvocation::Invoked
	}
}
