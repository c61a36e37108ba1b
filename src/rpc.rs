//! Incoming client messages and how they are applied to a [`Ui`].

use crate::{
	attach::AttachOutcome,
	change::FeatureId,
	dispatch::DispatchError,
	listeners::{ChannelInvocation, ChannelRegistration, DomEvent},
	node::{DisabledUpdateMode, FeatureError},
	ui::Ui,
	value::{NodeId, Redacted, Value},
};
use core::convert::TryFrom;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use thiserror::Error;
use tracing::{debug, instrument, trace_span, warn};

/// One client message, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum RpcInvocation {
	/// A property the client changed.
	#[serde(rename = "mSync")]
	MapSync {
		node: NodeId,
		feature: u8,
		property: String,
		#[serde(default)]
		value: Json,
	},
	#[serde(rename = "event")]
	Event {
		node: NodeId,
		event: String,
		#[serde(default)]
		data: Map<String, Json>,
	},
	/// A call of a published method.
	#[serde(rename = "publishedEventHandler")]
	PublishedEventHandler {
		node: NodeId,
		#[serde(rename = "templateEventMethodName")]
		method: String,
		#[serde(rename = "templateEventMethodArgs", default)]
		args: Vec<Json>,
		/// Negative ids mean no promise is waiting.
		#[serde(default)]
		promise: Option<i64>,
	},
	#[serde(rename = "attachExistingElement")]
	AttachExistingElement {
		node: NodeId,
		#[serde(rename = "attachReqId")]
		requested: NodeId,
		#[serde(rename = "attachAssignedId")]
		assigned: i64,
		#[serde(rename = "attachTagName")]
		tag: String,
		#[serde(rename = "attachIndex")]
		index: i64,
	},
	#[serde(rename = "channel")]
	Channel {
		node: NodeId,
		channel: u32,
		#[serde(default)]
		args: Vec<Json>,
	},
}
impl RpcInvocation {
	#[must_use]
	pub fn node(&self) -> NodeId {
		match self {
			Self::MapSync { node, .. }
			| Self::Event { node, .. }
			| Self::PublishedEventHandler { node, .. }
			| Self::AttachExistingElement { node, .. }
			| Self::Channel { node, .. } => *node,
		}
	}

	#[must_use]
	pub fn kind(&self) -> &'static str {
		match self {
			Self::MapSync { .. } => "mSync",
			Self::Event { .. } => "event",
			Self::PublishedEventHandler { .. } => "publishedEventHandler",
			Self::AttachExistingElement { .. } => "attachExistingElement",
			Self::Channel { .. } => "channel",
		}
	}
}

#[derive(Debug, Error)]
pub enum RpcError {
	#[error("malformed invocation: {0}")]
	Malformed(#[from] serde_json::Error),
	#[error("promise id {0} is out of range")]
	PromiseOutOfRange(i64),
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
	#[error(transparent)]
	Feature(#[from] FeatureError),
}

/// Why a well-formed message had no effect.
///
/// These are expected races between client and server state, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
	UnknownNode,
	Detached,
	Inert,
	Disabled,
	/// The property isn't allowed to be updated from the client.
	NotSynchronized,
	UnsupportedFeature,
	UnknownChannel,
	UnknownAttachRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcOutcome {
	Handled,
	Ignored(IgnoreReason),
}

impl Ui {
	/// Parses and applies one client message.
	///
	/// # Errors
	///
	/// Iff the message is malformed, a method call fails, or a synchronized value can't be stored.
	/// Messages for unknown, detached, inert or disabled nodes are [ignored](`RpcOutcome::Ignored`) instead.
	pub fn handle_rpc(&mut self, message: &Json) -> Result<RpcOutcome, RpcError> {
		let invocation = RpcInvocation::deserialize(message)?;
		self.handle_invocation(invocation)
	}

	/// Applies the messages in order. A failing message doesn't stop the ones after it.
	///
	/// # Errors
	///
	/// Iff `messages` is not an array.
	#[instrument(skip(self, messages), fields(messages = ?Redacted(messages)))]
	pub fn handle_rpc_batch(&mut self, messages: &Json) -> Result<Vec<Result<RpcOutcome, RpcError>>, RpcError> {
		let messages = Vec::<Json>::deserialize(messages)?;
		Ok(messages.iter().map(|message| self.handle_rpc(message)).collect())
	}

	/// Applies an already parsed message.
	///
	/// # Errors
	///
	/// See [`handle_rpc`](`Ui::handle_rpc`).
	pub fn handle_invocation(&mut self, invocation: RpcInvocation) -> Result<RpcOutcome, RpcError> {
		let node = invocation.node();
		let span = trace_span!("handle_invocation", kind = invocation.kind(), node = %node);
		let _enter = span.enter();

		match self.tree.try_node(node) {
			None => {
				warn!("Ignoring invocation for unknown node.");
				return Ok(RpcOutcome::Ignored(IgnoreReason::UnknownNode));
			}
			Some(state) if !state.is_attached() => {
				warn!("Ignoring invocation for detached node.");
				return Ok(RpcOutcome::Ignored(IgnoreReason::Detached));
			}
			Some(_) => (),
		}

		let allows_inert = match &invocation {
			RpcInvocation::MapSync { .. } | RpcInvocation::Channel { .. } => false,
			RpcInvocation::Event { event, .. } => self.listeners.allows_inert(node, event),
			RpcInvocation::PublishedEventHandler { method, .. } => match self.components.for_node(node) {
				Some(component) => self.components.resolve(component, method).map_or(false, |(_, method)| method.allows_inert()),
				None => false,
			},
			RpcInvocation::AttachExistingElement { .. } => true,
		};
		if !allows_inert && self.tree.is_inert(node) {
			warn!("Ignoring invocation for inert node.");
			return Ok(RpcOutcome::Ignored(IgnoreReason::Inert));
		}

		match invocation {
			RpcInvocation::MapSync { feature, property, value, .. } => self.handle_map_sync(node, feature, &property, &value),
			RpcInvocation::Event { event, data, .. } => {
				self.fire_event(&DomEvent { node, event_type: event, data });
				Ok(RpcOutcome::Handled)
			}
			RpcInvocation::PublishedEventHandler { method, args, promise, .. } => self.handle_published(node, &method, &args, promise),
			RpcInvocation::AttachExistingElement {
				requested,
				assigned,
				tag,
				index,
				..
			} => Ok(match self.resolve_attach_existing(node, requested, assigned, &tag, index) {
				AttachOutcome::Unknown => RpcOutcome::Ignored(IgnoreReason::UnknownAttachRequest),
				AttachOutcome::Attached(_) | AttachOutcome::Failed => RpcOutcome::Handled,
			}),
			RpcInvocation::Channel { channel, args, .. } => Ok(match self.invoke_return_channel(ChannelRegistration { node, channel }, &args) {
				ChannelInvocation::Invoked => RpcOutcome::Handled,
				ChannelInvocation::Unregistered => {
					warn!(channel, "Ignoring invocation of unregistered return channel.");
					RpcOutcome::Ignored(IgnoreReason::UnknownChannel)
				}
				ChannelInvocation::Disabled => {
					warn!(channel, "Ignoring return channel invocation for disabled node.");
					RpcOutcome::Ignored(IgnoreReason::Disabled)
				}
			}),
		}
	}

	#[instrument(skip(self, value), fields(value = ?Redacted(value)))]
	fn handle_map_sync(&mut self, node: NodeId, feature: u8, property: &str, value: &Json) -> Result<RpcOutcome, RpcError> {
		match FeatureId::try_from(feature) {
			Ok(FeatureId::ElementProperties) if self.tree.node(node).has_feature(FeatureId::ElementProperties) => (),
			_ => {
				warn!("Ignoring property sync for unsupported feature.");
				return Ok(RpcOutcome::Ignored(IgnoreReason::UnsupportedFeature));
			}
		}

		let mode = match self.tree.client_update_mode(node, property) {
			Some(mode) => mode,
			None => {
				warn!("Ignoring update of property that isn't synchronized.");
				return Ok(RpcOutcome::Ignored(IgnoreReason::NotSynchronized));
			}
		};
		if mode != DisabledUpdateMode::Always && !self.tree.is_enabled(node) {
			warn!("Ignoring property update for disabled node.");
			return Ok(RpcOutcome::Ignored(IgnoreReason::Disabled));
		}

		let value = Value::from_json(value);
		let previous = self.tree.map_mut(node, FeatureId::ElementProperties).put_with(property, value.clone(), false)?;
		if previous.as_ref() != Some(&value) {
			self.fire_property_change(node, property, previous.as_ref(), Some(&value), true);
		}
		Ok(RpcOutcome::Handled)
	}

	#[instrument(skip(self, args), fields(args = ?Redacted(args)))]
	fn handle_published(&mut self, node: NodeId, method: &str, args: &[Json], promise: Option<i64>) -> Result<RpcOutcome, RpcError> {
		let promise = match promise {
			Some(promise) if promise >= 0 => Some(u32::try_from(promise).map_err(|_| RpcError::PromiseOutOfRange(promise))?),
			_ => None,
		};
		let component = self.components.for_node(node).ok_or(DispatchError::NoComponent(node))?;
		let (_, client_method) = self.components.resolve(component, method)?;
		if client_method.get_disabled_mode() != DisabledUpdateMode::Always && !self.tree.is_enabled(node) {
			warn!("Ignoring method call for disabled node.");
			return Ok(RpcOutcome::Ignored(IgnoreReason::Disabled));
		}

		let value = self.invoke_method(component, method, args, promise)?;
		debug!(result = ?Redacted(&value), "Method returned.");
		Ok(RpcOutcome::Handled)
	}
}
