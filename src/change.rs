//! Feature registry and the change records handed to the transport layer on flush.

use crate::value::{NodeId, Value};
use core::convert::TryFrom;
use serde_json::{json, Map};

/// The closed set of features a [`StateNode`](`crate::node::StateNode`) can carry.
///
/// The discriminant is the id the client knows the feature by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FeatureId {
	/// Tag name and other immutable element data.
	ElementData = 0,
	ElementProperties = 1,
	ElementChildren = 2,
	ElementAttributes = 3,
	/// Event types with at least one server-side listener.
	ElementListeners = 4,
	ClassList = 5,
	ElementStyles = 6,
	/// Children that are not part of the regular child list, e.g. elements attached by id.
	VirtualChildren = 7,
}

/// Whether a feature is a keyed map or an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureShape {
	Map,
	List,
}

impl FeatureId {
	pub const ALL: [FeatureId; 8] = [
		Self::ElementData,
		Self::ElementProperties,
		Self::ElementChildren,
		Self::ElementAttributes,
		Self::ElementListeners,
		Self::ClassList,
		Self::ElementStyles,
		Self::VirtualChildren,
	];

	/// Features every element node carries.
	pub const ELEMENT: [FeatureId; 8] = Self::ALL;

	#[must_use]
	pub fn shape(self) -> FeatureShape {
		match self {
			Self::ElementData | Self::ElementProperties | Self::ElementAttributes | Self::ElementListeners | Self::ElementStyles => FeatureShape::Map,
			Self::ElementChildren | Self::ClassList | Self::VirtualChildren => FeatureShape::List,
		}
	}

	#[must_use]
	pub fn wire_id(self) -> u8 {
		self as u8
	}
}

impl TryFrom<u8> for FeatureId {
	type Error = u8;

	fn try_from(wire_id: u8) -> Result<Self, Self::Error> {
		Self::ALL.iter().copied().find(|feature| feature.wire_id() == wire_id).ok_or(wire_id)
	}
}

/// One flushed mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
	/// The node became visible to the client. Its full feature state follows.
	Attach { node: NodeId },
	Detach { node: NodeId },
	MapPut { node: NodeId, feature: FeatureId, key: String, value: Value },
	MapRemove { node: NodeId, feature: FeatureId, key: String },
	/// `items` are inserted before `index`.
	ListAdd { node: NodeId, feature: FeatureId, index: usize, items: Vec<Value> },
	ListRemove { node: NodeId, feature: FeatureId, index: usize, removed: Value },
	ListClear { node: NodeId, feature: FeatureId },
	/// The feature has never been sent and has nothing else to report.
	Empty { node: NodeId, feature: FeatureId },
}

impl NodeChange {
	#[must_use]
	pub fn node(&self) -> NodeId {
		match *self {
			Self::Attach { node }
			| Self::Detach { node }
			| Self::MapPut { node, .. }
			| Self::MapRemove { node, .. }
			| Self::ListAdd { node, .. }
			| Self::ListRemove { node, .. }
			| Self::ListClear { node, .. }
			| Self::Empty { node, .. } => node,
		}
	}

	#[must_use]
	pub fn feature(&self) -> Option<FeatureId> {
		match *self {
			Self::Attach { .. } | Self::Detach { .. } => None,
			Self::MapPut { feature, .. }
			| Self::MapRemove { feature, .. }
			| Self::ListAdd { feature, .. }
			| Self::ListRemove { feature, .. }
			| Self::ListClear { feature, .. }
			| Self::Empty { feature, .. } => Some(feature),
		}
	}

	/// Encodes the change in the client's change protocol.
	///
	/// List changes become splices. A node-valued put uses `nodeValue`, and a list add where every item is a node uses `addNodes`.
	#[must_use]
	pub fn to_json(&self) -> serde_json::Value {
		let mut json = Map::new();
		json.insert("node".to_owned(), json!(self.node().get()));
		if let Some(feature) = self.feature() {
			json.insert("feat".to_owned(), json!(feature.wire_id()));
		}

		match self {
			Self::Attach { .. } => {
				json.insert("type".to_owned(), json!("attach"));
			}
			Self::Detach { .. } => {
				json.insert("type".to_owned(), json!("detach"));
			}
			Self::MapPut { key, value, .. } => {
				json.insert("type".to_owned(), json!("put"));
				json.insert("key".to_owned(), json!(key));
				match value.as_node() {
					Some(node) => json.insert("nodeValue".to_owned(), json!(node.get())),
					None => json.insert("value".to_owned(), value.to_json()),
				};
			}
			Self::MapRemove { key, .. } => {
				json.insert("type".to_owned(), json!("remove"));
				json.insert("key".to_owned(), json!(key));
			}
			Self::ListAdd { index, items, .. } => {
				json.insert("type".to_owned(), json!("splice"));
				json.insert("index".to_owned(), json!(index));
				if !items.is_empty() && items.iter().all(|item| item.as_node().is_some()) {
					json.insert("addNodes".to_owned(), items.iter().filter_map(Value::as_node).map(NodeId::get).collect());
				} else {
					json.insert("add".to_owned(), items.iter().map(Value::to_json).collect());
				}
			}
			Self::ListRemove { index, .. } => {
				json.insert("type".to_owned(), json!("splice"));
				json.insert("index".to_owned(), json!(index));
				json.insert("remove".to_owned(), json!(1));
			}
			Self::ListClear { .. } => {
				json.insert("type".to_owned(), json!("clear"));
			}
			Self::Empty { .. } => {
				json.insert("type".to_owned(), json!("empty"));
			}
		}
		serde_json::Value::Object(json)
	}
}
