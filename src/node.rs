use crate::{
	change::{FeatureId, FeatureShape, NodeChange},
	node_list::NodeList,
	node_map::NodeMap,
	value::NodeId,
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use thiserror::Error;

/// Recoverable failures of feature mutations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeatureError {
	#[error("non-finite numbers can't be sent to the client (at {key})")]
	NonFinite { key: String },
	#[error("{child} can't become a child of its own descendant {parent}")]
	CyclicParent { parent: NodeId, child: NodeId },
	#[error("the root node can't become a child of {parent}")]
	RootAsChild { parent: NodeId },
	#[error("index {index} is out of bounds for a list of length {len}")]
	IndexOutOfBounds { index: usize, len: usize },
	#[error("value rejected: {reason}")]
	Rejected { reason: String },
	#[error("{0} still has a parent")]
	HasParent(NodeId),
	#[error("{child} can only be stored once per insertion")]
	DuplicateChild { child: NodeId },
}

/// Whether a client-originated update is accepted while its node is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisabledUpdateMode {
	OnlyWhenEnabled,
	Always,
}
impl Default for DisabledUpdateMode {
	fn default() -> Self {
		Self::OnlyWhenEnabled
	}
}
impl DisabledUpdateMode {
	#[must_use]
	pub fn most_permissive(self, other: Self) -> Self {
		if self == Self::Always || other == Self::Always {
			Self::Always
		} else {
			Self::OnlyWhenEnabled
		}
	}
}

/// Handle to an attach or detach hook, for [`StateTree::remove_hook`](`crate::tree::StateTree::remove_hook`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub(crate) u32);

pub(crate) type Hook = Box<dyn FnMut(NodeId)>;

/// One facet of a node's state.
#[derive(Debug, Clone)]
pub enum Feature {
	Map(NodeMap),
	List(NodeList),
}
impl Feature {
	#[must_use]
	pub fn new(shape: FeatureShape) -> Self {
		match shape {
			FeatureShape::Map => Self::Map(NodeMap::new()),
			FeatureShape::List => Self::List(NodeList::new()),
		}
	}

	#[must_use]
	pub fn as_map(&self) -> Option<&NodeMap> {
		match self {
			Self::Map(map) => Some(map),
			Self::List(_) => None,
		}
	}

	#[must_use]
	pub fn as_list(&self) -> Option<&NodeList> {
		match self {
			Self::List(list) => Some(list),
			Self::Map(_) => None,
		}
	}

	pub(crate) fn as_map_mut(&mut self) -> Option<&mut NodeMap> {
		match self {
			Self::Map(map) => Some(map),
			Self::List(_) => None,
		}
	}

	pub(crate) fn as_list_mut(&mut self) -> Option<&mut NodeList> {
		match self {
			Self::List(list) => Some(list),
			Self::Map(_) => None,
		}
	}

	#[must_use]
	pub fn has_changes(&self) -> bool {
		match self {
			Self::Map(map) => map.has_changes(),
			Self::List(list) => list.has_changes(),
		}
	}

	pub(crate) fn reset_changes(&mut self) {
		match self {
			Self::Map(map) => map.reset_changes(),
			Self::List(list) => list.reset_changes(),
		}
	}

	pub(crate) fn generate_changes_from_empty(&mut self) {
		match self {
			Self::Map(map) => map.generate_changes_from_empty(),
			Self::List(list) => list.generate_changes_from_empty(),
		}
	}

	pub(crate) fn collect_changes(&mut self, node: NodeId, feature: FeatureId, collector: &mut dyn FnMut(NodeChange)) {
		match self {
			Self::Map(map) => map.collect_changes(node, feature, collector),
			Self::List(list) => list.collect_changes(node, feature, collector),
		}
	}

	pub(crate) fn push_children(&self, children: &mut Vec<NodeId>) {
		match self {
			Self::Map(map) => children.extend(map.iter().filter_map(|(_, value)| value.as_node())),
			Self::List(list) => children.extend(list.iter().filter_map(crate::value::Value::as_node)),
		}
	}
}

/// A node of a [`StateTree`](`crate::tree::StateTree`).
///
/// Nodes are owned by their tree and only ever referred to by [`NodeId`].
/// The parent is a back-reference that the tree keeps in sync with the feature holding the node.
pub struct StateNode {
	pub(crate) id: NodeId,
	pub(crate) parent: Option<NodeId>,
	features: Vec<(FeatureId, Feature)>,
	/// Children held by server-side bookkeeping rather than by a feature.
	pub(crate) bookkept_children: Vec<NodeId>,
	pub(crate) attached: bool,
	/// The attached state at the last collection.
	pub(crate) was_attached: bool,
	pub(crate) enabled: bool,
	pub(crate) inert: bool,
	pub(crate) ignore_parent_inert: bool,
	/// Properties the client may update, with the mode that applies while the node is disabled.
	pub(crate) synchronized_properties: HashMap<String, DisabledUpdateMode>,
	pub(crate) attach_hooks: Vec<(HookId, Hook)>,
	pub(crate) detach_hooks: Vec<(HookId, Hook)>,
}
impl Debug for StateNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("StateNode")
			.field("id", &self.id)
			.field("parent", &self.parent)
			.field("features", &self.features.iter().map(|(id, _)| id).collect::<Vec<_>>())
			.field("attached", &self.attached)
			.field("enabled", &self.enabled)
			.field("inert", &self.inert)
			.field("attach_hooks", &self.attach_hooks.len())
			.field("detach_hooks", &self.detach_hooks.len())
			.finish()
	}
}
impl StateNode {
	pub(crate) fn new(id: NodeId, features: &[FeatureId]) -> Self {
		let mut owned = Vec::with_capacity(features.len());
		for &feature in features {
			if !owned.iter().any(|&(id, _)| id == feature) {
				owned.push((feature, Feature::new(feature.shape())));
			}
		}
		owned.sort_by_key(|&(id, _)| id);

		Self {
			id,
			parent: None,
			features: owned,
			bookkept_children: Vec::new(),
			attached: false,
			was_attached: false,
			enabled: true,
			inert: false,
			ignore_parent_inert: false,
			synchronized_properties: HashMap::new(),
			attach_hooks: Vec::new(),
			detach_hooks: Vec::new(),
		}
	}

	#[must_use]
	pub fn id(&self) -> NodeId {
		self.id
	}

	#[must_use]
	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	/// Whether the node is currently reachable from the root.
	#[must_use]
	pub fn is_attached(&self) -> bool {
		self.attached
	}

	#[must_use]
	pub fn has_feature(&self, feature: FeatureId) -> bool {
		self.feature(feature).is_some()
	}

	#[must_use]
	pub fn feature(&self, feature: FeatureId) -> Option<&Feature> {
		self.features.iter().find(|(id, _)| *id == feature).map(|(_, feature)| feature)
	}

	pub(crate) fn feature_mut(&mut self, feature: FeatureId) -> Option<&mut Feature> {
		self.features.iter_mut().find(|(id, _)| *id == feature).map(|(_, feature)| feature)
	}

	pub fn features(&self) -> impl Iterator<Item = (FeatureId, &Feature)> {
		self.features.iter().map(|(id, feature)| (*id, feature))
	}

	pub(crate) fn features_mut(&mut self) -> impl Iterator<Item = (FeatureId, &mut Feature)> {
		self.features.iter_mut().map(|(id, feature)| (*id, feature))
	}

	/// # Panics
	///
	/// Iff the node has no such feature or it isn't a map.
	#[must_use]
	#[track_caller]
	pub fn map(&self, feature: FeatureId) -> &NodeMap {
		match self.feature(feature) {
			Some(Feature::Map(map)) => map,
			Some(Feature::List(_)) => panic!("{:?} is not a map feature.", feature),
			None => panic!("Node {} has no {:?} feature.", self.id, feature),
		}
	}

	/// # Panics
	///
	/// Iff the node has no such feature or it isn't a list.
	#[must_use]
	#[track_caller]
	pub fn list(&self, feature: FeatureId) -> &NodeList {
		match self.feature(feature) {
			Some(Feature::List(list)) => list,
			Some(Feature::Map(_)) => panic!("{:?} is not a list feature.", feature),
			None => panic!("Node {} has no {:?} feature.", self.id, feature),
		}
	}

	#[track_caller]
	pub(crate) fn map_mut(&mut self, feature: FeatureId) -> &mut NodeMap {
		let id = self.id;
		self.feature_mut(feature)
			.and_then(Feature::as_map_mut)
			.unwrap_or_else(|| panic!("Node {} has no {:?} map feature.", id, feature))
	}

	#[track_caller]
	pub(crate) fn list_mut(&mut self, feature: FeatureId) -> &mut NodeList {
		let id = self.id;
		self.feature_mut(feature)
			.and_then(Feature::as_list_mut)
			.unwrap_or_else(|| panic!("Node {} has no {:?} list feature.", id, feature))
	}

	/// Whether the node itself is enabled, regardless of its ancestors.
	#[must_use]
	pub fn is_enabled_self(&self) -> bool {
		self.enabled
	}

	#[must_use]
	pub fn is_inert_self(&self) -> bool {
		self.inert
	}

	/// All nodes this node is the parent of, feature children first.
	pub(crate) fn push_children(&self, children: &mut Vec<NodeId>) {
		for (_, feature) in &self.features {
			feature.push_children(children);
		}
		children.extend_from_slice(&self.bookkept_children);
	}
}
