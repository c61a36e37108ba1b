//! Attaching elements that already exist on the client to server-side nodes.
//!
//! The server creates a placeholder node, holds it under the parent until the client reports which element it found,
//! and then either inserts it as a child or reports the failure.

use crate::{
	change::FeatureId,
	tree::StateTree,
	ui::Ui,
	value::{NodeId, Value},
};
use core::{
	convert::TryFrom,
	fmt::{self, Debug, Formatter},
};
use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

/// Receives the outcome of an attach-existing request.
pub trait ChildElementConsumer {
	/// Called with the node that now represents the client element.
	fn accept(&mut self, tree: &mut StateTree, node: NodeId);

	/// Called when no matching element was found on the client.
	fn on_error(&mut self, parent: NodeId, tag: &str, previous_sibling: Option<NodeId>);
}

struct PendingAttach {
	callback: Box<dyn ChildElementConsumer>,
	previous_sibling: Option<NodeId>,
}

/// Pending attach requests below one parent node.
pub struct AttachExistingElementFeature {
	parent: NodeId,
	pending: IndexMap<NodeId, PendingAttach>,
}
impl Debug for AttachExistingElementFeature {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("AttachExistingElementFeature")
			.field("parent", &self.parent)
			.field("pending", &self.pending.iter().map(|(node, pending)| (node, pending.previous_sibling)).collect::<Vec<_>>())
			.finish()
	}
}
impl AttachExistingElementFeature {
	#[must_use]
	pub fn new(parent: NodeId) -> Self {
		Self {
			parent,
			pending: IndexMap::new(),
		}
	}

	/// Holds `child` under the parent until the request is resolved.
	///
	/// `child` becomes attached along with the parent, but isn't part of any feature the client sees.
	///
	/// # Errors
	///
	/// Iff `child` can't become a child of the parent.
	pub fn register(
		&mut self,
		tree: &mut StateTree,
		child: NodeId,
		previous_sibling: Option<NodeId>,
		callback: Box<dyn ChildElementConsumer>,
	) -> Result<(), crate::node::FeatureError> {
		tree.adopt_bookkept(self.parent, child)?;
		self.pending.insert(child, PendingAttach { callback, previous_sibling });
		Ok(())
	}

	/// Forgets the request for `child` and lets go of it, unless it was placed elsewhere in the meantime.
	pub fn unregister(&mut self, tree: &mut StateTree, child: NodeId) {
		self.take(tree, child);
	}

	fn take(&mut self, tree: &mut StateTree, child: NodeId) -> Option<PendingAttach> {
		let pending = self.pending.shift_remove(&child);
		if tree.contains(self.parent) && tree.contains(child) {
			tree.release_bookkept(self.parent, child);
		}
		pending
	}

	#[must_use]
	pub fn get_parent(&self, child: NodeId) -> Option<NodeId> {
		self.pending.contains_key(&child).then(|| self.parent)
	}

	#[must_use]
	pub fn get_callback(&self, child: NodeId) -> Option<&dyn ChildElementConsumer> {
		self.pending.get(&child).map(|pending| &*pending.callback)
	}

	#[must_use]
	pub fn get_previous_sibling(&self, child: NodeId) -> Option<NodeId> {
		self.pending.get(&child).and_then(|pending| pending.previous_sibling)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}
}

/// How a client report about an attach-existing request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
	/// The callback accepted this node.
	Attached(NodeId),
	/// The callback was told about the failure.
	Failed,
	/// No such request is pending.
	Unknown,
}

impl Ui {
	/// Asks the client to look for an existing `tag` element under `parent`, after `previous_sibling` if given.
	///
	/// Returns the placeholder node that will represent the element if it is found.
	///
	/// # Panics
	///
	/// Iff `parent` is not a node of this tree.
	#[instrument(skip(self, callback))]
	pub fn request_attach_existing(&mut self, parent: NodeId, tag: &str, previous_sibling: Option<NodeId>, callback: impl ChildElementConsumer + 'static) -> NodeId {
		let requested = self.tree.create_element(tag);
		let feature = self.attach_existing.entry(parent).or_insert_with(|| AttachExistingElementFeature::new(parent));
		let registered = feature.register(&mut self.tree, requested, previous_sibling, Box::new(callback));
		debug_assert!(registered.is_ok(), "A fresh node can always be adopted.");

		self.execute_js(
			Some(parent),
			"this.attachExistingElement($0, $1, $2, $3);",
			vec![Value::Node(parent), previous_sibling.into(), tag.into(), i64::from(requested.get()).into()],
		);
		requested
	}

	#[must_use]
	pub fn attach_existing_feature(&self, parent: NodeId) -> Option<&AttachExistingElementFeature> {
		self.attach_existing.get(&parent)
	}

	/// Resolves a pending attach-existing request with what the client found.
	///
	/// An `assigned` id of `-1`, an element with a different tag, an index outside the parent's children
	/// or a parent without a children list fail the request.
	/// If the client found the requested node itself, it is inserted into the parent's children at `index`.
	/// If it found a different, already known node, that node is handed to the callback and the placeholder is destroyed.
	/// Either way the request is unregistered.
	#[instrument(skip(self))]
	pub fn resolve_attach_existing(&mut self, parent: NodeId, requested: NodeId, assigned: i64, tag: &str, index: i64) -> AttachOutcome {
		let Self { tree, attach_existing, .. } = self;
		let feature = match attach_existing.get_mut(&parent) {
			Some(feature) => feature,
			None => {
				warn!("No attach requests are pending for this parent.");
				return AttachOutcome::Unknown;
			}
		};
		let previous_sibling = feature.get_previous_sibling(requested);
		let mut pending = match feature.take(tree, requested) {
			Some(pending) => pending,
			None => {
				warn!("No such attach request is pending.");
				return AttachOutcome::Unknown;
			}
		};
		if feature.is_empty() {
			attach_existing.remove(&parent);
		}
		if !tree.contains(parent) {
			warn!("Parent of the attach request is gone.");
			return AttachOutcome::Unknown;
		}

		if !tree.node(parent).has_feature(FeatureId::ElementChildren) {
			warn!("Parent of the attach request has no children list.");
			pending.callback.on_error(parent, tag, previous_sibling);
			if self.destroy_node(requested).is_err() {
				warn!(%requested, "Placeholder node was adopted elsewhere and is kept.");
			}
			return AttachOutcome::Failed;
		}

		let children = tree.list(parent, FeatureId::ElementChildren).len();
		let assigned = u32::try_from(assigned).ok().map(NodeId::from_raw).filter(|&assigned| tree.contains(assigned));
		let index = usize::try_from(index).ok().filter(|&index| index <= children);
		let found = match (assigned, index) {
			(Some(assigned), Some(index)) if tree.tag(assigned) == Some(tag) => Some((assigned, index)),
			_ => None,
		};

		let outcome = match found {
			Some((assigned, index)) if assigned == requested => match tree.list_mut(parent, FeatureId::ElementChildren).add(index, Value::Node(requested)) {
				Ok(()) => {
					pending.callback.accept(tree, requested);
					AttachOutcome::Attached(requested)
				}
				Err(error) => {
					warn!(%error, "Could not insert the attached element.");
					pending.callback.on_error(parent, tag, previous_sibling);
					AttachOutcome::Failed
				}
			},
			Some((assigned, _)) => {
				debug!(%assigned, "Client reused an existing node.");
				pending.callback.accept(tree, assigned);
				AttachOutcome::Attached(assigned)
			}
			None => {
				debug!("Client found no matching element.");
				pending.callback.on_error(parent, tag, previous_sibling);
				AttachOutcome::Failed
			}
		};

		if outcome != AttachOutcome::Attached(requested) && self.destroy_node(requested).is_err() {
			warn!(%requested, "Placeholder node was adopted elsewhere and is kept.");
		}
		outcome
	}
}
