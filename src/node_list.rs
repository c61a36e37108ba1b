use crate::{
	change::{FeatureId, NodeChange},
	node::FeatureError,
	tracker::{ListChangeTracker, ListOp},
	value::{NodeId, Redacted, Value},
};
use tracing::{instrument, trace};

/// Ordered feature content.
///
/// Like [`NodeMap`](`crate::node_map::NodeMap`), this only tracks values and changes.
/// Use [`ListAccess`](`crate::tree::ListAccess`) to modify lists of nodes inside a [`StateTree`](`crate::tree::StateTree`).
#[derive(Debug, Default, Clone)]
pub struct NodeList {
	values: Vec<Value>,
	tracker: ListChangeTracker,
	/// Set once [`clear`](`NodeList::clear`) was called. Every resync then starts with a clear.
	ever_cleared: bool,
	populated: bool,
}
impl NodeList {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.values.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	#[must_use]
	pub fn get(&self, index: usize) -> Option<&Value> {
		self.values.get(index)
	}

	#[must_use]
	pub fn as_slice(&self) -> &[Value] {
		&self.values
	}

	pub fn iter(&self) -> impl Iterator<Item = &Value> {
		self.values.iter()
	}

	#[must_use]
	pub fn index_of(&self, value: &Value) -> Option<usize> {
		self.values.iter().position(|item| item == value)
	}

	#[must_use]
	pub fn contains(&self, value: &Value) -> bool {
		self.index_of(value).is_some()
	}

	/// The pending changes in their current, coalesced form.
	#[must_use]
	pub fn pending_changes(&self) -> &[ListOp] {
		self.tracker.ops()
	}

	/// Appends `value`.
	///
	/// # Errors
	///
	/// Iff `value` is a non-finite number.
	pub fn push(&mut self, value: Value) -> Result<(), FeatureError> {
		self.add(self.values.len(), value)
	}

	/// Inserts `value` before `index`.
	///
	/// # Errors
	///
	/// Iff `index` is greater than the length or `value` is a non-finite number.
	pub fn add(&mut self, index: usize, value: Value) -> Result<(), FeatureError> {
		self.insert_all(index, vec![value])
	}

	/// Appends all `items` as one change.
	///
	/// # Errors
	///
	/// Iff any item is a non-finite number, in which case nothing is added.
	pub fn add_all(&mut self, items: Vec<Value>) -> Result<(), FeatureError> {
		self.insert_all(self.values.len(), items)
	}

	/// Inserts all `items` before `index` as one change.
	///
	/// # Errors
	///
	/// Iff `index` is greater than the length or any item is a non-finite number, in which case nothing is added.
	#[instrument(skip(self, items), fields(items = ?Redacted(items.as_slice())))]
	pub fn insert_all(&mut self, index: usize, items: Vec<Value>) -> Result<(), FeatureError> {
		if index > self.values.len() {
			return Err(FeatureError::IndexOutOfBounds { index, len: self.values.len() });
		}
		if let Some(position) = items.iter().position(|item| !item.is_finite()) {
			return Err(FeatureError::NonFinite { key: format!("[{}]", index + position) });
		}

		self.values.splice(index..index, items.iter().cloned());
		self.tracker.record_add(index, items);
		Ok(())
	}

	/// Removes and returns the item at `index`.
	///
	/// # Errors
	///
	/// Iff `index` is out of bounds.
	#[instrument(skip(self))]
	pub fn remove(&mut self, index: usize) -> Result<Value, FeatureError> {
		if index >= self.values.len() {
			return Err(FeatureError::IndexOutOfBounds { index, len: self.values.len() });
		}
		let removed = self.values.remove(index);
		self.tracker.record_remove(index, removed.clone());
		Ok(removed)
	}

	/// Replaces the item at `index`, recorded as a remove followed by an add.
	///
	/// # Errors
	///
	/// Iff `index` is out of bounds or `value` is a non-finite number.
	pub fn set(&mut self, index: usize, value: Value) -> Result<Value, FeatureError> {
		if !value.is_finite() {
			return Err(FeatureError::NonFinite { key: format!("[{}]", index) });
		}
		let previous = self.remove(index)?;
		self.add(index, value)?;
		Ok(previous)
	}

	/// Removes all items.
	///
	/// Pending changes are replaced by a single clear.
	#[instrument(skip(self))]
	pub fn clear(&mut self) -> Vec<Value> {
		self.tracker.record_clear();
		self.ever_cleared = true;
		std::mem::take(&mut self.values)
	}

	#[must_use]
	pub fn has_changes(&self) -> bool {
		!self.tracker.is_empty() || !self.populated
	}

	/// Discards pending changes and forgets that the client has seen this feature.
	pub fn reset_changes(&mut self) {
		self.tracker.reset();
		self.populated = false;
	}

	/// Replaces pending changes with one add of the whole content, as if the client held an empty list.
	///
	/// If this list was ever cleared, the regenerated changes start with a clear,
	/// since the client may still hold content it received before.
	pub fn generate_changes_from_empty(&mut self) {
		self.tracker.reset();
		if self.ever_cleared {
			trace!("Regenerating a clear.");
			self.tracker.record_clear();
		}
		self.tracker.record_add(0, self.values.clone());
		self.populated = false;
	}

	/// Hands all coalesced changes to `collector` and advances the client baseline to the current content.
	pub fn collect_changes(&mut self, node: NodeId, feature: FeatureId, collector: &mut dyn FnMut(NodeChange)) {
		let mut emitted = false;
		for op in self.tracker.drain() {
			emitted = true;
			collector(match op {
				ListOp::Add { index, items } => NodeChange::ListAdd { node, feature, index, items },
				ListOp::Remove { index, removed } => NodeChange::ListRemove { node, feature, index, removed },
				ListOp::Clear => NodeChange::ListClear { node, feature },
			});
		}
		if !emitted && !self.populated {
			collector(NodeChange::Empty { node, feature });
		}
		self.populated = true;
	}
}
