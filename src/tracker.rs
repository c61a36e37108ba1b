//! The change interpreters behind [`NodeMap`](`crate::node_map::NodeMap`) and [`NodeList`](`crate::node_list::NodeList`).
//!
//! Both only ever see the operations that were applied to their feature, in issuance order,
//! and compact them into the shortest sequence that brings the client from its last flushed state to the current one.

use crate::value::{Redacted, Value};
use indexmap::IndexMap;
use tracing::{trace, trace_span};

/// One coalesced map mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
	Put { key: String, value: Value },
	Remove { key: String },
}

/// Remembers, per touched key, what the client saw at the last flush.
///
/// Comparing that baseline with the current content on [`drain`](`MapChangeTracker::drain`) makes any sequence of
/// puts and removes on one key collapse into at most one change.
#[derive(Debug, Default, Clone)]
pub struct MapChangeTracker {
	/// `None` if the client had no entry for the key.
	baselines: IndexMap<String, Option<Value>>,
}
impl MapChangeTracker {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.baselines.is_empty()
	}

	/// Notes that `key` is about to change from `flushed`.
	///
	/// Only the first call per key and window has an effect, since later ones report intermediate states.
	pub fn record(&mut self, key: &str, flushed: Option<&Value>) {
		if !self.baselines.contains_key(key) {
			trace!(key, baseline = ?flushed.map(Redacted), "Tracking map key.");
			self.baselines.insert(key.to_owned(), flushed.cloned());
		}
	}

	/// Makes `known` the client's view of `key` without producing a change for it.
	///
	/// Untracked keys are left alone: their current value is already what the client is assumed to know.
	pub fn acknowledge(&mut self, key: &str, known: Option<&Value>) {
		if let Some(baseline) = self.baselines.get_mut(key) {
			*baseline = known.cloned();
		}
	}

	/// Forgets everything the client knew about the given keys, so that each is reported as new.
	pub fn mark_unknown<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
		for key in keys {
			self.baselines.insert(key.to_owned(), None);
		}
	}

	pub fn clear(&mut self) {
		self.baselines.clear();
	}

	/// Compares each tracked key against `current` and resets the tracker.
	///
	/// Keys whose current state equals their baseline produce nothing.
	pub fn drain(&mut self, current: &IndexMap<String, Value>) -> Vec<MapOp> {
		let span = trace_span!("MapChangeTracker::drain", tracked = self.baselines.len());
		let _enter = span.enter();

		let mut ops = Vec::with_capacity(self.baselines.len());
		for (key, baseline) in self.baselines.drain(..) {
			match (baseline, current.get(&key)) {
				(Some(_), None) => ops.push(MapOp::Remove { key }),
				(baseline, Some(value)) if baseline.as_ref() != Some(value) => ops.push(MapOp::Put { key, value: value.clone() }),
				_ => trace!(key = key.as_str(), "Map key is back at its flushed state."),
			}
		}
		ops
	}
}

/// One pending list mutation, expressed against the list state right before it.
#[derive(Debug, Clone, PartialEq)]
pub enum ListOp {
	/// `items` inserted before `index`.
	Add { index: usize, items: Vec<Value> },
	Remove { index: usize, removed: Value },
	Clear,
}

/// Ordered log of pending list mutations.
///
/// Replaying [`ops`](`ListChangeTracker::ops`) against the last flushed content (see [`replay`]) always yields the current content.
///
/// Adds are never merged with each other, so inserting into the middle of a pending multi-item add is recorded as a separate add.
/// Removing an item that is still part of a pending add cancels the item out of that add instead of logging a remove,
/// and every later op positioned behind the item is shifted down to match.
/// Removing an item the client already has is logged as is.
#[derive(Debug, Default, Clone)]
pub struct ListChangeTracker {
	ops: Vec<ListOp>,
}
impl ListChangeTracker {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn ops(&self) -> &[ListOp] {
		&self.ops
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.ops.is_empty()
	}

	#[must_use]
	pub fn contains_clear(&self) -> bool {
		self.ops.iter().any(|op| *op == ListOp::Clear)
	}

	pub fn record_add(&mut self, index: usize, items: Vec<Value>) {
		if items.is_empty() {
			return;
		}
		trace!(index, items = ?Redacted(items.as_slice()), "Recording list add.");
		self.ops.push(ListOp::Add { index, items });
	}

	/// Records the removal of `removed`, which was at `index` in the current content.
	///
	/// Returns `true` iff the removal cancelled a pending add.
	pub fn record_remove(&mut self, index: usize, removed: Value) -> bool {
		let span = trace_span!("ListChangeTracker::record_remove", index, pending = self.ops.len());
		let _enter = span.enter();

		// The item's position in the state right before each op, newest op first.
		let mut positions = Vec::with_capacity(self.ops.len());
		let mut position = index;
		let mut origin = None;
		for (i, op) in self.ops.iter().enumerate().rev() {
			match op {
				ListOp::Add { index: at, items } => {
					if (*at..*at + items.len()).contains(&position) {
						origin = Some((i, position - at));
						break;
					}
					if position >= *at + items.len() {
						position -= items.len();
					}
				}
				ListOp::Remove { index: at, .. } => {
					if position >= *at {
						position += 1;
					}
				}
				ListOp::Clear => break,
			}
			positions.push(position);
		}

		let (origin, offset) = match origin {
			Some(found) => found,
			None => {
				trace!("Item predates the pending window, logging the removal.");
				self.ops.push(ListOp::Remove { index, removed });
				return false;
			}
		};

		trace!(origin, offset, "Item was added in this window, cancelling it out.");
		let newest = self.ops.len() - 1;
		for (j, op) in self.ops.iter_mut().enumerate().skip(origin + 1) {
			let item_position = positions[newest - j];
			match op {
				ListOp::Add { index: at, .. } | ListOp::Remove { index: at, .. } => {
					if *at > item_position {
						*at -= 1;
					}
				}
				ListOp::Clear => (),
			}
		}
		if let ListOp::Add { items, .. } = &mut self.ops[origin] {
			items.remove(offset);
			if items.is_empty() {
				self.ops.remove(origin);
			}
		}
		true
	}

	/// Replaces all pending ops with a single clear.
	pub fn record_clear(&mut self) {
		trace!(discarded = self.ops.len(), "Recording list clear.");
		self.ops.clear();
		self.ops.push(ListOp::Clear);
	}

	pub fn reset(&mut self) {
		self.ops.clear();
	}

	pub fn drain(&mut self) -> Vec<ListOp> {
		std::mem::take(&mut self.ops)
	}
}

/// Applies `ops` to `content` in order.
///
/// # Panics
///
/// Iff an op's index is out of range for `content`, which means `content` is not the state the ops were recorded against.
pub fn replay(content: &mut Vec<Value>, ops: &[ListOp]) {
	for op in ops {
		match op {
			ListOp::Add { index, items } => {
				content.splice(*index..*index, items.iter().cloned());
			}
			ListOp::Remove { index, .. } => {
				content.remove(*index);
			}
			ListOp::Clear => content.clear(),
		}
	}
}
