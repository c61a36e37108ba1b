use crate::{
	change::{FeatureId, NodeChange},
	node::FeatureError,
	tracker::{MapChangeTracker, MapOp},
	value::{NodeId, Redacted, Value},
};
use indexmap::IndexMap;
use tracing::{instrument, trace};

/// Keyed feature content.
///
/// This type only tracks values and changes.
/// Parent bookkeeping for [`Value::Node`] entries is done by [`MapAccess`](`crate::tree::MapAccess`),
/// which is how nodes inside a [`StateTree`](`crate::tree::StateTree`) should be modified.
#[derive(Debug, Default, Clone)]
pub struct NodeMap {
	values: IndexMap<String, Value>,
	tracker: MapChangeTracker,
	/// Whether the client has seen this feature at all.
	populated: bool,
}
impl NodeMap {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	#[must_use]
	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.values.iter().map(|(key, value)| (key.as_str(), value))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.values.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// `default` if `key` is absent, `false` if it is explicitly [`Value::Null`].
	///
	/// # Panics
	///
	/// Iff the stored value is not a [`Value::Bool`].
	#[must_use]
	#[track_caller]
	pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
		match self.values.get(key) {
			None => default,
			Some(Value::Null) => false,
			Some(Value::Bool(value)) => *value,
			Some(other) => panic!("Map entry {:?} holds a {} where a bool was expected.", key, other.kind()),
		}
	}

	/// `default` if `key` is absent, `0` if it is explicitly [`Value::Null`].
	///
	/// # Panics
	///
	/// Iff the stored value is not a [`Value::Int`].
	#[must_use]
	#[track_caller]
	pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
		match self.values.get(key) {
			None => default,
			Some(Value::Null) => 0,
			Some(Value::Int(value)) => *value,
			Some(other) => panic!("Map entry {:?} holds a {} where an int was expected.", key, other.kind()),
		}
	}

	/// `Some(default)` if `key` is absent, [`None`] if it is explicitly [`Value::Null`].
	///
	/// # Panics
	///
	/// Iff the stored value is not a [`Value::String`].
	#[must_use]
	#[track_caller]
	pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> Option<&'a str> {
		match self.values.get(key) {
			None => Some(default),
			Some(Value::Null) => None,
			Some(Value::String(value)) => Some(value),
			Some(other) => panic!("Map entry {:?} holds a {} where a string was expected.", key, other.kind()),
		}
	}

	/// Stores `value` under `key` and records the change.
	///
	/// Returns the previous value. Storing a value equal to the current one changes nothing.
	///
	/// # Errors
	///
	/// Iff `value` is a non-finite number.
	pub fn put(&mut self, key: &str, value: Value) -> Result<Option<Value>, FeatureError> {
		self.put_with(key, value, true)
	}

	/// Like [`put`](`NodeMap::put`), but with `emit_change` set to `false` the client is assumed to know the new value already.
	///
	/// # Errors
	///
	/// Iff `value` is a non-finite number.
	#[instrument(skip(self, value), fields(value = ?Redacted(&value)))]
	pub fn put_with(&mut self, key: &str, value: Value, emit_change: bool) -> Result<Option<Value>, FeatureError> {
		if !value.is_finite() {
			return Err(FeatureError::NonFinite { key: key.to_owned() });
		}

		let previous = self.values.get(key);
		if previous == Some(&value) {
			trace!("Value unchanged.");
			return Ok(previous.cloned());
		}

		if emit_change {
			self.tracker.record(key, previous);
		} else {
			self.tracker.acknowledge(key, Some(&value));
		}
		Ok(self.values.insert(key.to_owned(), value))
	}

	/// Removes `key` and records the change.
	#[instrument(skip(self))]
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		let previous = self.values.get(key)?;
		self.tracker.record(key, Some(previous));
		self.values.shift_remove(key)
	}

	/// Removes every entry, recording a removal per key.
	pub fn clear(&mut self) -> Vec<(String, Value)> {
		for (key, value) in &self.values {
			self.tracker.record(key, Some(value));
		}
		self.values.drain(..).collect()
	}

	#[must_use]
	pub fn has_changes(&self) -> bool {
		!self.tracker.is_empty() || !self.populated
	}

	/// Discards pending changes and forgets that the client has seen this feature.
	pub fn reset_changes(&mut self) {
		self.tracker.clear();
		self.populated = false;
	}

	/// Assumes the client knows nothing about this map, so that the next collection reports every entry.
	pub fn generate_changes_from_empty(&mut self) {
		let Self { values, tracker, .. } = self;
		tracker.mark_unknown(values.keys().map(String::as_str));
	}

	/// Hands all coalesced changes to `collector` and advances the client baseline to the current content.
	pub fn collect_changes(&mut self, node: NodeId, feature: FeatureId, collector: &mut dyn FnMut(NodeChange)) {
		let mut emitted = false;
		for op in self.tracker.drain(&self.values) {
			emitted = true;
			collector(match op {
				MapOp::Put { key, value } => NodeChange::MapPut { node, feature, key, value },
				MapOp::Remove { key } => NodeChange::MapRemove { node, feature, key },
			});
		}
		if !emitted && !self.populated {
			collector(NodeChange::Empty { node, feature });
		}
		self.populated = true;
	}
}
