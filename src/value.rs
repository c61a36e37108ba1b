//! Values as they are stored in node features.

use core::fmt::{self, Debug, Display, Formatter};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Arena handle of a [`StateNode`](`crate::node::StateNode`) inside its [`StateTree`](`crate::tree::StateTree`).
///
/// The same number identifies the node on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);
impl NodeId {
	/// Wraps a raw wire id.
	///
	/// Only nodes created by the same [`StateTree`](`crate::tree::StateTree`) can be resolved.
	#[must_use]
	pub const fn from_raw(raw: u32) -> Self {
		Self(raw)
	}

	#[must_use]
	pub const fn get(self) -> u32 {
		self.0
	}
}
impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Key under which a node reference is encoded in JSON.
pub const NODE_REFERENCE_KEY: &str = "@v-node";

/// A value held by a [`NodeMap`](`crate::node_map::NodeMap`) entry or a [`NodeList`](`crate::node_list::NodeList`) item.
///
/// [`Value::Null`] is a stored value in its own right and distinct from absence.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	/// Must be finite to be stored.
	Double(f64),
	String(String),
	/// A child node. Storing it makes the holder's node its parent.
	Node(NodeId),
	/// Raw JSON that is passed through to the client as-is.
	Json(serde_json::Value),
}
impl Value {
	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	#[must_use]
	pub fn as_node(&self) -> Option<NodeId> {
		match *self {
			Self::Node(node) => Some(node),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(string) => Some(string),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match *self {
			Self::Bool(bool) => Some(bool),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_i64(&self) -> Option<i64> {
		match *self {
			Self::Int(int) => Some(int),
			_ => None,
		}
	}

	#[must_use]
	#[allow(clippy::cast_precision_loss)]
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			Self::Double(double) => Some(double),
			Self::Int(int) => Some(int as f64),
			_ => None,
		}
	}

	/// `false` only for a [`Value::Double`] that is NaN or infinite.
	#[must_use]
	pub fn is_finite(&self) -> bool {
		match *self {
			Self::Double(double) => double.is_finite(),
			_ => true,
		}
	}

	/// Name of the variant, for log records that must not contain the value itself.
	#[must_use]
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Double(_) => "double",
			Self::String(_) => "string",
			Self::Node(_) => "node",
			Self::Json(_) => "json",
		}
	}

	/// Encodes the value the way it is sent to the client.
	///
	/// Node references become `{"@v-node": id}`.
	#[must_use]
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Self::Null => serde_json::Value::Null,
			Self::Bool(bool) => json!(bool),
			Self::Int(int) => json!(int),
			Self::Double(double) => serde_json::Number::from_f64(*double).map_or(serde_json::Value::Null, serde_json::Value::Number),
			Self::String(string) => json!(string),
			Self::Node(node) => {
				let mut reference = serde_json::Map::new();
				reference.insert(NODE_REFERENCE_KEY.to_owned(), json!(node.get()));
				serde_json::Value::Object(reference)
			}
			Self::Json(json) => json.clone(),
		}
	}

	/// Converts an untyped wire value into a stored value.
	///
	/// Integral numbers become [`Value::Int`], other numbers [`Value::Double`].
	/// Arrays and objects stay raw JSON.
	#[must_use]
	pub fn from_json(json: &serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Self::Null,
			serde_json::Value::Bool(bool) => Self::Bool(*bool),
			serde_json::Value::Number(number) => number.as_i64().map_or_else(|| Self::Double(number.as_f64().unwrap_or(f64::NAN)), Self::Int),
			serde_json::Value::String(string) => Self::String(string.clone()),
			other => Self::Json(other.clone()),
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}
impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Double(value)
	}
}
impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_owned())
	}
}
impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}
impl From<NodeId> for Value {
	fn from(value: NodeId) -> Self {
		Self::Node(value)
	}
}
impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		Self::Json(value)
	}
}
impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Describes a value without revealing its contents.
pub(crate) trait Shape {
	fn shape(&self, f: &mut Formatter<'_>) -> fmt::Result;
}
impl Shape for Value {
	fn shape(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Node(node) => write!(f, "node {}", node),
			other => f.write_str(other.kind()),
		}
	}
}
impl Shape for serde_json::Value {
	fn shape(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			serde_json::Value::Null => f.write_str("null"),
			serde_json::Value::Bool(_) => f.write_str("bool"),
			serde_json::Value::Number(_) => f.write_str("number"),
			serde_json::Value::String(_) => f.write_str("string"),
			serde_json::Value::Array(array) => write!(f, "array[{}]", array.len()),
			serde_json::Value::Object(object) => write!(f, "object{{{}}}", object.len()),
		}
	}
}
impl<T: Shape + Debug> Shape for [T] {
	fn shape(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.iter().map(Redacted)).finish()
	}
}

/// [`Debug`]s the full value with the `dangerous-logging` feature, otherwise only its [`Shape`].
pub(crate) struct Redacted<'a, T: ?Sized>(pub &'a T);
impl<'a, T: ?Sized + Shape + Debug> Debug for Redacted<'a, T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			Debug::fmt(self.0, f)
		} else {
			self.0.shape(f)
		}
	}
}
