//! Type-directed decoding of untyped wire values into method arguments.
//!
//! A [`DecoderRegistry`] holds an ordered chain of [`RpcDecoder`]s.
//! For each wire value, the first decoder that declares itself applicable to the (value, [`ParamType`]) pair does the conversion.

use crate::value::{Redacted, Shape};
use core::fmt::{self, Debug, Display, Formatter};
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use thiserror::Error;
use tracing::{instrument, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
	Boolean,
	Byte,
	Short,
	Int,
	Long,
	Float,
	Double,
}
impl PrimitiveType {
	/// The value a wire `null` decodes to for a non-nullable parameter.
	#[must_use]
	pub fn zero(self) -> Arg {
		match self {
			Self::Boolean => Arg::Bool(false),
			Self::Byte => Arg::Byte(0),
			Self::Short => Arg::Short(0),
			Self::Int => Arg::Int(0),
			Self::Long => Arg::Long(0),
			Self::Float => Arg::Float(0.0),
			Self::Double => Arg::Double(0.0),
		}
	}

	#[must_use]
	pub fn is_numeric(self) -> bool {
		self != Self::Boolean
	}

	#[must_use]
	pub fn is_integral(self) -> bool {
		matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
	}

	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Self::Boolean => "bool",
			Self::Byte => "i8",
			Self::Short => "i16",
			Self::Int => "i32",
			Self::Long => "i64",
			Self::Float => "f32",
			Self::Double => "f64",
		}
	}
}

/// A closed set of named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumType {
	pub name: &'static str,
	pub constants: &'static [&'static str],
}

/// A structured type that is decoded from a wire object through [`serde`].
///
/// The decoded [`Arg::Bean`] keeps the JSON, which is validated against the target type at decode time
/// and deserialized again by [`Arg::bean`].
#[derive(Clone, Copy)]
pub struct BeanType {
	pub name: &'static str,
	validate: fn(&Json) -> Result<(), serde_json::Error>,
}
impl BeanType {
	#[must_use]
	pub fn of<T: DeserializeOwned>(name: &'static str) -> Self {
		Self {
			name,
			validate: validate_as::<T>,
		}
	}
}
impl Debug for BeanType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("BeanType").field(&self.name).finish()
	}
}
impl PartialEq for BeanType {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name
	}
}

fn validate_as<T: DeserializeOwned>(json: &Json) -> Result<(), serde_json::Error> {
	T::deserialize(json).map(drop)
}

/// The declared type of a method parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
	/// Never decodes to [`Arg::Null`].
	Primitive(PrimitiveType),
	/// Nullable.
	Boxed(PrimitiveType),
	String,
	Enum(EnumType),
	Bean(BeanType),
	/// Decoded element by element from a wire array.
	Array(Box<ParamType>),
	List(Box<ParamType>),
	/// The raw wire value, passed through without decoding.
	Json,
}
impl ParamType {
	#[must_use]
	pub fn array(element: ParamType) -> Self {
		Self::Array(Box::new(element))
	}

	#[must_use]
	pub fn list(element: ParamType) -> Self {
		Self::List(Box::new(element))
	}

	/// The primitive, boxed or not.
	#[must_use]
	pub fn primitive(&self) -> Option<PrimitiveType> {
		match *self {
			Self::Primitive(primitive) | Self::Boxed(primitive) => Some(primitive),
			_ => None,
		}
	}
}
impl Display for ParamType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Primitive(primitive) => f.write_str(primitive.name()),
			Self::Boxed(primitive) => write!(f, "Option<{}>", primitive.name()),
			Self::String => f.write_str("String"),
			Self::Enum(EnumType { name, .. }) | Self::Bean(BeanType { name, .. }) => f.write_str(name),
			Self::Array(element) => write!(f, "[{}]", element),
			Self::List(element) => write!(f, "Vec<{}>", element),
			Self::Json => f.write_str("JSON"),
		}
	}
}

/// A decoded argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
	Null,
	Bool(bool),
	Byte(i8),
	Short(i16),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	String(String),
	Enum { ty: &'static str, constant: &'static str },
	Bean { ty: &'static str, json: Json },
	/// Decoded array, list or variable arguments.
	Array(Vec<Arg>),
	Json(Json),
}
impl Arg {
	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Deserializes a bean argument.
	///
	/// # Errors
	///
	/// Iff this isn't a bean argument or its JSON doesn't match `T`.
	pub fn bean<T: DeserializeOwned>(&self) -> Result<T, ArgTypeError> {
		match self {
			Self::Bean { json, .. } | Self::Json(json) => T::deserialize(json).map_err(|error| ArgTypeError::Bean(error.to_string())),
			other => Err(ArgTypeError::Mismatch {
				expected: "bean",
				found: other.kind(),
			}),
		}
	}

	#[must_use]
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Byte(_) => "i8",
			Self::Short(_) => "i16",
			Self::Int(_) => "i32",
			Self::Long(_) => "i64",
			Self::Float(_) => "f32",
			Self::Double(_) => "f64",
			Self::String(_) => "string",
			Self::Enum { .. } => "enum",
			Self::Bean { .. } => "bean",
			Self::Array(_) => "array",
			Self::Json(_) => "json",
		}
	}
}
impl Shape for Arg {
	fn shape(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Array(items) => items.as_slice().shape(f),
			Self::Enum { ty, .. } | Self::Bean { ty, .. } => f.write_str(ty),
			other => f.write_str(other.kind()),
		}
	}
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArgTypeError {
	#[error("expected a {expected} argument, found {found}")]
	Mismatch { expected: &'static str, found: &'static str },
	#[error("argument {0} is missing")]
	Missing(usize),
	#[error("bean argument doesn't match: {0}")]
	Bean(String),
}

/// Conversion from a decoded [`Arg`] into a handler's native type.
pub trait FromArg: Sized {
	/// # Errors
	///
	/// Iff `arg` has another type.
	fn from_arg(arg: Arg) -> Result<Self, ArgTypeError>;
}

macro_rules! from_arg {
	($($variant:ident => $ty:ty),*$(,)?) => {$(
		impl FromArg for $ty {
			fn from_arg(arg: Arg) -> Result<Self, ArgTypeError> {
				match arg {
					Arg::$variant(value) => Ok(value),
					other => Err(ArgTypeError::Mismatch {
						expected: stringify!($ty),
						found: other.kind(),
					}),
				}
			}
		}
	)*};
}
from_arg! {
	Bool => bool,
	Byte => i8,
	Short => i16,
	Int => i32,
	Long => i64,
	Float => f32,
	Double => f64,
	String => String,
}

impl FromArg for Json {
	fn from_arg(arg: Arg) -> Result<Self, ArgTypeError> {
		match arg {
			Arg::Json(json) | Arg::Bean { json, .. } => Ok(json),
			other => Err(ArgTypeError::Mismatch {
				expected: "JSON",
				found: other.kind(),
			}),
		}
	}
}
impl<T: FromArg> FromArg for Option<T> {
	fn from_arg(arg: Arg) -> Result<Self, ArgTypeError> {
		match arg {
			Arg::Null => Ok(None),
			other => T::from_arg(other).map(Some),
		}
	}
}
impl<T: FromArg> FromArg for Vec<T> {
	fn from_arg(arg: Arg) -> Result<Self, ArgTypeError> {
		match arg {
			Arg::Array(items) => items.into_iter().map(T::from_arg).collect(),
			other => Err(ArgTypeError::Mismatch {
				expected: "array",
				found: other.kind(),
			}),
		}
	}
}
impl FromArg for Arg {
	fn from_arg(arg: Arg) -> Result<Self, ArgTypeError> {
		Ok(arg)
	}
}

/// The decoded arguments of one invocation, variable arguments last as one [`Arg::Array`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Args(Vec<Arg>);
impl Args {
	#[must_use]
	pub fn new(args: Vec<Arg>) -> Self {
		Self(args)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn get(&self, index: usize) -> Option<&Arg> {
		self.0.get(index)
	}

	/// Moves argument `index` out, leaving [`Arg::Null`] behind.
	///
	/// # Errors
	///
	/// Iff there is no such argument or it has another type.
	pub fn take<T: FromArg>(&mut self, index: usize) -> Result<T, ArgTypeError> {
		let arg = self.0.get_mut(index).ok_or(ArgTypeError::Missing(index))?;
		T::from_arg(std::mem::replace(arg, Arg::Null))
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<Arg> {
		self.0
	}
}
impl Shape for Args {
	fn shape(&self, f: &mut Formatter<'_>) -> fmt::Result {
		self.0.as_slice().shape(f)
	}
}

#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("no decoder accepts a JSON {found} for `{ty}`")]
	Unsupported { ty: String, found: &'static str },
	#[error("expected {expected} but found a JSON {found}")]
	WrongShape { expected: String, found: &'static str },
	#[error("value is not representable as `{ty}`")]
	NotRepresentable { ty: &'static str },
	#[error("{constant:?} is not a constant of `{ty}`")]
	UnknownConstant { ty: &'static str, constant: String },
	#[error("invalid `{ty}`: {source}")]
	Bean {
		ty: &'static str,
		#[source]
		source: serde_json::Error,
	},
	#[error("element {index}: {source}")]
	Element {
		index: usize,
		#[source]
		source: Box<DecodeError>,
	},
}

/// One decoding strategy.
pub trait RpcDecoder: Debug {
	/// Whether this decoder handles `value` for `ty`.
	fn is_applicable(&self, value: &Json, ty: &ParamType) -> bool;

	/// Converts `value`. Only called if [`is_applicable`](`RpcDecoder::is_applicable`) returned `true`.
	///
	/// `registry` is available for decoding nested values.
	///
	/// # Errors
	///
	/// Iff `value` is structurally wrong for `ty`.
	fn decode(&self, value: &Json, ty: &ParamType, registry: &DecoderRegistry) -> Result<Arg, DecodeError>;
}

/// Ordered decoder chain.
#[derive(Debug)]
pub struct DecoderRegistry {
	decoders: Vec<Box<dyn RpcDecoder>>,
}
impl Default for DecoderRegistry {
	fn default() -> Self {
		Self::with_defaults()
	}
}
impl DecoderRegistry {
	/// A registry without decoders, which only handles raw JSON parameters, `null`s and arrays of those.
	#[must_use]
	pub fn empty() -> Self {
		Self { decoders: Vec::new() }
	}

	/// Direct values, string to number, string to enum constant, and beans, in that order.
	#[must_use]
	pub fn with_defaults() -> Self {
		let mut registry = Self::empty();
		registry.push(DirectDecoder);
		registry.push(StringToNumberDecoder);
		registry.push(StringToEnumDecoder);
		registry.push(BeanDecoder);
		registry
	}

	/// Appends `decoder` to the chain.
	pub fn push(&mut self, decoder: impl RpcDecoder + 'static) {
		self.decoders.push(Box::new(decoder));
	}

	/// Puts `decoder` in front of the chain, so that it takes precedence over all others.
	pub fn insert_first(&mut self, decoder: impl RpcDecoder + 'static) {
		self.decoders.insert(0, Box::new(decoder));
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.decoders.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.decoders.is_empty()
	}

	/// Decodes `value` as `ty`.
	///
	/// # Errors
	///
	/// Iff no decoder applies or the applicable one fails.
	#[instrument(skip(self, value, ty), fields(value = ?Redacted(value), ty = %ty))]
	pub fn decode(&self, value: &Json, ty: &ParamType) -> Result<Arg, DecodeError> {
		if *ty == ParamType::Json {
			return Ok(Arg::Json(value.clone()));
		}
		if value.is_null() {
			return Ok(match ty {
				ParamType::Primitive(primitive) => primitive.zero(),
				_ => Arg::Null,
			});
		}
		if let ParamType::Array(element) = ty {
			return self.decode_elements(value, ty, element);
		}

		let decoder = self
			.decoders
			.iter()
			.find(|decoder| decoder.is_applicable(value, ty))
			.ok_or_else(|| DecodeError::Unsupported {
				ty: ty.to_string(),
				found: json_kind(value),
			})?;
		trace!(?decoder, "Decoder selected.");
		decoder.decode(value, ty, self)
	}

	/// Decodes each item of the wire array `value` as `element`.
	///
	/// # Errors
	///
	/// Iff `value` is not an array or an item fails to decode.
	pub fn decode_elements(&self, value: &Json, ty: &ParamType, element: &ParamType) -> Result<Arg, DecodeError> {
		let items = value.as_array().ok_or_else(|| DecodeError::WrongShape {
			expected: ty.to_string(),
			found: json_kind(value),
		})?;
		items
			.iter()
			.enumerate()
			.map(|(index, item)| {
				self.decode(item, element).map_err(|source| DecodeError::Element {
					index,
					source: Box::new(source),
				})
			})
			.collect::<Result<Vec<_>, _>>()
			.map(Arg::Array)
	}
}

fn json_kind(value: &Json) -> &'static str {
	match value {
		Json::Null => "null",
		Json::Bool(_) => "bool",
		Json::Number(_) => "number",
		Json::String(_) => "string",
		Json::Array(_) => "array",
		Json::Object(_) => "object",
	}
}

/// Narrows an integer to `primitive`, failing instead of truncating.
#[allow(clippy::cast_precision_loss)]
fn narrow_integer(primitive: PrimitiveType, value: i128) -> Result<Arg, DecodeError> {
	let narrowed = match primitive {
		PrimitiveType::Byte => num_traits::cast(value).map(Arg::Byte),
		PrimitiveType::Short => num_traits::cast(value).map(Arg::Short),
		PrimitiveType::Int => num_traits::cast(value).map(Arg::Int),
		PrimitiveType::Long => num_traits::cast(value).map(Arg::Long),
		PrimitiveType::Float => Some(Arg::Float(value as f32)),
		PrimitiveType::Double => Some(Arg::Double(value as f64)),
		PrimitiveType::Boolean => None,
	};
	narrowed.ok_or(DecodeError::NotRepresentable { ty: primitive.name() })
}

/// Narrows a float to `primitive`. Integral targets only accept whole numbers.
#[allow(clippy::cast_possible_truncation)]
fn narrow_float(primitive: PrimitiveType, value: f64) -> Result<Arg, DecodeError> {
	let not_representable = DecodeError::NotRepresentable { ty: primitive.name() };
	if !value.is_finite() {
		return Err(not_representable);
	}
	match primitive {
		PrimitiveType::Double => Ok(Arg::Double(value)),
		PrimitiveType::Float => {
			let narrowed = value as f32;
			if narrowed.is_finite() {
				Ok(Arg::Float(narrowed))
			} else {
				Err(not_representable)
			}
		}
		_ if value.fract() == 0.0 => num_traits::cast::<f64, i128>(value).ok_or(not_representable).and_then(|value| narrow_integer(primitive, value)),
		_ => Err(not_representable),
	}
}

/// Values whose wire type already matches: booleans, numbers in range, and strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDecoder;
impl RpcDecoder for DirectDecoder {
	fn is_applicable(&self, value: &Json, ty: &ParamType) -> bool {
		match (value, ty) {
			(Json::Bool(_), _) => ty.primitive() == Some(PrimitiveType::Boolean),
			(Json::Number(_), _) => ty.primitive().map_or(false, PrimitiveType::is_numeric),
			(Json::String(_), ParamType::String) => true,
			_ => false,
		}
	}

	fn decode(&self, value: &Json, ty: &ParamType, _: &DecoderRegistry) -> Result<Arg, DecodeError> {
		match (value, ty.primitive()) {
			(Json::Bool(bool), _) => Ok(Arg::Bool(*bool)),
			(Json::String(string), _) => Ok(Arg::String(string.clone())),
			(Json::Number(number), Some(primitive)) => {
				if let Some(int) = number.as_i64() {
					narrow_integer(primitive, int.into())
				} else if let Some(uint) = number.as_u64() {
					narrow_integer(primitive, uint.into())
				} else {
					narrow_float(primitive, number.as_f64().unwrap_or(f64::NAN))
				}
			}
			_ => Err(DecodeError::WrongShape {
				expected: ty.to_string(),
				found: json_kind(value),
			}),
		}
	}
}

/// Numbers sent as strings.
///
/// Integral targets accept only integer literals within their range.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToNumberDecoder;
impl RpcDecoder for StringToNumberDecoder {
	fn is_applicable(&self, value: &Json, ty: &ParamType) -> bool {
		value.is_string() && ty.primitive().map_or(false, PrimitiveType::is_numeric)
	}

	fn decode(&self, value: &Json, ty: &ParamType, _: &DecoderRegistry) -> Result<Arg, DecodeError> {
		let (text, primitive) = match (value.as_str(), ty.primitive()) {
			(Some(text), Some(primitive)) => (text, primitive),
			_ => {
				return Err(DecodeError::WrongShape {
					expected: ty.to_string(),
					found: json_kind(value),
				})
			}
		};
		let not_representable = || DecodeError::NotRepresentable { ty: primitive.name() };

		match primitive {
			PrimitiveType::Float => text.parse::<f32>().ok().filter(|float| float.is_finite()).map(Arg::Float).ok_or_else(not_representable),
			PrimitiveType::Double => text.parse::<f64>().ok().filter(|double| double.is_finite()).map(Arg::Double).ok_or_else(not_representable),
			_ => text.parse::<i128>().map_err(|_| not_representable()).and_then(|int| narrow_integer(primitive, int)),
		}
	}
}

/// Enum constants sent by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToEnumDecoder;
impl RpcDecoder for StringToEnumDecoder {
	fn is_applicable(&self, value: &Json, ty: &ParamType) -> bool {
		value.is_string() && matches!(ty, ParamType::Enum(_))
	}

	fn decode(&self, value: &Json, ty: &ParamType, _: &DecoderRegistry) -> Result<Arg, DecodeError> {
		match (value.as_str(), ty) {
			(Some(name), ParamType::Enum(enum_type)) => enum_type
				.constants
				.iter()
				.find(|&&constant| constant == name)
				.map(|&constant| Arg::Enum { ty: enum_type.name, constant })
				.ok_or_else(|| DecodeError::UnknownConstant {
					ty: enum_type.name,
					constant: name.to_owned(),
				}),
			_ => Err(DecodeError::WrongShape {
				expected: ty.to_string(),
				found: json_kind(value),
			}),
		}
	}
}

/// Wire objects as [`BeanType`]s, and wire arrays as lists of anything the registry can decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeanDecoder;
impl RpcDecoder for BeanDecoder {
	fn is_applicable(&self, value: &Json, ty: &ParamType) -> bool {
		matches!((value, ty), (Json::Object(_), ParamType::Bean(_)) | (Json::Array(_), ParamType::List(_)))
	}

	fn decode(&self, value: &Json, ty: &ParamType, registry: &DecoderRegistry) -> Result<Arg, DecodeError> {
		match ty {
			ParamType::Bean(bean) => {
				(bean.validate)(value).map_err(|source| DecodeError::Bean { ty: bean.name, source })?;
				Ok(Arg::Bean {
					ty: bean.name,
					json: value.clone(),
				})
			}
			ParamType::List(element) => registry.decode_elements(value, ty, element),
			_ => Err(DecodeError::WrongShape {
				expected: ty.to_string(),
				found: json_kind(value),
			}),
		}
	}
}
