use proptest::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value as Json};
use state_tree_sync::decode::{Arg, BeanType, DecodeError, DecoderRegistry, EnumType, ParamType, PrimitiveType, RpcDecoder};

mod common;

const TITLE: EnumType = EnumType {
	name: "Title",
	constants: &["MRS", "MS", "DR"],
};

#[derive(Debug, Deserialize, PartialEq)]
struct Person {
	name: String,
	age: u8,
}

fn decode(value: Json, ty: &ParamType) -> Result<Arg, DecodeError> {
	common::init_tracing();
	DecoderRegistry::with_defaults().decode(&value, ty)
}

fn primitive(primitive: PrimitiveType) -> ParamType {
	ParamType::Primitive(primitive)
}

#[test]
fn direct_values() {
	assert_eq!(decode(json!(true), &primitive(PrimitiveType::Boolean)).unwrap(), Arg::Bool(true));
	assert_eq!(decode(json!(12), &primitive(PrimitiveType::Int)).unwrap(), Arg::Int(12));
	assert_eq!(decode(json!(-3), &ParamType::Boxed(PrimitiveType::Byte)).unwrap(), Arg::Byte(-3));
	assert_eq!(decode(json!(2.5), &primitive(PrimitiveType::Double)).unwrap(), Arg::Double(2.5));
	assert_eq!(decode(json!(7), &primitive(PrimitiveType::Float)).unwrap(), Arg::Float(7.0));
	assert_eq!(decode(json!("text"), &ParamType::String).unwrap(), Arg::String("text".to_owned()));
}

#[test]
fn numbers_must_fit() {
	assert!(matches!(decode(json!(i64::MAX), &primitive(PrimitiveType::Int)), Err(DecodeError::NotRepresentable { ty: "i32" })));
	assert!(matches!(decode(json!(128), &primitive(PrimitiveType::Byte)), Err(DecodeError::NotRepresentable { .. })));
	assert!(matches!(decode(json!(u64::MAX), &primitive(PrimitiveType::Long)), Err(DecodeError::NotRepresentable { .. })));
	assert!(matches!(decode(json!(1.5), &primitive(PrimitiveType::Int)), Err(DecodeError::NotRepresentable { .. })));
	assert_eq!(decode(json!(3.0), &primitive(PrimitiveType::Short)).unwrap(), Arg::Short(3));
	assert_eq!(decode(json!(i64::MAX), &primitive(PrimitiveType::Long)).unwrap(), Arg::Long(i64::MAX));
}

#[test]
fn numbers_from_strings() {
	assert_eq!(decode(json!("264"), &primitive(PrimitiveType::Long)).unwrap(), Arg::Long(264));
	assert_eq!(decode(json!("-12"), &ParamType::Boxed(PrimitiveType::Int)).unwrap(), Arg::Int(-12));
	assert_eq!(decode(json!("264.1"), &primitive(PrimitiveType::Double)).unwrap(), Arg::Double(264.1));
	assert!(matches!(decode(json!("264.1"), &primitive(PrimitiveType::Long)), Err(DecodeError::NotRepresentable { .. })));
	assert!(matches!(decode(json!("300"), &primitive(PrimitiveType::Byte)), Err(DecodeError::NotRepresentable { .. })));
	assert!(matches!(decode(json!("abc"), &primitive(PrimitiveType::Int)), Err(DecodeError::NotRepresentable { .. })));
	assert!(matches!(decode(json!("NaN"), &primitive(PrimitiveType::Double)), Err(DecodeError::NotRepresentable { .. })));
}

#[test]
fn numeric_strings_must_fit_too() {
	assert!(matches!(decode(json!("32768"), &primitive(PrimitiveType::Short)), Err(DecodeError::NotRepresentable { ty: "i16" })));
	assert!(matches!(decode(json!("-32769"), &primitive(PrimitiveType::Short)), Err(DecodeError::NotRepresentable { ty: "i16" })));
	assert_eq!(decode(json!("-32768"), &primitive(PrimitiveType::Short)).unwrap(), Arg::Short(i16::MIN));

	let long_max = i64::MAX.to_string();
	assert!(matches!(decode(json!(long_max), &primitive(PrimitiveType::Int)), Err(DecodeError::NotRepresentable { ty: "i32" })));
	assert_eq!(decode(json!(long_max), &primitive(PrimitiveType::Long)).unwrap(), Arg::Long(i64::MAX));
	assert!(matches!(decode(json!("9223372036854775808"), &primitive(PrimitiveType::Long)), Err(DecodeError::NotRepresentable { ty: "i64" })));
}

proptest! {
	#[test]
	fn integer_strings_decode_to_their_value(short in any::<i16>(), int in any::<i32>(), long in any::<i64>()) {
		prop_assert_eq!(decode(json!(short.to_string()), &primitive(PrimitiveType::Short)).unwrap(), Arg::Short(short));
		prop_assert_eq!(decode(json!(int.to_string()), &primitive(PrimitiveType::Int)).unwrap(), Arg::Int(int));
		prop_assert_eq!(decode(json!(long.to_string()), &primitive(PrimitiveType::Long)).unwrap(), Arg::Long(long));
	}

	#[test]
	fn float_strings_decode_to_their_value(
		float in any::<f32>().prop_filter("finite", |float| float.is_finite()),
		double in any::<f64>().prop_filter("finite", |double| double.is_finite()),
	) {
		prop_assert_eq!(decode(json!(float.to_string()), &primitive(PrimitiveType::Float)).unwrap(), Arg::Float(float));
		prop_assert_eq!(decode(json!(double.to_string()), &primitive(PrimitiveType::Double)).unwrap(), Arg::Double(double));
	}
}

#[test]
fn strings_do_not_become_booleans() {
	assert!(matches!(decode(json!("true"), &primitive(PrimitiveType::Boolean)), Err(DecodeError::Unsupported { .. })));
	assert!(matches!(decode(json!(1), &ParamType::String), Err(DecodeError::Unsupported { .. })));
}

#[test]
fn enum_constants_by_name() {
	assert_eq!(
		decode(json!("MRS"), &ParamType::Enum(TITLE)).unwrap(),
		Arg::Enum {
			ty: "Title",
			constant: "MRS"
		}
	);
	match decode(json!("MR"), &ParamType::Enum(TITLE)) {
		Err(DecodeError::UnknownConstant { ty: "Title", constant }) => assert_eq!(constant, "MR"),
		other => panic!("unexpected {:?}", other),
	}
	assert!(matches!(decode(json!(1), &ParamType::Enum(TITLE)), Err(DecodeError::Unsupported { .. })));
}

#[test]
fn beans_are_validated() {
	let ty = ParamType::Bean(BeanType::of::<Person>("Person"));
	let arg = decode(json!({ "name": "Ada", "age": 36 }), &ty).unwrap();
	assert_eq!(
		arg.bean::<Person>().unwrap(),
		Person {
			name: "Ada".to_owned(),
			age: 36
		}
	);

	assert!(matches!(decode(json!({ "name": "Ada" }), &ty), Err(DecodeError::Bean { ty: "Person", .. })));
	assert!(matches!(decode(json!("Ada"), &ty), Err(DecodeError::Unsupported { .. })));
}

#[test]
fn null_is_zero_for_primitives_only() {
	assert_eq!(decode(Json::Null, &primitive(PrimitiveType::Int)).unwrap(), Arg::Int(0));
	assert_eq!(decode(Json::Null, &primitive(PrimitiveType::Boolean)).unwrap(), Arg::Bool(false));
	assert_eq!(decode(Json::Null, &ParamType::Boxed(PrimitiveType::Int)).unwrap(), Arg::Null);
	assert_eq!(decode(Json::Null, &ParamType::String).unwrap(), Arg::Null);
	assert_eq!(decode(Json::Null, &ParamType::array(ParamType::String)).unwrap(), Arg::Null);
}

#[test]
fn arrays_and_lists_decode_element_wise() {
	let ty = ParamType::array(primitive(PrimitiveType::Int));
	assert_eq!(decode(json!([1, "2", null]), &ty).unwrap(), Arg::Array(vec![Arg::Int(1), Arg::Int(2), Arg::Int(0)]));
	assert_eq!(
		decode(json!(["MS"]), &ParamType::list(ParamType::Enum(TITLE))).unwrap(),
		Arg::Array(vec![Arg::Enum { ty: "Title", constant: "MS" }])
	);

	match decode(json!([1, "x"]), &ty) {
		Err(DecodeError::Element { index: 1, .. }) => (),
		other => panic!("unexpected {:?}", other),
	}
	assert!(matches!(decode(json!(1), &ty), Err(DecodeError::WrongShape { .. })));
}

#[test]
fn raw_json_passes_through() {
	let value = json!({ "anything": [1, 2] });
	assert_eq!(decode(value.clone(), &ParamType::Json).unwrap(), Arg::Json(value));
	assert_eq!(decode(Json::Null, &ParamType::Json).unwrap(), Arg::Json(Json::Null));
}

#[derive(Debug)]
struct YesNo;
impl RpcDecoder for YesNo {
	fn is_applicable(&self, value: &Json, ty: &ParamType) -> bool {
		value.is_string() && ty.primitive() == Some(PrimitiveType::Boolean)
	}

	fn decode(&self, value: &Json, ty: &ParamType, _: &DecoderRegistry) -> Result<Arg, DecodeError> {
		match value.as_str() {
			Some("yes") => Ok(Arg::Bool(true)),
			Some("no") => Ok(Arg::Bool(false)),
			_ => Err(DecodeError::WrongShape {
				expected: ty.to_string(),
				found: "string",
			}),
		}
	}
}

#[derive(Debug)]
struct Shadow;
impl RpcDecoder for Shadow {
	fn is_applicable(&self, _: &Json, ty: &ParamType) -> bool {
		*ty == ParamType::String
	}

	fn decode(&self, _: &Json, _: &ParamType, _: &DecoderRegistry) -> Result<Arg, DecodeError> {
		Ok(Arg::String("shadowed".to_owned()))
	}
}

#[test]
fn custom_decoders_extend_the_chain() {
	common::init_tracing();
	let mut registry = DecoderRegistry::with_defaults();
	let defaults = registry.len();
	registry.push(YesNo);
	assert_eq!(registry.len(), defaults + 1);
	assert_eq!(registry.decode(&json!("yes"), &primitive(PrimitiveType::Boolean)).unwrap(), Arg::Bool(true));
	assert_eq!(registry.decode(&json!("text"), &ParamType::String).unwrap(), Arg::String("text".to_owned()));

	registry.insert_first(Shadow);
	assert_eq!(registry.decode(&json!("text"), &ParamType::String).unwrap(), Arg::String("shadowed".to_owned()));
}

#[test]
fn empty_registry_only_passes_through() {
	common::init_tracing();
	let registry = DecoderRegistry::empty();
	assert!(registry.is_empty());
	assert!(matches!(registry.decode(&json!(1), &primitive(PrimitiveType::Int)), Err(DecodeError::Unsupported { .. })));
	assert_eq!(registry.decode(&json!(1), &ParamType::Json).unwrap(), Arg::Json(json!(1)));
}
