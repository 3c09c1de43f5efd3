//! Dynamic values.
//!
//! [`Value`] is the currency of the runtime: component state, resolved props,
//! slot data and event payloads are all made of it. Its semantics follow the
//! loosely typed data model components are written against (JS-like truthiness,
//! `undefined` distinct from `null`), while keeping integers and floats apart so
//! counters stay exact.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key-ordered object representation.
pub type Object = BTreeMap<String, Value>;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
	/// Absent value. Unbound props and failed prop bindings resolve to this.
	#[default]
	Undefined,
	/// Explicit null.
	Null,
	/// Boolean.
	Bool(bool),
	/// 64-bit signed integer.
	Int(i64),
	/// 64-bit float.
	Float(f64),
	/// UTF-8 string.
	String(String),
	/// Ordered list.
	List(Vec<Value>),
	/// String-keyed object.
	Object(Object),
}

impl Value {
	/// Returns the type name used in diagnostics.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Undefined => "undefined",
			Self::Null => "null",
			Self::Bool(_) => "boolean",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::List(_) => "list",
			Self::Object(_) => "object",
		}
	}

	/// Returns `true` for [`Value::Undefined`].
	pub fn is_undefined(&self) -> bool {
		matches!(self, Self::Undefined)
	}

	/// Returns `true` for [`Value::Undefined`] and [`Value::Null`].
	pub fn is_nullish(&self) -> bool {
		matches!(self, Self::Undefined | Self::Null)
	}

	/// JS-like truthiness: `undefined`, `null`, `false`, `0`, `NaN` and `""` are falsy.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Undefined | Self::Null => false,
			Self::Bool(b) => *b,
			Self::Int(n) => *n != 0,
			Self::Float(f) => *f != 0.0 && !f.is_nan(),
			Self::String(s) => !s.is_empty(),
			Self::List(_) | Self::Object(_) => true,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(n) => Some(*n),
			_ => None,
		}
	}

	/// Numeric view of ints and floats.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Int(n) => Some(*n as f64),
			Self::Float(f) => Some(*f),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Self::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
		match self {
			Self::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&Object> {
		match self {
			Self::Object(map) => Some(map),
			_ => None,
		}
	}

	/// Reads a field of an object value.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.as_object().and_then(|map| map.get(key))
	}

	/// Equality with numeric coercion between ints and floats.
	pub fn loose_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
			_ => self == other,
		}
	}

	/// Ordering for numbers (with coercion) and strings; `None` otherwise.
	pub fn partial_order(&self, other: &Value) -> Option<Ordering> {
		match (self, other) {
			(Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
			(Self::String(a), Self::String(b)) => Some(a.cmp(b)),
			_ => match (self.as_f64(), other.as_f64()) {
				(Some(a), Some(b)) => a.partial_cmp(&b),
				_ => None,
			},
		}
	}

	/// Text used for interpolation: nullish values render empty, lists and
	/// objects render as JSON.
	pub fn to_display_string(&self) -> String {
		match self {
			Self::Undefined | Self::Null => String::new(),
			Self::Bool(b) => b.to_string(),
			Self::Int(n) => n.to_string(),
			Self::Float(f) => f.to_string(),
			Self::String(s) => s.clone(),
			Self::List(_) | Self::Object(_) => self.to_json().to_string(),
		}
	}

	/// Converts to JSON. `undefined` becomes `null`; non-finite floats become `null`.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Self::Undefined | Self::Null => serde_json::Value::Null,
			Self::Bool(b) => serde_json::Value::Bool(*b),
			Self::Int(n) => serde_json::Value::from(*n),
			Self::Float(f) => serde_json::Number::from_f64(*f)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
			Self::String(s) => serde_json::Value::String(s.clone()),
			Self::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
			Self::Object(map) => serde_json::Value::Object(
				map.iter()
					.map(|(key, value)| (key.clone(), value.to_json()))
					.collect(),
			),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_display_string())
	}
}

impl From<serde_json::Value> for Value {
	fn from(json: serde_json::Value) -> Self {
		match json {
			serde_json::Value::Null => Self::Null,
			serde_json::Value::Bool(b) => Self::Bool(b),
			serde_json::Value::Number(n) => match n.as_i64() {
				Some(i) => Self::Int(i),
				None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
			},
			serde_json::Value::String(s) => Self::String(s),
			serde_json::Value::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
			serde_json::Value::Object(map) => Self::Object(
				map.into_iter()
					.map(|(key, value)| (key, Value::from(value)))
					.collect(),
			),
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
		Self::Int(i64::from(value))
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<u32> for Value {
	fn from(value: u32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<usize> for Value {
	fn from(value: usize) -> Self {
		i64::try_from(value)
			.map(Self::Int)
			.unwrap_or(Self::Float(value as f64))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<Object> for Value {
	fn from(value: Object) -> Self {
		Self::Object(value)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(values: Vec<T>) -> Self {
		Self::List(values.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Self::Null)
	}
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.to_json().serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for Value {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		serde_json::Value::deserialize(deserializer).map(Value::from)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(Value::Undefined, false)]
	#[case(Value::Null, false)]
	#[case(Value::Bool(false), false)]
	#[case(Value::Int(0), false)]
	#[case(Value::Float(f64::NAN), false)]
	#[case(Value::from(""), false)]
	#[case(Value::Int(-1), true)]
	#[case(Value::from("0"), true)]
	#[case(Value::List(vec![]), true)]
	#[case(Value::Object(Object::new()), true)]
	fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
		assert_eq!(value.is_truthy(), expected);
	}

	#[rstest]
	fn test_from_json_keeps_integers_exact() {
		let value = Value::from(json!({"id": 1, "ratio": 0.5, "tags": ["a"]}));
		assert_eq!(value.get("id"), Some(&Value::Int(1)));
		assert_eq!(value.get("ratio"), Some(&Value::Float(0.5)));
		assert_eq!(
			value.get("tags"),
			Some(&Value::List(vec![Value::from("a")]))
		);
	}

	#[rstest]
	fn test_display_string() {
		assert_eq!(Value::Undefined.to_display_string(), "");
		assert_eq!(Value::Float(2.0).to_display_string(), "2");
		assert_eq!(Value::Float(1.5).to_display_string(), "1.5");
		assert_eq!(
			Value::from(json!({"b": 2, "a": 1})).to_display_string(),
			r#"{"a":1,"b":2}"#
		);
	}

	#[rstest]
	fn test_loose_eq_coerces_numbers() {
		assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
		assert!(!Value::Int(1).loose_eq(&Value::from("1")));
	}

	#[rstest]
	fn test_partial_order() {
		assert_eq!(
			Value::Int(1).partial_order(&Value::Float(1.5)),
			Some(Ordering::Less)
		);
		assert_eq!(
			Value::from("b").partial_order(&Value::from("a")),
			Some(Ordering::Greater)
		);
		assert_eq!(Value::Int(1).partial_order(&Value::from("a")), None);
	}

	fn arb_json() -> impl Strategy<Value = serde_json::Value> {
		let leaf = prop_oneof![
			Just(serde_json::Value::Null),
			any::<bool>().prop_map(serde_json::Value::Bool),
			any::<i64>().prop_map(serde_json::Value::from),
			"[a-z]{0,6}".prop_map(serde_json::Value::String),
		];
		leaf.prop_recursive(3, 16, 4, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
				prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(|map| {
					serde_json::Value::Object(map.into_iter().collect())
				}),
			]
		})
	}

	proptest! {
		#[test]
		fn prop_json_conversion_is_lossless(json in arb_json()) {
			let value = Value::from(json.clone());
			prop_assert_eq!(value.to_json(), json);
		}
	}
}
