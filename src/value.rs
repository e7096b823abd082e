use std::rc::Rc;

use indexmap::IndexMap;

use crate::observable::Observable;

/// Fields of a plain record, in insertion order.
pub type Fields = IndexMap<String, Value>;

/// Dynamic structured data.
///
/// `Record` and `List` are plain containers; once handed to
/// [`observable`](crate::observable()) or assigned through an
/// [`Observable`], they are replaced by `Value::Observable`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(Rc<str>),
	Record(Fields),
	List(Vec<Value>),
	Observable(Observable),
}

impl Value {
	pub fn record<K, I>(fields: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Value)>,
	{
		Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}

	pub fn list<I>(items: I) -> Self
	where
		I: IntoIterator<Item = Value>,
	{
		Value::List(items.into_iter().collect())
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Str(_) => "str",
			Value::Record(_) => "record",
			Value::List(_) => "list",
			Value::Observable(_) => "observable",
		}
	}

	/// Records, lists and observables can hold trackable fields.
	pub fn is_structured(&self) -> bool {
		matches!(
			self,
			Value::Record(_) | Value::List(_) | Value::Observable(_)
		)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Value::Float(f) => Some(*f),
			Value::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_observable(&self) -> Option<&Observable> {
		match self {
			Value::Observable(o) => Some(o),
			_ => None,
		}
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Value::Int(i)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Value::Int(i as i64)
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Value::Float(f)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(Rc::from(s))
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(Rc::from(s))
	}
}

impl From<Fields> for Value {
	fn from(fields: Fields) -> Self {
		Value::Record(fields)
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::List(items)
	}
}

impl From<Observable> for Value {
	fn from(observable: Observable) -> Self {
		Value::Observable(observable)
	}
}

impl<T> From<Option<T>> for Value
where
	T: Into<Value>,
{
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Null, Into::into)
	}
}

impl TryFrom<Value> for bool {
	type Error = Value;
	fn try_from(value: Value) -> Result<Self, Self::Error> {
		value.as_bool().ok_or(value)
	}
}

impl TryFrom<Value> for i64 {
	type Error = Value;
	fn try_from(value: Value) -> Result<Self, Self::Error> {
		value.as_int().ok_or(value)
	}
}

impl TryFrom<Value> for f64 {
	type Error = Value;
	fn try_from(value: Value) -> Result<Self, Self::Error> {
		value.as_float().ok_or(value)
	}
}

impl TryFrom<Value> for String {
	type Error = Value;
	fn try_from(value: Value) -> Result<Self, Self::Error> {
		match value {
			Value::Str(s) => Ok(s.to_string()),
			other => Err(other),
		}
	}
}

impl TryFrom<Value> for Observable {
	type Error = Value;
	fn try_from(value: Value) -> Result<Self, Self::Error> {
		match value {
			Value::Observable(o) => Ok(o),
			other => Err(other),
		}
	}
}
