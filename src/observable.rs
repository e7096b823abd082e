use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::ops::Range;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::evaluation;
use crate::key::Key;
use crate::registry;
use crate::transaction::{self, transaction};
use crate::value::{Fields, Value};

/// Stable identity of an observable, used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservableId(u64);

impl ObservableId {
	pub(crate) fn new() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

/// Wrap a record or a list so that reads and writes of its fields are tracked.
///
/// Nested records and lists are wrapped too, recursively. Passing an
/// observable returns the very same handle.
///
/// ```
/// use tracked::{observable, Value};
///
/// let data = observable(Value::record([
/// 	("count", Value::from(1)),
/// 	("name", Value::from("John")),
/// ]))
/// .unwrap();
///
/// assert_eq!(data.get_as::<i64>("count"), Some(1));
/// assert!(observable(Value::from(1)).is_err());
/// ```
pub fn observable(value: impl Into<Value>) -> Result<Observable> {
	match value.into() {
		Value::Observable(observable) => Ok(observable),
		Value::Record(fields) => Ok(Observable::record(fields)),
		Value::List(items) => Ok(Observable::list(items)),
		other => Err(Error::UnsupportedType {
			found: other.type_name(),
		}),
	}
}

/// Replace plain records and lists with observables, leave the rest alone.
fn wrap(value: Value) -> Value {
	match value {
		Value::Record(fields) => Value::Observable(Observable::record(fields)),
		Value::List(items) => Value::Observable(Observable::list(items)),
		other => other,
	}
}

/// A tracked record or list.
///
/// Cloning the handle is cheap and yields the same observable.
#[derive(Clone)]
pub struct Observable {
	body: Rc<ObservableBody>,
}

struct ObservableBody {
	id: ObservableId,
	shape: RefCell<Shape>,
}

impl Drop for ObservableBody {
	fn drop(&mut self) {
		registry::forget(self.id);
	}
}

enum Shape {
	Record(Fields),
	List(Vec<Value>),
}

enum Outcome {
	Ignored,
	Assigned {
		previous: Vec<Value>,
		resized: bool,
		/// List slots other than the written one whose contents changed.
		touched: Range<usize>,
	},
}

impl Shape {
	fn len(&self) -> usize {
		match self {
			Shape::Record(fields) => fields.len(),
			Shape::List(items) => items.len(),
		}
	}

	fn get(&self, key: &Key) -> Option<Value> {
		match (self, key) {
			(_, Key::Length) => Some(Value::Int(self.len() as i64)),
			(Shape::Record(fields), Key::Name(name)) => fields.get(&**name).cloned(),
			(Shape::List(items), Key::Index(index)) => items.get(*index).cloned(),
			_ => None,
		}
	}

	fn set(&mut self, key: &Key, value: Value) -> Outcome {
		match (self, key) {
			(Shape::Record(fields), Key::Name(name)) => {
				let previous = fields.insert(name.to_string(), value);
				let resized = previous.is_none();
				Outcome::Assigned {
					previous: previous.into_iter().collect(),
					resized,
					touched: 0..0,
				}
			}
			(Shape::List(items), Key::Index(index)) => {
				if *index < items.len() {
					let previous = std::mem::replace(&mut items[*index], value);
					Outcome::Assigned {
						previous: vec![previous],
						resized: false,
						touched: 0..0,
					}
				} else {
					// Slots between the old end and `index` are filled with nulls.
					let old_len = items.len();
					items.resize(*index, Value::Null);
					items.push(value);
					Outcome::Assigned {
						previous: Vec::new(),
						resized: true,
						touched: old_len..*index,
					}
				}
			}
			(Shape::List(items), Key::Length) => match value {
				Value::Int(len) if len >= 0 => {
					let len = len as usize;
					let old_len = items.len();
					if len < old_len {
						Outcome::Assigned {
							previous: items.split_off(len),
							resized: true,
							touched: len..old_len,
						}
					} else {
						items.resize(len, Value::Null);
						Outcome::Assigned {
							previous: Vec::new(),
							resized: len != old_len,
							touched: old_len..len,
						}
					}
				}
				_ => Outcome::Ignored,
			},
			_ => Outcome::Ignored,
		}
	}

	fn snapshot(&self) -> Value {
		match self {
			Shape::Record(fields) => Value::Record(
				fields
					.iter()
					.map(|(k, v)| (k.clone(), snapshot(v)))
					.collect(),
			),
			Shape::List(items) => Value::List(items.iter().map(snapshot).collect()),
		}
	}
}

fn snapshot(value: &Value) -> Value {
	match value {
		Value::Observable(observable) => observable.snapshot(),
		other => other.clone(),
	}
}

impl Observable {
	fn record(fields: Fields) -> Self {
		let fields = fields.into_iter().map(|(k, v)| (k, wrap(v))).collect();
		Self::from_shape(Shape::Record(fields))
	}

	fn list(items: Vec<Value>) -> Self {
		let items = items.into_iter().map(wrap).collect();
		Self::from_shape(Shape::List(items))
	}

	fn from_shape(shape: Shape) -> Self {
		Observable {
			body: Rc::new(ObservableBody {
				id: ObservableId::new(),
				shape: RefCell::new(shape),
			}),
		}
	}

	pub fn id(&self) -> ObservableId {
		self.body.id
	}

	pub fn ptr_eq(&self, other: &Observable) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	pub fn is_list(&self) -> bool {
		matches!(*self.body.shape.borrow(), Shape::List(_))
	}

	pub fn is_record(&self) -> bool {
		!self.is_list()
	}

	pub(crate) fn normalize(&self, key: Key) -> Key {
		if self.is_list() {
			key.for_list()
		} else {
			key.for_record()
		}
	}

	/// Read a field, recording the dependency if a computation is running.
	pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
		let key = self.normalize(key.into());
		let value = self.body.shape.borrow().get(&key);
		evaluation::record(self.id(), key);
		value
	}

	/// Read a field and convert it, see [`Value`]'s `TryFrom` impls.
	pub fn get_as<T>(&self, key: impl Into<Key>) -> Option<T>
	where
		T: TryFrom<Value>,
	{
		self.get(key).and_then(|value| T::try_from(value).ok())
	}

	/// Number of items of a list, or of fields of a record.
	pub fn len(&self) -> usize {
		let len = self.body.shape.borrow().len();
		evaluation::record(self.id(), Key::Length);
		len
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Keys currently present. Depends on the set of keys, not on their values.
	pub fn keys(&self) -> Vec<Key> {
		let keys = match &*self.body.shape.borrow() {
			Shape::Record(fields) => fields.keys().map(|k| Key::from(k.as_str())).collect(),
			Shape::List(items) => (0..items.len()).map(Key::Index).collect(),
		};
		evaluation::record(self.id(), Key::Length);
		keys
	}

	/// Assign a field and notify every computation that read it.
	///
	/// Records and lists are wrapped before they are stored. Inside a
	/// [`transaction`] the notification is deferred until it closes.
	pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) {
		let key = self.normalize(key.into());
		let value = wrap(value.into());

		let outcome = self.body.shape.borrow_mut().set(&key, value);
		match outcome {
			Outcome::Ignored => {
				tracing::warn!(observable = ?self.id(), %key, "write ignored, key does not address this value");
			}
			Outcome::Assigned {
				previous,
				resized,
				touched,
			} => {
				drop(previous);
				if !resized && touched.is_empty() {
					transaction::changed(self.id(), key);
					return;
				}

				transaction(|| {
					for index in touched {
						transaction::changed(self.id(), Key::Index(index));
					}
					if resized && key != Key::Length {
						transaction::changed(self.id(), Key::Length);
					}
					transaction::changed(self.id(), key);
				});
			}
		}
	}

	/// Append to a list.
	pub fn push(&self, value: impl Into<Value>) {
		let index = match &*self.body.shape.borrow() {
			Shape::List(items) => items.len(),
			Shape::Record(_) => {
				tracing::warn!(observable = ?self.id(), "push on a record ignored");
				return;
			}
		};
		self.set(Key::Index(index), value);
	}

	/// Remove the last item of a list.
	pub fn pop(&self) -> Option<Value> {
		let (popped, index) = match &mut *self.body.shape.borrow_mut() {
			Shape::List(items) => (items.pop()?, items.len()),
			Shape::Record(_) => {
				tracing::warn!(observable = ?self.id(), "pop on a record ignored");
				return None;
			}
		};

		transaction(|| {
			transaction::changed(self.id(), Key::Index(index));
			transaction::changed(self.id(), Key::Length);
		});
		Some(popped)
	}

	/// Remove a record field, or a list item shifting the following ones down.
	pub fn remove(&self, key: impl Into<Key>) -> Option<Value> {
		let key = self.normalize(key.into());

		let (removed, shifted) = match (&mut *self.body.shape.borrow_mut(), &key) {
			(Shape::Record(fields), Key::Name(name)) => (fields.shift_remove(&**name)?, 0..0),
			(Shape::List(items), Key::Index(index)) if *index < items.len() => {
				let len = items.len();
				(items.remove(*index), *index..len)
			}
			(Shape::List(items), Key::Index(index)) => {
				tracing::debug!(observable = ?self.id(), index, len = items.len(), "remove past the end of a list");
				return None;
			}
			_ => {
				tracing::warn!(observable = ?self.id(), %key, "remove ignored, key does not address this value");
				return None;
			}
		};

		transaction(|| {
			if shifted.is_empty() {
				transaction::changed(self.id(), key);
			} else {
				for index in shifted {
					transaction::changed(self.id(), Key::Index(index));
				}
			}
			transaction::changed(self.id(), Key::Length);
		});
		Some(removed)
	}

	/// Deep copy of the current contents as plain values. Nothing is tracked.
	pub fn snapshot(&self) -> Value {
		self.body.shape.borrow().snapshot()
	}
}

impl PartialEq for Observable {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Debug for Observable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self.body.shape.try_borrow().as_deref() {
			Ok(Shape::Record(_)) => "record",
			Ok(Shape::List(_)) => "list",
			Err(_) => "<borrowed>",
		};
		f.debug_struct("Observable")
			.field("id", &self.id())
			.field("kind", &kind)
			.finish()
	}
}
