use std::fmt::{self, Display};
use std::rc::Rc;

use fxhash::FxBuildHasher;
use indexmap::{IndexMap, IndexSet};

use crate::observable::ObservableId;

/// Addresses one field of an observable.
///
/// `Length` stands for the length of a list or the number of
/// fields of a record; it changes whenever an entry is added or removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
	Name(Rc<str>),
	Index(usize),
	Length,
}

impl Key {
	pub fn name(name: &str) -> Self {
		Key::Name(Rc::from(name))
	}

	/// Normalise a key against a list: numeric names become indices
	/// and `"length"` becomes [`Key::Length`].
	pub(crate) fn for_list(self) -> Self {
		match self {
			Key::Name(name) if &*name == "length" => Key::Length,
			Key::Name(name) => match name.parse::<usize>() {
				Ok(index) => Key::Index(index),
				Err(_) => Key::Name(name),
			},
			key => key,
		}
	}

	/// Normalise a key against a record: indices become their decimal name.
	pub(crate) fn for_record(self) -> Self {
		match self {
			Key::Index(index) => Key::Name(Rc::from(index.to_string())),
			key => key,
		}
	}
}

impl From<&str> for Key {
	fn from(name: &str) -> Self {
		Key::name(name)
	}
}

impl From<String> for Key {
	fn from(name: String) -> Self {
		Key::Name(Rc::from(name))
	}
}

impl From<usize> for Key {
	fn from(index: usize) -> Self {
		Key::Index(index)
	}
}

impl Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Key::Name(name) => f.write_str(name),
			Key::Index(index) => write!(f, "{}", index),
			Key::Length => f.write_str("length"),
		}
	}
}

pub(crate) type KeySet = IndexSet<Key, FxBuildHasher>;

/// An ordered set of `(observable, key)` pairs.
///
/// Used both for the reads of one evaluation and for the writes
/// accumulated by a transaction.
#[derive(Default, Debug, Clone)]
pub(crate) struct FieldSet {
	fields: IndexMap<ObservableId, KeySet, FxBuildHasher>,
}

impl FieldSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, id: ObservableId, key: Key) -> bool {
		self.fields.entry(id).or_default().insert(key)
	}

	pub fn contains(&self, id: ObservableId, key: &Key) -> bool {
		self.fields.get(&id).map_or(false, |keys| keys.contains(key))
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn len(&self) -> usize {
		self.fields.values().map(|keys| keys.len()).sum()
	}

	pub fn iter(&self) -> impl Iterator<Item = (ObservableId, &Key)> + '_ {
		self.fields
			.iter()
			.flat_map(|(id, keys)| keys.iter().map(move |key| (*id, key)))
	}
}
