use std::rc::Rc;

use crate::computation::{ComputationId, Reactive};
use crate::key::{FieldSet, Key};
use crate::observable::ObservableId;
use crate::registry;

/// The fields a computation read during one run.
#[derive(Default, Debug)]
pub struct Dependencies {
	based_on: FieldSet,
}

impl Dependencies {
	pub fn new() -> Self {
		Self {
			based_on: FieldSet::new(),
		}
	}

	pub(crate) fn based_on(&mut self, id: ObservableId, key: Key) {
		self.based_on.insert(id, key);
	}

	#[cfg(test)]
	pub fn contains(&self, id: ObservableId, key: &Key) -> bool {
		self.based_on.contains(id, key)
	}

	pub fn len(&self) -> usize {
		self.based_on.len()
	}

	/// Unsubscribe `parent` from everything it depends on.
	pub(crate) fn drop(&mut self, parent: ComputationId) {
		let prev = std::mem::take(&mut self.based_on);
		for (id, key) in prev.iter() {
			registry::unsubscribe(id, key, parent);
		}
	}

	/// Subscribe `parent` to the reads of its latest run and drop the
	/// subscriptions the latest run no longer needs.
	pub(crate) fn swap(&mut self, next: Dependencies, parent: &Rc<dyn Reactive>) {
		for (id, key) in next.based_on.iter() {
			registry::subscribe(id, key, parent);
		}

		let prev = std::mem::replace(&mut self.based_on, next.based_on);

		// Diff the keys
		prev.iter()
			.filter(|(id, key)| !self.based_on.contains(*id, key))
			.for_each(|(id, key)| registry::unsubscribe(id, key, parent.id()));
	}
}
