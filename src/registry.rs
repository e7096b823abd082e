//! Per-thread table from `(observable, key)` to the computations
//! that read it during their latest run.
//!
//! The table is keyed by [`ObservableId`], so it never keeps an
//! observable alive. Entries are pruned as soon as they become empty.
//!
//! No borrow of the table is held while a computation runs, and
//! anything removed from it is dropped only after the borrow is
//! released: dropping a computation may drop the observables it
//! captured, which reach back into the table.

use std::cell::RefCell;
use std::rc::Rc;

use fxhash::{FxBuildHasher, FxHashMap};
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::computation::{ComputationId, Reactive};
use crate::key::{FieldSet, Key};
use crate::observable::{Observable, ObservableId};

type Subscribers = IndexMap<ComputationId, Rc<dyn Reactive>, FxBuildHasher>;

type Batch = SmallVec<[Rc<dyn Reactive>; 8]>;

#[derive(Default)]
struct Registry {
	values: FxHashMap<ObservableId, FxHashMap<Key, Subscribers>>,
}

thread_local! {
	static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

impl Registry {
	fn subscribe(&mut self, id: ObservableId, key: &Key, computation: &Rc<dyn Reactive>) {
		let subscribers = self
			.values
			.entry(id)
			.or_default()
			.entry(key.clone())
			.or_default();

		if !subscribers.contains_key(&computation.id()) {
			subscribers.insert(computation.id(), computation.clone());
		}
	}

	fn unsubscribe(
		&mut self,
		id: ObservableId,
		key: &Key,
		computation: ComputationId,
	) -> Option<Rc<dyn Reactive>> {
		let fields = self.values.get_mut(&id)?;
		let subscribers = fields.get_mut(key)?;
		let removed = subscribers.shift_remove(&computation);

		if subscribers.is_empty() {
			fields.remove(key);
		}
		if fields.is_empty() {
			self.values.remove(&id);
		}

		removed
	}

	fn subscribers(&self, id: ObservableId, key: &Key) -> Option<&Subscribers> {
		self.values.get(&id)?.get(key)
	}
}

pub(crate) fn subscribe(id: ObservableId, key: &Key, computation: &Rc<dyn Reactive>) {
	tracing::trace!(observable = ?id, %key, computation = ?computation.id(), "subscribe");
	REGISTRY.with(|r| r.borrow_mut().subscribe(id, key, computation));
}

pub(crate) fn unsubscribe(id: ObservableId, key: &Key, computation: ComputationId) {
	tracing::trace!(observable = ?id, %key, ?computation, "unsubscribe");
	let removed = REGISTRY
		.try_with(|r| r.borrow_mut().unsubscribe(id, key, computation))
		.ok()
		.flatten();
	drop(removed);
}

/// Drop every entry of an observable that no longer exists.
pub(crate) fn forget(id: ObservableId) {
	let removed = REGISTRY
		.try_with(|r| r.try_borrow_mut().ok().and_then(|mut r| r.values.remove(&id)))
		.ok()
		.flatten();
	drop(removed);
}

/// Run every computation subscribed to `(id, key)`, in subscription order.
pub(crate) fn notify(id: ObservableId, key: &Key) {
	let batch: Batch = REGISTRY.with(|r| {
		r.borrow()
			.subscribers(id, key)
			.map(|subscribers| subscribers.values().cloned().collect())
			.unwrap_or_default()
	});

	if batch.is_empty() {
		return;
	}

	tracing::trace!(observable = ?id, %key, count = batch.len(), "notify");
	run(batch);
}

/// Run every computation subscribed to any of `changes` exactly once.
pub(crate) fn notify_batch(changes: &FieldSet) {
	let batch: Batch = REGISTRY.with(|r| {
		let registry = r.borrow();
		let mut unique = IndexMap::<ComputationId, Rc<dyn Reactive>, FxBuildHasher>::default();

		for (id, key) in changes.iter() {
			if let Some(subscribers) = registry.subscribers(id, key) {
				for (computation, reactive) in subscribers {
					unique
						.entry(*computation)
						.or_insert_with(|| reactive.clone());
				}
			}
		}

		unique.into_values().collect()
	});

	tracing::trace!(changed = changes.len(), count = batch.len(), "notify batch");
	run(batch);
}

fn run(batch: Batch) {
	for reactive in batch {
		reactive.update();
	}
}

/// Number of computations currently subscribed to `key` of `observable`.
pub fn subscriber_count(observable: &Observable, key: impl Into<Key>) -> usize {
	let key = observable.normalize(key.into());
	REGISTRY.with(|r| {
		r.borrow()
			.subscribers(observable.id(), &key)
			.map_or(0, |s| s.len())
	})
}

/// Whether any computation is subscribed to any field of `observable`.
pub fn is_tracked(observable: &Observable) -> bool {
	REGISTRY.with(|r| r.borrow().values.contains_key(&observable.id()))
}

/// Number of observables that have at least one subscribed field.
pub fn tracked_values() -> usize {
	REGISTRY.with(|r| r.borrow().values.len())
}
