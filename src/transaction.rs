use std::cell::{Cell, RefCell};

use crate::key::{FieldSet, Key};
use crate::observable::ObservableId;
use crate::registry;

thread_local! {
	static DEPTH: Cell<usize> = Cell::new(0);
	static CHANGED: RefCell<FieldSet> = RefCell::new(FieldSet::new());
}

pub fn in_transaction() -> bool {
	DEPTH.with(|d| d.get() > 0)
}

/// Run `func` with notifications deferred.
///
/// Every computation that read any field written inside `func` runs
/// exactly once after it returns, no matter how many of its fields were
/// written. Nested transactions flatten into the outermost one.
///
/// If `func` panics the pending notifications are discarded.
pub fn transaction<R>(func: impl FnOnce() -> R) -> R {
	let scope = Scope::enter();
	let result = func();
	if let Some(changed) = scope.exit() {
		if !changed.is_empty() {
			tracing::debug!(changed = changed.len(), "commit transaction");
			registry::notify_batch(&changed);
		}
	}
	result
}

/// Route a write: defer it while a transaction is open, notify otherwise.
pub(crate) fn changed(id: ObservableId, key: Key) {
	if in_transaction() {
		CHANGED.with(|c| c.borrow_mut().insert(id, key));
	} else {
		registry::notify(id, &key);
	}
}

struct Scope {
	is_root: bool,
}

impl Scope {
	fn enter() -> Self {
		let depth = DEPTH.with(|d| {
			d.set(d.get() + 1);
			d.get()
		});

		Scope { is_root: depth == 1 }
	}

	/// Leave the scope; the root scope hands back what changed.
	fn exit(self) -> Option<FieldSet> {
		let is_root = self.is_root;
		std::mem::drop(self);

		if is_root {
			Some(CHANGED.with(|c| std::mem::take(&mut *c.borrow_mut())))
		} else {
			None
		}
	}
}

impl Drop for Scope {
	fn drop(&mut self) {
		DEPTH.with(|d| d.set(d.get().saturating_sub(1)));

		if self.is_root && std::thread::panicking() {
			let discarded = CHANGED.with(|c| std::mem::take(&mut *c.borrow_mut()));
			tracing::debug!(discarded = discarded.len(), "transaction unwound");
		}
	}
}
