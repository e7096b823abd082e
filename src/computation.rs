use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::dependencies::Dependencies;
use crate::evaluation::Evaluation;

/// Stable identity of a computation across its runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComputationId(u64);

impl ComputationId {
	pub(crate) fn new() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

/// Something the registry can re-run when a field it read changes.
pub trait Reactive {
	fn id(&self) -> ComputationId;

	fn name(&self) -> &'static str;

	/// Run again, re-recording dependencies.
	fn update(&self);

	/// Stop tracking for good.
	fn dispose(&self);

	fn is_disposed(&self) -> bool;
}

/// The body of a computation, split in a tracked and an untracked part.
pub(crate) trait Job: 'static {
	type Output;

	/// Runs with reads recorded.
	fn track(&self) -> Self::Output;

	/// Runs after reconciliation with the output of [`Job::track`].
	fn react(&self, output: Self::Output, first_run: bool);
}

pub(crate) struct Computation<J: Job> {
	id: ComputationId,
	name: &'static str,
	job: J,
	inner: RefCell<ComputationInner>,
	this: Weak<Computation<J>>,
}

struct ComputationInner {
	dependencies: Dependencies,
	runs: usize,
	disposed: bool,
}

impl<J: Job> Computation<J> {
	/// Create the computation and run it for the first time.
	pub fn install(name: &'static str, job: J) -> Disposer {
		let computation = Rc::new_cyclic(|this| Computation {
			id: ComputationId::new(),
			name,
			job,
			inner: RefCell::new(ComputationInner {
				dependencies: Dependencies::new(),
				runs: 0,
				disposed: false,
			}),
			this: this.clone(),
		});

		tracing::debug!(computation = ?computation.id, name, "install");
		computation.update();

		Disposer {
			computation: computation as Rc<dyn Reactive>,
		}
	}

	fn run(&self) {
		let first_run = {
			let inner = self.inner.borrow();
			if inner.disposed {
				return;
			}
			inner.runs == 0
		};

		let evaluation = Evaluation::start(self.id);
		let output = self.job.track();
		let dependencies = match evaluation.finish() {
			Ok(dependencies) => dependencies,
			Err(err) => panic!("{}", err),
		};

		// Disposed from inside its own tracked part.
		if self.is_disposed() {
			return;
		}

		let Some(this) = self.this.upgrade() else {
			return;
		};
		let this = this as Rc<dyn Reactive>;

		{
			let mut inner = self.inner.borrow_mut();
			inner.dependencies.swap(dependencies, &this);
			inner.runs += 1;
		}

		self.job.react(output, first_run);
	}
}

impl<J: Job> Reactive for Computation<J> {
	fn id(&self) -> ComputationId {
		self.id
	}

	fn name(&self) -> &'static str {
		self.name
	}

	fn update(&self) {
		let _span = tracing::trace_span!("run", computation = ?self.id, name = self.name).entered();
		self.run();
	}

	fn dispose(&self) {
		let mut inner = self.inner.borrow_mut();
		if inner.disposed {
			return;
		}

		tracing::debug!(
			computation = ?self.id,
			name = self.name,
			dependencies = inner.dependencies.len(),
			"dispose"
		);
		inner.disposed = true;
		inner.dependencies.drop(self.id);
	}

	fn is_disposed(&self) -> bool {
		self.inner.borrow().disposed
	}
}

/// Handle returned by [`autorun`](crate::autorun) and [`reaction`](crate::reaction).
///
/// Dropping the handle does not stop the computation; call
/// [`Disposer::dispose`] for that.
#[derive(Clone)]
pub struct Disposer {
	computation: Rc<dyn Reactive>,
}

impl Disposer {
	/// Unsubscribe the computation from everything. Calling it again is a no-op.
	pub fn dispose(&self) {
		self.computation.dispose();
	}

	pub fn is_disposed(&self) -> bool {
		self.computation.is_disposed()
	}

	pub fn id(&self) -> ComputationId {
		self.computation.id()
	}
}

impl Debug for Disposer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Disposer")
			.field("id", &self.computation.id())
			.field("name", &self.computation.name())
			.field("disposed", &self.computation.is_disposed())
			.finish()
	}
}
