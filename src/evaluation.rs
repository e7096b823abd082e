use std::cell::RefCell;

use crate::computation::ComputationId;
use crate::dependencies::Dependencies;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::observable::ObservableId;
use crate::transaction::in_transaction;

enum Frame {
	Recording {
		computation: ComputationId,
		dependencies: Dependencies,
	},
	Untracked,
}

thread_local! {
	static STACK: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

/// Record a read into the computation on top of the stack, if any.
pub(crate) fn record(id: ObservableId, key: Key) {
	STACK.with(|stack| {
		if let Some(Frame::Recording { dependencies, .. }) = stack.borrow_mut().last_mut() {
			dependencies.based_on(id, key);
		}
	})
}

/// Whether reads are currently being recorded.
pub fn is_tracking() -> bool {
	STACK.with(|stack| matches!(stack.borrow().last(), Some(Frame::Recording { .. })))
}

/// Check that no computation is recording and no transaction is open.
///
/// Meant for points where the host expects the engine to be at rest,
/// e.g. between two events of its loop.
pub fn ensure_idle() -> Result<()> {
	let depth = STACK.with(|stack| stack.borrow().len());
	if depth != 0 {
		return Err(Error::inconsistent(format!(
			"{} evaluation frame(s) still open",
			depth
		)));
	}
	if in_transaction() {
		return Err(Error::inconsistent("transaction still open"));
	}
	Ok(())
}

/// Run `func` without recording any of its reads.
pub fn untracked<R>(func: impl FnOnce() -> R) -> R {
	let _frame = UntrackedFrame::enter();
	func()
}

struct UntrackedFrame;

impl UntrackedFrame {
	fn enter() -> Self {
		STACK.with(|stack| stack.borrow_mut().push(Frame::Untracked));
		UntrackedFrame
	}
}

impl Drop for UntrackedFrame {
	fn drop(&mut self) {
		if let Err(err) = pop(None) {
			tracing::error!(%err, "untracked frame");
		}
	}
}

/// A recording frame on the evaluation stack.
///
/// The frame is popped by [`Evaluation::finish`], or on drop when the
/// tracked body unwinds.
pub(crate) struct Evaluation {
	computation: ComputationId,
	finished: bool,
}

impl Evaluation {
	pub fn start(computation: ComputationId) -> Self {
		STACK.with(|stack| {
			stack.borrow_mut().push(Frame::Recording {
				computation,
				dependencies: Dependencies::new(),
			})
		});

		Evaluation {
			computation,
			finished: false,
		}
	}

	pub fn finish(mut self) -> Result<Dependencies> {
		self.finished = true;
		pop(Some(self.computation)).map(Option::unwrap_or_default)
	}
}

impl Drop for Evaluation {
	fn drop(&mut self) {
		if self.finished {
			return;
		}
		if let Err(err) = pop(Some(self.computation)) {
			tracing::error!(%err, computation = ?self.computation, "evaluation frame");
		}
	}
}

/// Pop the top frame, checking it is the one we expect:
/// `Some(id)` for a recording frame, `None` for an untracked one.
fn pop(expected: Option<ComputationId>) -> Result<Option<Dependencies>> {
	let frame = STACK
		.with(|stack| stack.borrow_mut().pop())
		.ok_or_else(|| Error::inconsistent("evaluation stack is empty"))?;

	match (frame, expected) {
		(Frame::Untracked, None) => Ok(None),
		(
			Frame::Recording {
				computation,
				dependencies,
			},
			Some(id),
		) if computation == id => Ok(Some(dependencies)),
		_ => Err(Error::inconsistent("evaluation frames popped out of order")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn records_only_on_top_recording_frame() {
		let id = ObservableId::new();
		assert!(!is_tracking());

		let evaluation = Evaluation::start(ComputationId::new());
		assert!(is_tracking());
		record(id, Key::from("a"));
		untracked(|| {
			assert!(!is_tracking());
			record(id, Key::from("b"));
		});
		record(id, Key::from("a"));

		let dependencies = evaluation.finish().unwrap();
		assert!(dependencies.contains(id, &Key::from("a")));
		assert!(!dependencies.contains(id, &Key::from("b")));
		assert_eq!(dependencies.len(), 1);
		assert!(ensure_idle().is_ok());
	}

	#[test]
	fn nested_evaluations_record_separately() {
		let id = ObservableId::new();
		let outer = Evaluation::start(ComputationId::new());
		record(id, Key::from("outer"));

		let inner = Evaluation::start(ComputationId::new());
		record(id, Key::from("inner"));
		let inner = inner.finish().unwrap();

		let outer = outer.finish().unwrap();
		assert!(inner.contains(id, &Key::from("inner")));
		assert!(!inner.contains(id, &Key::from("outer")));
		assert!(outer.contains(id, &Key::from("outer")));
		assert!(!outer.contains(id, &Key::from("inner")));
	}

	#[test]
	fn reads_outside_evaluation_are_ignored() {
		record(ObservableId::new(), Key::from("a"));
		assert!(ensure_idle().is_ok());
	}

	#[test]
	fn frame_is_popped_on_unwind() {
		let result = std::panic::catch_unwind(|| {
			let _evaluation = Evaluation::start(ComputationId::new());
			panic!("body failed");
		});
		assert!(result.is_err());
		assert!(ensure_idle().is_ok());
	}

	#[test]
	fn reports_open_frames() {
		let evaluation = Evaluation::start(ComputationId::new());
		assert!(matches!(
			ensure_idle(),
			Err(Error::InconsistentTrackingState { .. })
		));
		evaluation.finish().unwrap();
		assert!(ensure_idle().is_ok());
	}
}
