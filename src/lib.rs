//! Fine-grained dependency tracking over observable records and lists.
//!
//! Wrap data with [`observable`], install computations with [`autorun`]
//! or [`reaction`]. A computation re-runs when a field it read during
//! its latest run is written, and only then.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use tracked::{autorun, observable, transaction, Value};
//!
//! let data = observable(Value::record([
//! 	("count", Value::from(1)),
//! 	("name", Value::from("John")),
//! ]))
//! .unwrap();
//!
//! let runs = Rc::new(Cell::new(0));
//! let disposer = autorun({
//! 	let data = data.clone();
//! 	let runs = runs.clone();
//! 	move || {
//! 		data.get("count");
//! 		runs.set(runs.get() + 1);
//! 	}
//! });
//! assert_eq!(runs.get(), 1);
//!
//! data.set("name", "Robin");
//! assert_eq!(runs.get(), 1);
//!
//! transaction(|| {
//! 	data.set("count", 2);
//! 	data.set("count", 3);
//! });
//! assert_eq!(runs.get(), 2);
//!
//! disposer.dispose();
//! data.set("count", 4);
//! assert_eq!(runs.get(), 2);
//! ```
//!
//! All state is kept per thread: every thread is an isolated session.

pub mod macros;
pub mod registry;

mod computation;
mod dependencies;
mod error;
mod evaluation;
mod key;
mod observable;
mod reaction;
mod transaction;
mod value;

pub use computation::{ComputationId, Disposer, Reactive};
pub use error::{Error, Result};
pub use evaluation::{ensure_idle, is_tracking, untracked};
pub use key::Key;
pub use observable::{observable, Observable, ObservableId};
pub use reaction::{autorun, autorun_named, reaction, ReactionOptions};
pub use transaction::{in_transaction, transaction};
pub use value::{Fields, Value};
