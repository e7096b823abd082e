use crate::computation::{Computation, Disposer, Job};
use crate::evaluation::untracked;

/// Options of [`reaction`].
#[derive(Debug, Clone, Copy)]
pub struct ReactionOptions {
	/// Run the effect on installation too, not only on changes.
	pub fire_immediately: bool,
	pub name: &'static str,
}

impl Default for ReactionOptions {
	fn default() -> Self {
		ReactionOptions {
			fire_immediately: false,
			name: "<unnamed>",
		}
	}
}

impl ReactionOptions {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn fire_immediately(mut self, fire_immediately: bool) -> Self {
		self.fire_immediately = fire_immediately;
		self
	}

	#[must_use]
	pub fn name(mut self, name: &'static str) -> Self {
		self.name = name;
		self
	}
}

struct Autorun<F> {
	func: F,
}

impl<F> Job for Autorun<F>
where
	F: Fn() + 'static,
{
	type Output = ();

	fn track(&self) {
		(self.func)()
	}

	fn react(&self, _: (), _: bool) {}
}

struct Reaction<D, E> {
	data: D,
	effect: E,
	fire_immediately: bool,
}

impl<T, D, E> Job for Reaction<D, E>
where
	D: Fn() -> T + 'static,
	E: Fn(T) + 'static,
{
	type Output = T;

	fn track(&self) -> T {
		(self.data)()
	}

	fn react(&self, value: T, first_run: bool) {
		if first_run && !self.fire_immediately {
			return;
		}
		untracked(|| (self.effect)(value))
	}
}

/// Run `func` now, and again every time a field it read during its
/// latest run is written.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use tracked::{autorun, observable, Value};
///
/// let data = observable(Value::record([("count", Value::from(1))])).unwrap();
/// let seen = Rc::new(Cell::new(0));
///
/// let _disposer = autorun({
/// 	let data = data.clone();
/// 	let seen = seen.clone();
/// 	move || seen.set(data.get_as::<i64>("count").unwrap_or_default())
/// });
///
/// data.set("count", 2);
/// assert_eq!(seen.get(), 2);
/// ```
pub fn autorun(func: impl Fn() + 'static) -> Disposer {
	autorun_named("<unnamed>", func)
}

/// [`autorun`] with a name shown in `Debug` output and traces.
pub fn autorun_named(name: &'static str, func: impl Fn() + 'static) -> Disposer {
	Computation::install(name, Autorun { func })
}

/// Track the fields `data` reads, and call `effect` with its result
/// every time one of them is written.
///
/// `effect` runs untracked and, unless
/// [`ReactionOptions::fire_immediately`] is set, is skipped on the
/// first run.
pub fn reaction<T, D, E>(data: D, effect: E, options: ReactionOptions) -> Disposer
where
	T: 'static,
	D: Fn() -> T + 'static,
	E: Fn(T) + 'static,
{
	Computation::install(
		options.name,
		Reaction {
			data,
			effect,
			fire_immediately: options.fire_immediately,
		},
	)
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;
	use crate::{observable, Value};

	#[test]
	fn options_builder() {
		let options = ReactionOptions::new().fire_immediately(true).name("sync");
		assert!(options.fire_immediately);
		assert_eq!(options.name, "sync");
		assert!(!ReactionOptions::default().fire_immediately);
	}

	#[test]
	fn disposer_debug_shows_name() {
		let disposer = autorun_named("logger", || {});
		let debug = format!("{:?}", disposer);
		assert!(debug.contains("logger"));
		assert!(debug.contains("disposed: false"));
	}

	#[test]
	fn disposed_inside_tracked_part_skips_effect() {
		let data = observable(Value::record([("count", Value::from(1))])).unwrap();
		let slot: Rc<Cell<Option<Disposer>>> = Rc::new(Cell::new(None));
		let effects = Rc::new(Cell::new(0));

		let disposer = reaction(
			{
				let data = data.clone();
				let slot = slot.clone();
				move || {
					let count = data.get_as::<i64>("count").unwrap_or_default();
					if count > 1 {
						if let Some(disposer) = slot.take() {
							disposer.dispose();
						}
					}
					count
				}
			},
			{
				let effects = effects.clone();
				move |_| effects.set(effects.get() + 1)
			},
			ReactionOptions::default(),
		);
		slot.set(Some(disposer.clone()));

		data.set("count", 2);
		assert!(disposer.is_disposed());
		assert_eq!(effects.get(), 0);
		assert!(!crate::registry::is_tracked(&data));
	}
}
