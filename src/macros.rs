pub use enclose::*;

/// [`autorun`](crate::autorun) with the listed handles cloned into the body.
///
/// ```
/// use tracked::{observable, Value};
///
/// let data = observable(Value::record([("count", Value::from(1))])).unwrap();
/// let disposer = tracked::autorun!((data) {
/// 	let _ = data.get("count");
/// });
/// disposer.dispose();
/// ```
#[macro_export]
macro_rules! autorun {
    (( $($d_tt:tt)* ) $($b:tt)*) => {
        $crate::autorun($crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
    };
}

/// [`reaction`](crate::reaction) with the listed handles cloned into
/// both the data and the effect closures.
#[macro_export]
macro_rules! reaction {
    (( $($d_tt:tt)* ) $data:expr, $effect:expr, $options:expr $(,)?) => {
        $crate::reaction(
            $crate::macros::enclose!(($( $d_tt )*) move || $data),
            $crate::macros::enclose!(($( $d_tt )*) $effect),
            $options,
        )
    };
    (( $($d_tt:tt)* ) $data:expr, $effect:expr $(,)?) => {
        $crate::reaction!(( $($d_tt)* ) $data, $effect, $crate::ReactionOptions::default())
    };
}
