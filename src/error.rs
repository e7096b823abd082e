use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// Only records and lists can hold trackable fields.
	#[error("cannot observe a value of type `{found}`, expected a record or a list")]
	UnsupportedType { found: &'static str },

	/// A recording frame or a transaction outlived the body that opened it.
	#[error("inconsistent tracking state: {detail}")]
	InconsistentTrackingState { detail: String },
}

impl Error {
	pub(crate) fn inconsistent(detail: impl Into<String>) -> Self {
		Error::InconsistentTrackingState {
			detail: detail.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages() {
		let err = Error::UnsupportedType { found: "int" };
		assert_eq!(
			err.to_string(),
			"cannot observe a value of type `int`, expected a record or a list"
		);

		let err = Error::inconsistent("transaction still open");
		assert_eq!(
			err.to_string(),
			"inconsistent tracking state: transaction still open"
		);
	}
}
