use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DashboardError {
	/// A period, metric or airport has no entry in the bundle.
	#[error("no data for {0}")]
	MissingSlice(String),

	/// A UI event named a period or metric the bundle does not carry.
	#[error("invalid selection: {0}")]
	InvalidSelection(String),

	/// One of the joined startup fetches failed.
	#[error("failed to load {resource}: {reason}")]
	LoadFailure { resource: String, reason: String },

	#[error("failed to parse {resource}: {reason}")]
	Parse { resource: String, reason: String },

	#[error("projection setup failed: {0}")]
	Projection(String),
}

impl DashboardError {
	pub fn load(resource: &str, reason: impl ToString) -> Self {
		DashboardError::LoadFailure {
			resource: resource.to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn parse(resource: &str, reason: impl ToString) -> Self {
		DashboardError::Parse {
			resource: resource.to_string(),
			reason: reason.to_string(),
		}
	}
}
