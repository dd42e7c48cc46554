use thiserror::Error;

/// Conversion failures for the small string-tagged values found in lockfiles
/// and diff reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("unknown link type `{0}`, expected `hard` or `soft`")]
  UnknownLinkType(String),

  #[error("unknown change status `{0}`")]
  UnknownStatus(String),
}
