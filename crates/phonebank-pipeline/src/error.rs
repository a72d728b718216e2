//! Error type for `phonebank-pipeline`.

use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The request was rejected before anything was written.
  #[error("invalid request: {0}")]
  Validation(String),

  /// The backing store failed. Chunks committed before the failure stay.
  #[error("store error: {0}")]
  Store(#[source] BoxError),

  /// A move stopped part-way. Datasets in `completed` were fully handled;
  /// `dataset` may be partially copied and was not deleted from the source.
  #[error("move failed at dataset {dataset:?} ({} completed): {source}", completed.len())]
  MoveFailed {
    dataset:   String,
    completed: Vec<String>,
    #[source]
    source:    BoxError,
  },

  #[error("I/O error on {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
