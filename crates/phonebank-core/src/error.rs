//! Error types for `phonebank-core`.

use thiserror::Error;

use crate::partition::PartitionId;

#[derive(Debug, Error)]
pub enum Error {
  /// A partition name or index outside the fixed allow-list.
  #[error("unknown partition: {0:?}")]
  UnknownPartition(String),

  #[error("{0} is not the duplicate-holding partition")]
  NotDuplicatePartition(PartitionId),

  #[error("unknown data type: {0:?}")]
  UnknownDataType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
