//! Partition identifiers for the fixed pool of record tables.
//!
//! Every partition shares one schema. The highest-numbered partition is
//! reserved for within-batch repeat occurrences. A [`PartitionId`] can only be
//! built through a validating constructor, so any table name derived from it
//! is guaranteed to be on the allow-list.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of partitions in the store.
pub const PARTITION_COUNT: u8 = 15;

const TABLE_PREFIX: &str = "partition_";

/// A validated partition index in `1..=PARTITION_COUNT`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionId(u8);

impl PartitionId {
  /// The reserved partition that accumulates within-batch repeats.
  pub const DUPLICATES: Self = Self(PARTITION_COUNT);

  pub fn new(index: u8) -> Result<Self> {
    if (1..=PARTITION_COUNT).contains(&index) {
      Ok(Self(index))
    } else {
      Err(Error::UnknownPartition(index.to_string()))
    }
  }

  /// Every partition, in index order.
  pub fn all() -> impl Iterator<Item = Self> { (1..=PARTITION_COUNT).map(Self) }

  pub fn index(self) -> u8 { self.0 }

  pub fn is_duplicate_holding(self) -> bool { self == Self::DUPLICATES }

  /// The SQL table name backing this partition.
  pub fn table_name(self) -> String { format!("{TABLE_PREFIX}{}", self.0) }
}

impl fmt::Display for PartitionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{TABLE_PREFIX}{}", self.0)
  }
}

impl FromStr for PartitionId {
  type Err = Error;

  /// Accepts either `partition_<n>` or a bare `<n>`.
  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix(TABLE_PREFIX).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::UnknownPartition(s.to_owned()));
    }
    let index: u8 = digits
      .parse()
      .map_err(|_| Error::UnknownPartition(s.to_owned()))?;
    Self::new(index).map_err(|_| Error::UnknownPartition(s.to_owned()))
  }
}

impl TryFrom<String> for PartitionId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<PartitionId> for String {
  fn from(p: PartitionId) -> Self { p.to_string() }
}
