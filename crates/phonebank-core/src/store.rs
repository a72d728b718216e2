//! The `PhoneStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `phonebank-store-sqlite`). The import, move, and export flows in
//! `phonebank-pipeline` depend on this abstraction, not on any concrete
//! backend.

use std::{collections::HashSet, future::Future};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  partition::PartitionId,
  record::{NewPhoneRecord, PhoneRecord},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`PhoneStore::search`]. Every filter is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
  /// Substring of the phone number.
  pub phone:     Option<String>,
  /// Substring of the dataset name.
  pub dataset:   Option<String>,
  /// Inclusive lower bound on `receive_date`.
  pub date_from: Option<NaiveDate>,
  /// Inclusive upper bound on `receive_date`.
  pub date_to:   Option<NaiveDate>,
}

/// Records matching a [`SearchFilter`], ordered by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
  pub records:          Vec<PhoneRecord>,
  pub total:            usize,
  /// Distinct numbers occurring more than once within `records`.
  pub repeated_numbers: usize,
}

/// Per-dataset counts for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
  pub dataset_name: String,
  pub total:        usize,
  /// Records with `is_exported = false`.
  pub exportable:   usize,
}

/// One repeated number in the duplicate-holding partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCount {
  pub phone_number: String,
  pub count:        usize,
}

/// Result of [`PhoneStore::duplicate_summary`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSummary {
  /// Ordered by count descending, then number ascending.
  pub entries:          Vec<DuplicateCount>,
  /// Distinct numbers in the partition, repeated or not.
  pub distinct_numbers: usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a partitioned phone-record store.
///
/// Each method is one logical operation: a backend acquires its handle for
/// the duration of the call and releases it on every exit path. Callers
/// assume at most one mutating operation is in flight at a time.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded async runtime.
pub trait PhoneStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Ensure every partition exists with the fixed schema. Idempotent.
  fn create_partitions(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Append `records` in order. Committed in chunks of
  /// [`CHUNK_SIZE`](crate::CHUNK_SIZE); a failure leaves earlier chunks
  /// committed. Returns the number of rows written.
  fn insert_batch(
    &self,
    partition: PartitionId,
    records: Vec<NewPhoneRecord>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Set `is_exported = true` on the given ids. Idempotent; returns the
  /// number of rows matched.
  fn mark_exported(
    &self,
    partition: PartitionId,
    ids: Vec<i64>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Remove every record whose dataset is in `datasets`. Irreversible.
  fn delete_by_dataset(
    &self,
    partition: PartitionId,
    datasets: Vec<String>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Remove every record whose number is in `numbers`, across all datasets.
  /// Only valid against [`PartitionId::DUPLICATES`].
  fn delete_by_phone_number(
    &self,
    partition: PartitionId,
    numbers: Vec<String>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The subset of `numbers` already present in `partition`. Large inputs
  /// are checked in chunks.
  fn query_membership(
    &self,
    partition: PartitionId,
    numbers: Vec<String>,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;

  fn search<'a>(
    &'a self,
    partition: PartitionId,
    filter: &'a SearchFilter,
  ) -> impl Future<Output = Result<SearchResult, Self::Error>> + Send + 'a;

  /// Total and exportable counts per distinct dataset, ordered by name.
  fn list_dataset_summary(
    &self,
    partition: PartitionId,
  ) -> impl Future<Output = Result<Vec<DatasetSummary>, Self::Error>> + Send + '_;

  /// Every record of one dataset, ordered by id.
  fn fetch_dataset(
    &self,
    partition: PartitionId,
    dataset: String,
  ) -> impl Future<Output = Result<Vec<PhoneRecord>, Self::Error>> + Send + '_;

  /// Up to `limit` records of one dataset, never-exported first, then by id.
  fn select_for_export(
    &self,
    partition: PartitionId,
    dataset: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<PhoneRecord>, Self::Error>> + Send + '_;

  /// Repeated numbers of the duplicate-holding partition. Only valid
  /// against [`PartitionId::DUPLICATES`].
  fn duplicate_summary(
    &self,
    partition: PartitionId,
  ) -> impl Future<Output = Result<DuplicateSummary, Self::Error>> + Send + '_;
}
