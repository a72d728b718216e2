//! Shared fixtures for pipeline tests.

use std::{
  collections::HashSet,
  path::PathBuf,
  sync::atomic::{AtomicUsize, Ordering},
};

use chrono::{NaiveDate, Utc};
use phonebank_core::{
  PartitionId,
  record::{BatchMetadata, DataType, NewPhoneRecord, PhoneRecord},
  store::{DatasetSummary, DuplicateSummary, PhoneStore, SearchFilter, SearchResult},
};
use phonebank_store_sqlite::SqliteStore;

pub async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

pub fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
  let path = dir.path().join(name);
  std::fs::write(&path, body).expect("write fixture");
  path
}

/// Insert `numbers` into `partition` as dataset `dataset`.
pub async fn seed<S: PhoneStore>(store: &S, partition: PartitionId, dataset: &str, numbers: &[&str]) {
  let batch = BatchMetadata {
    dataset_name: dataset.to_owned(),
    receive_date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"),
    source:       "test".to_owned(),
    detail:       String::new(),
    data_type:    DataType::Organization,
  };
  let now = Utc::now();
  let records = numbers
    .iter()
    .map(|n| NewPhoneRecord::imported((*n).to_owned(), &batch, now))
    .collect();
  store
    .insert_batch(partition, records)
    .await
    .expect("seed insert");
}

// ─── FailingStore ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FailingError {
  #[error("injected failure: {0}")]
  Injected(String),
  #[error(transparent)]
  Inner(#[from] phonebank_store_sqlite::Error),
}

/// Delegates to a [`SqliteStore`] but fails selected calls.
pub struct FailingStore {
  inner:             SqliteStore,
  fail_fetch:        Option<String>,
  fail_select:       Option<String>,
  fail_insert_after: Option<usize>,
  inserts:           AtomicUsize,
}

impl FailingStore {
  pub fn new(inner: SqliteStore) -> Self {
    Self {
      inner,
      fail_fetch: None,
      fail_select: None,
      fail_insert_after: None,
      inserts: AtomicUsize::new(0),
    }
  }

  pub fn fail_fetch_of(mut self, dataset: &str) -> Self {
    self.fail_fetch = Some(dataset.to_owned());
    self
  }

  pub fn fail_select_of(mut self, dataset: &str) -> Self {
    self.fail_select = Some(dataset.to_owned());
    self
  }

  /// Let `n` calls to `insert_batch` through, then fail every later one.
  pub fn fail_insert_after(mut self, n: usize) -> Self {
    self.fail_insert_after = Some(n);
    self
  }
}

impl PhoneStore for FailingStore {
  type Error = FailingError;

  async fn create_partitions(&self) -> Result<(), FailingError> {
    Ok(self.inner.create_partitions().await?)
  }

  async fn insert_batch(
    &self,
    partition: PartitionId,
    records: Vec<NewPhoneRecord>,
  ) -> Result<usize, FailingError> {
    let call = self.inserts.fetch_add(1, Ordering::SeqCst);
    if self.fail_insert_after.is_some_and(|n| call >= n) {
      return Err(FailingError::Injected(format!("insert batch #{}", call + 1)));
    }
    Ok(self.inner.insert_batch(partition, records).await?)
  }

  async fn mark_exported(&self, partition: PartitionId, ids: Vec<i64>) -> Result<usize, FailingError> {
    Ok(self.inner.mark_exported(partition, ids).await?)
  }

  async fn delete_by_dataset(
    &self,
    partition: PartitionId,
    datasets: Vec<String>,
  ) -> Result<usize, FailingError> {
    Ok(self.inner.delete_by_dataset(partition, datasets).await?)
  }

  async fn delete_by_phone_number(
    &self,
    partition: PartitionId,
    numbers: Vec<String>,
  ) -> Result<usize, FailingError> {
    Ok(self.inner.delete_by_phone_number(partition, numbers).await?)
  }

  async fn query_membership(
    &self,
    partition: PartitionId,
    numbers: Vec<String>,
  ) -> Result<HashSet<String>, FailingError> {
    Ok(self.inner.query_membership(partition, numbers).await?)
  }

  async fn search(
    &self,
    partition: PartitionId,
    filter: &SearchFilter,
  ) -> Result<SearchResult, FailingError> {
    Ok(self.inner.search(partition, filter).await?)
  }

  async fn list_dataset_summary(
    &self,
    partition: PartitionId,
  ) -> Result<Vec<DatasetSummary>, FailingError> {
    Ok(self.inner.list_dataset_summary(partition).await?)
  }

  async fn fetch_dataset(
    &self,
    partition: PartitionId,
    dataset: String,
  ) -> Result<Vec<PhoneRecord>, FailingError> {
    if self.fail_fetch.as_deref() == Some(dataset.as_str()) {
      return Err(FailingError::Injected(format!("fetch of {dataset:?}")));
    }
    Ok(self.inner.fetch_dataset(partition, dataset).await?)
  }

  async fn select_for_export(
    &self,
    partition: PartitionId,
    dataset: String,
    limit: usize,
  ) -> Result<Vec<PhoneRecord>, FailingError> {
    if self.fail_select.as_deref() == Some(dataset.as_str()) {
      return Err(FailingError::Injected(format!("export selection of {dataset:?}")));
    }
    Ok(self.inner.select_for_export(partition, dataset, limit).await?)
  }

  async fn duplicate_summary(&self, partition: PartitionId) -> Result<DuplicateSummary, FailingError> {
    Ok(self.inner.duplicate_summary(partition).await?)
  }
}
