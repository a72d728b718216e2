//! Importing text files of raw numbers into a partition.
//!
//! Importing is two-phase. [`preview_import`] reads and classifies the files
//! against the destination without writing anything; [`commit_import`] then
//! writes the first occurrences to the destination and every in-batch repeat
//! to the duplicate-holding partition.

use std::{collections::HashSet, path::PathBuf};

use chrono::{DateTime, Utc};
use phonebank_core::{
  CHUNK_SIZE, PartitionId,
  classify::{Classification, classify, distinct},
  normalize,
  progress::{ProgressSink, scaled},
  record::NewPhoneRecord,
  store::PhoneStore,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, files::read_lines, request::ImportRequest};

/// Everything learned from the input files before any write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
  pub destination:    PartitionId,
  /// Lines read across every file, blank ones included.
  pub lines_read:     usize,
  /// Non-blank lines the normalizer rejected.
  pub rejected:       usize,
  /// Accepted numbers in file order, repeats included.
  pub numbers:        Vec<String>,
  pub classification: Classification,
}

/// What [`commit_import`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
  /// Records written to the destination.
  pub inserted:             usize,
  /// Repeat occurrences written to the duplicate-holding partition.
  pub routed_to_duplicates: usize,
  /// Occurrences skipped because the destination already held the number.
  pub skipped_existing:     usize,
}

/// Read, normalize, and classify `files` against `destination`.
///
/// Progress bands: reading 0–30, in-batch analysis 30–50, membership
/// lookup 50–100.
pub async fn preview_import<S: PhoneStore>(
  store: &S,
  destination: PartitionId,
  files: &[PathBuf],
  progress: &dyn ProgressSink,
) -> Result<ImportPreview> {
  let mut lines_read = 0;
  let mut rejected = 0;
  let mut numbers = Vec::new();

  for (i, path) in files.iter().enumerate() {
    progress.update(scaled(0.0, 30.0, i, files.len()), &format!("reading {}", path.display()));
    for line in read_lines(path).await? {
      lines_read += 1;
      if line.trim().is_empty() {
        continue;
      }
      match normalize(&line) {
        Some(n) => numbers.push(n),
        None => rejected += 1,
      }
    }
  }
  progress.update(30.0, &format!("read {} numbers", numbers.len()));

  let candidates = distinct(&numbers);
  progress.update(50.0, &format!("{} distinct numbers", candidates.len()));

  let mut existing = HashSet::new();
  let mut checked = 0;
  for chunk in candidates.chunks(CHUNK_SIZE) {
    let found = store
      .query_membership(destination, chunk.to_vec())
      .await
      .map_err(Error::store)?;
    existing.extend(found);
    checked += chunk.len();
    progress.update(
      scaled(50.0, 50.0, checked, candidates.len()),
      &format!("checked {checked} / {} against {destination}", candidates.len()),
    );
  }

  let classification = classify(&numbers, &existing);
  tracing::info!(
    %destination,
    lines_read,
    rejected,
    accepted = numbers.len(),
    existing = classification.existing_duplicates.len(),
    internal = classification.internal_duplicates.len(),
    "import preview ready"
  );

  Ok(ImportPreview { destination, lines_read, rejected, numbers, classification })
}

/// Write a previewed batch.
///
/// Every record of the batch shares one creation timestamp. Records are
/// committed in chunks, so a store failure leaves earlier chunks in place.
pub async fn commit_import<S: PhoneStore>(
  store: &S,
  request: &ImportRequest,
  preview: &ImportPreview,
  progress: &dyn ProgressSink,
) -> Result<ImportOutcome> {
  if request.destination != preview.destination {
    return Err(Error::validation(format!(
      "preview was made for {}, not {}",
      preview.destination, request.destination
    )));
  }
  if preview.numbers.is_empty() {
    return Err(Error::validation("no phone numbers loaded"));
  }

  let c = &preview.classification;
  let created_at = Utc::now();
  let mut tally = Tally { written: 0, total: c.insertable(), progress };

  let inserted = insert_chunked(
    store,
    request,
    request.destination,
    &c.first_occurrences,
    created_at,
    &mut tally,
  )
  .await?;
  let routed_to_duplicates =
    insert_chunked(store, request, PartitionId::DUPLICATES, &c.repeats, created_at, &mut tally).await?;

  let outcome = ImportOutcome {
    inserted,
    routed_to_duplicates,
    skipped_existing: c.existing_occurrences,
  };
  tracing::info!(
    destination = %request.destination,
    dataset = %request.batch.dataset_name,
    inserted,
    routed_to_duplicates,
    skipped_existing = outcome.skipped_existing,
    "import committed"
  );
  Ok(outcome)
}

struct Tally<'a> {
  written:  usize,
  total:    usize,
  progress: &'a dyn ProgressSink,
}

async fn insert_chunked<S: PhoneStore>(
  store: &S,
  request: &ImportRequest,
  partition: PartitionId,
  numbers: &[String],
  created_at: DateTime<Utc>,
  tally: &mut Tally<'_>,
) -> Result<usize> {
  let mut count = 0;
  for chunk in numbers.chunks(CHUNK_SIZE) {
    let records = chunk
      .iter()
      .map(|n| NewPhoneRecord::imported(n.clone(), &request.batch, created_at))
      .collect();
    count += store.insert_batch(partition, records).await.map_err(Error::store)?;
    tally.written += chunk.len();
    tally.progress.update(
      scaled(0.0, 100.0, tally.written, tally.total),
      &format!("imported {} / {} numbers", tally.written, tally.total),
    );
  }
  Ok(count)
}

/// Preview and commit in one call.
pub async fn run_import<S: PhoneStore>(
  store: &S,
  request: &ImportRequest,
  files: &[PathBuf],
  progress: &dyn ProgressSink,
) -> Result<(ImportPreview, ImportOutcome)> {
  let preview = preview_import(store, request.destination, files, progress).await?;
  let outcome = commit_import(store, request, &preview, progress).await?;
  Ok((preview, outcome))
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use phonebank_core::{progress::NoProgress, record::DataType, store::SearchFilter};

  use super::*;
  use crate::test_helpers::{FailingStore, store, write_file};

  fn partition(i: u8) -> PartitionId { PartitionId::new(i).unwrap() }

  fn request(dest: &str, dataset: &str) -> ImportRequest {
    ImportRequest::new(Some(dest), dataset, "2024-05-01", "fair", "", DataType::External).unwrap()
  }

  #[tokio::test]
  async fn preview_normalizes_and_counts_rejects() {
    let s = store().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.txt", "+66812345678\n\nabc\n081-234-5679\n12345\n");

    let p = preview_import(&s, partition(1), &[file], &NoProgress).await.unwrap();
    assert_eq!(p.lines_read, 5);
    assert_eq!(p.rejected, 2);
    assert_eq!(p.numbers, ["0812345678", "0812345679"]);
  }

  #[tokio::test]
  async fn repeats_are_routed_to_duplicate_partition() {
    let s = store().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.txt", "0811111111\n0811111111\n0822222222\n");

    let (_, outcome) = run_import(&s, &request("1", "leads"), &[file], &NoProgress)
      .await
      .unwrap();
    assert_eq!(outcome, ImportOutcome {
      inserted:             2,
      routed_to_duplicates: 1,
      skipped_existing:     0,
    });

    let dest = s.search(partition(1), &SearchFilter::default()).await.unwrap();
    let numbers: Vec<_> = dest.records.iter().map(|r| r.phone_number.as_str()).collect();
    assert_eq!(numbers, ["0811111111", "0822222222"]);
    assert!(dest.records.iter().all(|r| r.dataset_name == "leads" && !r.is_exported));

    let dups = s.search(PartitionId::DUPLICATES, &SearchFilter::default()).await.unwrap();
    assert_eq!(dups.total, 1);
    assert_eq!(dups.records[0].phone_number, "0811111111");
  }

  #[tokio::test]
  async fn existing_numbers_are_never_reinserted() {
    let s = store().await;
    let dir = tempfile::tempdir().unwrap();
    let first = write_file(&dir, "a.txt", "0822222222\n");
    run_import(&s, &request("1", "old"), &[first], &NoProgress).await.unwrap();

    let second = write_file(&dir, "b.txt", "0811111111\n0811111111\n0822222222\n0822222222\n");
    let (preview, outcome) = run_import(&s, &request("1", "new"), &[second], &NoProgress)
      .await
      .unwrap();

    assert_eq!(preview.classification.existing_duplicates, ["0822222222"]);
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.routed_to_duplicates, 1);
    assert_eq!(outcome.skipped_existing, 2);

    let filter = SearchFilter { phone: Some("0822222222".into()), ..Default::default() };
    assert_eq!(s.search(partition(1), &filter).await.unwrap().total, 1);
    assert_eq!(s.search(PartitionId::DUPLICATES, &filter).await.unwrap().total, 0);
  }

  #[tokio::test]
  async fn membership_is_scoped_to_destination() {
    let s = store().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.txt", "0811111111\n");
    run_import(&s, &request("1", "x"), &[file.clone()], &NoProgress).await.unwrap();

    let (_, outcome) = run_import(&s, &request("2", "x"), &[file], &NoProgress).await.unwrap();
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.skipped_existing, 0);
  }

  #[tokio::test]
  async fn import_into_duplicate_partition_keeps_every_occurrence_there() {
    let s = store().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.txt", "0811111111\n0811111111\n0811111111\n");

    let (_, outcome) = run_import(&s, &request("15", "d"), &[file], &NoProgress).await.unwrap();
    assert_eq!(outcome.inserted + outcome.routed_to_duplicates, 3);
    let all = s.search(PartitionId::DUPLICATES, &SearchFilter::default()).await.unwrap();
    assert_eq!(all.total, 3);
  }

  #[tokio::test]
  async fn large_batches_span_several_chunks() {
    let s = store().await;
    let dir = tempfile::tempdir().unwrap();
    let body: String = (0..2_500).map(|i| format!("08{i:08}\n")).collect();
    let file = write_file(&dir, "big.txt", &body);

    let updates = Mutex::new(Vec::new());
    let sink = |pct: f64, _: &str| updates.lock().unwrap().push(pct);
    let (_, outcome) = run_import(&s, &request("3", "big"), &[file], &sink).await.unwrap();

    assert_eq!(outcome.inserted, 2_500);
    let updates = updates.into_inner().unwrap();
    assert_eq!(updates.last().copied(), Some(100.0));
    assert!(updates.iter().all(|p| (0.0..=100.0).contains(p)));
  }

  #[tokio::test]
  async fn empty_preview_cannot_be_committed() {
    let s = store().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "junk.txt", "abc\n\n123\n");

    let err = run_import(&s, &request("1", "junk"), &[file], &NoProgress)
      .await
      .unwrap_err();
    assert!(err.is_validation());
    assert!(s.list_dataset_summary(partition(1)).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn commit_rejects_preview_for_other_partition() {
    let s = store().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.txt", "0811111111\n");
    let preview = preview_import(&s, partition(1), &[file], &NoProgress).await.unwrap();

    let err = commit_import(&s, &request("2", "x"), &preview, &NoProgress)
      .await
      .unwrap_err();
    assert!(err.is_validation());
  }

  #[tokio::test]
  async fn store_failure_keeps_committed_chunks() {
    let inner = store().await;
    let s = FailingStore::new(inner.clone()).fail_insert_after(1);
    let dir = tempfile::tempdir().unwrap();
    let body: String = (0..2_500).map(|i| format!("08{i:08}\n")).collect();
    let file = write_file(&dir, "big.txt", &body);

    let err = run_import(&s, &request("1", "big"), &[file], &NoProgress)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Store(_)), "unexpected error: {err}");

    let summary = inner.list_dataset_summary(partition(1)).await.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].total, 1_000);
    assert!(
      inner
        .list_dataset_summary(PartitionId::DUPLICATES)
        .await
        .unwrap()
        .is_empty()
    );
  }
}
