//! Search, summaries, and the destructive maintenance operations.

use phonebank_core::{
  PartitionId,
  classify::distinct,
  normalize,
  store::{DatasetSummary, DuplicateSummary, PhoneStore, SearchFilter, SearchResult},
};

use crate::{Error, Result, request::dataset_names};

/// Asks the user before an irreversible change.
pub trait Confirm {
  fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
  F: Fn(&str) -> bool,
{
  fn confirm(&self, prompt: &str) -> bool { self(prompt) }
}

pub async fn search<S: PhoneStore>(
  store: &S,
  partition: PartitionId,
  filter: &SearchFilter,
) -> Result<SearchResult> {
  store.search(partition, filter).await.map_err(Error::store)
}

pub async fn list_datasets<S: PhoneStore>(
  store: &S,
  partition: PartitionId,
) -> Result<Vec<DatasetSummary>> {
  store
    .list_dataset_summary(partition)
    .await
    .map_err(Error::store)
}

/// Delete whole datasets from `partition`.
///
/// Returns `Ok(None)` when the confirmation is declined; nothing is touched
/// in that case.
pub async fn delete_datasets<S: PhoneStore>(
  store: &S,
  partition: PartitionId,
  names: &[String],
  confirm: &dyn Confirm,
) -> Result<Option<usize>> {
  let names = dataset_names(names)?;
  let prompt = format!(
    "Delete {} dataset(s) from {partition}: {}? This cannot be undone.",
    names.len(),
    names.join(", ")
  );
  if !confirm.confirm(&prompt) {
    tracing::info!(%partition, "dataset deletion cancelled");
    return Ok(None);
  }

  let removed = store
    .delete_by_dataset(partition, names.clone())
    .await
    .map_err(Error::store)?;
  tracing::info!(%partition, datasets = ?names, removed, "deleted datasets");
  Ok(Some(removed))
}

/// Remove every occurrence of the given numbers from the duplicate-holding
/// partition. Inputs are normalized first; lines that do not normalize are
/// ignored.
pub async fn purge_duplicates<S: PhoneStore>(
  store: &S,
  numbers: &[String],
  confirm: &dyn Confirm,
) -> Result<Option<usize>> {
  let normalized: Vec<String> = numbers.iter().filter_map(|n| normalize(n)).collect();
  let numbers = distinct(&normalized);
  if numbers.is_empty() {
    return Err(Error::validation("no valid phone numbers to delete"));
  }

  let prompt = format!(
    "Delete every record of {} number(s) from {}? This cannot be undone.",
    numbers.len(),
    PartitionId::DUPLICATES
  );
  if !confirm.confirm(&prompt) {
    tracing::info!("duplicate purge cancelled");
    return Ok(None);
  }

  let removed = store
    .delete_by_phone_number(PartitionId::DUPLICATES, numbers)
    .await
    .map_err(Error::store)?;
  tracing::info!(removed, "purged duplicate numbers");
  Ok(Some(removed))
}

/// Repeated numbers in the duplicate-holding partition.
pub async fn duplicate_report<S: PhoneStore>(store: &S) -> Result<DuplicateSummary> {
  store
    .duplicate_summary(PartitionId::DUPLICATES)
    .await
    .map_err(Error::store)
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use super::*;
  use crate::test_helpers::{seed, store};

  fn p(i: u8) -> PartitionId { PartitionId::new(i).unwrap() }

  fn names(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

  #[tokio::test]
  async fn declined_delete_leaves_store_untouched() {
    let s = store().await;
    seed(&s, p(1), "a", &["0811111111"]).await;

    let asked = Cell::new(false);
    let decline = |_: &str| {
      asked.set(true);
      false
    };
    let result = delete_datasets(&s, p(1), &names(&["a"]), &decline).await.unwrap();
    assert_eq!(result, None);
    assert!(asked.get());
    assert_eq!(list_datasets(&s, p(1)).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn confirmed_delete_removes_only_named_datasets() {
    let s = store().await;
    seed(&s, p(1), "a", &["0811111111", "0822222222"]).await;
    seed(&s, p(1), "b", &["0833333333"]).await;

    let yes = |_: &str| true;
    let removed = delete_datasets(&s, p(1), &names(&["a"]), &yes).await.unwrap();
    assert_eq!(removed, Some(2));
    let left = list_datasets(&s, p(1)).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].dataset_name, "b");
  }

  #[tokio::test]
  async fn empty_delete_selection_is_rejected_before_prompting() {
    let s = store().await;
    let never = |_: &str| -> bool { panic!("should not prompt") };
    let err = delete_datasets(&s, p(1), &[], &never).await.unwrap_err();
    assert!(err.is_validation());
  }

  #[tokio::test]
  async fn purge_normalizes_input_and_removes_all_occurrences() {
    let s = store().await;
    seed(&s, PartitionId::DUPLICATES, "x", &["0811111111", "0811111111"]).await;
    seed(&s, PartitionId::DUPLICATES, "y", &["0811111111", "0822222222"]).await;

    let yes = |_: &str| true;
    let input = names(&["+66811111111", "junk"]);
    let removed = purge_duplicates(&s, &input, &yes).await.unwrap();
    assert_eq!(removed, Some(3));

    let report = duplicate_report(&s).await.unwrap();
    assert!(report.entries.is_empty());
    assert_eq!(report.distinct_numbers, 1);
  }

  #[tokio::test]
  async fn purge_without_valid_numbers_is_a_validation_error() {
    let s = store().await;
    let yes = |_: &str| true;
    let err = purge_duplicates(&s, &names(&["abc"]), &yes).await.unwrap_err();
    assert!(err.is_validation());
  }

  #[tokio::test]
  async fn duplicate_report_orders_by_count() {
    let s = store().await;
    seed(
      &s,
      PartitionId::DUPLICATES,
      "x",
      &["0822222222", "0811111111", "0822222222", "0811111111", "0822222222", "0833333333"],
    )
    .await;

    let report = duplicate_report(&s).await.unwrap();
    let counts: Vec<_> = report
      .entries
      .iter()
      .map(|e| (e.phone_number.as_str(), e.count))
      .collect();
    assert_eq!(counts, [("0822222222", 3), ("0811111111", 2)]);
    assert_eq!(report.distinct_numbers, 3);
  }

  #[tokio::test]
  async fn search_wraps_store_filtering() {
    let s = store().await;
    seed(&s, p(2), "spring", &["0811111111", "0811111111", "0822222222"]).await;

    let filter = SearchFilter { phone: Some("0811".into()), ..Default::default() };
    let result = search(&s, p(2), &filter).await.unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.repeated_numbers, 1);
  }
}
