//! Exporting numbers by per-dataset quota.

use std::collections::HashMap;

use phonebank_core::{
  progress::{ProgressSink, scaled},
  store::PhoneStore,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, request::ExportRequest};

/// A selection asked for more numbers than were still unexported, so
/// previously exported numbers are included again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportWarning {
  pub dataset:    String,
  pub requested:  usize,
  pub exportable: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
  /// Numbers in output order, injected ones included.
  pub numbers:  Vec<String>,
  /// Records selected from the store and marked exported.
  pub exported: usize,
  /// Extra numbers shuffled into `numbers`.
  pub injected: usize,
  pub warnings: Vec<ExportWarning>,
}

/// Overflow warnings for `request`, from a summary taken before any marking.
async fn quota_warnings<S: PhoneStore>(
  store: &S,
  request: &ExportRequest,
) -> Result<Vec<ExportWarning>> {
  let summary = store
    .list_dataset_summary(request.partition)
    .await
    .map_err(Error::store)?;
  let exportable: HashMap<&str, usize> = summary
    .iter()
    .map(|d| (d.dataset_name.as_str(), d.exportable))
    .collect();

  Ok(
    request
      .selections
      .iter()
      .filter_map(|sel| {
        let available = exportable.get(sel.dataset.as_str()).copied().unwrap_or(0);
        (sel.count > available).then(|| ExportWarning {
          dataset:    sel.dataset.clone(),
          requested:  sel.count,
          exportable: available,
        })
      })
      .collect(),
  )
}

/// Select, mark, and collect numbers for every selection in request order.
///
/// Each dataset yields up to its requested count, never-exported records
/// first. Once every selection is marked, the request's inject list is
/// shuffled in; injected numbers are never stored or marked.
pub async fn export<S: PhoneStore, R: Rng + ?Sized>(
  store: &S,
  request: &ExportRequest,
  rng: &mut R,
  progress: &dyn ProgressSink,
) -> Result<ExportOutcome> {
  let warnings = quota_warnings(store, request).await?;
  for w in &warnings {
    tracing::warn!(
      dataset = %w.dataset,
      requested = w.requested,
      exportable = w.exportable,
      "export will re-include previously exported numbers"
    );
  }

  let mut numbers = Vec::new();
  let total = request.selections.len();
  for (i, sel) in request.selections.iter().enumerate() {
    progress.update(scaled(0.0, 90.0, i, total), &format!("selecting from {}", sel.dataset));
    let records = store
      .select_for_export(request.partition, sel.dataset.clone(), sel.count)
      .await
      .map_err(Error::store)?;
    let ids = records.iter().map(|r| r.id).collect();
    store
      .mark_exported(request.partition, ids)
      .await
      .map_err(Error::store)?;
    numbers.extend(records.into_iter().map(|r| r.phone_number));
  }
  let exported = numbers.len();

  progress.update(90.0, "injecting extra numbers");
  let injected = inject_numbers(&mut numbers, &request.inject, rng);

  tracing::info!(
    partition = %request.partition,
    datasets = total,
    exported,
    injected,
    "export finished"
  );
  progress.update(100.0, &format!("exported {} numbers", numbers.len()));
  Ok(ExportOutcome { numbers, exported, injected, warnings })
}

/// Insert each non-blank `extra` line at a uniform position of `numbers`.
/// Returns how many were inserted.
pub fn inject_numbers<R: Rng + ?Sized>(
  numbers: &mut Vec<String>,
  extra: &[String],
  rng: &mut R,
) -> usize {
  let mut injected = 0;
  for line in extra.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
    let at = rng.gen_range(0..=numbers.len());
    numbers.insert(at, line.to_owned());
    injected += 1;
  }
  injected
}
