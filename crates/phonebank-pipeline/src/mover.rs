//! Moving whole datasets between partitions.

use phonebank_core::{
  CHUNK_SIZE,
  progress::{ProgressSink, scaled},
  record::NewPhoneRecord,
  store::PhoneStore,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, request::MoveRequest};

/// Per-dataset counts of a finished move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedDataset {
  pub dataset: String,
  pub copied:  usize,
  pub deleted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
  pub datasets: Vec<MovedDataset>,
}

impl MoveOutcome {
  pub fn copied(&self) -> usize { self.datasets.iter().map(|d| d.copied).sum() }
}

/// Copy each requested dataset to the destination, in request order.
///
/// A dataset is fully copied before it is deleted from the source. When a
/// store call fails the move stops with [`Error::MoveFailed`]: earlier
/// datasets stay moved, the failing one keeps its source rows, and later
/// ones are not touched.
pub async fn move_datasets<S: PhoneStore>(
  store: &S,
  request: &MoveRequest,
  progress: &dyn ProgressSink,
) -> Result<MoveOutcome> {
  let mut outcome = MoveOutcome::default();
  let total = request.datasets.len();

  for (i, dataset) in request.datasets.iter().enumerate() {
    progress.update(scaled(0.0, 100.0, i, total), &format!("moving {dataset}"));

    let moved = move_one(store, request, dataset).await.map_err(|source| Error::MoveFailed {
      dataset: dataset.clone(),
      completed: outcome.datasets.iter().map(|d| d.dataset.clone()).collect(),
      source,
    })?;

    tracing::info!(
      source = %request.source,
      destination = %request.destination,
      dataset = %dataset,
      copied = moved.copied,
      deleted = moved.deleted,
      "moved dataset"
    );
    outcome.datasets.push(moved);
  }

  progress.update(100.0, &format!("moved {} records", outcome.copied()));
  Ok(outcome)
}

async fn move_one<S: PhoneStore>(
  store: &S,
  request: &MoveRequest,
  dataset: &str,
) -> Result<MovedDataset, Box<dyn std::error::Error + Send + Sync>> {
  let records = store.fetch_dataset(request.source, dataset.to_owned()).await?;

  let mut copied = 0;
  for chunk in records.chunks(CHUNK_SIZE) {
    let batch: Vec<NewPhoneRecord> = chunk.iter().cloned().map(NewPhoneRecord::from).collect();
    copied += store.insert_batch(request.destination, batch).await?;
  }

  let deleted = if request.delete_after_move {
    store
      .delete_by_dataset(request.source, vec![dataset.to_owned()])
      .await?
  } else {
    0
  };

  Ok(MovedDataset { dataset: dataset.to_owned(), copied, deleted })
}
