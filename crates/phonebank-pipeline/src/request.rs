//! Validated request values for every pipeline operation.
//!
//! Front ends collect loose text (partition names, dates, counts) and turn it
//! into one of these before any store call. Construction fails with
//! [`Error::Validation`] and never touches the store.

use chrono::NaiveDate;
use phonebank_core::{
  PartitionId,
  record::{BatchMetadata, DataType},
  store::SearchFilter,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Accepted receive-date formats: ISO first, then the short US form.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%y"];

/// Parse a user-entered date as `YYYY-MM-DD` or `MM/DD/YY`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(Error::validation("date is required"));
  }
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    .ok_or_else(|| {
      Error::validation(format!("invalid date {trimmed:?}; use YYYY-MM-DD or MM/DD/YY"))
    })
}

/// Resolve an optional partition name against the allow-list.
pub fn require_partition(name: Option<&str>) -> Result<PartitionId> {
  let name = name
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or_else(|| Error::validation("no partition selected"))?;
  name
    .parse()
    .map_err(|e: phonebank_core::Error| Error::validation(e.to_string()))
}

fn require_text(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    Err(Error::validation(format!("{field} is required")))
  } else {
    Ok(trimmed.to_owned())
  }
}

/// Trimmed, non-empty, de-duplicated names in their original order.
fn clean_names(names: &[String]) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
    if !out.iter().any(|seen| seen == name) {
      out.push(name.to_owned());
    }
  }
  out
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Where an import goes and the metadata stamped on every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
  pub destination: PartitionId,
  pub batch:       BatchMetadata,
}

impl ImportRequest {
  pub fn new(
    destination: Option<&str>,
    dataset_name: &str,
    receive_date: &str,
    source: &str,
    detail: &str,
    data_type: DataType,
  ) -> Result<Self> {
    let destination = require_partition(destination)?;
    let receive_date = parse_date(receive_date)?;
    let dataset_name = require_text("dataset name", dataset_name)?;
    Ok(Self {
      destination,
      batch: BatchMetadata {
        dataset_name,
        receive_date,
        source: source.trim().to_owned(),
        detail: detail.trim().to_owned(),
        data_type,
      },
    })
  }
}

// ─── Move ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
  pub source:            PartitionId,
  pub destination:       PartitionId,
  /// Distinct dataset names, processed in this order.
  pub datasets:          Vec<String>,
  /// Remove each dataset from `source` once it is fully copied.
  pub delete_after_move: bool,
}

impl MoveRequest {
  pub fn new(
    source: Option<&str>,
    destination: Option<&str>,
    datasets: &[String],
    delete_after_move: bool,
  ) -> Result<Self> {
    let source = require_partition(source)?;
    let destination = require_partition(destination)?;
    if source == destination {
      return Err(Error::validation("source and destination must differ"));
    }
    let datasets = clean_names(datasets);
    if datasets.is_empty() {
      return Err(Error::validation("no dataset selected"));
    }
    Ok(Self { source, destination, datasets, delete_after_move })
  }
}

// ─── Export ──────────────────────────────────────────────────────────────────

/// How many numbers to take from one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSelection {
  pub dataset: String,
  pub count:   usize,
}

impl ExportSelection {
  /// Parse `dataset=count`. The split is on the last `=` so dataset names
  /// may contain one.
  pub fn parse(input: &str) -> Result<Self> {
    let (dataset, count) = input
      .rsplit_once('=')
      .ok_or_else(|| Error::validation(format!("expected DATASET=COUNT, got {input:?}")))?;
    let dataset = require_text("dataset name", dataset)?;
    let count = count
      .trim()
      .parse()
      .map_err(|_| Error::validation(format!("invalid count in {input:?}")))?;
    Ok(Self { dataset, count })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
  pub partition:  PartitionId,
  /// Only selections with a positive count; dataset names are unique.
  pub selections: Vec<ExportSelection>,
  /// Extra numbers shuffled into the output after selection.
  pub inject:     Vec<String>,
}

impl ExportRequest {
  pub fn new(
    partition: Option<&str>,
    selections: Vec<ExportSelection>,
    inject: Vec<String>,
  ) -> Result<Self> {
    let partition = require_partition(partition)?;
    let mut kept: Vec<ExportSelection> = Vec::new();
    for sel in selections.into_iter().filter(|s| s.count > 0) {
      if kept.iter().any(|k| k.dataset == sel.dataset) {
        return Err(Error::validation(format!("dataset {:?} selected twice", sel.dataset)));
      }
      kept.push(sel);
    }
    if kept.is_empty() {
      return Err(Error::validation("select at least one dataset with a positive count"));
    }
    Ok(Self { partition, selections: kept, inject })
  }
}

// ─── Search & delete ─────────────────────────────────────────────────────────

/// Build a [`SearchFilter`] from optional text fields; blank means "any".
pub fn search_filter(
  phone: Option<&str>,
  dataset: Option<&str>,
  date_from: Option<&str>,
  date_to: Option<&str>,
) -> Result<SearchFilter> {
  let text = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);
  let date = |s: Option<&str>| -> Result<Option<NaiveDate>> {
    match s.map(str::trim).filter(|s| !s.is_empty()) {
      Some(d) => parse_date(d).map(Some),
      None => Ok(None),
    }
  };
  Ok(SearchFilter {
    phone:     text(phone),
    dataset:   text(dataset),
    date_from: date(date_from)?,
    date_to:   date(date_to)?,
  })
}

/// Dataset names for a bulk delete.
pub fn dataset_names(names: &[String]) -> Result<Vec<String>> {
  let names = clean_names(names);
  if names.is_empty() {
    return Err(Error::validation("no dataset selected"));
  }
  Ok(names)
}
