//! Phone records, the rows held by every partition.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── DataType ────────────────────────────────────────────────────────────────

/// Where a batch of numbers came from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DataType {
  #[default]
  Organization,
  External,
}

// ─── PhoneRecord ─────────────────────────────────────────────────────────────

/// A stored entry. `id` and `created_at` never change after insertion;
/// `is_exported` only ever flips from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRecord {
  /// Store-assigned, monotonically increasing, never reused.
  pub id:           i64,
  /// Canonical form: `0` followed by nine digits.
  pub phone_number: String,
  pub dataset_name: String,
  pub receive_date: NaiveDate,
  pub source:       String,
  pub detail:       String,
  pub data_type:    DataType,
  pub is_exported:  bool,
  pub created_at:   DateTime<Utc>,
}

// ─── NewPhoneRecord ──────────────────────────────────────────────────────────

/// Input to [`PhoneStore::insert_batch`](crate::store::PhoneStore::insert_batch).
///
/// The store assigns `id`. The phone number must already be normalized; the
/// store does not re-validate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPhoneRecord {
  pub phone_number: String,
  pub dataset_name: String,
  pub receive_date: NaiveDate,
  pub source:       String,
  pub detail:       String,
  pub data_type:    DataType,
  pub is_exported:  bool,
  pub created_at:   DateTime<Utc>,
}

impl NewPhoneRecord {
  /// A fresh, never-exported record stamped with the given creation time.
  pub fn imported(phone_number: String, batch: &BatchMetadata, created_at: DateTime<Utc>) -> Self {
    Self {
      phone_number,
      dataset_name: batch.dataset_name.clone(),
      receive_date: batch.receive_date,
      source: batch.source.clone(),
      detail: batch.detail.clone(),
      data_type: batch.data_type,
      is_exported: false,
      created_at,
    }
  }
}

impl From<PhoneRecord> for NewPhoneRecord {
  /// Copy every field except the identifier, as a move does.
  fn from(r: PhoneRecord) -> Self {
    Self {
      phone_number: r.phone_number,
      dataset_name: r.dataset_name,
      receive_date: r.receive_date,
      source:       r.source,
      detail:       r.detail,
      data_type:    r.data_type,
      is_exported:  r.is_exported,
      created_at:   r.created_at,
    }
  }
}

// ─── BatchMetadata ───────────────────────────────────────────────────────────

/// The fields shared by every record of one import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetadata {
  pub dataset_name: String,
  pub receive_date: NaiveDate,
  pub source:       String,
  pub detail:       String,
  pub data_type:    DataType,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn data_type_parses_case_insensitively() {
    assert_eq!(DataType::from_str("External").unwrap(), DataType::External);
    assert_eq!(DataType::from_str("organization").unwrap(), DataType::Organization);
    assert!(DataType::from_str("internal").is_err());
  }

  #[test]
  fn data_type_displays_lowercase() {
    assert_eq!(DataType::External.to_string(), "external");
    assert_eq!(DataType::Organization.to_string(), "organization");
  }
}
