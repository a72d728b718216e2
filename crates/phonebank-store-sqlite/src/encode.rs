//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, and the export flag as `0`/`1`.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, Utc};
use phonebank_core::record::{DataType, PhoneRecord};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DataType ────────────────────────────────────────────────────────────────

pub fn encode_data_type(t: DataType) -> String { t.to_string() }

pub fn decode_data_type(s: &str) -> Result<DataType> {
  DataType::from_str(s)
    .map_err(|_| Error::Core(phonebank_core::Error::UnknownDataType(s.to_owned())))
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Wrap `needle` as a `%needle%` pattern for `LIKE ... ESCAPE '\'`.
pub fn like_contains(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPhoneRecord::from_row`].
pub const RECORD_COLUMNS: &str = "id, phone_number, dataset_name, receive_date, source, detail, \
                                  data_type, is_exported, created_at";

/// Raw values read directly from a partition row.
pub struct RawPhoneRecord {
  pub id:           i64,
  pub phone_number: String,
  pub dataset_name: String,
  pub receive_date: String,
  pub source:       String,
  pub detail:       String,
  pub data_type:    String,
  pub is_exported:  bool,
  pub created_at:   String,
}

impl RawPhoneRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      phone_number: row.get(1)?,
      dataset_name: row.get(2)?,
      receive_date: row.get(3)?,
      source:       row.get(4)?,
      detail:       row.get(5)?,
      data_type:    row.get(6)?,
      is_exported:  row.get(7)?,
      created_at:   row.get(8)?,
    })
  }

  pub fn into_record(self) -> Result<PhoneRecord> {
    Ok(PhoneRecord {
      id:           self.id,
      phone_number: self.phone_number,
      dataset_name: self.dataset_name,
      receive_date: decode_date(&self.receive_date)?,
      source:       self.source,
      detail:       self.detail,
      data_type:    decode_data_type(&self.data_type)?,
      is_exported:  self.is_exported,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_wildcards_are_escaped() {
    assert_eq!(like_contains("081"), "%081%");
    assert_eq!(like_contains("50%_off"), "%50\\%\\_off%");
    assert_eq!(like_contains("a\\b"), "%a\\\\b%");
  }

  #[test]
  fn date_round_trip_uses_iso_format() {
    let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(encode_date(d), "2024-03-09");
    assert_eq!(decode_date("2024-03-09").unwrap(), d);
    assert!(decode_date("03/09/24").is_err());
  }

  #[test]
  fn unknown_data_type_is_a_core_error() {
    assert!(matches!(
      decode_data_type("internal"),
      Err(Error::Core(phonebank_core::Error::UnknownDataType(_)))
    ));
  }
}
