//! [`SqliteStore`], the SQLite implementation of [`PhoneStore`].

use std::{
  collections::{HashMap, HashSet},
  path::Path,
};

use phonebank_core::{
  CHUNK_SIZE, PartitionId,
  record::{NewPhoneRecord, PhoneRecord},
  store::{DatasetSummary, DuplicateCount, DuplicateSummary, PhoneStore, SearchFilter, SearchResult},
};

use crate::{
  Error, Result,
  encode::{RECORD_COLUMNS, RawPhoneRecord, encode_data_type, encode_date, encode_dt, like_contains},
  schema::schema,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A phonebank store backed by a single SQLite file.
///
/// Clones share one reference-counted connection. Every trait
/// method runs as one closure on the connection thread, so a statement or
/// transaction never outlives the call that opened it.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and create every partition.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.create_partitions().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.create_partitions().await?;
    Ok(store)
  }

  /// Run `sql` once per chunk of `values`, with the chunk bound to a
  /// `(?, ?, …)` placeholder list substituted for `{in}`. Every chunk commits
  /// on its own. Returns the summed row changes.
  async fn execute_chunked<T>(&self, sql: String, values: Vec<T>) -> Result<usize>
  where
    T: rusqlite::ToSql + Send + 'static,
  {
    if values.is_empty() {
      return Ok(0);
    }
    let changed = self
      .conn
      .call(move |conn| {
        let mut changed = 0;
        for chunk in values.chunks(CHUNK_SIZE) {
          let stmt_sql = sql.replace("{in}", &placeholders(chunk.len()));
          let tx = conn.transaction()?;
          changed += tx.execute(&stmt_sql, rusqlite::params_from_iter(chunk.iter()))?;
          tx.commit()?;
        }
        Ok(changed)
      })
      .await?;
    Ok(changed)
  }

  async fn query_records(&self, sql: String, params: Vec<String>) -> Result<Vec<PhoneRecord>> {
    let raws: Vec<RawPhoneRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawPhoneRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPhoneRecord::into_record).collect()
  }
}

/// `?, ?, …` with `n` placeholders.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

fn require_duplicate_holding(partition: PartitionId) -> Result<()> {
  if partition.is_duplicate_holding() {
    Ok(())
  } else {
    Err(Error::Core(phonebank_core::Error::NotDuplicatePartition(partition)))
  }
}

// ─── PhoneStore impl ─────────────────────────────────────────────────────────

impl PhoneStore for SqliteStore {
  type Error = Error;

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn create_partitions(&self) -> Result<()> {
    let ddl = schema();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert_batch(
    &self,
    partition: PartitionId,
    records: Vec<NewPhoneRecord>,
  ) -> Result<usize> {
    if records.is_empty() {
      return Ok(0);
    }
    let table = partition.table_name();

    let written = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO {table} (
             phone_number, dataset_name, receive_date, source,
             detail, data_type, is_exported, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        );
        let mut written = 0;
        for chunk in records.chunks(CHUNK_SIZE) {
          let tx = conn.transaction()?;
          {
            let mut stmt = tx.prepare_cached(&sql)?;
            for r in chunk {
              stmt.execute(rusqlite::params![
                r.phone_number,
                r.dataset_name,
                encode_date(r.receive_date),
                r.source,
                r.detail,
                encode_data_type(r.data_type),
                r.is_exported,
                encode_dt(r.created_at),
              ])?;
            }
          }
          tx.commit()?;
          written += chunk.len();
        }
        Ok(written)
      })
      .await?;

    tracing::debug!(%partition, written, "inserted batch");
    Ok(written)
  }

  async fn mark_exported(&self, partition: PartitionId, ids: Vec<i64>) -> Result<usize> {
    let sql = format!(
      "UPDATE {} SET is_exported = 1 WHERE id IN ({{in}})",
      partition.table_name()
    );
    self.execute_chunked(sql, ids).await
  }

  async fn delete_by_dataset(
    &self,
    partition: PartitionId,
    datasets: Vec<String>,
  ) -> Result<usize> {
    let sql = format!(
      "DELETE FROM {} WHERE dataset_name IN ({{in}})",
      partition.table_name()
    );
    let removed = self.execute_chunked(sql, datasets).await?;
    tracing::debug!(%partition, removed, "deleted datasets");
    Ok(removed)
  }

  async fn delete_by_phone_number(
    &self,
    partition: PartitionId,
    numbers: Vec<String>,
  ) -> Result<usize> {
    require_duplicate_holding(partition)?;
    let sql = format!(
      "DELETE FROM {} WHERE phone_number IN ({{in}})",
      partition.table_name()
    );
    let removed = self.execute_chunked(sql, numbers).await?;
    tracing::debug!(%partition, removed, "deleted numbers");
    Ok(removed)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn query_membership(
    &self,
    partition: PartitionId,
    numbers: Vec<String>,
  ) -> Result<HashSet<String>> {
    if numbers.is_empty() {
      return Ok(HashSet::new());
    }
    let table = partition.table_name();

    let found = self
      .conn
      .call(move |conn| {
        let mut found = HashSet::new();
        for chunk in numbers.chunks(CHUNK_SIZE) {
          let sql = format!(
            "SELECT DISTINCT phone_number FROM {table} WHERE phone_number IN ({})",
            placeholders(chunk.len())
          );
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
            row.get::<_, String>(0)
          })?;
          for row in rows {
            found.insert(row?);
          }
        }
        Ok(found)
      })
      .await?;
    Ok(found)
  }

  async fn search(&self, partition: PartitionId, filter: &SearchFilter) -> Result<SearchResult> {
    // Build WHERE clause dynamically.
    let mut conds: Vec<&'static str> = vec![];
    let mut params: Vec<String> = vec![];
    if let Some(phone) = filter.phone.as_deref().filter(|s| !s.is_empty()) {
      conds.push("phone_number LIKE ? ESCAPE '\\'");
      params.push(like_contains(phone));
    }
    if let Some(dataset) = filter.dataset.as_deref().filter(|s| !s.is_empty()) {
      conds.push("dataset_name LIKE ? ESCAPE '\\'");
      params.push(like_contains(dataset));
    }
    if let Some(from) = filter.date_from {
      conds.push("receive_date >= ?");
      params.push(encode_date(from));
    }
    if let Some(to) = filter.date_to {
      conds.push("receive_date <= ?");
      params.push(encode_date(to));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let sql = format!(
      "SELECT {RECORD_COLUMNS} FROM {} {where_clause} ORDER BY id ASC",
      partition.table_name()
    );
    let records = self.query_records(sql, params).await?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in &records {
      *counts.entry(r.phone_number.as_str()).or_default() += 1;
    }
    let repeated_numbers = counts.values().filter(|&&c| c > 1).count();

    Ok(SearchResult { total: records.len(), repeated_numbers, records })
  }

  async fn list_dataset_summary(&self, partition: PartitionId) -> Result<Vec<DatasetSummary>> {
    let table = partition.table_name();

    let summaries = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT dataset_name,
                  COUNT(*) AS total,
                  SUM(CASE WHEN is_exported = 0 THEN 1 ELSE 0 END) AS exportable
           FROM {table}
           GROUP BY dataset_name
           ORDER BY dataset_name ASC"
        ))?;
        let rows = stmt
          .query_map([], |row| {
            Ok(DatasetSummary {
              dataset_name: row.get(0)?,
              total:        row.get::<_, i64>(1)? as usize,
              exportable:   row.get::<_, i64>(2)? as usize,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(summaries)
  }

  async fn fetch_dataset(&self, partition: PartitionId, dataset: String) -> Result<Vec<PhoneRecord>> {
    let sql = format!(
      "SELECT {RECORD_COLUMNS} FROM {} WHERE dataset_name = ? ORDER BY id ASC",
      partition.table_name()
    );
    self.query_records(sql, vec![dataset]).await
  }

  async fn select_for_export(
    &self,
    partition: PartitionId,
    dataset: String,
    limit: usize,
  ) -> Result<Vec<PhoneRecord>> {
    let table = partition.table_name();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawPhoneRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM {table}
           WHERE dataset_name = ?1
           ORDER BY is_exported ASC, id ASC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![dataset, limit], RawPhoneRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPhoneRecord::into_record).collect()
  }

  async fn duplicate_summary(&self, partition: PartitionId) -> Result<DuplicateSummary> {
    require_duplicate_holding(partition)?;
    let table = partition.table_name();

    let summary = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT phone_number, COUNT(*) AS n
           FROM {table}
           GROUP BY phone_number
           HAVING n > 1
           ORDER BY n DESC, phone_number ASC"
        ))?;
        let entries = stmt
          .query_map([], |row| {
            Ok(DuplicateCount {
              phone_number: row.get(0)?,
              count:        row.get::<_, i64>(1)? as usize,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let distinct: i64 = conn.query_row(
          &format!("SELECT COUNT(DISTINCT phone_number) FROM {table}"),
          [],
          |row| row.get(0),
        )?;

        Ok(DuplicateSummary { entries, distinct_numbers: distinct as usize })
      })
      .await?;
    Ok(summary)
  }
}
