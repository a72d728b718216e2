//! Plain-text inputs and outputs: number lists, the duplicate report, and
//! the two-file combine utility.

use std::path::Path;

use phonebank_core::store::DuplicateSummary;
use rand::{Rng, seq::SliceRandom as _};
use tokio::{fs::File, io::AsyncWriteExt as _};

use crate::{Error, Result};

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
  move |source| Error::Io { path: path.to_path_buf(), source }
}

/// Every line of a text file. Invalid UTF-8 is replaced rather than
/// rejected; the normalizer ignores non-digit noise anyway.
pub async fn read_lines(path: &Path) -> Result<Vec<String>> {
  let bytes = tokio::fs::read(path).await.map_err(io_err(path))?;
  Ok(
    String::from_utf8_lossy(&bytes)
      .lines()
      .map(str::to_owned)
      .collect(),
  )
}

/// Trimmed, non-blank lines of a text file.
pub async fn read_nonblank_lines(path: &Path) -> Result<Vec<String>> {
  Ok(
    read_lines(path)
      .await?
      .into_iter()
      .map(|l| l.trim().to_owned())
      .filter(|l| !l.is_empty())
      .collect(),
  )
}

/// Create (or truncate) an output file up front, so an unwritable path is
/// reported before any store mutation.
pub async fn create_output(path: &Path) -> Result<File> {
  File::create(path).await.map_err(io_err(path))
}

/// Write one number per line into a file from [`create_output`].
pub async fn write_number_list_to(mut file: File, path: &Path, numbers: &[String]) -> Result<()> {
  file
    .write_all(numbers.join("\n").as_bytes())
    .await
    .map_err(io_err(path))?;
  file.flush().await.map_err(io_err(path))
}

/// Write one number per line.
pub async fn write_number_list(path: &Path, numbers: &[String]) -> Result<()> {
  let file = create_output(path).await?;
  write_number_list_to(file, path, numbers).await
}

/// Render the duplicate report as CSV with a header row.
pub fn duplicate_csv(summary: &DuplicateSummary) -> String {
  let mut out = String::from("phone_number,duplicate_count\n");
  for entry in &summary.entries {
    out.push_str(&escape_csv_value(&entry.phone_number));
    out.push(',');
    out.push_str(&entry.count.to_string());
    out.push('\n');
  }
  out
}

pub async fn write_duplicate_csv(path: &Path, summary: &DuplicateSummary) -> Result<()> {
  tokio::fs::write(path, duplicate_csv(summary))
    .await
    .map_err(io_err(path))
}

fn escape_csv_value(value: &str) -> String {
  if value.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_owned()
  }
}

/// Merge the non-blank lines of two files and shuffle the result.
pub async fn combine_files<R: Rng + ?Sized>(
  first: &Path,
  second: &Path,
  rng: &mut R,
) -> Result<Vec<String>> {
  let mut lines = read_nonblank_lines(first).await?;
  lines.extend(read_nonblank_lines(second).await?);
  lines.shuffle(rng);
  tracing::info!(lines = lines.len(), "combined files");
  Ok(lines)
}
