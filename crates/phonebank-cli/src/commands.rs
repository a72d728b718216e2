//! Subcommand handlers. Each one builds a validated request, runs the
//! pipeline against the store, and prints the outcome.

use std::path::Path;

use anyhow::Context as _;
use phonebank_core::{PartitionId, store::PhoneStore};
use phonebank_pipeline::{
  Confirm, exporter, files, import, manage, mover,
  request::{
    ExportRequest, ExportSelection, ImportRequest, MoveRequest, require_partition, search_filter,
  },
};
use phonebank_store_sqlite::SqliteStore;
use serde::Serialize;

use crate::{
  Command, ImportArgs,
  config::AppConfig,
  interact::{LogProgress, ask_stdin},
};

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn partition(name: &str) -> anyhow::Result<PartitionId> { Ok(require_partition(Some(name))?) }

fn confirmer(yes: bool) -> Box<dyn Confirm> {
  if yes { Box::new(|_: &str| true) } else { Box::new(ask_stdin) }
}

pub(crate) async fn run(
  store: &SqliteStore,
  cfg: &AppConfig,
  command: Command,
  json: bool,
) -> anyhow::Result<()> {
  let progress = LogProgress::default();

  match command {
    Command::Init => {
      store.create_partitions().await?;
      println!(
        "{} partitions ready in {} ({} holds duplicates)",
        PartitionId::all().count(),
        cfg.store_path.display(),
        PartitionId::DUPLICATES
      );
    }

    Command::Import(args) => import_files(store, args, &progress, json).await?,

    Command::Search { partition: p, phone, dataset, from, to } => {
      let filter =
        search_filter(phone.as_deref(), dataset.as_deref(), from.as_deref(), to.as_deref())?;
      let result = manage::search(store, partition(&p)?, &filter).await?;
      if json {
        return print_json(&result);
      }
      for r in &result.records {
        println!(
          "{}\t{}\t{}\t{}\t{}\t{}\t{}",
          r.id,
          r.phone_number,
          r.dataset_name,
          r.receive_date,
          r.source,
          r.data_type,
          if r.is_exported { "exported" } else { "-" }
        );
      }
      println!("{} records, {} repeated numbers", result.total, result.repeated_numbers);
    }

    Command::Datasets { partition: p } => {
      let summary = manage::list_datasets(store, partition(&p)?).await?;
      if json {
        return print_json(&summary);
      }
      for d in &summary {
        println!("{}\t{} total\t{} exportable", d.dataset_name, d.total, d.exportable);
      }
    }

    Command::Move { from, to, delete, datasets } => {
      let request = MoveRequest::new(Some(&from), Some(&to), &datasets, delete)?;
      let outcome = mover::move_datasets(store, &request, &progress).await?;
      if json {
        return print_json(&outcome);
      }
      for d in &outcome.datasets {
        println!("{}: copied {}, deleted {}", d.dataset, d.copied, d.deleted);
      }
    }

    Command::Export { partition: p, take, inject, output } => {
      let selections = take
        .iter()
        .map(|t| ExportSelection::parse(t))
        .collect::<Result<Vec<_>, _>>()?;
      let inject = match inject {
        Some(path) => files::read_nonblank_lines(&path).await?,
        None => Vec::new(),
      };
      let request = ExportRequest::new(Some(&p), selections, inject)?;
      // Marking is irreversible; fail on the output path before touching records.
      let file = files::create_output(&output).await?;
      let outcome = exporter::export(store, &request, &mut rand::thread_rng(), &progress).await?;
      files::write_number_list_to(file, &output, &outcome.numbers).await?;

      if json {
        return print_json(&outcome.warnings);
      }
      for w in &outcome.warnings {
        eprintln!(
          "warning: {} requested {} but only {} unexported; previously exported numbers included",
          w.dataset, w.requested, w.exportable
        );
      }
      println!(
        "wrote {} numbers to {} ({} exported, {} injected)",
        outcome.numbers.len(),
        output.display(),
        outcome.exported,
        outcome.injected
      );
    }

    Command::Duplicates { csv } => {
      let report = manage::duplicate_report(store).await?;
      if let Some(path) = &csv {
        files::write_duplicate_csv(path, &report).await?;
      }
      if json {
        return print_json(&report);
      }
      for e in &report.entries {
        println!("{}\t{}", e.phone_number, e.count);
      }
      println!(
        "{} repeated of {} distinct numbers",
        report.entries.len(),
        report.distinct_numbers
      );
    }

    Command::PurgeDuplicates { mut numbers, file, yes } => {
      if let Some(path) = file {
        numbers.extend(files::read_nonblank_lines(&path).await?);
      }
      match manage::purge_duplicates(store, &numbers, &*confirmer(yes)).await? {
        Some(removed) => println!("deleted {removed} records"),
        None => println!("cancelled"),
      }
    }

    Command::DeleteDatasets { partition: p, datasets, yes } => {
      let p = partition(&p)?;
      match manage::delete_datasets(store, p, &datasets, &*confirmer(yes)).await? {
        Some(removed) => println!("deleted {removed} records from {p}"),
        None => println!("cancelled"),
      }
    }

    Command::Combine { first, second, output } => combine(&first, &second, &output).await?,
  }

  Ok(())
}

async fn import_files(
  store: &SqliteStore,
  args: ImportArgs,
  progress: &LogProgress,
  json: bool,
) -> anyhow::Result<()> {
  if args.preview {
    let destination = partition(&args.to)?;
    let preview = import::preview_import(store, destination, &args.files, progress).await?;
    if json {
      return print_json(&preview.classification);
    }
    let c = &preview.classification;
    println!("{} lines read, {} rejected", preview.lines_read, preview.rejected);
    println!("{} new numbers", c.first_occurrences.len());
    println!("{} already in {destination}", c.existing_duplicates.len());
    for d in &c.internal_duplicates {
      println!("repeated in files: {} x{}", d.phone_number, d.count);
    }
    return Ok(());
  }

  let request = ImportRequest::new(
    Some(&args.to),
    args.dataset.as_deref().unwrap_or_default(),
    args.date.as_deref().unwrap_or_default(),
    &args.source,
    &args.detail,
    args.data_type,
  )?;
  let (preview, outcome) = import::run_import(store, &request, &args.files, progress).await?;
  if json {
    return print_json(&outcome);
  }
  println!(
    "imported {} numbers into {}, {} repeats to {}, {} already present, {} lines rejected",
    outcome.inserted,
    request.destination,
    outcome.routed_to_duplicates,
    PartitionId::DUPLICATES,
    outcome.skipped_existing,
    preview.rejected
  );
  Ok(())
}

pub async fn combine(first: &Path, second: &Path, output: &Path) -> anyhow::Result<()> {
  let lines = files::combine_files(first, second, &mut rand::thread_rng()).await?;
  files::write_number_list(output, &lines)
    .await
    .with_context(|| format!("failed to write {}", output.display()))?;
  println!("wrote {} lines to {}", lines.len(), output.display());
  Ok(())
}
