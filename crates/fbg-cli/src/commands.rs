use anyhow::{Context, Result};
use fbg_model::BatchResult;
use tracing::{Instrument, info_span};

use fbg_cli::host::GridHost;
use fbg_cli::render::{batch_errors_table, grid_table, history_table, page_footer};

use crate::cli::{EditArgs, HistoryArgs, PageArgs, SaveArgs};

pub async fn run_page(host: &GridHost, args: &PageArgs) -> Result<()> {
    let span = info_span!("page", csv = %args.csv.display(), page = args.page);
    let report = host
        .page(&args.csv, args.page)
        .instrument(span)
        .await
        .with_context(|| format!("show page {} of {}", args.page, args.csv.display()))?;
    println!("{}", grid_table(&report.view, &report.edits));
    println!("{}", page_footer(&report.view.page));
    if report.view.pending_edits > 0 {
        println!("{} unsaved edit(s)", report.view.pending_edits);
    }
    Ok(())
}

pub fn run_edit(host: &GridHost, args: &EditArgs) -> Result<()> {
    let receipt = host
        .edit(&args.csv, &args.key, &args.overlay, &args.value)
        .with_context(|| format!("record edit of {}", args.key))?;
    match receipt.page {
        Some(page) => println!("{} / {} set (page {})", args.key, args.overlay, page),
        None => println!(
            "{} / {} set, but {} has no such key",
            args.key,
            args.overlay,
            args.csv.display()
        ),
    }
    println!("{} unsaved edit(s)", receipt.pending);
    Ok(())
}

pub async fn run_save(host: &GridHost, args: &SaveArgs) -> Result<BatchResult> {
    let span = info_span!("save", csv = %args.csv.display());
    let result = host
        .save(&args.csv)
        .instrument(span)
        .await
        .with_context(|| format!("save edits of {}", args.csv.display()))?;
    println!("{}", result.summary());
    if let Some(table) = batch_errors_table(&result) {
        println!("{table}");
    }
    if !result.skipped_keys.is_empty() {
        println!("Not in this file: {}", result.skipped_keys.join(", "));
    }
    Ok(result)
}

pub async fn run_history(host: &GridHost, args: &HistoryArgs) -> Result<()> {
    let dataset_id = match &args.dataset {
        Some(id) => id.clone(),
        None => host.dataset_id(None).context("resolve dataset id")?,
    };
    let records = host
        .history(&dataset_id, &args.key)
        .await
        .with_context(|| format!("fetch history of {} in {}", args.key, dataset_id))?;
    if records.is_empty() {
        println!("No annotations for {} in {}", args.key, dataset_id);
        return Ok(());
    }
    println!("{}", history_table(&records));
    Ok(())
}
