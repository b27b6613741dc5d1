use crate::adapters::http::GoogleGeocoder;
use crate::adapters::storage::{CsvDatasetStore, FileCheckpoint, LocalStorage};
use crate::core::reconciler::Reconciler;
use crate::core::runner::{EnrichmentRunner, RunSummary};
use crate::core::{ConfigProvider, DatasetStore};
use crate::domain::model::NAME_COLUMN;
use crate::utils::error::Result;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillReport {
    /// Queries that would have been sent, by row index.
    DryRun {
        total_rows: usize,
        planned: Vec<(usize, String)>,
    },
    Completed {
        summary: RunSummary,
        output_path: String,
    },
}

impl BackfillReport {
    /// The provider quota ran out before every row was processed.
    pub fn halted(&self) -> bool {
        matches!(self, BackfillReport::Completed { summary, .. } if summary.halted())
    }
}

/// Loads the dataset, enriches it and writes the result.
///
/// The output is written even when the run stops early on a rate limit, so no
/// completed lookup is lost.
pub async fn run_backfill<C: ConfigProvider>(config: &C, dry_run: bool) -> Result<BackfillReport> {
    let store = CsvDatasetStore::new(LocalStorage::default(), config.delimiter());
    let mut dataset = store.load(config.input_path()).await?;

    if !dataset.has_column(NAME_COLUMN) {
        tracing::warn!(
            "Dataset has no '{}' column; every row will be skipped",
            NAME_COLUMN
        );
    }

    let geocoder = GoogleGeocoder::from_config(config)?;
    let checkpoint = FileCheckpoint::new(store.clone(), config.checkpoint_path().to_string());
    let pacing = Duration::try_from_secs_f64(config.delay_seconds()).unwrap_or(Duration::ZERO);
    let runner = EnrichmentRunner::new(Reconciler::new(geocoder, config.role()), checkpoint)
        .with_checkpoint_every(config.checkpoint_every())
        .with_pacing(pacing);

    if dry_run {
        let planned = runner.plan(&dataset);
        for (index, query) in &planned {
            tracing::info!("🔍 Row {}: would search for '{}'", index, query);
        }
        tracing::info!(
            "🔍 DRY RUN: {} of {} rows need a lookup",
            planned.len(),
            dataset.len()
        );
        return Ok(BackfillReport::DryRun {
            total_rows: dataset.len(),
            planned,
        });
    }

    let summary = runner.run(&mut dataset).await;

    store.save(&dataset, config.output_path()).await?;
    tracing::info!("✅ Done. Output saved to '{}'", config.output_path());
    summary.log();

    Ok(BackfillReport::Completed {
        summary,
        output_path: config.output_path().to_string(),
    })
}
