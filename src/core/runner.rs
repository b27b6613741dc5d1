use crate::core::reconciler::Reconciler;
use crate::domain::model::{
    Dataset, Reconciliation, SCRAPED_ADDRESS_COLUMN, UPDATED_FIELDS_COLUMN,
};
use crate::domain::ports::{CheckpointSink, GeocodingProvider};
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_rows: usize,
    pub ineligible: usize,
    pub merged: usize,
    pub already_complete: usize,
    pub not_found: usize,
    pub country_rejected: usize,
    /// Row at which the provider reported quota exhaustion.
    pub halted_at: Option<usize>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    fn start(total_rows: usize) -> Self {
        let now = Utc::now();
        Self {
            total_rows,
            ineligible: 0,
            merged: 0,
            already_complete: 0,
            not_found: 0,
            country_rejected: 0,
            halted_at: None,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn lookups(&self) -> usize {
        self.merged + self.already_complete + self.not_found + self.country_rejected
    }

    pub fn halted(&self) -> bool {
        self.halted_at.is_some()
    }

    fn record(&mut self, outcome: &Reconciliation) {
        match outcome {
            Reconciliation::Ineligible => self.ineligible += 1,
            Reconciliation::RateLimited => {}
            Reconciliation::NotFound => self.not_found += 1,
            Reconciliation::CountryRejected { .. } => self.country_rejected += 1,
            Reconciliation::Merged { updated } if updated.is_empty() => self.already_complete += 1,
            Reconciliation::Merged { .. } => self.merged += 1,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            "📊 Rows: {}, lookups: {}, updated: {}, already complete: {}, not found: {}, non-US: {}, skipped: {}",
            self.total_rows,
            self.lookups(),
            self.merged,
            self.already_complete,
            self.not_found,
            self.country_rejected,
            self.ineligible
        );
        tracing::info!(
            "⏱️ Elapsed: {}s",
            (self.finished_at - self.started_at).num_seconds()
        );
        if let Some(row) = self.halted_at {
            tracing::warn!(
                "🚫 Stopped at row {} after the provider quota was exhausted; rows from {} on were not processed",
                row,
                row
            );
        }
    }
}

/// Drives the reconciler over a dataset, one record at a time.
pub struct EnrichmentRunner<G: GeocodingProvider, K: CheckpointSink> {
    reconciler: Reconciler<G>,
    checkpoint: K,
    checkpoint_every: usize,
    pacing: Duration,
}

impl<G: GeocodingProvider, K: CheckpointSink> EnrichmentRunner<G, K> {
    pub fn new(reconciler: Reconciler<G>, checkpoint: K) -> Self {
        Self {
            reconciler,
            checkpoint,
            checkpoint_every: 10,
            pacing: Duration::from_secs(1),
        }
    }

    /// Checkpoint after lookups on rows whose index is a multiple of `every`.
    pub fn with_checkpoint_every(mut self, every: usize) -> Self {
        self.checkpoint_every = every.max(1);
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn reconciler(&self) -> &Reconciler<G> {
        &self.reconciler
    }

    /// Enriches `dataset` in place. Stops at the first rate-limit signal, keeping
    /// every row completed before it.
    ///
    /// A lookup whose candidate is rejected for its country still counts for the
    /// checkpoint cadence and the pacing delay, like any other performed lookup.
    pub async fn run(&self, dataset: &mut Dataset) -> RunSummary {
        let mut summary = RunSummary::start(dataset.len());

        for column in self.reconciler.role().columns() {
            if dataset.ensure_column(&column) {
                tracing::warn!("Column '{}' not in dataset, appending it", column);
            }
        }
        dataset.ensure_column(SCRAPED_ADDRESS_COLUMN);
        dataset.ensure_column(UPDATED_FIELDS_COLUMN);

        tracing::info!(
            "🚀 Enriching {} {} addresses",
            dataset.len(),
            self.reconciler.role()
        );

        for index in 0..dataset.records.len() {
            let outcome = self
                .reconciler
                .reconcile(index, &mut dataset.records[index])
                .await;
            summary.record(&outcome);

            if outcome == Reconciliation::RateLimited {
                tracing::warn!("🚫 Provider limit hit. Stopping to avoid failure.");
                summary.halted_at = Some(index);
                break;
            }

            if !outcome.performed_lookup() {
                continue;
            }

            if index % self.checkpoint_every == 0 {
                match self.checkpoint.checkpoint(dataset).await {
                    Ok(()) => tracing::info!("💾 Checkpoint saved at row {}", index),
                    Err(e) => tracing::warn!("Checkpoint at row {} failed: {}", index, e),
                }
            }

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        summary.finished_at = Utc::now();
        summary
    }

    /// Queries the run would send, by row index. Performs no lookups and writes nothing.
    pub fn plan(&self, dataset: &Dataset) -> Vec<(usize, String)> {
        dataset
            .records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                self.reconciler
                    .planned_query(record)
                    .map(|query| (index, query))
            })
            .collect()
    }
}
