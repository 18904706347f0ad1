use std::sync::{Arc, Mutex};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;

use crate::config::{MissingPolicy, PipelineConfig};
use crate::error::Result;
use crate::llm::{ClassificationRequest, LLMProvider};
use crate::models::{Classification, ClassificationOutcome, Dataset};
use crate::storage::Storage;

/// Counts for one pass over a dataset, plus the per-row outcomes in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationReport {
    /// Rows in the output table, after any dropped rows are removed.
    pub rows: usize,
    pub missing: usize,
    pub dropped: usize,
    pub classified: usize,
    pub unrecognized: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cached: usize,
    pub outcomes: Vec<ClassificationOutcome>,
}

impl std::fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows: {} classified ({} unrecognized, {} from checkpoint), {} failed, {} skipped, {} missing, {} dropped",
            self.rows,
            self.classified,
            self.unrecognized,
            self.cached,
            self.failed,
            self.skipped,
            self.missing,
            self.dropped
        )
    }
}

pub struct ClassificationPipeline {
    llm: Arc<dyn LLMProvider>,
    checkpoint: Option<Mutex<Storage>>,
    config: PipelineConfig,
}

impl ClassificationPipeline {
    pub fn new(llm: impl LLMProvider + 'static, config: PipelineConfig) -> Self {
        Self {
            llm: Arc::new(llm),
            checkpoint: None,
            config,
        }
    }

    pub fn with_checkpoint(mut self, storage: Storage) -> Self {
        self.checkpoint = Some(Mutex::new(storage));
        self
    }

    /// Reads the input file, classifies every row, writes the output file.
    pub async fn run(&self) -> Result<ClassificationReport> {
        tracing::info!("Reading dataset from {}", self.config.input_path.display());
        let mut dataset = Dataset::from_path(&self.config.input_path)?;

        let report = self.classify_dataset(&mut dataset).await?;

        dataset.write_to_path(&self.config.output_path)?;
        tracing::info!("Output written to: {}", self.config.output_path.display());

        Ok(report)
    }

    pub async fn classify_dataset(&self, dataset: &mut Dataset) -> Result<ClassificationReport> {
        let column = &self.config.column;

        if dataset.has_missing(column)? {
            tracing::warn!("{} column has NA", column);
        } else {
            tracing::info!("{} column doesn't have NA", column);
        }

        let names = dataset.column(column)?;
        let raw = dataset.raw_column(column)?;

        // Row index -> text to send, or None when the row is not sent at all
        let jobs: Vec<Option<String>> = names
            .iter()
            .zip(raw)
            .map(|(name, raw)| match (name, self.config.missing_policy) {
                (Some(name), _) => Some(name.clone()),
                (None, MissingPolicy::Classify) => Some(raw),
                (None, MissingPolicy::Skip | MissingPolicy::Drop) => None,
            })
            .collect();

        tracing::info!(
            "Classifying {} rows with {} (concurrency {})",
            jobs.len(),
            self.llm.name(),
            self.config.concurrency_limit.max(1)
        );

        let (outcomes, cached) = self.classify_all(jobs).await;

        let mut report = ClassificationReport {
            missing: names.iter().filter(|n| n.is_none()).count(),
            cached,
            ..Default::default()
        };
        for outcome in &outcomes {
            match outcome {
                ClassificationOutcome::Classified(c) => {
                    report.classified += 1;
                    if c.category.is_none() {
                        report.unrecognized += 1;
                    }
                }
                ClassificationOutcome::Failed(_) => report.failed += 1,
                ClassificationOutcome::Skipped => report.skipped += 1,
            }
        }

        let cells = outcomes.iter().map(|o| o.cell().to_string()).collect();
        dataset.set_column(&self.config.output_column, cells)?;

        if self.config.missing_policy == MissingPolicy::Drop {
            let keep: Vec<bool> = names.iter().map(Option::is_some).collect();
            dataset.retain_rows(&keep);
        }
        report.rows = dataset.len();
        report.dropped = outcomes.len() - dataset.len();

        report.outcomes = outcomes;
        tracing::info!("{}", report);
        Ok(report)
    }

    async fn classify_all(&self, jobs: Vec<Option<String>>) -> (Vec<ClassificationOutcome>, usize) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit.max(1)));

        let pb = ProgressBar::new(jobs.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let total = jobs.len();
        let futures = jobs.into_iter().enumerate().map(|(index, developer)| {
            let sem = semaphore.clone();
            let pb = pb.clone();

            async move {
                let result = match developer {
                    None => (ClassificationOutcome::Skipped, false),
                    Some(developer) => {
                        let _permit = sem.acquire().await.ok();
                        self.classify_one(&developer).await
                    }
                };
                pb.inc(1);
                (index, result)
            }
        });

        let results = join_all(futures).await;
        pb.finish_with_message("Classification complete");

        // Completion order is irrelevant; rows are placed back by index
        let mut outcomes = vec![ClassificationOutcome::Skipped; total];
        let mut cached = 0;
        for (index, (outcome, from_checkpoint)) in results {
            if from_checkpoint {
                cached += 1;
            }
            outcomes[index] = outcome;
        }

        (outcomes, cached)
    }

    async fn classify_one(&self, developer: &str) -> (ClassificationOutcome, bool) {
        let model = &self.config.model;

        if let Some(classification) = self.checkpoint_lookup(model, developer) {
            tracing::debug!("Using checkpointed classification for '{}'", developer);
            return (ClassificationOutcome::Classified(classification), true);
        }

        let request = ClassificationRequest::new(
            developer,
            model.as_str(),
            self.config.temperature,
            self.config.max_tokens,
        );

        match self.llm.classify_developer(&request).await {
            Ok(classification) => {
                if classification.category.is_none() {
                    tracing::warn!(
                        "Unrecognized category for '{}': {:?}",
                        developer,
                        classification.reply
                    );
                }
                self.checkpoint_save(model, developer, &classification);
                (ClassificationOutcome::Classified(classification), false)
            }
            Err(e) => {
                tracing::warn!("An error occurred {}", e);
                (ClassificationOutcome::Failed(e.to_string()), false)
            }
        }
    }

    fn checkpoint_lookup(&self, model: &str, developer: &str) -> Option<Classification> {
        let store = self.checkpoint.as_ref()?;
        let store = store.lock().ok()?;
        match store.get_classification(model, developer) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Checkpoint lookup failed for '{}': {}", developer, e);
                None
            }
        }
    }

    fn checkpoint_save(
        &self,
        model: &str,
        developer: &str,
        classification: &Classification,
    ) {
        let Some(store) = self.checkpoint.as_ref() else {
            return;
        };
        let Ok(store) = store.lock() else {
            return;
        };
        if let Err(e) = store.save_classification(model, developer, classification) {
            tracing::warn!("Failed to checkpoint '{}': {}", developer, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let report = ClassificationReport {
            rows: 3,
            classified: 2,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "3 rows: 2 classified (0 unrecognized, 0 from checkpoint), 1 failed, 0 skipped, 0 missing, 0 dropped"
        );
    }
}
