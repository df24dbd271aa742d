use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;

use crate::ghazal::GhazalCorpus;
use crate::pipeline::{TranslationPipeline, TranslationResult, PIPELINE_VERSION, TRANSLATION_METHOD};
use crate::progress::ConsoleProgress;
use crate::stages::Confidence;

/// One poem that did not complete, recorded so the corpus run can continue.
#[derive(Clone, Debug)]
pub struct CorpusFailure {
    pub ghazal_number: u32,
    pub error: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CorpusTally {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub flagged_for_review: usize,
}

impl CorpusTally {
    #[must_use]
    pub fn from_results(results: &[TranslationResult]) -> Self {
        let mut tally = Self::default();
        for r in results {
            match r.confidence {
                Confidence::High => tally.high += 1,
                Confidence::Medium => tally.medium += 1,
                Confidence::Low => tally.low += 1,
            }
            if r.needs_review {
                tally.flagged_for_review += 1;
            }
        }
        tally
    }
}

pub struct CorpusReport {
    pub results: Vec<TranslationResult>,
    pub failures: Vec<CorpusFailure>,
}

/// The persisted output document.
#[derive(Serialize)]
pub struct CorpusDocument<'a> {
    pub source: String,
    pub edition: String,
    pub translation_method: String,
    pub translated_at: String,
    pub pipeline_version: String,
    pub translations: &'a [TranslationResult],
}

#[must_use]
pub fn build_document<'a>(
    corpus: &GhazalCorpus,
    results: &'a [TranslationResult],
) -> CorpusDocument<'a> {
    CorpusDocument {
        source: corpus.source.clone(),
        edition: corpus.edition.clone(),
        translation_method: TRANSLATION_METHOD.to_string(),
        translated_at: Utc::now().to_rfc3339(),
        pipeline_version: PIPELINE_VERSION.to_string(),
        translations: results,
    }
}

pub fn write_document(doc: &CorpusDocument<'_>, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(doc).context("serialize output document")?;
    std::fs::write(path, json).with_context(|| format!("write output: {}", path.display()))?;
    Ok(())
}

/// Applies the pipeline to every poem, tolerating per-poem failure: a poem
/// that errors is recorded and skipped, never fatal to the run.
pub struct CorpusRunner {
    pipeline: TranslationPipeline,
    progress: ConsoleProgress,
}

impl CorpusRunner {
    pub fn new(pipeline: TranslationPipeline, progress: ConsoleProgress) -> Self {
        Self { pipeline, progress }
    }

    pub fn run(&self, corpus: &GhazalCorpus, limit: Option<usize>) -> CorpusReport {
        let take = limit.unwrap_or(corpus.ghazals.len());
        let ghazals = &corpus.ghazals[..take.min(corpus.ghazals.len())];

        let mut results = Vec::with_capacity(ghazals.len());
        let mut failures = Vec::new();

        for (i, ghazal) in ghazals.iter().enumerate() {
            self.progress.progress("Corpus", i + 1, ghazals.len());
            match self.pipeline.translate_ghazal(ghazal) {
                Ok(result) => results.push(result),
                Err(err) => {
                    self.progress
                        .warn(format!("ghazal #{}: {err:#}", ghazal.number));
                    failures.push(CorpusFailure {
                        ghazal_number: ghazal.number,
                        error: format!("{err:#}"),
                    });
                }
            }
        }

        CorpusReport { results, failures }
    }

    pub fn report_summary(&self, report: &CorpusReport, output: &Path) {
        let tally = CorpusTally::from_results(&report.results);
        self.progress.info(format!(
            "Saved {} translations to {}",
            report.results.len(),
            output.display()
        ));
        self.progress.info(format!(
            "Confidence: {} high, {} medium, {} low",
            tally.high, tally.medium, tally.low
        ));
        self.progress
            .info(format!("Flagged for review: {}", tally.flagged_for_review));
        if !report.failures.is_empty() {
            self.progress
                .info(format!("Failed: {} ghazals", report.failures.len()));
        }
    }
}
