use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// One couplet of a ghazal. The second hemistich may be empty in malformed
/// source data; the pipeline tolerates that rather than rejecting the poem.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VersePair {
    pub hemistich1: String,
    #[serde(default)]
    pub hemistich2: String,
}

/// A source poem as produced by the fetcher. Read-only once loaded; verse
/// order is couplet order in the poem.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Ghazal {
    pub number: u32,
    #[serde(default)]
    pub meter: String,
    #[serde(default)]
    pub rhyme: String,
    #[serde(default)]
    pub verses: Vec<VersePair>,
}

impl Ghazal {
    #[must_use]
    pub fn verse_count(&self) -> usize {
        self.verses.len()
    }

    /// "Verse N:" block with indented hemistichs, the analyzer/translator
    /// prompt form.
    #[must_use]
    pub fn numbered_block(&self) -> String {
        let mut lines = Vec::with_capacity(self.verses.len() * 3);
        for (i, verse) in self.verses.iter().enumerate() {
            lines.push(format!("Verse {}:", i + 1));
            lines.push(format!("  {}", verse.hemistich1));
            lines.push(format!("  {}", verse.hemistich2));
        }
        lines.join("\n")
    }

    /// "Verse N: h1 / h2" single-line form, used where the Persian is only
    /// reference context.
    #[must_use]
    pub fn inline_block(&self) -> String {
        self.verses
            .iter()
            .enumerate()
            .map(|(i, v)| format!("Verse {}: {} / {}", i + 1, v.hemistich1, v.hemistich2))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// "N. h1 / h2" listed form for the QA comparison block.
    #[must_use]
    pub fn listed_block(&self) -> String {
        self.verses
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{}. {} / {}", i + 1, v.hemistich1, v.hemistich2))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn meter_label(&self) -> &str {
        if self.meter.trim().is_empty() {
            "Unknown"
        } else {
            &self.meter
        }
    }

    #[must_use]
    pub fn rhyme_label(&self) -> &str {
        if self.rhyme.trim().is_empty() {
            "Unknown"
        } else {
            &self.rhyme
        }
    }
}

/// The persisted input document: corpus labels plus the ordered poems.
#[derive(Clone, Debug, Deserialize)]
pub struct GhazalCorpus {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_edition")]
    pub edition: String,
    #[serde(default)]
    pub ghazals: Vec<Ghazal>,
}

fn default_source() -> String {
    "Divan-e Kabir".to_string()
}

fn default_edition() -> String {
    "Unknown".to_string()
}

pub fn load_corpus(path: &Path) -> anyhow::Result<GhazalCorpus> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read corpus: {}", path.display()))?;
    let corpus: GhazalCorpus = serde_json::from_str(&text).context("parse corpus json")?;
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_second_hemistich_is_tolerated() {
        let json = r#"{"ghazals":[{"number":3,"verses":[{"hemistich1":"X"}]}]}"#;
        let corpus: GhazalCorpus = serde_json::from_str(json).expect("parse");
        assert_eq!(corpus.source, "Divan-e Kabir");
        assert_eq!(corpus.ghazals[0].verses[0].hemistich2, "");
    }

    #[test]
    fn numbered_block_keeps_verse_order() {
        let g = Ghazal {
            number: 1,
            verses: vec![
                VersePair {
                    hemistich1: "a".into(),
                    hemistich2: "b".into(),
                },
                VersePair {
                    hemistich1: "c".into(),
                    hemistich2: "d".into(),
                },
            ],
            ..Ghazal::default()
        };
        assert_eq!(
            g.numbered_block(),
            "Verse 1:\n  a\n  b\nVerse 2:\n  c\n  d"
        );
        assert_eq!(g.listed_block(), "1. a / b\n2. c / d");
    }

    #[test]
    fn empty_meter_renders_as_unknown() {
        let g = Ghazal::default();
        assert_eq!(g.meter_label(), "Unknown");
        assert_eq!(g.rhyme_label(), "Unknown");
    }
}
