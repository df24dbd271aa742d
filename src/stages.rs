//! Typed schemas for the four stage responses.
//!
//! Every category defaults to an empty container so that a model response
//! omitting a key deserializes cleanly; downstream code never branches on key
//! presence. Absence means "none found", not an error.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub grammatical_notes: String,
    #[serde(default)]
    pub quranic_allusions: Vec<QuranicAllusion>,
    #[serde(default)]
    pub hadith_references: Vec<HadithReference>,
    #[serde(default)]
    pub sufi_terminology: Vec<SufiTerm>,
    #[serde(default)]
    pub ambiguities: Vec<Ambiguity>,
    #[serde(default)]
    pub wordplay: Vec<Wordplay>,
    #[serde(default)]
    pub meter: String,
    #[serde(default)]
    pub meter_effects: String,
    #[serde(default)]
    pub arabic_content: ArabicContent,
    #[serde(default)]
    pub historical_context: String,
    #[serde(default)]
    pub translation_challenges: Vec<String>,
    #[serde(default)]
    pub key_images: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuranicAllusion {
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub rumi_usage: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HadithReference {
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub meaning: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SufiTerm {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub persian: String,
    #[serde(default)]
    pub meaning_in_context: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Ambiguity {
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub possible_readings: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Wordplay {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub meanings: Vec<String>,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default)]
    pub note: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ArabicContent {
    #[serde(default)]
    pub has_arabic: bool,
    #[serde(default)]
    pub segments: Vec<ArabicSegment>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ArabicSegment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub standard_translation: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TranslatorResponse {
    #[serde(default)]
    pub literal_translation: LiteralVerses,
    /// Flat shape some responses use instead of nesting under
    /// `literal_translation`.
    #[serde(default)]
    pub verses: Vec<LiteralVerse>,
    #[serde(default)]
    pub translation_notes: Vec<TranslationNote>,
    #[serde(default)]
    pub uncertain_passages: Vec<UncertainPassage>,
    #[serde(default)]
    pub glossary_terms_used: Vec<String>,
}

impl TranslatorResponse {
    /// The one normalization point for the literal handoff: the nested
    /// `literal_translation.verses` list when present, else the flat
    /// top-level `verses` list.
    #[must_use]
    pub fn literal_verses(&self) -> &[LiteralVerse] {
        if !self.literal_translation.verses.is_empty() {
            &self.literal_translation.verses
        } else {
            &self.verses
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LiteralVerses {
    #[serde(default)]
    pub verses: Vec<LiteralVerse>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LiteralVerse {
    #[serde(default)]
    pub verse_number: u32,
    #[serde(default)]
    pub hemistich1: String,
    #[serde(default)]
    pub hemistich2: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TranslationNote {
    #[serde(default)]
    pub verse: u32,
    #[serde(default)]
    pub note: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UncertainPassage {
    #[serde(default)]
    pub verse: u32,
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StylistResponse {
    #[serde(default)]
    pub refined_translation: RefinedVerses,
    /// Flat shapes some responses use instead of nesting under
    /// `refined_translation`.
    #[serde(default)]
    pub verses: Vec<RefinedVerse>,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub stylistic_choices: Vec<StylisticChoice>,
    #[serde(default)]
    pub preserved_elements: Vec<String>,
    #[serde(default)]
    pub tone_notes: String,
}

impl StylistResponse {
    /// Normalized refined verse list: nested first, flat fallback.
    #[must_use]
    pub fn refined_verses(&self) -> &[RefinedVerse] {
        if !self.refined_translation.verses.is_empty() {
            &self.refined_translation.verses
        } else {
            &self.verses
        }
    }

    /// Normalized flowing text: nested first, flat fallback. May be empty;
    /// callers reconstruct from the verse list when it is.
    #[must_use]
    pub fn flowing_text(&self) -> &str {
        if !self.refined_translation.full_text.trim().is_empty() {
            &self.refined_translation.full_text
        } else {
            &self.full_text
        }
    }

    /// The refined poem as text: flowing text when present, else the line
    /// pairs joined in verse order.
    #[must_use]
    pub fn rendered_text(&self) -> String {
        let flowing = self.flowing_text();
        if !flowing.trim().is_empty() {
            return flowing.to_string();
        }
        let mut lines = Vec::with_capacity(self.refined_verses().len() * 2);
        for v in self.refined_verses() {
            lines.push(v.line1.clone());
            lines.push(v.line2.clone());
        }
        lines.join("\n")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RefinedVerses {
    #[serde(default)]
    pub verses: Vec<RefinedVerse>,
    #[serde(default)]
    pub full_text: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RefinedVerse {
    #[serde(default)]
    pub verse_number: u32,
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StylisticChoice {
    #[serde(default)]
    pub verse: u32,
    #[serde(default)]
    pub choice: String,
    #[serde(default)]
    pub rationale: String,
}

/// QA verdict confidence. MEDIUM is the default for an absent or
/// unrecognized value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct QaResponse {
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub semantic_fidelity: CheckScore,
    #[serde(default)]
    pub hallucination_check: HallucinationCheck,
    #[serde(default)]
    pub islamic_context: CheckFlag,
    #[serde(default)]
    pub terminology: TerminologyCheck,
    #[serde(default)]
    pub tone: ToneCheck,
    #[serde(default)]
    pub ambiguity_preservation: CheckFlag,
    #[serde(default)]
    pub overall_issues: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub flags_for_human_review: Option<bool>,
    #[serde(default)]
    pub human_review_reason: String,
}

impl QaResponse {
    /// The explicit review flag when the model set one, else true exactly
    /// when confidence is LOW.
    #[must_use]
    pub fn needs_review(&self) -> bool {
        self.flags_for_human_review
            .unwrap_or(self.confidence == Confidence::Low)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CheckScore {
    #[serde(default)]
    pub score: String,
    #[serde(default)]
    pub issues: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HallucinationCheck {
    #[serde(default)]
    pub additions: Vec<String>,
    #[serde(default)]
    pub omissions: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CheckFlag {
    #[serde(default)]
    pub preserved: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TerminologyCheck {
    #[serde(default)]
    pub consistent: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ToneCheck {
    #[serde(default)]
    pub sounds_like_rumi: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}
