use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::ghazal::{Ghazal, VersePair};
use crate::models::ChatModel;
use crate::progress::ConsoleProgress;
use crate::stages::{
    AnalysisResponse, Confidence, QaResponse, StylistResponse, TranslatorResponse,
};
use crate::textutil::sanitize_plain_text;

use super::invoker::{run_stage, Stage, StageOutput};
use super::prompts;
use super::trace::TraceWriter;
use super::{PipelineConfig, PIPELINE_VERSION};

#[derive(Clone, Debug, Serialize)]
pub struct RunMetadata {
    pub translated_at: String,
    pub model: String,
    pub pipeline_version: String,
}

/// The consolidated record for one poem. Append-only: stage outputs are
/// stored as produced and never re-derived.
#[derive(Clone, Debug, Serialize)]
pub struct TranslationResult {
    pub ghazal_id: String,
    pub ghazal_number: u32,
    pub persian_text: Vec<VersePair>,
    pub analysis: serde_json::Value,
    pub literal_translation: serde_json::Value,
    pub refined_translation: serde_json::Value,
    pub qa_result: serde_json::Value,
    pub final_translation: String,
    pub scholarly_notes: String,
    pub confidence: Confidence,
    pub needs_review: bool,
    pub metadata: RunMetadata,
}

/// Runs the four stages for one poem in strict sequence, threading each
/// stage's output into the next builder. Owns nothing mutable across poems.
pub struct TranslationPipeline {
    cfg: PipelineConfig,
    model: Box<dyn ChatModel>,
    progress: ConsoleProgress,
    trace: TraceWriter,
}

impl TranslationPipeline {
    pub fn new(cfg: PipelineConfig, model: Box<dyn ChatModel>, progress: ConsoleProgress) -> Self {
        let trace = TraceWriter::new(cfg.trace_dir.clone(), cfg.trace_enabled)
            .unwrap_or_else(|_| TraceWriter::disabled());
        Self {
            cfg,
            model,
            progress,
            trace,
        }
    }

    pub fn translate_ghazal(&self, ghazal: &Ghazal) -> anyhow::Result<TranslationResult> {
        self.progress
            .section(format!("Translating Ghazal #{}", ghazal.number));

        if ghazal.verses.is_empty() {
            self.progress.warn(format!(
                "ghazal #{}: empty verse list, producing empty result",
                ghazal.number
            ));
            return Ok(self.empty_result(ghazal));
        }

        let analysis: StageOutput<AnalysisResponse> = self.run(
            Stage::Analyzer,
            ghazal,
            &prompts::analyzer_system(),
            &prompts::analyzer_prompt(ghazal),
        )?;

        self.pace();
        let literal: StageOutput<TranslatorResponse> = self.run(
            Stage::Translator,
            ghazal,
            &prompts::translator_system(),
            &prompts::translator_prompt(ghazal, &analysis.record),
        )?;
        self.check_alignment(ghazal, &literal, literal.record.literal_verses().len());

        self.pace();
        let refined: StageOutput<StylistResponse> = self.run(
            Stage::Stylist,
            ghazal,
            &prompts::stylist_system(),
            &prompts::stylist_prompt(ghazal, &analysis.record, literal.record.literal_verses()),
        )?;
        self.check_alignment(ghazal, &refined, refined.record.refined_verses().len());

        self.pace();
        let qa: StageOutput<QaResponse> = self.run(
            Stage::Qa,
            ghazal,
            &prompts::qa_system(),
            &prompts::qa_prompt(
                ghazal,
                &analysis.record,
                literal.record.literal_verses(),
                &refined.record,
            ),
        )?;

        let final_translation = final_translation_text(&refined);
        let scholarly_notes = compile_scholarly_notes(&analysis.record, &literal.record);
        let confidence = qa.record.confidence;
        let needs_review = qa.record.needs_review();

        let result = TranslationResult {
            ghazal_id: format!("F-{}", ghazal.number),
            ghazal_number: ghazal.number,
            persian_text: ghazal.verses.clone(),
            analysis: analysis.value,
            literal_translation: literal.value,
            refined_translation: refined.value,
            qa_result: qa.value,
            final_translation,
            scholarly_notes,
            confidence,
            needs_review,
            metadata: self.metadata(),
        };

        self.print_summary(&result, &qa.record);
        Ok(result)
    }

    fn run<T>(
        &self,
        stage: Stage,
        ghazal: &Ghazal,
        system: &str,
        user: &str,
    ) -> anyhow::Result<StageOutput<T>>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        run_stage(
            self.model.as_ref(),
            &self.progress,
            &self.trace,
            stage,
            ghazal.number,
            system,
            user,
        )
    }

    fn pace(&self) {
        if !self.cfg.request_delay.is_zero() {
            std::thread::sleep(self.cfg.request_delay);
        }
    }

    /// Verse alignment is a data-quality signal, never a failure. Degraded
    /// stages already warned, so only parsed records are checked.
    fn check_alignment<T>(&self, ghazal: &Ghazal, stage: &StageOutput<T>, count: usize) {
        if stage.is_degraded() {
            return;
        }
        if count != ghazal.verse_count() {
            self.progress.warn(format!(
                "ghazal #{}: stage returned {count} verses, source has {}",
                ghazal.number,
                ghazal.verse_count()
            ));
        }
    }

    fn metadata(&self) -> RunMetadata {
        RunMetadata {
            translated_at: Utc::now().to_rfc3339(),
            model: self.model.model_name().to_string(),
            pipeline_version: PIPELINE_VERSION.to_string(),
        }
    }

    fn empty_result(&self, ghazal: &Ghazal) -> TranslationResult {
        let empty = json!({"raw_response": "", "parse_error": "empty_source"});
        TranslationResult {
            ghazal_id: format!("F-{}", ghazal.number),
            ghazal_number: ghazal.number,
            persian_text: Vec::new(),
            analysis: empty.clone(),
            literal_translation: empty.clone(),
            refined_translation: empty.clone(),
            qa_result: empty,
            final_translation: String::new(),
            scholarly_notes: String::new(),
            confidence: Confidence::Low,
            needs_review: true,
            metadata: self.metadata(),
        }
    }

    fn print_summary(&self, result: &TranslationResult, qa: &QaResponse) {
        let p = &self.progress;
        p.plain("\n--- Translation Result ---");
        p.plain(format!(
            "Confidence: {}",
            result.confidence.as_str().to_uppercase()
        ));
        if result.needs_review {
            let reason = qa.human_review_reason.trim();
            if reason.is_empty() {
                p.plain("FLAGGED FOR HUMAN REVIEW");
            } else {
                p.plain(format!("FLAGGED FOR HUMAN REVIEW: {reason}"));
            }
        }
        p.plain("\n--- Final Translation ---");
        p.plain(&result.final_translation);
        if !qa.overall_issues.is_empty() {
            p.plain("\n--- QA Issues ---");
            for issue in &qa.overall_issues {
                p.plain(format!("  - {issue}"));
            }
        }
    }
}

/// Final-text precedence: flowing text, else line pairs joined in verse
/// order, else the string form of the persisted record (last resort; its
/// presence signals upstream malformation).
fn final_translation_text(refined: &StageOutput<StylistResponse>) -> String {
    let rendered = refined.record.rendered_text();
    if !rendered.trim().is_empty() {
        return sanitize_plain_text(&rendered);
    }
    sanitize_plain_text(&refined.value.to_string())
}

/// Scholarly notes in fixed category order; empty categories are omitted
/// entirely, and no findings at all yields an empty string.
fn compile_scholarly_notes(analysis: &AnalysisResponse, literal: &TranslatorResponse) -> String {
    let mut notes: Vec<String> = Vec::new();

    if !analysis.quranic_allusions.is_empty() {
        notes.push("**Quranic Allusions:**".to_string());
        for a in &analysis.quranic_allusions {
            let reference = if a.reference.is_empty() {
                "?"
            } else {
                a.reference.as_str()
            };
            let meaning = if !a.meaning.is_empty() {
                a.meaning.as_str()
            } else {
                a.rumi_usage.as_str()
            };
            notes.push(format!("- {reference}: {meaning}"));
        }
    }

    if !analysis.sufi_terminology.is_empty() {
        notes.push("\n**Sufi Terminology:**".to_string());
        for t in &analysis.sufi_terminology {
            notes.push(format!(
                "- *{}* ({}): {}",
                t.term, t.persian, t.meaning_in_context
            ));
        }
    }

    if !analysis.ambiguities.is_empty() {
        notes.push("\n**Deliberate Ambiguities:**".to_string());
        for a in &analysis.ambiguities {
            notes.push(format!(
                "- \"{}\": {}",
                a.phrase,
                a.possible_readings.join(", ")
            ));
        }
    }

    if !analysis.wordplay.is_empty() {
        notes.push("\n**Wordplay (Lost in Translation):**".to_string());
        for w in &analysis.wordplay {
            notes.push(format!("- *{}*: {}", w.word, w.meanings.join(", ")));
        }
    }

    if !literal.translation_notes.is_empty() {
        notes.push("\n**Translation Notes:**".to_string());
        for n in &literal.translation_notes {
            notes.push(format!("- Verse {}: {}", n.verse, n.note));
        }
    }

    sanitize_plain_text(notes.join("\n").trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghazal::VersePair;
    use crate::pipeline::invoker::StageOutput;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::time::Duration;

    struct ScriptedModel {
        responses: RefCell<VecDeque<String>>,
    }

    impl ScriptedModel {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: RefCell::new(responses.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    impl ChatModel for ScriptedModel {
        fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn test_cfg() -> PipelineConfig {
        PipelineConfig {
            model: "scripted".to_string(),
            max_tokens: 100,
            base_url: "http://unused".to_string(),
            timeout: Duration::from_secs(1),
            request_delay: Duration::ZERO,
            trace_dir: PathBuf::new(),
            trace_enabled: false,
            verbose: false,
        }
    }

    fn pipeline(responses: &[&str]) -> TranslationPipeline {
        TranslationPipeline::new(
            test_cfg(),
            Box::new(ScriptedModel::new(responses)),
            ConsoleProgress::new(false),
        )
    }

    fn one_verse_ghazal() -> Ghazal {
        Ghazal {
            number: 1,
            verses: vec![VersePair {
                hemistich1: "X".to_string(),
                hemistich2: "Y".to_string(),
            }],
            ..Ghazal::default()
        }
    }

    const CANNED_ANALYSIS: &str = r#"{"grammatical_notes":"plain"}"#;
    const CANNED_LITERAL: &str = r#"{"literal_translation":{"verses":[{"verse_number":1,"hemistich1":"X en","hemistich2":"Y en"}]}}"#;
    const CANNED_REFINED: &str = r#"{"refined_translation":{"verses":[{"verse_number":1,"line1":"X!","line2":"Y!"}],"full_text":"X!\nY!"}}"#;
    const CANNED_QA: &str =
        r#"{"confidence":"high","flags_for_human_review":false,"overall_issues":[]}"#;

    #[test]
    fn end_to_end_canned_run_consolidates_all_stages() {
        let p = pipeline(&[CANNED_ANALYSIS, CANNED_LITERAL, CANNED_REFINED, CANNED_QA]);
        let result = p.translate_ghazal(&one_verse_ghazal()).expect("run");

        assert_eq!(result.ghazal_number, 1);
        assert_eq!(result.ghazal_id, "F-1");
        assert_eq!(result.confidence, Confidence::High);
        assert!(!result.needs_review);
        assert_eq!(result.final_translation, "X!\nY!");
        assert_eq!(result.persian_text.len(), 1);
        assert_eq!(result.qa_result["confidence"], "high");
        assert_eq!(result.metadata.pipeline_version, PIPELINE_VERSION);
        assert_eq!(result.metadata.model, "scripted");
    }

    #[test]
    fn malformed_stage_still_produces_a_result() {
        let p = pipeline(&["not json at all", CANNED_LITERAL, CANNED_REFINED, CANNED_QA]);
        let result = p.translate_ghazal(&one_verse_ghazal()).expect("run");
        assert_eq!(result.analysis["raw_response"], "not json at all");
        assert!(result.analysis["parse_error"].as_str().is_some());
        assert_eq!(result.final_translation, "X!\nY!");
    }

    #[test]
    fn needs_review_defaults_true_for_low_confidence() {
        let qa_low = r#"{"confidence":"low"}"#;
        let p = pipeline(&[CANNED_ANALYSIS, CANNED_LITERAL, CANNED_REFINED, qa_low]);
        let result = p.translate_ghazal(&one_verse_ghazal()).expect("run");
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.needs_review);
    }

    #[test]
    fn degraded_qa_defaults_to_medium_without_review() {
        let p = pipeline(&[CANNED_ANALYSIS, CANNED_LITERAL, CANNED_REFINED, "garbage"]);
        let result = p.translate_ghazal(&one_verse_ghazal()).expect("run");
        assert_eq!(result.confidence, Confidence::Medium);
        assert!(!result.needs_review);
    }

    #[test]
    fn flowing_text_wins_over_line_pairs() {
        let refined: StylistResponse = serde_json::from_str(
            r#"{"refined_translation":{"verses":[{"line1":"A","line2":"B"}],"full_text":"Come, come!"}}"#,
        )
        .expect("parse");
        let out = StageOutput {
            value: serde_json::json!({}),
            record: refined,
            parse_error: None,
        };
        assert_eq!(final_translation_text(&out), "Come, come!");
    }

    #[test]
    fn line_pairs_join_when_flowing_text_is_empty() {
        let refined: StylistResponse = serde_json::from_str(
            r#"{"refined_translation":{"verses":[{"line1":"A","line2":"B"}],"full_text":""}}"#,
        )
        .expect("parse");
        let out = StageOutput {
            value: serde_json::json!({}),
            record: refined,
            parse_error: None,
        };
        assert_eq!(final_translation_text(&out), "A\nB");
    }

    #[test]
    fn degraded_refined_falls_back_to_value_string() {
        let out: StageOutput<StylistResponse> = StageOutput {
            record: StylistResponse::default(),
            value: serde_json::json!({"raw_response": "oops", "parse_error": "bad"}),
            parse_error: Some("bad".to_string()),
        };
        let text = final_translation_text(&out);
        assert!(text.contains("raw_response"));
    }

    #[test]
    fn scholarly_notes_empty_when_nothing_found() {
        let notes =
            compile_scholarly_notes(&AnalysisResponse::default(), &TranslatorResponse::default());
        assert_eq!(notes, "");
    }

    #[test]
    fn scholarly_notes_keep_fixed_category_order() {
        let analysis: AnalysisResponse = serde_json::from_str(
            r#"{
                "quranic_allusions":[{"phrase":"p","reference":"Quran 2:115","meaning":"the Face of God"}],
                "sufi_terminology":[{"term":"fana","persian":"فنا","meaning_in_context":"annihilation"}],
                "ambiguities":[{"phrase":"yar","possible_readings":["God","Shams"]}],
                "wordplay":[{"word":"hava","meanings":["air","desire"]}]
            }"#,
        )
        .expect("parse");
        let literal: TranslatorResponse =
            serde_json::from_str(r#"{"translation_notes":[{"verse":1,"note":"glossary note"}]}"#)
                .expect("parse");

        let notes = compile_scholarly_notes(&analysis, &literal);
        let qa_pos = notes.find("**Quranic Allusions:**").expect("quranic");
        let sufi_pos = notes.find("**Sufi Terminology:**").expect("sufi");
        let amb_pos = notes.find("**Deliberate Ambiguities:**").expect("amb");
        let word_pos = notes.find("**Wordplay (Lost in Translation):**").expect("wp");
        let tn_pos = notes.find("**Translation Notes:**").expect("tn");
        assert!(qa_pos < sufi_pos && sufi_pos < amb_pos && amb_pos < word_pos && word_pos < tn_pos);
        assert!(notes.contains("- Quran 2:115: the Face of God"));
        assert!(notes.contains("- *fana* (فنا): annihilation"));
        assert!(notes.contains("- \"yar\": God, Shams"));
        assert!(notes.contains("- Verse 1: glossary note"));
    }

    #[test]
    fn allusion_meaning_falls_back_to_usage() {
        let analysis: AnalysisResponse = serde_json::from_str(
            r#"{"quranic_allusions":[{"phrase":"p","rumi_usage":"inversion of the verse"}]}"#,
        )
        .expect("parse");
        let notes = compile_scholarly_notes(&analysis, &TranslatorResponse::default());
        assert!(notes.contains("- ?: inversion of the verse"));
    }

    #[test]
    fn empty_verse_list_yields_empty_flagged_result() {
        let p = pipeline(&[]);
        let g = Ghazal {
            number: 9,
            ..Ghazal::default()
        };
        let result = p.translate_ghazal(&g).expect("run");
        assert_eq!(result.ghazal_number, 9);
        assert_eq!(result.final_translation, "");
        assert_eq!(result.scholarly_notes, "");
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.needs_review);
    }
}
