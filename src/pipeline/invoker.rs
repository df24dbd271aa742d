//! The single model-call-and-parse operation shared by all four stages.
//!
//! Parsing failure is data, not an exception: a stage whose response cannot
//! be coerced into its schema degrades to a raw-text record and the pipeline
//! keeps going, so one bad stage never loses the other three. Only transport
//! failure (the call itself) propagates, and only as far as the current poem.

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::models::ChatModel;
use crate::progress::ConsoleProgress;
use crate::textutil::{strip_code_fence, truncate_chars};

use super::trace::TraceWriter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Analyzer,
    Translator,
    Stylist,
    Qa,
}

impl Stage {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Analyzer => "Analyzer",
            Self::Translator => "Translator",
            Self::Stylist => "Stylist",
            Self::Qa => "QA",
        }
    }

    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Analyzer => "analyzer",
            Self::Translator => "translator",
            Self::Stylist => "stylist",
            Self::Qa => "qa",
        }
    }
}

/// One stage's outcome. `value` is what gets persisted: the parsed response
/// object, or the degraded `{"raw_response", "parse_error"}` wrapper.
/// `record` is the typed view, defaulted when degraded.
#[derive(Clone, Debug)]
pub struct StageOutput<T> {
    pub record: T,
    pub value: serde_json::Value,
    pub parse_error: Option<String>,
}

impl<T> StageOutput<T> {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.parse_error.is_some()
    }
}

/// Extract the first JSON object from model text, tolerating stray prose
/// before or after it.
pub fn extract_json_object(text: &str) -> anyhow::Result<serde_json::Value> {
    let start = text.find('{').context("no_json_object_start")?;
    let slice = &text[start..];
    let mut de = serde_json::Deserializer::from_str(slice);
    let v = serde_json::Value::deserialize(&mut de).context("json_parse_failed")?;
    Ok(v)
}

pub fn run_stage<T>(
    model: &dyn ChatModel,
    progress: &ConsoleProgress,
    trace: &TraceWriter,
    stage: Stage,
    ghazal_number: u32,
    system: &str,
    user: &str,
) -> anyhow::Result<StageOutput<T>>
where
    T: DeserializeOwned + Default,
{
    if system.trim().is_empty() || user.trim().is_empty() {
        return Err(anyhow!("empty_instruction for {}", stage.label()));
    }

    let _ = trace.write_stage_text(
        ghazal_number,
        stage.slug(),
        "prompt",
        &format!("SYSTEM:\n{system}\n\nUSER:\n{user}"),
    );

    let raw = model
        .complete(system, user)
        .with_context(|| format!("{} call failed", stage.label()))?;
    let _ = trace.write_stage_text(ghazal_number, stage.slug(), "output.raw", &raw);

    let cleaned = strip_code_fence(&raw);
    match parse_stage_response::<T>(&cleaned) {
        Ok((record, value)) => {
            progress.info(format!("{} done", stage.label()));
            Ok(StageOutput {
                record,
                value,
                parse_error: None,
            })
        }
        Err(err) => {
            let msg = format!("{err:#}");
            let _ = trace.write_stage_text(ghazal_number, stage.slug(), "error", &msg);
            progress.warn(format!(
                "{} response not parseable (ghazal #{ghazal_number}): {}",
                stage.label(),
                truncate_chars(&msg, 200)
            ));
            Ok(StageOutput {
                record: T::default(),
                value: json!({
                    "raw_response": cleaned,
                    "parse_error": msg,
                }),
                parse_error: Some(msg),
            })
        }
    }
}

fn parse_stage_response<T>(cleaned: &str) -> anyhow::Result<(T, serde_json::Value)>
where
    T: DeserializeOwned,
{
    let value = extract_json_object(cleaned)?;
    let record: T = serde_json::from_value(value.clone()).context("response_schema_mismatch")?;
    Ok((record, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::QaResponse;

    struct CannedModel(String);

    impl ChatModel for CannedModel {
        fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    struct FailingModel;

    impl ChatModel for FailingModel {
        fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
            Err(anyhow!("connection refused"))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn quiet() -> ConsoleProgress {
        ConsoleProgress::new(false)
    }

    #[test]
    fn fenced_and_unfenced_responses_parse_identically() {
        let body = r#"{"confidence":"high","overall_issues":["x"]}"#;
        let plain = CannedModel(body.to_string());
        let fenced = CannedModel(format!("```json\n{body}\n```"));

        let a: StageOutput<QaResponse> = run_stage(
            &plain,
            &quiet(),
            &TraceWriter::disabled(),
            Stage::Qa,
            1,
            "sys",
            "user",
        )
        .expect("run");
        let b: StageOutput<QaResponse> = run_stage(
            &fenced,
            &quiet(),
            &TraceWriter::disabled(),
            Stage::Qa,
            1,
            "sys",
            "user",
        )
        .expect("run");

        assert!(!a.is_degraded());
        assert!(!b.is_degraded());
        assert_eq!(a.value, b.value);
        assert_eq!(a.record.confidence, b.record.confidence);
    }

    #[test]
    fn surrounding_prose_is_tolerated() {
        let model = CannedModel("Here is the verdict:\n{\"confidence\":\"low\"} done".to_string());
        let out: StageOutput<QaResponse> = run_stage(
            &model,
            &quiet(),
            &TraceWriter::disabled(),
            Stage::Qa,
            1,
            "sys",
            "user",
        )
        .expect("run");
        assert!(!out.is_degraded());
        assert_eq!(out.record.confidence.as_str(), "low");
    }

    #[test]
    fn unparseable_response_degrades_instead_of_raising() {
        let model = CannedModel("I could not produce JSON, sorry.".to_string());
        let out: StageOutput<QaResponse> = run_stage(
            &model,
            &quiet(),
            &TraceWriter::disabled(),
            Stage::Qa,
            7,
            "sys",
            "user",
        )
        .expect("degraded, not an error");
        assert!(out.is_degraded());
        assert_eq!(
            out.value["raw_response"],
            "I could not produce JSON, sorry."
        );
        assert!(out.value["parse_error"].as_str().is_some());
        // Typed view falls back to defaults.
        assert_eq!(out.record.confidence.as_str(), "medium");
    }

    #[test]
    fn transport_failure_propagates() {
        let res: anyhow::Result<StageOutput<QaResponse>> = run_stage(
            &FailingModel,
            &quiet(),
            &TraceWriter::disabled(),
            Stage::Analyzer,
            1,
            "sys",
            "user",
        );
        assert!(res.is_err());
    }

    #[test]
    fn empty_instructions_are_rejected() {
        let model = CannedModel("{}".to_string());
        let res: anyhow::Result<StageOutput<QaResponse>> = run_stage(
            &model,
            &quiet(),
            &TraceWriter::disabled(),
            Stage::Stylist,
            1,
            " ",
            "user",
        );
        assert!(res.is_err());
    }
}
