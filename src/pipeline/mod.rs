mod config;
pub mod invoker;
pub mod prompts;
mod trace;
mod translator;

pub use config::{PipelineConfig, PIPELINE_VERSION, TRANSLATION_METHOD};
pub use invoker::{extract_json_object, run_stage, Stage, StageOutput};
pub use trace::TraceWriter;
pub use translator::{RunMetadata, TranslationPipeline, TranslationResult};
