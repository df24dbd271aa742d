pub mod anthropic;

pub use anthropic::{AnthropicClient, AnthropicConfig};

/// One completion round against a text-generation backend. The sole I/O of
/// the stage invoker sits behind this seam.
pub trait ChatModel {
    fn complete(&self, system: &str, user: &str) -> anyhow::Result<String>;

    /// Model identifier stamped into result metadata.
    fn model_name(&self) -> &str;
}
