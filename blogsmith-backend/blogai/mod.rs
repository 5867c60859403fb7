pub mod blog_writer;
pub mod markdown;
pub mod post;
pub mod prompts;
pub mod title_generator;

pub use blog_writer::BlogWriterAgent;
pub use post::{PostError, PostSection, RecordPost, RecordPostStatus};
pub use title_generator::TitleGeneratorAgent;

use crate::llm::LlmError;

/// Failures raised by the authoring agents. The post handed to an agent is
/// never modified when one of these is returned.
#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error("failed to {op}: {source}")]
    Llm {
        op: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("failed to parse {what} JSON: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize post: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}

impl AgentError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn llm(op: &'static str) -> impl FnOnce(LlmError) -> Self {
        move |source| Self::Llm { op, source }
    }

    pub(crate) fn parse(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Parse { what, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_agent_error_display() {
        let err = AgentError::llm("generate summary")(LlmError::EmptyResponse);
        assert_eq!(
            err.to_string(),
            "failed to generate summary: LLM returned an empty response"
        );
        assert_eq!(
            AgentError::validation("invalid section index").to_string(),
            "invalid section index"
        );
    }

    #[test]
    fn test_agent_error_is_send_sync() {
        assert_send_sync::<AgentError>();
    }
}
