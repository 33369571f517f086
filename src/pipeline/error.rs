use crate::llm::OpenAiError;

/// Terminal states of a digest run. Each message names the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("configuration error: OPENAI_API_KEY is not set (or still the placeholder); set it in the environment or .env")]
    MissingApiKey,
    #[error("configuration error: could not build the LLM client: {0}")]
    Client(#[source] OpenAiError),
    #[error("fetch stage: no news entries could be fetched from any of the {sources} configured feed(s); no report generated")]
    NoEntries { sources: usize },
    #[error("summarize stage: none of the {chunks} chunk request(s) produced usable output ({failed} failed); could not produce a report")]
    NoUsableOutput { chunks: usize, failed: usize },
}
