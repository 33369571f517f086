pub mod openai;

pub use openai::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole, LlmClient, MockClient,
    OpenAiClient, OpenAiClientConfig, OpenAiError,
};
