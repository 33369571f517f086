#![cfg(feature = "mcp-server")]

use std::sync::Arc;

use rmcp::model::{CallToolRequestParam, CallToolResult, Content, Tool, ToolAnnotations};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::config::DigestConfig;
use crate::feed::FeedSource;
use crate::llm::LlmClient;
use crate::mcp::types::GenerateReportParams;
use crate::pipeline;
use crate::telemetry;

pub const GENERATE_REPORT_TOOL: &str = "generate_ai_news_report";

/// Everything a tool call needs, shared read-only across calls.
#[derive(Clone)]
pub struct ToolContext {
    pub feeds: Arc<dyn FeedSource>,
    pub llm: Arc<dyn LlmClient>,
    pub config: Arc<DigestConfig>,
}

pub fn tool_catalog() -> Vec<Tool> {
    vec![generate_report_tool()]
}

fn generate_report_tool() -> Tool {
    Tool::new(
        GENERATE_REPORT_TOOL,
        "Fetch the latest AI news from the configured RSS feeds, filter and summarize it with the LLM, and return a Markdown digest",
        rmcp::object!({"type": "object"}),
    )
    .with_input_schema::<GenerateReportParams>()
    .annotate(
        ToolAnnotations::new()
            .read_only(true)
            .idempotent(false)
            .open_world(true),
    )
}

pub async fn handle_call(
    ctx: &ToolContext,
    ct: &CancellationToken,
    request: CallToolRequestParam,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let CallToolRequestParam { name, arguments } = request;
    match &*name {
        GENERATE_REPORT_TOOL => generate_report(ctx, ct, arguments).await,
        _ => Err(rmcp::ErrorData::invalid_params(
            format!("unknown tool: {}", name),
            None,
        )),
    }
}

async fn generate_report(
    ctx: &ToolContext,
    ct: &CancellationToken,
    arguments: Option<rmcp::model::JsonObject>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let args_map = arguments.unwrap_or_else(Map::new);
    let _params: GenerateReportParams = serde_json::from_value(Value::Object(args_map)).map_err(|err| {
        rmcp::ErrorData::invalid_params(
            format!("invalid {} parameters: {}", GENERATE_REPORT_TOOL, err),
            None,
        )
    })?;

    let outcome = tokio::select! {
        _ = ct.cancelled() => {
            return Err(rmcp::ErrorData::internal_error(format!("{GENERATE_REPORT_TOOL} cancelled"), None));
        }
        res = pipeline::run_digest(ctx.feeds.as_ref(), ctx.llm.as_ref(), &ctx.config) => res,
    };

    // pipeline failures go back as readable text, not protocol errors
    match outcome {
        Ok(outcome) => Ok(CallToolResult::success(vec![Content::text(outcome.report.body)])),
        Err(err) => {
            telemetry::mcp().warn(format!("{GENERATE_REPORT_TOOL} failed: {err}"));
            Ok(CallToolResult::error(vec![Content::text(format!("❌ {err}"))]))
        }
    }
}

/// Concatenated text blocks of a tool result.
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text())
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedSpec;
    use crate::feed::stub::StaticFeedSource;
    use crate::llm::MockClient;

    fn context(api_key: Option<&str>, llm: Arc<MockClient>) -> ToolContext {
        let mut cfg = DigestConfig::default();
        cfg.feeds = vec![FeedSpec::new("HN", "https://hn.example/rss")];
        cfg.llm.api_key = api_key.map(str::to_string);
        ToolContext {
            feeds: Arc::new(StaticFeedSource::new().with_items("https://hn.example/rss", 4)),
            llm,
            config: Arc::new(cfg),
        }
    }

    fn call(name: &'static str) -> CallToolRequestParam {
        CallToolRequestParam { name: name.into(), arguments: None }
    }

    #[test]
    fn catalog_exposes_single_tool() {
        let tools = tool_catalog();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, GENERATE_REPORT_TOOL);
    }

    #[tokio::test]
    async fn returns_report_body_as_text() {
        let llm = Arc::new(MockClient::new());
        llm.push_text("### Headline\n- **source**: HN");
        let ctx = context(Some("sk-test"), llm.clone());

        let result = handle_call(&ctx, &CancellationToken::new(), call(GENERATE_REPORT_TOOL)).await.unwrap();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "### Headline\n- **source**: HN");
        assert_eq!(llm.calls().len(), 1);
    }

    #[tokio::test]
    async fn pipeline_failure_is_an_error_result_with_message() {
        let llm = Arc::new(MockClient::new());
        let ctx = context(None, llm.clone());

        let result = handle_call(&ctx, &CancellationToken::new(), call(GENERATE_REPORT_TOOL)).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("OPENAI_API_KEY"));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let ctx = context(Some("sk-test"), Arc::new(MockClient::new()));
        let err = handle_call(&ctx, &CancellationToken::new(), call("feed.add")).await.unwrap_err();
        assert!(err.message.contains("unknown tool"));
    }

    #[tokio::test]
    async fn cancelled_call_does_not_run() {
        let llm = Arc::new(MockClient::new());
        let ctx = context(Some("sk-test"), llm.clone());
        let ct = CancellationToken::new();
        ct.cancel();

        let err = handle_call(&ctx, &ct, call(GENERATE_REPORT_TOOL)).await.unwrap_err();
        assert!(err.message.contains("cancelled"));
    }
}
