#![cfg(feature = "mcp-server")]

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use rmcp::{
    ErrorData as McpError,
    ServiceExt,
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam,
        CallToolResult,
        Implementation,
        ListToolsResult,
        PaginatedRequestParam,
        ProtocolVersion,
        ServerCapabilities,
        ServerInfo,
    },
    service::{QuitReason, RequestContext, RoleServer},
};
use tokio::io::{stdin, stdout};
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::config::DigestConfig;
use crate::feed::HttpFeedSource;
use crate::llm::OpenAiClient;
use crate::mcp::adapter::McpSink;
use crate::mcp::tools::{self, ToolContext};
use crate::telemetry::{self, install_sink, OutputSink, SinkGuard};
use crate::telemetry::ops::mcp::Phase as McpPhase;

#[derive(Clone)]
struct DigestMcpServer {
    ctx: ToolContext,
    info: ServerInfo,
    sink: Arc<McpSink>,
    semaphore: Arc<Semaphore>,
}

impl DigestMcpServer {
    fn new(ctx: ToolContext, sink: Arc<McpSink>, semaphore: Arc<Semaphore>) -> Self {
        let capabilities = ServerCapabilities::builder().enable_tools().enable_logging().build();
        let info = ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities,
            server_info: Implementation {
                name: "ai-news-digest".to_string(),
                title: Some("AI news digest MCP server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Call generate_ai_news_report to fetch today's AI news and receive a Markdown digest.".to_string(),
            ),
        };

        Self { ctx, info, sink, semaphore }
    }

    fn install_sink(&self) -> SinkGuard {
        let dyn_sink: Arc<dyn OutputSink> = self.sink.clone();
        install_sink(dyn_sink)
    }
}

impl ServerHandler for DigestMcpServer {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move { Ok(ListToolsResult::with_all_items(tools::tool_catalog())) }
    }

    fn get_info(&self) -> ServerInfo { self.info.clone() }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let ctx = self.ctx.clone();
        let sink = self.sink.clone();
        let ct = context.ct.clone();
        let peer = context.peer.clone();
        let permits = self.semaphore.clone();
        let span = telemetry::mcp().span_kv(&McpPhase::Call, [("tool", request.name.to_string())]);
        async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|err| McpError::internal_error(
                    "failed to acquire concurrency permit",
                    Some(json!({ "reason": err.to_string() })),
                ))?;
            sink.drain();
            let result = tools::handle_call(&ctx, &ct, request).await;
            let captured = sink.drain();
            for message in captured {
                let param = message.into_logging_notification();
                if let Err(err) = peer.notify_logging_message(param).await {
                    tracing::warn!(target: "digest::mcp", error = %err, "failed to send logging notification");
                }
            }
            drop(permit);
            result
        }
        .instrument(span)
    }
}

/// Serve the digest tool over stdio until the peer disconnects.
pub async fn run_server(cfg: DigestConfig, max_concurrency: usize) -> Result<()> {
    let log = telemetry::mcp();
    let llm = OpenAiClient::new(cfg.llm.clone()).context("build LLM client")?;
    let ctx = ToolContext {
        feeds: Arc::new(HttpFeedSource::new()?),
        llm: Arc::new(llm),
        config: Arc::new(cfg),
    };
    let sink = Arc::new(McpSink::new());
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let server = DigestMcpServer::new(ctx, sink, semaphore);

    let _telemetry_guard = server.install_sink();

    log.info_kv("Starting rmcp server over stdio", [("max_concurrency", max_concurrency.max(1).to_string())]);
    let transport = (stdin(), stdout());
    let running = server
        .serve(transport)
        .instrument(log.span(&McpPhase::Serve))
        .await
        .context("failed to initialize MCP server")?;

    match running.waiting().await {
        Ok(QuitReason::Closed) => {
            tracing::info!(target: "digest::mcp", "MCP transport closed by peer");
            Ok(())
        }
        Ok(QuitReason::Cancelled) => {
            tracing::info!(target: "digest::mcp", "MCP server cancelled by request");
            Ok(())
        }
        Ok(QuitReason::JoinError(err)) => {
            tracing::error!(target: "digest::mcp", error = %err, "MCP server task aborted");
            Err(err.into())
        }
        Err(err) => {
            tracing::error!(target: "digest::mcp", error = %err, "MCP server join failure");
            Err(err.into())
        }
    }
}
