#![cfg(feature = "mcp-server")]

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

/// `generate_ai_news_report` takes no arguments; unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportParams {}
