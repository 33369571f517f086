#![cfg(feature = "mcp-server")]

pub mod adapter;
pub mod client;
pub mod server;
pub mod tools;
pub mod types;

pub use cli::{run_serve, ServeCmd};
pub use client::{run_client, ClientCmd};

mod cli {
    use anyhow::Result;
    use clap::Args;

    use crate::config::{DigestArgs, DigestConfig};

    #[derive(Debug, Args, Default)]
    #[command(about = "Expose the digest as an MCP tool over stdio")]
    pub struct ServeCmd {
        #[command(flatten)]
        pub digest: DigestArgs,
        /// Maximum concurrent tool calls
        #[arg(long, default_value_t = 1)]
        pub max_concurrency: usize,
    }

    pub async fn run_serve(cmd: ServeCmd) -> Result<()> {
        let mut cfg = DigestConfig::from_env()?;
        cfg.apply_args(&cmd.digest)?;
        super::server::run_server(cfg, cmd.max_concurrency).await
    }
}
