use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod config;
mod feed;
mod llm;
mod output;
mod pipeline;
mod report;
mod run;
mod telemetry;
#[cfg(feature = "mcp-server")]
mod mcp;

#[derive(Parser)]
#[command(name = "digest", about = "Daily AI news digest: RSS feeds in, Markdown report out")]
struct Cli {
    /// Emit JSON envelopes to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run(run::RunCmd),
    #[cfg(feature = "mcp-server")]
    Serve(mcp::ServeCmd),
    #[cfg(feature = "mcp-server")]
    Client(mcp::ClientCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // logs always go to stderr; RUST_LOG and DIGEST_LOG_FORMAT apply
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Run(args) => run::run(args).await?,
        #[cfg(feature = "mcp-server")]
        Commands::Serve(args) => mcp::run_serve(args).await?,
        #[cfg(feature = "mcp-server")]
        Commands::Client(args) => mcp::run_client(args, config::ReportConfig::from_env()).await?,
    }

    Ok(())
}
