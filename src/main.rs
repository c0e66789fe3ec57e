//! kepctl - Main Entry Point
//!
//! Command-line front end for the `kepctl` library: `query` prints a KEP
//! report, `serve` runs the MCP server on stdio.

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use kepctl::{Client, CommonArgs, KepServerHandler, OutputFormat, SearchCriteria, Settings};
use mcp_attr::server::serve_stdio;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// kepctl - query Kubernetes enhancement proposals
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: <config dir>/kepctl/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search local and in-flight KEPs
    Query(QueryArgs),
    /// Serve KEP queries over MCP on stdio
    Serve(RepoArgs),
}

#[derive(Args, Debug)]
struct RepoArgs {
    /// Path to a local checkout of the enhancements repository
    #[arg(long, value_name = "DIR")]
    repo_path: Option<PathBuf>,

    /// File containing a GitHub API token
    #[arg(long, value_name = "FILE")]
    gh_token_path: Option<PathBuf>,
}

impl RepoArgs {
    fn common(&self) -> CommonArgs {
        CommonArgs {
            repo_path: self.repo_path.clone(),
            token_path: self.gh_token_path.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// SIG(s) to search, with or without the "sig-" prefix
    #[arg(long, value_delimiter = ',', required = true)]
    sig: Vec<String>,

    /// Status(es) to keep (e.g. implementable)
    #[arg(long, value_delimiter = ',')]
    status: Vec<String>,

    /// Stage(s) to keep (e.g. alpha, beta, stable)
    #[arg(long, value_delimiter = ',')]
    stage: Vec<String>,

    /// Also search open pull requests on GitHub
    #[arg(long)]
    include_prs: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    #[command(flatten)]
    repo: RepoArgs,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Check if no arguments were provided (except the program name)
    if std::env::args().len() == 1 {
        // No arguments provided, show help and exit with error code
        let mut cmd = Cli::command();
        cmd.print_help().ok();
        println!(); // Add a newline after help
        std::process::exit(2);
    }

    let cli = Cli::parse();
    init_tracing();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Query(args) => {
            let criteria = SearchCriteria::new(args.sig, args.status, args.stage, args.include_prs);
            let client = Client::new(settings, args.output)?;
            client.query(
                &criteria,
                &args.repo.common(),
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            )?;
        }
        Command::Serve(args) => {
            let handler = KepServerHandler::new(settings, args.common());
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve_stdio(handler))?;
        }
    }
    Ok(())
}
