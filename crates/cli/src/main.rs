use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{analyze::AnalyzeArgs, rules::RulesArgs};

#[derive(Parser)]
#[command(name = "kensa")]
#[command(about = "Repository analyzer: static rules plus LLM review")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a repository and print the issue report
    Analyze(AnalyzeArgs),

    /// List the registered static rules
    Rules(RulesArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::analyze::execute(args))
        }
        Commands::Rules(args) => commands::rules::execute(args),
    }
}
