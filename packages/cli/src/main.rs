mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    check, init, paginate, renumber, CheckArgs, InitArgs, PaginateArgs, RenumberArgs,
};

/// Scriptory CLI - paginate and check screenplay documents
#[derive(Parser, Debug)]
#[command(name = "scriptory")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "debug", "scriptory_layout=trace")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Scriptory project
    Init(InitArgs),

    /// Lay out a document into pages
    Paginate(PaginateArgs),

    /// Report numbering, layout and template problems
    Check(CheckArgs),

    /// Renumber scenes and other numbered blocks
    Renumber(RenumberArgs),
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Paginate(args) => paginate(args, &cwd).await,
        Command::Check(args) => check(args, &cwd),
        Command::Renumber(args) => renumber(args, &cwd),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
