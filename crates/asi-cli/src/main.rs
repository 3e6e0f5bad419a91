use clap::{Parser, Subcommand};

mod cmd;
mod reports;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a decklist offline against a CSV bigram corpus.
    Query(cmd::query::QueryArgs),
    /// Validate a CSV bigram corpus and report its archetype coverage.
    Ingest(cmd::ingest::IngestArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query(args) => cmd::query::run(args).await,
        Commands::Ingest(args) => cmd::ingest::run(args).await,
    }
}
