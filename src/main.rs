use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gotham_oracle::{Chatbot, Config, QueryResponse, Result, Store, import};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gotham_oracle", about = "Batman universe question answering")]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database path (overrides the config file)
    #[arg(long, global = true, env = "GOTHAM_DB")]
    db: Option<PathBuf>,
    /// Fixed seed for response wording
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one question
    Ask {
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
        /// The question, e.g. "Who is Batman?"
        words: Vec<String>,
    },
    /// Interactive session on stdin
    Chat,
    /// Look up an entity by its exact stored name
    Lookup { name: Vec<String> },
    /// Print row counts per table
    Stats,
    /// Load JSON seed files (a file or a directory) into the database
    Import { path: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gotham_oracle=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database = db;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    match cli.command {
        Some(Command::Ask { json, words }) => {
            let bot = Chatbot::open(config)?;
            print_response(&bot.process_query(&words.join(" ")), json);
            Ok(())
        }
        Some(Command::Lookup { name }) => {
            let bot = Chatbot::open(config)?;
            print_response(&bot.lookup_direct(&name.join(" ")), false);
            Ok(())
        }
        Some(Command::Stats) => run_stats(&config),
        Some(Command::Import { path }) => run_import(&config, &path),
        Some(Command::Chat) | None => run_chat(config),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  OUTPUT
// ═══════════════════════════════════════════════════════════════════════

fn print_response(response: &QueryResponse, json: bool) {
    if json {
        match serde_json::to_string_pretty(response) {
            Ok(text) => println!("{text}"),
            Err(e) => error!(error = %e, "cannot serialize response"),
        }
        return;
    }
    println!("{}", response.answer);
    eprintln!(
        "  [{} | confidence {:.2}]",
        response.query_type, response.confidence
    );
}

// ═══════════════════════════════════════════════════════════════════════
//  CHAT MODE: one question per line; a bare number picks a suggestion
// ═══════════════════════════════════════════════════════════════════════

fn run_chat(config: Config) -> Result<()> {
    let bot = Chatbot::open(config)?;
    println!("Ask me about the Batman universe. Type 'quit' to leave.");

    let stdin = io::stdin();
    let mut pending: Option<QueryResponse> = None;
    loop {
        print!("> ");
        // A failed flush only delays the prompt.
        let _ = io::stdout().flush();

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).map_err(|source| gotham_oracle::Error::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
        let line = line.trim();
        if read == 0 || matches!(line, "quit" | "exit") {
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }

        let response = match &pending {
            Some(previous) if line.parse::<usize>().is_ok() => bot.select_option(previous, line),
            _ => bot.process_query(line),
        };
        print_response(&response, false);
        if response.has_suggestions() {
            pending = Some(response);
        } else if response.query_type != gotham_oracle::QueryType::ClarificationNeeded {
            pending = None;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  DATABASE MODES
// ═══════════════════════════════════════════════════════════════════════

fn run_stats(config: &Config) -> Result<()> {
    let stats = Store::open(&config.database)?.stats()?;
    println!("characters     {}", stats.characters);
    println!("vehicles       {}", stats.vehicles);
    println!("locations      {}", stats.locations);
    println!("storylines     {}", stats.storylines);
    println!("organizations  {}", stats.organizations);
    println!("aliases        {}", stats.aliases);
    println!("relationships  {}", stats.relationships);
    println!("total entities {}", stats.total_entities());
    Ok(())
}

fn run_import(config: &Config, path: &std::path::Path) -> Result<()> {
    let store = Store::create(&config.database)?;
    let summary = import::import_path(&store, path)?;
    eprintln!(
        "Imported {} entities and {} links from {} file(s) into {} ({} skipped)",
        summary.entities,
        summary.links,
        summary.files,
        config.database.display(),
        summary.skipped
    );
    Ok(())
}
