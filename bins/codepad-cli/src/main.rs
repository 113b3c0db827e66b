mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codepad-cli")]
#[command(about = "Codepad CLI - Run code on the execution backend and manage languages", long_about = None)]
struct Cli {
    /// Language table file
    #[arg(long, global = true, env = "LANGUAGES_CONFIG", default_value = "config/languages.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a source file and print the result
    Run {
        /// Language (c, cpp, java, python); inferred from the extension if omitted
        #[arg(short, long)]
        language: Option<String>,

        /// Source file
        #[arg(short, long)]
        file: PathBuf,

        /// File whose contents are fed to the program's stdin
        #[arg(short, long)]
        stdin_file: Option<PathBuf>,

        /// Poll attempts before giving up (defaults to POLL_MAX_ATTEMPTS)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Milliseconds between polls (defaults to POLL_INTERVAL_MS)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// List configured languages and backend ids
    Languages,

    /// Add or update a language entry
    SetLang {
        /// Language name (c, cpp, java, python)
        #[arg(short, long)]
        name: String,

        /// Backend language id (e.g. 71 for Python 3.8 on Judge0 CE)
        #[arg(short, long)]
        backend_id: u32,

        /// Version label, informational only
        #[arg(short, long)]
        version: Option<String>,
    },

    /// Write the default language table
    Init {
        /// Overwrite an existing file
        #[arg(long, default_value = "false")]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            language,
            file,
            stdin_file,
            max_attempts,
            interval_ms,
        } => {
            commands::run_program(
                language.as_deref(),
                &file,
                stdin_file.as_deref(),
                &cli.config,
                max_attempts,
                interval_ms,
            )
            .await?;
        }
        Commands::Languages => {
            commands::list_languages(&cli.config)?;
        }
        Commands::SetLang {
            name,
            backend_id,
            version,
        } => {
            commands::set_language(&cli.config, &name, backend_id, version.as_deref())?;
        }
        Commands::Init { force } => {
            commands::init_config(&cli.config, force)?;
        }
    }

    Ok(())
}
