//! llmdesk CLI: the main entry point.
//!
//! Commands:
//! - `onboard`        Write a default config with a fresh cookie key
//! - `chat`           Chat on one page, interactively or with a single message
//! - `gateway`        Start the HTTP front-end
//! - `hash-password`  Print the stored hash for a credential
//! - `pages`          Show the configured pages

use clap::{Parser, Subcommand};
use llmdesk_pipeline::PageKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "llmdesk",
    about = "llmdesk: Gemini chat, search-augmented answers, and webpage Q&A",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Chat on one of the pages
    Chat {
        /// Page to chat on: gemini, search, or url
        #[arg(short, long, default_value = "gemini")]
        page: PageKind,

        /// Model from the page's allow-list
        #[arg(long)]
        model: Option<String>,

        /// Webpage to answer from (url page)
        #[arg(long)]
        url: Option<String>,

        /// Number of search results, 1 to 10 (search page)
        #[arg(long)]
        max_results: Option<usize>,

        /// Login name; prompted for when omitted
        #[arg(short, long, env = "LLMDESK_USERNAME")]
        username: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the password hash to store under [auth.credentials.<username>]
    HashPassword { username: String, password: String },

    /// List the chat pages and their models
    Pages,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            page,
            model,
            url,
            max_results,
            username,
            message,
        } => {
            let options = commands::chat::ChatOptions {
                page,
                model,
                url,
                max_results,
                username,
                message,
            };
            commands::chat::run(options).await?
        }
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::HashPassword { username, password } => {
            commands::hash_password::run(&username, &password)?
        }
        Commands::Pages => commands::pages::run()?,
    }

    Ok(())
}
