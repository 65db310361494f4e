//! Folio CLI - command-line client for the Folio ebook storefront.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use folio_config::{init_logging, Config, Paths};
use tracing::debug;

/// Folio CLI - browse, buy and read ebooks from the terminal.
#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio CLI for the ebook storefront")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// REST API base URL; defaults to the config file or FOLIO_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login,

    /// Create an account
    Register,

    /// Logout and clear stored credentials and download tokens
    Logout,

    /// Check authentication status
    Status,

    /// Browse the catalog
    Books {
        #[command(subcommand)]
        command: BookCommands,
    },

    /// List catalog tags
    Tags,

    /// Manage orders
    Orders {
        #[command(subcommand)]
        command: OrderCommands,
    },

    /// Get or invalidate download tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Reading progress
    Progress {
        #[command(subcommand)]
        command: ProgressCommands,
    },

    /// Check where navigating to a path would land
    Open {
        /// Path with optional query, e.g. /checkout/<id>
        path: String,
    },
}

#[derive(Subcommand)]
enum BookCommands {
    /// List ebooks
    List {
        /// Search text
        #[arg(short, long)]
        search: Option<String>,
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Page number
        #[arg(short, long)]
        page: Option<u32>,
    },
    /// Show ebook details
    Show {
        /// Ebook ID
        id: String,
    },
    /// Publish an ebook (admin)
    Publish {
        /// Ebook ID
        id: String,
    },
    /// Delete an ebook (admin)
    Delete {
        /// Ebook ID
        id: String,
    },
}

#[derive(Subcommand)]
enum OrderCommands {
    /// List your orders
    List {
        /// List every order in the store (admin)
        #[arg(long)]
        all: bool,
    },
    /// Show order details
    Show {
        /// Order ID
        id: String,
    },
    /// Re-check payment status
    Refresh {
        /// Order ID
        id: String,
    },
    /// Start checkout for an ebook
    Create {
        /// Ebook ID
        ebook_id: String,
        /// Payment provider
        #[arg(short, long)]
        provider: String,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Print a usable download token
    Get {
        /// Ebook ID
        ebook_id: String,
        /// Always request a new token (the result is not cached)
        #[arg(long)]
        force: bool,
    },
    /// Drop the cached token
    Invalidate {
        /// Ebook ID
        ebook_id: String,
    },
}

#[derive(Subcommand)]
enum ProgressCommands {
    /// Show the saved page
    Get {
        /// Ebook ID
        ebook_id: String,
    },
    /// Save the current page
    Set {
        /// Ebook ID
        ebook_id: String,
        /// Page number
        page: u32,
    },
}

async fn run(
    app: &commands::App,
    command: Commands,
    format: &output::OutputFormat,
) -> anyhow::Result<()> {
    match command {
        Commands::Login => commands::login(app, format).await,
        Commands::Register => commands::register(app, format).await,
        Commands::Logout => commands::logout(app, format),
        Commands::Status => commands::status(app, format).await,
        Commands::Books { command } => match command {
            BookCommands::List { search, tag, page } => {
                commands::books_list(app, search, tag, page, format).await
            }
            BookCommands::Show { id } => commands::books_show(app, &id, format).await,
            BookCommands::Publish { id } => commands::books_publish(app, &id, format).await,
            BookCommands::Delete { id } => commands::books_delete(app, &id, format).await,
        },
        Commands::Tags => commands::tags_list(app, format).await,
        Commands::Orders { command } => match command {
            OrderCommands::List { all } => commands::orders_list(app, all, format).await,
            OrderCommands::Show { id } => commands::orders_show(app, &id, format).await,
            OrderCommands::Refresh { id } => commands::orders_refresh(app, &id, format).await,
            OrderCommands::Create { ebook_id, provider } => {
                commands::orders_create(app, &ebook_id, &provider, format).await
            }
        },
        Commands::Token { command } => match command {
            TokenCommands::Get { ebook_id, force } => {
                commands::token_ensure(app, &ebook_id, force, format).await
            }
            TokenCommands::Invalidate { ebook_id } => {
                commands::token_invalidate(app, &ebook_id, format)
            }
        },
        Commands::Progress { command } => match command {
            ProgressCommands::Get { ebook_id } => {
                commands::progress_get(app, &ebook_id, format).await
            }
            ProgressCommands::Set { ebook_id, page } => {
                commands::progress_set(app, &ebook_id, page, format).await
            }
        },
        Commands::Open { path } => commands::open(app, &path, format).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let paths = match Paths::new() {
        Ok(paths) => paths,
        Err(e) => {
            output::print_error(&e.to_string(), &cli.format);
            std::process::exit(1);
        }
    };

    let mut config = Config::load(&paths).unwrap_or_else(|e| {
        output::print_error(&format!("Ignoring unreadable config: {}", e), &cli.format);
        Config::default()
    });
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(&config.log_level, Some(&paths));
    debug!(api_url = %config.api_url, "Starting folio");

    let result = match commands::App::open(&config, &paths) {
        Ok(app) => run(&app, cli.command, &cli.format).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e), &cli.format);
        std::process::exit(1);
    }
}
