mod cli;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "referlut-market",
    version,
    about = "Referlut Marketplace — offers, enrichment, chat"
)]
struct App {
    /// Log to stderr at debug level
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a page of referral offers from the listing source
    Page {
        /// Zero-based page index
        page: usize,
        /// Case-insensitive brand substring filter
        #[arg(long)]
        brand: Option<String>,
        /// Block until enrichment finishes for the whole page
        #[arg(long)]
        wait: bool,
    },
    /// List local catalog offers of one type (loyalty, charity)
    Offers {
        /// Offer type: referral, loyalty or charity
        kind: String,
        #[arg(long)]
        brand: Option<String>,
    },
    /// List all known brands
    Brands,
    /// Show store and catalog status
    Status,
    /// Message an offer owner and read the simulated reply
    Chat {
        offer_id: String,
        message: String,
    },
    /// List stored conversations
    Conversations,
    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display the resolved configuration
    Show,
    /// Print the config file path
    Path,
}

fn main() -> anyhow::Result<()> {
    let app = App::parse();
    referlut_market::tracing_init::init_stderr_tracing(app.verbose);

    match app.command {
        Commands::Page { page, brand, wait } => cli::market::run_page(page, brand.as_deref(), wait),
        Commands::Offers { kind, brand } => cli::market::run_offers(&kind, brand.as_deref()),
        Commands::Brands => cli::market::run_brands(),
        Commands::Status => cli::market::run_status(),
        Commands::Chat { offer_id, message } => cli::chat::run_chat(&offer_id, &message),
        Commands::Conversations => cli::chat::run_conversations(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Path => cli::run_config_path(),
        },
    }
}
