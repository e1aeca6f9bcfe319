mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fsnav_core::CatalogKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fsnav-cli")]
#[command(about = "Storefront navigation and link resolution from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up the storefront handle of a product, collection or page
    Handle {
        /// Numeric commerce id
        #[arg(long)]
        id: String,
        /// Resource kind: product, category or content
        #[arg(long = "type")]
        kind: CatalogKind,
    },
    /// Resolve a CMS link (JSON file, `-` for stdin) to a storefront route
    Resolve {
        file: PathBuf,
        /// Locale in either form (`de_DE` or `de-de`)
        #[arg(long)]
        locale: Option<String>,
    },
    /// Print the navigation tree of a locale
    Navigation {
        #[arg(long)]
        locale: Option<String>,
    },
    /// Decide which CMS page renders a storefront path
    Route {
        path: String,
        /// Locale for paths without a locale prefix
        #[arg(long)]
        locale: Option<String>,
    },
    /// Print both encodings of a locale tag
    Locale { tag: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("fsnav-cli: pass --help to list commands");
        return Ok(());
    };

    // Only the locale codec works without upstream configuration.
    let config = fsnav_core::load_app_config;
    match command {
        Commands::Handle { id, kind } => commands::run_handle(&config()?, &id, kind).await,
        Commands::Resolve { file, locale } => {
            commands::run_resolve(&config()?, &file, locale.as_deref()).await
        }
        Commands::Navigation { locale } => {
            commands::run_navigation(&config()?, locale.as_deref()).await
        }
        Commands::Route { path, locale } => {
            commands::run_route(&config()?, &path, locale.as_deref()).await
        }
        Commands::Locale { tag } => commands::print_json(&commands::parse_locale(&tag)),
    }
}
