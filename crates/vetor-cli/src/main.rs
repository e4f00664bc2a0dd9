use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vetor-cli")]
#[command(about = "Vetor offer resolution command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve offers and print them as JSON.
    Offers {
        /// Comma-separated item ids; defaults to the whole catalog.
        #[arg(long)]
        ids: Option<String>,
    },
    /// Validate the affiliate catalog file and list its entries.
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = vetor_core::load_app_config()?;
    let catalog = vetor_core::load_catalog(&config.catalog_path)?;

    match cli.command {
        Some(Commands::Offers { ids }) => {
            let client = vetor_meli::MeliClient::new(&config)?;
            let service =
                vetor_meli::OfferService::new(client, catalog, config.meli_affiliate_id.clone());

            let offers = match ids {
                Some(raw) => {
                    let ids: Vec<String> = raw
                        .split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(ToString::to_string)
                        .collect();
                    anyhow::ensure!(!ids.is_empty(), "--ids contains no usable item ids");
                    service.resolve(&ids).await
                }
                None => service.resolve_catalog().await,
            };
            tracing::info!(resolved = offers.len(), "offers resolved");
            println!("{}", serde_json::to_string_pretty(&offers)?);
        }
        Some(Commands::Catalog) | None => {
            println!(
                "catalog {} valid: {} entries",
                config.catalog_path.display(),
                catalog.len()
            );
            for entry in catalog.entries() {
                println!(
                    "  {}  {}  {}",
                    entry.item_id,
                    entry.title.as_deref().unwrap_or("-"),
                    entry.affiliate_link
                );
            }
        }
    }

    Ok(())
}
