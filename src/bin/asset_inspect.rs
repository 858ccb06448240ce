use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use cascade_batch::cms::{CmsClient, CmsService};
use cascade_batch::config;
use cascade_batch::model::{AssetReference, Decoded};

#[derive(Parser, Debug)]
#[command(about = "Print an asset as the batch workflows will see it")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Asset type, e.g. `file` or `page`
    #[arg(long)]
    asset_type: String,

    /// Site name, required with --path
    #[arg(long)]
    site: Option<String>,

    /// Asset path within the site
    #[arg(long, conflicts_with = "id")]
    path: Option<String>,

    /// Asset id
    #[arg(long)]
    id: Option<String>,

    /// Also list the assets that subscribe to this one
    #[arg(long)]
    subscribers: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    let client = CmsClient::from_config(&cfg)?;

    let reference = match (&args.id, &args.path, &args.site) {
        (Some(id), _, _) => AssetReference::by_id(&args.asset_type, id),
        (None, Some(path), Some(site)) => AssetReference::by_path(&args.asset_type, site, path),
        (None, Some(_), None) => bail!("--site is required with --path"),
        (None, None, _) => bail!("either --path or --id is required"),
    };

    match client.read(&reference).await? {
        Decoded::Recognized(record) => {
            println!("Asset: {}", reference);
            println!("  shouldBePublished: {}", record.is_eligible());
            println!(
                "  displayName: {}",
                record.display_name().unwrap_or("(none)")
            );
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Decoded::Unrecognized(raw) => {
            println!("Unrecognized response for {}:", reference);
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
    }

    if args.subscribers {
        match client.list_subscribers(&reference).await? {
            Decoded::Recognized(listing) => {
                if let Some(message) = listing.outcome.failure_message() {
                    bail!("listSubscribers failed: {}", message);
                }
                println!("Subscribers ({}):", listing.subscribers.len());
                for edge in listing.subscribers {
                    println!("  {} [{}]", edge.path, edge.asset_type);
                }
            }
            Decoded::Unrecognized(raw) => {
                println!("Unrecognized subscriber listing:");
                println!("{}", serde_json::to_string_pretty(&raw)?);
            }
        }
    }
    Ok(())
}
