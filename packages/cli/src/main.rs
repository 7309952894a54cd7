#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for parcel feasibility analysis.
//!
//! ```text
//! plot_twist_cli analyze --record parcel.json [--lat L --lon L] [--address "..."] [--config cfg.toml] [--offline]
//! plot_twist_cli districts
//! plot_twist_cli resolve --lat L --lon L | --address "..."
//! ```
//!
//! Output is JSON on stdout; logs go to stderr and follow `RUST_LOG`.

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args, Parser, Subcommand};
use plot_twist_analysis::{AnalysisConfig, analyze};
use plot_twist_property_models::{Coordinates, PropertyError, PropertyRecord};
use plot_twist_zoning::registry::all_districts;
use plot_twist_zoning::{LocationQuery, ZoningResolver};

#[derive(Parser)]
#[command(
    name = "plot_twist_cli",
    about = "Score a parcel's development feasibility against Boston zoning"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a property record and print the assessment as JSON
    Analyze {
        /// Property record JSON file as written by the assessor scraper
        #[arg(long)]
        record: PathBuf,
        #[command(flatten)]
        location: LocationArgs,
        /// Configuration override file (defaults to $PLOT_TWIST_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip the city's zoning service
        #[arg(long)]
        offline: bool,
    },
    /// List the zoning district table
    Districts,
    /// Resolve the zoning district for a location
    #[command(group(
        ArgGroup::new("location")
            .args(["lat", "address"])
            .required(true)
            .multiple(true)
    ))]
    Resolve {
        #[command(flatten)]
        location: LocationArgs,
        /// Configuration override file (defaults to $PLOT_TWIST_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip the city's zoning service
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Args)]
struct LocationArgs {
    /// Latitude in decimal degrees
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Longitude in decimal degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Street address
    #[arg(long)]
    address: Option<String>,
}

impl LocationArgs {
    fn coordinates(&self) -> Result<Option<Coordinates>, PropertyError> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).map(Some),
            _ => Ok(None),
        }
    }
}

fn load_config(
    path: Option<&Path>,
    offline: bool,
) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = AnalysisConfig::load(path)?;
    if offline {
        config.zoning.authoritative_enabled = false;
    }
    log::debug!("Using configuration: {config:?}");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            record,
            location,
            config,
            offline,
        } => {
            let config = load_config(config.as_deref(), offline)?;
            let contents = std::fs::read_to_string(&record)?;
            let mut record: PropertyRecord = serde_json::from_str(&contents)?;

            if let Some(coordinates) = location.coordinates()? {
                record.coordinates = Some(coordinates);
            }
            if let Some(address) = location.address {
                record.address = Some(address);
            }

            let resolver = ZoningResolver::from_config(&config.zoning)?;
            let assessment = analyze(&record, &resolver, &config).await?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
        Commands::Districts => {
            println!(
                "{:<10} {:<8} {:<6} {:<8} NAME",
                "CODE", "ARTICLE", "FAR", "HEIGHT"
            );
            println!("{}", "-".repeat(72));

            for district in all_districts() {
                let article = district
                    .article
                    .map_or_else(|| "-".to_string(), |a| a.to_string());
                let height = format!("{:.0} ft", district.max_height_ft);
                println!(
                    "{:<10} {:<8} {:<6.2} {:<8} {}",
                    district.code,
                    article,
                    district.max_far,
                    height,
                    district.name
                );
            }

            println!("\n{} district(s)", all_districts().len());
        }
        Commands::Resolve {
            location,
            config,
            offline,
        } => {
            let query = LocationQuery {
                coordinates: location.coordinates()?,
                address: location.address,
            };
            let config = load_config(config.as_deref(), offline)?;
            let resolver = ZoningResolver::from_config(&config.zoning)?;
            let resolved = resolver.resolve(&query).await;
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
    }

    Ok(())
}
