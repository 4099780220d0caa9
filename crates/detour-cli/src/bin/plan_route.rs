//! Plan one trip and print a summary.
//!
//! Locations are preset names (see --list-presets) or "lat, lng" text.

use anyhow::{Context, Result};
use clap::Parser;
use detour_cli::{load_hazards, render_report};
use detour_core::{presets, resolve_location, PlannerRules, RoutePlanRequest, RoutePlanner};
use detour_providers::{
    AnyProvider, ProviderKind, ProviderSettings, DEFAULT_OSRM_URL, DEFAULT_TOMTOM_URL,
};
use std::time::Duration;

/// Plan a route, optionally detouring around hazard zones
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Start: preset name or "lat, lng"
    #[arg(long, default_value = "Mumbai Airport (T2)")]
    source: String,

    /// End: preset name or "lat, lng"
    #[arg(long, default_value = "BKC (Business District)")]
    destination: String,

    /// Avoid hazard zones
    #[arg(long)]
    avoid: bool,

    /// Routing engine: osrm, tomtom or straight
    #[arg(long, default_value = "osrm", value_parser = parse_provider)]
    provider: ProviderKind,

    /// OSRM base URL
    #[arg(long, default_value = DEFAULT_OSRM_URL)]
    osrm_url: String,

    /// TomTom base URL
    #[arg(long, default_value = DEFAULT_TOMTOM_URL)]
    tomtom_url: String,

    /// TomTom API key
    #[arg(long, env = "TOMTOM_API_KEY", hide_env_values = true)]
    tomtom_key: Option<String>,

    /// JSON file of hazard zones (default: built-in demo hazards)
    #[arg(long)]
    hazards: Option<String>,

    /// Provider request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Print the full outcome as JSON
    #[arg(long)]
    json: bool,

    /// List preset locations and exit
    #[arg(long)]
    list_presets: bool,
}

fn parse_provider(value: &str) -> Result<ProviderKind, String> {
    value.parse().map_err(|err: detour_core::RouteError| err.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("detour_providers=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_presets {
        let locations = presets::preset_locations();
        println!("Sources:");
        for location in &locations.sources {
            println!(
                "  {} ({:.4}, {:.4})",
                location.label.as_deref().unwrap_or("-"),
                location.lat,
                location.lng
            );
        }
        println!("Destinations:");
        for location in &locations.destinations {
            println!(
                "  {} ({:.4}, {:.4})",
                location.label.as_deref().unwrap_or("-"),
                location.lat,
                location.lng
            );
        }
        return Ok(());
    }

    let source = resolve_location(&args.source).context("invalid --source")?;
    let destination = resolve_location(&args.destination).context("invalid --destination")?;
    let hazards = match &args.hazards {
        Some(path) => load_hazards(path)?,
        None => presets::mock_hazards(),
    };

    let settings = ProviderSettings {
        kind: args.provider,
        osrm_url: args.osrm_url,
        tomtom_url: args.tomtom_url,
        tomtom_api_key: args.tomtom_key,
        timeout: Duration::from_secs(args.timeout),
        ..ProviderSettings::default()
    };
    let provider = AnyProvider::from_settings(&settings)?;
    let planner = RoutePlanner::new(provider, PlannerRules::default());

    let outcome = planner
        .plan(RoutePlanRequest {
            source,
            destination,
            hazards,
            avoid_hazards: args.avoid,
        })
        .await
        .context("route planning failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_report(&outcome));
    }
    Ok(())
}
