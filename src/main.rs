use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use core_types::Coordinate;
use fleet_state::FleetClient;
use routing::{calculate_eta, city_coordinate, Profile, RouteProvider};
use stream_client::StreamConnector;
use tracing_subscriber::EnvFilter;

/// The main entry point for the FleetLink client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = configuration::load_settings()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch(args) => handle_watch(args, settings).await,
        Commands::Route(args) => handle_route(args, settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A resilient client for live fleet tracking and road-network routing.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the live fleet stream and log state changes.
    Watch(WatchArgs),
    /// Compute a road route between two points.
    Route(RouteArgs),
}

#[derive(Parser)]
struct WatchArgs {
    /// WebSocket endpoint of the fleet service (overrides config.toml).
    #[arg(long)]
    url: Option<String>,

    /// Execute arbitrage opportunities as they arrive instead of only
    /// reporting them.
    #[arg(long)]
    auto_execute: bool,
}

#[derive(Parser)]
struct RouteArgs {
    /// Start point as "lon,lat" or a known city name (e.g. PUNE).
    #[arg(long)]
    from: String,

    /// End point as "lon,lat" or a known city name (e.g. MUMBAI).
    #[arg(long)]
    to: String,

    /// Travel profile: driving, walking or cycling.
    #[arg(long, default_value = "driving")]
    profile: Profile,

    /// Also fetch up to this many alternative routes.
    #[arg(long, default_value_t = 0)]
    alternatives: usize,

    /// Assumed current speed in km/h for the ETA estimate.
    #[arg(long, default_value_t = 60.0)]
    speed: f64,

    /// Traffic factor applied to the ETA (1.0 = free flow, 1.5 = heavy).
    #[arg(long, default_value_t = 1.0)]
    traffic: f64,
}

// ==============================================================================
// Watch Command Logic
// ==============================================================================

/// Follows the stream until it ends, logging roster sizes, fresh events and
/// arbitrage opportunities as they are folded into the observable state.
async fn handle_watch(args: WatchArgs, settings: configuration::Settings) -> anyhow::Result<()> {
    let mut stream_settings = settings.stream;
    if let Some(url) = args.url {
        stream_settings.url = url;
    }

    let connector = StreamConnector::new(stream_settings);
    let mut client = FleetClient::new(connector.connect()?);

    let mut last_event_id: Option<String> = None;
    let mut reported_opportunity: Option<String> = None;

    while client.tick().await {
        let mut execute_pending = false;
        {
            let state = client.state();

            if let Some(event) = state.events.first() {
                if last_event_id.as_deref() != Some(event.id.as_str()) {
                    last_event_id = Some(event.id.clone());
                    tracing::info!(
                        trucks = state.trucks.len(),
                        severity = ?event.severity,
                        "{}",
                        event.message
                    );
                }
            }

            if let Some(opportunity) = &state.arbitrage {
                if reported_opportunity.as_deref() != Some(opportunity.truck_id.as_str()) {
                    reported_opportunity = Some(opportunity.truck_id.clone());
                    tracing::info!(
                        truck_id = %opportunity.truck_id,
                        savings = %opportunity.net_savings,
                        "Arbitrage opportunity pending"
                    );
                    execute_pending = args.auto_execute;
                }
            } else {
                reported_opportunity = None;
            }
        }

        if execute_pending {
            client.execute_arbitrage();
        }
    }

    if let Some(error) = &client.state().error {
        anyhow::bail!("fleet stream ended: {error}");
    }
    Ok(())
}

// ==============================================================================
// Route Command Logic
// ==============================================================================

async fn handle_route(args: RouteArgs, settings: configuration::Settings) -> anyhow::Result<()> {
    let start = parse_endpoint(&args.from)
        .with_context(|| format!("invalid --from endpoint '{}'", args.from))?;
    let end = parse_endpoint(&args.to)
        .with_context(|| format!("invalid --to endpoint '{}'", args.to))?;

    let provider = RouteProvider::new(&settings.routing);
    let route = provider.fetch_route(start, end, args.profile).await;
    let eta = calculate_eta(route.distance, args.speed, args.traffic);

    let mut table = Table::new();
    table.set_header(vec!["Route", "Waypoints", "Distance", "Duration", "ETA"]);
    table.add_row(vec![
        format!("{} -> {}", args.from, args.to),
        route.coordinates.len().to_string(),
        geodesy::format_distance(route.distance),
        geodesy::format_duration(route.duration),
        eta.format("%H:%M UTC").to_string(),
    ]);

    if args.alternatives > 0 {
        match provider
            .fetch_alternative_routes(start, end, args.alternatives)
            .await
        {
            Ok(alternatives) if alternatives.is_empty() => {
                tracing::info!("No alternative routes available");
            }
            Ok(alternatives) => {
                for (i, alt) in alternatives.iter().enumerate() {
                    table.add_row(vec![
                        format!("alternative {}", i + 1),
                        alt.coordinates.len().to_string(),
                        geodesy::format_distance(alt.distance),
                        geodesy::format_duration(alt.duration),
                        calculate_eta(alt.distance, args.speed, args.traffic)
                            .format("%H:%M UTC")
                            .to_string(),
                    ]);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not fetch alternative routes"),
        }
    }

    println!("{table}");
    Ok(())
}

/// Accepts either a known city name or an explicit "lon,lat" pair.
fn parse_endpoint(input: &str) -> anyhow::Result<Coordinate> {
    if let Some(coord) = city_coordinate(input) {
        return Ok(coord);
    }
    Ok(Coordinate::parse(input)?)
}
