use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use smartroute::api::validate_endpoints;
use smartroute::weather_check::SafeRoutePlan;
use smartroute::{
    AppState, DirectionsClient, GeminiClient, GoogleDirectionsClient, HighwayDataset,
    LanguageModel, PlannerConfig, WeatherClient, WttrClient, telemetry, web,
};

/// Highway route planner with live weather, traffic and safety guidance
#[derive(Debug, Parser)]
#[command(name = "smartroute", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Plan a route and print the itinerary as JSON
    Route { start: String, end: String },
    /// Check weather along a route and suggest a detour if needed
    WeatherCheck { start: String, end: String },
    /// Estimate the road distance between two cities
    Distance { start: String, end: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PlannerConfig::load_from_path(cli.config.clone())?;
    let tracer_provider = telemetry::init_tracing(&config.logging, cli.verbose);

    if let Command::Serve { port: Some(port) } = cli.command {
        config.server.port = port;
    }

    let result = run(cli.command, &config).await;
    telemetry::shutdown(tracer_provider);
    result
}

fn build_state(config: &PlannerConfig) -> Result<AppState> {
    let llm: Arc<dyn LanguageModel> =
        Arc::new(GeminiClient::new(&config.llm).context("Failed to create language model client")?);
    let weather = WeatherClient::new(Arc::new(
        WttrClient::new(&config.weather).context("Failed to create weather client")?,
    ));
    let directions = DirectionsClient::new(Arc::new(
        GoogleDirectionsClient::new(&config.maps).context("Failed to create directions client")?,
    ));
    let dataset = HighwayDataset::load_optional(config.dataset.path.as_deref());

    Ok(AppState::new(
        llm,
        weather,
        directions,
        dataset,
        &config.routing,
    ))
}

async fn run(command: Command, config: &PlannerConfig) -> Result<()> {
    let state = build_state(config)?;

    match command {
        Command::Serve { .. } => web::run(state, &config.server).await,
        Command::Route { start, end } => {
            let (start, end) = validate_endpoints(&start, &end)?;
            let itinerary = state.plan_route(&start, &end).await?;
            println!("{}", serde_json::to_string_pretty(&itinerary)?);
            Ok(())
        }
        Command::WeatherCheck { start, end } => {
            let (start, end) = validate_endpoints(&start, &end)?;
            let plan = state.weather_check().plan_safe_route(&start, &end).await;
            print_weather_report(&plan);
            Ok(())
        }
        Command::Distance { start, end } => {
            let (start, end) = validate_endpoints(&start, &end)?;
            let estimate = state.distance().estimate(&start, &end).await?;
            println!(
                "{} -> {}: {:.2} km ({})",
                estimate.start,
                estimate.end,
                estimate.distance_km,
                serde_json::to_value(estimate.source)?
                    .as_str()
                    .unwrap_or_default()
            );
            Ok(())
        }
    }
}

fn print_weather_report(plan: &SafeRoutePlan) {
    println!("Route: {}", plan.route.join(" -> "));
    for reading in &plan.scan.readings {
        let flag = if reading.bad_weather { "  [bad weather]" } else { "" };
        println!(
            "  {}: {}, {}°C{}",
            reading.city, reading.description, reading.temperature_c, flag
        );
    }

    if !plan.needs_detour() {
        println!("No bad weather on the route.");
        return;
    }
    println!("Bad weather at: {}", plan.scan.bad_weather_cities.join(", "));
    match &plan.alternate_route {
        Some(route) => println!("Alternate route: {route}"),
        None => println!("No alternate route available."),
    }
}
