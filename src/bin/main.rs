use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{event, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use st_trade_scout::cli_args::Cli;
use st_trade_scout::configuration::AgentConfiguration;
use st_trade_scout::discovery::survey_home_system;
use st_trade_scout::engine_context::EngineContext;
use st_trade_scout::fleet::TurnScheduler;
use st_trade_scout::reqwest_helpers::{create_client, CallCounter};
use st_trade_scout::st_client::{StClient, StClientTrait};
use st_trade_scout::token_store::{load_or_register_token, FileTokenStore};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_span_events(fmt::format::FmtSpan::CLOSE))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AgentConfiguration::from_env()?;
    event!(Level::INFO, "Starting agent {} against {}", args.callsign, cfg.base_url);

    let call_counter = CallCounter::new();
    let client_settings = cfg.client_settings();

    let unauthenticated_client = StClient::new(create_client(&client_settings, None, call_counter.clone())?, &cfg.base_url);
    let token_store = FileTokenStore::new(&cfg.token_dir);
    let token = load_or_register_token(&token_store, &unauthenticated_client, &args.callsign, cfg.faction_symbol()).await?;

    let authenticated_client = StClient::new(create_client(&client_settings, Some(token), call_counter.clone())?, &cfg.base_url);
    let client = Arc::new(authenticated_client) as Arc<dyn StClientTrait>;

    let survey = survey_home_system(client.as_ref()).await?;
    event!(
        Level::INFO,
        "Agent {} has {}c. Headquarters: {}",
        survey.agent.symbol.0,
        survey.agent.credits,
        survey.agent.headquarters
    );

    let ctx = EngineContext::new(client, survey.waypoints, &survey.markets, survey.shipyards, cfg.scout_ship_type(), call_counter);

    let cancellation_token = CancellationToken::new();
    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                event!(Level::INFO, "Received ctrl-c. Shutting down after the current unit");
                ctrl_c_token.cancel();
            }
            Err(e) => event!(Level::ERROR, "Unable to listen for ctrl-c: {}", e),
        }
    });

    let mut scheduler = TurnScheduler::new(ctx, cfg.turn_length(), cancellation_token);
    scheduler.run().await
}
