use crate::pagination::fetch_all_pages;
use crate::st_client::{StClientTrait, WaypointFilter};
use crate::st_model::{Agent, MarketData, Shipyard, SystemSymbol, Waypoint, WaypointTraitSymbol};
use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::{event, Level};

/// What the agent knows about its home system before the first turn.
#[derive(Debug, Clone)]
pub struct HomeSystemSurvey {
    pub agent: Agent,
    pub system_symbol: SystemSymbol,
    pub waypoints: Vec<Waypoint>,
    pub markets: Vec<MarketData>,
    pub shipyards: Vec<Shipyard>,
}

/// Lists the marketplaces and shipyards of the headquarters' system and reads each one of them.
/// Marketplaces or shipyards that can't be read are skipped with a warning.
pub async fn survey_home_system(client: &dyn StClientTrait) -> Result<HomeSystemSurvey> {
    let agent = client.get_agent().await.context("get agent")?.data;
    let system_symbol = agent.headquarters.system_symbol();

    event!(Level::INFO, "Surveying home system {} of agent {}", system_symbol.0, agent.symbol.0);

    let marketplace_waypoints = list_waypoints_with_trait(client, &system_symbol, WaypointTraitSymbol::marketplace()).await?;
    let shipyard_waypoints = list_waypoints_with_trait(client, &system_symbol, WaypointTraitSymbol::shipyard()).await?;

    let mut markets = Vec::new();
    for wp in marketplace_waypoints.iter() {
        match client.get_marketplace(wp.symbol.clone()).await {
            Ok(response) => markets.push(response.data),
            Err(e) => event!(Level::WARN, "get market {} failed, skipping it: {:#}", wp.symbol, e),
        }
    }

    let mut shipyards = Vec::new();
    for wp in shipyard_waypoints.iter() {
        match client.get_shipyard(wp.symbol.clone()).await {
            Ok(response) => shipyards.push(response.data),
            Err(e) => event!(Level::WARN, "get shipyard {} failed, skipping it: {:#}", wp.symbol, e),
        }
    }

    let waypoints = marketplace_waypoints
        .into_iter()
        .chain(shipyard_waypoints)
        .unique_by(|wp| wp.symbol.clone())
        .collect_vec();

    event!(
        Level::INFO,
        "Found {} marketplaces and {} shipyards in {}",
        markets.len(),
        shipyards.len(),
        system_symbol.0
    );

    Ok(HomeSystemSurvey {
        agent,
        system_symbol,
        waypoints,
        markets,
        shipyards,
    })
}

async fn list_waypoints_with_trait(client: &dyn StClientTrait, system_symbol: &SystemSymbol, trait_symbol: WaypointTraitSymbol) -> Result<Vec<Waypoint>> {
    let waypoints = fetch_all_pages(|page| client.list_waypoints_of_system_page(system_symbol.clone(), WaypointFilter::Trait(trait_symbol.clone()), page))
        .await
        .with_context(|| format!("list waypoints of {} with trait {}", system_symbol.0, trait_symbol.0))?;

    // the trait filter is applied by the server. Double-check anyway since the cache relies on it
    Ok(waypoints.into_iter().filter(|wp| wp.has_trait(&trait_symbol)).collect())
}
