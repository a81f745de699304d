use crate::reqwest_helpers::CallCounter;
use crate::st_client::StClientTrait;
use crate::st_model::{distance_to, MarketData, ShipType, Shipyard, Waypoint, WaypointSymbol};
use crate::trading::{build_trade_routes, CoverageMap, MarketSnapshotStore, TradeRouteTable};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

/// Waypoints never change during a run. Misses are fetched from the api and kept.
#[derive(Debug, Default)]
pub struct WaypointCache {
    waypoints: HashMap<WaypointSymbol, Waypoint>,
}

impl WaypointCache {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints: waypoints.into_iter().map(|wp| (wp.symbol.clone(), wp)).collect(),
        }
    }

    pub fn insert(&mut self, waypoint: Waypoint) {
        self.waypoints.insert(waypoint.symbol.clone(), waypoint);
    }

    pub fn get(&self, waypoint_symbol: &WaypointSymbol) -> Option<&Waypoint> {
        self.waypoints.get(waypoint_symbol)
    }

    pub fn as_map(&self) -> &HashMap<WaypointSymbol, Waypoint> {
        &self.waypoints
    }

    pub async fn get_or_fetch(&mut self, client: &dyn StClientTrait, waypoint_symbol: &WaypointSymbol) -> Result<&Waypoint> {
        if !self.waypoints.contains_key(waypoint_symbol) {
            event!(Level::DEBUG, "Waypoint {} not cached. Fetching it", waypoint_symbol);
            let waypoint = client
                .get_waypoint(waypoint_symbol.clone())
                .await
                .with_context(|| format!("get waypoint {}", waypoint_symbol))?
                .data;
            self.insert(waypoint);
        }

        self.waypoints
            .get(waypoint_symbol)
            .with_context(|| format!("Waypoint {} missing from cache", waypoint_symbol))
    }
}

/// All state the engine keeps between turns. Owned by the scheduler and lent to the controller one unit at a time.
pub struct EngineContext {
    pub client: Arc<dyn StClientTrait>,
    pub waypoints: WaypointCache,
    pub snapshots: MarketSnapshotStore,
    pub routes: TradeRouteTable,
    pub coverage: CoverageMap,
    pub shipyards: Vec<Shipyard>,
    pub scout_ship_type: ShipType,
    pub call_counter: CallCounter,
}

impl EngineContext {
    /// Builds the route graph and the coverage map from the marketplaces found at startup.
    pub fn new(
        client: Arc<dyn StClientTrait>,
        waypoints: Vec<Waypoint>,
        markets: &[MarketData],
        shipyards: Vec<Shipyard>,
        scout_ship_type: ShipType,
        call_counter: CallCounter,
    ) -> Self {
        let waypoints = WaypointCache::new(waypoints);
        let mut coverage = CoverageMap::new();
        let routes = build_trade_routes(markets, waypoints.as_map(), &mut coverage);

        Self {
            client,
            waypoints,
            snapshots: MarketSnapshotStore::new(),
            routes,
            coverage,
            shipyards,
            scout_ship_type,
            call_counter,
        }
    }

    /// Stores the prices a docked ship just read, marks the marketplace covered and reprices every route that touches it.
    /// Returns the number of repriced routes.
    pub fn record_market_observation(&mut self, market_data: &MarketData, observed_at: DateTime<Utc>) -> usize {
        if !market_data.has_detailed_price_information() {
            event!(Level::WARN, "Market data of {} has no prices. Is a ship present?", market_data.symbol);
            return 0;
        }
        let Some(snapshot) = self.snapshots.record(market_data, observed_at) else {
            return 0;
        };

        let repriced = self.routes.apply_snapshot(snapshot);
        self.coverage.mark_covered(&market_data.symbol);

        event!(
            Level::INFO,
            "Observed market {}: {} routes repriced. {}/{} marketplaces covered in pass #{}",
            market_data.symbol,
            repriced,
            self.coverage.number_of_covered(),
            self.coverage.len(),
            self.coverage.pass()
        );

        repriced
    }

    /// Nearest known shipyard that sells `ship_type`, measured from `from`.
    pub async fn nearest_shipyard_selling(&mut self, from: &WaypointSymbol, ship_type: &ShipType) -> Result<Option<WaypointSymbol>> {
        let (from_x, from_y) = {
            let from_wp = self.waypoints.get_or_fetch(self.client.as_ref(), from).await?;
            (from_wp.x, from_wp.y)
        };

        let candidates = self
            .shipyards
            .iter()
            .filter(|sy| sy.sells(ship_type))
            .map(|sy| sy.symbol.clone())
            .collect::<Vec<_>>();

        let mut best: Option<(WaypointSymbol, OrderedFloat<f64>)> = None;
        for shipyard_symbol in candidates {
            let shipyard_wp = self.waypoints.get_or_fetch(self.client.as_ref(), &shipyard_symbol).await?;
            let distance = OrderedFloat(distance_to(from_x, from_y, shipyard_wp.x, shipyard_wp.y));
            match &best {
                Some((_, best_distance)) if distance >= *best_distance => {}
                _ => best = Some((shipyard_symbol, distance)),
            }
        }

        Ok(best.map(|(wps, _)| wps))
    }
}
