use crate::st_model::{LabelledCoordinate, MarketData, TradeGoodSymbol, Waypoint, WaypointSymbol};
use crate::trading::coverage::CoverageMap;
use crate::trading::market_snapshots::MarketSnapshot;
use itertools::Itertools;
use std::collections::HashMap;
use strum_macros::Display;
use tracing::{event, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RouteStatus {
    /// At least one side has not been observed yet.
    Unpriced,
    Unprofitable,
    Profitable,
}

/// Buy `good` at `buy_waypoint` and sell it at `sell_waypoint`.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRoute {
    pub good: TradeGoodSymbol,
    pub buy_waypoint: WaypointSymbol,
    pub sell_waypoint: WaypointSymbol,
    pub buy_price: Option<i32>,
    pub sell_price: Option<i32>,
    pub distance: f64,
}

impl TradeRoute {
    pub fn new(good: TradeGoodSymbol, buy_waypoint: &Waypoint, sell_waypoint: &Waypoint) -> Self {
        Self {
            good,
            buy_waypoint: buy_waypoint.symbol.clone(),
            sell_waypoint: sell_waypoint.symbol.clone(),
            buy_price: None,
            sell_price: None,
            distance: buy_waypoint.distance_to(sell_waypoint),
        }
    }

    pub fn profit_per_unit(&self) -> Option<i64> {
        match (self.buy_price, self.sell_price) {
            (Some(buy), Some(sell)) => Some(sell as i64 - buy as i64),
            _ => None,
        }
    }

    pub fn status(&self) -> RouteStatus {
        match self.profit_per_unit() {
            None => RouteStatus::Unpriced,
            Some(profit) if profit > 0 => RouteStatus::Profitable,
            Some(_) => RouteStatus::Unprofitable,
        }
    }

    /// Takes the prices of the snapshot for whichever side of the route the snapshot's market is on.
    /// A good the market no longer trades resets that side to unpriced.
    fn apply_snapshot(&mut self, snapshot: &MarketSnapshot) -> bool {
        let mut touched = false;
        if self.buy_waypoint == snapshot.waypoint_symbol {
            self.buy_price = snapshot.quote(&self.good).map(|q| q.purchase_price);
            touched = true;
        }
        if self.sell_waypoint == snapshot.waypoint_symbol {
            self.sell_price = snapshot.quote(&self.good).map(|q| q.sell_price);
            touched = true;
        }
        touched
    }
}

#[derive(Debug, Default)]
pub struct TradeRouteTable {
    routes: Vec<TradeRoute>,
}

impl TradeRouteTable {
    pub fn routes(&self) -> &[TradeRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the number of routes whose prices were updated.
    pub fn apply_snapshot(&mut self, snapshot: &MarketSnapshot) -> usize {
        self.routes.iter_mut().map(|route| route.apply_snapshot(snapshot)).filter(|touched| *touched).count()
    }
}

/// Pairs every export of one marketplace with every import or exchange of the same good at another marketplace.
/// Every waypoint that ends up on a route is registered in the coverage map.
///
/// The order is deterministic: marketplaces sorted by symbol, goods in the order the buying marketplace lists its exports.
pub fn build_trade_routes(markets: &[MarketData], waypoints: &HashMap<WaypointSymbol, Waypoint>, coverage: &mut CoverageMap) -> TradeRouteTable {
    let sorted_markets = markets
        .iter()
        .filter(|md| {
            let known = waypoints.contains_key(&md.symbol);
            if !known {
                event!(Level::WARN, "Skipping marketplace {} - waypoint is unknown", md.symbol);
            }
            known
        })
        .sorted_by(|a, b| a.symbol.cmp(&b.symbol))
        .dedup_by(|a, b| a.symbol == b.symbol)
        .collect_vec();

    let mut routes = Vec::new();

    for buy_market in sorted_markets.iter() {
        let buy_waypoint = &waypoints[&buy_market.symbol];

        for export in buy_market.exports.iter().unique_by(|tg| tg.symbol.clone()) {
            for sell_market in sorted_markets.iter() {
                if sell_market.symbol == buy_market.symbol {
                    continue;
                }

                let is_sold_there = sell_market
                    .imports
                    .iter()
                    .chain(sell_market.exchange.iter())
                    .any(|tg| tg.symbol == export.symbol);

                if is_sold_there {
                    let sell_waypoint = &waypoints[&sell_market.symbol];
                    routes.push(TradeRoute::new(export.symbol.clone(), buy_waypoint, sell_waypoint));
                }
            }
        }
    }

    for route in routes.iter() {
        coverage.register(&route.buy_waypoint);
        coverage.register(&route.sell_waypoint);
    }

    event!(
        Level::INFO,
        "Built {} trade routes between {} marketplaces ({} marketplaces need coverage)",
        routes.len(),
        sorted_markets.len(),
        coverage.len()
    );

    TradeRouteTable { routes }
}
