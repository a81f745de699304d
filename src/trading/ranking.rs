use crate::st_model::TradeGoodSymbol;
use crate::trading::trade_routes::{RouteStatus, TradeRoute};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

impl TradeRoute {
    /// Profit per unit and distance unit of the round trip. Only priced routes have a score.
    ///
    /// Orbitals of the same parent share their coordinates; the distance is clamped to 1 to keep those routes finite.
    pub fn score(&self) -> Option<f64> {
        self.profit_per_unit()
            .map(|profit| profit as f64 / (2.0 * self.distance.max(1.0)))
    }
}

/// Highest scoring profitable route. Ties go to the route that comes first.
/// `None` means there is nothing worth doing yet.
pub fn best_route(routes: &[TradeRoute]) -> Option<&TradeRoute> {
    let mut best: Option<(&TradeRoute, f64)> = None;

    for route in routes.iter().filter(|r| r.status() == RouteStatus::Profitable) {
        if let Some(score) = route.score() {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((route, score)),
            }
        }
    }

    best.map(|(route, _)| route)
}

/// Where to sell cargo of `good` that is already on board. The buy price is paid already, so every priced route counts,
/// unprofitable ones included. Highest sell price wins, then the shorter route, then the route that comes first.
pub fn best_route_for_good<'a>(routes: &'a [TradeRoute], good: &TradeGoodSymbol) -> Option<&'a TradeRoute> {
    let sell_key = |r: &TradeRoute| (r.sell_price, Reverse(OrderedFloat(r.distance)));

    let mut best: Option<&TradeRoute> = None;
    for route in routes.iter().filter(|r| &r.good == good && r.status() != RouteStatus::Unpriced) {
        match best {
            Some(current) if sell_key(route) <= sell_key(current) => {}
            _ => best = Some(route),
        }
    }
    best
}

/// All profitable routes, best first. Equal scores keep their input order.
pub fn ranked_routes(routes: &[TradeRoute]) -> Vec<&TradeRoute> {
    routes
        .iter()
        .filter(|r| r.status() == RouteStatus::Profitable)
        .sorted_by_key(|r| Reverse(OrderedFloat(r.score().unwrap_or(f64::MIN))))
        .collect_vec()
}
