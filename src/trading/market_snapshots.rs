use crate::st_model::{MarketData, MarketTradeGood, TradeGoodSymbol, WaypointSymbol};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Prices of one marketplace as seen by a docked ship.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub waypoint_symbol: WaypointSymbol,
    pub trade_goods: Vec<MarketTradeGood>,
    pub observed_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn quote(&self, trade_good: &TradeGoodSymbol) -> Option<&MarketTradeGood> {
        self.trade_goods.iter().find(|mtg| &mtg.symbol == trade_good)
    }
}

#[derive(Debug, Default)]
pub struct MarketSnapshotStore {
    snapshots: HashMap<WaypointSymbol, MarketSnapshot>,
}

impl MarketSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot of the market. Market data without prices leaves the store untouched.
    pub fn record(&mut self, market_data: &MarketData, observed_at: DateTime<Utc>) -> Option<&MarketSnapshot> {
        let trade_goods = market_data.trade_goods.clone()?;

        let snapshot = MarketSnapshot {
            waypoint_symbol: market_data.symbol.clone(),
            trade_goods,
            observed_at,
        };
        self.snapshots.insert(market_data.symbol.clone(), snapshot);
        self.snapshots.get(&market_data.symbol)
    }

    pub fn get(&self, waypoint_symbol: &WaypointSymbol) -> Option<&MarketSnapshot> {
        self.snapshots.get(waypoint_symbol)
    }

    pub fn quote(&self, waypoint_symbol: &WaypointSymbol, trade_good: &TradeGoodSymbol) -> Option<&MarketTradeGood> {
        self.get(waypoint_symbol).and_then(|snapshot| snapshot.quote(trade_good))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
