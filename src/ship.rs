use crate::st_client::StClientTrait;
use crate::st_model::{
    Agent, MarketData, NavStatus, PurchaseShipResponse, PurchaseTradeGoodResponse, SellTradeGoodResponse, Ship, ShipType, TradeGoodSymbol, WaypointSymbol,
};
use anyhow::{Context, Result};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A fleet unit plus the client to act on it.
/// Every action mirrors the server's answer into the local copy of the ship.
#[derive(Clone)]
pub struct ShipOperations {
    pub ship: Ship,
    client: Arc<dyn StClientTrait>,
}

impl fmt::Debug for ShipOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShipOperations").field("ship", &self.ship).finish()
    }
}

impl ShipOperations {
    pub fn new(ship: Ship, client: Arc<dyn StClientTrait>) -> Self {
        ShipOperations { ship, client }
    }

    pub fn is_in_transit(&self) -> bool {
        self.nav.status == NavStatus::InTransit
    }

    pub fn is_docked(&self) -> bool {
        self.nav.status == NavStatus::Docked
    }

    pub fn current_location(&self) -> &WaypointSymbol {
        &self.nav.waypoint_symbol
    }

    pub fn is_at(&self, waypoint_symbol: &WaypointSymbol) -> bool {
        &self.nav.waypoint_symbol == waypoint_symbol && !self.is_in_transit()
    }

    pub async fn dock(&mut self) -> Result<()> {
        let response = self
            .client
            .dock_ship(self.ship.symbol.clone())
            .await
            .with_context(|| format!("dock {}", self.ship.symbol))?;
        self.nav = response.data.nav;
        Ok(())
    }

    pub async fn orbit(&mut self) -> Result<()> {
        let response = self
            .client
            .orbit_ship(self.ship.symbol.clone())
            .await
            .with_context(|| format!("orbit {}", self.ship.symbol))?;
        self.nav = response.data.nav;
        Ok(())
    }

    pub async fn dock_if_needed(&mut self) -> Result<()> {
        if self.is_docked() {
            Ok(())
        } else {
            self.dock().await
        }
    }

    pub async fn orbit_if_needed(&mut self) -> Result<()> {
        if self.is_docked() {
            self.orbit().await
        } else {
            Ok(())
        }
    }

    pub async fn navigate(&mut self, to: &WaypointSymbol) -> Result<()> {
        let response = self
            .client
            .navigate(self.ship.symbol.clone(), to.clone())
            .await
            .with_context(|| format!("navigate {} to {}", self.ship.symbol, to))?;
        self.nav = response.data.nav;
        self.fuel = response.data.fuel;
        Ok(())
    }

    pub async fn get_market(&self) -> Result<MarketData> {
        let response = self
            .client
            .get_marketplace(self.nav.waypoint_symbol.clone())
            .await
            .with_context(|| format!("get market at {} for {}", self.nav.waypoint_symbol, self.ship.symbol))?;
        Ok(response.data)
    }

    /// Fills the tank. Returns the agent as reported after paying, or `None` if the tank was already full.
    pub async fn refuel(&mut self) -> Result<Option<Agent>> {
        let amount = self.fuel.missing();
        if amount == 0 {
            return Ok(None);
        }

        let response = self
            .client
            .refuel(self.ship.symbol.clone(), amount, false)
            .await
            .with_context(|| format!("refuel {} by {} units", self.ship.symbol, amount))?;
        self.fuel = response.data.fuel;
        Ok(Some(response.data.agent))
    }

    pub async fn purchase_trade_good(&mut self, quantity: u32, trade_good: TradeGoodSymbol) -> Result<PurchaseTradeGoodResponse> {
        let response = self
            .client
            .purchase_trade_good(self.ship.symbol.clone(), quantity, trade_good.clone())
            .await
            .with_context(|| format!("purchase {} units of {} with {}", quantity, trade_good, self.ship.symbol))?;
        self.cargo = response.data.cargo.clone();
        Ok(response)
    }

    pub async fn sell_trade_good(&mut self, quantity: u32, trade_good: TradeGoodSymbol) -> Result<SellTradeGoodResponse> {
        let response = self
            .client
            .sell_trade_good(self.ship.symbol.clone(), quantity, trade_good.clone())
            .await
            .with_context(|| format!("sell {} units of {} with {}", quantity, trade_good, self.ship.symbol))?;
        self.cargo = response.data.cargo.clone();
        Ok(response)
    }

    pub async fn purchase_ship(&self, ship_type: &ShipType, waypoint_symbol: &WaypointSymbol) -> Result<PurchaseShipResponse> {
        self.client
            .purchase_ship(ship_type.clone(), waypoint_symbol.clone())
            .await
            .with_context(|| format!("purchase {} at {}", ship_type, waypoint_symbol))
    }
}

impl Deref for ShipOperations {
    type Target = Ship;

    fn deref(&self) -> &Self::Target {
        &self.ship
    }
}

impl DerefMut for ShipOperations {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ship
    }
}
