use crate::engine_context::EngineContext;
use crate::fleet::role::FleetRole;
use crate::ship::ShipOperations;
use crate::st_client::StApiError;
use crate::st_model::{Agent, Inventory};
use crate::trading::{best_route, best_route_for_good, RouteStatus, TradeRoute};
use anyhow::Result;
use chrono::Utc;
use tracing::{event, info_span, Instrument, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleReason {
    NoProfitableRoute,
    ScanIncomplete,
    NoRouteForCargo,
    NothingToCover,
    CannotAffordCargo,
    GoodNotTraded,
    RouteNoLongerProfitable,
}

/// What happened to a unit during its slot of the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    InTransit,
    Idle(IdleReason),
    Acted,
    /// An api call failed. The unit is re-evaluated next turn.
    Failed,
}

/// Runs the decision procedure of one unit. Stops at the first failing api call.
pub async fn run_unit(ctx: &mut EngineContext, agent: &mut Agent, ship: &mut ShipOperations, scout_count: usize) -> TickOutcome {
    if ship.is_in_transit() {
        event!(Level::DEBUG, "{} is in transit to {}", ship.symbol, ship.nav.waypoint_symbol);
        return TickOutcome::InTransit;
    }

    let role = FleetRole::of(ship);
    let span = info_span!("unit", ship = %ship.symbol, %role);

    async move {
        let result = match role {
            FleetRole::Command => run_command_unit(ctx, agent, ship, scout_count).await,
            FleetRole::Scout => run_scout_unit(ctx, ship).await,
        };

        match result {
            Ok(outcome) => {
                event!(Level::DEBUG, "{:?}", outcome);
                outcome
            }
            Err(err) => {
                match StApiError::find(&err) {
                    Some(StApiError::Domain { code, message, .. }) => {
                        event!(Level::WARN, "{} was rejected with code {}: {}", err, code, message)
                    }
                    _ => event!(Level::ERROR, "{:#}", err),
                }
                TickOutcome::Failed
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_scout_unit(ctx: &mut EngineContext, ship: &mut ShipOperations) -> Result<TickOutcome> {
    let Some(target) = ctx.coverage.assign_next(&ship.symbol) else {
        return Ok(TickOutcome::Idle(IdleReason::NothingToCover));
    };

    if ship.is_at(&target) {
        ship.dock_if_needed().await?;
        observe_market(ctx, ship).await?;
    } else {
        event!(Level::INFO, "Sending {} to cover {}", ship.symbol, target);
        ship.orbit_if_needed().await?;
        ship.navigate(&target).await?;
    }

    Ok(TickOutcome::Acted)
}

async fn run_command_unit(ctx: &mut EngineContext, agent: &mut Agent, ship: &mut ShipOperations, scout_count: usize) -> Result<TickOutcome> {
    if scout_count < ctx.coverage.len() {
        let scout_ship_type = ctx.scout_ship_type.clone();
        match ctx.nearest_shipyard_selling(ship.current_location(), &scout_ship_type).await? {
            Some(shipyard) => {
                event!(
                    Level::INFO,
                    "Fleet has {} scouts for {} marketplaces. Acquiring another {}",
                    scout_count,
                    ctx.coverage.len(),
                    scout_ship_type
                );
                return if ship.is_at(&shipyard) {
                    ship.dock_if_needed().await?;
                    let response = ship.purchase_ship(&scout_ship_type, &shipyard).await?;
                    event!(
                        Level::INFO,
                        "Purchased {} ({}) for {}c",
                        response.data.ship.symbol,
                        scout_ship_type,
                        response.data.transaction.price
                    );
                    *agent = response.data.agent;
                    Ok(TickOutcome::Acted)
                } else {
                    ship.orbit_if_needed().await?;
                    ship.navigate(&shipyard).await?;
                    Ok(TickOutcome::Acted)
                };
            }
            None => event!(Level::WARN, "No known shipyard sells {}. Trading with {} scouts", scout_ship_type, scout_count),
        }
    }

    match ship.cargo.first_item().cloned() {
        None => run_buy_leg(ctx, agent, ship).await,
        Some(item) => run_sell_leg(ctx, agent, ship, item).await,
    }
}

async fn run_buy_leg(ctx: &mut EngineContext, agent: &mut Agent, ship: &mut ShipOperations) -> Result<TickOutcome> {
    let Some(route) = best_route(ctx.routes.routes()).cloned() else {
        return Ok(TickOutcome::Idle(IdleReason::NoProfitableRoute));
    };

    if !ship.is_at(&route.buy_waypoint) {
        if !ctx.coverage.is_scan_complete() {
            return Ok(TickOutcome::Idle(IdleReason::ScanIncomplete));
        }
        ship.orbit_if_needed().await?;
        ship.navigate(&route.buy_waypoint).await?;
        return Ok(TickOutcome::Acted);
    }

    ship.dock_if_needed().await?;
    observe_market(ctx, ship).await?;

    if let Some(updated_agent) = ship.refuel().await? {
        *agent = updated_agent;
    }

    if !is_still_profitable(ctx, &route) {
        event!(Level::INFO, "Prices at {} moved. {} is no longer worth buying", route.buy_waypoint, route.good);
        return Ok(TickOutcome::Idle(IdleReason::RouteNoLongerProfitable));
    }

    let Some(quote) = ctx.snapshots.quote(&route.buy_waypoint, &route.good).cloned() else {
        return Ok(TickOutcome::Idle(IdleReason::GoodNotTraded));
    };

    let units = purchasable_units(agent.credits, quote.purchase_price, ship.cargo.free_capacity());
    if units == 0 {
        event!(
            Level::INFO,
            "Can't buy {} at {}c with {}c and {} free cargo space",
            route.good,
            quote.purchase_price,
            agent.credits,
            ship.cargo.free_capacity()
        );
        return Ok(TickOutcome::Idle(IdleReason::CannotAffordCargo));
    }

    event!(
        Level::INFO,
        "Buying {} units of {} at {} for {}c each. Selling at {} (score {:.3})",
        units,
        route.good,
        route.buy_waypoint,
        quote.purchase_price,
        route.sell_waypoint,
        route.score().unwrap_or_default()
    );

    for quantity in transaction_chunks(units, quote.trade_volume) {
        let response = ship.purchase_trade_good(quantity, route.good.clone()).await?;
        *agent = response.data.agent;
    }

    ship.orbit().await?;
    ship.navigate(&route.sell_waypoint).await?;

    Ok(TickOutcome::Acted)
}

async fn run_sell_leg(ctx: &mut EngineContext, agent: &mut Agent, ship: &mut ShipOperations, item: Inventory) -> Result<TickOutcome> {
    let Some(route) = best_route_for_good(ctx.routes.routes(), &item.symbol).cloned() else {
        event!(Level::INFO, "No priced route to sell {} units of {} in cargo", item.units, item.symbol);
        return Ok(TickOutcome::Idle(IdleReason::NoRouteForCargo));
    };

    if !ship.is_at(&route.sell_waypoint) {
        if !ctx.coverage.is_scan_complete() {
            return Ok(TickOutcome::Idle(IdleReason::ScanIncomplete));
        }
        ship.orbit_if_needed().await?;
        ship.navigate(&route.sell_waypoint).await?;
        return Ok(TickOutcome::Acted);
    }

    ship.dock_if_needed().await?;
    observe_market(ctx, ship).await?;

    let Some(quote) = ctx.snapshots.quote(&route.sell_waypoint, &item.symbol).cloned() else {
        return Ok(TickOutcome::Idle(IdleReason::GoodNotTraded));
    };

    event!(
        Level::INFO,
        "Selling {} units of {} at {} for {}c each",
        item.units,
        item.symbol,
        route.sell_waypoint,
        quote.sell_price
    );

    for quantity in transaction_chunks(item.units.max(0) as u32, quote.trade_volume) {
        let response = ship.sell_trade_good(quantity, item.symbol.clone()).await?;
        *agent = response.data.agent;
    }

    if let Some(updated_agent) = ship.refuel().await? {
        *agent = updated_agent;
    }

    if let Some(next_route) = best_route(ctx.routes.routes()).cloned() {
        if !ship.is_at(&next_route.buy_waypoint) {
            ship.orbit().await?;
            ship.navigate(&next_route.buy_waypoint).await?;
        }
    }

    Ok(TickOutcome::Acted)
}

async fn observe_market(ctx: &mut EngineContext, ship: &ShipOperations) -> Result<()> {
    let market = ship.get_market().await?;
    ctx.record_market_observation(&market, Utc::now());
    Ok(())
}

fn is_still_profitable(ctx: &EngineContext, route: &TradeRoute) -> bool {
    ctx.routes
        .routes()
        .iter()
        .find(|r| r.good == route.good && r.buy_waypoint == route.buy_waypoint && r.sell_waypoint == route.sell_waypoint)
        .map(|r| r.status() == RouteStatus::Profitable)
        .unwrap_or(false)
}

/// As many units as the credits pay for and the cargo hold takes.
pub fn purchasable_units(credits: i64, price_per_unit: i32, free_capacity: i32) -> u32 {
    let free_capacity = free_capacity.max(0) as i64;
    let affordable = if price_per_unit > 0 {
        credits.max(0) / price_per_unit as i64
    } else {
        free_capacity
    };
    affordable.min(free_capacity) as u32
}

/// Splits `units` into transactions of at most `trade_volume` units.
pub fn transaction_chunks(units: u32, trade_volume: i32) -> Vec<u32> {
    if units == 0 {
        return vec![];
    }
    let max_per_transaction = if trade_volume > 0 { trade_volume as u32 } else { units };

    let mut chunks = Vec::with_capacity(units.div_ceil(max_per_transaction) as usize);
    let mut remaining = units;
    while remaining > 0 {
        let quantity = remaining.min(max_per_transaction);
        chunks.push(quantity);
        remaining -= quantity;
    }
    chunks
}
