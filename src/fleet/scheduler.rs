use crate::engine_context::EngineContext;
use crate::fleet::controller::{run_unit, TickOutcome};
use crate::fleet::role::count_scouts;
use crate::pagination::fetch_all_pages;
use crate::ship::ShipOperations;
use crate::st_model::{Agent, Ship};
use crate::trading::ranked_routes;
use anyhow::{Context, Result};
use itertools::Itertools;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{event, info_span, Instrument, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnSummary {
    Completed { units: usize, acted: usize, api_calls: u64 },
    /// The fleet could not be fetched or is empty.
    NoFleet,
    Cancelled,
}

/// Gives every unit one slot per turn. The slots are spread evenly over the turn.
pub struct TurnScheduler {
    ctx: EngineContext,
    turn_length: Duration,
    cancellation_token: CancellationToken,
}

impl TurnScheduler {
    pub fn new(ctx: EngineContext, turn_length: Duration, cancellation_token: CancellationToken) -> Self {
        Self {
            ctx,
            turn_length,
            cancellation_token,
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Runs turns until the cancellation token fires.
    pub async fn run(&mut self) -> Result<()> {
        let mut turn: u64 = 0;

        loop {
            turn += 1;
            let summary = self.run_turn().instrument(info_span!("turn", turn)).await;

            match summary {
                TurnSummary::Cancelled => break,
                TurnSummary::NoFleet => {
                    event!(Level::WARN, "Turn {} had no fleet to run. Retrying in {:?}", turn, self.turn_length);
                    if !self.sleep(self.turn_length).await {
                        break;
                    }
                }
                TurnSummary::Completed { units, acted, api_calls } => {
                    event!(Level::INFO, "Turn {} done: {} of {} units acted, {} api calls", turn, acted, units, api_calls);
                }
            }
        }

        event!(Level::INFO, "Scheduler stopped after {} turns", turn);
        Ok(())
    }

    pub async fn run_turn(&mut self) -> TurnSummary {
        if self.cancellation_token.is_cancelled() {
            return TurnSummary::Cancelled;
        }

        let (mut agent, ships) = match self.fetch_fleet().await {
            Ok(fleet) => fleet,
            Err(err) => {
                event!(Level::ERROR, "{:#}", err);
                return TurnSummary::NoFleet;
            }
        };

        if ships.is_empty() {
            return TurnSummary::NoFleet;
        }

        let units = ships.len();
        let per_unit_delay = self.turn_length / units as u32;
        let scout_count = count_scouts(ships.iter());

        self.log_route_overview(&agent);

        let mut acted = 0;
        for ship in ships {
            if self.cancellation_token.is_cancelled() {
                return self.cancel_turn();
            }

            let mut ship_ops = ShipOperations::new(ship, self.ctx.client.clone());
            if run_unit(&mut self.ctx, &mut agent, &mut ship_ops, scout_count).await == TickOutcome::Acted {
                acted += 1;
            }

            if !self.sleep(per_unit_delay).await {
                return self.cancel_turn();
            }
        }

        let api_calls = self.ctx.call_counter.reset();

        TurnSummary::Completed { units, acted, api_calls }
    }

    /// Calls made before the cancellation still belong to this turn.
    fn cancel_turn(&self) -> TurnSummary {
        let api_calls = self.ctx.call_counter.reset();
        event!(Level::INFO, "Turn cancelled after {} api calls", api_calls);
        TurnSummary::Cancelled
    }

    async fn fetch_fleet(&self) -> Result<(Agent, Vec<Ship>)> {
        let client = self.ctx.client.clone();
        let agent = client.get_agent().await.context("get agent")?.data;
        let ships = fetch_all_pages(|page| client.list_ships(page)).await.context("list ships")?;
        Ok((agent, ships))
    }

    fn log_route_overview(&self, agent: &Agent) {
        let ranked = ranked_routes(self.ctx.routes.routes());
        event!(
            Level::INFO,
            "{}c. {}/{} marketplaces covered, {} of {} routes profitable. Best: {}",
            agent.credits,
            self.ctx.coverage.number_of_covered(),
            self.ctx.coverage.len(),
            ranked.len(),
            self.ctx.routes.len(),
            ranked
                .iter()
                .take(3)
                .map(|r| format!("{} {} -> {} ({:.3})", r.good, r.buy_waypoint, r.sell_waypoint, r.score().unwrap_or_default()))
                .join(", ")
        );
    }

    /// Returns false if cancelled while sleeping.
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancellation_token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{Meta, PaginatedResponse};
    use crate::reqwest_helpers::CallCounter;
    use crate::st_model::{Data, NavStatus};
    use crate::test_objects::{MockStClient, TestObjects};
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn ships_page(ships: Vec<Ship>) -> PaginatedResponse<Ship> {
        let total = ships.len() as u64;
        PaginatedResponse {
            data: ships,
            meta: Meta { total, page: 1, limit: 20 },
        }
    }

    fn scheduler(client: MockStClient, turn_length: Duration, token: CancellationToken) -> TurnScheduler {
        let markets = vec![
            TestObjects::market_listing("X1-FOO-A1", &["IRON"], &[], &[]),
            TestObjects::market_listing("X1-FOO-B2", &[], &["IRON"], &[]),
        ];
        let waypoints = TestObjects::marketplace_waypoints(&[("X1-FOO-A1", 0, 0), ("X1-FOO-B2", 6, 8)]).into_values().collect();
        let ctx = EngineContext::new(Arc::new(client), waypoints, &markets, vec![], TestObjects::scout_ship_type(), CallCounter::new());
        TurnScheduler::new(ctx, turn_length, token)
    }

    #[tokio::test(start_paused = true)]
    async fn turn_spreads_units_over_the_turn_and_resets_the_call_counter() {
        let mut client = MockStClient::new();
        client.expect_get_agent().times(1).returning(|| Ok(Data { data: TestObjects::agent() }));
        client.expect_list_ships().times(1).returning(|_| {
            Ok(ships_page(vec![
                TestObjects::ship("FLWI-1", "COMMAND", NavStatus::InTransit, "X1-FOO-A1"),
                TestObjects::ship("FLWI-2", "SATELLITE", NavStatus::InTransit, "X1-FOO-B2"),
            ]))
        });

        let mut scheduler = scheduler(client, Duration::from_secs(60), CancellationToken::new());
        for _ in 0..7 {
            scheduler.context().call_counter.increment();
        }

        let started = tokio::time::Instant::now();
        let summary = scheduler.run_turn().await;

        assert_eq!(
            summary,
            TurnSummary::Completed {
                units: 2,
                acted: 0,
                api_calls: 7
            }
        );
        assert!(started.elapsed() >= Duration::from_secs(60));
        assert!(started.elapsed() < Duration::from_secs(61));
        assert_eq!(scheduler.context().call_counter.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_fleet_is_reported() {
        let mut client = MockStClient::new();
        client.expect_get_agent().returning(|| Ok(Data { data: TestObjects::agent() }));
        client.expect_list_ships().returning(|_| Ok(ships_page(vec![])));

        let mut scheduler = scheduler(client, Duration::from_secs(60), CancellationToken::new());

        assert_eq!(scheduler.run_turn().await, TurnSummary::NoFleet);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_fleet_fetch_is_reported() {
        let mut client = MockStClient::new();
        client.expect_get_agent().returning(|| Err(anyhow::anyhow!("timeout")));
        client.expect_list_ships().never();

        let mut scheduler = scheduler(client, Duration::from_secs(60), CancellationToken::new());

        assert_eq!(scheduler.run_turn().await, TurnSummary::NoFleet);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop_while_waiting_for_the_next_turn() {
        let mut client = MockStClient::new();
        client.expect_get_agent().returning(|| Err(anyhow::anyhow!("timeout")));

        let token = CancellationToken::new();
        let mut scheduler = scheduler(client, Duration::from_secs(60), token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            token.cancel();
        });

        scheduler.run().await.unwrap();
        canceller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn cancelling_mid_turn_still_accounts_for_the_calls_made() {
        let mut client = MockStClient::new();
        client.expect_get_agent().times(1).returning(|| Ok(Data { data: TestObjects::agent() }));
        client.expect_list_ships().times(1).returning(|_| {
            Ok(ships_page(vec![
                TestObjects::ship("FLWI-1", "COMMAND", NavStatus::InTransit, "X1-FOO-A1"),
                TestObjects::ship("FLWI-2", "SATELLITE", NavStatus::InTransit, "X1-FOO-B2"),
            ]))
        });

        let token = CancellationToken::new();
        let mut scheduler = scheduler(client, Duration::from_secs(60), token.clone());
        for _ in 0..5 {
            scheduler.context().call_counter.increment();
        }

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            token.cancel();
        });

        assert_eq!(scheduler.run_turn().await, TurnSummary::Cancelled);
        canceller.await.unwrap();

        assert_eq!(scheduler.context().call_counter.count(), 0);
        assert!(logs_contain("Turn cancelled after 5 api calls"));
    }

    #[tokio::test]
    async fn cancelled_scheduler_does_not_start_a_turn() {
        let token = CancellationToken::new();
        token.cancel();

        // any call on the mock would panic
        let mut scheduler = scheduler(MockStClient::new(), Duration::from_secs(60), token);

        assert_eq!(scheduler.run_turn().await, TurnSummary::Cancelled);
        scheduler.run().await.unwrap();
    }
}
