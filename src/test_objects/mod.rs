use crate::pagination::{PaginatedResponse, PaginationInput};
use crate::st_client::{StClientTrait, WaypointFilter};
use crate::st_model::{
    Agent, AgentResponse, AgentSymbol, Cargo, Data, DockShipResponse, FlightMode, Fuel, GetMarketResponse, GetShipyardResponse, GetWaypointResponse, Inventory,
    MarketData, MarketTradeGood, Nav, NavAndFuelResponse, NavOnlyResponse, NavRouteWaypoint, NavStatus, NavigateShipResponse, OrbitShipResponse,
    PurchaseShipResponse, PurchaseShipResponseBody, PurchaseTradeGoodResponse, RefuelShipResponse, RefuelShipResponseBody, Registration, RegistrationRequest,
    RegistrationResponse, Route, SellTradeGoodResponse, Ship, ShipPurchaseTransaction, ShipSymbol, ShipType, ShipTypeEntry, Shipyard, SupplyLevel,
    SystemSymbol, TradeGood, TradeGoodSymbol, TradeGoodTransactionResponseBody, TradeGoodType, Transaction, TransactionType, Waypoint, WaypointSymbol,
    WaypointTrait, WaypointTraitSymbol,
};
use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use mockall::mock;
use std::collections::HashMap;

mock! {
    pub StClient {}

    #[async_trait]
    impl StClientTrait for StClient {
        async fn register(&self, registration_request: RegistrationRequest) -> anyhow::Result<Data<RegistrationResponse>> {}

        async fn get_agent(&self) -> anyhow::Result<AgentResponse> {}

        async fn list_ships(&self, pagination_input: PaginationInput) -> anyhow::Result<PaginatedResponse<Ship>> {}

        async fn list_waypoints_of_system_page(&self, system_symbol: SystemSymbol, filter: WaypointFilter, pagination_input: PaginationInput) -> anyhow::Result<PaginatedResponse<Waypoint>> {}

        async fn get_waypoint(&self, waypoint_symbol: WaypointSymbol) -> anyhow::Result<GetWaypointResponse> {}

        async fn get_marketplace(&self, waypoint_symbol: WaypointSymbol) -> anyhow::Result<GetMarketResponse> {}

        async fn get_shipyard(&self, waypoint_symbol: WaypointSymbol) -> anyhow::Result<GetShipyardResponse> {}

        async fn dock_ship(&self, ship_symbol: ShipSymbol) -> anyhow::Result<DockShipResponse> {}

        async fn orbit_ship(&self, ship_symbol: ShipSymbol) -> anyhow::Result<OrbitShipResponse> {}

        async fn navigate(&self, ship_symbol: ShipSymbol, to: WaypointSymbol) -> anyhow::Result<NavigateShipResponse> {}

        async fn refuel(&self, ship_symbol: ShipSymbol, amount: u32, from_cargo: bool) -> anyhow::Result<RefuelShipResponse> {}

        async fn purchase_trade_good(&self, ship_symbol: ShipSymbol, units: u32, trade_good: TradeGoodSymbol) -> anyhow::Result<PurchaseTradeGoodResponse> {}

        async fn sell_trade_good(&self, ship_symbol: ShipSymbol, units: u32, trade_good: TradeGoodSymbol) -> anyhow::Result<SellTradeGoodResponse> {}

        async fn purchase_ship(&self, ship_type: ShipType, waypoint_symbol: WaypointSymbol) -> anyhow::Result<PurchaseShipResponse> {}
    }
}

pub struct TestObjects;

impl TestObjects {
    pub fn wps(symbol: &str) -> WaypointSymbol {
        WaypointSymbol(symbol.to_string())
    }

    pub fn system_symbol() -> SystemSymbol {
        Self::wps("X1-FOO-A1").system_symbol()
    }

    pub fn scout_ship_type() -> ShipType {
        ShipType("SHIP_PROBE".to_string())
    }

    pub fn agent() -> Agent {
        Self::agent_with_credits(175_000)
    }

    pub fn agent_with_credits(credits: i64) -> Agent {
        Agent {
            account_id: Some("account_id".to_string()),
            symbol: AgentSymbol("FLWI".to_string()),
            headquarters: Self::wps("X1-FOO-A1"),
            credits,
            starting_faction: "COSMIC".to_string(),
            ship_count: 2,
        }
    }

    pub fn create_waypoint(waypoint_symbol: &WaypointSymbol, x: i64, y: i64, waypoint_traits: Vec<WaypointTraitSymbol>) -> Waypoint {
        Waypoint {
            symbol: waypoint_symbol.clone(),
            r#type: "PLANET".to_string(),
            system_symbol: waypoint_symbol.system_symbol(),
            x,
            y,
            traits: waypoint_traits
                .into_iter()
                .map(|wts| WaypointTrait {
                    name: format!("name: {}", wts.0),
                    description: format!("description: {}", wts.0),
                    symbol: wts,
                })
                .collect_vec(),
        }
    }

    pub fn marketplace_waypoints(coordinates: &[(&str, i64, i64)]) -> HashMap<WaypointSymbol, Waypoint> {
        coordinates
            .iter()
            .map(|(symbol, x, y)| {
                let wps = Self::wps(symbol);
                let wp = Self::create_waypoint(&wps, *x, *y, vec![WaypointTraitSymbol::marketplace()]);
                (wps, wp)
            })
            .collect()
    }

    fn trade_goods(symbols: &[&str]) -> Vec<TradeGood> {
        symbols
            .iter()
            .map(|s| TradeGood {
                symbol: TradeGoodSymbol(s.to_string()),
                name: s.to_lowercase(),
                description: "".to_string(),
            })
            .collect_vec()
    }

    /// Market data as seen from afar: listings without prices.
    pub fn market_listing(symbol: &str, exports: &[&str], imports: &[&str], exchange: &[&str]) -> MarketData {
        MarketData {
            symbol: Self::wps(symbol),
            exports: Self::trade_goods(exports),
            imports: Self::trade_goods(imports),
            exchange: Self::trade_goods(exchange),
            transactions: None,
            trade_goods: None,
        }
    }

    /// Market data as seen by a ship at the marketplace.
    pub fn market_with_prices(symbol: &str, quotes: Vec<MarketTradeGood>) -> MarketData {
        let symbols_of = |tpe: TradeGoodType| {
            quotes
                .iter()
                .filter(|q| q.trade_good_type == tpe)
                .map(|q| q.symbol.0.clone())
                .collect_vec()
        };
        let exports = symbols_of(TradeGoodType::Export);
        let imports = symbols_of(TradeGoodType::Import);
        let exchange = symbols_of(TradeGoodType::Exchange);

        MarketData {
            symbol: Self::wps(symbol),
            exports: Self::trade_goods(&exports.iter().map(String::as_str).collect_vec()),
            imports: Self::trade_goods(&imports.iter().map(String::as_str).collect_vec()),
            exchange: Self::trade_goods(&exchange.iter().map(String::as_str).collect_vec()),
            transactions: Some(vec![]),
            trade_goods: Some(quotes),
        }
    }

    fn quote(good: &str, trade_good_type: TradeGoodType, purchase_price: i32, sell_price: i32, trade_volume: i32) -> MarketTradeGood {
        MarketTradeGood {
            symbol: TradeGoodSymbol(good.to_string()),
            trade_good_type,
            trade_volume,
            supply: SupplyLevel::Moderate,
            activity: None,
            purchase_price,
            sell_price,
        }
    }

    pub fn export_quote(good: &str, purchase_price: i32, sell_price: i32, trade_volume: i32) -> MarketTradeGood {
        Self::quote(good, TradeGoodType::Export, purchase_price, sell_price, trade_volume)
    }

    pub fn import_quote(good: &str, purchase_price: i32, sell_price: i32, trade_volume: i32) -> MarketTradeGood {
        Self::quote(good, TradeGoodType::Import, purchase_price, sell_price, trade_volume)
    }

    pub fn shipyard(symbol: &str, ship_types: &[&str]) -> Shipyard {
        Shipyard {
            symbol: Self::wps(symbol),
            ship_types: ship_types
                .iter()
                .map(|st| ShipTypeEntry {
                    r#type: ShipType(st.to_string()),
                })
                .collect_vec(),
            modifications_fee: None,
        }
    }

    fn nav_route_waypoint(waypoint_symbol: &WaypointSymbol) -> NavRouteWaypoint {
        NavRouteWaypoint {
            symbol: waypoint_symbol.clone(),
            waypoint_type: "PLANET".to_string(),
            system_symbol: waypoint_symbol.system_symbol(),
            x: 0,
            y: 0,
        }
    }

    pub fn nav(status: NavStatus, origin: &str, destination: &str) -> Nav {
        let origin = Self::wps(origin);
        let destination = Self::wps(destination);
        Nav {
            system_symbol: destination.system_symbol(),
            waypoint_symbol: destination.clone(),
            route: Route {
                destination: Self::nav_route_waypoint(&destination),
                origin: Self::nav_route_waypoint(&origin),
                departure_time: Default::default(),
                arrival: Default::default(),
            },
            status,
            flight_mode: FlightMode::Cruise,
        }
    }

    pub fn ship(symbol: &str, role: &str, status: NavStatus, location: &str) -> Ship {
        Ship {
            symbol: ShipSymbol(symbol.to_string()),
            registration: Registration {
                name: symbol.to_string(),
                faction_symbol: "COSMIC".to_string(),
                role: role.to_string(),
            },
            nav: Self::nav(status, location, location),
            cargo: Cargo {
                capacity: 40,
                units: 0,
                inventory: vec![],
            },
            fuel: Self::full_tank(),
        }
    }

    pub fn full_tank() -> Fuel {
        Fuel {
            current: 400,
            capacity: 400,
            consumed: None,
        }
    }

    pub fn cargo_with(good: &str, units: i32, capacity: i32) -> Cargo {
        Cargo {
            capacity,
            units,
            inventory: vec![Inventory {
                symbol: TradeGoodSymbol(good.to_string()),
                name: good.to_lowercase(),
                description: "".to_string(),
                units,
            }],
        }
    }

    pub fn nav_response(status: NavStatus, waypoint_symbol: &str) -> DockShipResponse {
        Data {
            data: NavOnlyResponse {
                nav: Self::nav(status, waypoint_symbol, waypoint_symbol),
            },
        }
    }

    pub fn navigate_response(from: &str, to: &str) -> NavigateShipResponse {
        Data {
            data: NavAndFuelResponse {
                nav: Self::nav(NavStatus::InTransit, from, to),
                fuel: Self::full_tank(),
            },
        }
    }

    fn transaction(good: &TradeGoodSymbol, transaction_type: TransactionType, units: u32) -> Transaction {
        Transaction {
            waypoint_symbol: Self::wps("X1-FOO-A1"),
            ship_symbol: ShipSymbol("FLWI-1".to_string()),
            trade_symbol: good.clone(),
            transaction_type,
            units: units as i32,
            price_per_unit: 42,
            total_price: 42 * units as i32,
            timestamp: Utc::now(),
        }
    }

    pub fn refuel_response_body(amount: u32, credits: i64) -> RefuelShipResponseBody {
        RefuelShipResponseBody {
            agent: Self::agent_with_credits(credits),
            fuel: Self::full_tank(),
            transaction: Self::transaction(&TradeGoodSymbol("FUEL".to_string()), TransactionType::Purchase, amount),
        }
    }

    pub fn purchase_response(units: u32, good: &TradeGoodSymbol, credits: i64) -> PurchaseTradeGoodResponse {
        Data {
            data: TradeGoodTransactionResponseBody {
                agent: Self::agent_with_credits(credits),
                cargo: Self::cargo_with(&good.0, units as i32, 500),
                transaction: Self::transaction(good, TransactionType::Purchase, units),
            },
        }
    }

    pub fn sell_response(units: u32, good: &TradeGoodSymbol, credits: i64) -> SellTradeGoodResponse {
        Data {
            data: TradeGoodTransactionResponseBody {
                agent: Self::agent_with_credits(credits),
                cargo: Cargo {
                    capacity: 60,
                    units: 0,
                    inventory: vec![],
                },
                transaction: Self::transaction(good, TransactionType::Sell, units),
            },
        }
    }

    pub fn purchase_ship_response(ship_type: &ShipType, waypoint_symbol: &WaypointSymbol, credits: i64) -> PurchaseShipResponse {
        Data {
            data: PurchaseShipResponseBody {
                agent: Self::agent_with_credits(credits),
                ship: Self::ship("FLWI-3", "SATELLITE", NavStatus::Docked, &waypoint_symbol.0),
                transaction: ShipPurchaseTransaction {
                    waypoint_symbol: waypoint_symbol.clone(),
                    ship_type: ship_type.clone(),
                    price: 25_000,
                    timestamp: Utc::now(),
                },
            },
        }
    }
}
