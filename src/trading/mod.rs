pub mod coverage;
pub mod market_snapshots;
pub mod ranking;
pub mod trade_routes;

pub use coverage::CoverageMap;
pub use market_snapshots::{MarketSnapshot, MarketSnapshotStore};
pub use ranking::{best_route, best_route_for_good, ranked_routes};
pub use trade_routes::{build_trade_routes, RouteStatus, TradeRoute, TradeRouteTable};
