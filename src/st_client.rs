use crate::pagination::{PaginatedResponse, PaginationInput};
use crate::st_model::{
    AgentResponse, Data, DockShipResponse, ErrorResponse, GetMarketResponse, GetShipyardResponse, GetWaypointResponse, NavigateShipRequest,
    NavigateShipResponse, OrbitShipResponse, PurchaseShipRequest, PurchaseShipResponse, PurchaseTradeGoodResponse, RefuelShipRequest, RefuelShipResponse,
    RegistrationRequest, RegistrationResponse, SellTradeGoodResponse, Ship, ShipSymbol, ShipType, SystemSymbol, TradeGoodSymbol, TradeGoodTransactionRequest,
    Waypoint, WaypointSymbol, WaypointTraitSymbol,
};
use anyhow::Result;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use reqwest_middleware::RequestBuilder;
use serde::de::DeserializeOwned;

/// Everything that can go wrong on a single api call.
#[derive(Debug, thiserror::Error)]
pub enum StApiError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Error decoding response at '{path}': {message}. Response body was: '{body}'")]
    Decode { path: String, message: String, body: String },
    #[error("Api error {code}: {message}")]
    Domain {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },
    #[error("Api request failed. Status: {status}, Body: {body}")]
    Http { status: u16, body: String },
}

impl StApiError {
    /// Finds the api error inside an `anyhow::Error` chain, if there is one.
    pub fn find(err: &anyhow::Error) -> Option<&StApiError> {
        err.chain().find_map(|cause| cause.downcast_ref::<StApiError>())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaypointFilter {
    All,
    Trait(WaypointTraitSymbol),
    Type(String),
}

impl WaypointFilter {
    fn query_param(&self) -> Option<(&'static str, String)> {
        match self {
            WaypointFilter::All => None,
            WaypointFilter::Trait(t) => Some(("traits", t.0.clone())),
            WaypointFilter::Type(t) => Some(("type", t.clone())),
        }
    }
}

/// Decodes a response body. An `error` payload wins over the status code and `data` is not inspected then.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, StApiError> {
    if let Ok(ErrorResponse { error }) = serde_json::from_str::<ErrorResponse>(body) {
        if !error.message.is_empty() {
            return Err(StApiError::Domain {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }
    }

    if !(200..300).contains(&status) {
        return Err(StApiError::Http {
            status,
            body: body.to_string(),
        });
    }

    let deserializer = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(deserializer).map_err(|e| StApiError::Decode {
        path: e.path().to_string(),
        message: e.inner().to_string(),
        body: body.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct StClient {
    pub client: ClientWithMiddleware,
    base_url: String,
}

impl StClient {
    pub fn new(client: ClientWithMiddleware, base_url: &str) -> Self {
        StClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn make_api_call<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let resp = request.send().await.map_err(|e| StApiError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| StApiError::Transport(e.to_string()))?;

        Ok(decode_response(status.as_u16(), &body)?)
    }
}

#[async_trait]
impl StClientTrait for StClient {
    async fn register(&self, registration_request: RegistrationRequest) -> Result<Data<RegistrationResponse>> {
        Self::make_api_call(self.client.post(self.url("register")).json(&registration_request)).await
    }

    async fn get_agent(&self) -> Result<AgentResponse> {
        Self::make_api_call(self.client.get(self.url("my/agent"))).await
    }

    async fn list_ships(&self, pagination_input: PaginationInput) -> Result<PaginatedResponse<Ship>> {
        let query_param_list = [
            ("page", pagination_input.page.to_string()),
            ("limit", pagination_input.limit.to_string()),
        ];

        let request = self.client.get(self.url("my/ships")).query(&query_param_list);

        Self::make_api_call(request).await
    }

    async fn list_waypoints_of_system_page(
        &self,
        system_symbol: SystemSymbol,
        filter: WaypointFilter,
        pagination_input: PaginationInput,
    ) -> Result<PaginatedResponse<Waypoint>> {
        let mut query_param_list = vec![
            ("page", pagination_input.page.to_string()),
            ("limit", pagination_input.limit.to_string()),
        ];
        query_param_list.extend(filter.query_param());

        let request = self
            .client
            .get(self.url(&format!("systems/{}/waypoints", system_symbol.0)))
            .query(&query_param_list);

        Self::make_api_call(request).await
    }

    async fn get_waypoint(&self, waypoint_symbol: WaypointSymbol) -> Result<GetWaypointResponse> {
        let request = self.client.get(self.url(&format!(
            "systems/{}/waypoints/{}",
            waypoint_symbol.system_symbol().0,
            waypoint_symbol.0
        )));

        Self::make_api_call(request).await
    }

    async fn get_marketplace(&self, waypoint_symbol: WaypointSymbol) -> Result<GetMarketResponse> {
        let request = self.client.get(self.url(&format!(
            "systems/{}/waypoints/{}/market",
            waypoint_symbol.system_symbol().0,
            waypoint_symbol.0
        )));

        Self::make_api_call(request).await
    }

    async fn get_shipyard(&self, waypoint_symbol: WaypointSymbol) -> Result<GetShipyardResponse> {
        let request = self.client.get(self.url(&format!(
            "systems/{}/waypoints/{}/shipyard",
            waypoint_symbol.system_symbol().0,
            waypoint_symbol.0
        )));

        Self::make_api_call(request).await
    }

    async fn dock_ship(&self, ship_symbol: ShipSymbol) -> Result<DockShipResponse> {
        Self::make_api_call(self.client.post(self.url(&format!("my/ships/{}/dock", ship_symbol.0)))).await
    }

    async fn orbit_ship(&self, ship_symbol: ShipSymbol) -> Result<OrbitShipResponse> {
        Self::make_api_call(self.client.post(self.url(&format!("my/ships/{}/orbit", ship_symbol.0)))).await
    }

    async fn navigate(&self, ship_symbol: ShipSymbol, to: WaypointSymbol) -> Result<NavigateShipResponse> {
        Self::make_api_call(
            self.client
                .post(self.url(&format!("my/ships/{}/navigate", ship_symbol.0)))
                .json(&NavigateShipRequest { waypoint_symbol: to }),
        )
        .await
    }

    async fn refuel(&self, ship_symbol: ShipSymbol, amount: u32, from_cargo: bool) -> Result<RefuelShipResponse> {
        Self::make_api_call(
            self.client
                .post(self.url(&format!("my/ships/{}/refuel", ship_symbol.0)))
                .json(&RefuelShipRequest { amount, from_cargo }),
        )
        .await
    }

    async fn purchase_trade_good(&self, ship_symbol: ShipSymbol, units: u32, trade_good: TradeGoodSymbol) -> Result<PurchaseTradeGoodResponse> {
        Self::make_api_call(
            self.client
                .post(self.url(&format!("my/ships/{}/purchase", ship_symbol.0)))
                .json(&TradeGoodTransactionRequest { symbol: trade_good, units }),
        )
        .await
    }

    async fn sell_trade_good(&self, ship_symbol: ShipSymbol, units: u32, trade_good: TradeGoodSymbol) -> Result<SellTradeGoodResponse> {
        Self::make_api_call(
            self.client
                .post(self.url(&format!("my/ships/{}/sell", ship_symbol.0)))
                .json(&TradeGoodTransactionRequest { symbol: trade_good, units }),
        )
        .await
    }

    async fn purchase_ship(&self, ship_type: ShipType, waypoint_symbol: WaypointSymbol) -> Result<PurchaseShipResponse> {
        Self::make_api_call(
            self.client
                .post(self.url("my/ships"))
                .json(&PurchaseShipRequest { ship_type, waypoint_symbol }),
        )
        .await
    }
}

#[async_trait]
pub trait StClientTrait: Send + Sync {
    async fn register(&self, registration_request: RegistrationRequest) -> Result<Data<RegistrationResponse>>;

    async fn get_agent(&self) -> Result<AgentResponse>;

    async fn list_ships(&self, pagination_input: PaginationInput) -> Result<PaginatedResponse<Ship>>;

    async fn list_waypoints_of_system_page(
        &self,
        system_symbol: SystemSymbol,
        filter: WaypointFilter,
        pagination_input: PaginationInput,
    ) -> Result<PaginatedResponse<Waypoint>>;

    async fn get_waypoint(&self, waypoint_symbol: WaypointSymbol) -> Result<GetWaypointResponse>;

    async fn get_marketplace(&self, waypoint_symbol: WaypointSymbol) -> Result<GetMarketResponse>;

    async fn get_shipyard(&self, waypoint_symbol: WaypointSymbol) -> Result<GetShipyardResponse>;

    async fn dock_ship(&self, ship_symbol: ShipSymbol) -> Result<DockShipResponse>;

    async fn orbit_ship(&self, ship_symbol: ShipSymbol) -> Result<OrbitShipResponse>;

    async fn navigate(&self, ship_symbol: ShipSymbol, to: WaypointSymbol) -> Result<NavigateShipResponse>;

    async fn refuel(&self, ship_symbol: ShipSymbol, amount: u32, from_cargo: bool) -> Result<RefuelShipResponse>;

    async fn purchase_trade_good(&self, ship_symbol: ShipSymbol, units: u32, trade_good: TradeGoodSymbol) -> Result<PurchaseTradeGoodResponse>;

    async fn sell_trade_good(&self, ship_symbol: ShipSymbol, units: u32, trade_good: TradeGoodSymbol) -> Result<SellTradeGoodResponse>;

    async fn purchase_ship(&self, ship_type: ShipType, waypoint_symbol: WaypointSymbol) -> Result<PurchaseShipResponse>;
}
