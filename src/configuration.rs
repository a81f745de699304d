use crate::reqwest_helpers::ClientSettings;
use crate::st_model::{FactionSymbol, ShipType};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings, read from `SPACETRADERS_*` environment variables.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AgentConfiguration {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_faction")]
    pub faction: String,
    #[serde(default = "default_token_dir")]
    pub token_dir: PathBuf,
    #[serde(default = "default_turn_length_seconds")]
    pub turn_length_seconds: u64,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_requests_per_second")]
    pub max_requests_per_second: u32,
    #[serde(default = "default_max_transient_retries")]
    pub max_transient_retries: u32,
    #[serde(default = "default_scout_ship_type")]
    pub scout_ship_type: String,
}

fn default_base_url() -> String {
    "https://api.spacetraders.io/v2".to_string()
}

fn default_faction() -> String {
    "COSMIC".to_string()
}

fn default_token_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_turn_length_seconds() -> u64 {
    60
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_max_requests_per_second() -> u32 {
    2
}

fn default_max_transient_retries() -> u32 {
    3
}

fn default_scout_ship_type() -> String {
    "SHIP_PROBE".to_string()
}

pub const ENV_PREFIX: &str = "SPACETRADERS_";

impl AgentConfiguration {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let cfg: AgentConfiguration = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("Reading SPACETRADERS_* environment variables")?;

        if cfg.turn_length_seconds == 0 {
            anyhow::bail!("SPACETRADERS_TURN_LENGTH_SECONDS must be greater than 0");
        }
        Ok(cfg)
    }

    pub fn turn_length(&self) -> Duration {
        Duration::from_secs(self.turn_length_seconds)
    }

    pub fn faction_symbol(&self) -> FactionSymbol {
        FactionSymbol(self.faction.clone())
    }

    pub fn scout_ship_type(&self) -> ShipType {
        ShipType(self.scout_ship_type.clone())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            max_requests_per_second: self.max_requests_per_second,
            max_transient_retries: self.max_transient_retries,
        }
    }
}
