use crate::st_client::StClientTrait;
use crate::st_model::{FactionSymbol, RegistrationRequest};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{event, Level};

/// Persists the bearer token of an agent, keyed by its callsign.
pub trait TokenStore {
    fn load(&self, callsign: &str) -> Result<Option<String>>;
    fn save(&self, callsign: &str, token: &str) -> Result<()>;
}

/// Stores one `<CALLSIGN>.token` file per agent in `token_dir`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    token_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(token_dir: impl AsRef<Path>) -> Self {
        Self {
            token_dir: token_dir.as_ref().to_path_buf(),
        }
    }

    pub fn token_path(&self, callsign: &str) -> PathBuf {
        self.token_dir.join(format!("{}.token", callsign))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, callsign: &str) -> Result<Option<String>> {
        let path = self.token_path(callsign);
        if !path.exists() {
            event!(Level::DEBUG, "No token file found at {}", path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).with_context(|| format!("Reading token file {}", path.display()))?;
        let token = content.trim();

        if token.is_empty() {
            event!(Level::WARN, "Token file {} is empty. Treating it as missing", path.display());
            Ok(None)
        } else {
            Ok(Some(token.to_string()))
        }
    }

    fn save(&self, callsign: &str, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.token_dir).with_context(|| format!("Creating token directory {}", self.token_dir.display()))?;
        let path = self.token_path(callsign);
        std::fs::write(&path, token).with_context(|| format!("Writing token file {}", path.display()))?;
        event!(Level::INFO, "Saved token for {} to {}", callsign, path.display());
        Ok(())
    }
}

/// Returns the stored token of `callsign`. Registers a new agent and stores its token if there is none.
pub async fn load_or_register_token(token_store: &dyn TokenStore, unauthenticated_client: &dyn StClientTrait, callsign: &str, faction: FactionSymbol) -> Result<String> {
    if let Some(token) = token_store.load(callsign)? {
        event!(Level::INFO, "Found token for {}", callsign);
        return Ok(token);
    }

    event!(Level::INFO, "No token for {}. Registering a new agent with faction {}", callsign, faction.0);

    let registration = unauthenticated_client
        .register(RegistrationRequest {
            faction,
            symbol: callsign.to_string(),
        })
        .await
        .with_context(|| format!("register agent {}", callsign))?
        .data;

    event!(
        Level::INFO,
        "Registered {} with headquarters {} and {}c",
        registration.agent.symbol.0,
        registration.agent.headquarters,
        registration.agent.credits
    );

    token_store.save(callsign, &registration.token)?;
    Ok(registration.token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::st_model::{Data, RegistrationResponse};
    use crate::test_objects::{MockStClient, TestObjects};

    #[test]
    fn missing_token_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        assert_eq!(store.load("FLWI").unwrap(), None);
    }

    #[test]
    fn saved_token_can_be_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens"));

        store.save("FLWI", "secret-token").unwrap();

        assert!(dir.path().join("tokens").join("FLWI.token").exists());
        assert_eq!(store.load("FLWI").unwrap(), Some("secret-token".to_string()));
        assert_eq!(store.load("OTHER").unwrap(), None);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("FLWI.token"), "  abc.def\n").unwrap();
        let store = FileTokenStore::new(dir.path());
        assert_eq!(store.load("FLWI").unwrap(), Some("abc.def".to_string()));
    }

    #[test]
    fn empty_token_file_is_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("FLWI.token"), "\n").unwrap();
        let store = FileTokenStore::new(dir.path());
        assert_eq!(store.load("FLWI").unwrap(), None);
    }

    #[tokio::test]
    async fn stored_token_skips_registration() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        store.save("FLWI", "stored").unwrap();

        let mut client = MockStClient::new();
        client.expect_register().never();

        let token = load_or_register_token(&store, &client, "FLWI", FactionSymbol("COSMIC".to_string())).await.unwrap();
        assert_eq!(token, "stored");
    }

    #[tokio::test]
    async fn missing_token_registers_and_saves_the_new_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());

        let mut client = MockStClient::new();
        client
            .expect_register()
            .withf(|req| req.symbol == "FLWI" && req.faction == FactionSymbol("COSMIC".to_string()))
            .times(1)
            .returning(|_| {
                Ok(Data {
                    data: RegistrationResponse {
                        agent: TestObjects::agent(),
                        token: "fresh".to_string(),
                    },
                })
            });

        let token = load_or_register_token(&store, &client, "FLWI", FactionSymbol("COSMIC".to_string())).await.unwrap();

        assert_eq!(token, "fresh");
        assert_eq!(store.load("FLWI").unwrap(), Some("fresh".to_string()));
    }

    #[tokio::test]
    async fn failed_registration_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());

        let mut client = MockStClient::new();
        client.expect_register().returning(|_| Err(anyhow::anyhow!("callsign taken")));

        assert!(load_or_register_token(&store, &client, "FLWI", FactionSymbol("COSMIC".to_string())).await.is_err());
        assert_eq!(store.load("FLWI").unwrap(), None);
    }
}
