//! Everything a command needs: config, session and the data client.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use playbuddy_core::{ApiClient, Config, DataClient, OfflineStore, QueryClient, Session};
use tracing::{debug, warn};

use crate::Global;

/// Load the config file and environment, then apply command line flags.
pub fn load_config(global: &Global) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;
    apply_flags(&mut config, global);
    Ok(config)
}

fn apply_flags(config: &mut Config, global: &Global) {
    if let Some(url) = global.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
        config.api_url = Some(url.to_string());
    }
}

pub struct Context {
    pub config: Config,
    pub cache_dir: PathBuf,
    pub session: Session,
    pub data: DataClient,
    pub json: bool,
}

impl Context {
    pub fn new(config: Config, cache_dir: PathBuf, json: bool) -> Result<Self> {
        let mut session = Session::new(cache_dir.clone());
        match session.load() {
            Ok(true) => debug!("Loaded session"),
            Ok(false) => debug!("No valid session"),
            // A broken session file only means signing in again
            Err(e) => warn!(error = %e, "Ignoring unreadable session"),
        }

        let queries = open_query_client(&config)?;
        let api = ApiClient::new(config.api_url())
            .with_context(|| format!("Invalid API URL: {}", config.api_url()))?;
        let data = DataClient::new(api, queries)
            .with_session(&session)
            .with_query_options(config.query_options());

        Ok(Self {
            config,
            cache_dir,
            session,
            data,
            json,
        })
    }

    /// The offline store attached to the query cache, if enabled.
    pub fn offline_store(&self) -> Option<&OfflineStore> {
        self.data.queries().offline_store()
    }
}

fn open_query_client(config: &Config) -> Result<QueryClient> {
    if !config.offline_enabled {
        return Ok(QueryClient::new());
    }
    let dir = config.offline_dir()?;
    match OfflineStore::with_limits(dir.clone(), config.offline.clone()) {
        Ok(store) => Ok(QueryClient::with_offline_store(store)),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Offline store unavailable, continuing without it");
            Ok(QueryClient::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            api_url: Some("http://127.0.0.1:1".into()),
            cache_dir: Some(dir.to_path_buf()),
            ..Config::default()
        }
    }

    #[test]
    fn test_flag_overrides_config_url() {
        let global = Global {
            api_url: Some("http://localhost:9000".into()),
            json: false,
        };
        let mut config = Config::default();
        apply_flags(&mut config, &global);
        assert_eq!(config.api_url(), "http://localhost:9000");

        let blank = Global {
            api_url: Some(" ".into()),
            json: false,
        };
        apply_flags(&mut config, &blank);
        assert_eq!(config.api_url(), "http://localhost:9000");
    }

    #[test]
    fn test_context_attaches_offline_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let ctx = Context::new(config, dir.path().to_path_buf(), false).unwrap();
        assert!(ctx.offline_store().is_some());
        assert!(!ctx.data.gate().is_open());
    }

    #[test]
    fn test_context_without_offline_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            offline_enabled: false,
            ..config_in(dir.path())
        };
        let ctx = Context::new(config, dir.path().to_path_buf(), true).unwrap();
        assert!(ctx.offline_store().is_none());
        assert!(ctx.json);
    }

    #[test]
    fn test_context_opens_gate_for_saved_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(playbuddy_core::SessionData::new("tok".into(), "user-1".into(), None));
        session.save().unwrap();

        let ctx = Context::new(config_in(dir.path()), dir.path().to_path_buf(), false).unwrap();
        assert!(ctx.data.gate().is_open());
        assert!(ctx.data.api().has_token());
    }
}
