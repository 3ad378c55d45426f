use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use thermaguard_common::ControllerConfig;

use crate::{
    api,
    clock::MonotonicClock,
    controller::{spawn_control_loop, ThermostatController},
    gateway::SimulatedPlant,
};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config().await?;

    // Hardware integration point: swap the simulated plant for the
    // one-wire sensor and GPIO relay drivers on the target board.
    let plant = Arc::new(SimulatedPlant::new(&config));
    let controller = Arc::new(
        ThermostatController::new(&config, plant.clone(), plant, Arc::new(MonotonicClock::new()))
            .context("invalid controller configuration")?,
    );

    spawn_control_loop(controller.clone(), config.cycle_period());
    info!(
        "control loop started: {} zones every {} ms",
        controller.zone_count(),
        config.cycle_period_ms
    );

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind controller server at {addr}"))?;

    info!("controller listening on http://{addr}");
    axum::serve(listener, api::router(controller))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn load_config() -> anyhow::Result<ControllerConfig> {
    let path = std::env::var("THERMAGUARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./thermaguard.json"));
    read_config(&path, |name| std::env::var(name).ok()).await
}

/// Loads the config file at `path`, falling back to defaults when it does not
/// exist, then applies the port and cycle overrides found through `env`.
async fn read_config(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ControllerConfig> {
    let mut config = match tokio::fs::read(path).await {
        Ok(raw) => ControllerConfig::from_json(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!("no config at {}, using defaults", path.display());
            ControllerConfig::default()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    if let Some(port) = env_parse::<u16>(&env, "THERMAGUARD_HTTP_PORT") {
        let mut addr = config
            .listen_addr()
            .context("cannot apply THERMAGUARD_HTTP_PORT")?;
        addr.set_port(port);
        config.listen_addr = addr.to_string();
    }
    if let Some(cycle_ms) = env_parse::<u64>(&env, "THERMAGUARD_CYCLE_MS") {
        config.cycle_period_ms = cycle_ms;
    }

    Ok(config)
}

fn env_parse<T: FromStr>(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let value = env(name)?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring unparsable {name}={value}");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;
    use thermaguard_common::ConfigError;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write_config(dir: &TempDir, listen_addr: &str) -> PathBuf {
        let mut config = ControllerConfig::default();
        config.listen_addr = listen_addr.to_string();
        config.cycle_period_ms = 2_000;
        let path = dir.path().join("thermaguard.json");
        std::fs::write(&path, serde_json::to_vec(&config).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = read_config(&dir.path().join("absent.json"), vars(&[]))
            .await
            .unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[tokio::test]
    async fn file_values_are_used_without_overrides() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "127.0.0.1:8100");

        let config = read_config(&path, vars(&[])).await.unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8100");
        assert_eq!(config.cycle_period_ms, 2_000);
    }

    #[tokio::test]
    async fn env_overrides_port_and_cycle_period() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "127.0.0.1:8100");

        let config = read_config(
            &path,
            vars(&[("THERMAGUARD_HTTP_PORT", "9000"), ("THERMAGUARD_CYCLE_MS", "250")]),
        )
        .await
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.cycle_period_ms, 250);
    }

    #[tokio::test]
    async fn unparsable_env_values_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "127.0.0.1:8100");

        let config = read_config(
            &path,
            vars(&[("THERMAGUARD_HTTP_PORT", "eighty"), ("THERMAGUARD_CYCLE_MS", "-5")]),
        )
        .await
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8100");
        assert_eq!(config.cycle_period_ms, 2_000);
    }

    #[tokio::test]
    async fn port_override_keeps_bad_listen_addr_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "not-an-address");

        let err = read_config(&path, vars(&[("THERMAGUARD_HTTP_PORT", "9000")]))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidListenAddr("not-an-address".to_string()))
        );
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thermaguard.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = read_config(&path, vars(&[])).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse(_))
        ));
    }
}
