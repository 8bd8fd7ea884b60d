#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]
// #![doc = include_str!("../README.md")]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::apps::AppsConfig;
use crate::client::Client;
use crate::session::DEFAULT_IDLE_SECONDS;
use crate::session::MAX_IDLE_SECONDS;
use crate::users::InitialAdmin;
use crate::users::ensure_initial_admin;
use crate::utils::env_var_or_else;
use crate::utils::parse_env_var;

mod apps;
mod client;
mod events;
mod graceful_shutdown;
mod ids;
mod notes;
mod router;
mod session;
mod subscriptions;
#[cfg(test)]
mod tests;
mod users;
mod utils;
mod views;

const DEFAULT_RUST_LOG: &str = "crudapps=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

/// Backend URL variables per app, the shared `BACKEND_URL` comes last
const NOTES_BACKEND_VARS: &[&str] = &["NOTES_BACKEND_URL", "BACKEND_URL"];
const EVENTS_BACKEND_VARS: &[&str] = &["EVENTS_BACKEND_URL", "BACKEND_URL"];
const CRUDNOTAS_BACKEND_VARS: &[&str] = &["CRUDNOTAS_BACKEND_URL", "BACKEND_URL"];

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(AppConfig::from_env()?).await?;

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Everything the apps need to start
pub struct AppConfig {
    pub notes: client::Config,
    pub events: client::Config,
    pub crudnotas: client::Config,

    /// Admin to create in the notes backend when it has none
    pub initial_admin: InitialAdmin,

    pub session_idle: Duration,
}

impl AppConfig {
    /// Read the configuration from the environment
    ///
    /// # Errors
    ///
    /// Will return `Err` when `SESSION_IDLE_SECONDS` is set but not a number of seconds up to a year
    pub fn from_env() -> Result<Self> {
        let session_idle = parse_env_var("SESSION_IDLE_SECONDS", DEFAULT_IDLE_SECONDS)?;
        anyhow::ensure!(
            (1..=MAX_IDLE_SECONDS).contains(&session_idle),
            "SESSION_IDLE_SECONDS must be between 1 and {MAX_IDLE_SECONDS}"
        );

        Ok(Self {
            notes: client::Config::DetectConfig(NOTES_BACKEND_VARS),
            events: client::Config::DetectConfig(EVENTS_BACKEND_VARS),
            crudnotas: client::Config::DetectConfig(CRUDNOTAS_BACKEND_VARS),
            initial_admin: InitialAdmin::from_env(),
            session_idle: Duration::from_secs(session_idle),
        })
    }
}

/// Create and setup the apps with their dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Backend URL
/// - Initial admin setup
pub async fn setup_app(config: AppConfig) -> Result<Router> {
    let notes = Client::from_config(config.notes)?;
    let events = Client::from_config(config.events)?;
    let crudnotas = Client::from_config(config.crudnotas)?;

    ensure_initial_admin(&notes, &config.initial_admin).await?;

    tracing::warn!("Passwords are stored and compared as plain text by all backends");

    let router = apps::router(AppsConfig {
        notes,
        events,
        crudnotas,
        session_idle: config.session_idle,
    });

    Ok(router.layer(TraceLayer::new_for_http()))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(env_var_or_else("RUST_LOG", || {
            DEFAULT_RUST_LOG.into()
        })))
        .with(fmt::layer())
        .init();
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Some(port) = utils::env_var("PORT") {
        let port = port.parse::<u16>()?;

        address.set_port(port);
    }

    Ok(address)
}
