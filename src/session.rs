//! Sessions
//!
//! Every app keeps the current user of a browser session server-side in its own
//! `tower-sessions` store, the browser only holds the session ID in a cookie scoped to the app

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Expiry;
use tower_sessions::MemoryStore;
use tower_sessions::SessionManagerLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time;

use crate::apps::Error;
use crate::users::Role;
use crate::users::User;

/// Default time a session lives without being used
pub const DEFAULT_IDLE_SECONDS: u64 = 86_400;

/// Longest allowed idle time, a year
pub const MAX_IDLE_SECONDS: u64 = 31_536_000;

const USER_KEY: &str = "user";
const FLASHES_KEY: &str = "flashes";

/// Session middleware of a single app
pub type SessionLayer = SessionManagerLayer<MemoryStore>;

/// Create the session middleware of an app
///
/// The cookie is only sent for paths below `path`, sessions expire after being idle for `idle`
pub fn layer(cookie_name: &'static str, path: &'static str, idle: Duration) -> SessionLayer {
    let idle = time::Duration::try_from(idle).unwrap_or(time::Duration::DAY);

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(cookie_name)
        .with_path(path)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        // served over plain HTTP, TLS ends in front of the service
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(idle))
}

/// Severity of a flash message, maps to the alert styles
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

/// One-shot message shown on the next rendered screen
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// The session of the current request
///
/// Store failures are logged, to the handlers a broken session looks like an empty one
#[derive(Clone)]
pub struct Session(tower_sessions::Session);

impl Session {
    /// The current user, if any
    pub async fn get(&self) -> Option<User> {
        self.read(USER_KEY).await
    }

    /// Store the user as the current user
    pub async fn save(&self, user: User) {
        tracing::debug!("Saving user `{}` in the session", user.username);

        // new ID on sign in, data stays
        if let Err(err) = self.0.cycle_id().await {
            tracing::error!("Could not renew the session ID: {err}");
        }

        self.write(USER_KEY, user).await;
    }

    /// Forget the current user, pending messages stay
    pub async fn clear(&self) {
        if let Err(err) = self.0.remove::<User>(USER_KEY).await {
            tracing::error!("Could not clear the session: {err}");
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.get().await.is_some()
    }

    pub async fn is_admin(&self) -> bool {
        self.role().await == Some(Role::Admin)
    }

    /// Role of the current user
    pub async fn role(&self) -> Option<Role> {
        self.get().await.map(|user| user.role)
    }

    /// Queue a message for the next rendered screen
    pub async fn flash<M>(&self, level: FlashLevel, message: M)
    where
        M: ToString,
    {
        let mut flashes = self.read::<Vec<Flash>>(FLASHES_KEY).await.unwrap_or_default();

        flashes.push(Flash {
            level,
            message: message.to_string(),
        });

        self.write(FLASHES_KEY, flashes).await;
    }

    /// Take all queued messages
    pub async fn take_flashes(&self) -> Vec<Flash> {
        let flashes = self.read::<Vec<Flash>>(FLASHES_KEY).await.unwrap_or_default();

        // untouched sessions are not written back
        if !flashes.is_empty() {
            if let Err(err) = self.0.remove_value(FLASHES_KEY).await {
                tracing::error!("Could not remove shown messages: {err}");
            }
        }

        flashes
    }

    async fn read<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self.0.get::<T>(key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::error!("Could not read `{key}` from the session: {err}");
                None
            }
        }
    }

    async fn write<T>(&self, key: &str, value: T)
    where
        T: Serialize + Send,
    {
        if let Err(err) = self.0.insert(key, value).await {
            tracing::error!("Could not write `{key}` to the session: {err}");
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        tower_sessions::Session::from_request_parts(parts, state)
            .await
            .map(Session)
            .map_err(|(_, message)| Error::internal_server_error(message))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn session(store: &Arc<MemoryStore>) -> Session {
        Session(tower_sessions::Session::new(None, store.clone(), None))
    }

    fn user(role: &str) -> User {
        serde_json::from_value(json!({
            "id": 1,
            "username": "ada",
            "password": "secret",
            "role": role,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_get_clear() {
        let store = Arc::new(MemoryStore::default());
        let session = session(&store);

        assert!(!session.is_authenticated().await);
        assert_eq!(None, session.role().await);

        session.save(user("admin")).await;

        assert!(session.is_authenticated().await);
        assert!(session.is_admin().await);
        assert_eq!(Some(Role::Admin), session.role().await);
        assert_eq!("ada", session.get().await.unwrap().username);

        session.clear().await;

        assert!(!session.is_authenticated().await);
        assert!(!session.is_admin().await);
    }

    #[tokio::test]
    async fn test_sessions_are_separate() {
        let store = Arc::new(MemoryStore::default());
        let first = session(&store);
        let second = session(&store);

        first.save(user("visitor")).await;

        assert!(first.is_authenticated().await);
        assert!(!second.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_flashes_are_taken_once() {
        let store = Arc::new(MemoryStore::default());
        let session = session(&store);

        session.flash(FlashLevel::Success, "Saved").await;
        session.flash(FlashLevel::Danger, "Oops").await;
        session.clear().await;

        let flashes = session.take_flashes().await;
        assert_eq!(2, flashes.len());
        assert_eq!(FlashLevel::Success, flashes[0].level);
        assert_eq!("Oops", flashes[1].message);

        assert!(session.take_flashes().await.is_empty());
    }
}
