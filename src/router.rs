//! Client-side style routing
//!
//! Every app maps the path below its mount point to a screen, guarded by the role of the
//! current user. Resolving never renders anything, it only decides between rendering a route
//! or redirecting to another one.

use std::fmt;

use axum::http::Uri;
use percent_encoding::percent_decode_str;

use crate::ids::Id;
use crate::users::Role;

/// Who can visit a route
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Anyone
    Public,
    /// Anyone with a session
    Authenticated,
    /// Sessions with one of these roles
    Roles(&'static [Role]),
}

/// Static route table of an app
pub trait RouteTable: Copy + fmt::Debug + Sized {
    /// Where the app is mounted, like `/notes`
    const MOUNT: &'static str;

    /// Exact lookup of a path, without query
    fn parse(path: &str) -> Option<Self>;

    /// Path of the route, relative to the mount point
    fn path(self) -> &'static str;

    fn access(self) -> Access;

    /// Routes only shown without a session, like login
    fn is_guest_only(self) -> bool {
        false
    }

    /// Route for an empty path
    fn entry() -> Self;

    /// Route for an unknown path
    fn fallback() -> Self;

    /// Route for a visitor with a session on a guest-only route
    fn home() -> Self;

    /// Route for a visitor without a session on a guarded route
    fn login_redirect() -> Self;

    /// Route for a visitor with the wrong role
    fn denied_redirect() -> Self;

    /// Absolute link to the route
    fn href(self) -> String {
        format!("{}{}", Self::MOUNT, self.path())
    }
}

/// A location within an app: path plus decoded query parameters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    path: String,
    query: Vec<(String, String)>,
}

impl Location {
    /// Parse a location relative to the mount point, like `/dashboard/events/edit?id=3`
    pub fn parse(location: &str) -> Self {
        let (path, query) = location.split_once('?').unwrap_or((location, ""));

        let path = percent_decode_str(path).decode_utf8_lossy();
        let path = if path == "/" { "" } else { path.as_ref() };

        let query = url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        Self {
            path: path.to_string(),
            query,
        }
    }

    /// Location of a request to an app mounted at `mount`
    pub fn from_uri(uri: &Uri, mount: &str) -> Self {
        let path = uri.path();
        let path = path.strip_prefix(mount).unwrap_or(path);

        match uri.query() {
            Some(query) => Self::parse(&format!("{path}?{query}")),
            None => Self::parse(path),
        }
    }

    /// Path used for matching, query stripped
    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a query parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The `id` query parameter, when it is a valid ID
    pub fn id(&self) -> Option<Id> {
        self.param("id").and_then(|id| id.parse().ok())
    }
}

/// What to do with a location
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution<R> {
    /// Load the data of the route and render it
    Render(R),
    /// Send the browser to another route
    Redirect(R),
}

/// Resolve a location for a visitor with the given role (`None` without session)
pub fn resolve<R: RouteTable>(location: &Location, role: Option<Role>) -> Resolution<R> {
    if location.path().is_empty() {
        return Resolution::Redirect(R::entry());
    }

    let Some(route) = R::parse(location.path()) else {
        tracing::debug!("Unknown route {}{}", R::MOUNT, location.path());

        return Resolution::Redirect(R::fallback());
    };

    if role.is_some() && route.is_guest_only() {
        tracing::debug!("{route:?} is for guests only, going home");

        return Resolution::Redirect(R::home());
    }

    match (route.access(), role) {
        (Access::Public, _) => {}
        (Access::Authenticated | Access::Roles(_), None) => {
            tracing::debug!("{route:?} requires a session");

            return Resolution::Redirect(R::login_redirect());
        }
        (Access::Authenticated, Some(_)) => {}
        (Access::Roles(roles), Some(role)) => {
            if !roles.contains(&role) {
                tracing::warn!("Role `{}` is not allowed on {route:?}", role.as_str());

                return Resolution::Redirect(R::denied_redirect());
            }
        }
    }

    Resolution::Render(route)
}
