//! Events app
//!
//! Admins publish events with a capacity, visitors register for them

use axum::Extension;
use axum::Router;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::routing::get;

use crate::client;
use crate::client::Client;
use crate::ids::Id;
use crate::router;
use crate::router::Access;
use crate::router::Location;
use crate::router::Resolution;
use crate::router::RouteTable;
use crate::session::FlashLevel;
use crate::session::Session;
use crate::session::SessionLayer;
use crate::users::Role;
use crate::users::User;
use crate::views::Layout;
use crate::views::NavItem;

use super::Feedback;
use super::Screen;
use super::paint;

mod handlers;
mod views;

/// Cookie holding the session ID of the events app
pub const SESSION_COOKIE: &str = "events_session";

/// Screens of the events app
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    CreateEvent,
    /// `?id=` selects the event
    EditEvent,
    NotFound,
}

impl RouteTable for Route {
    const MOUNT: &'static str = "/events";

    fn parse(path: &str) -> Option<Self> {
        match path {
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            "/dashboard" => Some(Route::Dashboard),
            "/dashboard/events/create" => Some(Route::CreateEvent),
            "/dashboard/events/edit" => Some(Route::EditEvent),
            "/not-found" => Some(Route::NotFound),
            _ => None,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::CreateEvent => "/dashboard/events/create",
            Route::EditEvent => "/dashboard/events/edit",
            Route::NotFound => "/not-found",
        }
    }

    fn access(self) -> Access {
        match self {
            Route::Login | Route::Register | Route::Dashboard | Route::NotFound => Access::Public,
            Route::CreateEvent | Route::EditEvent => Access::Roles(&[Role::Admin]),
        }
    }

    fn is_guest_only(self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    fn entry() -> Self {
        Route::Dashboard
    }

    fn fallback() -> Self {
        Route::NotFound
    }

    fn home() -> Self {
        Route::Dashboard
    }

    fn login_redirect() -> Self {
        Route::NotFound
    }

    fn denied_redirect() -> Self {
        Route::NotFound
    }
}

impl Route {
    /// Link to the editor of a single event
    pub fn edit_href(id: &Id) -> String {
        format!("{}?id={id}", Route::EditEvent.href())
    }
}

/// Get the Axum router of the events app
pub fn router(client: Client, sessions: SessionLayer) -> Router {
    Router::new()
        .route("/events", get(show))
        .route("/events/", get(show))
        .route("/events/{*path}", get(show))
        .route("/events/login", get(show).post(handlers::login))
        .route("/events/register", get(show).post(handlers::register))
        .route("/events/logout", get(show).post(handlers::logout))
        .route(
            "/events/dashboard/events/create",
            get(show).post(handlers::create_event),
        )
        .route(
            "/events/dashboard/events/edit",
            get(show).post(handlers::edit_event),
        )
        .route(
            "/events/dashboard/events/delete",
            get(show).post(handlers::delete_event),
        )
        .route(
            "/events/dashboard/events/register",
            get(show).post(handlers::register_attendee),
        )
        .route(
            "/events/dashboard/events/unregister",
            get(show).post(handlers::unregister_attendee),
        )
        .layer(Extension(client))
        .layer(sessions)
}

/// Render any screen of the events app
///
/// Request:
/// ```sh
/// curl -v -b 'events_session=<session id>' http://localhost:6000/events/dashboard
/// ```
async fn show(Extension(client): Extension<Client>, session: Session, uri: Uri) -> Response {
    let location = Location::from_uri(&uri, Route::MOUNT);
    let user = session.get().await;

    let route = match router::resolve::<Route>(&location, user.as_ref().map(|user| user.role)) {
        Resolution::Render(route) => route,
        Resolution::Redirect(route) => return Redirect::to(&route.href()).into_response(),
    };

    let markup = match load(route, &location, &client, user.as_ref()).await {
        Ok(Screen::Page(markup)) => markup,
        Ok(Screen::Redirect(feedback)) => return feedback.send(&session).await.into_response(),
        Err(err) => {
            tracing::error!("Could not load {route:?}: {err}");

            session
                .flash(
                    FlashLevel::Danger,
                    "Could not load the events, please try again later",
                )
                .await;

            views::not_found()
        }
    };

    paint(&session, layout(user.as_ref()), markup)
        .await
        .into_response()
}

/// Data loading and markup per route
async fn load(
    route: Route,
    location: &Location,
    client: &Client,
    user: Option<&User>,
) -> client::Result<Screen> {
    let screen = match route {
        Route::Login => Screen::Page(views::login()),
        Route::Register => Screen::Page(views::register()),
        Route::NotFound => Screen::Page(views::not_found()),
        Route::Dashboard => {
            let events = client.list_events().await?;

            Screen::Page(views::dashboard(&events, user))
        }
        Route::CreateEvent => Screen::Page(views::create_event()),
        Route::EditEvent => {
            let Some(id) = location.id() else {
                return Ok(Screen::Redirect(Feedback::danger(
                    "No event selected for editing",
                    Route::Dashboard.href(),
                )));
            };

            match client.get_event(&id).await? {
                Some(event) => Screen::Page(views::edit_event(&event)),
                None => Screen::Redirect(Feedback::danger(
                    "Event not found",
                    Route::Dashboard.href(),
                )),
            }
        }
    };

    Ok(screen)
}

/// Navigation chrome, depends on the session
fn layout(user: Option<&User>) -> Layout {
    let mut nav = vec![NavItem::link(
        "Dashboard",
        Route::Dashboard.href(),
        "nav-link text-light",
    )];

    match user {
        Some(user) => {
            if user.is_admin() {
                nav.push(NavItem::link(
                    "Create event",
                    Route::CreateEvent.href(),
                    "nav-link text-light",
                ));
            }

            nav.push(NavItem::Text(format!(
                "Welcome, {} ({})",
                user.username,
                user.role.as_str()
            )));
            nav.push(NavItem::action(
                "Logout",
                format!("{}/logout", Route::MOUNT),
                "btn btn-outline-danger btn-sm",
            ));
        }
        None => {
            nav.push(NavItem::link("Login", Route::Login.href(), "nav-link text-light"));
            nav.push(NavItem::link(
                "Register",
                Route::Register.href(),
                "btn btn-primary btn-sm",
            ));
        }
    }

    Layout {
        title: "Events",
        brand_href: Route::Dashboard.href(),
        nav,
        footer: None,
    }
}
