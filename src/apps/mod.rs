//! All app setup
//!
//! Three independent apps share one service, each mounted under its own prefix with its own
//! backend client and session store

use std::time::Duration;

use axum::Router;
use axum::response::Html;
use axum::routing::get;

use crate::client::Client;
use crate::router::RouteTable;
use crate::session;
use crate::session::Session;
use crate::views::Container;
use crate::views::Layout;
use crate::views::alerts;

pub use request::Form;
pub use request::Upload;
pub use request::UploadForm;
pub use request::optional_id;
pub use request::present;
pub use response::Error;
pub use response::Feedback;
pub use response::respond;

mod crudnotas;
mod events;
mod notes;
mod request;
mod response;

/// Minimum length of a new password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Dependencies of all apps
pub struct AppsConfig {
    pub notes: Client,
    pub events: Client,
    pub crudnotas: Client,

    /// How long sessions live without being used
    pub session_idle: Duration,
}

/// What the data-loading step of a route produced
pub enum Screen {
    /// Markup to paint
    Page(String),
    /// Go somewhere else instead
    Redirect(Feedback),
}

/// Get the Axum router for all apps
pub fn router(config: AppsConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(notes::router(
            config.notes,
            session::layer(notes::SESSION_COOKIE, notes::Route::MOUNT, config.session_idle),
        ))
        .merge(events::router(
            config.events,
            session::layer(events::SESSION_COOKIE, events::Route::MOUNT, config.session_idle),
        ))
        .merge(crudnotas::router(
            config.crudnotas,
            session::layer(crudnotas::SESSION_COOKIE, crudnotas::Route::MOUNT, config.session_idle),
        ))
}

/// Paint a screen with the pending messages on top and wrap it in the app chrome
async fn paint(session: &Session, layout: Layout, markup: String) -> Html<String> {
    let flashes = session.take_flashes().await;

    let mut container = Container::new();
    container.render_then(markup, |container| container.prepend(&alerts(&flashes)));

    Html(layout.render(&container))
}

/// Links to all apps
async fn index() -> Html<String> {
    let mut container = Container::new();
    container.render(format!(
        r#"<h1 class="mb-4">Apps</h1>
<div class="list-group">
<a class="list-group-item list-group-item-action" href="{notes}">Notes, with sharing and an admin panel</a>
<a class="list-group-item list-group-item-action" href="{events}">Events, with registrations</a>
<a class="list-group-item list-group-item-action" href="{crudnotas}">Crudnotas, a simple notes dashboard</a>
</div>"#,
        notes = notes::Route::entry().href(),
        events = events::Route::entry().href(),
        crudnotas = crudnotas::Route::entry().href(),
    ));

    let layout = Layout {
        title: "Apps",
        brand_href: String::from("/"),
        nav: Vec::new(),
        footer: None,
    };

    Html(layout.render(&container))
}
