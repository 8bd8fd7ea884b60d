//! Crudnotas app
//!
//! A smaller notes app: personal notes plus notes other users flagged as shared

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
use crate::notes::NoteBoard;
use crate::router;
use crate::router::Access;
use crate::router::Location;
use crate::router::Resolution;
use crate::router::RouteTable;
use crate::session::FlashLevel;
use crate::session::Session;
use crate::session::SessionLayer;
use crate::users::User;
use crate::views::Layout;
use crate::views::NavItem;

use super::Feedback;
use super::Screen;
use super::paint;

mod handlers;
mod views;

/// Cookie holding the session ID of the crudnotas app
pub const SESSION_COOKIE: &str = "crudnotas_session";

/// Screens of the crudnotas app
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Index,
    Login,
    Register,
    Dashboard,
    /// Note editor, `?id=` selects an existing note
    Notes,
}

impl RouteTable for Route {
    const MOUNT: &'static str = "/crudnotas";

    fn parse(path: &str) -> Option<Self> {
        match path {
            "/index" => Some(Route::Index),
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            "/dashboard" => Some(Route::Dashboard),
            "/notes" => Some(Route::Notes),
            _ => None,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Route::Index => "/index",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::Notes => "/notes",
        }
    }

    fn access(self) -> Access {
        match self {
            Route::Index | Route::Login | Route::Register => Access::Public,
            Route::Dashboard | Route::Notes => Access::Authenticated,
        }
    }

    fn entry() -> Self {
        Route::Index
    }

    fn fallback() -> Self {
        Route::Index
    }

    fn home() -> Self {
        Route::Dashboard
    }

    fn login_redirect() -> Self {
        Route::Login
    }

    fn denied_redirect() -> Self {
        Route::Dashboard
    }
}

impl Route {
    /// Link to the editor of a single note
    pub fn note_href(id: &Id) -> String {
        format!("{}?id={id}", Route::Notes.href())
    }
}

/// Get the Axum router of the crudnotas app
pub fn router(client: Client, sessions: SessionLayer) -> Router {
    Router::new()
        .route("/crudnotas", get(show))
        .route("/crudnotas/", get(show))
        .route("/crudnotas/{*path}", get(show))
        .route("/crudnotas/login", get(show).post(handlers::login))
        .route("/crudnotas/register", get(show).post(handlers::register))
        .route("/crudnotas/logout", get(show).post(handlers::logout))
        .route("/crudnotas/notes", get(show).post(handlers::save_note))
        .route("/crudnotas/notes/delete", get(show).post(handlers::delete_note))
        .route("/crudnotas/notes/share", get(show).post(handlers::share_note))
        .layer(Extension(client))
        .layer(sessions)
}

/// Render any screen of the crudnotas app
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
                    "Could not load your notes, please try again later",
                )
                .await;

            String::new()
        }
    };

    paint(&session, layout(user.as_ref()), markup)
        .await
        .into_response()
}

async fn load(
    route: Route,
    location: &Location,
    client: &Client,
    user: Option<&User>,
) -> client::Result<Screen> {
    let screen = match (route, user) {
        (Route::Index, _) => Screen::Page(views::index()),
        (Route::Login, _) => Screen::Page(views::login()),
        (Route::Register, _) => Screen::Page(views::register()),
        (Route::Dashboard, Some(user)) => {
            let notes = client.list_notes().await?;

            Screen::Page(views::dashboard(
                user,
                &NoteBoard::from_shared_flag(notes, user),
            ))
        }
        (Route::Notes, Some(user)) => match location.id() {
            None => Screen::Page(views::editor(None, true)),
            Some(id) => match client.get_note(&id).await? {
                Some(note) if note.is_owned_by(user) => Screen::Page(views::editor(Some(&note), true)),
                Some(note) if note.shared => Screen::Page(views::editor(Some(&note), false)),
                Some(_) => {
                    tracing::warn!("User `{}` is not allowed to view note {id}", user.username);

                    Screen::Redirect(Feedback::warning(
                        "You do not have access to this note",
                        Route::Dashboard.href(),
                    ))
                }
                None => Screen::Redirect(Feedback::warning(
                    "Note not found",
                    Route::Dashboard.href(),
                )),
            },
        },
        (Route::Dashboard | Route::Notes, None) => {
            Screen::Redirect(Feedback::redirect(Route::login_redirect().href()))
        }
    };

    Ok(screen)
}

fn layout(user: Option<&User>) -> Layout {
    let nav = match user {
        Some(user) => vec![
            NavItem::Text(format!("Hello, {}", user.display_name())),
            NavItem::link("Dashboard", Route::Dashboard.href(), "nav-link text-light"),
            NavItem::action(
                "Logout",
                format!("{}/logout", Route::MOUNT),
                "btn btn-outline-light btn-sm",
            ),
        ],
        None => vec![
            NavItem::link("Sign in", Route::Login.href(), "nav-link text-light"),
            NavItem::link("Sign up", Route::Register.href(), "btn btn-light btn-sm"),
        ],
    };

    Layout {
        title: "Crudnotas",
        brand_href: if user.is_some() {
            Route::Dashboard.href()
        } else {
            Route::Index.href()
        },
        nav,
        footer: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::Role;

    fn resolve(path: &str, role: Option<Role>) -> Resolution<Route> {
        router::resolve(&Location::parse(path), role)
    }

    #[test]
    fn test_unknown_goes_to_index() {
        assert_eq!(Resolution::Redirect(Route::Index), resolve("", None));
        assert_eq!(Resolution::Redirect(Route::Index), resolve("/pages/dashboard.html", None));
    }

    #[test]
    fn test_notes_need_a_session() {
        assert_eq!(Resolution::Redirect(Route::Login), resolve("/dashboard", None));
        assert_eq!(Resolution::Redirect(Route::Login), resolve("/notes?id=3", None));
        assert_eq!(Resolution::Render(Route::Notes), resolve("/notes?id=3", Some(Role::User)));
    }
}
