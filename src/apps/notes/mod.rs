//! Notes app
//!
//! Personal notes with images, shared with other users as read-only or editable, plus an admin
//! panel for users, notes and newsletter subscriptions

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
use crate::users::Role;
use crate::users::User;
use crate::views::Layout;
use crate::views::NavItem;

use super::Feedback;
use super::Screen;
use super::paint;

mod handlers;
mod views;

/// Cookie holding the session ID of the notes app
pub const SESSION_COOKIE: &str = "notes_session";

/// Screens of the notes app
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    Profile,
    Admin,
    /// View, edit or create a single note, `?id=` selects an existing one
    Note,
}

impl RouteTable for Route {
    const MOUNT: &'static str = "/notes";

    fn parse(path: &str) -> Option<Self> {
        match path {
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            "/home" => Some(Route::Home),
            "/profile" => Some(Route::Profile),
            "/admin" => Some(Route::Admin),
            "/note" => Some(Route::Note),
            _ => None,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Home => "/home",
            Route::Profile => "/profile",
            Route::Admin => "/admin",
            Route::Note => "/note",
        }
    }

    fn access(self) -> Access {
        match self {
            Route::Login | Route::Register => Access::Public,
            Route::Home | Route::Profile | Route::Note => Access::Authenticated,
            Route::Admin => Access::Roles(&[Role::Admin]),
        }
    }

    fn entry() -> Self {
        Route::Login
    }

    fn fallback() -> Self {
        Route::Login
    }

    fn home() -> Self {
        Route::Home
    }

    fn login_redirect() -> Self {
        Route::Login
    }

    fn denied_redirect() -> Self {
        Route::Home
    }
}

impl Route {
    /// Link to a single note
    pub fn note_href(id: &Id) -> String {
        format!("{}?id={id}", Route::Note.href())
    }
}

/// Get the Axum router of the notes app
pub fn router(client: Client, sessions: SessionLayer) -> Router {
    Router::new()
        .route("/notes", get(show))
        .route("/notes/", get(show))
        .route("/notes/{*path}", get(show))
        .route("/notes/login", get(show).post(handlers::login))
        .route("/notes/register", get(show).post(handlers::register))
        .route("/notes/logout", get(show).post(handlers::logout))
        .route("/notes/note", get(show).post(handlers::save_note))
        .route("/notes/note/delete", get(show).post(handlers::delete_note))
        .route("/notes/note/share", get(show).post(handlers::share_note))
        .route("/notes/note/remove-image", get(show).post(handlers::remove_image))
        .route("/notes/profile", get(show).post(handlers::change_password))
        .route("/notes/admin/users/delete", get(show).post(handlers::delete_user))
        .route(
            "/notes/admin/subscriptions/delete",
            get(show).post(handlers::delete_subscription),
        )
        .route(
            "/notes/admin/subscriptions/email",
            get(show).post(handlers::email_subscribers),
        )
        .route("/notes/subscribe", get(show).post(handlers::subscribe))
        .layer(Extension(client))
        .layer(sessions)
}

/// Render any screen of the notes app
///
/// Request:
/// ```sh
/// curl -v -b 'notes_session=<session id>' http://localhost:6000/notes/home
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
                    "Could not load the page, please try again later",
                )
                .await;

            String::new()
        }
    };

    paint(&session, layout(user.as_ref(), &location), markup)
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
    let screen = match (route, user) {
        (Route::Login, _) => Screen::Page(views::login()),
        (Route::Register, _) => Screen::Page(views::register()),
        (Route::Home, Some(user)) => {
            let notes = client.list_notes().await?;

            Screen::Page(views::home(&NoteBoard::from_share_entries(notes, user)))
        }
        (Route::Profile, Some(user)) => Screen::Page(views::profile(user)),
        (Route::Admin, Some(user)) => {
            let users = client.list_users().await?;
            let notes = client.list_notes().await?;
            let subscriptions = client.list_subscriptions().await?;

            Screen::Page(views::admin(user, &users, &notes, &subscriptions))
        }
        (Route::Note, Some(user)) => match location.id() {
            None => Screen::Page(views::note(None, true)),
            Some(id) => match client.get_note(&id).await? {
                Some(note) if note.can_view(user) => {
                    let editable = note.can_edit(user);

                    Screen::Page(views::note(Some(&note), editable))
                }
                Some(_) => {
                    tracing::warn!("User `{}` is not allowed to view note {id}", user.username);

                    Screen::Redirect(Feedback::warning(
                        "You do not have access to this note",
                        Route::Home.href(),
                    ))
                }
                None => Screen::Redirect(Feedback::warning(
                    "Note not found",
                    Route::Home.href(),
                )),
            },
        },
        (Route::Home | Route::Profile | Route::Admin | Route::Note, None) => {
            Screen::Redirect(Feedback::redirect(Route::login_redirect().href()))
        }
    };

    Ok(screen)
}

/// Navigation chrome, depends on the session
fn layout(user: Option<&User>, location: &Location) -> Layout {
    let mut nav = Vec::new();

    let brand_href = match user {
        Some(user) => {
            nav.push(NavItem::link("Home", Route::Home.href(), "nav-link text-light"));
            nav.push(NavItem::link(
                "Profile",
                Route::Profile.href(),
                "nav-link text-light",
            ));

            if user.is_admin() {
                nav.push(NavItem::link("Admin", Route::Admin.href(), "nav-link text-light"));
            }

            nav.push(NavItem::action(
                "Logout",
                format!("{}/logout", Route::MOUNT),
                "btn btn-outline-danger btn-sm",
            ));

            if user.is_admin() {
                Route::Admin.href()
            } else {
                Route::Home.href()
            }
        }
        None => {
            nav.push(NavItem::link("Login", Route::Login.href(), "nav-link text-light"));
            nav.push(NavItem::link(
                "Register",
                Route::Register.href(),
                "btn btn-primary btn-sm",
            ));

            Route::Login.href()
        }
    };

    Layout {
        title: "Notes",
        brand_href,
        nav,
        footer: Some(views::subscription_footer(location)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(path: &str, role: Option<Role>) -> Resolution<Route> {
        router::resolve(&Location::parse(path), role)
    }

    #[test]
    fn test_unknown_and_empty_go_to_login() {
        assert_eq!(Resolution::Redirect(Route::Login), resolve("", None));
        assert_eq!(Resolution::Redirect(Route::Login), resolve("/nope", Some(Role::User)));
    }

    #[test]
    fn test_guarded_routes_need_a_session() {
        for path in ["/home", "/profile", "/admin", "/note?id=1"] {
            assert_eq!(Resolution::Redirect(Route::Login), resolve(path, None), "{path}");
        }
    }

    #[test]
    fn test_admin_needs_admin_role() {
        assert_eq!(Resolution::Redirect(Route::Home), resolve("/admin", Some(Role::User)));
        assert_eq!(Resolution::Render(Route::Admin), resolve("/admin", Some(Role::Admin)));
    }

    #[test]
    fn test_login_renders_with_a_session() {
        assert_eq!(Resolution::Render(Route::Login), resolve("/login", Some(Role::User)));
    }

    #[test]
    fn test_paths_round_trip() {
        for route in [
            Route::Login,
            Route::Register,
            Route::Home,
            Route::Profile,
            Route::Admin,
            Route::Note,
        ] {
            assert_eq!(Some(route), Route::parse(route.path()));
        }
    }
}
