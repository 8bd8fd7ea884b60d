//! Form submissions of the events app

use axum::Extension;
use axum::response::Redirect;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::apps::Feedback;
use crate::apps::Form;
use crate::apps::optional_id;
use crate::apps::present;
use crate::apps::respond;
use crate::client::Client;
use crate::events::EventValues;
use crate::events::RegistrationError;
use crate::ids::Id;
use crate::router::RouteTable;
use crate::session::Session;
use crate::users::CreateUserValues;
use crate::users::Role;
use crate::users::User;

use super::Route;

type Outcome = Result<Feedback, Feedback>;

/// Format of event dates, as sent by `<input type="date">`
const DATE_FORMAT: &str = "%Y-%m-%d";

async fn signed_in(session: &Session) -> Result<User, Feedback> {
    session
        .get()
        .await
        .ok_or_else(|| Feedback::warning("Please log in first", Route::Login.href()))
}

/// Event management is for admins only, everyone else sees the not-found screen
async fn signed_in_admin(session: &Session) -> Result<User, Feedback> {
    match session.get().await {
        Some(user) if user.is_admin() => Ok(user),
        Some(user) => {
            tracing::warn!("User `{}` tried to manage events", user.username);

            Err(Feedback::redirect(Route::NotFound.href()))
        }
        None => Err(Feedback::redirect(Route::NotFound.href())),
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Log in with the exact username and password
///
/// Request:
/// ```sh
/// curl -v -X POST -d 'username=ada&password=secret' http://localhost:6000/events/login
/// ```
pub async fn login(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Redirect {
    respond(try_login(&client, &session, form).await, &session).await
}

async fn try_login(client: &Client, session: &Session, form: LoginForm) -> Outcome {
    let back = Route::Login.href();

    let (Some(username), false) = (present(&form.username), form.password.is_empty()) else {
        return Err(Feedback::warning("Enter your username and password", back));
    };

    let mut users = client
        .find_users(&[("username", username), ("password", form.password.as_str())])
        .await
        .map_err(|err| Feedback::backend_failure("Could not log in", &err, back.clone()))?;

    // more than one match means the backend data is ambiguous, nobody gets in
    if users.len() != 1 {
        if users.len() > 1 {
            tracing::warn!("{} users match the credentials of `{username}`", users.len());
        }

        return Err(Feedback::danger("Invalid username or password", back));
    }

    let user = users.remove(0);

    tracing::debug!("User `{}` logged in to the events app", user.username);

    session.save(user).await;

    Ok(Feedback::success("Logged in", Route::Dashboard.href()))
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    role: String,
}

/// Register as a visitor or an admin
pub async fn register(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Redirect {
    respond(try_register(&client, form).await, &session).await
}

async fn try_register(client: &Client, form: RegisterForm) -> Outcome {
    let back = Route::Register.href();

    let (Some(username), false) = (present(&form.username), form.password.is_empty()) else {
        return Err(Feedback::warning("Fill in all fields", back));
    };

    let Some(role) = Role::parse(form.role.trim()).filter(|role| *role != Role::User) else {
        return Err(Feedback::warning("Choose either the visitor or the admin role", back));
    };

    let taken = client
        .find_users(&[("username", username)])
        .await
        .map_err(|err| Feedback::backend_failure("Could not register", &err, back.clone()))?;

    if !taken.is_empty() {
        return Err(Feedback::warning("The username is already taken", back));
    }

    let values = CreateUserValues {
        username,
        email: None,
        full_name: None,
        password: &form.password,
        role,
        registration_date: None,
    };

    let user = client
        .create_user(&values)
        .await
        .map_err(|err| Feedback::backend_failure("Could not register", &err, back))?;

    tracing::info!(
        "Registered {} `{}` with ID {}",
        user.role.as_str(),
        user.username,
        user.id
    );

    Ok(Feedback::success(
        "Registration successful, you can log in now",
        Route::Login.href(),
    ))
}

/// Forget the current user
pub async fn logout(session: Session) -> Redirect {
    if session.is_authenticated().await {
        session.clear().await;
    }

    Redirect::to(&Route::Login.href())
}

#[derive(Deserialize)]
pub struct EventForm {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<Id>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    capacity: String,
}

impl EventForm {
    /// Check all fields, capacity has to be a positive number
    fn values(&self) -> Option<EventValues> {
        let name = present(&self.name)?;
        let date = present(&self.date)?;
        let location = present(&self.location)?;

        NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;

        let capacity = self
            .capacity
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|capacity| *capacity > 0)?;

        Some(EventValues {
            name: name.to_string(),
            date: date.to_string(),
            location: location.to_string(),
            capacity,
        })
    }
}

const INVALID_EVENT: &str =
    "Fill in all fields correctly, the date as YYYY-MM-DD and a capacity above zero";

/// Create an event without attendees
///
/// Request:
/// ```sh
/// curl -v -b 'events_session=<session id>' -X POST \
///     -d 'name=Meetup&date=2025-07-20&location=Hall&capacity=50' \
///     http://localhost:6000/events/dashboard/events/create
/// ```
pub async fn create_event(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<EventForm>,
) -> Redirect {
    respond(try_create_event(&client, &session, form).await, &session).await
}

async fn try_create_event(client: &Client, session: &Session, form: EventForm) -> Outcome {
    let admin = signed_in_admin(session).await?;
    let back = Route::CreateEvent.href();

    let Some(values) = form.values() else {
        return Err(Feedback::warning(INVALID_EVENT, back));
    };

    let event = client
        .create_event(&values)
        .await
        .map_err(|err| Feedback::backend_failure("Could not create the event", &err, back))?;

    tracing::info!("Admin `{}` created event {}", admin.username, event.id);

    Ok(Feedback::success("Event created", Route::Dashboard.href()))
}

/// Change the details of an event, attendees stay registered
pub async fn edit_event(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<EventForm>,
) -> Redirect {
    respond(try_edit_event(&client, &session, form).await, &session).await
}

async fn try_edit_event(client: &Client, session: &Session, form: EventForm) -> Outcome {
    signed_in_admin(session).await?;
    let dashboard = Route::Dashboard.href();

    let Some(id) = form.id.clone() else {
        return Err(Feedback::danger("No event selected for editing", dashboard));
    };

    let back = Route::edit_href(&id);

    let Some(values) = form.values() else {
        return Err(Feedback::warning(INVALID_EVENT, back));
    };

    let mut event = client
        .get_event(&id)
        .await
        .map_err(|err| Feedback::backend_failure("Could not update the event", &err, back.clone()))?
        .ok_or_else(|| Feedback::danger("Event not found", dashboard.clone()))?;

    event.apply(&values);

    client
        .update_event(&event)
        .await
        .map_err(|err| Feedback::backend_failure("Could not update the event", &err, back))?;

    Ok(Feedback::success("Event updated", dashboard))
}

#[derive(Deserialize)]
pub struct IdForm {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<Id>,
}

/// Delete an event
pub async fn delete_event(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_delete_event(&client, &session, form).await, &session).await
}

async fn try_delete_event(client: &Client, session: &Session, form: IdForm) -> Outcome {
    let admin = signed_in_admin(session).await?;
    let dashboard = Route::Dashboard.href();

    let Some(id) = form.id else {
        return Err(Feedback::warning("Event not found", dashboard));
    };

    client.delete_event(&id).await.map_err(|err| {
        if err.is_not_found() {
            Feedback::warning("Event not found", dashboard.clone())
        } else {
            Feedback::backend_failure("Could not delete the event", &err, dashboard.clone())
        }
    })?;

    tracing::info!("Admin `{}` deleted event {id}", admin.username);

    Ok(Feedback::success("Event deleted", dashboard))
}

/// Registrations are for visitors, admins manage events instead
async fn signed_in_visitor(session: &Session) -> Result<User, Feedback> {
    let user = signed_in(session).await?;

    if user.is_admin() {
        return Err(Feedback::warning(
            "Admins can not register for events",
            Route::Dashboard.href(),
        ));
    }

    Ok(user)
}

/// Refusals are shown as they are, backend failures get a generic message
fn registration_failure(context: &str, err: &RegistrationError) -> Feedback {
    let dashboard = Route::Dashboard.href();

    match err {
        RegistrationError::Client(err) => Feedback::backend_failure(context, err, dashboard),
        RegistrationError::NotFound => Feedback::warning(err, dashboard),
        RegistrationError::Full
        | RegistrationError::AlreadyRegistered
        | RegistrationError::NotRegistered => {
            Feedback::danger(format!("{context}: {err}"), dashboard)
        }
    }
}

/// Register the visitor for an event
///
/// Request:
/// ```sh
/// curl -v -b 'events_session=<session id>' -X POST -d 'id=1' \
///     http://localhost:6000/events/dashboard/events/register
/// ```
pub async fn register_attendee(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_register_attendee(&client, &session, form).await, &session).await
}

async fn try_register_attendee(client: &Client, session: &Session, form: IdForm) -> Outcome {
    let user = signed_in_visitor(session).await?;

    let Some(id) = form.id else {
        return Err(Feedback::warning("Event not found", Route::Dashboard.href()));
    };

    let event = client
        .register_attendee(&id, &user)
        .await
        .map_err(|err| registration_failure("Could not register", &err))?;

    tracing::debug!("User `{}` registered for event {}", user.username, event.id);

    Ok(Feedback::success(
        format!("You are registered for {}", event.name),
        Route::Dashboard.href(),
    ))
}

/// Cancel the registration of the visitor
pub async fn unregister_attendee(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_unregister_attendee(&client, &session, form).await, &session).await
}

async fn try_unregister_attendee(client: &Client, session: &Session, form: IdForm) -> Outcome {
    let user = signed_in_visitor(session).await?;

    let Some(id) = form.id else {
        return Err(Feedback::warning("Event not found", Route::Dashboard.href()));
    };

    let event = client
        .unregister_attendee(&id, &user)
        .await
        .map_err(|err| registration_failure("Could not cancel the registration", &err))?;

    tracing::debug!("User `{}` left event {}", user.username, event.id);

    Ok(Feedback::success(
        "Your registration has been cancelled",
        Route::Dashboard.href(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(date: &str, capacity: &str) -> EventForm {
        EventForm {
            id: None,
            name: String::from(" Meetup "),
            date: date.to_string(),
            location: String::from("Hall"),
            capacity: capacity.to_string(),
        }
    }

    #[test]
    fn test_valid_event() {
        assert_eq!(
            Some(EventValues {
                name: String::from("Meetup"),
                date: String::from("2025-07-20"),
                location: String::from("Hall"),
                capacity: 50,
            }),
            form("2025-07-20", " 50 ").values()
        );
    }

    #[test]
    fn test_invalid_capacity() {
        for capacity in ["", "0", "-3", "many", "2.5"] {
            assert_eq!(None, form("2025-07-20", capacity).values(), "{capacity}");
        }
    }

    #[test]
    fn test_invalid_date() {
        for date in ["", "20-07-2025", "2025-13-01", "tomorrow"] {
            assert_eq!(None, form(date, "10").values(), "{date}");
        }
    }

    #[test]
    fn test_missing_name() {
        let mut form = form("2025-07-20", "10");
        form.name = String::from("   ");

        assert_eq!(None, form.values());
    }
}
