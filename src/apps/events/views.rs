//! Screens of the events app

use crate::events::Event;
use crate::ids::Id;
use crate::router::RouteTable;
use crate::users::Role;
use crate::users::User;
use crate::views::escape;

use super::Route;

fn action(path: &str) -> String {
    format!("{}{path}", Route::MOUNT)
}

pub fn login() -> String {
    format!(
        r#"<div class="row justify-content-center mt-5">
<div class="col-md-6 col-lg-4">
<div class="card shadow-sm p-4">
<h2 class="text-center mb-4">Log in</h2>
<form id="loginForm" method="post" action="{action}">
<div class="mb-3"><label for="username" class="form-label">Username</label>
<input type="text" class="form-control" id="username" name="username" required></div>
<div class="mb-3"><label for="password" class="form-label">Password</label>
<input type="password" class="form-control" id="password" name="password" required></div>
<button type="submit" class="btn btn-primary w-100">Log in</button>
</form>
<p class="text-center mt-3">No account? <a href="{register}">Register here</a></p>
<p class="text-center"><a href="{dashboard}">Back to the dashboard</a></p>
</div>
</div>
</div>"#,
        action = Route::Login.href(),
        register = Route::Register.href(),
        dashboard = Route::Dashboard.href(),
    )
}

pub fn register() -> String {
    format!(
        r#"<div class="row justify-content-center mt-5">
<div class="col-md-6 col-lg-4">
<div class="card shadow-sm p-4">
<h2 class="text-center mb-4">Register</h2>
<form id="registerForm" method="post" action="{action}">
<div class="mb-3"><label for="regUsername" class="form-label">Username</label>
<input type="text" class="form-control" id="regUsername" name="username" required></div>
<div class="mb-3"><label for="regPassword" class="form-label">Password</label>
<input type="password" class="form-control" id="regPassword" name="password" required></div>
<div class="mb-3"><label for="regRole" class="form-label">Role</label>
<select class="form-select" id="regRole" name="role" required>
<option value="visitor">Visitor</option>
<option value="admin">Admin</option>
</select></div>
<button type="submit" class="btn btn-success w-100">Register</button>
</form>
<p class="text-center mt-3">Already registered? <a href="{login}">Log in</a></p>
</div>
</div>
</div>"#,
        action = Route::Register.href(),
        login = Route::Login.href(),
    )
}

/// All events, with actions depending on the role of the visitor
pub fn dashboard(events: &[Event], user: Option<&User>) -> String {
    let role = user.map(|user| user.role);

    let create = if role == Some(Role::Admin) {
        format!(
            r#"<div class="d-grid gap-2 mb-4"><a id="createEventBtn" class="btn btn-success btn-lg" href="{}">Create new event</a></div>"#,
            Route::CreateEvent.href()
        )
    } else {
        String::new()
    };

    let table = if events.is_empty() {
        String::from(
            r#"<div class="alert alert-info text-center" role="alert">No events available right now.</div>"#,
        )
    } else {
        let rows = events
            .iter()
            .map(|event| {
                let attending = user.is_some_and(|user| event.is_attending(&user.id));

                let badge = if attending {
                    r#"<span class="badge bg-success ms-2">Registered</span>"#
                } else {
                    ""
                };

                format!(
                    "<tr><td>{name}</td><td>{date}</td><td>{location}</td><td>{capacity}</td><td>{count} / {capacity}{badge}</td><td>{actions}</td></tr>",
                    name = escape(&event.name),
                    date = escape(&event.date),
                    location = escape(&event.location),
                    capacity = event.capacity,
                    count = event.attendee_count(),
                    actions = event_actions(event, role, attending),
                )
            })
            .collect::<String>();

        format!(
            r#"<div class="table-responsive"><table class="table table-striped table-hover align-middle">
<thead class="table-dark"><tr><th scope="col">Name</th><th scope="col">Date</th><th scope="col">Location</th><th scope="col">Capacity</th><th scope="col">Attendees</th><th scope="col">Actions</th></tr></thead>
<tbody>{rows}</tbody>
</table></div>"#
        )
    };

    let registrations = match user {
        Some(user) if user.role == Role::Visitor => my_registrations(events, user),
        _ => String::new(),
    };

    format!(
        r#"<h2 class="text-center mb-4 text-primary">Events dashboard</h2>
{create}
{table}
{registrations}"#
    )
}

/// Buttons of a single event row
fn event_actions(event: &Event, role: Option<Role>, attending: bool) -> String {
    match role {
        Some(Role::Admin) => format!(
            r#"<a class="btn btn-warning btn-sm me-2" href="{edit}">Edit</a>{delete}"#,
            edit = escape(&Route::edit_href(&event.id)),
            delete = post_button("/dashboard/events/delete", &event.id, "btn-danger", "Delete", false),
        ),
        Some(_) if attending => post_button(
            "/dashboard/events/unregister",
            &event.id,
            "btn-danger",
            "Cancel registration",
            false,
        ),
        Some(_) => post_button(
            "/dashboard/events/register",
            &event.id,
            "btn-primary",
            "Register",
            event.is_full(),
        ),
        None => format!(
            r#"<a class="btn btn-outline-primary btn-sm" href="{}">Log in to register</a>"#,
            Route::Login.href()
        ),
    }
}

/// Events the visitor is on the attendee list of
fn my_registrations(events: &[Event], user: &User) -> String {
    let rows = events
        .iter()
        .filter(|event| event.is_attending(&user.id))
        .map(|event| {
            format!(
                "<tr><td>{name}</td><td>{date}</td><td>{cancel}</td></tr>",
                name = escape(&event.name),
                date = escape(&event.date),
                cancel = post_button(
                    "/dashboard/events/unregister",
                    &event.id,
                    "btn-danger",
                    "Cancel registration",
                    false,
                ),
            )
        })
        .collect::<String>();

    if rows.is_empty() {
        return String::new();
    }

    format!(
        r#"<h3 class="text-center my-4 text-secondary">My registrations</h3>
<div class="table-responsive"><table id="myRegistrations" class="table table-striped table-hover align-middle">
<thead class="table-dark"><tr><th scope="col">Event</th><th scope="col">Date</th><th scope="col">Actions</th></tr></thead>
<tbody>{rows}</tbody>
</table></div>"#
    )
}

fn post_button(path: &str, id: &Id, class: &str, label: &str, disabled: bool) -> String {
    format!(
        r#"<form method="post" action="{action}" class="d-inline"><input type="hidden" name="id" value="{id}"><button type="submit" class="btn {class} btn-sm"{disabled}>{label}</button></form>"#,
        action = action(path),
        id = escape(&id.to_string()),
        disabled = if disabled { " disabled" } else { "" },
    )
}

pub fn create_event() -> String {
    event_form("Create new event", &Route::CreateEvent.href(), None)
}

pub fn edit_event(event: &Event) -> String {
    event_form("Edit event", &Route::EditEvent.href(), Some(event))
}

fn event_form(heading: &str, action: &str, event: Option<&Event>) -> String {
    let id = event.map(|event| event.id.to_string()).unwrap_or_default();
    let name = event.map(|event| event.name.as_str()).unwrap_or_default();
    let date = event.map(|event| event.date.as_str()).unwrap_or_default();
    let location = event.map(|event| event.location.as_str()).unwrap_or_default();
    let capacity = event
        .map(|event| event.capacity.to_string())
        .unwrap_or_default();

    format!(
        r#"<div class="row justify-content-center"><div class="col-md-8 col-lg-6">
<div class="card shadow-sm p-4">
<h2 class="text-center mb-4">{heading}</h2>
<form id="eventForm" method="post" action="{action}">
<input type="hidden" name="id" value="{id}">
<div class="mb-3"><label for="eventName" class="form-label">Name</label>
<input type="text" class="form-control" id="eventName" name="name" value="{name}" required></div>
<div class="mb-3"><label for="eventDate" class="form-label">Date</label>
<input type="date" class="form-control" id="eventDate" name="date" value="{date}" required></div>
<div class="mb-3"><label for="eventLocation" class="form-label">Location</label>
<input type="text" class="form-control" id="eventLocation" name="location" value="{location}" required></div>
<div class="mb-3"><label for="eventCapacity" class="form-label">Capacity</label>
<input type="number" class="form-control" id="eventCapacity" name="capacity" value="{capacity}" min="1" required></div>
<button type="submit" class="btn btn-primary w-100">Save</button>
</form>
<a class="btn btn-secondary w-100 mt-2" href="{cancel}">Cancel</a>
</div>
</div></div>"#,
        heading = escape(heading),
        action = escape(action),
        id = escape(&id),
        name = escape(name),
        date = escape(date),
        location = escape(location),
        capacity = escape(&capacity),
        cancel = Route::Dashboard.href(),
    )
}

/// Unknown screens and denied access look the same
pub fn not_found() -> String {
    format!(
        r#"<div class="row justify-content-center my-5 text-center"><div class="col-md-8 col-lg-6">
<div class="card shadow-lg p-5">
<h1 class="display-4 text-danger mb-3">404</h1>
<h2 class="mb-4 text-secondary">Page not found or access denied</h2>
<p class="lead mb-4">The page you are looking for does not exist or you are not allowed to see it.</p>
<a id="goToHomeBtn" class="btn btn-primary btn-lg" href="{home}">Back to the start</a>
</div>
</div></div>"#,
        home = Route::MOUNT,
    )
}
