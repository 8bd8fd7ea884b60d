//! Screens of the notes app

use std::collections::HashMap;

use crate::ids::Id;
use crate::notes::Note;
use crate::notes::NoteBoard;
use crate::notes::Permission;
use crate::router::Location;
use crate::router::RouteTable;
use crate::subscriptions::Subscription;
use crate::users::User;
use crate::views::escape;

use super::Route;

const IMAGE_PLACEHOLDER: &str = "https://via.placeholder.com/150";

/// Length of the note excerpt on cards
const CARD_EXCERPT: usize = 100;

/// Length of the note excerpt in the admin panel
const ADMIN_EXCERPT: usize = 50;

fn action(path: &str) -> String {
    format!("{}{path}", Route::MOUNT)
}

pub fn login() -> String {
    format!(
        r#"<div class="row justify-content-center mt-5">
<div class="col-md-6 col-lg-5">
<div class="card shadow-sm"><div class="card-body p-4">
<h2 class="card-title text-center mb-4">Log in</h2>
<form id="login-form" method="post" action="{action}">
<div class="mb-3"><label for="login-identifier" class="form-label">Email or username</label>
<input type="text" class="form-control" id="login-identifier" name="identifier" required></div>
<div class="mb-3"><label for="login-password" class="form-label">Password</label>
<input type="password" class="form-control" id="login-password" name="password" required></div>
<button type="submit" class="btn btn-primary w-100">Log in</button>
</form>
<p class="mt-3 text-center">No account yet? <a href="{register}">Register here</a></p>
</div></div>
</div>
</div>"#,
        action = Route::Login.href(),
        register = Route::Register.href(),
    )
}

pub fn register() -> String {
    format!(
        r#"<div class="row justify-content-center mt-5">
<div class="col-md-6 col-lg-5">
<div class="card shadow-sm"><div class="card-body p-4">
<h2 class="card-title text-center mb-4">Register</h2>
<form id="register-form" method="post" action="{action}">
<div class="mb-3"><label for="register-username" class="form-label">Username</label>
<input type="text" class="form-control" id="register-username" name="username" required></div>
<div class="mb-3"><label for="register-email" class="form-label">Email</label>
<input type="email" class="form-control" id="register-email" name="email" required></div>
<div class="mb-3"><label for="register-password" class="form-label">Password</label>
<input type="password" class="form-control" id="register-password" name="password" required></div>
<button type="submit" class="btn btn-primary w-100">Register</button>
</form>
<p class="mt-3 text-center">Already registered? <a href="{login}">Log in</a></p>
</div></div>
</div>
</div>"#,
        action = Route::Register.href(),
        login = Route::Login.href(),
    )
}

pub fn home(board: &NoteBoard) -> String {
    let personal = if board.personal.is_empty() {
        String::from("<p>You have not created any notes yet.</p>")
    } else {
        board
            .personal
            .iter()
            .map(|note| note_card(note, None))
            .collect()
    };

    let shared = if board.shared.is_empty() {
        String::from("<p>Nobody has shared a note with you yet.</p>")
    } else {
        board
            .shared
            .iter()
            .map(|shared| note_card(&shared.note, Some(shared.permission)))
            .collect()
    };

    format!(
        r#"<div class="d-flex justify-content-between align-items-center mb-4">
<h1>My notes</h1>
<a class="btn btn-primary" href="{new_note}">Create note</a>
</div>
<h3>Personal</h3>
<div id="personal-notes-container" class="row g-4">{personal}</div>
<hr class="my-4">
<h3>Shared with me</h3>
<div id="shared-notes-container" class="row g-4">{shared}</div>"#,
        new_note = Route::Note.href(),
    )
}

/// Card of a single note, `permission` is set for notes shared with the user
fn note_card(note: &Note, permission: Option<Permission>) -> String {
    let image = note
        .image()
        .map(|image| {
            format!(
                r#"<img src="{}" class="card-img-top" alt="Note image" style="max-height: 200px; object-fit: cover;">"#,
                escape(image)
            )
        })
        .unwrap_or_default();

    let label = match permission {
        None | Some(Permission::Edit) => "View / Edit",
        Some(Permission::ReadOnly) => "View",
    };

    let owner_actions = if permission.is_none() {
        format!(
            r#"<form method="post" action="{delete}" class="d-inline"><input type="hidden" name="id" value="{id}"><button type="submit" class="btn btn-sm btn-danger">Delete</button></form>
<form method="post" action="{share}" class="mt-2 d-flex gap-1">
<input type="hidden" name="id" value="{id}">
<input type="text" class="form-control form-control-sm" name="identifier" placeholder="Email or username" required>
<select class="form-select form-select-sm" name="permission"><option value="readonly">readonly</option><option value="edit">edit</option></select>
<button type="submit" class="btn btn-sm btn-secondary">Share</button>
</form>"#,
            delete = action("/note/delete"),
            share = action("/note/share"),
            id = escape(&note.id.to_string()),
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="col-sm-6 col-lg-4">
<div class="card h-100 note-card shadow-sm">{image}
<div class="card-body d-flex flex-column">
<h5 class="card-title">{title}</h5>
<p class="card-text flex-grow-1">{excerpt}</p>
<div class="mt-auto">
<a class="btn btn-sm btn-info" href="{href}">{label}</a>
{owner_actions}
</div>
</div>
</div>
</div>"#,
        title = escape(&note.title),
        excerpt = escape(&note.excerpt(CARD_EXCERPT)),
        href = escape(&Route::note_href(&note.id)),
    )
}

/// Note editor, read-only when not `editable`, empty for a new note
pub fn note(note: Option<&Note>, editable: bool) -> String {
    let disabled = if editable { "" } else { " disabled" };

    let id = note.map(|note| note.id.to_string()).unwrap_or_default();
    let title = note.map(|note| note.title.as_str()).unwrap_or_default();
    let content = note.map(|note| note.content.as_str()).unwrap_or_default();
    let image = note.and_then(Note::image);

    // data URIs are too long for the input, they stay when the field is left empty
    let image_url = image
        .filter(|image| image.starts_with("http"))
        .unwrap_or_default();

    let save = if editable {
        r#"<button type="submit" class="btn btn-primary">Save</button>"#
    } else {
        ""
    };

    let remove_image = match (note, image, editable) {
        (Some(note), Some(_), true) => format!(
            r#"<form method="post" action="{action}" class="mt-2"><input type="hidden" name="id" value="{id}"><button type="submit" class="btn btn-sm btn-warning" id="btn-remove-image">Remove image</button></form>"#,
            action = action("/note/remove-image"),
            id = escape(&note.id.to_string()),
        ),
        _ => String::new(),
    };

    format!(
        r#"<div class="card"><div class="card-body">
<h2 class="card-title">{heading}</h2>
<form id="note-form" method="post" action="{action}" enctype="multipart/form-data">
<input type="hidden" id="note-id" name="id" value="{id}">
<div class="mb-3"><label for="note-title" class="form-label">Title</label>
<input type="text" class="form-control" id="note-title" name="title" value="{title}" required{disabled}></div>
<div class="mb-3"><label for="note-content" class="form-label">Content</label>
<textarea class="form-control" id="note-content" name="content" rows="5" required{disabled}>{content}</textarea></div>
<div class="mb-3"><label for="note-image-url" class="form-label">Image URL (optional)</label>
<input type="text" class="form-control" id="note-image-url" name="image_url" value="{image_url}" placeholder="https://example.com/image.jpg"{disabled}></div>
<div class="mb-3"><label for="note-image-file" class="form-label">Or upload an image</label>
<input type="file" class="form-control" id="note-image-file" name="image_file" accept="image/*"{disabled}></div>
<div class="mb-3 text-center"><img src="{preview}" id="note-image-preview" class="img-fluid rounded" style="max-height: 200px;" alt="Note image"></div>
{save}
</form>
{remove_image}
<a class="btn btn-link mt-2" href="{back}">Back</a>
</div></div>"#,
        heading = if note.is_some() { "Note" } else { "New note" },
        action = Route::Note.href(),
        id = escape(&id),
        title = escape(title),
        content = escape(content),
        image_url = escape(image_url),
        preview = escape(image.unwrap_or(IMAGE_PLACEHOLDER)),
        back = Route::Home.href(),
    )
}

pub fn profile(user: &User) -> String {
    let member_since = user
        .registration_date
        .map_or_else(|| String::from("Unknown"), |date| date.format("%Y-%m-%d").to_string());

    format!(
        r#"<div class="row justify-content-center"><div class="col-md-8">
<div class="card mb-4"><div class="card-body">
<h3 class="card-title text-center">My profile</h3>
<p class="fs-5"><strong>Username:</strong> {username}</p>
<p class="fs-5"><strong>Email:</strong> {email}</p>
<p class="fs-5"><strong>Member since:</strong> {member_since}</p>
</div></div>
<div class="card"><div class="card-body">
<h4 class="card-title text-center">Change password</h4>
<form id="change-password-form" method="post" action="{action}">
<div class="mb-3"><label for="profile-new-password" class="form-label">New password</label>
<input type="password" class="form-control" id="profile-new-password" name="password" required minlength="6"></div>
<button type="submit" class="btn btn-warning">Update password</button>
</form>
</div></div>
</div></div>"#,
        username = escape(&user.username),
        email = escape(user.email.as_deref().unwrap_or_default()),
        action = Route::Profile.href(),
    )
}

/// Admin panel: users, all notes and subscriptions
pub fn admin(
    current_user: &User,
    users: &[User],
    notes: &[Note],
    subscriptions: &[Subscription],
) -> String {
    let users_by_id = users
        .iter()
        .map(|user| (&user.id, user))
        .collect::<HashMap<&Id, &User>>();

    let username_of = |id: &Id| {
        users_by_id
            .get(id)
            .map_or("Unknown", |user| user.username.as_str())
    };

    let user_rows = users
        .iter()
        .map(|user| {
            let delete = if user.id == current_user.id {
                String::new()
            } else {
                delete_button("/admin/users/delete", &user.id)
            };

            format!(
                "<tr><td>{id}</td><td>{username}</td><td>{email}</td><td>{role}</td><td>{registered}</td><td>{delete}</td></tr>",
                id = escape(&user.id.to_string()),
                username = escape(&user.username),
                email = escape(user.email.as_deref().unwrap_or_default()),
                role = user.role.as_str(),
                registered = user
                    .registration_date
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            )
        })
        .collect::<String>();

    let note_rows = notes
        .iter()
        .map(|note| {
            let shared_with = if note.shared_with.is_empty() {
                String::from("Nobody")
            } else {
                note.shared_with
                    .iter()
                    .map(|share| format!("{} ({})", username_of(&share.user_id), share.permission))
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            format!(
                r#"<tr><td>{id}</td><td>{title}</td><td>{excerpt}</td><td>{owner}</td><td>{image}</td><td>{shared_with}</td><td><a class="btn btn-sm btn-info" href="{href}">View / Edit</a> {delete}</td></tr>"#,
                id = escape(&note.id.to_string()),
                title = escape(&note.title),
                excerpt = escape(&note.excerpt(ADMIN_EXCERPT)),
                owner = escape(note.owner_id.as_ref().map_or("Unknown", username_of)),
                image = if note.image().is_some() { "Yes" } else { "No" },
                shared_with = escape(&shared_with),
                href = escape(&Route::note_href(&note.id)),
                delete = delete_button("/note/delete", &note.id),
            )
        })
        .collect::<String>();

    let subscription_rows = if subscriptions.is_empty() {
        String::from(r#"<tr><td colspan="3" class="text-center">No subscriptions yet.</td></tr>"#)
    } else {
        subscriptions
            .iter()
            .map(|subscription| {
                format!(
                    "<tr><td>{id}</td><td>{email}</td><td>{delete}</td></tr>",
                    id = escape(&subscription.id.to_string()),
                    email = escape(&subscription.email),
                    delete = delete_button("/admin/subscriptions/delete", &subscription.id),
                )
            })
            .collect()
    };

    format!(
        r#"<h1 class="mb-4">Admin panel</h1>
<div class="row g-4 mb-4">
<div class="col-md-6"><div class="card text-white bg-primary h-100"><div class="card-body text-center"><h4 class="card-title">Total users</h4><p class="display-4" id="total-users">{user_count}</p></div></div></div>
<div class="col-md-6"><div class="card text-white bg-success h-100"><div class="card-body text-center"><h4 class="card-title">Total notes</h4><p class="display-4" id="total-notes">{note_count}</p></div></div></div>
</div>
<h2 class="mt-5 mb-3">Users</h2>
<div class="table-responsive mb-4"><table class="table table-striped table-hover">
<thead><tr><th>ID</th><th>Username</th><th>Email</th><th>Role</th><th>Registered</th><th>Actions</th></tr></thead>
<tbody>{user_rows}</tbody>
</table></div>
<h2 class="mt-5 mb-3">All notes</h2>
<div class="table-responsive mb-4"><table class="table table-striped table-hover">
<thead><tr><th>ID</th><th>Title</th><th>Content</th><th>Owner</th><th>Image</th><th>Shared with</th><th>Actions</th></tr></thead>
<tbody>{note_rows}</tbody>
</table></div>
<h2 class="mt-5 mb-3">Subscriptions</h2>
<div class="d-flex justify-content-end mb-3">
<form method="post" action="{email_action}"><button type="submit" class="btn btn-success">Email subscribers</button></form>
</div>
<div class="table-responsive mb-4"><table class="table table-striped table-hover">
<thead><tr><th>ID</th><th>Email</th><th>Actions</th></tr></thead>
<tbody>{subscription_rows}</tbody>
</table></div>"#,
        user_count = users.len(),
        note_count = notes.len(),
        email_action = action("/admin/subscriptions/email"),
    )
}

fn delete_button(path: &str, id: &Id) -> String {
    format!(
        r#"<form method="post" action="{action}" class="d-inline"><input type="hidden" name="id" value="{id}"><button type="submit" class="btn btn-sm btn-danger">Delete</button></form>"#,
        action = action(path),
        id = escape(&id.to_string()),
    )
}

/// Newsletter form below every screen
pub fn subscription_footer(location: &Location) -> String {
    format!(
        r#"<footer class="container mt-5 mb-4 border-top pt-4">
<form id="subscription-form" method="post" action="{action}" class="row g-2 justify-content-center">
<input type="hidden" name="return_to" value="{return_to}">
<div class="col-auto"><input type="email" class="form-control" id="sub-email" name="email" placeholder="Your email" required></div>
<div class="col-auto"><button type="submit" class="btn btn-outline-primary">Subscribe</button></div>
</form>
</footer>"#,
        action = action("/subscribe"),
        return_to = escape(location.path()),
    )
}
