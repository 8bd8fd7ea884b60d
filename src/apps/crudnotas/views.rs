//! Screens of the crudnotas app

use crate::notes::Note;
use crate::notes::NoteBoard;
use crate::router::RouteTable;
use crate::users::User;
use crate::views::escape;

use super::Route;

/// Length of the note excerpt on cards
const CARD_EXCERPT: usize = 40;

fn action(path: &str) -> String {
    format!("{}{path}", Route::MOUNT)
}

pub fn index() -> String {
    format!(
        r#"<div class="text-center my-5">
<h1 class="display-5 fw-bold">Crudnotas</h1>
<p class="lead mb-4">Write notes, keep them to yourself or share them with everyone.</p>
<a class="btn btn-primary btn-lg me-2" href="{login}">Sign in</a>
<a class="btn btn-outline-primary btn-lg" href="{register}">Create an account</a>
</div>"#,
        login = Route::Login.href(),
        register = Route::Register.href(),
    )
}

pub fn login() -> String {
    format!(
        r#"<div class="row justify-content-center mt-5"><div class="col-md-5">
<div class="card shadow-sm p-4">
<h2 class="text-center mb-4">Sign in</h2>
<form method="post" action="{action}">
<div class="mb-3"><label for="email" class="form-label">Email or username</label>
<input type="text" class="form-control" id="email" name="identifier" required></div>
<div class="mb-3"><label for="password" class="form-label">Password</label>
<input type="password" class="form-control" id="password" name="password" required></div>
<button type="submit" id="btnSignIn" class="btn btn-primary w-100">Sign in</button>
</form>
<p class="text-center mt-3"><a href="{register}">Create an account</a></p>
</div>
</div></div>"#,
        action = Route::Login.href(),
        register = Route::Register.href(),
    )
}

pub fn register() -> String {
    format!(
        r#"<div class="row justify-content-center mt-5"><div class="col-md-5">
<div class="card shadow-sm p-4">
<h2 class="text-center mb-4">Create an account</h2>
<form id="registerForm" method="post" action="{action}">
<div class="mb-3"><label for="FullName" class="form-label">Full name</label>
<input type="text" class="form-control" id="FullName" name="full_name" required></div>
<div class="mb-3"><label for="Email" class="form-label">Email</label>
<input type="email" class="form-control" id="Email" name="email" required></div>
<div class="mb-3"><label for="Username" class="form-label">Username</label>
<input type="text" class="form-control" id="Username" name="username" required></div>
<div class="mb-3"><label for="Password" class="form-label">Password</label>
<input type="password" class="form-control" id="Password" name="password" minlength="6" required></div>
<button type="submit" class="btn btn-primary w-100">Sign up</button>
</form>
<p class="text-center mt-3"><a href="{login}">I already have an account</a></p>
</div>
</div></div>"#,
        action = Route::Register.href(),
        login = Route::Login.href(),
    )
}

pub fn dashboard(user: &User, board: &NoteBoard) -> String {
    let personal: String = board.personal.iter().map(note_card).collect();
    let shared: String = board
        .shared
        .iter()
        .map(|shared| note_card(&shared.note))
        .collect();

    format!(
        r#"<div class="d-flex justify-content-between align-items-center mb-4">
<h1 id="userGreeting">Hello, {name}</h1>
<a class="btn btn-primary" href="{new_note}">New note</a>
</div>
<h4>My notes</h4>
<div id="personalNotes" class="row g-3 mb-4">{personal}</div>
<h4>Shared notes</h4>
<div id="sharedNotes" class="row g-3">{shared}</div>"#,
        name = escape(user.display_name()),
        new_note = Route::Notes.href(),
        personal = or_empty(personal, "You have no notes yet."),
        shared = or_empty(shared, "Nobody has shared a note yet."),
    )
}

fn or_empty(cards: String, message: &str) -> String {
    if cards.is_empty() {
        format!(r#"<p class="text-muted">{message}</p>"#)
    } else {
        cards
    }
}

fn note_card(note: &Note) -> String {
    format!(
        r#"<div class="col-md-3"><a class="text-reset text-decoration-none" href="{href}">
<div class="border rounded-3 p-3">
<h6 class="fw-bold mt-2">{title}</h6>
<small class="text-muted">{excerpt}</small>
</div>
</a></div>"#,
        href = escape(&Route::note_href(&note.id)),
        title = escape(&note.title),
        excerpt = escape(&note.excerpt(CARD_EXCERPT)),
    )
}

/// Note editor, `owned` notes can be saved, shared and deleted
pub fn editor(note: Option<&Note>, owned: bool) -> String {
    let id = note.map(|note| note.id.to_string()).unwrap_or_default();
    let title = note.map(|note| note.title.as_str()).unwrap_or_default();
    let content = note.map(|note| note.content.as_str()).unwrap_or_default();
    let disabled = if owned { "" } else { " disabled" };

    let save = if owned {
        r#"<button type="submit" id="saveBtn" class="btn btn-primary">Save</button>"#
    } else {
        ""
    };

    let note_actions = match note {
        Some(note) if owned => {
            let share = if note.shared {
                String::from(r#"<span class="badge bg-info">Shared</span>"#)
            } else {
                hidden_id_button("/notes/share", &id, "shareBtn", "btn-outline-secondary", "Share")
            };

            format!(
                r#"<div class="d-flex gap-2 mt-3">{share}{delete}</div>"#,
                delete = hidden_id_button("/notes/delete", &id, "deleteBtn", "btn-danger", "Delete"),
            )
        }
        Some(note) if note.shared => String::from(
            r#"<div class="mt-3"><span class="badge bg-info">Shared</span></div>"#,
        ),
        _ => String::new(),
    };

    format!(
        r#"<div class="card"><div class="card-body">
<h2 class="card-title">{heading}</h2>
<form method="post" action="{action}">
<input type="hidden" name="id" value="{id}">
<div class="mb-3"><label for="noteTitle" class="form-label">Title</label>
<input type="text" class="form-control" id="noteTitle" name="title" value="{title}" required{disabled}></div>
<div class="mb-3"><label for="noteContent" class="form-label">Content</label>
<textarea class="form-control" id="noteContent" name="content" rows="8" required{disabled}>{content}</textarea></div>
{save}
</form>
{note_actions}
<a class="btn btn-link mt-2" href="{back}">Back to the dashboard</a>
</div></div>"#,
        heading = if note.is_some() { "Note" } else { "New note" },
        action = Route::Notes.href(),
        id = escape(&id),
        title = escape(title),
        content = escape(content),
        back = Route::Dashboard.href(),
    )
}

fn hidden_id_button(path: &str, id: &str, element_id: &str, class: &str, label: &str) -> String {
    format!(
        r#"<form method="post" action="{action}"><input type="hidden" name="id" value="{id}"><button type="submit" id="{element_id}" class="btn {class}">{label}</button></form>"#,
        action = action(path),
        id = escape(id),
    )
}
