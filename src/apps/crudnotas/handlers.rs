//! Form submissions of the crudnotas app

use axum::Extension;
use axum::response::Redirect;
use serde::Deserialize;

use crate::apps::Feedback;
use crate::apps::Form;
use crate::apps::MIN_PASSWORD_LENGTH;
use crate::apps::optional_id;
use crate::apps::present;
use crate::apps::respond;
use crate::client::Client;
use crate::ids::Id;
use crate::notes::FlaggedNoteValues;
use crate::notes::Note;
use crate::router::RouteTable;
use crate::session::Session;
use crate::users::PascalCaseUserValues;
use crate::users::User;

use super::Route;

type Outcome = Result<Feedback, Feedback>;

async fn signed_in(session: &Session) -> Result<User, Feedback> {
    session
        .get()
        .await
        .ok_or_else(|| Feedback::warning("Please sign in first", Route::Login.href()))
}

/// Fetch a note the user owns
async fn owned_note(client: &Client, user: &User, id: &Id, context: &str) -> Result<Note, Feedback> {
    let dashboard = Route::Dashboard.href();

    let note = client
        .get_note(id)
        .await
        .map_err(|err| Feedback::backend_failure(context, &err, dashboard.clone()))?
        .ok_or_else(|| Feedback::warning("Note not found", dashboard.clone()))?;

    if !note.is_owned_by(user) {
        tracing::warn!("User `{}` does not own note {id}", user.username);

        return Err(Feedback::warning("Only the owner can do that", dashboard));
    }

    Ok(note)
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    password: String,
}

/// Sign in with email or username
///
/// Request:
/// ```sh
/// curl -v -X POST -d 'identifier=ada@example.com&password=secret' \
///     http://localhost:6000/crudnotas/login
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

    let Some(identifier) = present(&form.identifier) else {
        return Err(Feedback::danger("Invalid credentials", back));
    };

    let user = client
        .list_users()
        .await
        .map_err(|err| Feedback::backend_failure("Could not sign in", &err, back.clone()))?
        .into_iter()
        .find(|user| user.has_credentials(identifier, &form.password))
        .ok_or_else(|| Feedback::danger("Invalid credentials", back))?;

    tracing::debug!("User `{}` signed in to the crudnotas app", user.username);

    session.save(user).await;

    Ok(Feedback::success("Login successful", Route::Dashboard.href()))
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Create an account and sign in right away
pub async fn register(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Redirect {
    respond(try_register(&client, &session, form).await, &session).await
}

async fn try_register(client: &Client, session: &Session, form: RegisterForm) -> Outcome {
    let back = Route::Register.href();

    let (Some(full_name), Some(email), Some(username), false) = (
        present(&form.full_name),
        present(&form.email),
        present(&form.username),
        form.password.is_empty(),
    ) else {
        return Err(Feedback::warning("Please fill in all fields", back));
    };

    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Feedback::warning(
            format!("The password needs at least {MIN_PASSWORD_LENGTH} characters"),
            back,
        ));
    }

    if !email.contains('@') {
        return Err(Feedback::warning("Please enter a valid email address", back));
    }

    let users = client
        .list_users()
        .await
        .map_err(|err| Feedback::backend_failure("Could not register", &err, back.clone()))?;

    if users
        .iter()
        .any(|user| user.is_identified_by(email) || user.username == username)
    {
        return Err(Feedback::warning("Email or username already exists", back));
    }

    let values = PascalCaseUserValues {
        full_name,
        email,
        username,
        password: &form.password,
    };

    let user = client
        .create_pascal_case_user(&values)
        .await
        .map_err(|err| Feedback::backend_failure("Could not register", &err, back))?;

    tracing::info!("Registered user `{}` with ID {}", user.username, user.id);

    let message = format!("Welcome, {}", user.display_name());
    session.save(user).await;

    Ok(Feedback::success(message, Route::Dashboard.href()))
}

/// Forget the current user
pub async fn logout(session: Session) -> Redirect {
    if session.is_authenticated().await {
        session.clear().await;
    }

    Redirect::to(&Route::Index.href())
}

#[derive(Deserialize)]
pub struct NoteForm {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<Id>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Create a note, or replace it when the form carries an ID
pub async fn save_note(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<NoteForm>,
) -> Redirect {
    respond(try_save_note(&client, &session, form).await, &session).await
}

async fn try_save_note(client: &Client, session: &Session, form: NoteForm) -> Outcome {
    let user = signed_in(session).await?;

    let back = form
        .id
        .as_ref()
        .map_or_else(|| Route::Notes.href(), Route::note_href);

    let (Some(title), Some(content)) = (present(&form.title), present(&form.content)) else {
        return Err(Feedback::warning(
            "Please complete both title and content",
            back,
        ));
    };

    if let Some(id) = &form.id {
        let note = owned_note(client, &user, id, "Could not save the note").await?;

        let values = FlaggedNoteValues {
            user_id: &user.id,
            title,
            content,
            shared: note.shared,
        };

        client
            .replace_flagged_note(id, &values)
            .await
            .map_err(|err| Feedback::backend_failure("Could not save the note", &err, back))?;

        Ok(Feedback::success("Note updated", Route::Dashboard.href()))
    } else {
        let values = FlaggedNoteValues {
            user_id: &user.id,
            title,
            content,
            shared: false,
        };

        let note = client
            .create_flagged_note(&values)
            .await
            .map_err(|err| Feedback::backend_failure("Could not save the note", &err, back))?;

        tracing::debug!("User `{}` created note {}", user.username, note.id);

        Ok(Feedback::success("Note created", Route::Dashboard.href()))
    }
}

#[derive(Deserialize)]
pub struct IdForm {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<Id>,
}

/// Delete a note of the current user
pub async fn delete_note(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_delete_note(&client, &session, form).await, &session).await
}

async fn try_delete_note(client: &Client, session: &Session, form: IdForm) -> Outcome {
    let user = signed_in(session).await?;
    let dashboard = Route::Dashboard.href();

    let Some(id) = form.id else {
        return Err(Feedback::warning("Note not found", dashboard));
    };

    owned_note(client, &user, &id, "Could not delete the note").await?;

    client.delete_note(&id).await.map_err(|err| {
        Feedback::backend_failure("Could not delete the note", &err, dashboard.clone())
    })?;

    Ok(Feedback::success("Note deleted", dashboard))
}

/// Make a note of the current user visible to everyone
pub async fn share_note(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_share_note(&client, &session, form).await, &session).await
}

async fn try_share_note(client: &Client, session: &Session, form: IdForm) -> Outcome {
    let user = signed_in(session).await?;

    let Some(id) = form.id else {
        return Err(Feedback::warning("Note not found", Route::Dashboard.href()));
    };

    owned_note(client, &user, &id, "Could not share the note").await?;

    let back = Route::note_href(&id);

    client
        .mark_note_shared(&id)
        .await
        .map_err(|err| Feedback::backend_failure("Could not share the note", &err, back.clone()))?;

    Ok(Feedback::success("Note shared", back))
}
