//! Form submissions of the notes app

use axum::Extension;
use axum::response::Redirect;
use chrono::Utc;
use serde::Deserialize;
use url::Url;

use crate::apps::Feedback;
use crate::apps::Form;
use crate::apps::MIN_PASSWORD_LENGTH;
use crate::apps::Upload;
use crate::apps::UploadForm;
use crate::apps::optional_id;
use crate::apps::present;
use crate::apps::respond;
use crate::client::Client;
use crate::ids::Id;
use crate::notes::CreateNoteValues;
use crate::notes::Note;
use crate::notes::Permission;
use crate::notes::ShareOutcome;
use crate::notes::check_share_target;
use crate::router::RouteTable;
use crate::session::Session;
use crate::users::CreateUserValues;
use crate::users::Role;
use crate::users::User;

use super::Route;

type Outcome = Result<Feedback, Feedback>;

/// The user of the session, or a trip to the login screen
async fn signed_in(session: &Session) -> Result<User, Feedback> {
    session
        .get()
        .await
        .ok_or_else(|| Feedback::warning("Please log in first", Route::Login.href()))
}

/// The admin of the session, or a trip home
async fn signed_in_admin(session: &Session) -> Result<User, Feedback> {
    let user = signed_in(session).await?;

    if user.is_admin() {
        Ok(user)
    } else {
        tracing::warn!("User `{}` tried an admin action", user.username);

        Err(Feedback::warning(
            "Only admins can do that",
            Route::Home.href(),
        ))
    }
}

/// Fetch a note, missing notes go back home
async fn fetch_note(client: &Client, id: &Id, home: Route) -> Result<Note, Feedback> {
    client
        .get_note(id)
        .await
        .map_err(|err| Feedback::backend_failure("Could not load the note", &err, home.href()))?
        .ok_or_else(|| Feedback::warning("Note not found", home.href()))
}

/// Where to go after a change to a note
fn landing(user: &User) -> Route {
    if user.is_admin() {
        Route::Admin
    } else {
        Route::Home
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    password: String,
}

/// Log in with username or email
///
/// Request:
/// ```sh
/// curl -v -X POST -d 'identifier=admin&password=verysecret' http://localhost:6000/notes/login
/// ```
pub async fn login(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Redirect {
    respond(try_login(&client, &session, form).await, &session).await
}

async fn try_login(client: &Client, session: &Session, form: LoginForm) -> Outcome {
    let (Some(identifier), false) = (present(&form.identifier), form.password.is_empty()) else {
        return Err(Feedback::warning(
            "Fill in your username or email and password",
            Route::Login.href(),
        ));
    };

    let user = client
        .list_users()
        .await
        .map_err(|err| Feedback::backend_failure("Could not log in", &err, Route::Login.href()))?
        .into_iter()
        .find(|user| user.has_credentials(identifier, &form.password))
        .ok_or_else(|| Feedback::danger("Invalid credentials", Route::Login.href()))?;

    tracing::debug!("User `{}` logged in to the notes app", user.username);

    let landing = landing(&user);
    session.save(user).await;

    Ok(Feedback::redirect(landing.href()))
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Register a new user with the `user` role
pub async fn register(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Redirect {
    respond(try_register(&client, form).await, &session).await
}

async fn try_register(client: &Client, form: RegisterForm) -> Outcome {
    let back = Route::Register.href();

    let (Some(username), Some(email), false) = (
        present(&form.username),
        present(&form.email),
        form.password.is_empty(),
    ) else {
        return Err(Feedback::warning("Fill in all fields", back));
    };

    let users = client
        .list_users()
        .await
        .map_err(|err| Feedback::backend_failure("Could not register", &err, back.clone()))?;

    if users
        .iter()
        .any(|user| user.username == username || user.email.as_deref() == Some(email))
    {
        return Err(Feedback::warning(
            "The username or email address is already registered",
            back,
        ));
    }

    let values = CreateUserValues {
        username,
        email: Some(email),
        full_name: None,
        password: &form.password,
        role: Role::User,
        registration_date: Some(Utc::now()),
    };

    let user = client
        .create_user(&values)
        .await
        .map_err(|err| Feedback::backend_failure("Could not register", &err, back))?;

    tracing::info!("Registered user `{}` with ID {}", user.username, user.id);

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
pub struct NoteForm {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<Id>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    image_url: String,
}

/// Image of the form: an http(s) URL or an inlined data URI
fn parse_image(image_url: &str) -> Result<Option<&str>, ()> {
    let Some(image_url) = present(image_url) else {
        return Ok(None);
    };

    match Url::parse(image_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "data") => Ok(Some(image_url)),
        _ => Err(()),
    }
}

/// Image to store, an uploaded image wins over the URL field
fn pick_image(upload: Option<&Upload>, image_url: &str) -> Result<Option<String>, &'static str> {
    match upload {
        Some(upload) => upload
            .image_data_uri()
            .map(Some)
            .ok_or("The uploaded file must be an image"),
        None => parse_image(image_url)
            .map(|image_url| image_url.map(ToString::to_string))
            .map_err(|()| "The image must be an http(s) URL or a data URI"),
    }
}

/// Create a note, or update it when the form carries an ID
///
/// The editor posts `multipart/form-data` so an image file can come along in `image_file`.
///
/// Request:
/// ```sh
/// curl -v -b 'notes_session=<session id>' -F id= -F title=A -F content=B -F image_url= \
///     -F image_file=@cat.png http://localhost:6000/notes/note
/// ```
pub async fn save_note(
    Extension(client): Extension<Client>,
    session: Session,
    form: UploadForm<NoteForm>,
) -> Redirect {
    respond(try_save_note(&client, &session, form).await, &session).await
}

async fn try_save_note(
    client: &Client,
    session: &Session,
    UploadForm { fields: form, files }: UploadForm<NoteForm>,
) -> Outcome {
    let user = signed_in(session).await?;

    let back = form
        .id
        .as_ref()
        .map_or_else(|| Route::Note.href(), Route::note_href);

    let (Some(title), Some(content)) = (present(&form.title), present(&form.content)) else {
        return Err(Feedback::warning("Title and content are required", back));
    };

    let image_url = pick_image(files.get("image_file"), &form.image_url)
        .map_err(|message| Feedback::warning(message, back.clone()))?;

    if let Some(id) = form.id {
        let mut note = fetch_note(client, &id, Route::Home).await?;

        if !note.can_edit(&user) {
            tracing::warn!("User `{}` is not allowed to edit note {id}", user.username);

            return Err(Feedback::warning(
                "You are not allowed to edit this note",
                Route::Home.href(),
            ));
        }

        title.clone_into(&mut note.title);
        content.clone_into(&mut note.content);

        // an empty image field keeps the current image, removing is a separate action
        if image_url.is_some() {
            note.image_url = image_url;
        }

        client.update_note(&note).await.map_err(|err| {
            Feedback::backend_failure("Could not save the note", &err, back.clone())
        })?;

        Ok(Feedback::success("Note updated", landing_for(&note, &user)))
    } else {
        let values = CreateNoteValues {
            title,
            content,
            owner_id: &user.id,
            image_url: image_url.as_deref(),
            shared_with: &[],
            shared: false,
        };

        let note = client
            .create_note(&values)
            .await
            .map_err(|err| Feedback::backend_failure("Could not save the note", &err, back))?;

        tracing::debug!("User `{}` created note {}", user.username, note.id);

        Ok(Feedback::success("Note created", Route::Home.href()))
    }
}

/// Owners go home, admins working on notes of others go back to the admin panel
fn landing_for(note: &Note, user: &User) -> String {
    if note.is_owned_by(user) {
        Route::Home.href()
    } else {
        landing(user).href()
    }
}

#[derive(Deserialize)]
pub struct IdForm {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<Id>,
}

/// Delete a note, only for its owner or an admin
pub async fn delete_note(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_delete_note(&client, &session, form).await, &session).await
}

async fn try_delete_note(client: &Client, session: &Session, form: IdForm) -> Outcome {
    let user = signed_in(session).await?;
    let home = landing(&user);

    let Some(id) = form.id else {
        return Err(Feedback::warning("Note not found", home.href()));
    };

    let note = fetch_note(client, &id, home).await?;

    if !note.is_owned_by(&user) && !user.is_admin() {
        tracing::warn!("User `{}` is not allowed to delete note {id}", user.username);

        return Err(Feedback::warning(
            "Only the owner can delete this note",
            Route::Home.href(),
        ));
    }

    let landing = landing_for(&note, &user);

    client
        .delete_note(&id)
        .await
        .map_err(|err| Feedback::backend_failure("Could not delete the note", &err, landing.clone()))?;

    Ok(Feedback::success("Note deleted", landing))
}

#[derive(Deserialize)]
pub struct ShareForm {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<Id>,
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    permission: String,
}

/// Share a note with another user, sharing again replaces the permission
///
/// Request:
/// ```sh
/// curl -v -b 'notes_session=<session id>' -X POST -d 'id=1&identifier=ada&permission=edit' \
///     http://localhost:6000/notes/note/share
/// ```
pub async fn share_note(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<ShareForm>,
) -> Redirect {
    respond(try_share_note(&client, &session, form).await, &session).await
}

async fn try_share_note(client: &Client, session: &Session, form: ShareForm) -> Outcome {
    let user = signed_in(session).await?;
    let home = Route::Home.href();

    let Some(identifier) = present(&form.identifier) else {
        return Err(Feedback::warning(
            "Enter the email or username to share with",
            home,
        ));
    };

    let Some(id) = form.id else {
        return Err(Feedback::warning("Note not found", home));
    };

    let target = client
        .find_user_by_identifier(identifier)
        .await
        .map_err(|err| Feedback::backend_failure("Could not share the note", &err, home.clone()))?;

    let target_id = check_share_target(&user, target.as_ref())
        .map_err(|err| Feedback::warning(err, home.clone()))?;

    let permission = form
        .permission
        .parse::<Permission>()
        .map_err(|err| Feedback::warning(err, home.clone()))?;

    let mut note = fetch_note(client, &id, Route::Home).await?;

    if !note.is_owned_by(&user) {
        return Err(Feedback::warning("Only the owner can share this note", home));
    }

    let outcome = note.share_with(target_id, permission);

    client
        .update_note(&note)
        .await
        .map_err(|err| Feedback::backend_failure("Could not share the note", &err, home.clone()))?;

    let username = target.map(|target| target.username).unwrap_or_default();

    let message = match outcome {
        ShareOutcome::Added => format!("Note shared with {username} with {permission} permission"),
        ShareOutcome::Updated => {
            format!("Permission of {username} on this note changed to {permission}")
        }
    };

    Ok(Feedback::success(message, home))
}

/// Remove the image of a note
pub async fn remove_image(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_remove_image(&client, &session, form).await, &session).await
}

async fn try_remove_image(client: &Client, session: &Session, form: IdForm) -> Outcome {
    let user = signed_in(session).await?;

    let Some(id) = form.id else {
        return Err(Feedback::warning("Note not found", Route::Home.href()));
    };

    let mut note = fetch_note(client, &id, Route::Home).await?;
    let back = Route::note_href(&id);

    if !note.can_edit(&user) {
        return Err(Feedback::warning(
            "You are not allowed to edit this note",
            Route::Home.href(),
        ));
    }

    note.image_url = None;

    client
        .update_note(&note)
        .await
        .map_err(|err| Feedback::backend_failure("Could not remove the image", &err, back.clone()))?;

    Ok(Feedback::success("Image removed", back))
}

#[derive(Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    password: String,
}

/// Change the password of the current user
pub async fn change_password(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<PasswordForm>,
) -> Redirect {
    respond(try_change_password(&client, &session, form).await, &session).await
}

async fn try_change_password(client: &Client, session: &Session, form: PasswordForm) -> Outcome {
    let user = signed_in(session).await?;
    let back = Route::Profile.href();

    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Feedback::warning(
            format!("The new password needs at least {MIN_PASSWORD_LENGTH} characters"),
            back,
        ));
    }

    // the stored record can be newer than the one in the session
    let mut current = client
        .get_user(&user.id)
        .await
        .map_err(|err| Feedback::backend_failure("Could not update the password", &err, back.clone()))?
        .unwrap_or(user);

    current.password = form.password;

    let updated = client
        .update_user(&current)
        .await
        .map_err(|err| Feedback::backend_failure("Could not update the password", &err, back.clone()))?;

    session.save(updated).await;

    Ok(Feedback::success("Password updated", back))
}

/// Delete a user from the admin panel, never the admin themselves
pub async fn delete_user(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_delete_user(&client, &session, form).await, &session).await
}

async fn try_delete_user(client: &Client, session: &Session, form: IdForm) -> Outcome {
    let admin = signed_in_admin(session).await?;
    let back = Route::Admin.href();

    let Some(id) = form.id else {
        return Err(Feedback::warning("User not found", back));
    };

    if id == admin.id {
        return Err(Feedback::warning(
            "You can not delete your own admin account",
            back,
        ));
    }

    client.delete_user(&id).await.map_err(|err| {
        if err.is_not_found() {
            Feedback::warning("User not found", back.clone())
        } else {
            Feedback::backend_failure("Could not delete the user", &err, back.clone())
        }
    })?;

    tracing::info!("Admin `{}` deleted user {id}", admin.username);

    Ok(Feedback::success("User deleted", back))
}

/// Delete a subscription from the admin panel
pub async fn delete_subscription(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<IdForm>,
) -> Redirect {
    respond(try_delete_subscription(&client, &session, form).await, &session).await
}

async fn try_delete_subscription(client: &Client, session: &Session, form: IdForm) -> Outcome {
    signed_in_admin(session).await?;
    let back = Route::Admin.href();

    let Some(id) = form.id else {
        return Err(Feedback::warning("Subscription not found", back));
    };

    client.delete_subscription(&id).await.map_err(|err| {
        Feedback::backend_failure("Could not delete the subscription", &err, back.clone())
    })?;

    Ok(Feedback::success("Subscription deleted", back))
}

/// Email all subscribers, not available without a mail service
pub async fn email_subscribers(session: Session) -> Redirect {
    let outcome = signed_in_admin(&session).await.map(|_| {
        Feedback::info(
            "Emailing subscribers is not available, it needs a mail service",
            Route::Admin.href(),
        )
    });

    respond(outcome, &session).await
}

#[derive(Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    return_to: String,
}

/// Subscribe to the newsletter, open to everyone
pub async fn subscribe(
    Extension(client): Extension<Client>,
    session: Session,
    Form(form): Form<SubscribeForm>,
) -> Redirect {
    respond(try_subscribe(&client, form).await, &session).await
}

async fn try_subscribe(client: &Client, form: SubscribeForm) -> Outcome {
    // only screens of this app are valid targets
    let back = Route::parse(&form.return_to)
        .unwrap_or_else(Route::entry)
        .href();

    let Some(email) = present(&form.email).filter(|email| email.contains('@')) else {
        return Err(Feedback::warning("Enter a valid email address", back));
    };

    client.add_subscription(email).await.map_err(|err| {
        Feedback::backend_failure("Could not process your subscription", &err, back.clone())
    })?;

    Ok(Feedback::success(
        "Thanks for subscribing, your email has been registered",
        back,
    ))
}
