//! App response helpers

use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;

use crate::client;
use crate::session::FlashLevel;
use crate::session::Session;
use crate::views::escape;

/// Outcome of a form submission: where to go next and what to tell the user
#[derive(Debug)]
pub struct Feedback {
    flash: Option<(FlashLevel, String)>,
    location: String,
}

impl Feedback {
    /// Go somewhere without a message
    pub fn redirect(location: String) -> Self {
        Self {
            flash: None,
            location,
        }
    }

    pub fn success<M>(message: M, location: String) -> Self
    where
        M: ToString,
    {
        Self::with_flash(FlashLevel::Success, message, location)
    }

    pub fn info<M>(message: M, location: String) -> Self
    where
        M: ToString,
    {
        Self::with_flash(FlashLevel::Info, message, location)
    }

    pub fn warning<M>(message: M, location: String) -> Self
    where
        M: ToString,
    {
        Self::with_flash(FlashLevel::Warning, message, location)
    }

    pub fn danger<M>(message: M, location: String) -> Self
    where
        M: ToString,
    {
        Self::with_flash(FlashLevel::Danger, message, location)
    }

    /// Log a backend failure, the user only gets a generic message
    pub fn backend_failure(context: &str, err: &client::Error, location: String) -> Self {
        tracing::error!("{context}: {err}");

        Self::danger(format!("{context}, please try again later"), location)
    }

    fn with_flash<M>(level: FlashLevel, message: M, location: String) -> Self
    where
        M: ToString,
    {
        Self {
            flash: Some((level, message.to_string())),
            location,
        }
    }

    /// Queue the message and redirect
    pub async fn send(self, session: &Session) -> Redirect {
        if let Some((level, message)) = self.flash {
            session.flash(level, message).await;
        }

        Redirect::to(&self.location)
    }
}

/// Both arms of a handler result end up as feedback
pub async fn respond(result: Result<Feedback, Feedback>, session: &Session) -> Redirect {
    match result {
        Ok(feedback) | Err(feedback) => feedback.send(session).await,
    }
}

/// Hold data for a failed request that can not be shown as a screen
#[derive(Debug)]
pub struct Error {
    status_code: StatusCode,
    message: String,
    description: Option<String>,
}

impl Error {
    pub fn bad_request<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn internal_server_error<M>(message: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn with_description<M>(&self, description: M) -> Self
    where
        M: ToString,
    {
        Self {
            status_code: self.status_code,
            message: self.message.clone(),
            description: Some(description.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            tracing::error!(
                "{}: {}",
                self.message,
                self.description.as_deref().unwrap_or_default()
            );
        }

        let description = self
            .description
            .map(|description| format!("<p>{}</p>", escape(&description)))
            .unwrap_or_default();

        (
            self.status_code,
            Html(format!(
                "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{status}</title></head><body><h1>{status}</h1><p>{message}</p>{description}</body></html>",
                status = self.status_code,
                message = escape(&self.message),
            )),
        )
            .into_response()
    }
}
