use std::collections::HashMap;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::COOKIE;
use axum::http::header::LOCATION;
use axum::http::header::SET_COOKIE;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::Service;

use crate::AppConfig;
use crate::client;
use crate::client::Client;
use crate::client::Memory;
use crate::events::EventValues;
use crate::setup_app;
use crate::users::CreateUserValues;
use crate::users::InitialAdmin;
use crate::users::Role;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "verysecret";

/// Direct access to the backends behind the apps
pub struct Backends {
    pub notes: Client,
    pub events: Client,
    pub crudnotas: Client,

    /// Raw records of the notes backend, as json-server would store them
    pub notes_store: Memory,
    pub crudnotas_store: Memory,
}

/// Setup all apps against in-memory backends
///
/// The notes backend gets the initial admin, the others start empty
pub async fn setup_test_app() -> (Router, Backends) {
    let notes_store = Memory::new();
    let crudnotas_store = Memory::new();

    let backends = Backends {
        notes: Client::new(notes_store.clone()),
        events: Client::memory(),
        crudnotas: Client::new(crudnotas_store.clone()),
        notes_store,
        crudnotas_store,
    };

    let config = AppConfig {
        notes: client::Config::ExistingClient(backends.notes.clone()),
        events: client::Config::ExistingClient(backends.events.clone()),
        crudnotas: client::Config::ExistingClient(backends.crudnotas.clone()),
        initial_admin: InitialAdmin {
            username: ADMIN_USERNAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        },
        session_idle: Duration::from_secs(60),
    };

    (setup_app(config).await.unwrap(), backends)
}

/// Response as seen by the browser
#[derive(Debug)]
pub struct Page {
    pub status_code: StatusCode,
    pub location: Option<String>,

    /// Raw `Set-Cookie` values
    pub cookies: Vec<String>,
    pub body: String,
}

impl Page {
    /// Assert a `303 See Other` and return where it points
    pub fn redirected_to(&self) -> &str {
        assert_eq!(StatusCode::SEE_OTHER, self.status_code, "{}", self.body);
        self.location.as_deref().unwrap()
    }
}

/// Carries cookies between requests like a browser
#[derive(Default)]
pub struct Browser {
    cookies: HashMap<String, String>,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&mut self, app: &mut Router, uri: &str) -> Page {
        let request = self
            .request(Method::GET, uri)
            .body(Body::empty())
            .unwrap();

        self.send(app, request).await
    }

    pub async fn post(&mut self, app: &mut Router, uri: &str, form: &[(&str, &str)]) -> Page {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();

        let request = self
            .request(Method::POST, uri)
            .header(CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
            .body(Body::from(body))
            .unwrap();

        self.send(app, request).await
    }

    /// Post a `multipart/form-data` body, files are `(name, file name, content type, bytes)`
    pub async fn post_multipart(
        &mut self,
        app: &mut Router,
        uri: &str,
        form: &[(&str, &str)],
        files: &[(&str, &str, &str, &[u8])],
    ) -> Page {
        const BOUNDARY: &str = "crudapps-test-boundary";

        let mut body = Vec::new();

        for (name, value) in form {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }

        for (name, file_name, content_type, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = self
            .request(Method::POST, uri)
            .header(
                CONTENT_TYPE,
                format!("{}; boundary={BOUNDARY}", mime::MULTIPART_FORM_DATA),
            )
            .body(Body::from(body))
            .unwrap();

        self.send(app, request).await
    }

    /// Follow a redirect and return the next screen
    pub async fn follow(&mut self, app: &mut Router, page: &Page) -> Page {
        let location = page.redirected_to().to_string();

        self.get(app, &location).await
    }

    fn request(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);

        if self.cookies.is_empty() {
            return builder;
        }

        let cookies = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        builder.header(COOKIE, cookies)
    }

    async fn send(&mut self, app: &mut Router, request: Request<Body>) -> Page {
        let response = app.call(request).await.unwrap();

        let status_code = response.status();
        let headers = response.headers();

        let mut cookies = Vec::new();

        for cookie in headers.get_all(SET_COOKIE) {
            let cookie = cookie.to_str().unwrap();
            let pair = cookie.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();

            // an empty value removes the cookie
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }

            cookies.push(cookie.to_string());
        }

        let location = headers.get(LOCATION);
        let location = location.map(|header| header.to_str().unwrap().to_string());

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&body[..]).to_string();

        Page {
            status_code,
            location,
            cookies,
            body,
        }
    }
}

/// Log in to the notes app, returns where the login went
pub async fn notes_login(
    app: &mut Router,
    browser: &mut Browser,
    identifier: &str,
    password: &str,
) -> String {
    browser
        .post(
            app,
            "/notes/login",
            &[("identifier", identifier), ("password", password)],
        )
        .await
        .redirected_to()
        .to_string()
}

/// Create a user with the `user` role straight in the notes backend
pub async fn create_notes_user(backends: &Backends, username: &str, password: &str) -> Value {
    let email = format!("{username}@example.com");

    let user = backends
        .notes
        .create_user(&CreateUserValues {
            username,
            email: Some(&email),
            full_name: None,
            password,
            role: Role::User,
            registration_date: None,
        })
        .await
        .unwrap();

    serde_json::to_value(user).unwrap()
}

/// Create a user straight in the events backend
pub async fn create_events_user(backends: &Backends, username: &str, role: &str) -> Value {
    let user = backends
        .events
        .create_user(&CreateUserValues {
            username,
            email: None,
            full_name: None,
            password: "secret",
            role: Role::parse(role).unwrap(),
            registration_date: None,
        })
        .await
        .unwrap();

    serde_json::to_value(user).unwrap()
}

/// Create an event straight in the events backend
pub async fn create_event(backends: &Backends, name: &str, capacity: u32) -> Value {
    let event = backends
        .events
        .create_event(&EventValues {
            name: name.to_string(),
            date: String::from("2025-07-20"),
            location: String::from("Main hall"),
            capacity,
        })
        .await
        .unwrap();

    serde_json::to_value(event).unwrap()
}

/// Textual ID of a stored record
pub fn id_of(record: &Value) -> String {
    match &record["id"] {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => panic!("Unexpected ID {other}"),
    }
}
