use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

use crate::client::Client;
use crate::ids::Id;
use crate::utils::env_var_or_else;

/// User roles
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manage users, all notes, subscriptions and events
    Admin,
    /// Manage own notes
    #[default]
    User,
    /// Register for events
    Visitor,
}

impl Role {
    /// Name of the role as stored in the backend
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Visitor => "visitor",
        }
    }

    /// Parse a role as submitted by a form
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "visitor" => Some(Role::Visitor),
            _ => None,
        }
    }
}

/// Short reference to an event a user registered for
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct EventRef {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
}

/// A user as stored in the backend
///
/// Passwords are stored and compared as plain text, the backend contract of all three apps
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(default, alias = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "FullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(alias = "Password")]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registered_events: Vec<EventRef>,
    /// Fields this app does not know about, kept as-is on updates
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Does the identifier match the username or the email address
    pub fn is_identified_by(&self, identifier: &str) -> bool {
        self.username == identifier || self.email.as_deref() == Some(identifier)
    }

    /// Do the credentials match exactly
    pub fn has_credentials(&self, identifier: &str, password: &str) -> bool {
        self.is_identified_by(identifier) && self.password == password
    }

    /// Name to greet the user with
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

/// Values to create a User
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserValues<'a> {
    pub username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<&'a str>,
    pub password: &'a str,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<DateTime<Utc>>,
}

/// Values to create a User in the PascalCase shape of the crudnotas backend
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PascalCaseUserValues<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Credentials of the admin to create when the notes app has none
#[derive(Clone, Debug)]
pub struct InitialAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl InitialAdmin {
    /// Read the initial admin from the environment, generating what is missing
    pub fn from_env() -> Self {
        let username = env_var_or_else("INITIAL_USERNAME", || {
            let initial_username = String::from("admin");
            tracing::info!("`INITIAL_USERNAME` not set, using: {initial_username}");
            initial_username
        });

        let email = env_var_or_else("INITIAL_EMAIL", || {
            let initial_email = String::from("admin@example.com");
            tracing::info!("`INITIAL_EMAIL` not set, using: {initial_email}");
            initial_email
        });

        let password = env_var_or_else("INITIAL_PASSWORD", || {
            let initial_password = generate_password();
            tracing::info!("`INITIAL_PASSWORD` not set, generating new password: {initial_password}");
            initial_password
        });

        Self {
            username,
            email,
            password,
        }
    }
}

/// Generate a throwaway password
fn generate_password() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// Make sure the backend has at least one admin
///
/// Registration only hands out the `user` role, without an admin the admin panel is
/// unreachable
pub async fn ensure_initial_admin(client: &Client, admin: &InitialAdmin) -> Result<()> {
    let users = client.list_users().await?;

    if users.iter().any(User::is_admin) {
        return Ok(());
    }

    if users
        .iter()
        .any(|user| user.is_identified_by(&admin.username) || user.is_identified_by(&admin.email))
    {
        tracing::warn!(
            "Initial admin `{}` exists without the admin role, not creating another one",
            admin.username
        );
        return Ok(());
    }

    let values = CreateUserValues {
        username: &admin.username,
        email: Some(&admin.email),
        full_name: None,
        password: &admin.password,
        role: Role::Admin,
        registration_date: Some(Utc::now()),
    };

    let user = client.create_user(&values).await?;

    tracing::info!("Created initial admin `{}` with ID {}", user.username, user.id);

    Ok(())
}
