//! Events and their attendees

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::client;
use crate::ids::Id;
use crate::users::EventRef;
use crate::users::User;

/// A user registered for an event
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub id: Id,
    #[serde(default)]
    pub username: String,
}

/// An event as stored in the backend
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub registered_attendees: Vec<Attendee>,
    /// Fields this app does not know about, kept as-is on updates
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reasons an (un)registration is refused
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Event not found")]
    NotFound,

    #[error("The event has reached its maximum capacity")]
    Full,

    #[error("You are already registered for this event")]
    AlreadyRegistered,

    #[error("You are not registered for this event")]
    NotRegistered,

    #[error(transparent)]
    Client(#[from] client::Error),
}

impl Event {
    pub fn attendee_count(&self) -> usize {
        self.registered_attendees.len()
    }

    pub fn is_full(&self) -> bool {
        self.attendee_count() >= self.capacity as usize
    }

    pub fn is_attending(&self, user_id: &Id) -> bool {
        self.registered_attendees
            .iter()
            .any(|attendee| &attendee.id == user_id)
    }

    /// Add the user to the attendee list
    ///
    /// Refused when the event is full or the user is already on the list, the list is left
    /// untouched in that case
    pub fn admit(&mut self, user: &User) -> Result<(), RegistrationError> {
        if self.is_full() {
            return Err(RegistrationError::Full);
        }

        if self.is_attending(&user.id) {
            return Err(RegistrationError::AlreadyRegistered);
        }

        self.registered_attendees.push(Attendee {
            id: user.id.clone(),
            username: user.username.clone(),
        });

        Ok(())
    }

    /// Remove the user from the attendee list
    pub fn dismiss(&mut self, user: &User) -> Result<(), RegistrationError> {
        if !self.is_attending(&user.id) {
            return Err(RegistrationError::NotRegistered);
        }

        self.registered_attendees
            .retain(|attendee| attendee.id != user.id);

        Ok(())
    }

    /// Reference stored on the user's side
    pub fn to_ref(&self) -> EventRef {
        EventRef {
            id: self.id.clone(),
            name: self.name.clone(),
            date: self.date.clone(),
        }
    }

    /// Apply edited details, attendees stay
    pub fn apply(&mut self, values: &EventValues) {
        self.name.clone_from(&values.name);
        self.date.clone_from(&values.date);
        self.location.clone_from(&values.location);
        self.capacity = values.capacity;
    }
}

/// Validated details of an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventValues {
    pub name: String,
    pub date: String,
    pub location: String,
    pub capacity: u32,
}

/// Values to create an Event
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventValues<'a> {
    #[serde(flatten)]
    pub values: &'a EventValues,
    pub registered_attendees: &'a [Attendee],
}
