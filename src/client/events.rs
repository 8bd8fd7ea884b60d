use crate::events::CreateEventValues;
use crate::events::Event;
use crate::events::EventValues;
use crate::events::RegistrationError;
use crate::ids::Id;
use crate::users::EventRef;
use crate::users::User;

use super::Client;
use super::Collection;
use super::Result;

impl Client {
    /// Get all events
    pub async fn list_events(&self) -> Result<Vec<Event>> {
        self.fetch_all(Collection::Events, &[]).await
    }

    /// Get a single event
    pub async fn get_event(&self, id: &Id) -> Result<Option<Event>> {
        self.fetch_one(Collection::Events, id).await
    }

    /// Create an event without attendees
    pub async fn create_event(&self, values: &EventValues) -> Result<Event> {
        self.insert(
            Collection::Events,
            &CreateEventValues {
                values,
                registered_attendees: &[],
            },
        )
        .await
    }

    /// Replace an event with the given record
    pub async fn update_event(&self, event: &Event) -> Result<Event> {
        self.put(Collection::Events, &event.id, event).await
    }

    /// Delete an event
    pub async fn delete_event(&self, id: &Id) -> Result<()> {
        self.remove(Collection::Events, id).await
    }

    /// Register the user as an attendee of the event
    ///
    /// Not atomic: the capacity check and the write are separate requests, concurrent
    /// registrations can overbook the event
    pub async fn register_attendee(
        &self,
        event_id: &Id,
        user: &User,
    ) -> core::result::Result<Event, RegistrationError> {
        let mut event = self
            .get_event(event_id)
            .await?
            .ok_or(RegistrationError::NotFound)?;

        event.admit(user)?;

        let event = self.update_event(&event).await?;

        let event_ref = event.to_ref();
        self.sync_registered_events(&user.id, |events| {
            if !events.iter().any(|other| other.id == event_ref.id) {
                events.push(event_ref);
            }
        })
        .await;

        Ok(event)
    }

    /// Remove the user from the attendees of the event
    pub async fn unregister_attendee(
        &self,
        event_id: &Id,
        user: &User,
    ) -> core::result::Result<Event, RegistrationError> {
        let mut event = self
            .get_event(event_id)
            .await?
            .ok_or(RegistrationError::NotFound)?;

        event.dismiss(user)?;

        let event = self.update_event(&event).await?;

        self.sync_registered_events(&user.id, |events| {
            events.retain(|other| other.id != event.id);
        })
        .await;

        Ok(event)
    }

    /// Mirror a registration change on the user record
    ///
    /// The event is the source of truth, failures are only logged
    async fn sync_registered_events<F>(&self, user_id: &Id, change: F)
    where
        F: FnOnce(&mut Vec<EventRef>),
    {
        let mut user = match self.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("User {user_id} not found, registered events not updated");
                return;
            }
            Err(err) => {
                tracing::warn!("Could not fetch user {user_id}, registered events not updated: {err}");
                return;
            }
        };

        change(&mut user.registered_events);

        if let Err(err) = self.update_user(&user).await {
            tracing::warn!("Could not update registered events of user {user_id}: {err}");
        }
    }
}
