use serde_json::json;

use crate::ids::Id;
use crate::notes::CreateNoteValues;
use crate::notes::FlaggedNoteValues;
use crate::notes::Note;

use super::Client;
use super::Collection;
use super::Result;

impl Client {
    /// Get all notes
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        self.fetch_all(Collection::Notes, &[]).await
    }

    /// Get a single note
    pub async fn get_note(&self, id: &Id) -> Result<Option<Note>> {
        self.fetch_one(Collection::Notes, id).await
    }

    /// Create a note
    pub async fn create_note(&self, values: &CreateNoteValues<'_>) -> Result<Note> {
        self.insert(Collection::Notes, values).await
    }

    /// Replace a note with the given record
    pub async fn update_note(&self, note: &Note) -> Result<Note> {
        self.put(Collection::Notes, &note.id, note).await
    }

    /// Create a note in the crudnotas shape
    pub async fn create_flagged_note(&self, values: &FlaggedNoteValues<'_>) -> Result<Note> {
        self.insert(Collection::Notes, values).await
    }

    /// Replace a note with exactly the given values, other fields are dropped
    pub async fn replace_flagged_note(
        &self,
        id: &Id,
        values: &FlaggedNoteValues<'_>,
    ) -> Result<Note> {
        let record = serde_json::to_value(values)?;
        let replaced = self.backend.replace(Collection::Notes, id, record).await?;

        Ok(serde_json::from_value(replaced)?)
    }

    /// Make a note visible to every user
    pub async fn mark_note_shared(&self, id: &Id) -> Result<Note> {
        let changed = self
            .backend
            .patch(Collection::Notes, id, json!({ "shared": true }))
            .await?;

        Ok(serde_json::from_value(changed)?)
    }

    /// Delete a note
    pub async fn delete_note(&self, id: &Id) -> Result<()> {
        self.remove(Collection::Notes, id).await
    }
}
