//! Memory backend
//!
//! Follows json-server semantics, will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::ids::Id;

use super::Backend;
use super::Collection;
use super::Error;
use super::Result;

/// An in-memory backend
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All records per collection, in insertion order
    collections: Arc<Mutex<HashMap<Collection, Vec<Map<String, Value>>>>>,
}

impl Memory {
    /// Create a new empty Memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

/// ID of a stored record
fn record_id(record: &Map<String, Value>) -> Option<Id> {
    record
        .get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
}

/// Textual form of a field, how json-server compares query parameters
fn field_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn matches_filter(record: &Map<String, Value>, filter: &[(&str, &str)]) -> bool {
    filter.iter().all(|(field, expected)| {
        record
            .get(*field)
            .and_then(field_as_text)
            .is_some_and(|actual| actual == *expected)
    })
}

/// Next numeric ID, one past the highest numeric ID in the collection
fn next_id(records: &[Map<String, Value>]) -> Result<Id> {
    let highest = records
        .iter()
        .filter_map(record_id)
        .filter_map(|id| match id {
            Id::Number(number) => Some(number),
            Id::Text(_) => None,
        })
        .max()
        .unwrap_or(0);

    highest
        .checked_add(1)
        .map(Id::Number)
        .ok_or_else(|| Error::Status {
            status: 500,
            reason: String::from("Insert failed, no numeric IDs left"),
        })
}

fn into_object(record: Value) -> Result<Map<String, Value>> {
    match record {
        Value::Object(object) => Ok(object),
        other => Err(Error::Decode(format!("Record must be an object, got: {other}"))),
    }
}

fn position(records: &[Map<String, Value>], id: &Id) -> Result<usize> {
    records
        .iter()
        .position(|record| record_id(record).as_ref() == Some(id))
        .ok_or_else(Error::not_found)
}

#[async_trait]
impl Backend for Memory {
    async fn list(&self, collection: Collection, filter: &[(&str, &str)]) -> Result<Vec<Value>> {
        Ok(self
            .collections
            .lock()
            .await
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| matches_filter(record, filter))
                    .cloned()
                    .map(Value::Object)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: &Id) -> Result<Option<Value>> {
        Ok(self
            .collections
            .lock()
            .await
            .get(&collection)
            .and_then(|records| {
                records
                    .iter()
                    .find(|record| record_id(record).as_ref() == Some(id))
            })
            .cloned()
            .map(Value::Object))
    }

    async fn create(&self, collection: Collection, record: Value) -> Result<Value> {
        let mut record = into_object(record)?;

        let mut collections = self.collections.lock().await;
        let records = collections.entry(collection).or_default();

        if let Some(id) = record_id(&record) {
            if records.iter().any(|other| record_id(other) == Some(id.clone())) {
                return Err(Error::Status {
                    status: 500,
                    reason: format!("Insert failed, duplicate id {id}"),
                });
            }
        } else {
            let id = next_id(records)?;
            record.insert("id".to_string(), serde_json::to_value(id)?);
        }

        records.push(record.clone());

        Ok(Value::Object(record))
    }

    async fn replace(&self, collection: Collection, id: &Id, record: Value) -> Result<Value> {
        let mut record = into_object(record)?;

        let mut collections = self.collections.lock().await;
        let records = collections.entry(collection).or_default();
        let index = position(records, id)?;

        // the ID in the path wins over the one in the body
        let stored_id = records[index].get("id").cloned().unwrap_or(Value::Null);
        record.insert("id".to_string(), stored_id);

        records[index] = record.clone();

        Ok(Value::Object(record))
    }

    async fn patch(&self, collection: Collection, id: &Id, changes: Value) -> Result<Value> {
        let changes = into_object(changes)?;

        let mut collections = self.collections.lock().await;
        let records = collections.entry(collection).or_default();
        let index = position(records, id)?;

        let record = &mut records[index];
        for (field, value) in changes {
            if field != "id" {
                record.insert(field, value);
            }
        }

        Ok(Value::Object(record.clone()))
    }

    async fn delete(&self, collection: Collection, id: &Id) -> Result<()> {
        let mut collections = self.collections.lock().await;
        let records = collections.entry(collection).or_default();
        let index = position(records, id)?;

        records.remove(index);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_create_assigns_numeric_ids() {
        let memory = Memory::new();

        let first = memory
            .create(Collection::Users, json!({ "username": "ada" }))
            .await
            .unwrap();
        let second = memory
            .create(Collection::Users, json!({ "username": "bob" }))
            .await
            .unwrap();

        assert_eq!(Some(&json!(1)), first.get("id"));
        assert_eq!(Some(&json!(2)), second.get("id"));
    }

    #[tokio::test]
    async fn test_create_keeps_given_ids() {
        let memory = Memory::new();

        memory
            .create(Collection::Events, json!({ "id": "event-1", "name": "Meetup" }))
            .await
            .unwrap();

        let duplicate = memory
            .create(Collection::Events, json!({ "id": "event-1", "name": "Again" }))
            .await;
        assert!(matches!(duplicate, Err(Error::Status { status: 500, .. })));

        let next = memory
            .create(Collection::Events, json!({ "name": "Numbered" }))
            .await
            .unwrap();
        assert_eq!(Some(&json!(1)), next.get("id"));
    }

    #[tokio::test]
    async fn test_create_runs_out_of_ids() {
        let memory = Memory::new();

        memory
            .create(Collection::Notes, json!({ "id": u64::MAX, "title": "Last" }))
            .await
            .unwrap();

        let overflow = memory
            .create(Collection::Notes, json!({ "title": "One more" }))
            .await;
        assert!(matches!(overflow, Err(Error::Status { status: 500, .. })));

        let all = memory.list(Collection::Notes, &[]).await.unwrap();
        assert_eq!(1, all.len());
    }

    #[tokio::test]
    async fn test_list_filters_textually() {
        let memory = Memory::new();

        memory
            .create(Collection::Users, json!({ "username": "ada", "password": "123456" }))
            .await
            .unwrap();
        memory
            .create(Collection::Users, json!({ "username": "ada", "password": 123_456 }))
            .await
            .unwrap();
        memory
            .create(Collection::Users, json!({ "username": "bob", "password": "123456" }))
            .await
            .unwrap();

        let found = memory
            .list(Collection::Users, &[("username", "ada"), ("password", "123456")])
            .await
            .unwrap();
        assert_eq!(2, found.len());

        let all = memory.list(Collection::Users, &[]).await.unwrap();
        assert_eq!(3, all.len());

        let none = memory.list(Collection::Notes, &[]).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_replace_patch_delete() {
        let memory = Memory::new();

        memory
            .create(Collection::Notes, json!({ "title": "A", "content": "B" }))
            .await
            .unwrap();

        let id = Id::Number(1);

        let replaced = memory
            .replace(Collection::Notes, &id, json!({ "id": 99, "title": "C" }))
            .await
            .unwrap();
        assert_eq!(json!({ "id": 1, "title": "C" }), replaced);

        let patched = memory
            .patch(Collection::Notes, &id, json!({ "shared": true }))
            .await
            .unwrap();
        assert_eq!(json!({ "id": 1, "title": "C", "shared": true }), patched);

        memory.delete(Collection::Notes, &id).await.unwrap();
        assert!(memory.get(Collection::Notes, &id).await.unwrap().is_none());

        let missing = memory.delete(Collection::Notes, &id).await;
        assert!(missing.is_err_and(|err| err.is_not_found()));
    }
}
