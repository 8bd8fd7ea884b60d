use crate::ids::Id;
use crate::users::CreateUserValues;
use crate::users::PascalCaseUserValues;
use crate::users::User;

use super::Client;
use super::Collection;
use super::Result;

impl Client {
    /// Get all users
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.fetch_all(Collection::Users, &[]).await
    }

    /// Find users by exact field values, like `[("username", "ada")]`
    pub async fn find_users(&self, filter: &[(&str, &str)]) -> Result<Vec<User>> {
        self.fetch_all(Collection::Users, filter).await
    }

    /// Get a single user
    pub async fn get_user(&self, id: &Id) -> Result<Option<User>> {
        self.fetch_one(Collection::Users, id).await
    }

    /// Find a user by username or email address
    pub async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .find(|user| user.is_identified_by(identifier)))
    }

    /// Create a user
    pub async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        self.insert(Collection::Users, values).await
    }

    /// Create a user with PascalCase field names, it reads back as any other user
    pub async fn create_pascal_case_user(&self, values: &PascalCaseUserValues<'_>) -> Result<User> {
        self.insert(Collection::Users, values).await
    }

    /// Replace a user with the given record
    pub async fn update_user(&self, user: &User) -> Result<User> {
        self.put(Collection::Users, &user.id, user).await
    }

    /// Delete a user
    pub async fn delete_user(&self, id: &Id) -> Result<()> {
        self.remove(Collection::Users, id).await
    }
}
