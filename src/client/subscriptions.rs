use crate::ids::Id;
use crate::subscriptions::CreateSubscriptionValues;
use crate::subscriptions::Subscription;

use super::Client;
use super::Collection;
use super::Result;

impl Client {
    /// Get all subscriptions
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.fetch_all(Collection::Subscriptions, &[]).await
    }

    /// Subscribe an email address
    pub async fn add_subscription(&self, email: &str) -> Result<Subscription> {
        self.insert(Collection::Subscriptions, &CreateSubscriptionValues { email })
            .await
    }

    /// Delete a subscription
    pub async fn delete_subscription(&self, id: &Id) -> Result<()> {
        self.remove(Collection::Subscriptions, id).await
    }
}
