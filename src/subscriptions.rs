use serde::Deserialize;
use serde::Serialize;

use crate::ids::Id;

/// A newsletter subscription
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Subscription {
    pub id: Id,
    #[serde(default)]
    pub email: String,
}

/// Values to create a Subscription
#[derive(Debug, Serialize)]
pub struct CreateSubscriptionValues<'a> {
    pub email: &'a str,
}
