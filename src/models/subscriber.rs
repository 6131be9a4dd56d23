use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Email-alert recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    /// Free text, e.g. "rust, remote, backend"
    #[serde(default)]
    pub preferences: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub preferences: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UnsubscribeRequest {
    pub email: String,
}
