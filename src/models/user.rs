use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::Job;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Denormalized job snapshot stored on the user document
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Bookmark {
    pub job_id: String,
    pub title: String,
    pub employer: String,
    pub location: String,
    pub category: String,
    pub source: String,
    pub link: String,
    pub bookmarked_at: i64,
}

impl Bookmark {
    pub fn snapshot(job: &Job, now: i64) -> Self {
        Bookmark {
            job_id: job.job_id.clone(),
            title: job.title.clone(),
            employer: job.employer.clone(),
            location: job.location.clone(),
            category: job.category.to_string(),
            source: job.source.as_str().to_string(),
            link: job.link.clone(),
            bookmarked_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

/// Free-text profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserProfile {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub last_ip: Option<String>,
    #[serde(default)]
    pub geo: Option<GeoLocation>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub last_login: Option<i64>,
}

fn default_role() -> String {
    ROLE_USER.to_string()
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub profile: UserProfile,
    pub bookmarks_count: usize,
    pub geo: Option<GeoLocation>,
    pub created_at: i64,
    pub last_login: Option<i64>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: user.email,
            name: user.name,
            image: user.image,
            role: user.role,
            is_active: user.is_active,
            profile: user.profile,
            bookmarks_count: user.bookmarks.len(),
            geo: user.geo,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

/// Partial profile update; `Some("")` clears a field
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}
