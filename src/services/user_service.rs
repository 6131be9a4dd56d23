use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use crate::{
    database::{MongoDB, USERS},
    models::{UpdateProfileRequest, UpdateUserRequest, User, UserInfo, ROLE_ADMIN, ROLE_USER},
    services::{auth_service::get_current_user, job_service::page_params},
    utils::AppError,
};

pub const MAX_NAME: usize = 80;
pub const MAX_HEADLINE: usize = 120;
pub const MAX_BIO: usize = 2000;
pub const MAX_LOCATION: usize = 120;
pub const MAX_LINK: usize = 200;
pub const MAX_SKILLS: usize = 30;
pub const MAX_SKILL_LEN: usize = 40;

/// `$set` / `$unset` pair produced from a profile update
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub set: Document,
    pub unset: Document,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    fn text(&mut self, field: &str, label: &str, value: Option<String>, max: usize) -> Result<(), AppError> {
        let Some(value) = value else {
            return Ok(());
        };
        let value = value.trim();

        if value.is_empty() {
            self.unset.insert(field, "");
            return Ok(());
        }
        if value.chars().count() > max {
            return Err(AppError::InvalidRequest(format!(
                "{} must be at most {} characters",
                label, max
            )));
        }

        self.set.insert(field, value);
        Ok(())
    }
}

fn clean_skills(skills: Vec<String>) -> Result<Vec<String>, AppError> {
    let mut cleaned: Vec<String> = Vec::new();

    for skill in skills {
        let skill = skill.trim();
        if skill.is_empty() {
            continue;
        }
        if skill.chars().count() > MAX_SKILL_LEN {
            return Err(AppError::InvalidRequest(format!(
                "Each skill must be at most {} characters",
                MAX_SKILL_LEN
            )));
        }
        if !cleaned.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            cleaned.push(skill.to_string());
        }
    }

    if cleaned.len() > MAX_SKILLS {
        return Err(AppError::InvalidRequest(format!(
            "At most {} skills are allowed",
            MAX_SKILLS
        )));
    }

    Ok(cleaned)
}

/// Validates a profile update. Strings are trimmed, empty strings clear the field.
pub fn validate_profile(req: UpdateProfileRequest) -> Result<ProfileChanges, AppError> {
    let mut changes = ProfileChanges::default();

    changes.text("name", "Name", req.name, MAX_NAME)?;
    changes.text("profile.headline", "Headline", req.headline, MAX_HEADLINE)?;
    changes.text("profile.bio", "Bio", req.bio, MAX_BIO)?;
    changes.text("profile.location", "Location", req.location, MAX_LOCATION)?;
    changes.text("profile.website", "Website", req.website, MAX_LINK)?;
    changes.text("profile.github", "GitHub", req.github, MAX_LINK)?;
    changes.text("profile.twitter", "Twitter", req.twitter, MAX_LINK)?;

    if let Ok(website) = changes.set.get_str("profile.website") {
        if !(website.starts_with("http://") || website.starts_with("https://")) {
            return Err(AppError::InvalidRequest(
                "Website must start with http:// or https://".to_string(),
            ));
        }
    }

    if let Some(skills) = req.skills {
        let skills: Vec<Bson> = clean_skills(skills)?.into_iter().map(Bson::String).collect();
        changes.set.insert("profile.skills", skills);
    }

    Ok(changes)
}

pub async fn update_profile(db: &MongoDB, email: &str, req: UpdateProfileRequest) -> Result<User, AppError> {
    let mut changes = validate_profile(req)?;

    if changes.is_empty() {
        return get_current_user(db, email).await;
    }

    changes.set.insert("updated_at", chrono::Utc::now().timestamp());

    let mut update = doc! { "$set": changes.set };
    if !changes.unset.is_empty() {
        update.insert("$unset", changes.unset);
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let user = db
        .collection::<User>(USERS)
        .find_one_and_update(doc! { "email": email }, update)
        .with_options(options)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    log::info!("👤 Profile updated for {}", email);

    Ok(user)
}

pub async fn list_users(
    db: &MongoDB,
    page: Option<u64>,
    limit: Option<i64>,
) -> Result<(Vec<UserInfo>, u64), AppError> {
    let (_, limit, skip) = page_params(page, limit);
    let collection = db.collection::<User>(USERS);

    let total = collection.count_documents(doc! {}).await?;
    let users = collection
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .skip(skip)
        .limit(limit)
        .await?
        .map_ok(UserInfo::from)
        .try_collect()
        .await?;

    Ok((users, total))
}

fn admin_update_doc(req: &UpdateUserRequest) -> Result<Document, AppError> {
    let mut set = Document::new();

    if let Some(role) = req.role.as_deref().map(|r| r.trim().to_lowercase()) {
        if role != ROLE_USER && role != ROLE_ADMIN {
            return Err(AppError::InvalidRequest(format!("Unknown role: {}", role)));
        }
        set.insert("role", role);
    }
    if let Some(is_active) = req.is_active {
        set.insert("is_active", is_active);
    }

    if set.is_empty() {
        return Err(AppError::InvalidRequest("Nothing to update".to_string()));
    }

    set.insert("updated_at", chrono::Utc::now().timestamp());
    Ok(set)
}

pub async fn update_user(
    db: &MongoDB,
    email: &str,
    req: &UpdateUserRequest,
    updated_by: &str,
) -> Result<User, AppError> {
    let set = admin_update_doc(req)?;

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let user = db
        .collection::<User>(USERS)
        .find_one_and_update(doc! { "email": email }, doc! { "$set": set })
        .with_options(options)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))?;

    log::info!(
        "🛡️  {} updated user {} (role={}, active={})",
        updated_by,
        email,
        user.role,
        user.is_active
    );

    Ok(user)
}
