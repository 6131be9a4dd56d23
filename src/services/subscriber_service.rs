use mongodb::bson::doc;

use crate::{
    database::{MongoDB, SUBSCRIBERS},
    models::Subscriber,
    utils::{text::is_valid_email, AppError},
};

const MAX_PREFERENCES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    AlreadySubscribed,
    Reactivated,
}

/// Lowercased, trimmed email; rejects malformed addresses
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::InvalidRequest("Invalid email address".to_string()));
    }
    Ok(email)
}

fn clean_preferences(preferences: Option<&str>) -> Result<String, AppError> {
    let preferences = preferences.unwrap_or("").trim();
    if preferences.chars().count() > MAX_PREFERENCES {
        return Err(AppError::InvalidRequest(format!(
            "Preferences must be at most {} characters",
            MAX_PREFERENCES
        )));
    }
    Ok(preferences.to_string())
}

pub async fn subscribe(
    db: &MongoDB,
    email: &str,
    preferences: Option<&str>,
) -> Result<SubscribeOutcome, AppError> {
    let email = normalize_email(email)?;
    let preferences = clean_preferences(preferences)?;
    let collection = db.collection::<Subscriber>(SUBSCRIBERS);
    let now = chrono::Utc::now().timestamp();

    if let Some(existing) = collection.find_one(doc! { "email": &email }).await? {
        if existing.is_active {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        let mut set = doc! { "is_active": true, "updated_at": now };
        if !preferences.is_empty() {
            set.insert("preferences", &preferences);
        }
        collection
            .update_one(doc! { "email": &email }, doc! { "$set": set })
            .await?;

        log::info!("📬 Subscriber reactivated: {}", email);
        return Ok(SubscribeOutcome::Reactivated);
    }

    let subscriber = Subscriber {
        id: None,
        email: email.clone(),
        preferences,
        is_active: true,
        created_at: now,
        updated_at: None,
    };
    collection.insert_one(&subscriber).await?;

    log::info!("📬 New subscriber: {}", email);
    Ok(SubscribeOutcome::Created)
}

pub async fn unsubscribe(db: &MongoDB, email: &str) -> Result<(), AppError> {
    let email = normalize_email(email)?;

    let result = db
        .collection::<Subscriber>(SUBSCRIBERS)
        .update_one(
            doc! { "email": &email },
            doc! { "$set": { "is_active": false, "updated_at": chrono::Utc::now().timestamp() } },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Subscriber not found".to_string()));
    }

    log::info!("📭 Unsubscribed: {}", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Dev@Example.COM ").unwrap(), "dev@example.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("").is_err());
    }

    #[test]
    fn test_preferences_limit() {
        assert_eq!(clean_preferences(None).unwrap(), "");
        assert_eq!(clean_preferences(Some(" rust, remote ")).unwrap(), "rust, remote");
        assert!(clean_preferences(Some(&"x".repeat(MAX_PREFERENCES + 1))).is_err());
    }
}
