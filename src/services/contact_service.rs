use futures::stream::TryStreamExt;
use mongodb::bson::doc;

use crate::{
    database::{MongoDB, CONTACT_MESSAGES},
    models::{ContactMessage, ContactMessageResponse, ContactRequest},
    services::{job_service::page_params, subscriber_service::normalize_email},
    utils::AppError,
};

const MAX_NAME: usize = 100;
const MAX_SUBJECT: usize = 200;
const MAX_MESSAGE: usize = 5000;

fn required(value: &str, label: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", label)));
    }
    if value.chars().count() > max {
        return Err(AppError::InvalidRequest(format!(
            "{} must be at most {} characters",
            label, max
        )));
    }
    Ok(value.to_string())
}

pub fn validate_contact(req: &ContactRequest, now: i64) -> Result<ContactMessage, AppError> {
    let subject = match req.subject.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(required(s, "Subject", MAX_SUBJECT)?),
        _ => None,
    };

    Ok(ContactMessage {
        id: None,
        name: required(&req.name, "Name", MAX_NAME)?,
        email: normalize_email(&req.email)?,
        subject,
        message: required(&req.message, "Message", MAX_MESSAGE)?,
        handled: false,
        created_at: now,
    })
}

pub async fn submit_contact(db: &MongoDB, req: &ContactRequest) -> Result<String, AppError> {
    let message = validate_contact(req, chrono::Utc::now().timestamp())?;

    let result = db
        .collection::<ContactMessage>(CONTACT_MESSAGES)
        .insert_one(&message)
        .await?;

    log::info!("✉️  Contact message from {}", message.email);

    Ok(result
        .inserted_id
        .as_object_id()
        .map(|id| id.to_hex())
        .unwrap_or_default())
}

pub async fn list_contact_messages(
    db: &MongoDB,
    page: Option<u64>,
    limit: Option<i64>,
) -> Result<Vec<ContactMessageResponse>, AppError> {
    let (_, limit, skip) = page_params(page, limit);

    let messages = db
        .collection::<ContactMessage>(CONTACT_MESSAGES)
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .skip(skip)
        .limit(limit)
        .await?
        .map_ok(ContactMessageResponse::from)
        .try_collect()
        .await?;

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            name: " Ada ".into(),
            email: "Ada@Example.com".into(),
            subject: Some("  ".into()),
            message: "Hello there".into(),
        }
    }

    #[test]
    fn test_valid_contact() {
        let msg = validate_contact(&request(), 42).unwrap();
        assert_eq!(msg.name, "Ada");
        assert_eq!(msg.email, "ada@example.com");
        assert_eq!(msg.subject, None);
        assert_eq!(msg.created_at, 42);
        assert!(!msg.handled);
    }

    #[test]
    fn test_missing_fields() {
        let mut req = request();
        req.message = "   ".into();
        assert!(validate_contact(&req, 0).is_err());

        let mut req = request();
        req.email = "nope".into();
        assert!(validate_contact(&req, 0).is_err());

        let mut req = request();
        req.name = "n".repeat(MAX_NAME + 1);
        assert!(validate_contact(&req, 0).is_err());
    }
}
