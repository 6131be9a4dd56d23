use mongodb::bson::{doc, to_bson, Bson, Document};

use crate::{
    database::{MongoDB, USERS},
    models::{Bookmark, User},
    services::{auth_service::get_current_user, job_service::find_job},
    utils::AppError,
};

/// Newest bookmark first
pub fn sort_newest_first(mut bookmarks: Vec<Bookmark>) -> Vec<Bookmark> {
    bookmarks.sort_by(|a, b| b.bookmarked_at.cmp(&a.bookmarked_at));
    bookmarks
}

pub async fn list_bookmarks(db: &MongoDB, email: &str) -> Result<Vec<Bookmark>, AppError> {
    let user = get_current_user(db, email).await?;
    Ok(sort_newest_first(user.bookmarks))
}

/// Matches the user only when the job is not bookmarked yet, so two concurrent
/// toggles can never push the same job twice.
pub fn push_filter(email: &str, job_id: &str) -> Document {
    doc! { "email": email, "bookmarks.job_id": { "$ne": job_id } }
}

pub fn push_update(snapshot: Bson, now: i64) -> Document {
    doc! {
        "$push": { "bookmarks": snapshot },
        "$set": { "updated_at": now },
    }
}

pub fn pull_update(job_id: &str, now: i64) -> Document {
    doc! {
        "$pull": { "bookmarks": { "job_id": job_id } },
        "$set": { "updated_at": now },
    }
}

async fn pull_bookmark(db: &MongoDB, email: &str, job_id: &str) -> Result<bool, AppError> {
    let pulled = db
        .collection::<User>(USERS)
        .update_one(
            doc! { "email": email, "bookmarks.job_id": job_id },
            pull_update(job_id, chrono::Utc::now().timestamp()),
        )
        .await?;
    Ok(pulled.modified_count > 0)
}

/// Adds or removes a bookmark. Returns whether the job is bookmarked afterwards.
///
/// Snapshots outlive their job, so an existing bookmark is pulled before the
/// job is looked up.
pub async fn toggle_bookmark(db: &MongoDB, email: &str, id: &str) -> Result<bool, AppError> {
    if pull_bookmark(db, email, id).await? {
        log::debug!("🔖 {} removed bookmark {}", email, id);
        return Ok(false);
    }

    // The caller may pass the ObjectId, bookmarks store job_id
    let job = find_job(db, id).await?;
    let job_id = job.job_id.clone();

    if job_id != id && pull_bookmark(db, email, &job_id).await? {
        log::debug!("🔖 {} removed bookmark {}", email, job_id);
        return Ok(false);
    }

    let now = chrono::Utc::now().timestamp();
    let snapshot = to_bson(&Bookmark::snapshot(&job, now))?;

    let users = db.collection::<User>(USERS);
    let pushed = users
        .update_one(push_filter(email, &job_id), push_update(snapshot, now))
        .await?;

    if pushed.matched_count == 0 {
        // Either the user vanished or a concurrent toggle already added it
        let exists = users.find_one(doc! { "email": email }).await?.is_some();
        if !exists {
            return Err(AppError::NotFound("User not found".to_string()));
        }
    }

    log::debug!("🔖 {} bookmarked {}", email, job_id);
    Ok(true)
}

pub async fn remove_bookmark(db: &MongoDB, email: &str, job_id: &str) -> Result<(), AppError> {
    let result = db
        .collection::<User>(USERS)
        .update_one(
            doc! { "email": email },
            pull_update(job_id, chrono::Utc::now().timestamp()),
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    if result.modified_count == 0 {
        return Err(AppError::NotFound(format!("Bookmark {} not found", job_id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(job_id: &str, at: i64) -> Bookmark {
        Bookmark {
            job_id: job_id.to_string(),
            title: "Rust Engineer".to_string(),
            employer: "Acme".to_string(),
            location: "Remote".to_string(),
            category: "Backend".to_string(),
            source: "x".to_string(),
            link: "https://x.com/acme/status/1".to_string(),
            bookmarked_at: at,
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let sorted = sort_newest_first(vec![bookmark("a", 10), bookmark("b", 30), bookmark("c", 20)]);
        let ids: Vec<&str> = sorted.iter().map(|b| b.job_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_push_is_guarded_against_duplicates() {
        let filter = push_filter("ada@example.com", "x:1790");
        assert_eq!(filter.get_str("email").unwrap(), "ada@example.com");
        let guard = filter.get_document("bookmarks.job_id").unwrap();
        assert_eq!(guard.get_str("$ne").unwrap(), "x:1790");

        let snapshot = to_bson(&bookmark("x:1790", 5)).unwrap();
        let update = push_update(snapshot, 5);
        let pushed = update.get_document("$push").unwrap().get_document("bookmarks").unwrap();
        assert_eq!(pushed.get_str("job_id").unwrap(), "x:1790");
        assert_eq!(update.get_document("$set").unwrap().get_i64("updated_at").unwrap(), 5);
    }

    #[test]
    fn test_pull_matches_on_job_id() {
        let update = pull_update("x:1790", 9);
        let pull = update.get_document("$pull").unwrap().get_document("bookmarks").unwrap();
        assert_eq!(pull.get_str("job_id").unwrap(), "x:1790");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_toggle_removes_bookmark_of_deleted_job() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/JobFeedTest".to_string());
        let db = MongoDB::new(&uri).await.unwrap();
        let users = db.collection::<Document>(USERS);

        let email = format!("bookmark-{}@example.com", uuid::Uuid::new_v4());
        let orphan = to_bson(&bookmark("x:no-such-job", 1)).unwrap();
        users
            .insert_one(doc! { "email": &email, "bookmarks": [orphan], "created_at": 1i64, "updated_at": 1i64 })
            .await
            .unwrap();

        let bookmarked = toggle_bookmark(&db, &email, "x:no-such-job").await.unwrap();
        let remaining = list_bookmarks(&db, &email).await.unwrap();
        users.delete_one(doc! { "email": &email }).await.unwrap();

        assert!(!bookmarked);
        assert!(remaining.is_empty());
    }
}
