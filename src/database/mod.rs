use mongodb::{Client, Collection, Database};
use std::error::Error;

pub const JOBS: &str = "jobs";
pub const USERS: &str = "users";
pub const SUBSCRIBERS: &str = "subscribers";
pub const SETTINGS: &str = "settings";
pub const CONTACT_MESSAGES: &str = "contact_messages";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        // Timeouts
        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        let db = client.database(&database_name(uri));

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the feed and upsert paths rely on
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let jobs = self.collection::<mongodb::bson::Document>(JOBS);

        // jobs(job_id) unique: the ingestion upsert key
        let job_id_index = IndexModel::builder()
            .keys(doc! { "job_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match jobs.create_index(job_id_index).await {
            Ok(_) => log::info!("   ✅ Index created: jobs(job_id) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let feed_indexes = [
            (doc! { "category": 1, "created_at": -1 }, "jobs(category, created_at)"),
            (doc! { "created_at": -1 }, "jobs(created_at)"),
            (doc! { "views": -1 }, "jobs(views)"),
        ];

        for (keys, label) in feed_indexes {
            match jobs.create_index(IndexModel::builder().keys(keys).build()).await {
                Ok(_) => log::info!("   ✅ Index created: {}", label),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        let users = self.collection::<mongodb::bson::Document>(USERS);

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // Subscribers are deduplicated by an existence check, not a unique index
        let subscribers = self.collection::<mongodb::bson::Document>(SUBSCRIBERS);

        match subscribers
            .create_index(IndexModel::builder().keys(doc! { "email": 1 }).build())
            .await
        {
            Ok(_) => log::info!("   ✅ Index created: subscribers(email)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn health_check(&self) -> bool {
        self.db.list_collection_names().await.is_ok()
    }
}

/// Extracts the database name from the URI path, falling back to `JobFeed`
fn database_name(uri: &str) -> String {
    let without_scheme = uri.split("://").nth(1).unwrap_or(uri);

    without_scheme
        .split_once('/')
        .map(|(_, rest)| rest.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("JobFeed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_name_from_uri() {
        assert_eq!(database_name("mongodb://localhost:27017/jobs_db"), "jobs_db");
        assert_eq!(
            database_name("mongodb+srv://u:p@cluster.x.net/feed?retryWrites=true"),
            "feed"
        );
        assert_eq!(database_name("mongodb://localhost:27017"), "JobFeed");
        assert_eq!(database_name("mongodb://localhost:27017/?w=majority"), "JobFeed");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/JobFeedTest".to_string());

        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
    }
}
