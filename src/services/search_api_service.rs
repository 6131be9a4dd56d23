use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::SearchApiConfig;
use crate::models::JobSource;
use crate::utils::AppError;

/// One post as returned by a search provider, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPost {
    pub post_id: String,
    pub text: String,
    pub author_name: Option<String>,
    pub author_handle: Option<String>,
    pub url: Option<String>,
    /// Unix timestamp
    pub created_at: Option<i64>,
}

/// A searchable feed of social-media posts
#[async_trait]
pub trait PostSource: Send + Sync {
    fn source(&self) -> JobSource;

    async fn search(&self, query: &str) -> Result<Vec<RawPost>, AppError>;
}

// ==================== X / TWITTER SEARCH ====================

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Deserialize)]
struct TimelineEntry {
    #[serde(rename = "type", default)]
    entry_type: Option<String>,
    tweet_id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    screen_name: Option<String>,
    #[serde(default)]
    user_info: Option<TimelineUser>,
}

#[derive(Debug, Deserialize)]
struct TimelineUser {
    #[serde(default)]
    name: Option<String>,
}

/// RapidAPI-style X search client (`search.php?query=...&search_type=Latest`)
pub struct SearchApiClient {
    client: reqwest::Client,
    config: SearchApiConfig,
}

impl SearchApiClient {
    pub fn new(config: SearchApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }
}

#[async_trait]
impl PostSource for SearchApiClient {
    fn source(&self) -> JobSource {
        JobSource::X
    }

    async fn search(&self, query: &str) -> Result<Vec<RawPost>, AppError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            AppError::ExternalApiError("SEARCH_API_KEY is not configured".to_string())
        })?;

        let url = format!(
            "{}/search.php?query={}&search_type=Latest",
            self.config.base_url,
            urlencoding::encode(query)
        );

        log::debug!("🔎 Searching X: {}", query);

        let response = self
            .client
            .get(&url)
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", &self.config.api_host)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Search API returned {}",
                response.status()
            )));
        }

        let body: TimelineResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Failed to parse search response: {}", e)))?;

        Ok(parse_timeline(body))
    }
}

fn parse_timeline(body: TimelineResponse) -> Vec<RawPost> {
    body.timeline
        .into_iter()
        .filter(|entry| entry.entry_type.as_deref().map_or(true, |t| t == "tweet"))
        .filter_map(|entry| {
            let post_id = entry.tweet_id.filter(|id| !id.is_empty())?;
            Some(RawPost {
                post_id,
                text: entry.text.unwrap_or_default(),
                author_name: entry.user_info.and_then(|u| u.name),
                author_handle: entry.screen_name,
                url: None,
                created_at: entry.created_at.as_deref().and_then(parse_twitter_date),
            })
        })
        .collect()
}

/// "Wed Oct 10 20:19:24 +0000 2018"
fn parse_twitter_date(raw: &str) -> Option<i64> {
    chrono::DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y")
        .ok()
        .map(|dt| dt.timestamp())
}

// ==================== LINKEDIN-STYLE POST SEARCH ====================

#[derive(Debug, Deserialize)]
struct LinkedinSearchResponse {
    #[serde(default)]
    data: Option<LinkedinData>,
}

#[derive(Debug, Deserialize)]
struct LinkedinData {
    #[serde(default)]
    items: Vec<LinkedinPost>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedinPost {
    urn: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    url: Option<String>,
    /// Milliseconds since epoch
    #[serde(default)]
    posted_at_timestamp: Option<i64>,
    #[serde(default)]
    author: Option<LinkedinAuthor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedinAuthor {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

/// LinkedIn-style keyword post search (`search-posts?keyword=...`)
pub struct LinkedinSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_host: String,
    api_key: Option<String>,
}

impl LinkedinSearchClient {
    pub fn new(base_url: String, api_host: String, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url,
            api_host,
            api_key,
        }
    }
}

#[async_trait]
impl PostSource for LinkedinSearchClient {
    fn source(&self) -> JobSource {
        JobSource::Linkedin
    }

    async fn search(&self, query: &str) -> Result<Vec<RawPost>, AppError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            AppError::ExternalApiError("SEARCH_API_KEY is not configured".to_string())
        })?;

        let url = format!(
            "{}/search-posts?keyword={}&sortBy=date_posted",
            self.base_url,
            urlencoding::encode(query)
        );

        log::debug!("🔎 Searching LinkedIn: {}", query);

        let response = self
            .client
            .get(&url)
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", &self.api_host)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "LinkedIn search returned {}",
                response.status()
            )));
        }

        let body: LinkedinSearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Failed to parse LinkedIn response: {}", e)))?;

        Ok(parse_linkedin(body))
    }
}

fn parse_linkedin(body: LinkedinSearchResponse) -> Vec<RawPost> {
    body.data
        .map(|d| d.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|post| {
            let post_id = post.urn.filter(|urn| !urn.is_empty())?;
            let (author_name, author_handle) = match post.author {
                Some(a) => (a.full_name, a.username),
                None => (None, None),
            };
            Some(RawPost {
                post_id,
                text: post.text.unwrap_or_default(),
                author_name,
                author_handle,
                url: post.url,
                created_at: post.posted_at_timestamp.map(|ms| ms / 1000),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeline() {
        let body: TimelineResponse = serde_json::from_value(serde_json::json!({
            "timeline": [
                {
                    "type": "tweet",
                    "tweet_id": "1790000000000000001",
                    "screen_name": "acme",
                    "text": "We're hiring a backend engineer!",
                    "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                    "user_info": { "name": "Acme Inc" }
                },
                { "type": "user", "screen_name": "someone" },
                { "type": "tweet", "tweet_id": "", "text": "no id" }
            ]
        }))
        .unwrap();

        let posts = parse_timeline(body);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post_id, "1790000000000000001");
        assert_eq!(posts[0].author_name.as_deref(), Some("Acme Inc"));
        assert_eq!(posts[0].author_handle.as_deref(), Some("acme"));
        assert_eq!(posts[0].created_at, Some(1_539_202_764));
    }

    #[test]
    fn test_parse_empty_timeline() {
        let body: TimelineResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_timeline(body).is_empty());
    }

    #[test]
    fn test_bad_date_is_none() {
        assert_eq!(parse_twitter_date("yesterday"), None);
    }

    #[test]
    fn test_parse_linkedin() {
        let body: LinkedinSearchResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "items": [
                    {
                        "urn": "7200000000000000000",
                        "text": "Hiring a data engineer in Berlin",
                        "url": "https://www.linkedin.com/feed/update/urn:li:activity:7200000000000000000",
                        "postedAtTimestamp": 1_700_000_000_000i64,
                        "author": { "fullName": "Jane Doe", "username": "janedoe" }
                    },
                    { "text": "missing urn" }
                ]
            }
        }))
        .unwrap();

        let posts = parse_linkedin(body);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].created_at, Some(1_700_000_000));
        assert_eq!(posts[0].author_name.as_deref(), Some("Jane Doe"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_fast() {
        let client = SearchApiClient::new(SearchApiConfig {
            base_url: "http://127.0.0.1:9".into(),
            api_key: None,
            api_host: "example".into(),
            linkedin_url: None,
            linkedin_host: "example".into(),
        });
        assert!(matches!(client.search("hiring").await, Err(AppError::ExternalApiError(_))));
    }
}
