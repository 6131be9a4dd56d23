use mongodb::bson::{doc, Document, Regex};
use serde::{Deserialize, Serialize};

use crate::{
    database::MongoDB,
    models::JobResponse,
    services::{
        categorizer::{categorize, Category},
        job_service::{count_jobs, latest_jobs},
        location::{find_location_mention, REMOTE},
    },
    utils::{
        text::{collapse_whitespace, contains_term},
        AppError,
    },
};

pub const MAX_MESSAGE_CHARS: usize = 500;
const MAX_RESULTS: i64 = 5;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hola", "yo", "good morning", "good evening", "good afternoon"];
const HELP_MARKERS: &[&str] = &["help", "what can you do", "how does this work", "how do i use"];
const SUBSCRIBE_MARKERS: &[&str] = &["subscribe", "alert", "alerts", "notify", "notification", "notifications", "newsletter"];
const BOOKMARK_MARKERS: &[&str] = &["bookmark", "bookmarks", "saved", "save a job", "save jobs"];
const COUNT_MARKERS: &[&str] = &["how many", "number of", "count"];
const SEARCH_MARKERS: &[&str] = &[
    "job", "jobs", "role", "roles", "position", "positions", "opening", "openings",
    "hiring", "find", "search", "show", "looking", "gig", "gigs",
];

/// Words that never make a useful search keyword
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "me", "my", "i", "im", "i'm", "for", "in", "at", "on", "of", "to", "and", "or",
    "any", "some", "please", "can", "you", "show", "find", "search", "looking", "job", "jobs", "role",
    "roles", "position", "positions", "opening", "openings", "hiring", "work", "with", "near", "from",
    "are", "there", "is", "what", "latest", "new", "want", "need", "get", "give", "list", "gig", "gigs",
];

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChatResponse {
    pub success: bool,
    pub reply: String,
    pub intent: String,
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatIntent {
    Greeting,
    Help,
    Subscribe,
    Bookmarks,
    CountJobs {
        category: Option<Category>,
    },
    SearchJobs {
        category: Option<Category>,
        location: Option<String>,
        keywords: Vec<String>,
    },
    Fallback,
}

impl ChatIntent {
    pub fn name(&self) -> &'static str {
        match self {
            ChatIntent::Greeting => "greeting",
            ChatIntent::Help => "help",
            ChatIntent::Subscribe => "subscribe",
            ChatIntent::Bookmarks => "bookmarks",
            ChatIntent::CountJobs { .. } => "count_jobs",
            ChatIntent::SearchJobs { .. } => "search_jobs",
            ChatIntent::Fallback => "fallback",
        }
    }
}

fn mentions_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| contains_term(text, m))
}

/// Keyword category, or a category named outright ("devops", "full stack")
fn detect_category(text: &str) -> Option<Category> {
    match categorize(text) {
        Category::Other => Category::ALL
            .iter()
            .find(|c| {
                contains_term(text, &c.display_name().to_lowercase()) || contains_term(text, c.slug())
            })
            .copied(),
        category => Some(category),
    }
}

fn extract_keywords(text: &str, category: Option<Category>, location: Option<&str>) -> Vec<String> {
    let location_words: Vec<String> = location
        .map(|l| l.to_lowercase().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let mut keywords: Vec<String> = Vec::new();
    for word in text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#' || c == '.')) {
        let word = word.trim_matches('.');
        if word.chars().count() < 2 || STOPWORDS.contains(&word) {
            continue;
        }
        if location_words.iter().any(|l| l == word) || word == "remote" {
            continue;
        }
        if let Some(category) = category {
            if category.slug() == word || category.display_name().to_lowercase() == word {
                continue;
            }
        }
        if !keywords.iter().any(|k| k == word) {
            keywords.push(word.to_string());
        }
    }
    keywords.truncate(5);
    keywords
}

/// Rule-based intent detection over the lowercased message
pub fn parse_intent(message: &str) -> ChatIntent {
    let text = collapse_whitespace(&message.to_lowercase());

    if mentions_any(&text, SUBSCRIBE_MARKERS) {
        return ChatIntent::Subscribe;
    }
    if mentions_any(&text, BOOKMARK_MARKERS) {
        return ChatIntent::Bookmarks;
    }

    let category = detect_category(&text);

    if mentions_any(&text, COUNT_MARKERS) {
        return ChatIntent::CountJobs { category };
    }

    let location = find_location_mention(&text);
    let searching = mentions_any(&text, SEARCH_MARKERS) || category.is_some() || location.is_some();

    if searching {
        let keywords = extract_keywords(&text, category, location.as_deref());
        return ChatIntent::SearchJobs {
            category,
            location,
            keywords,
        };
    }

    if mentions_any(&text, HELP_MARKERS) {
        return ChatIntent::Help;
    }
    if mentions_any(&text, GREETINGS) {
        return ChatIntent::Greeting;
    }

    ChatIntent::Fallback
}

/// Mongo filter for a search intent. Keywords only narrow the search when
/// neither a category nor a location was recognized.
pub fn search_filter(category: Option<Category>, location: Option<&str>, keywords: &[String]) -> Document {
    let mut filter = Document::new();

    if let Some(category) = category {
        filter.insert("category", category.display_name());
    }
    if let Some(location) = location {
        filter.insert(
            "location",
            Regex {
                pattern: regex::escape(location),
                options: "i".to_string(),
            },
        );
    }
    if filter.is_empty() && !keywords.is_empty() {
        let clauses: Vec<Document> = keywords
            .iter()
            .flat_map(|k| {
                let regex = Regex {
                    pattern: regex::escape(k),
                    options: "i".to_string(),
                };
                vec![doc! { "title": regex.clone() }, doc! { "raw_text": regex }]
            })
            .collect();
        filter.insert("$or", clauses);
    }

    filter
}

fn describe(category: Option<Category>, location: Option<&str>) -> String {
    let mut label = match category {
        Some(c) => format!("{} jobs", c.display_name()),
        None => "jobs".to_string(),
    };
    match location {
        Some(REMOTE) => label = format!("remote {}", label),
        Some(place) => label = format!("{} in {}", label, place),
        None => {}
    }
    label
}

pub async fn respond(db: &MongoDB, message: &str) -> Result<ChatResponse, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::InvalidRequest("Message cannot be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::InvalidRequest(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let intent = parse_intent(message);
    log::debug!("💬 Chat intent: {}", intent.name());

    let mut jobs = Vec::new();
    let reply = match &intent {
        ChatIntent::Greeting => {
            "Hi! I can help you find tech jobs. Try \"remote rust jobs\" or \"frontend jobs in Berlin\".".to_string()
        }
        ChatIntent::Help => "Ask me for jobs by role, stack or place (\"backend jobs in London\"), \
            ask how many jobs a category has, or ask about alerts and bookmarks."
            .to_string(),
        ChatIntent::Subscribe => "Use the Subscribe form to get email alerts. Add preferences such as \
            \"rust, remote\" and you will only hear about matching jobs."
            .to_string(),
        ChatIntent::Bookmarks => "Sign in and tap the bookmark icon on any job to save it. \
            Saved jobs live on your Bookmarks page."
            .to_string(),
        ChatIntent::CountJobs { category } => {
            let filter = match category {
                Some(c) => doc! { "category": c.display_name() },
                None => doc! {},
            };
            let total = count_jobs(db, filter).await?;
            format!("There are {} {} right now.", total, describe(*category, None))
        }
        ChatIntent::SearchJobs {
            category,
            location,
            keywords,
        } => {
            let filter = search_filter(*category, location.as_deref(), keywords);
            jobs = latest_jobs(db, filter, MAX_RESULTS)
                .await?
                .into_iter()
                .map(JobResponse::from)
                .collect();

            let label = describe(*category, location.as_deref());
            if jobs.is_empty() {
                format!("I couldn't find any {} yet. Subscribe to get an alert when one shows up.", label)
            } else {
                format!("Here are the latest {} {}.", jobs.len(), label)
            }
        }
        ChatIntent::Fallback => "Sorry, I didn't get that. Try asking for jobs, e.g. \"data jobs in India\".".to_string(),
    };

    Ok(ChatResponse {
        success: true,
        reply,
        intent: intent.name().to_string(),
        jobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_and_help() {
        assert_eq!(parse_intent("Hello!"), ChatIntent::Greeting);
        assert_eq!(parse_intent("hey there"), ChatIntent::Greeting);
        assert_eq!(parse_intent("What can you do?"), ChatIntent::Help);
        assert_eq!(parse_intent("help"), ChatIntent::Help);
        assert_eq!(parse_intent("how does this work?"), ChatIntent::Help);
    }

    #[test]
    fn test_subscribe_and_bookmarks() {
        assert_eq!(parse_intent("notify me about rust jobs"), ChatIntent::Subscribe);
        assert_eq!(parse_intent("How do I subscribe?"), ChatIntent::Subscribe);
        assert_eq!(parse_intent("where are my saved jobs"), ChatIntent::Bookmarks);
    }

    #[test]
    fn test_count_jobs() {
        assert_eq!(
            parse_intent("How many devops jobs are there?"),
            ChatIntent::CountJobs { category: Some(Category::DevOps) }
        );
        assert_eq!(parse_intent("how many jobs"), ChatIntent::CountJobs { category: None });
    }

    #[test]
    fn test_search_jobs_with_category_and_location() {
        match parse_intent("Show me frontend jobs in Berlin") {
            ChatIntent::SearchJobs { category, location, .. } => {
                assert_eq!(category, Some(Category::Frontend));
                assert_eq!(location.as_deref(), Some("Berlin"));
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_search_jobs_remote() {
        match parse_intent("any remote design roles?") {
            ChatIntent::SearchJobs { category, location, .. } => {
                assert_eq!(category, Some(Category::Design));
                assert_eq!(location.as_deref(), Some("Remote"));
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_keywords_extracted() {
        match parse_intent("find elixir jobs") {
            ChatIntent::SearchJobs { category, location, keywords } => {
                assert_eq!(category, None);
                assert_eq!(location, None);
                assert_eq!(keywords, vec!["elixir".to_string()]);
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_fallback() {
        assert_eq!(parse_intent("the weather is nice"), ChatIntent::Fallback);
    }

    #[test]
    fn test_search_filter() {
        let filter = search_filter(Some(Category::Backend), Some("Berlin"), &["go".to_string()]);
        assert_eq!(filter.get_str("category").unwrap(), "Backend");
        assert!(filter.contains_key("location"));
        assert!(!filter.contains_key("$or"));

        let filter = search_filter(None, None, &["elixir".to_string()]);
        assert_eq!(filter.get_array("$or").unwrap().len(), 2);

        assert!(search_filter(None, None, &[]).is_empty());
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(Some(Category::Data), Some("Remote")), "remote Data jobs");
        assert_eq!(describe(None, Some("Paris")), "jobs in Paris");
    }
}
