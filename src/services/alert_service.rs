use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;

use crate::{
    database::{MongoDB, SUBSCRIBERS},
    models::{NewJob, Subscriber},
    services::categorizer::Category,
    utils::{text::contains_term, AppError},
};

/// Delivers a batch of new jobs to one subscriber
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, subscriber: &Subscriber, jobs: &[&NewJob]) -> Result<(), AppError>;
}

/// Writes alerts to the log. Stands in wherever no mail transport is wired up.
pub struct LogAlertDispatcher;

#[async_trait]
impl AlertDispatcher for LogAlertDispatcher {
    async fn dispatch(&self, subscriber: &Subscriber, jobs: &[&NewJob]) -> Result<(), AppError> {
        let titles: Vec<&str> = jobs.iter().take(5).map(|j| j.title.as_str()).collect();
        log::info!(
            "📧 Alert for {}: {} new job(s) [{}]",
            subscriber.email,
            jobs.len(),
            titles.join(" | ")
        );
        Ok(())
    }
}

/// Does a subscriber's free-text preference accept this job?
/// Terms are comma separated; an empty preference accepts everything.
pub fn matches_preferences(preferences: &str, job: &NewJob) -> bool {
    let terms: Vec<String> = preferences
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() {
        return true;
    }

    let haystack = format!("{} {} {}", job.title, job.location, job.raw_text).to_lowercase();

    terms.iter().any(|term| {
        term_matches(term, job.category, &haystack)
            || (term.contains(' ')
                && term
                    .split_whitespace()
                    .any(|word| term_matches(word, job.category, &haystack)))
    })
}

fn term_matches(term: &str, category: Category, haystack: &str) -> bool {
    match term.parse::<Category>() {
        Ok(wanted) => wanted == category,
        Err(_) => contains_term(haystack, term),
    }
}

/// Pairs each active subscriber with the jobs they want to hear about
pub fn plan_alerts<'a>(
    subscribers: &'a [Subscriber],
    jobs: &'a [NewJob],
) -> Vec<(&'a Subscriber, Vec<&'a NewJob>)> {
    subscribers
        .iter()
        .filter(|s| s.is_active)
        .map(|s| {
            let matching: Vec<&NewJob> = jobs
                .iter()
                .filter(|job| matches_preferences(&s.preferences, job))
                .collect();
            (s, matching)
        })
        .filter(|(_, matching)| !matching.is_empty())
        .collect()
}

/// Sends every planned alert; failures are logged and skipped.
/// Returns how many subscribers were notified.
pub async fn send_planned(
    dispatcher: &dyn AlertDispatcher,
    plan: Vec<(&Subscriber, Vec<&NewJob>)>,
) -> usize {
    let mut sent = 0;

    for (subscriber, jobs) in plan {
        match dispatcher.dispatch(subscriber, &jobs).await {
            Ok(()) => sent += 1,
            Err(e) => log::warn!("⚠️  Alert to {} failed: {}", subscriber.email, e),
        }
    }

    sent
}

/// Notifies active subscribers about freshly inserted jobs
pub async fn dispatch_alerts(
    db: &MongoDB,
    dispatcher: &dyn AlertDispatcher,
    new_jobs: &[NewJob],
) -> Result<usize, AppError> {
    if new_jobs.is_empty() {
        return Ok(0);
    }

    let subscribers: Vec<Subscriber> = db
        .collection::<Subscriber>(SUBSCRIBERS)
        .find(doc! { "is_active": true })
        .await?
        .try_collect()
        .await?;

    let plan = plan_alerts(&subscribers, new_jobs);
    let sent = send_planned(dispatcher, plan).await;

    log::info!("📧 Alerts sent to {}/{} subscribers", sent, subscribers.len());

    Ok(sent)
}
