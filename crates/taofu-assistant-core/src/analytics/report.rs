//! Offline analysis of the question log.

use super::{AnalyticsError, QuestionRecord};
use crate::social::Platform;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::Path;
use tracing::warn;

/// How many entries the top lists keep
pub const TOP_N: usize = 10;
/// Window for "recent activity"
pub const RECENT_DAYS: i64 = 7;
/// How many recent questions are listed
pub const RECENT_SHOWN: usize = 5;

/// Read all records from a question log.
///
/// Accepts JSON Lines as well as the older single-array JSON file. A missing
/// file yields no records; unreadable lines are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a legacy array is malformed.
pub async fn load_records(path: &Path) -> Result<Vec<QuestionRecord>, AnalyticsError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(&content)?);
    }

    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(line = line_no + 1, "Skipping unreadable analytics line: {e}"),
        }
    }
    Ok(records)
}

/// Write records as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn export_records(records: &[QuestionRecord], path: &Path) -> Result<(), AnalyticsError> {
    let body = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

/// Records whose question contains `term`, case-insensitively.
#[must_use]
pub fn search<'a>(records: &'a [QuestionRecord], term: &str) -> Vec<&'a QuestionRecord> {
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| r.question.to_lowercase().contains(&needle))
        .collect()
}

/// Counts in descending order; ties keep first-seen order.
fn most_common<K, I>(items: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut order: Vec<(K, usize)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for item in items {
        if let Some(&i) = index.get(&item) {
            order[i].1 += 1;
        } else {
            index.insert(item.clone(), order.len());
            order.push((item, 1));
        }
    }
    // sort_by is stable
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
}

/// Summary of the question log
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    /// Number of recorded questions
    pub total: usize,
    /// Questions per platform, most active first
    pub by_platform: Vec<(Platform, usize)>,
    /// Questions per day, oldest first
    pub by_date: Vec<(NaiveDate, usize)>,
    /// Most asked questions (lower-cased, trimmed)
    pub top_questions: Vec<(String, usize)>,
    /// Most active users
    pub top_users: Vec<(String, usize)>,
    /// Questions within the last [`RECENT_DAYS`] days
    pub recent_count: usize,
    /// The last [`RECENT_SHOWN`] recent questions, in log order
    pub recent: Vec<QuestionRecord>,
}

impl AnalyticsReport {
    /// Summarize `records` relative to `now`
    #[must_use]
    pub fn build(records: &[QuestionRecord], now: NaiveDateTime) -> Self {
        let by_platform = most_common(records.iter().map(|r| r.platform));

        let mut by_date = most_common(records.iter().map(|r| r.timestamp.date()));
        by_date.sort_by_key(|(date, _)| *date);

        let mut top_questions =
            most_common(records.iter().map(|r| r.question.trim().to_lowercase()));
        top_questions.truncate(TOP_N);

        let mut top_users = most_common(records.iter().map(|r| r.username.clone()));
        top_users.truncate(TOP_N);

        let cutoff = now - Duration::days(RECENT_DAYS);
        let recent_all: Vec<&QuestionRecord> =
            records.iter().filter(|r| r.timestamp > cutoff).collect();
        let recent = recent_all
            .iter()
            .skip(recent_all.len().saturating_sub(RECENT_SHOWN))
            .map(|r| (*r).clone())
            .collect();

        Self {
            total: records.len(),
            by_platform,
            by_date,
            top_questions,
            top_users,
            recent_count: recent_all.len(),
            recent,
        }
    }
}

impl fmt::Display for AnalyticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "TAOFU BOT ANALYTICS")?;
        writeln!(f, "{}", "=".repeat(60))?;

        writeln!(f, "\nTotal Questions: {}", self.total)?;

        writeln!(f, "\nPlatform Breakdown:")?;
        for (platform, count) in &self.by_platform {
            writeln!(f, "  {platform}: {count} questions")?;
        }

        writeln!(f, "\nQuestions by Date:")?;
        for (date, count) in &self.by_date {
            writeln!(f, "  {}: {count} questions", date.format("%Y-%m-%d"))?;
        }

        writeln!(f, "\nTop {TOP_N} Most Asked Questions:")?;
        for (i, (question, count)) in self.top_questions.iter().enumerate() {
            writeln!(f, "  {}. \"{question}\" ({count} times)", i + 1)?;
        }

        writeln!(f, "\nTop {TOP_N} Most Active Users:")?;
        for (i, (user, count)) in self.top_users.iter().enumerate() {
            writeln!(f, "  {}. {user}: {count} questions", i + 1)?;
        }

        writeln!(
            f,
            "\nRecent Activity (Last {RECENT_DAYS} Days): {} questions",
            self.recent_count
        )?;
        if !self.recent.is_empty() {
            writeln!(f, "  Recent questions:")?;
            for record in &self.recent {
                writeln!(
                    f,
                    "    [{}] {}: \"{}\"",
                    record.timestamp.format("%m-%d %H:%M"),
                    record.username,
                    record.question
                )?;
            }
        }
        Ok(())
    }
}
