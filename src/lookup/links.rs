// Task-store and forum link handling
//
// Task links are Notion page URLs (`notion.so` or `notion.site`, any
// workspace subdomain). Forum thread links are Discord channel URLs of the
// form https://discord.com/channels/<guild>/<thread>/<thread>.

use regex::Regex;
use std::sync::OnceLock;
use crate::models::ThreadId;

fn task_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)https?://(?:[^\s/]+\.)?notion\.(?:so|site)/[^\s<>]+")
            .expect("task url pattern is valid")
    })
}

fn page_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}|[0-9a-f]{32})")
            .expect("page id pattern is valid")
    })
}

fn thread_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)https?://(?:www\.|ptb\.|canary\.)?discord(?:app)?\.com/channels/(\d+)/(\d+)")
            .expect("thread url pattern is valid")
    })
}

// Punctuation that surrounds links in chat text but is never part of them
const TRAILING_PUNCTUATION: &[char] = &[')', ']', '>', '.', ',', ';', ':', '!', '?', '"', '\'', '*', '_', '`'];

/// All task-store links in `text`, in order of appearance
pub fn find_task_urls(text: &str) -> Vec<String> {
    task_url_regex()
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION).to_string())
        .collect()
}

/// First task-store link in `text`
pub fn first_task_url(text: &str) -> Option<String> {
    find_task_urls(text).into_iter().next()
}

/// Whether `text` contains a task-store link
pub fn contains_task_url(text: &str) -> bool {
    task_url_regex().is_match(text)
}

/// Page id embedded in a task-store link, without hyphens, lowercase
pub fn extract_page_id(url: &str) -> Option<String> {
    page_id_regex()
        .find(url)
        .map(|m| m.as_str().replace('-', "").to_lowercase())
}

/// Whether `url` carries the given database id (hyphens and case ignored)
pub fn belongs_to_database(url: &str, database_id: &str) -> bool {
    let wanted = database_id.replace('-', "").to_lowercase();
    if wanted.is_empty() {
        return true;
    }
    url.replace('-', "").to_lowercase().contains(&wanted)
}

/// Forum link for a thread
pub fn thread_url(guild_id: u64, thread_id: ThreadId) -> String {
    format!("https://discord.com/channels/{}/{}/{}", guild_id, thread_id, thread_id)
}

/// Thread id a forum link points at
pub fn thread_id_from_url(url: &str) -> Option<ThreadId> {
    thread_url_regex()
        .captures(url)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}
