use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

/// A discussion thread attached to a book (`GET /books/threads/`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub book: Option<i64>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for `POST /books/threads/create/`
#[derive(Debug, Clone, Serialize)]
pub struct NewThread {
    pub book: i64,
    pub title: String,
    pub content: String,
}

/// Body for `PUT /books/threads/{id}/update/`
#[derive(Debug, Clone, Serialize)]
pub struct ThreadUpdate {
    pub title: String,
    pub content: String,
}

/// Result of toggling a like (`POST /books/threads/{id}/like/`).
/// Field names vary between backend revisions, so both spellings parse.
#[derive(Debug, Clone, Deserialize)]
pub struct LikeStatus {
    #[serde(default)]
    pub liked: bool,
    #[serde(default, alias = "like_count")]
    pub likes_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_thread_with_nested_user() {
        let json = r#"{
            "id": 3,
            "title": "Thoughts on the ending",
            "content": "No spoilers please",
            "book": 7,
            "user": {"email": "a@b.com", "username": "reader"},
            "likes_count": 2,
            "created_at": "2025-05-01T09:30:00Z"
        }"#;
        let thread: Thread = serde_json::from_str(json).expect("thread JSON should parse");
        assert_eq!(thread.book, Some(7));
        assert_eq!(thread.likes_count, 2);
        assert_eq!(
            thread.user.as_ref().map(|u| u.display_name()),
            Some("reader")
        );
    }

    #[test]
    fn test_parse_like_status_alias() {
        let a: LikeStatus = serde_json::from_str(r#"{"liked": true, "like_count": 4}"#)
            .expect("like_count spelling should parse");
        assert!(a.liked);
        assert_eq!(a.likes_count, 4);

        let b: LikeStatus = serde_json::from_str(r#"{"liked": false, "likes_count": 0}"#)
            .expect("likes_count spelling should parse");
        assert!(!b.liked);
        assert_eq!(b.likes_count, 0);
    }
}
