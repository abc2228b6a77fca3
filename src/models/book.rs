use serde::{Deserialize, Serialize};

/// A book from the catalog (`GET /books/`).
/// The list endpoint returns abbreviated records; detail fields stay `None`
/// until `fetch_book` fills them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub customer_review_rank: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub pk: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abbreviated_book() {
        let json = r#"{"id": 7, "title": "Snow Crash", "author": "Neal Stephenson"}"#;
        let book: Book = serde_json::from_str(json).expect("abbreviated book should parse");
        assert_eq!(book.id, 7);
        assert_eq!(book.author.as_deref(), Some("Neal Stephenson"));
        assert!(book.description.is_none());
    }
}
