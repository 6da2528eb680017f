use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

const TITLE_MIN_CHARS: usize = 5;
const TITLE_MAX_CHARS: usize = 200;
const CONTENT_MIN_CHARS: usize = 50;
const EXCERPT_MAX_CHARS: usize = 300;
const DERIVED_EXCERPT_CHARS: usize = 150;
const COMMENT_MAX_CHARS: usize = 1000;
const WORDS_PER_MINUTE: usize = 200;

pub const DEFAULT_CATEGORY: &str = "General";

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            _ => Err(DomainError::validation(
                "Invalid status. Must be draft, published, or archived",
            )),
        }
    }
}

/// A single like; at most one per user on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A comment in a post's append-only thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Post entity - a blog post with its engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub tags: Vec<String>,
    pub category: String,
    pub read_time: u32,
    pub views: u64,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft. Inputs must already be validated.
    pub fn new(
        author_id: Uuid,
        title: String,
        content: String,
        excerpt: Option<String>,
        tags: Vec<String>,
        category: String,
    ) -> Self {
        let now = Utc::now();
        let excerpt = excerpt.unwrap_or_else(|| derive_excerpt(&content));
        Self {
            id: Uuid::new_v4(),
            author_id,
            slug: slug_for(&title, now),
            read_time: read_time(&content),
            title,
            content,
            excerpt,
            status: PostStatus::Draft,
            tags,
            category,
            views: 0,
            likes: Vec::new(),
            comments: Vec::new(),
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.iter().any(|like| like.user_id == user_id)
    }

    /// Replace the body, recomputing read time. A derived excerpt follows the
    /// new content; a hand-written one is kept.
    pub fn set_content(&mut self, content: String) {
        if self.excerpt == derive_excerpt(&self.content) {
            self.excerpt = derive_excerpt(&content);
        }
        self.read_time = read_time(&content);
        self.content = content;
    }
}

/// URL-safe slug of a title. Only ASCII letters and digits survive;
/// whitespace, `-` and `_` collapse into single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("post");
    }
    slug
}

/// Slug made unique by the creation time in epoch milliseconds.
pub fn slug_for(title: &str, created_at: DateTime<Utc>) -> String {
    format!("{}-{}", slugify(title), created_at.timestamp_millis())
}

/// Minutes to read at 200 words per minute, rounded up.
pub fn read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

/// Excerpt taken from the first 150 characters of the content.
pub fn derive_excerpt(content: &str) -> String {
    let mut chars = content.char_indices();
    match chars.nth(DERIVED_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

pub fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    let len = title.chars().count();
    if len < TITLE_MIN_CHARS {
        return Err(DomainError::validation(format!(
            "Title must be at least {TITLE_MIN_CHARS} characters"
        )));
    }
    if len > TITLE_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "Title cannot exceed {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

pub fn validate_content(content: &str) -> Result<String, DomainError> {
    if content.chars().count() < CONTENT_MIN_CHARS {
        return Err(DomainError::validation(format!(
            "Content must be at least {CONTENT_MIN_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

pub fn validate_excerpt(excerpt: &str) -> Result<String, DomainError> {
    if excerpt.chars().count() > EXCERPT_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "Excerpt cannot exceed {EXCERPT_MAX_CHARS} characters"
        )));
    }
    Ok(excerpt.to_string())
}

pub fn validate_comment(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::validation("Comment content is required"));
    }
    if content.chars().count() > COMMENT_MAX_CHARS {
        return Err(DomainError::validation(format!(
            "Comment cannot exceed {COMMENT_MAX_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

/// Trim and lowercase tags, dropping blanks and duplicates.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

pub fn normalize_category(category: Option<&str>) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn body(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    #[test]
    fn slugify_strips_punctuation_and_collapses_separators() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust -- and_Friends  "), "rust-and-friends");
        assert_eq!(slugify("A.B (c) 'd' \"e\" f:g@h"), "ab-c-d-e-fgh");
        assert_eq!(slugify("!!!"), "post");
    }

    #[test]
    fn slug_carries_creation_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(slug_for("My First Post", at), "my-first-post-1700000000123");
    }

    #[test]
    fn read_time_rounds_up() {
        assert_eq!(read_time(&body(1)), 1);
        assert_eq!(read_time(&body(200)), 1);
        assert_eq!(read_time(&body(201)), 2);
    }

    #[test]
    fn excerpt_is_first_150_chars() {
        let short = "x".repeat(150);
        assert_eq!(derive_excerpt(&short), short);

        let long = "é".repeat(151);
        let excerpt = derive_excerpt(&long);
        assert_eq!(excerpt.chars().count(), 153);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn tags_are_normalized_as_a_set() {
        let tags = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "WebDev".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["rust", "webdev"]);
    }

    #[test]
    fn blank_category_defaults_to_general() {
        assert_eq!(normalize_category(None), "General");
        assert_eq!(normalize_category(Some("   ")), "General");
        assert_eq!(normalize_category(Some(" Tech ")), "Tech");
    }

    #[test]
    fn field_rules() {
        assert!(validate_title("four").is_err());
        assert_eq!(validate_title("  Five!  ").unwrap(), "Five!");
        assert!(validate_content(&"x".repeat(49)).is_err());
        assert!(validate_content(&"x".repeat(50)).is_ok());
        assert!(validate_excerpt(&"x".repeat(301)).is_err());
        assert!(validate_comment("   ").is_err());
        assert!(validate_comment(&"x".repeat(1001)).is_err());
    }

    #[test]
    fn new_post_is_a_derived_draft() {
        let content = body(250);
        let post = Post::new(
            Uuid::new_v4(),
            "Hello World".into(),
            content.clone(),
            None,
            vec![],
            DEFAULT_CATEGORY.into(),
        );
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.read_time, 2);
        assert_eq!(post.excerpt, derive_excerpt(&content));
        assert!(post.slug.starts_with("hello-world-"));
        assert!(post.published_at.is_none());
        assert_eq!(post.views, 0);
    }

    #[test]
    fn content_change_keeps_hand_written_excerpt() {
        let mut derived = Post::new(
            Uuid::new_v4(),
            "Derived".into(),
            body(60),
            None,
            vec![],
            DEFAULT_CATEGORY.into(),
        );
        derived.set_content("fresh ".repeat(40));
        assert_eq!(derived.excerpt, derive_excerpt(&"fresh ".repeat(40)));

        let mut custom = Post::new(
            Uuid::new_v4(),
            "Custom".into(),
            body(60),
            Some("Hand written".into()),
            vec![],
            DEFAULT_CATEGORY.into(),
        );
        custom.set_content(body(500));
        assert_eq!(custom.excerpt, "Hand written");
        assert_eq!(custom.read_time, 3);
    }
}
