//! Post listing filters and ordering.

use std::cmp::Ordering;
use std::str::FromStr;

use uuid::Uuid;

use crate::domain::{Post, PostStatus};
use crate::error::DomainError;

/// Sortable post fields, named as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    Title,
    Views,
}

impl FromStr for SortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            "publishedAt" => Ok(SortField::PublishedAt),
            "title" => Ok(SortField::Title),
            "views" => Ok(SortField::Views),
            _ => Err(DomainError::validation(
                "Invalid sortBy. Must be one of createdAt, updatedAt, publishedAt, title, views",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(DomainError::validation(
                "Invalid sortOrder. Must be asc or desc",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl PostSort {
    pub fn newest_first() -> Self {
        Self::default()
    }

    /// Compare two posts under this ordering. Ties fall back to id so that
    /// pages are stable.
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        let ord = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::PublishedAt => a.published_at.cmp(&b.published_at),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Views => a.views.cmp(&b.views),
        }
        .then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

/// Filters for a post listing; every set field must match.
///
/// `author_ids` is the author-name filter after resolution to ids. `Some`
/// with an empty list matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub author_ids: Option<Vec<Uuid>>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: PostSort,
}

impl PostQuery {
    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_ids: Some(vec![author_id]),
            ..Self::default()
        }
    }

    /// True when the author filter resolved to nobody.
    pub fn matches_nothing(&self) -> bool {
        self.author_ids.as_ref().is_some_and(Vec::is_empty)
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.status.is_some_and(|status| post.status != status) {
            return false;
        }
        if let Some(ids) = &self.author_ids {
            if !ids.contains(&post.author_id) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = contains_ci(&post.title, &needle)
                || contains_ci(&post.content, &needle)
                || post.tags.iter().any(|tag| contains_ci(tag, &needle));
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !contains_ci(&post.category, &category.to_lowercase()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            let tag = tag.to_lowercase();
            if !post.tags.iter().any(|t| t.to_lowercase() == tag) {
                return false;
            }
        }
        true
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Drop blank filter values so `?search=` behaves like no filter at all.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
