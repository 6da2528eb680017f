//! Blog post entity for SeaORM.
//!
//! Tags, likes and comments live on the row as JSONB documents.

use sea_orm::entity::prelude::*;
use sea_orm::{FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};

use quill_core::domain::{Comment, Like, PostStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BlogStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl From<BlogStatus> for PostStatus {
    fn from(status: BlogStatus) -> Self {
        match status {
            BlogStatus::Draft => PostStatus::Draft,
            BlogStatus::Published => PostStatus::Published,
            BlogStatus::Archived => PostStatus::Archived,
        }
    }
}

impl From<PostStatus> for BlogStatus {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Draft => BlogStatus::Draft,
            PostStatus::Published => BlogStatus::Published,
            PostStatus::Archived => BlogStatus::Archived,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Tags(pub Vec<String>);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Likes(pub Vec<Like>);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Comments(pub Vec<Comment>);

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blogs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub excerpt: String,
    pub status: BlogStatus,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Tags,
    pub category: String,
    pub read_time: i32,
    pub views: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub likes: Likes,
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: Comments,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for quill_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            excerpt: model.excerpt,
            status: model.status.into(),
            tags: model.tags.0,
            category: model.category,
            read_time: u32::try_from(model.read_time).unwrap_or(0),
            views: u64::try_from(model.views).unwrap_or(0),
            likes: model.likes.0,
            comments: model.comments.0,
            published_at: model.published_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            title: Set(post.title),
            slug: Set(post.slug),
            content: Set(post.content),
            excerpt: Set(post.excerpt),
            status: Set(post.status.into()),
            tags: Set(Tags(post.tags)),
            category: Set(post.category),
            read_time: Set(i32::try_from(post.read_time).unwrap_or(i32::MAX)),
            views: Set(i64::try_from(post.views).unwrap_or(i64::MAX)),
            likes: Set(Likes(post.likes)),
            comments: Set(Comments(post.comments)),
            published_at: Set(post.published_at.map(Into::into)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
