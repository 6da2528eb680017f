//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, NullOrdering, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use uuid::Uuid;

use quill_core::domain::user::mask_email;
use quill_core::domain::{Post, Role, User};
use quill_core::error::RepoError;
use quill_core::pagination::PageRequest;
use quill_core::ports::{PostRepository, UserRepository};
use quill_core::query::{PostQuery, SortField, SortOrder};

use super::entity::post::{self, BlogStatus, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity, UserRole};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL blog repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// `%fragment%` with LIKE metacharacters escaped.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn ilike(column: &str, fragment: &str) -> SimpleExpr {
    Expr::cust_with_values(format!("{column} ILIKE ?"), [like_pattern(fragment)])
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_ids_by_name(&self, fragment: &str) -> Result<Vec<Uuid>, RepoError> {
        UserEntity::find()
            .select_only()
            .column(user::Column::Id)
            .filter(ilike("name", fragment))
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, RepoError> {
        UserEntity::find()
            .filter(user::Column::Role.eq(UserRole::from(role)))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<User>, u64), RepoError> {
        let total = UserEntity::find()
            .count(&self.db)
            .await
            .map_err(map_db_err)?;

        let users = UserEntity::find()
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .offset(page.skip())
            .limit(u64::from(page.limit))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok((users.into_iter().map(Into::into).collect(), total))
    }
}

/// Build the filtered select for a post query, without ordering or paging.
pub(crate) fn filtered(query: &PostQuery) -> Select<PostEntity> {
    let mut cond = Condition::all();

    if let Some(status) = query.status {
        cond = cond.add(post::Column::Status.eq(BlogStatus::from(status)));
    }
    if let Some(ids) = &query.author_ids {
        cond = cond.add(post::Column::AuthorId.is_in(ids.clone()));
    }
    if let Some(search) = &query.search {
        let pattern = like_pattern(search);
        cond = cond.add(Expr::cust_with_values(
            "(title ILIKE ? OR content ILIKE ? OR EXISTS \
             (SELECT 1 FROM jsonb_array_elements_text(tags) AS tag WHERE tag ILIKE ?))",
            [pattern.clone(), pattern.clone(), pattern],
        ));
    }
    if let Some(category) = &query.category {
        cond = cond.add(ilike("category", category));
    }
    if let Some(tag) = &query.tag {
        let needle = serde_json::json!([tag.to_lowercase()]).to_string();
        cond = cond.add(Expr::cust_with_values("tags @> ?::jsonb", [needle]));
    }

    PostEntity::find().filter(cond)
}

fn ordered(select: Select<PostEntity>, query: &PostQuery) -> Select<PostEntity> {
    let order = match query.sort.order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    let select = match query.sort.field {
        SortField::CreatedAt => select.order_by(post::Column::CreatedAt, order.clone()),
        SortField::UpdatedAt => select.order_by(post::Column::UpdatedAt, order.clone()),
        SortField::Title => select.order_by(post::Column::Title, order.clone()),
        SortField::Views => select.order_by(post::Column::Views, order.clone()),
        // Unpublished rows sort as the smallest value.
        SortField::PublishedAt => {
            let nulls = match query.sort.order {
                SortOrder::Asc => NullOrdering::First,
                SortOrder::Desc => NullOrdering::Last,
            };
            select.order_by_with_nulls(post::Column::PublishedAt, order.clone(), nulls)
        }
    };
    select.order_by(post::Column::Id, order)
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn search(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        let total = filtered(query)
            .count(&self.db)
            .await
            .map_err(map_db_err)?;

        let posts = ordered(filtered(query), query)
            .offset(page.skip())
            .limit(u64::from(page.limit))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(total, returned = posts.len(), "Blog search");
        Ok((posts.into_iter().map(Into::into).collect(), total))
    }

    async fn increment_views(&self, id: Uuid) -> Result<u64, RepoError> {
        let updated = PostEntity::update_many()
            .col_expr(post::Column::Views, Expr::col(post::Column::Views).add(1))
            .filter(post::Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await
            .map_err(map_db_err)?;

        updated
            .into_iter()
            .next()
            .map(|model| u64::try_from(model.views).unwrap_or(0))
            .ok_or(RepoError::NotFound)
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let result = PostEntity::delete_many()
            .filter(post::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}
