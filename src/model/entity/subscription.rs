use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A row here means the user follows the course, nothing more.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Subscription {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Subscription {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Subscription
    }
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SubscriptionCreate {
    pub user_id: Uuid,
    pub course_id: Uuid,
}

impl SubscriptionCreate {
    pub fn new(user_id: Uuid, course_id: Uuid) -> Self {
        Self { user_id, course_id }
    }
}

#[async_trait]
impl CrudRepository<Subscription, SubscriptionCreate, Uuid> for Subscription {
    /// Subscribing twice is a no-op that returns the existing row.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SubscriptionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO subscriptions (id, user_id, course_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (user_id, course_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, course_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.course_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SubscriptionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE subscriptions SET user_id = $1, course_id = $2 WHERE id = $3")
            .bind(data.user_id)
            .bind(data.course_id)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.user_id = data.user_id;
        self.course_id = data.course_id;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM subscriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;

        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM subscriptions WHERE user_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3",
        )
        .bind(actor.user_id())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Subscription {
    /// Live existence check for the (user, course) pair.
    pub async fn exists_for(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM subscriptions WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(exists)
    }

    pub async fn find_for(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM subscriptions WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(mm.executor())
            .await?;

        Ok(result)
    }

    /// Flips the actor's subscription to the course and returns the new state.
    pub async fn toggle(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<bool> {
        match Self::find_for(mm, actor, actor.user_id(), course_id).await? {
            Some(existing) => {
                existing.delete(mm, actor).await?;
                Ok(false)
            }
            None => {
                Self::create(mm, actor, SubscriptionCreate::new(actor.user_id(), course_id)).await?;
                Ok(true)
            }
        }
    }
}

impl_paginatable_for!(Subscription, SubscriptionCreate, Uuid);

