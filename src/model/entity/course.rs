use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    title: String,
    description: String,
    preview: Option<String>,
    owner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub preview: Option<String>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn new(
        id: Uuid,
        title: String,
        description: String,
        preview: Option<String>,
        owner_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            preview,
            owner_id,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, Uuid> for Course {
    /// The acting user becomes the owner of the course.
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let course = sqlx::query_as(
            r#"
            INSERT INTO courses (id, title, description, preview, owner_id)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING id, title, description, preview, owner_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.preview)
        .bind(actor.owner_ref())
        .fetch_one(mm.executor())
        .await?;

        Ok(course)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE courses SET title = $1, description = $2, preview = $3 WHERE id = $4")
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.preview)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.title = data.title;
        self.description = data.description;
        self.preview = data.preview;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;

        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses ORDER BY created_at, id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Course {
    pub async fn find_by_title(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        title: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE title = $1 ORDER BY created_at, id LIMIT 1")
            .bind(title)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Course {
    type OwnerId = Option<Uuid>;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.owner_id)
    }
}

// Utils

/// Course columns plus everything its representation derives, read in one statement
/// so `num_lessons` and `lessons` agree with each other.
#[derive(Debug, sqlx::FromRow)]
pub struct CourseWithLessonsRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub preview: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub num_lessons: i64,
    pub lessons: serde_json::Value,
    pub is_subscribed: bool,
}

const COURSE_WITH_LESSONS_SELECT: &str = r#"
    SELECT
        c.id,
        c.title,
        c.description,
        c.preview,
        c.owner_id,
        c.created_at,
        (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS num_lessons,
        COALESCE(
            (
                SELECT json_agg(
                    json_build_object(
                        'id', l.id,
                        'course_id', l.course_id,
                        'title', l.title,
                        'description', l.description,
                        'preview', l.preview,
                        'video_url', l.video_url,
                        'owner_id', l.owner_id,
                        'created_at', l.created_at
                    )
                    ORDER BY l.created_at, l.id
                )
                FROM lessons l
                WHERE l.course_id = c.id
            ),
            '[]'::json
        ) AS lessons,
        EXISTS (
            SELECT 1 FROM subscriptions s
            WHERE s.course_id = c.id AND s.user_id = $1
        ) AS is_subscribed
    FROM courses c
"#;

impl CourseWithLessonsRow {
    pub async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let query = format!("{COURSE_WITH_LESSONS_SELECT} WHERE c.id = $2");
        let row = sqlx::query_as(&query)
            .bind(actor.user_id())
            .bind(course_id)
            .fetch_optional(mm.executor())
            .await?;

        Ok(row)
    }

    pub async fn fetch_page(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let query = format!("{COURSE_WITH_LESSONS_SELECT} ORDER BY c.created_at, c.id LIMIT $2 OFFSET $3");
        let rows = sqlx::query_as(&query)
            .bind(actor.user_id())
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;

        Ok(rows)
    }
}
