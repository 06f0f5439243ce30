//! API representation of a course.
//!
//! Every native course column is emitted at the top level, followed by the
//! derived `num_lessons`, the nested `lessons` and the per-user `is_subscribed`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::{
        DatabaseResult, ModelManager,
        entity::{Course, CourseWithLessonsRow, Lesson},
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseResponse {
    #[serde(flatten)]
    course: Course,
    num_lessons: i64,
    lessons: Vec<Lesson>,
    is_subscribed: bool,
}

impl CourseResponse {
    pub fn new(course: Course, lessons: Vec<Lesson>, num_lessons: i64, is_subscribed: bool) -> Self {
        Self {
            course,
            num_lessons,
            lessons,
            is_subscribed,
        }
    }

    /// Reads the representation of a course in a single statement, so the
    /// lesson count, the nested lessons and the subscription flag share one
    /// snapshot. `None` when the course does not exist.
    pub async fn load(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let Some(row) = CourseWithLessonsRow::find_by_id(mm, actor, course_id).await? else {
            return Ok(None);
        };

        Ok(Some(Self::try_from(row)?))
    }

    pub fn from_rows(rows: Vec<CourseWithLessonsRow>) -> DatabaseResult<Vec<Self>> {
        Ok(rows
            .into_iter()
            .map(CourseResponse::try_from)
            .collect::<Result<_, _>>()?)
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn num_lessons(&self) -> i64 {
        self.num_lessons
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn is_subscribed(&self) -> bool {
        self.is_subscribed
    }
}

impl TryFrom<CourseWithLessonsRow> for CourseResponse {
    type Error = serde_json::Error;

    fn try_from(row: CourseWithLessonsRow) -> Result<Self, Self::Error> {
        let course = Course::new(
            row.id,
            row.title,
            row.description,
            row.preview,
            row.owner_id,
            row.created_at,
        );

        Ok(Self::new(
            course,
            serde_json::from_value(row.lessons)?,
            row.num_lessons,
            row.is_subscribed,
        ))
    }
}
