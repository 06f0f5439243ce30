use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, Page, ResourceTyped, check_access,
        entity::{Course, CourseCreate, CourseWithLessonsRow, Subscription},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{courses::CourseResponse, subscriptions::SubscriptionStateResponse},
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler).post(courses_create_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route("/{id}/subscription", post(courses_toggle_subscription_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn validate(payload: &CourseCreate) -> WebResult<()> {
    if payload.title.trim().is_empty() {
        return Err(WebError::resource_bad_request(
            Course::get_resource_type(),
            "title must not be empty",
        ));
    }
    Ok(())
}

async fn find_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))
}

async fn load_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<CourseResponse> {
    CourseResponse::load(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/",
    description = "Page of courses, each with its lessons, lesson count and the caller's subscription state",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = Page<CourseResponse>),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn courses_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let (limit, offset) = (page.limit(), page.offset());

    let (rows, total) = tokio::try_join!(
        CourseWithLessonsRow::fetch_page(state.pool(), user, limit, offset),
        Course::count(state.pool(), user),
    )
    .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let items = CourseResponse::from_rows(rows)
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(Page::new(items, total, limit, offset))))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    description = "Fetch a course with its lessons, lesson count and the caller's subscription state",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to get")
    ),
    responses(
        (status = 200, description = "Course found", body = CourseResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = load_course(&state, user, id).await?;

    Ok((StatusCode::OK, Json(course)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/",
    description = "Create a course owned by the caller",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Invalid course", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate(&payload)?;

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    tracing::debug!("course {} created by {}", created.id(), user.user_id());

    let course = load_course(&state, user, created.id()).await?;

    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}",
    description = "Update a course. Only its owner or an admin may do this",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to update")
    ),
    request_body = CourseCreate,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Invalid course", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate(&payload)?;

    let found = find_course(&state, user, id).await?;
    check_access(state.pool(), user, &found, Some(user.user_id()))
        .await
        .map_err(|e| WebError::from_access_error(Course::get_resource_type(), e))?;

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let course = load_course(&state, user, updated.id()).await?;

    Ok((StatusCode::OK, Json(course)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{course_id}",
    description = "Delete a course together with its lessons and subscriptions",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to delete")
    ),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = find_course(&state, user, id).await?;
    check_access(state.pool(), user, &found, Some(user.user_id()))
        .await
        .map_err(|e| WebError::from_access_error(Course::get_resource_type(), e))?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    tracing::debug!("course {id} deleted by {}", user.user_id());

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/subscription",
    description = "Subscribe to the course, or unsubscribe when already subscribed",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to (un)subscribe")
    ),
    responses(
        (status = 200, description = "Subscription toggled", body = SubscriptionStateResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn courses_toggle_subscription_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, user, id).await?;

    let is_subscribed = Subscription::toggle(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Subscription::get_resource_type(), e))?;
    tracing::debug!("user {} subscribed to {id}: {is_subscribed}", user.user_id());

    Ok((
        StatusCode::OK,
        Json(SubscriptionStateResponse::new(course.id(), is_subscribed)),
    ))
}
