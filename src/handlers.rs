use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::CourseError,
    extract::{CourseId, JsonInput, QueryInput},
    models::{
        Course, CoursePage, CreateCourseRequest, DeleteResponse, ListCoursesQuery,
        UpdateCourseRequest, WhoAmI,
    },
};

// --- Handlers ---
//
// Thin HTTP adapters over `CourseService`. `AuthUser` is always the first
// extractor so an unauthenticated request is rejected before any input is read.

/// list_courses
///
/// [Authenticated Route] Pages through the caller's courses, newest first.
#[utoipa::path(
    get,
    path = "/courses",
    params(ListCoursesQuery),
    responses(
        (status = 200, description = "One page of the caller's courses", body = CoursePage),
        (status = 400, description = "Invalid paging parameters", body = crate::error::ErrorBody),
        (status = 401, description = "Unauthenticated", body = crate::error::ErrorBody)
    )
)]
pub async fn list_courses(
    caller: AuthUser,
    State(state): State<AppState>,
    QueryInput(query): QueryInput<ListCoursesQuery>,
) -> Result<Json<CoursePage>, CourseError> {
    let page = state.courses.list(&caller, &query).await?;
    Ok(Json(page))
}

/// get_course
///
/// [Authenticated Route] A single course owned by the caller.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Found", body = Course),
        (status = 404, description = "Not found or not owned", body = crate::error::ErrorBody)
    )
)]
pub async fn get_course(
    caller: AuthUser,
    State(state): State<AppState>,
    CourseId(id): CourseId,
) -> Result<Json<Course>, CourseError> {
    let course = state.courses.get_by_id(&caller, id).await?;
    Ok(Json(course))
}

/// create_course
///
/// [Authenticated Route] Creates a course owned by the caller.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 400, description = "Validation failure", body = crate::error::ErrorBody)
    )
)]
pub async fn create_course(
    caller: AuthUser,
    State(state): State<AppState>,
    JsonInput(payload): JsonInput<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), CourseError> {
    let course = state.courses.create(&caller, &payload).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// update_course
///
/// [Authenticated Route] Partially updates a course owned by the caller.
/// Mounted on both PUT and PATCH.
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 400, description = "Validation failure", body = crate::error::ErrorBody),
        (status = 404, description = "Not found or not owned", body = crate::error::ErrorBody)
    )
)]
pub async fn update_course(
    caller: AuthUser,
    State(state): State<AppState>,
    CourseId(id): CourseId,
    JsonInput(payload): JsonInput<UpdateCourseRequest>,
) -> Result<Json<Course>, CourseError> {
    let course = state.courses.update(&caller, id, &payload).await?;
    Ok(Json(course))
}

/// delete_course
///
/// [Authenticated Route] Deletes a course owned by the caller.
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Deleted", body = DeleteResponse),
        (status = 404, description = "Not found or not owned", body = crate::error::ErrorBody)
    )
)]
pub async fn delete_course(
    caller: AuthUser,
    State(state): State<AppState>,
    CourseId(id): CourseId,
) -> Result<Json<DeleteResponse>, CourseError> {
    let ack = state.courses.delete(&caller, id).await?;
    Ok(Json(ack))
}

/// get_me
///
/// [Authenticated Route] Echoes the identity the gate resolved for this request.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Caller identity", body = WhoAmI))
)]
pub async fn get_me(AuthUser { id }: AuthUser) -> Json<WhoAmI> {
    Json(WhoAmI { id })
}
