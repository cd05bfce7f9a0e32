use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::CourseError,
    models::{
        Course, CoursePage, CreateCourseRequest, DeleteResponse, ListCoursesQuery,
        UpdateCourseRequest,
    },
    repository::RepositoryState,
};

const NOT_FOUND: &str = "Course not found";
const NOT_FOUND_EDIT: &str = "Course not found or you don't have permission to edit it";
const NOT_FOUND_DELETE: &str = "Course not found or you don't have permission to delete it";

/// CourseService
///
/// The five owner-scoped course operations. Stateless apart from the shared
/// repository handle; every method takes the caller explicitly and passes the
/// caller's id down as a query predicate.
///
/// Update and delete probe for `id AND owner` first so a miss surfaces as
/// `NotFound` instead of a silent zero-row write, then re-scope the write
/// itself by the same predicate. A row removed between the two steps is
/// reported as `NotFound` as well.
#[derive(Clone)]
pub struct CourseService {
    repo: RepositoryState,
}

impl CourseService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// list
    ///
    /// The caller's courses, newest first, optionally filtered by a
    /// case-insensitive substring of title or description. A page past the end
    /// is an empty window with accurate totals.
    pub async fn list(
        &self,
        caller: &AuthUser,
        query: &ListCoursesQuery,
    ) -> Result<CoursePage, CourseError> {
        query.check()?;

        let (courses, total_count) = self
            .repo
            .list_courses(caller.id, query.search_term(), query.offset(), query.limit)
            .await?;

        tracing::debug!(
            owner = %caller.id,
            page = query.page,
            limit = query.limit,
            total_count,
            "listed courses"
        );
        Ok(CoursePage::new(courses, total_count, query.limit, query.page))
    }

    /// get_by_id
    ///
    /// A course owned by someone else is indistinguishable from one that does
    /// not exist.
    pub async fn get_by_id(&self, caller: &AuthUser, id: Uuid) -> Result<Course, CourseError> {
        self.repo
            .get_course(id, caller.id)
            .await?
            .ok_or(CourseError::NotFound(NOT_FOUND))
    }

    /// create
    ///
    /// The owner is always the caller; whatever owner the client sent was
    /// already discarded at deserialization.
    pub async fn create(
        &self,
        caller: &AuthUser,
        req: &CreateCourseRequest,
    ) -> Result<Course, CourseError> {
        req.check()?;

        let course = self.repo.insert_course(caller.id, req).await?;
        tracing::info!(owner = %caller.id, course_id = %course.id, "course created");
        Ok(course)
    }

    /// update
    ///
    /// Validates present fields, probes ownership, then applies the partial
    /// update scoped by `id AND owner`. An update naming no field is a read.
    pub async fn update(
        &self,
        caller: &AuthUser,
        id: Uuid,
        req: &UpdateCourseRequest,
    ) -> Result<Course, CourseError> {
        req.check()?;
        self.ensure_owned(caller, id, NOT_FOUND_EDIT).await?;

        if req.is_empty() {
            return self
                .repo
                .get_course(id, caller.id)
                .await?
                .ok_or(CourseError::NotFound(NOT_FOUND_EDIT));
        }

        match self.repo.update_course(id, caller.id, req).await? {
            Some(course) => {
                tracing::info!(owner = %caller.id, course_id = %id, "course updated");
                Ok(course)
            }
            None => {
                tracing::warn!(owner = %caller.id, course_id = %id, "course vanished before update");
                Err(CourseError::NotFound(NOT_FOUND_EDIT))
            }
        }
    }

    /// delete
    ///
    /// Same two-step shape as `update`. Deleting an already deleted id is `NotFound`.
    pub async fn delete(&self, caller: &AuthUser, id: Uuid) -> Result<DeleteResponse, CourseError> {
        self.ensure_owned(caller, id, NOT_FOUND_DELETE).await?;

        if self.repo.delete_course(id, caller.id).await? == 0 {
            tracing::warn!(owner = %caller.id, course_id = %id, "course vanished before delete");
            return Err(CourseError::NotFound(NOT_FOUND_DELETE));
        }

        tracing::info!(owner = %caller.id, course_id = %id, "course deleted");
        Ok(DeleteResponse { success: true })
    }

    async fn ensure_owned(
        &self,
        caller: &AuthUser,
        id: Uuid,
        message: &'static str,
    ) -> Result<(), CourseError> {
        match self.repo.find_course_id(id, caller.id).await? {
            Some(_) => Ok(()),
            None => {
                tracing::warn!(owner = %caller.id, course_id = %id, "course not owned or missing");
                Err(CourseError::NotFound(message))
            }
        }
    }
}
