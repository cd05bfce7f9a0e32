use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use crate::{
    error::RepositoryError,
    models::{Course, CreateCourseRequest, UpdateCourseRequest},
};

/// Column list shared by every statement that returns a full course row.
const COURSE_COLUMNS: &str = "id, user_id, title, description, instructor, duration, \
     level, category, price, image_url, created_at";

/// Repository Trait
///
/// Abstract contract for course persistence. Every method that targets a single
/// row takes both the row id and the owner id, and implementations must apply
/// both as query predicates: the owner filter is never a check done after the fetch.
///
/// **Send + Sync + async_trait** keep `Arc<dyn Repository>` usable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    /// One window of the owner's courses, newest first, plus the total number
    /// of rows matching the owner and search filter (ignoring the window).
    async fn list_courses(
        &self,
        owner: Uuid,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Course>, i64), RepositoryError>;

    async fn get_course(&self, id: Uuid, owner: Uuid) -> Result<Option<Course>, RepositoryError>;

    /// Id-only existence probe, scoped by owner.
    async fn find_course_id(&self, id: Uuid, owner: Uuid) -> Result<Option<Uuid>, RepositoryError>;

    async fn insert_course(
        &self,
        owner: Uuid,
        req: &CreateCourseRequest,
    ) -> Result<Course, RepositoryError>;

    /// Applies the present fields only. `None` when no row matched id + owner.
    async fn update_course(
        &self,
        id: Uuid,
        owner: Uuid,
        req: &UpdateCourseRequest,
    ) -> Result<Option<Course>, RepositoryError>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete_course(&self, id: Uuid, owner: Uuid) -> Result<u64, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Escapes LIKE metacharacters so the term matches as a literal substring.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Owner predicate plus the optional title/description search.
    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, owner: Uuid, search: Option<&str>) {
        builder.push(" WHERE user_id = ");
        builder.push_bind(owner);

        if let Some(term) = search {
            let pattern = like_pattern(term);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_courses
    ///
    /// Runs the count and the windowed select as two statements built from the
    /// same filter, so a page past the end still reports the real total.
    async fn list_courses(
        &self,
        owner: Uuid,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Course>, i64), RepositoryError> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM courses");
        Self::push_filters(&mut count, owner, search);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM courses"));
        Self::push_filters(&mut select, owner, search);
        // `id` breaks ties between rows created in the same instant.
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        select.push_bind(limit);
        select.push(" OFFSET ");
        select.push_bind(offset);

        let courses = select
            .build_query_as::<Course>()
            .fetch_all(&self.pool)
            .await?;

        Ok((courses, total))
    }

    async fn get_course(&self, id: Uuid, owner: Uuid) -> Result<Option<Course>, RepositoryError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 AND user_id = $2");
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn find_course_id(&self, id: Uuid, owner: Uuid) -> Result<Option<Uuid>, RepositoryError> {
        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM courses WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found)
    }

    /// insert_course
    ///
    /// `user_id` always comes from the caller identity; `id` and `created_at`
    /// are generated by the database.
    async fn insert_course(
        &self,
        owner: Uuid,
        req: &CreateCourseRequest,
    ) -> Result<Course, RepositoryError> {
        let sql = format!(
            "INSERT INTO courses \
                (user_id, title, description, instructor, duration, level, category, price, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COURSE_COLUMNS}"
        );
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(owner)
            .bind(&req.title)
            .bind(&req.description)
            .bind(&req.instructor)
            .bind(&req.duration)
            .bind(req.level.as_str())
            .bind(&req.category)
            .bind(req.price)
            .bind(req.image_url_or_empty())
            .fetch_one(&self.pool)
            .await?;
        Ok(course)
    }

    /// update_course
    ///
    /// Uses `COALESCE` so absent fields keep their stored value. Scoped by
    /// `id AND user_id`; identity columns are never written.
    async fn update_course(
        &self,
        id: Uuid,
        owner: Uuid,
        req: &UpdateCourseRequest,
    ) -> Result<Option<Course>, RepositoryError> {
        let sql = format!(
            "UPDATE courses \
             SET title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 instructor = COALESCE($5, instructor), \
                 duration = COALESCE($6, duration), \
                 level = COALESCE($7, level), \
                 category = COALESCE($8, category), \
                 price = COALESCE($9, price), \
                 image_url = COALESCE($10, image_url) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COURSE_COLUMNS}"
        );
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(owner)
            .bind(req.title.as_deref())
            .bind(req.description.as_deref())
            .bind(req.instructor.as_deref())
            .bind(req.duration.as_deref())
            .bind(req.level.map(|level| level.as_str()))
            .bind(req.category.as_deref())
            .bind(req.price)
            .bind(req.image_url.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn delete_course(&self, id: Uuid, owner: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// InMemoryRepository
///
/// A `Repository` held in process memory. Used by the test suites and by
/// embedders that want the API without a database. Applies the same owner
/// scoping, ordering and search semantics as the Postgres implementation.
#[derive(Default)]
pub struct InMemoryRepository {
    rows: RwLock<Vec<Course>>,
    /// When set, every call fails with `RepositoryError::Unavailable`.
    failing: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.failing {
            return Err(RepositoryError::Unavailable(
                "simulated persistence failure".to_string(),
            ));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Course>>, RepositoryError> {
        self.check_available()?;
        self.rows
            .read()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Course>>, RepositoryError> {
        self.check_available()?;
        self.rows
            .write()
            .map_err(|_| RepositoryError::Unavailable("lock poisoned".to_string()))
    }
}

fn matches_search(course: &Course, needle: &str) -> bool {
    course.title.to_lowercase().contains(needle)
        || course.description.to_lowercase().contains(needle)
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_courses(
        &self,
        owner: Uuid,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Course>, i64), RepositoryError> {
        let rows = self.read()?;
        let needle = search.map(str::to_lowercase);
        let mut matching: Vec<&Course> = rows
            .iter()
            .filter(|c| c.user_id == owner)
            .filter(|c| needle.as_deref().is_none_or(|n| matches_search(c, n)))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn get_course(&self, id: Uuid, owner: Uuid) -> Result<Option<Course>, RepositoryError> {
        let rows = self.read()?;
        Ok(rows
            .iter()
            .find(|c| c.id == id && c.user_id == owner)
            .cloned())
    }

    async fn find_course_id(&self, id: Uuid, owner: Uuid) -> Result<Option<Uuid>, RepositoryError> {
        let rows = self.read()?;
        Ok(rows
            .iter()
            .find(|c| c.id == id && c.user_id == owner)
            .map(|c| c.id))
    }

    async fn insert_course(
        &self,
        owner: Uuid,
        req: &CreateCourseRequest,
    ) -> Result<Course, RepositoryError> {
        let mut rows = self.write()?;
        // Strictly increasing, like a database clock at microsecond precision.
        let now = Utc::now();
        let created_at = rows
            .iter()
            .map(|c| c.created_at)
            .max()
            .map_or(now, |latest| now.max(latest + chrono::Duration::microseconds(1)));
        let course = Course {
            id: Uuid::new_v4(),
            user_id: owner,
            title: req.title.clone(),
            description: req.description.clone(),
            instructor: req.instructor.clone(),
            duration: req.duration.clone(),
            level: req.level,
            category: req.category.clone(),
            price: req.price,
            image_url: req.image_url_or_empty().to_string(),
            created_at,
        };
        rows.push(course.clone());
        Ok(course)
    }

    async fn update_course(
        &self,
        id: Uuid,
        owner: Uuid,
        req: &UpdateCourseRequest,
    ) -> Result<Option<Course>, RepositoryError> {
        let mut rows = self.write()?;
        let Some(course) = rows.iter_mut().find(|c| c.id == id && c.user_id == owner) else {
            return Ok(None);
        };
        if let Some(title) = &req.title {
            course.title = title.clone();
        }
        if let Some(description) = &req.description {
            course.description = description.clone();
        }
        if let Some(instructor) = &req.instructor {
            course.instructor = instructor.clone();
        }
        if let Some(duration) = &req.duration {
            course.duration = duration.clone();
        }
        if let Some(level) = req.level {
            course.level = level;
        }
        if let Some(category) = &req.category {
            course.category = category.clone();
        }
        if let Some(price) = req.price {
            course.price = price;
        }
        if let Some(image_url) = &req.image_url {
            course.image_url = image_url.clone();
        }
        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: Uuid, owner: Uuid) -> Result<u64, RepositoryError> {
        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|c| !(c.id == id && c.user_id == owner));
        Ok((before - rows.len()) as u64)
    }
}
