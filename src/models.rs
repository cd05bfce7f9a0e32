use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use url::Url;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Default page size for course listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 9;
/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 50;

// --- Core Application Schemas (Mapped to Database) ---

/// CourseLevel
///
/// Closed set of difficulty levels. Enforced server-side both by deserialization
/// and by a CHECK constraint on the `courses.level` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub const ALL: [CourseLevel; 3] = [
        CourseLevel::Beginner,
        CourseLevel::Intermediate,
        CourseLevel::Advanced,
    ];

    /// The textual form stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            CourseLevel::Beginner => "Beginner",
            CourseLevel::Intermediate => "Intermediate",
            CourseLevel::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or supplied level is outside the closed set.
#[derive(Debug, Error)]
#[error("unknown course level `{0}`, expected one of Beginner, Intermediate, Advanced")]
pub struct UnknownLevel(pub String);

impl FromStr for CourseLevel {
    type Err = UnknownLevel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CourseLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == value)
            .ok_or_else(|| UnknownLevel(value.to_string()))
    }
}

impl TryFrom<String> for CourseLevel {
    type Error = UnknownLevel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Course
///
/// A row of the `courses` table. `id`, `user_id` and `created_at` are assigned
/// server-side and never taken from client input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    // Owner. Immutable after insert.
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: String,
    /// Free-form, e.g. "12 hours".
    pub duration: String,
    // Stored as TEXT; decoded through `TryFrom<String>`.
    #[sqlx(try_from = "String")]
    pub level: CourseLevel,
    pub category: String,
    pub price: f64,
    /// Absolute URL, or empty when the course has no image.
    pub image_url: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateCourseRequest
///
/// Input payload for `POST /courses`. Any `id`, `user_id` or `created_at` keys in
/// the body are dropped during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub instructor: String,
    #[validate(length(min = 1, max = 50))]
    pub duration: String,
    pub level: CourseLevel,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CreateCourseRequest {
    /// Runs the derived field rules plus the image URL check.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        merge_image_url_check(self.validate(), self.image_url.as_deref())
    }

    /// The image URL to persist; absent means empty.
    pub fn image_url_or_empty(&self) -> &str {
        self.image_url.as_deref().unwrap_or_default()
    }
}

/// UpdateCourseRequest
///
/// Partial update payload for `PUT/PATCH /courses/{id}`. Each present field is
/// held to the same rules as on create; absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateCourseRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 2000))]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub instructor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50))]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<CourseLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl UpdateCourseRequest {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        merge_image_url_check(self.validate(), self.image_url.as_deref())
    }

    /// True when the payload names no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.instructor.is_none()
            && self.duration.is_none()
            && self.level.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
    }
}

/// ListCoursesQuery
///
/// Query parameters for `GET /courses`.
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ListCoursesQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: i64,
    /// Page size, between 1 and 50.
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: i64,
    /// Case-insensitive substring matched against title and description.
    #[serde(default)]
    pub search: Option<String>,
}

impl Default for ListCoursesQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
        }
    }
}

impl ListCoursesQuery {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        self.validate()
    }

    /// Row offset of the first course on the requested page. Saturates, so an
    /// absurdly large page is simply past the end.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// The search term, if it would actually filter anything.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

// --- Response Schemas (Output) ---

/// CoursePage
///
/// One window of the caller's courses plus the metadata needed to render pagination.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

impl CoursePage {
    pub fn new(courses: Vec<Course>, total_count: i64, limit: i64, page: i64) -> Self {
        Self {
            courses,
            total_count,
            total_pages: total_pages(total_count, limit),
            current_page: page,
        }
    }
}

/// `ceil(total / limit)`, zero when there is nothing to page through.
pub fn total_pages(total_count: i64, limit: i64) -> i64 {
    if total_count <= 0 || limit <= 0 {
        return 0;
    }
    (total_count + limit - 1) / limit
}

/// DeleteResponse
///
/// Acknowledgement returned by `DELETE /courses/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeleteResponse {
    pub success: bool,
}

/// WhoAmI
///
/// The caller identity as the gate resolved it (`GET /me`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct WhoAmI {
    pub id: Uuid,
}

// --- Validation helpers ---

/// Empty is allowed; anything else must parse as an absolute URL.
pub fn validate_image_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || Url::parse(value).is_ok() {
        return Ok(());
    }
    let mut error = ValidationError::new("url");
    error.message = Some("Image URL must be a valid URL or empty".into());
    Err(error)
}

fn merge_image_url_check(
    derived: Result<(), ValidationErrors>,
    image_url: Option<&str>,
) -> Result<(), ValidationErrors> {
    let mut errors = derived.err().unwrap_or_default();
    if let Some(Err(error)) = image_url.map(validate_image_url) {
        errors.add("image_url", error);
    }
    if errors.errors().is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateCourseRequest {
        CreateCourseRequest {
            title: "A".to_string(),
            description: "d".to_string(),
            instructor: "i".to_string(),
            duration: "1h".to_string(),
            level: CourseLevel::Beginner,
            category: "X".to_string(),
            price: 0.0,
            image_url: None,
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 9), 0);
        assert_eq!(total_pages(9, 9), 1);
        assert_eq!(total_pages(10, 9), 2);
        assert_eq!(total_pages(50, 50), 1);
        assert_eq!(total_pages(51, 50), 2);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let query = ListCoursesQuery {
            page: 3,
            limit: 9,
            search: None,
        };
        assert_eq!(query.offset(), 18);
    }

    #[test]
    fn offset_saturates_on_huge_pages() {
        let query = ListCoursesQuery {
            page: i64::MAX,
            limit: MAX_PAGE_LIMIT,
            search: None,
        };
        assert_eq!(query.offset(), i64::MAX);
    }

    #[test]
    fn empty_search_does_not_filter() {
        let query = ListCoursesQuery {
            search: Some(String::new()),
            ..ListCoursesQuery::default()
        };
        assert_eq!(query.search_term(), None);
    }

    #[test]
    fn title_length_boundaries() {
        let mut req = valid_create();
        req.title = "t".repeat(200);
        assert!(req.check().is_ok());

        req.title = "t".repeat(201);
        assert!(req.check().is_err());

        req.title = String::new();
        assert!(req.check().is_err());
    }

    #[test]
    fn length_is_counted_in_characters() {
        let mut req = valid_create();
        req.duration = "é".repeat(50);
        assert!(req.check().is_ok());
    }

    #[test]
    fn price_must_be_non_negative() {
        let mut req = valid_create();
        req.price = -0.01;
        assert!(req.check().is_err());
        req.price = 0.0;
        assert!(req.check().is_ok());
    }

    #[test]
    fn image_url_accepts_empty_or_absolute() {
        assert!(validate_image_url("").is_ok());
        assert!(validate_image_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_image_url("/relative/a.png").is_err());
        assert!(validate_image_url("not a url").is_err());
    }

    #[test]
    fn level_parses_only_known_values() {
        assert_eq!("Advanced".parse::<CourseLevel>().ok(), Some(CourseLevel::Advanced));
        assert!("Expert".parse::<CourseLevel>().is_err());
        assert!("beginner".parse::<CourseLevel>().is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateCourseRequest::default().is_empty());
        let update = UpdateCourseRequest {
            price: Some(9.99),
            ..UpdateCourseRequest::default()
        };
        assert!(!update.is_empty());
        assert!(update.check().is_ok());
    }
}
