//! Exercises `PostgresRepository` against a live database.
//!
//! Requires `DATABASE_URL`; run with `cargo test -- --ignored`.

use coursehub::{
    models::{CourseLevel, CreateCourseRequest, UpdateCourseRequest},
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

fn request(title: &str, description: &str) -> CreateCourseRequest {
    CreateCourseRequest {
        title: title.to_string(),
        description: description.to_string(),
        instructor: "Test Instructor".to_string(),
        duration: "3 hours".to_string(),
        level: CourseLevel::Beginner,
        category: "Database".to_string(),
        price: 0.0,
        image_url: None,
    }
}

// --- Tests ---

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_and_get_are_owner_scoped() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let owner = Uuid::new_v4();

    let created = repo.insert_course(owner, &request("Indexes", "B-trees")).await.unwrap();
    assert_eq!(created.user_id, owner);
    assert_eq!(created.image_url, "");

    let fetched = repo.get_course(created.id, owner).await.unwrap();
    assert_eq!(fetched.map(|c| c.id), Some(created.id));

    assert!(repo.get_course(created.id, Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.find_course_id(created.id, Uuid::new_v4()).await.unwrap().is_none());
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_search_and_window() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let owner = Uuid::new_v4();

    repo.insert_course(owner, &request("Rust Backend", "services")).await.unwrap();
    repo.insert_course(owner, &request("Go Frontend", "wasm and RUST interop")).await.unwrap();
    repo.insert_course(owner, &request("50% Off Basics", "sale")).await.unwrap();

    let (all, total) = repo.list_courses(owner, None, 0, 2).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].title, "50% Off Basics");

    let (_, rust_total) = repo.list_courses(owner, Some("rust"), 0, 10).await.unwrap();
    assert_eq!(rust_total, 2);

    let (percent, percent_total) = repo.list_courses(owner, Some("%"), 0, 10).await.unwrap();
    assert_eq!(percent_total, 1);
    assert_eq!(percent[0].title, "50% Off Basics");

    let (beyond, beyond_total) = repo.list_courses(owner, None, 30, 10).await.unwrap();
    assert!(beyond.is_empty());
    assert_eq!(beyond_total, 3);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_and_delete_respect_owner() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let owner = Uuid::new_v4();
    let created = repo.insert_course(owner, &request("Before", "desc")).await.unwrap();

    let update = UpdateCourseRequest {
        price: Some(12.5),
        level: Some(CourseLevel::Advanced),
        ..UpdateCourseRequest::default()
    };
    assert!(repo.update_course(created.id, Uuid::new_v4(), &update).await.unwrap().is_none());

    let updated = repo.update_course(created.id, owner, &update).await.unwrap().unwrap();
    assert_eq!(updated.price, 12.5);
    assert_eq!(updated.level, CourseLevel::Advanced);
    assert_eq!(updated.title, "Before");
    assert_eq!(updated.created_at, created.created_at);

    assert_eq!(repo.delete_course(created.id, Uuid::new_v4()).await.unwrap(), 0);
    assert_eq!(repo.delete_course(created.id, owner).await.unwrap(), 1);
    assert_eq!(repo.delete_course(created.id, owner).await.unwrap(), 0);
}
