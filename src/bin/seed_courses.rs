//! Inserts a sample course catalogue for one owner.
//!
//! Courses go through `CourseService`, so they are validated and owned exactly
//! as if the user had created them through the API.

use std::sync::Arc;

use clap::Parser;
use coursehub::{
    CourseService,
    auth::AuthUser,
    models::{CourseLevel, CreateCourseRequest},
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "seed-courses", about = "Seed sample courses for a user")]
struct Args {
    /// Owner of the seeded courses (the identity provider's user id).
    #[arg(long)]
    owner: Uuid,

    /// Insert at most this many courses from the catalogue.
    #[arg(long)]
    count: Option<usize>,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Apply migrations before seeding.
    #[arg(long)]
    migrate: bool,
}

/// (title, description, instructor, duration, level, category, price)
type SeedRow = (&'static str, &'static str, &'static str, &'static str, CourseLevel, &'static str, f64);

const CATALOGUE: &[SeedRow] = &[
    (
        "Complete React 19 Masterclass",
        "Deep dive into React 19 with Server Components, Actions, and the new compiler. Build production-ready applications from scratch.",
        "Sarah Chen",
        "42 hours",
        CourseLevel::Advanced,
        "Web Development",
        89.99,
    ),
    (
        "Next.js 16 Full-Stack Bootcamp",
        "Build modern full-stack applications covering the App Router, Server Actions, middleware, and deployment strategies.",
        "James Wilson",
        "38 hours",
        CourseLevel::Intermediate,
        "Web Development",
        79.99,
    ),
    (
        "HTML & CSS for Beginners",
        "Start your web development journey. Learn semantic HTML5, modern CSS3, Flexbox, Grid, and responsive design principles.",
        "Emily Rodriguez",
        "18 hours",
        CourseLevel::Beginner,
        "Web Development",
        29.99,
    ),
    (
        "Flutter Cross-Platform Apps",
        "Ship iOS and Android apps from a single codebase with Flutter, Dart, state management, and platform channels.",
        "Priya Nair",
        "30 hours",
        CourseLevel::Intermediate,
        "Mobile Development",
        69.99,
    ),
    (
        "Swift and SwiftUI Essentials",
        "Learn Swift fundamentals and build native iOS interfaces with SwiftUI, navigation, and data flow.",
        "Marcus Lee",
        "24 hours",
        CourseLevel::Beginner,
        "Mobile Development",
        49.99,
    ),
    (
        "Python for Data Analysis",
        "Wrangle, clean, and visualise real datasets with pandas, NumPy, and Matplotlib.",
        "Aisha Bello",
        "26 hours",
        CourseLevel::Beginner,
        "Data Science",
        39.99,
    ),
    (
        "Statistical Inference in Practice",
        "Hypothesis testing, confidence intervals, and experiment design for working analysts.",
        "Daniel Okafor",
        "20 hours",
        CourseLevel::Intermediate,
        "Data Science",
        59.99,
    ),
    (
        "Deep Learning from First Principles",
        "Build neural networks from scratch, then scale up with modern frameworks, CNNs, and transformers.",
        "Lina Petrova",
        "48 hours",
        CourseLevel::Advanced,
        "Machine Learning",
        99.99,
    ),
    (
        "Machine Learning Foundations",
        "Regression, classification, model evaluation, and feature engineering with scikit-learn.",
        "Tom Becker",
        "32 hours",
        CourseLevel::Beginner,
        "Machine Learning",
        0.0,
    ),
    (
        "AWS Solutions Architecture",
        "Design resilient, cost-aware systems on AWS: networking, compute, storage, and managed databases.",
        "Grace Kim",
        "36 hours",
        CourseLevel::Intermediate,
        "Cloud Computing",
        84.99,
    ),
    (
        "Kubernetes in Production",
        "Operate clusters with confidence: deployments, autoscaling, observability, and upgrades.",
        "Omar Haddad",
        "28 hours",
        CourseLevel::Advanced,
        "DevOps",
        89.99,
    ),
    (
        "CI/CD Pipelines with GitHub Actions",
        "Automate builds, tests, and releases with reusable workflows and environment protections.",
        "Hannah Schulz",
        "12 hours",
        CourseLevel::Beginner,
        "DevOps",
        24.99,
    ),
    (
        "Web Application Security",
        "Find and fix injection, XSS, CSRF, and authentication flaws using modern tooling.",
        "Victor Alves",
        "22 hours",
        CourseLevel::Intermediate,
        "Cybersecurity",
        74.99,
    ),
    (
        "Design Systems with Figma",
        "Create scalable component libraries, tokens, and documentation that engineering teams can adopt.",
        "Mei Tanaka",
        "16 hours",
        CourseLevel::Intermediate,
        "UI/UX Design",
        44.99,
    ),
    (
        "PostgreSQL Performance Tuning",
        "Read query plans, design indexes, and tune configuration for demanding workloads.",
        "Ravi Menon",
        "14 hours",
        CourseLevel::Advanced,
        "Database",
        64.99,
    ),
    (
        "Smart Contracts with Solidity",
        "Write, test, and audit Ethereum smart contracts with Foundry and common security patterns.",
        "Elena Rossi",
        "20 hours",
        CourseLevel::Intermediate,
        "Blockchain",
        79.99,
    ),
    (
        "Game Development with Godot",
        "Build 2D and 3D games with the Godot engine, GDScript, physics, and animation.",
        "Lucas Martin",
        "34 hours",
        CourseLevel::Beginner,
        "Game Development",
        39.99,
    ),
];

fn seed_request(row: &SeedRow) -> CreateCourseRequest {
    let (title, description, instructor, duration, level, category, price) = *row;
    CreateCourseRequest {
        title: title.to_string(),
        description: description.to_string(),
        instructor: instructor.to_string(),
        duration: duration.to_string(),
        level,
        category: category.to_string(),
        price,
        image_url: None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursehub=info,seed_courses=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&args.database_url)
        .await?;
    if args.migrate {
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;
    let courses = CourseService::new(repo);
    let caller = AuthUser { id: args.owner };

    let limit = args.count.unwrap_or(CATALOGUE.len());
    let mut inserted = 0usize;
    for row in CATALOGUE.iter().take(limit) {
        let course = courses.create(&caller, &seed_request(row)).await?;
        tracing::info!(course_id = %course.id, title = %course.title, "seeded");
        inserted += 1;
    }

    tracing::info!(owner = %args.owner, inserted, "seeding complete");
    Ok(())
}
