use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every route here sits behind the gate layer installed by `create_router`,
/// and every handler additionally takes `AuthUser` so the resolved identity is
/// passed explicitly into the course operations.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // GET /courses?page=&limit=&search=
        // POST /courses
        .route(
            "/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        // GET/PUT/PATCH/DELETE /courses/{id}
        // Owner-scoped; another user's id reads as 404.
        .route(
            "/courses/{id}",
            get(handlers::get_course)
                .put(handlers::update_course)
                .patch(handlers::update_course)
                .delete(handlers::delete_course),
        )
}
