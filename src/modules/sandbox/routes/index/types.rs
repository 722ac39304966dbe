pub mod request {
    use crate::utils::{inertia::Inertia, pagination::PaginationQuery};

    pub struct Payload {
        pub inertia: Inertia,
        pub pagination: PaginationQuery,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    use crate::utils::inertia::InertiaResponse;

    pub enum Success {
        Courses(InertiaResponse),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Courses(page) => page.into_response(),
            }
        }
    }

    pub enum Error {
        InvalidCursor,
        PerPageTooLarge(u32),
        PageOutOfRange,
        FailedToFetchCourses,
        FailedToRenderCourses,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::InvalidCursor => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid cursor" })),
                )
                    .into_response(),
                Self::PerPageTooLarge(max_per_page) => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": format!("per_page must not exceed {}", max_per_page)
                    })),
                )
                    .into_response(),
                Self::PageOutOfRange => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Page is out of range" })),
                )
                    .into_response(),
                Self::FailedToFetchCourses => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch courses" })),
                )
                    .into_response(),
                Self::FailedToRenderCourses => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to render courses" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
