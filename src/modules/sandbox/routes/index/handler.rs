use super::{service::service, types::request};
use crate::{
    types::Context,
    utils::{inertia::Inertia, pagination::PaginationQuery},
};
use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    inertia: Inertia,
    pagination: PaginationQuery,
) -> impl IntoResponse {
    service(ctx, request::Payload { inertia, pagination }).await
}
