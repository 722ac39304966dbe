use super::types::{request, response};
use crate::{
    modules::course::repository::Course,
    types::Context,
    utils::{
        inertia::Props,
        pagination::{Cursor, CursorPaginated, Paginated, PaginationMode},
    },
};
use std::sync::Arc;

pub const COMPONENT: &str = "Sandbox";
pub const COURSES_PROP: &str = "courses";

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let listing = &ctx.listing;

    if listing.log_request_input {
        tracing::debug!(
            page = ?payload.pagination.page,
            per_page = ?payload.pagination.per_page,
            cursor = ?payload.pagination.cursor,
            "Listing courses"
        );
    }

    let per_page = payload.pagination.per_page.unwrap_or(listing.per_page);
    if per_page > listing.max_per_page {
        return Err(response::Error::PerPageTooLarge(listing.max_per_page));
    }

    let props = match listing.mode {
        PaginationMode::Offset => {
            let page = payload.pagination.page.unwrap_or(1);
            let total = ctx
                .courses
                .count()
                .await
                .map_err(|_| response::Error::FailedToFetchCourses)?;
            let offset = i64::from(page.saturating_sub(1))
                .checked_mul(i64::from(per_page))
                .ok_or(response::Error::PageOutOfRange)?;
            let courses = ctx
                .courses
                .find_page(listing.order, i64::from(per_page), offset)
                .await
                .map_err(|_| response::Error::FailedToFetchCourses)?;

            Props::new().with(
                COURSES_PROP,
                Paginated::new(
                    courses,
                    u32::try_from(total).unwrap_or(u32::MAX),
                    page,
                    per_page,
                ),
            )
        }
        PaginationMode::Cursor => {
            let cursor = match payload.pagination.cursor.as_deref() {
                Some(raw_cursor) => Some(
                    Cursor::decode(raw_cursor)
                        .filter(|cursor| listing.order.accepts(cursor))
                        .ok_or(response::Error::InvalidCursor)?,
                ),
                None => None,
            };
            let rows = ctx
                .courses
                .find_by_cursor(listing.order, cursor.as_ref(), i64::from(per_page) + 1)
                .await
                .map_err(|_| response::Error::FailedToFetchCourses)?;
            let courses = CursorPaginated::from_rows(
                rows,
                per_page,
                cursor.as_ref(),
                |course: &Course, points_to_next_items| {
                    listing.order.cursor_for(course, points_to_next_items)
                },
            );

            if listing.deep_merge {
                Props::new().with_deep_merge(COURSES_PROP, courses)
            } else {
                Props::new().with(COURSES_PROP, courses)
            }
        }
    }
    .map_err(|err| {
        tracing::error!("Error occurred while trying to serialize courses: {}", err);
        response::Error::FailedToRenderCourses
    })?;

    Ok(response::Success::Courses(payload.inertia.render(
        &ctx.inertia,
        COMPONENT,
        props,
    )))
}
