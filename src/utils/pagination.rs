use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::utils::validation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PaginationMode {
    #[default]
    Offset,
    Cursor,
}

impl From<&str> for PaginationMode {
    fn from(raw_mode: &str) -> Self {
        match raw_mode.trim().to_ascii_lowercase().as_str() {
            "cursor" => Self::Cursor,
            _ => Self::Offset,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PaginatedMeta,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PaginatedMeta {
    pub total: u32,
    pub page: u32,
    pub per_page: u32,
    pub last_page: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u32, page: u32, per_page: u32) -> Paginated<T> {
        let last_page = match per_page {
            0 => 1,
            per_page => total.div_ceil(per_page).max(1),
        };

        Self {
            items,
            meta: PaginatedMeta {
                total,
                page,
                per_page,
                last_page,
            },
        }
    }
}

/// Position in an ordered listing, handed to clients as an opaque token.
///
/// `created_at` is only set when the listing is ordered by creation time; `id`
/// always breaks ties. The flag tells whether the token continues forward
/// (towards older / lower rows) or walks back to the previous page.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Cursor {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(rename = "_pointsToNextItems")]
    pub points_to_next_items: bool,
}

impl Cursor {
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(json!(self).to_string())
    }

    pub fn decode(raw_cursor: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw_cursor.trim().trim_end_matches('='))
            .ok()?;

        serde_json::from_slice(&bytes).ok()
    }

    pub fn points_to_previous_items(&self) -> bool {
        !self.points_to_next_items
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct CursorPaginated<T> {
    pub items: Vec<T>,
    pub meta: CursorPaginatedMeta,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CursorPaginatedMeta {
    pub per_page: u32,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
}

impl<T> CursorPaginated<T> {
    /// Builds a page out of up to `per_page + 1` rows fetched from `cursor` in
    /// display order. The surplus row only proves that another page exists in
    /// the direction of travel and is dropped.
    pub fn from_rows<F>(mut rows: Vec<T>, per_page: u32, cursor: Option<&Cursor>, key: F) -> Self
    where
        F: Fn(&T, bool) -> Cursor,
    {
        let limit = per_page as usize;
        let has_more = rows.len() > limit;
        let backwards = cursor.map(Cursor::points_to_previous_items).unwrap_or(false);

        if has_more {
            if backwards {
                rows.drain(..rows.len() - limit);
            } else {
                rows.truncate(limit);
            }
        }

        let (has_next, has_previous) = match cursor {
            None => (has_more, false),
            Some(_) if backwards => (true, has_more),
            Some(_) => (has_more, true),
        };

        let next_cursor = rows
            .last()
            .filter(|_| has_next)
            .map(|row| key(row, true).encode());
        let prev_cursor = rows
            .first()
            .filter(|_| has_previous)
            .map(|row| key(row, false).encode());

        Self {
            items: rows,
            meta: CursorPaginatedMeta {
                per_page,
                next_cursor,
                prev_cursor,
            },
        }
    }
}

#[derive(Deserialize, Validate, Clone, Debug, Default, PartialEq)]
pub struct PaginationQuery {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1))]
    pub per_page: Option<u32>,
    pub cursor: Option<String>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PaginationQuery {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pagination = match parts.extract::<Query<PaginationQuery>>().await {
            Ok(Query(pagination)) => pagination,
            Err(err) => {
                tracing::debug!("Rejected pagination query: {}", err);
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid pagination options"})),
                )
                    .into_response());
            }
        };

        pagination
            .validate()
            .map_err(|errors| validation::into_response(errors).into_response())?;

        Ok(pagination)
    }
}
