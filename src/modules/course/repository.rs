use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use sqlx::PgPool;
use std::cmp::Ordering;
use std::fmt;
use std::sync::RwLock;

use crate::utils::pagination::Cursor;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "course_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => f.write_str("beginner"),
            Self::Intermediate => f.write_str("intermediate"),
            Self::Advanced => f.write_str("advanced"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub price: BigDecimal,
    pub duration_hours: i32,
    pub level: Level,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateCoursePayload {
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub price: BigDecimal,
    pub duration_hours: i32,
    pub level: Level,
}

/// Display order of the listing. Both orders are newest first; creation time
/// falls back to the id when two rows share a timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CourseOrder {
    #[default]
    CreatedAt,
    Id,
}

impl From<&str> for CourseOrder {
    fn from(raw_order: &str) -> Self {
        match raw_order.trim().to_ascii_lowercase().as_str() {
            "id" => Self::Id,
            _ => Self::CreatedAt,
        }
    }
}

impl CourseOrder {
    pub fn cursor_for(&self, course: &Course, points_to_next_items: bool) -> Cursor {
        Cursor {
            id: course.id,
            created_at: match self {
                Self::CreatedAt => Some(course.created_at),
                Self::Id => None,
            },
            points_to_next_items,
        }
    }

    /// Whether a cursor was issued under this order: it must carry exactly
    /// the sort keys this order produces.
    pub fn accepts(&self, cursor: &Cursor) -> bool {
        match self {
            Self::CreatedAt => cursor.created_at.is_some(),
            Self::Id => cursor.created_at.is_none(),
        }
    }

    pub fn compare(&self, a: &Course, b: &Course) -> Ordering {
        match self {
            Self::CreatedAt => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id)),
            Self::Id => b.id.cmp(&a.id),
        }
    }

    /// Position of `course` relative to `cursor` in display order, `None` when
    /// the cursor has no key for this order.
    fn position(&self, course: &Course, cursor: &Cursor) -> Option<Ordering> {
        match self {
            Self::CreatedAt => cursor
                .created_at
                .map(|created_at| (created_at, cursor.id).cmp(&(course.created_at, course.id))),
            Self::Id => Some(cursor.id.cmp(&course.id)),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// Read and create access to the course store.
///
/// `find_by_cursor` returns at most `limit` rows strictly beyond `cursor` in
/// the direction it points, always in display order.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn count(&self) -> Result<i64, Error>;

    async fn find_page(
        &self,
        order: CourseOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, Error>;

    async fn find_by_cursor(
        &self,
        order: CourseOrder,
        cursor: Option<&Cursor>,
        limit: i64,
    ) -> Result<Vec<Course>, Error>;

    async fn create(&self, payload: CreateCoursePayload) -> Result<Course, Error>;
}

pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    async fn count(&self) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!("Error occurred while trying to count courses: {}", err);
                Error::UnexpectedError
            })
    }

    async fn find_page(
        &self,
        order: CourseOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, Error> {
        let query = match order {
            CourseOrder::CreatedAt => {
                "
                SELECT * FROM courses
                ORDER BY created_at DESC, id DESC
                LIMIT $1 OFFSET $2
                "
            }
            CourseOrder::Id => {
                "
                SELECT * FROM courses
                ORDER BY id DESC
                LIMIT $1 OFFSET $2
                "
            }
        };

        sqlx::query_as::<_, Course>(query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!("Error occurred while trying to fetch a page of courses: {}", err);
                Error::UnexpectedError
            })
    }

    async fn find_by_cursor(
        &self,
        order: CourseOrder,
        cursor: Option<&Cursor>,
        limit: i64,
    ) -> Result<Vec<Course>, Error> {
        let backwards = cursor.map(Cursor::points_to_previous_items).unwrap_or(false);

        let query = match (order, backwards) {
            (CourseOrder::CreatedAt, false) => {
                "
                SELECT * FROM courses
                WHERE $1::TIMESTAMP IS NULL OR (created_at, id) < ($1, $2)
                ORDER BY created_at DESC, id DESC
                LIMIT $3
                "
            }
            (CourseOrder::CreatedAt, true) => {
                "
                SELECT * FROM courses
                WHERE (created_at, id) > ($1, $2)
                ORDER BY created_at ASC, id ASC
                LIMIT $3
                "
            }
            (CourseOrder::Id, false) => {
                "
                SELECT * FROM courses
                WHERE $1::BIGINT IS NULL OR id < $1
                ORDER BY id DESC
                LIMIT $2
                "
            }
            (CourseOrder::Id, true) => {
                "
                SELECT * FROM courses
                WHERE id > $1
                ORDER BY id ASC
                LIMIT $2
                "
            }
        };

        let mut query = sqlx::query_as::<_, Course>(query);
        if order == CourseOrder::CreatedAt {
            query = query.bind(cursor.and_then(|cursor| cursor.created_at));
        }

        let mut courses = query
            .bind(cursor.map(|cursor| cursor.id))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Error occurred while trying to fetch courses by cursor: {}",
                    err
                );
                Error::UnexpectedError
            })?;

        if backwards {
            courses.reverse();
        }

        Ok(courses)
    }

    async fn create(&self, payload: CreateCoursePayload) -> Result<Course, Error> {
        sqlx::query_as::<_, Course>(
            "
            INSERT INTO courses (
                title,
                description,
                instructor,
                price,
                duration_hours,
                level
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.instructor)
        .bind(payload.price)
        .bind(payload.duration_hours)
        .bind(payload.level)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while trying to create a course: {}", err);
            Error::UnexpectedError
        })
    }
}

/// Process-local store with the same ordering rules as the database.
#[derive(Default)]
pub struct MemoryCourseRepository {
    courses: RwLock<Vec<Course>>,
}

impl MemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fully formed row, keeping whatever id and timestamps it has.
    pub fn insert(&self, course: Course) -> Result<(), Error> {
        self.courses
            .write()
            .map_err(|_| {
                tracing::error!("Course store lock is poisoned");
                Error::UnexpectedError
            })?
            .push(course);
        Ok(())
    }

    fn sorted(&self, order: CourseOrder) -> Result<Vec<Course>, Error> {
        let mut courses = self
            .courses
            .read()
            .map_err(|_| {
                tracing::error!("Course store lock is poisoned");
                Error::UnexpectedError
            })?
            .clone();
        courses.sort_by(|a, b| order.compare(a, b));
        Ok(courses)
    }
}

#[async_trait]
impl CourseRepository for MemoryCourseRepository {
    async fn count(&self) -> Result<i64, Error> {
        self.courses
            .read()
            .map(|courses| courses.len() as i64)
            .map_err(|_| Error::UnexpectedError)
    }

    async fn find_page(
        &self,
        order: CourseOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, Error> {
        Ok(self
            .sorted(order)?
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn find_by_cursor(
        &self,
        order: CourseOrder,
        cursor: Option<&Cursor>,
        limit: i64,
    ) -> Result<Vec<Course>, Error> {
        let limit = limit.max(0) as usize;
        let courses = self.sorted(order)?;

        let Some(cursor) = cursor else {
            return Ok(courses.into_iter().take(limit).collect());
        };

        if cursor.points_to_next_items {
            return Ok(courses
                .into_iter()
                .filter(|course| match order.position(course, cursor) {
                    Some(position) => position == Ordering::Greater,
                    None => true,
                })
                .take(limit)
                .collect());
        }

        let mut courses = courses
            .into_iter()
            .rev()
            .filter(|course| order.position(course, cursor) == Some(Ordering::Less))
            .take(limit)
            .collect::<Vec<_>>();
        courses.reverse();
        Ok(courses)
    }

    async fn create(&self, payload: CreateCoursePayload) -> Result<Course, Error> {
        let mut courses = self.courses.write().map_err(|_| {
            tracing::error!("Course store lock is poisoned");
            Error::UnexpectedError
        })?;

        let course = Course {
            id: courses.iter().map(|course| course.id).max().unwrap_or(0) + 1,
            title: payload.title,
            description: payload.description,
            instructor: payload.instructor,
            price: payload.price,
            duration_hours: payload.duration_hours,
            level: payload.level,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        };
        courses.push(course.clone());

        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn course(id: i64, minutes: i64) -> Course {
        Course {
            id,
            title: format!("Course {}", id),
            description: String::from("Description"),
            instructor: String::from("Instructor"),
            price: BigDecimal::from_str("49.99").unwrap(),
            duration_hours: 10,
            level: Level::Beginner,
            created_at: NaiveDateTime::default() + Duration::minutes(minutes),
            updated_at: None,
        }
    }

    fn ids(courses: &[Course]) -> Vec<i64> {
        courses.iter().map(|course| course.id).collect()
    }

    // ids and timestamps deliberately disagree: 3 is the oldest, 1 and 4 share a minute
    fn repository() -> MemoryCourseRepository {
        let repository = MemoryCourseRepository::new();
        for course in [course(1, 20), course(2, 10), course(3, 0), course(4, 20), course(5, 30)] {
            repository.insert(course).unwrap();
        }
        repository
    }

    #[test]
    fn order_parses_with_created_at_default() {
        assert_eq!(CourseOrder::from("id"), CourseOrder::Id);
        assert_eq!(CourseOrder::from("ID "), CourseOrder::Id);
        assert_eq!(CourseOrder::from("created_at"), CourseOrder::CreatedAt);
        assert_eq!(CourseOrder::from("title"), CourseOrder::CreatedAt);
    }

    #[test]
    fn level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Level::Intermediate).unwrap(),
            serde_json::json!("intermediate")
        );
        assert_eq!(Level::Advanced.to_string(), "advanced");
    }

    #[test]
    fn id_cursor_does_not_need_a_timestamp() {
        let cursor = CourseOrder::Id.cursor_for(&course(7, 0), true);

        assert_eq!(cursor.created_at, None);
        assert!(CourseOrder::Id.accepts(&cursor));
        assert!(!CourseOrder::CreatedAt.accepts(&cursor));
    }

    #[test]
    fn id_order_rejects_creation_time_cursors() {
        let cursor = CourseOrder::CreatedAt.cursor_for(&course(7, 0), true);

        assert!(cursor.created_at.is_some());
        assert!(CourseOrder::CreatedAt.accepts(&cursor));
        assert!(!CourseOrder::Id.accepts(&cursor));
    }

    #[tokio::test]
    async fn pages_follow_creation_time_with_id_tie_break() {
        let repository = repository();

        let everything = repository
            .find_page(CourseOrder::CreatedAt, 10, 0)
            .await
            .unwrap();
        let second_page = repository
            .find_page(CourseOrder::CreatedAt, 2, 2)
            .await
            .unwrap();

        assert_eq!(ids(&everything), vec![5, 4, 1, 2, 3]);
        assert_eq!(ids(&second_page), vec![1, 2]);
        assert_eq!(repository.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn pages_follow_ids() {
        let courses = repository().find_page(CourseOrder::Id, 3, 0).await.unwrap();

        assert_eq!(ids(&courses), vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn offset_past_the_end_is_empty() {
        let courses = repository()
            .find_page(CourseOrder::Id, 3, 10)
            .await
            .unwrap();

        assert!(courses.is_empty());
    }

    #[tokio::test]
    async fn cursor_walks_forward_and_back() {
        let repository = repository();
        let order = CourseOrder::CreatedAt;
        let anchor = course(4, 20);

        let forward = repository
            .find_by_cursor(order, Some(&order.cursor_for(&anchor, true)), 2)
            .await
            .unwrap();
        let backward = repository
            .find_by_cursor(order, Some(&order.cursor_for(&course(2, 10), false)), 2)
            .await
            .unwrap();

        assert_eq!(ids(&forward), vec![1, 2]);
        assert_eq!(ids(&backward), vec![4, 1]);
    }

    #[tokio::test]
    async fn id_cursor_walks_forward_and_back() {
        let repository = repository();
        let order = CourseOrder::Id;

        let forward = repository
            .find_by_cursor(order, Some(&order.cursor_for(&course(4, 0), true)), 10)
            .await
            .unwrap();
        let backward = repository
            .find_by_cursor(order, Some(&order.cursor_for(&course(3, 0), false)), 10)
            .await
            .unwrap();

        assert_eq!(ids(&forward), vec![3, 2, 1]);
        assert_eq!(ids(&backward), vec![5, 4]);
    }

    #[tokio::test]
    async fn created_ids_keep_increasing() {
        let repository = repository();
        let payload = CreateCoursePayload {
            title: String::from("Ownership"),
            description: String::from("Borrowing, moving and lifetimes."),
            instructor: String::from("Ferris Crab"),
            price: BigDecimal::from_str("99.00").unwrap(),
            duration_hours: 12,
            level: Level::Advanced,
        };

        let first = repository.create(payload.clone()).await.unwrap();
        let second = repository.create(payload).await.unwrap();

        assert_eq!(first.id, 6);
        assert_eq!(second.id, 7);
        assert_eq!(second.updated_at, None);
    }
}
