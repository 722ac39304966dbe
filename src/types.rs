pub use crate::utils::database;
use crate::{
    modules::course::repository::{CourseOrder, CourseRepository, PgCourseRepository},
    utils::pagination::PaginationMode,
};
use async_trait::async_trait;
use std::env;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct Context {
    pub app: AppContext,
    pub inertia: InertiaConfig,
    pub listing: ListingConfig,
    pub courses: Arc<dyn CourseRepository>,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InertiaConfig {
    pub version: String,
    pub asset_url: String,
    pub title: String,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            asset_url: String::from("/build/app.js"),
            title: String::from("Sandbox"),
        }
    }
}

/// How the course listing orders, slices and reports its pages.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingConfig {
    pub order: CourseOrder,
    pub mode: PaginationMode,
    pub per_page: u32,
    pub max_per_page: u32,
    pub deep_merge: bool,
    pub log_request_input: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            order: CourseOrder::CreatedAt,
            mode: PaginationMode::Offset,
            per_page: 20,
            max_per_page: 100,
            deep_merge: true,
            log_request_input: false,
        }
    }
}

impl ListingConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_per_page = lookup("COURSES_MAX_PER_PAGE")
            .and_then(|raw| parse_page_size(&raw))
            .unwrap_or(defaults.max_per_page);
        let per_page = lookup("COURSES_PER_PAGE")
            .and_then(|raw| parse_page_size(&raw))
            .unwrap_or(defaults.per_page)
            .min(max_per_page);

        Self {
            order: lookup("COURSES_ORDER")
                .map(|raw| CourseOrder::from(raw.as_str()))
                .unwrap_or(defaults.order),
            mode: lookup("COURSES_PAGINATION")
                .map(|raw| PaginationMode::from(raw.as_str()))
                .unwrap_or(defaults.mode),
            per_page,
            max_per_page,
            deep_merge: lookup("COURSES_DEEP_MERGE")
                .and_then(|raw| parse_flag(&raw))
                .unwrap_or(defaults.deep_merge),
            log_request_input: lookup("COURSES_LOG_REQUEST_INPUT")
                .and_then(|raw| parse_flag(&raw))
                .unwrap_or(defaults.log_request_input),
        }
    }
}

fn parse_page_size(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|size| *size > 0)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub inertia: InertiaConfig,
    pub listing: ListingConfig,
}

impl Default for Config {
    fn default() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u32>()
            .expect("Invalid PORT number");
        let url = env::var("URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let inertia_defaults = InertiaConfig::default();

        Self {
            database: DatabaseConfig { url: database_url },
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
            },
            inertia: InertiaConfig {
                version: env::var("INERTIA_VERSION").unwrap_or(inertia_defaults.version),
                asset_url: env::var("INERTIA_ASSET_URL").unwrap_or(inertia_defaults.asset_url),
                title: env::var("INERTIA_TITLE").unwrap_or(inertia_defaults.title),
            },
            listing: ListingConfig::from_lookup(|key| env::var(key).ok()),
        }
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Context;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Context {
        let db_conn = database::connect(self.database.url.as_str()).await;
        database::migrate(&db_conn).await;

        Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
            },
            inertia: self.inertia,
            listing: self.listing,
            courses: Arc::new(PgCourseRepository::new(db_conn.pool)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn listing(vars: &[(&str, &str)]) -> ListingConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ListingConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn listing_defaults_without_environment() {
        assert_eq!(listing(&[]), ListingConfig::default());
    }

    #[test]
    fn listing_reads_every_knob() {
        let config = listing(&[
            ("COURSES_ORDER", "id"),
            ("COURSES_PAGINATION", "cursor"),
            ("COURSES_PER_PAGE", "12"),
            ("COURSES_MAX_PER_PAGE", "50"),
            ("COURSES_DEEP_MERGE", "false"),
            ("COURSES_LOG_REQUEST_INPUT", "yes"),
        ]);

        assert_eq!(
            config,
            ListingConfig {
                order: CourseOrder::Id,
                mode: PaginationMode::Cursor,
                per_page: 12,
                max_per_page: 50,
                deep_merge: false,
                log_request_input: true,
            }
        );
    }

    #[test]
    fn listing_ignores_unusable_values() {
        let config = listing(&[
            ("COURSES_PER_PAGE", "zero"),
            ("COURSES_MAX_PER_PAGE", "0"),
            ("COURSES_DEEP_MERGE", "maybe"),
        ]);

        assert_eq!(config.per_page, 20);
        assert_eq!(config.max_per_page, 100);
        assert!(config.deep_merge);
    }

    #[test]
    fn default_page_size_is_capped_by_the_maximum() {
        let config = listing(&[("COURSES_PER_PAGE", "30"), ("COURSES_MAX_PER_PAGE", "9")]);

        assert_eq!(config.per_page, 9);
    }

    #[test]
    fn environment_falls_back_to_development() {
        assert_eq!(
            AppEnvironment::from(String::from("production")),
            AppEnvironment::Production
        );
        assert_eq!(
            AppEnvironment::from(String::from("staging")),
            AppEnvironment::Development
        );
    }
}
