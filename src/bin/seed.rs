use rand::{rngs::StdRng, SeedableRng};
use sandbox_courses::{
    modules::course::{factory, repository::PgCourseRepository},
    types::{database, Config},
};
use std::env;
use tracing_subscriber::prelude::*;

const DEFAULT_COURSES: usize = 50;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn course_count() -> usize {
    env::args()
        .nth(1)
        .or_else(|| env::var("SEED_COURSES").ok())
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_COURSES)
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::default();
    let db_conn = database::connect(config.database.url.as_str()).await;
    database::migrate(&db_conn).await;

    let repository = PgCourseRepository::new(db_conn.pool);
    let mut rng = StdRng::from_os_rng();
    let count = course_count();

    match factory::create_many(&repository, &mut rng, count).await {
        Ok(courses) => tracing::info!("Seeded {} courses", courses.len()),
        Err(_) => {
            tracing::error!("Seeding stopped before {} courses were created", count);
            std::process::exit(1);
        }
    }
}
