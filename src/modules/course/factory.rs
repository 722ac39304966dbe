//! Random but valid course rows for tests and local seeding.

use rand::{seq::IndexedRandom, Rng};
use sqlx::types::BigDecimal;

use super::repository::{Course, CourseRepository, CreateCoursePayload, Error, Level};

pub const MIN_PRICE_CENTS: i64 = 29_99;
pub const MAX_PRICE_CENTS: i64 = 299_99;
pub const MIN_DURATION_HOURS: i32 = 2;
pub const MAX_DURATION_HOURS: i32 = 40;

const WORDS: &[&str] = &[
    "alias", "consequatur", "aut", "perferendis", "sit", "voluptatem", "accusantium",
    "doloremque", "aperiam", "eaque", "ipsa", "quae", "ab", "illo", "inventore", "veritatis",
    "et", "quasi", "architecto", "beatae", "vitae", "dicta", "sunt", "explicabo", "nemo",
    "enim", "ipsam", "quia", "voluptas", "aspernatur", "odit", "fugit", "sed", "consequuntur",
    "magni", "dolores", "eos", "qui", "ratione", "sequi", "nesciunt", "neque", "dolorem",
    "ipsum", "dolor", "amet", "consectetur", "adipisci", "velit", "numquam", "eius", "modi",
    "tempora", "incidunt", "ut", "labore", "dolore", "magnam", "aliquam", "quaerat",
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Donald", "Edsger", "Frances", "Grace",
    "Guido", "Hedy", "John", "Ken", "Leslie", "Linus", "Margaret", "Niklaus", "Radia",
    "Shafi", "Sophie", "Tim", "Yukihiro",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Dijkstra", "Hamilton", "Hopper", "Kay", "Knuth", "Lamport",
    "Liskov", "Lovelace", "McCarthy", "Perlman", "Ritchie", "Rossum", "Shannon", "Thompson",
    "Torvalds", "Turing", "Wilson", "Wirth",
];

fn words<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<&'static str> {
    (0..count)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect()
}

/// A capitalized run of roughly `word_count` words ending in a period.
fn sentence<R: Rng + ?Sized>(rng: &mut R, word_count: usize) -> String {
    let spread = word_count.div_ceil(3);
    let count = rng
        .random_range(word_count.saturating_sub(spread)..=word_count + spread)
        .max(1);
    let text = words(rng, count).join(" ");

    let mut chars = text.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::from("."),
    }
}

fn paragraph<R: Rng + ?Sized>(rng: &mut R, sentence_count: usize) -> String {
    let count = rng.random_range(sentence_count.saturating_sub(1).max(1)..=sentence_count + 1);
    (0..count)
        .map(|_| {
            let word_count = rng.random_range(4..=10);
            sentence(rng, word_count)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ada");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Lovelace");
    format!("{} {}", first, last)
}

pub fn definition<R: Rng + ?Sized>(rng: &mut R) -> CreateCoursePayload {
    let price_cents = rng.random_range(MIN_PRICE_CENTS..=MAX_PRICE_CENTS);

    CreateCoursePayload {
        title: sentence(rng, 3),
        description: paragraph(rng, 4),
        instructor: name(rng),
        price: BigDecimal::new(price_cents.into(), 2),
        duration_hours: rng.random_range(MIN_DURATION_HOURS..=MAX_DURATION_HOURS),
        level: Level::ALL.choose(rng).copied().unwrap_or(Level::Beginner),
    }
}

pub async fn create<R: Rng + ?Sized>(
    repository: &dyn CourseRepository,
    rng: &mut R,
) -> Result<Course, Error> {
    repository.create(definition(rng)).await
}

pub async fn create_many<R: Rng + ?Sized>(
    repository: &dyn CourseRepository,
    rng: &mut R,
    count: usize,
) -> Result<Vec<Course>, Error> {
    let mut courses = Vec::with_capacity(count);
    for _ in 0..count {
        courses.push(create(repository, rng).await?);
    }
    Ok(courses)
}
