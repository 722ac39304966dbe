pub mod database;
pub mod inertia;
pub mod pagination;
pub mod validation;
