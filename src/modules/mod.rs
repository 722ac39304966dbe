pub mod course;
pub mod sandbox;

mod router;
pub use router::get_router;
