pub mod postgres;

pub use postgres::{create_pool, page_offset, Database};
