pub mod connection;
pub mod jobs;
pub mod schema;

pub use connection::Database;
