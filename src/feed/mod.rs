pub mod health;
pub mod ingestor;
pub mod log_tail;
pub mod patterns;
pub mod payload;
pub mod server;
