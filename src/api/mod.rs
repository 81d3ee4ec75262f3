pub mod client;
pub mod deadline;
pub mod endpoints;
pub mod models;
