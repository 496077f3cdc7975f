// Library interface for testing

// Declare all modules
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod openai;
pub mod queries;
pub mod schema;
pub mod serve;
pub mod store;
pub mod twilio;
