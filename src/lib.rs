pub mod config;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod tools;
