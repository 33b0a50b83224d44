pub mod admin;
pub mod config;
pub mod health;
pub mod migrate;
pub mod serve;
