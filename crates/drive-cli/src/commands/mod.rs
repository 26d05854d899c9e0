pub mod config;
pub mod files;
pub mod serve;
pub mod tools;
