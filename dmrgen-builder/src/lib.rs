pub mod config;
pub mod error;
pub mod logging;
pub mod module;
pub mod output;
pub mod pipeline;
pub mod recipe;
