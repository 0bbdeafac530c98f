pub mod alliance;
pub mod assistant;
pub mod backend;
pub mod charts;
pub mod config;
pub mod fetch;
pub mod output;
pub mod record;
pub mod scoring;
pub mod search;
