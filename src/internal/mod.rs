pub mod board;
pub mod cache;
pub mod fetcher;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod theme;
pub mod ui;
