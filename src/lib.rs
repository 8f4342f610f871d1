pub mod app;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod format;
pub mod listing;
pub mod models;
pub mod recommend;
pub mod report;
pub mod storage;
