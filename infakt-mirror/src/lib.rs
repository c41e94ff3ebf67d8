pub mod account;
pub mod catalog;
pub mod config;
pub mod history;
pub mod logging;
pub mod mirror;
pub mod runner;
