pub mod app;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod service;
