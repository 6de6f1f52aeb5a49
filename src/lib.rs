pub mod app;
pub mod cli;
pub mod controller;
pub mod database;
pub mod error;
pub mod form;
pub mod geolocation;
pub mod gpx;
pub mod map;
pub mod render;
pub mod repository;
pub mod shell;
pub mod types;
pub mod utils;
