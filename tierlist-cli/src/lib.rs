#[macro_use]
extern crate diesel;

pub mod cmd;
pub mod config;
pub mod console;
pub mod db;
pub mod display;
pub mod error;
pub mod models;
pub mod schema;
pub mod ui;
