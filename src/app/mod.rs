pub mod adb;
pub mod config;
pub mod controller;
pub mod error;
pub mod gui;
pub mod logging;
pub mod mirror;
pub mod models;
pub mod state;
