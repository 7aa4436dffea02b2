// Library side of the escape room; main.rs owns the window and event loop
pub mod config;
pub mod error;
pub mod logging;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;
