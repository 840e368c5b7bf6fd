pub mod app;
pub mod constants;
pub mod errors;
pub mod managers;
pub mod mcp;
pub mod rest;
pub mod services;
pub mod spec;
pub mod utils;
