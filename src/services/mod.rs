pub mod auth;
pub mod converter;
pub mod exchange;
pub mod http_client;
pub mod logger;
pub mod output_mapping;
pub mod resolver;
