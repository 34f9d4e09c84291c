pub mod backend;
pub mod config;
pub mod fake_feed;
pub mod feed;
pub mod filterizer;
pub mod http_client;
pub mod image;
pub mod state;
pub mod stats;
pub mod ticket;
