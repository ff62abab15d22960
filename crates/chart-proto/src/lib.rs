pub mod album;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fallback;
pub mod feed;
pub mod platform;
pub mod proxy;
pub mod view;
