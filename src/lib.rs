pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod redirect;
pub mod seed;
pub mod service;
pub mod state;
pub mod storage;
