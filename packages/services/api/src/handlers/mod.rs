//! HTTP 핸들러

pub mod admin;
pub mod auth;
pub mod health;
pub mod orders;
pub mod resources;
