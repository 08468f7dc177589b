//! Postline - data access layer for a blog backed by a hosted Postgres REST service
//!
//! This library provides post, comment, tag and statistics operations on top of
//! the remote tables, and an HTTP API exposing them.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
