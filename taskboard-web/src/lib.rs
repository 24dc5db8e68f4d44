//! # Taskboard Web Server Library
//!
//! This library provides the web front of Taskboard: a two-page HTML UI and
//! a JSON API over the shared data access layer.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Session guards and security headers
//! - `routes`: Route handlers
//! - `session`: Browser sessions, per-session data clients and flash messages
//! - `views`: Server-rendered HTML

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod views;
