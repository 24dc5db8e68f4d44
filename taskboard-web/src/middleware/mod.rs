/// Middleware modules for the web server
///
/// This module contains custom middleware for:
/// - Session guards for pages and the JSON API
/// - Security headers

pub mod auth;
pub mod security;
