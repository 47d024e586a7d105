//! # Taskboard API Server Library
//!
//! HTTP layer of the Taskboard to-do service: routing, session cookies and
//! the mapping of domain errors onto responses.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Form and query extractors that reject with `ApiError`
//! - `middleware`: Session and security-header middleware
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
