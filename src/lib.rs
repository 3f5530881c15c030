//! cattery: a small REST backend for users and kitties
//!
//! CRUD over PostgreSQL with JWT authentication, Redis-backed response
//! caching for listings, and a schema-driven request parser that batches
//! every validation failure per request.
//!
//! The interesting pieces:
//! - [`parser`] — declarative argument schemas with coercion and batched
//!   error collection
//! - [`pagination`] — optional offset pagination with out-of-range pages
//!   treated as not found
//! - [`repository`] — the CRUD trait each entity's storage implements
//! - [`responses`] / [`error`] — the uniform success and error envelopes

pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod pagination;
pub mod parser;
pub mod repository;
pub mod responses;
pub mod server;
pub mod state;

pub use error::{Error, Result};
