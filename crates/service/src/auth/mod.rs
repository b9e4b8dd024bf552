//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Sign-up, login and token verification live here, independent of axum.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{decode_token, AuthConfig, AuthService};
