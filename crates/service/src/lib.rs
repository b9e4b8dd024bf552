//! Service layer for the blog: post listings and editing, groups, auth.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Listings are paginated with `common::pagination`.

pub mod errors;
pub mod auth;
pub mod forms;
pub mod posts;
pub mod groups;
#[cfg(test)]
pub mod test_support;
