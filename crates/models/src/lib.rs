pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod group;
pub mod post;

#[cfg(test)]
mod tests;
