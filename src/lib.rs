//! CleanOps Admin - back-office gateway for an industrial cleaning platform
//!
//! Public marketing pages and the business CRUD API live elsewhere; this
//! service owns who gets into the back office. Every request under the
//! admin prefix is ruled on by an edge authorization gate (cookie token ->
//! role -> route-role table) before any handler runs, and a second,
//! fine-grained permission layer gates features inside each screen.

pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;

pub use routes::create_router;
