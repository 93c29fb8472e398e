//! Helfinka Types - Shared domain types
//!
//! This crate contains the types shared by the Helfinka client crates:
//! - Health entries and their per-type payloads
//! - The codec between stored items and typed entries
//! - Users, login and token claims
//! - REST request/response bodies
//! - Date ranges and note tag normalisation

pub mod api;
pub mod auth;
pub mod codec;
pub mod entry;
pub mod error;
pub mod range;
pub mod tags;
pub mod user;

pub use api::*;
pub use auth::*;
pub use codec::*;
pub use entry::*;
pub use error::*;
pub use range::*;
pub use tags::*;
pub use user::*;
