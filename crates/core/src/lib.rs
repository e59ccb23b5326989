//! StitchTrack Core - Shared domain types.
//!
//! This crate provides the types used across all StitchTrack components:
//! - `server` - Admin dashboard, login and customer tracking site
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. Everything that talks to the hosted backend lives in the server
//! crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, phone numbers and statuses
//! - [`order`] - The `Order` entity and its create/update payloads
//! - [`profile`] - Authenticated user and profile records
//! - [`validation`] - Per-field form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod order;
pub mod profile;
pub mod types;
pub mod validation;

pub use order::{NewOrder, Order, OrderChanges};
pub use profile::{Profile, User};
pub use types::*;
pub use validation::{FieldErrors, LoginForm, OrderForm};
