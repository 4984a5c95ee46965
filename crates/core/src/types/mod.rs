//! Core types for Bluebell Pharmacy.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod price;
pub mod status;

pub use contact::{Email, EmailError, PhoneNumber, PhoneNumberError};
pub use id::*;
pub use price::Price;
pub use status::*;
