//! Darbast domain crate.
//!
//! Zero-internal-dependency building blocks shared by the DB, event, and
//! API layers: identifier/timestamp aliases, the domain error taxonomy,
//! role gates, order/transfer/collaborator state tables, phone number
//! normalization, module lock and version rules, and the ownership chain
//! projection.

pub mod chain;
pub mod collaborator;
pub mod error;
pub mod modules;
pub mod order;
pub mod otp;
pub mod phone;
pub mod roles;
pub mod transfer;
pub mod types;
