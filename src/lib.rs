//! Outfitter storefront
//!
//! Session-based shop: catalog browsing, a cart keyed by an opaque
//! session token, and checkout handed off to WhatsApp.
//!
//! ## Features
//! - Fixed parent categories (Outfit / Shoes / Combos) with per-child
//!   size configuration
//! - Product catalog with variations and stock tracking
//! - Session cart with variation-aware line merging
//! - Order placement with snapshot line items and tracking lookup
//! - WhatsApp order-message and deep-link generation

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;
pub mod whatsapp;

pub use error::{Result, StoreError};
