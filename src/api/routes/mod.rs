//! API Routes
//!
//! Route handlers organized by functionality.

pub mod aggregate;
pub mod export;
pub mod health;
pub mod records;
