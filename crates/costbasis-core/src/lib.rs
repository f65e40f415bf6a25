//! Core types for costbasis
//!
//! This crate provides the data model shared by the costbasis passes:
//!
//! - [`Amount`] - A decimal number with a currency
//! - [`Cost`] - Acquisition cost of a position (lot)
//! - [`CostSpec`] - Cost annotation as written on a posting
//! - [`Position`] - Units held at a cost
//! - [`Inventory`] - A collection of positions merged by lot
//! - [`Directive`] - The directive types the passes inspect or emit
//!
//! # Example
//!
//! ```
//! use costbasis_core::{Amount, Cost, Inventory, Position};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! // Accumulate an account's lots
//! let mut inv = Inventory::new();
//!
//! let cost = Cost::new(dec!(100.00), "USD")
//!     .with_date(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
//! inv.add(Position::with_cost(Amount::new(dec!(10), "TEST"), cost.clone()));
//!
//! // A disposal recorded against the same lot nets it out
//! inv.add(Position::with_cost(Amount::new(dec!(-10), "TEST"), cost));
//! assert!(inv.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod cost;
pub mod directive;
pub mod inventory;
pub mod position;

pub use amount::Amount;
pub use cost::{Cost, CostSpec};
pub use directive::{
    sort_directives, Balance, Close, Directive, DirectivePriority, MetaValue, Metadata, Open,
    Posting, PriceAnnotation, Transaction,
};
pub use inventory::Inventory;
pub use position::Position;

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
