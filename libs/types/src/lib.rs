//! Types library for the market-mirror workspace
//!
//! Core type definitions shared between the book engine and the serving
//! surfaces: decimal prices and quantities (no floating-point drift in
//! ladder math), lowercase symbol identifiers, and side selectors.
//!
//! # Modules
//! - `numeric`: Fixed-point decimal types (Price, Quantity)
//! - `symbol`: Lowercase trading-pair identifier
//! - `side`: Taker side and book-side selectors
//! - `time`: Millisecond wall-clock helper

pub mod numeric;
pub mod side;
pub mod symbol;
pub mod time;

pub use numeric::{Price, Quantity};
pub use side::{Side, SideFilter};
pub use symbol::Symbol;
pub use time::now_millis;
