//! Selection of instruments and delivery methods
//!
//! The same [`SelectionCriteria`] is applied independently to the QC Database
//! and to the live catalog before they are reconciled.
//!
//! # Module Organization
//!
//! - [`criteria`] - selection criteria, token parsing and time bounds
//! - [`methods`] - delivery method expansion
//! - [`filter`] - predicates and the conjunctive filter
//! - [`options`] - enumeration and validation of legal values
//!
//! # Examples
//!
//! ```rust
//! use ooi_requests::app::selection::{define_methods, parse_tokens, SelectionCriteria};
//!
//! let criteria = SelectionCriteria {
//!     arrays: parse_tokens("CP, CE"),
//!     instruments: parse_tokens("CTD"),
//!     ..Default::default()
//! };
//! assert_eq!(criteria.arrays.len(), 2);
//! assert_eq!(define_methods(["recovered"]).unwrap().len(), 4);
//! ```

pub mod criteria;
pub mod filter;
pub mod methods;
pub mod options;

pub use criteria::{parse_tokens, Level, SelectionCriteria, TimeBounds};
pub use filter::{filter, Filter, Predicate};
pub use methods::{default_methods, define_methods, DeliveryMethod};
pub use options::{validate_selection, SelectionOptions};
