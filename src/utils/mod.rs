//! Utility modules for the inventory core.
//!
//! - [`datetime`] - Timestamp helpers used for `modified_date` stamping and display

pub mod datetime;
