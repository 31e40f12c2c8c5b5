//! Small async helpers.

pub mod timeout;
