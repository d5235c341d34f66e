//! # utils
//!
//! Utilities

pub mod uri;
