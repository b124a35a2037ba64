//! CLI command implementations.

pub mod hex_utils;
pub mod platforms;
pub mod resolve;
pub mod scan;
