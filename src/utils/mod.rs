//! Utility modules: query timing log sink, numeric conversions.
pub mod devlog;
pub mod num;
