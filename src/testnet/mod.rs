//! Test-only helpers

pub mod test_utils;
