//! Integration test crate for notireg.
//!
//! This crate has no library code. Its tests drive whole package lifecycles
//! (install, upgrade, uninstall) through the hooks against a file-backed
//! settings store.
//!
//! ```sh
//! cargo test -p notireg-integration-tests
//! ```
