//! Build-time configuration constants.
//!
//! Generated by `build.rs` from `linmem.toml` (or the file named by the
//! `LINMEM_CONFIG` environment variable). See that file for the available
//! keys and their defaults.

include!(concat!(env!("OUT_DIR"), "/config_gen.rs"));
