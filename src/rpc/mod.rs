//! RPC interfaces
//!
//! Only the REST surface is exposed; the resolution pipeline itself lives
//! in `crate::registry` and is consumed here as plain function calls.

pub mod rest;
