//! Status agent service pieces shared by the binary and its tests

pub mod api;
pub mod config;
