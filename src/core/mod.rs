//! Shared constants (compile everywhere)

pub mod paths;
