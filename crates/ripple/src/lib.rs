//! # ripple
//!
//! The `ripple` CLI: a command-line front end over the `ripple_trace`
//! analysis engine (spec §1 calls this an "external collaborator" of the
//! core — this crate is that collaborator). Exposed as a library too so
//! its subcommand modules are independently testable, the way `vize`'s
//! crate does for its own `commands::*`.

pub mod commands;
pub mod config;
pub mod ignore_spec;
pub mod output;
