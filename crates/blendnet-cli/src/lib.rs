//! Library surface of the BlendNet operator CLI.
//!
//! The binary in `main.rs` is a thin clap layer over [`commands`].

pub mod commands;
