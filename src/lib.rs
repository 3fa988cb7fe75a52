//! Falcon - remote file manager and command bridge
//!
//! Core library for the protocol engine, file operations and command
//! execution.

pub mod buffer;
pub mod config;
pub mod exec;
pub mod files;
pub mod http;
pub mod server;
