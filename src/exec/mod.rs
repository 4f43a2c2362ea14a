// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually starting the processes behind a
//! run request, using `tokio::process::Command`, and turning their output and
//! exit into a per-process stream of [`ProcessEvent`]s.
//!
//! - [`launcher`] maps file runs (language table) and command runs (shell)
//!   into [`LaunchSpec`]s.
//! - [`backend`] provides the `ProcessBackend` trait and the production
//!   `RealProcessBackend`; tests replace it with a scripted fake.
//! - [`supervisor`] owns one child: pumps its pipes, waits for exit, and
//!   handles termination requests.
//! - [`decode`] turns raw pipe reads into UTF-8 text without splitting
//!   characters.

pub mod backend;
pub mod decode;
pub mod launcher;
pub mod supervisor;

pub use backend::{
    LaunchSpec, LaunchedProcess, ProcessBackend, ProcessEvent, ProcessHandle, RealProcessBackend,
};
pub use decode::Utf8ChunkDecoder;
pub use launcher::{ProcessLauncher, command_spec, split_command_line};
