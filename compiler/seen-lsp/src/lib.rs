// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Seen Language Server Protocol implementation.
//!
//! A synchronous server over stdio providing:
//!
//! - Syntax error reporting
//! - Hover information
//! - Go-to-definition
//! - Code completion

pub mod document;
pub mod protocol;
pub mod server;
pub mod symbols;
pub mod transport;

pub use server::{run, ServerConfig, Session};
