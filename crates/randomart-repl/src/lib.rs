//! This crate provides a REPL (Read-Eval-Print Loop) for generating, parsing and
//! rendering randomart programs interactively.
//!
//! The REPL supports:
//! - Generating a new random tree on an empty line
//! - Parsing expressions typed at the prompt
//! - Sampling a tree at a random point or rendering it to a PNG
//! - History navigation
//!
//! ## Example
//!
//! ```rust,no_run
//! use randomart_repl::Repl;
//!
//! let repl = Repl::new(randomart_lang::Engine::default(), "randomart.png", 256);
//! repl.run().unwrap();
//! ```
mod command_context;
mod repl;

pub use command_context::{Command, CommandContext, CommandOutput, Mode};
pub use repl::Repl;
