//! Command pattern: reversible actions behind a gatekeeping invoker.
//!
//! An [`Invoker`] accepts only the command types it was built with, runs
//! them, and keeps the successful ones so they can be undone newest first.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use pattyrn::command::{Command, Invoker};
//! use pattyrn::PatternResult;
//!
//! struct Append {
//!     log: Arc<Mutex<Vec<String>>>,
//!     line: String,
//! }
//!
//! impl Command<usize> for Append {
//!     fn execute(&mut self) -> PatternResult<usize> {
//!         let mut log = self.log.lock().unwrap();
//!         log.push(self.line.clone());
//!         Ok(log.len())
//!     }
//!
//!     fn unexecute(&mut self) -> PatternResult<usize> {
//!         let mut log = self.log.lock().unwrap();
//!         log.pop();
//!         Ok(log.len())
//!     }
//! }
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let editor: Invoker<usize> = Invoker::new("Editor").accept::<Append>();
//!
//! editor.execute(Append { log: log.clone(), line: "hello".into() }).unwrap();
//! assert_eq!(editor.undo().unwrap(), 0);
//! ```

pub mod invoker;

// Re-exports
pub use invoker::{Command, Invoker};
