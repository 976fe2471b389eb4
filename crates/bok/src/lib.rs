//! bok — a concatenative, stack-based programming language.
//!
//! A program is a stream of words: literals push themselves onto a shared
//! operand stack, everything else consumes operands from the top and pushes
//! results back. Quotations (`[..]`) are first-class deferred programs, and
//! a library of combinators (`map`, `filter`, `fold`, `dip`, `bi`,
//! `linrec`, ...) turns them into control flow.
//!
//! # Quick start
//!
//! ```
//! use bok::Machine;
//!
//! let mut machine = Machine::new();
//!
//! // Define a word with a local variable and call it.
//! machine.run_source("(square :x x x *) 4 square println").unwrap();
//! assert_eq!(machine.take_output(), "16\n");
//!
//! // Quotations and combinators.
//! machine.run_source("[1 2 3 4] 0 [+] fold println").unwrap();
//! assert_eq!(machine.take_output(), "10\n");
//! ```
//!
//! # Language surface
//!
//! - Literals: integers (decimal, `0x`, `0o`, `0b`), floats, strings with
//!   `d`/`b`/`r` affixes, `True`, `False`, `None`, lists `[..]`.
//! - Definitions: `(name d'docstring' body..)`, nested definitions are
//!   lexically scoped, `:x` assigns a word-local variable.
//! - `import "file"` compiles `file.bok` in isolation and injects its
//!   definitions under a `file.` prefix.
//! - Host embedding: [`Machine::register_fn`] exposes Rust functions to
//!   programs; `>*` and `>**` collect call arguments explicitly.
//!
//! Execution is strict, left-to-right, single-threaded. Runtime errors
//! abort the current statement and clear the stack; the machine itself
//! stays usable.

mod builtins;
mod combinators;
mod compiler;
mod dictionary;
mod error;
mod lexer;
mod machine;
mod operators;
mod parser;
mod scope;
mod slice;
mod stack;
mod value;
mod vm;

pub use dictionary::Dictionary;
pub use error::{Error, Result};
pub use machine::{Limits, Machine};
pub use stack::Stack;
pub use value::{BuiltinDef, Callable, HostDef, HostFn, ListHandle, MapHandle, Value, VarSlot, WordDef};
pub use vm::Vm;
