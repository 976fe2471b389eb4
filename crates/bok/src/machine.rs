//! The machine facade the host drives.
//!
//! A [`Machine`] bundles the dictionary-carrying VM, the operand stack, and
//! the currently attached operation sequence. The host parses text into the
//! machine, runs it, and drains printed output; errors come back through
//! [`crate::Error`] and leave the machine reusable (the operand stack is
//! cleared on any runtime error, per the recovery policy).

use std::path::PathBuf;
use std::rc::Rc;

use crate::compiler::{self, CompileOptions};
use crate::error::{Error, Result};
use crate::stack::Stack;
use crate::value::{Callable, HostDef, HostFn, Value};
use crate::vm::Vm;

/// Resource limits for machine execution.
///
/// The step counter resets at the start of each [`Machine::run`], so a limit
/// applies per run. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    /// Maximum number of executed operations per run, counted across nested
    /// quotation and word invocations.
    pub max_steps: Option<u64>,
}

/// A complete interpreter instance: one dictionary, one operand stack.
///
/// # Example
///
/// ```
/// use bok::Machine;
///
/// let mut machine = Machine::new();
/// machine.run_source("[1 2 3] [dup *] map println").unwrap();
/// assert_eq!(machine.take_output(), "[1, 4, 9]\n");
/// ```
pub struct Machine {
    vm: Vm,
    stack: Stack,
    code: Vec<Value>,
    options: CompileOptions,
    limits: Limits,
}

impl Machine {
    /// A machine with a builtin-seeded dictionary and an empty stack.
    pub fn new() -> Self {
        Self {
            vm: Vm::new(),
            stack: Stack::new(),
            code: Vec::new(),
            options: CompileOptions::default(),
            limits: Limits::default(),
        }
    }

    /// Lower source text into the attached operation sequence.
    ///
    /// Word definitions and imports take effect here, during lowering; the
    /// resulting sequence waits for [`run`](Self::run). Blank input attaches
    /// an empty sequence.
    pub fn parse(&mut self, source: &str) -> Result<()> {
        self.code = if source.trim().is_empty() {
            Vec::new()
        } else {
            compiler::compile_source(source, &mut self.vm.words, &self.options)?
        };
        Ok(())
    }

    /// Execute the attached operation sequence against the operand stack.
    ///
    /// On any error except the exit signal, the operand stack and argument
    /// buffers are cleared before the error is returned; the machine stays
    /// usable.
    pub fn run(&mut self) -> Result<()> {
        self.vm.reset_steps();
        self.vm.set_step_limit(self.limits.max_steps);
        let code = std::mem::take(&mut self.code);
        let result = self.vm.exec(&code, &mut self.stack);
        self.code = code;
        match result {
            Err(Error::Exit) => Err(Error::Exit),
            Err(err) => {
                self.stack.clear();
                self.stack.clear_args();
                Err(err)
            }
            Ok(()) => Ok(()),
        }
    }

    /// Parse and run in one step.
    ///
    /// # Example
    ///
    /// ```
    /// use bok::Machine;
    ///
    /// let mut machine = Machine::new();
    /// machine.run_source("1 1 + println").unwrap();
    /// assert_eq!(machine.take_output(), "2\n");
    /// ```
    pub fn run_source(&mut self, source: &str) -> Result<()> {
        self.parse(source)?;
        self.run()
    }

    /// Drain everything `print`, `println`, `stack`, and `help` wrote since
    /// the last drain.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.vm.output)
    }

    /// Bottom-to-top view of the operand stack.
    pub fn stack(&self) -> &[Value] {
        self.stack.items()
    }

    pub fn clear_stack(&mut self) {
        self.stack.clear();
        self.stack.clear_args();
    }

    /// Push a value from the host side.
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop a value from the host side.
    pub fn pop(&mut self) -> Result<Value> {
        self.stack.pop()
    }

    /// Install a host function, callable by name like any word.
    ///
    /// Invocation follows the bridge protocol: arguments collected with
    /// `>*`/`>**` win; otherwise the function is applied to the stack top
    /// (iterable tops unpack into positional arguments) and replaces it.
    ///
    /// # Example
    ///
    /// ```
    /// use bok::{Machine, Value};
    ///
    /// let mut machine = Machine::new();
    /// machine.register_fn("hypot2", |args, _kwargs| {
    ///     let mut total = 0.0;
    ///     for arg in args {
    ///         let x = arg.as_float().unwrap_or(0.0);
    ///         total += x * x;
    ///     }
    ///     Ok(Value::Float(total))
    /// });
    ///
    /// machine.run_source("[3 4] hypot2 println").unwrap();
    /// assert_eq!(machine.take_output(), "25.0\n");
    /// ```
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &[(Value, Value)]) -> Result<Value> + 'static,
    {
        let name = name.into();
        let def = HostDef {
            name: name.clone(),
            doc: None,
            func: Rc::new(f) as HostFn,
        };
        self.vm.words.insert(name, Callable::Host(Rc::new(def)));
    }

    /// Install an array-backend function reachable through the `@path`
    /// literal form. With no registrations the `@` forms are simply
    /// unavailable; nothing else changes.
    pub fn register_array_fn<F>(&mut self, path: impl Into<String>, f: F)
    where
        F: Fn(&[Value], &[(Value, Value)]) -> Result<Value> + 'static,
    {
        let path = path.into();
        let def = HostDef {
            name: path.clone(),
            doc: None,
            func: Rc::new(f) as HostFn,
        };
        self.options.arrays.insert(path, Rc::new(def));
    }

    /// Add a directory to the import search path. Imports try the working
    /// directory first, then each library path in registration order.
    pub fn add_lib_path(&mut self, dir: impl Into<PathBuf>) {
        self.options.lib_paths.push(dir.into());
    }

    /// Apply resource limits to subsequent runs.
    pub fn limit(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Snapshot of every bound dictionary name, sorted. Useful for REPL
    /// completion.
    pub fn word_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.vm.words.names().map(str::to_string).collect();
        names.sort();
        names
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
