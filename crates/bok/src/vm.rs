//! The stack machine.
//!
//! Executes flat operation sequences: callables are invoked against the
//! current stack, everything else is pushed. This module is the only place
//! that invokes callables — late-bound names are resolved here against the
//! dictionary at call time, word boundaries catch the `return` signal and
//! clear their variables, and the host-call bridge protocol lives here.
//!
//! `call_quote` and `apply_to_top` are the two primitives the combinator
//! library is built from.

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::stack::Stack;
use crate::value::{Callable, HostDef, Value, WordDef};

/// Machine context shared by every word invocation: the dictionary, the
/// print buffer, and step accounting.
#[derive(Debug)]
pub struct Vm {
    pub(crate) words: Dictionary,
    pub(crate) output: String,
    steps: u64,
    step_limit: Option<u64>,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            words: Dictionary::with_builtins(),
            output: String::new(),
            steps: 0,
            step_limit: None,
        }
    }

    pub(crate) fn set_step_limit(&mut self, limit: Option<u64>) {
        self.step_limit = limit;
    }

    /// Reset the step counter. Called at the start of each top-level run so
    /// the limit applies per run, not per machine lifetime.
    pub(crate) fn reset_steps(&mut self) {
        self.steps = 0;
    }

    pub(crate) fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Execute one flat operation sequence against `stack`.
    pub(crate) fn exec(&mut self, ops: &[Value], stack: &mut Stack) -> Result<()> {
        for op in ops {
            self.steps += 1;
            if let Some(limit) = self.step_limit
                && self.steps > limit
            {
                return Err(Error::StepLimitExceeded(limit));
            }
            match op {
                Value::Callable(callable) => self.invoke(callable, stack)?,
                value => stack.push(value.clone()),
            }
        }
        Ok(())
    }

    /// Invoke a single callable against `stack`.
    pub(crate) fn invoke(&mut self, callable: &Callable, stack: &mut Stack) -> Result<()> {
        match callable {
            Callable::Builtin(def) => (def.run)(self, stack),
            Callable::Word(word) => self.invoke_word(&word.clone(), stack),
            Callable::Varset(slot) => {
                let value = stack.pop()?;
                slot.set(value);
                Ok(())
            }
            Callable::Varget(slot) => {
                stack.push(slot.get());
                Ok(())
            }
            Callable::LateBind(name) => {
                let Some(target) = self.words.get(name).cloned() else {
                    return Err(Error::Name(name.to_string()));
                };
                self.invoke(&target, stack)
            }
            Callable::Host(def) | Callable::Array(def) => self.invoke_host(&def.clone(), stack),
        }
    }

    /// Run a word body. The `return` signal is caught here (and only here);
    /// the word's variable slots are cleared on completion either way.
    fn invoke_word(&mut self, word: &WordDef, stack: &mut Stack) -> Result<()> {
        let result = match self.exec(&word.ops, stack) {
            Err(Error::WordReturn) => Ok(()),
            other => other,
        };
        if result.is_ok() {
            for var in &word.vars {
                var.clear();
            }
        }
        result
    }

    /// The host-call bridge protocol: collected argument buffers win; an
    /// empty buffer pair means "apply to the stack top", unpacking iterable
    /// tops into positional arguments. Buffers are cleared after every call.
    fn invoke_host(&mut self, def: &HostDef, stack: &mut Stack) -> Result<()> {
        if stack.args_loaded() {
            let result = (def.func)(&stack.args, &stack.kwargs);
            stack.clear_args();
            stack.push(result?);
            return Ok(());
        }
        let top = stack.peek(0)?.clone();
        let result = match top.to_items() {
            Some(items) => (def.func)(&items, &[]),
            None => (def.func)(&[top], &[]),
        };
        stack.clear_args();
        stack.poke(0, result?)?;
        Ok(())
    }

    /// Execute a quotation value. Lists and tuples qualify; anything else is
    /// an argument error.
    pub(crate) fn call_quote(&mut self, quote: &Value, stack: &mut Stack) -> Result<()> {
        let ops = match quote {
            Value::List(items) => items.borrow().clone(),
            Value::Tuple(items) => items.as_ref().clone(),
            other => {
                return Err(Error::Argument(format!(
                    "expected a quotation, got {}",
                    other.type_name()
                )));
            }
        };
        self.exec(&ops, stack)
    }

    /// Top-copy-apply: run a predicate quotation against a one-element
    /// sub-stack holding a copy of the current top, returning the sub-stack's
    /// final top. The main stack is not touched.
    pub(crate) fn apply_to_top(&mut self, quote: &Value, stack: &Stack) -> Result<Value> {
        let mut sub = stack.top_to_stack();
        self.call_quote(quote, &mut sub)?;
        sub.pop()
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
