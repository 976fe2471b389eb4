//! Lowering: scoped parse tree → flat operation sequence.
//!
//! This is the only module that mutates the dictionary during compilation:
//! word definitions, first-sight variable slots, and imports all land here.
//! Literals lower to plain values, operators and dotted names resolve
//! directly, bare names fall back to late bindings, and word/import nodes
//! lower to nothing at all — their effect is the dictionary entry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::parser::{self, Node};
use crate::scope;
use crate::value::{Callable, HostDef, Value, VarSlot, WordDef};

/// Compilation context owned by the machine: import search paths and the
/// optional array backend.
#[derive(Debug, Default)]
pub(crate) struct CompileOptions {
    pub lib_paths: Vec<PathBuf>,
    pub arrays: HashMap<String, Rc<HostDef>>,
}

/// Full front end: lex, parse, scope, lower. Returns the executable
/// operation sequence; definitions and imports mutate `words` as a side
/// effect.
pub(crate) fn compile_source(
    source: &str,
    words: &mut Dictionary,
    options: &CompileOptions,
) -> Result<Vec<Value>> {
    let mut nodes = parser::parse(source)?;
    scope::resolve(&mut nodes);
    let mut lowerer = Lowerer { words, options };
    let mut ops = Vec::new();
    for node in &nodes {
        if let Some(value) = lowerer.lower(node)? {
            ops.push(value);
        }
    }
    Ok(ops)
}

struct Lowerer<'a> {
    words: &'a mut Dictionary,
    options: &'a CompileOptions,
}

impl Lowerer<'_> {
    /// Lower one node. Word definitions and imports produce no operation.
    fn lower(&mut self, node: &Node) -> Result<Option<Value>> {
        Ok(Some(match node {
            Node::Int(i) => Value::Int(*i),
            Node::Float(x) => Value::Float(*x),
            Node::Str(s) => Value::Str(s.clone()),
            Node::Bool(b) => Value::Bool(*b),
            Node::None => Value::None,
            Node::List(children) => {
                let mut items = Vec::with_capacity(children.len());
                for child in children {
                    if let Some(value) = self.lower(child)? {
                        items.push(value);
                    }
                }
                Value::list(items)
            }
            Node::Operator(op) => {
                let callable = self
                    .words
                    .get(op)
                    .cloned()
                    .ok_or_else(|| Error::Name((*op).to_string()))?;
                Value::Callable(callable)
            }
            Node::Dot(name) => {
                let callable = self
                    .words
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::Name(name.clone()))?;
                Value::Callable(callable)
            }
            Node::Call(name) => match self.words.get(name) {
                Some(callable) => Value::Callable(callable.clone()),
                None => Value::Callable(Callable::LateBind(Rc::from(name.as_str()))),
            },
            Node::Var(name) => {
                let slot = match self.words.get(name) {
                    Some(Callable::Varget(slot)) => slot.clone(),
                    Some(_) => {
                        return Err(Error::Argument(format!("'{name}' is not a variable")));
                    }
                    None => {
                        let slot = Rc::new(VarSlot::new(name.clone()));
                        self.words.insert(name.clone(), Callable::Varget(slot.clone()));
                        slot
                    }
                };
                Value::Callable(Callable::Varset(slot))
            }
            Node::Array(path) => {
                let def = self
                    .options
                    .arrays
                    .get(path)
                    .cloned()
                    .ok_or_else(|| Error::Name(format!("@{path}")))?;
                Value::Callable(Callable::Array(def))
            }
            Node::Word { name, doc, body } => {
                self.lower_word(name, doc.as_deref(), body)?;
                return Ok(None);
            }
            Node::Import(spec) => {
                self.import(spec)?;
                return Ok(None);
            }
        }))
    }

    fn lower_word(&mut self, name: &str, doc: Option<&str>, body: &[Node]) -> Result<()> {
        let mut ops = Vec::new();
        for node in body {
            if let Some(value) = self.lower(node)? {
                ops.push(value);
            }
        }

        // Only Varsets at the top level of the body are owned by the word;
        // slots referenced from nested quotations are not collected.
        let mut vars: Vec<Rc<VarSlot>> = Vec::new();
        for op in &ops {
            if let Value::Callable(Callable::Varset(slot)) = op
                && !vars.iter().any(|v| Rc::ptr_eq(v, slot))
            {
                vars.push(slot.clone());
            }
        }

        let word = WordDef {
            name: name.to_string(),
            doc: doc.map(str::to_string),
            ops,
            vars,
        };
        self.words.insert(name, Callable::Word(Rc::new(word)));
        Ok(())
    }

    /// Compile the named file against a fresh builtin-seeded dictionary and
    /// inject its definitions, prefixed with the file stem and a dot. The
    /// file's top-level code is discarded; only names cross the boundary.
    fn import(&mut self, spec: &str) -> Result<()> {
        let mod_name = Path::new(spec)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| spec.to_string());

        let mut file = spec.to_string();
        if !file.ends_with(".bok") {
            file.push_str(".bok");
        }

        let mut path = PathBuf::from(&file);
        if !path.is_file() {
            path = self
                .options
                .lib_paths
                .iter()
                .map(|dir| dir.join(&file))
                .find(|candidate| candidate.is_file())
                .unwrap_or(path);
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|e| Error::Argument(format!("cannot import '{}': {e}", path.display())))?;

        let mut sub_words = Dictionary::with_builtins();
        let _ = compile_source(&text, &mut sub_words, self.options)?;

        let mut names = sub_words.non_builtin_names();
        names.sort();
        for name in names {
            if let Some(callable) = sub_words.get(&name).cloned() {
                self.words.insert(format!("{mod_name}.{name}"), callable);
            }
        }
        Ok(())
    }
}
