//! The tagged value universe and the callable variants.
//!
//! Everything that can sit on the operand stack is a [`Value`]. Quotations
//! are not a separate type: they are ordinary lists whose elements happen to
//! include [`Callable`]s, and the evaluator discovers callability while
//! iterating. Lists, sets, and maps are shared by reference — cloning a
//! `Value::List` clones the handle, so mutation through one handle is
//! observable through every other.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::error::Result;
use crate::stack::Stack;
use crate::vm::Vm;

/// Shared, mutable element storage backing lists and quotations.
pub type ListHandle = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable pair storage backing maps.
pub type MapHandle = Rc<RefCell<Vec<(Value, Value)>>>;

/// A single stack value.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Mutable ordered sequence. Doubles as a quotation when it contains
    /// callables.
    List(ListHandle),
    /// Immutable sequence.
    Tuple(Rc<Vec<Value>>),
    /// Deduplicated collection. Storage preserves insertion order so that
    /// display stays stable.
    Set(ListHandle),
    /// Insertion-ordered key/value pairs.
    Map(MapHandle),
    /// Lazy integer range, as produced by the `range` word.
    Range { start: i64, stop: i64, step: i64 },
    /// Index window, as produced by the `slice` word. `None` fields mean
    /// "unspecified" and default per the usual slicing rules.
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    Callable(Callable),
}

/// A value that acts on the stack when encountered during execution.
#[derive(Debug, Clone)]
pub enum Callable {
    /// A primitive with a stable name and docstring.
    Builtin(&'static BuiltinDef),
    /// A user-defined word.
    Word(Rc<WordDef>),
    /// The assignment half of a variable: pops the stack top into the slot.
    Varset(Rc<VarSlot>),
    /// The read half of a variable: pushes the slot contents.
    Varget(Rc<VarSlot>),
    /// A forward reference resolved against the dictionary at call time.
    LateBind(Rc<str>),
    /// A host-registered function (the foreign-call bridge).
    Host(Rc<HostDef>),
    /// An `@path` array-backend function. Same invocation protocol as
    /// `Host`, distinct spelling.
    Array(Rc<HostDef>),
}

/// A primitive word: implementation plus the documentation `help` prints.
pub struct BuiltinDef {
    pub name: &'static str,
    pub doc: &'static str,
    pub run: fn(&mut Vm, &mut Stack) -> Result<()>,
}

impl fmt::Debug for BuiltinDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinDef").field("name", &self.name).finish()
    }
}

/// A user-defined word: a flat operation sequence, an optional docstring,
/// and the variable slots the word owns (cleared when the word finishes).
#[derive(Debug)]
pub struct WordDef {
    pub name: String,
    pub doc: Option<String>,
    pub ops: Vec<Value>,
    pub vars: Vec<Rc<VarSlot>>,
}

/// A named variable slot. Slots are per-definition, not per-activation:
/// a recursive word shares its slots across nested activations.
#[derive(Debug)]
pub struct VarSlot {
    pub name: String,
    slot: RefCell<Value>,
}

impl VarSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: RefCell::new(Value::None),
        }
    }

    pub fn get(&self) -> Value {
        self.slot.borrow().clone()
    }

    pub fn set(&self, value: Value) {
        *self.slot.borrow_mut() = value;
    }

    pub fn clear(&self) {
        *self.slot.borrow_mut() = Value::None;
    }
}

/// Host function: positional buffer + keyword buffer in, one value out.
pub type HostFn = Rc<dyn Fn(&[Value], &[(Value, Value)]) -> Result<Value>>;

/// A function provided by the embedding host.
pub struct HostDef {
    pub name: String,
    pub doc: Option<String>,
    pub func: HostFn,
}

impl fmt::Debug for HostDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostDef").field("name", &self.name).finish()
    }
}

impl Value {
    /// Build a list value from element values.
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    /// The value's type name, as shown by the `stack` word and in type
    /// mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Range { .. } => "range",
            Self::Slice { .. } => "slice",
            Self::Callable(c) => c.type_name(),
        }
    }

    /// Truthiness: empty containers, zero numbers, the empty string, and
    /// `None` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) | Self::Set(items) => !items.borrow().is_empty(),
            Self::Tuple(items) => !items.is_empty(),
            Self::Map(pairs) => !pairs.borrow().is_empty(),
            Self::Range { .. } => !self.range_items().is_empty(),
            Self::Slice { .. } | Self::Callable(_) => true,
        }
    }

    /// Coerce to f64 for numeric operators. Bools count as 0/1.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(f64::from(*b)),
            _ => None,
        }
    }

    /// Integer view for bitwise operators and indices. Bools count as 0/1.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Elements of an iterable value, cloned out. `None` for non-iterables.
    /// Strings iterate as one-character strings; maps iterate their keys.
    pub fn to_items(&self) -> Option<Vec<Value>> {
        match self {
            Self::List(items) | Self::Set(items) => Some(items.borrow().clone()),
            Self::Tuple(items) => Some(items.as_ref().clone()),
            Self::Str(s) => Some(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Self::Map(pairs) => Some(pairs.borrow().iter().map(|(k, _)| k.clone()).collect()),
            Self::Range { .. } => Some(self.range_items()),
            _ => None,
        }
    }

    fn range_items(&self) -> Vec<Value> {
        let Self::Range { start, stop, step } = *self else {
            return Vec::new();
        };
        let mut items = Vec::new();
        if step > 0 {
            let mut i = start;
            while i < stop {
                items.push(Value::Int(i));
                i += step;
            }
        } else if step < 0 {
            let mut i = start;
            while i > stop {
                items.push(Value::Int(i));
                i += step;
            }
        }
        items
    }

    /// The `repr` rendering: strings quoted, containers recursively
    /// repr'd, callables in their angle-bracket form.
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => repr_str(s),
            Self::Slice { start, stop, step } => format!(
                "slice({}, {}, {})",
                opt_int(*start),
                opt_int(*stop),
                opt_int(*step)
            ),
            _ => self.to_string(),
        }
    }
}

fn opt_int(v: Option<i64>) -> String {
    match v {
        Some(i) => i.to_string(),
        None => "None".to_string(),
    }
}

/// Single-quoted string repr with the escapes the lexer understands.
fn repr_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Formats a float so that integral values keep their decimal point
/// (`4.0`, not `4`).
pub(crate) fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{}", format_float(*x)),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(items) => write_seq(f, &items.borrow(), "[", "]"),
            Self::Tuple(items) => {
                if items.len() == 1 {
                    write!(f, "({},)", items[0].repr())
                } else {
                    write_seq(f, items, "(", ")")
                }
            }
            Self::Set(items) => {
                let items = items.borrow();
                if items.is_empty() {
                    write!(f, "set()")
                } else {
                    write_seq(f, &items, "{", "}")
                }
            }
            Self::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k.repr(), v.repr())?;
                }
                write!(f, "}}")
            }
            Self::Range { start, stop, step } => {
                if *step == 1 {
                    write!(f, "range({start}, {stop})")
                } else {
                    write!(f, "range({start}, {stop}, {step})")
                }
            }
            Self::Slice { .. } => write!(f, "{}", self.repr()),
            Self::Callable(c) => write!(f, "{c}"),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value], open: &str, close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item.repr())?;
    }
    write!(f, "{close}")
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Bool(a), Self::Int(b)) | (Self::Int(b), Self::Bool(a)) => i64::from(*a) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().all(|x| b.contains(x))
            }
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (
                Self::Range { start, stop, step },
                Self::Range {
                    start: s2,
                    stop: e2,
                    step: t2,
                },
            ) => start == s2 && stop == e2 && step == t2,
            (
                Self::Slice { start, stop, step },
                Self::Slice {
                    start: s2,
                    stop: e2,
                    step: t2,
                },
            ) => start == s2 && stop == e2 && step == t2,
            (Self::Callable(a), Self::Callable(b)) => a == b,
            _ => false,
        }
    }
}

impl Callable {
    /// The name the callable was bound under.
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(b) => b.name,
            Self::Word(w) => &w.name,
            Self::Varset(v) | Self::Varget(v) => &v.name,
            Self::LateBind(name) => name,
            Self::Host(h) | Self::Array(h) => &h.name,
        }
    }

    /// The docstring, if the callable carries one.
    pub fn doc(&self) -> Option<&str> {
        match self {
            Self::Builtin(b) => Some(b.doc),
            Self::Word(w) => w.doc.as_deref(),
            Self::Host(h) | Self::Array(h) => h.doc.as_deref(),
            Self::Varset(_) | Self::Varget(_) | Self::LateBind(_) => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Builtin(_) => "builtin",
            Self::Word(_) => "word",
            Self::Varset(_) | Self::Varget(_) => "var",
            Self::LateBind(_) => "latebind",
            Self::Host(_) => "host",
            Self::Array(_) => "array",
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(b) => write!(f, "<{}>", b.name),
            Self::Word(w) => write!(f, "<{}>", w.name),
            Self::Varset(v) | Self::Varget(v) => write!(f, "<:{}>", v.name),
            Self::LateBind(name) => write!(f, "<{name}>"),
            Self::Host(h) => write!(f, "<py:{}>", h.name),
            Self::Array(h) => write!(f, "<@{}>", h.name),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Builtin(a), Self::Builtin(b)) => std::ptr::eq(*a, *b),
            (Self::Word(a), Self::Word(b)) => Rc::ptr_eq(a, b),
            (Self::Varset(a), Self::Varset(b)) | (Self::Varget(a), Self::Varget(b)) => {
                Rc::ptr_eq(a, b)
            }
            (Self::LateBind(a), Self::LateBind(b)) => a == b,
            (Self::Host(a), Self::Host(b)) | (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}
