//! The builtin word table.
//!
//! Every primitive word: arithmetic and comparison glue over
//! [`crate::operators`], stack shufflers, casts, sequence and scalar words,
//! printing, and the control words. Higher-order words live in
//! [`crate::combinators`] but register through the same table.
//!
//! Docstrings follow the house style: a stack effect line `( in -- out )`,
//! optionally followed by prose and a `«` example. `help` prints them
//! dedented.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::combinators;
use crate::error::{Error, Result};
use crate::operators;
use crate::slice::{resolve_index, resolve_slice};
use crate::stack::Stack;
use crate::value::{BuiltinDef, Value};
use crate::vm::Vm;

macro_rules! builtin {
    ($name:literal, $func:path, $doc:literal) => {
        BuiltinDef {
            name: $name,
            doc: $doc,
            run: $func,
        }
    };
}

/// The complete builtin table the dictionary is seeded from.
pub static TABLE: &[BuiltinDef] = &[
    builtin!("!=", ne, "( a b -- ? )"),
    builtin!("%", modulo, "( x y -- z )"),
    builtin!("&", bit_and, "( i j -- k )"),
    builtin!(
        "*",
        mul,
        "( x y -- z )\n( [a] n -- [a a ..] )\n\nMultiply two elements. For numeric types this performs arithmetic\nmultiplication. For a list and integer this duplicates then\nconcatenates.\n\nExamples\n--------\n« 2 3 * println\n6\n« [1] 3 * println\n[1, 1, 1]"
    ),
    builtin!("**", power, "( x y -- x**y )"),
    builtin!(
        "+",
        plus,
        "( x y -- z )\n( [a] [b] -- [a b] )\n\nAdd two elements. For numeric types, this performs arithmetic\naddition. For lists and strings, this performs concatenation.\n\nExamples\n--------\n« 1 1 + println\n2\n« [1 2] [3] + println\n[1, 2, 3]"
    ),
    builtin!("++", increment, "( x -- x+1 )"),
    builtin!("-", minus, "( x y -- z )\n\nSubtract two elements."),
    builtin!("--", decrement, "( x -- x-1 )"),
    builtin!("/", div, "( x y -- z )"),
    builtin!("//", floor_div, "( x y -- z )"),
    builtin!("<", lt, "( a b -- ? )"),
    builtin!("<<", bit_lshift, "( i j -- k )"),
    builtin!("<=", le, "( a b -- ? )"),
    builtin!("==", eq, "( a b -- ? )"),
    builtin!(">", gt, "( a b -- ? )"),
    builtin!(">*", append_args, "( a --  )\n\nCollect the top element into the positional buffer for the next\nhost call."),
    builtin!(">**", append_kwargs, "( {..} --  )\n\nMerge the top mapping into the keyword buffer for the next host\ncall."),
    builtin!(">=", ge, "( a b -- ? )"),
    builtin!(">>", bit_rshift, "( i j -- k )"),
    builtin!("^", bit_xor, "( i j -- k )"),
    builtin!("abs", abs_, "( x -- |x| )"),
    builtin!("all", all_, "( [..] -- ? )"),
    builtin!("and", and_, "( a b -- c )"),
    builtin!("any", any_, "( [..] -- ? )"),
    builtin!("append", append, "( [..] a -- [.. a] )"),
    builtin!("ascii", ascii_, "( a -- s )"),
    builtin!("assert", assert_, "( ? -- !|None )"),
    builtin!("assign", set_to, "( obj v k -- obj )\n\nStore v at index or key k, mutating obj in place."),
    builtin!("bi", combinators::bi, "( a [q1] [q2] -- .. )\n\nApply each quotation to a fresh copy of the element."),
    builtin!("bin", bin_, "( i -- s )"),
    builtin!("bool", cast_bool, "( a -- ? )"),
    builtin!("choice", combinators::choice, "( ? t f -- t|f )"),
    builtin!("chr", chr_, "( i -- s )"),
    builtin!("cleave", combinators::cleave, "( a b [q1] [q2] -- .. )"),
    builtin!("cond", combinators::cond, "( [[p1 e1] [p2 e2] ..] -- .. )\n\nRun the first expression whose predicate, applied to a copy of the\ntop element, is truthy."),
    builtin!("dip", combinators::dip, "( a [q] -- .. a )\n\nPop the element, run the quotation underneath it, push it back."),
    builtin!("drop", drop_, "( a --  )"),
    builtin!("drop2", drop2, "( a b --  )"),
    builtin!("dump", dump, "( .. --  )"),
    builtin!("dup", dup, "( a -- a a )"),
    builtin!("error", error, "( -- ! )"),
    builtin!("eval", combinators::exec_, "( [..] -- .. )"),
    builtin!("exec", combinators::exec_, "( [..] -- .. )"),
    builtin!("exit", exit, "(  --  )\n\nLeave the interpreter."),
    builtin!("extend", extend, "( [..] [a b ..] -- [.. a b ..] )"),
    builtin!("filter", combinators::filter, "( [a ..] [q] -- [a ..] )\n\nKeep the elements for which the quotation leaves a truthy result."),
    builtin!("float", cast_float, "( a -- f )"),
    builtin!("fold", combinators::fold, "( [a ..] a0 [q] -- x )\n\nPush the seed, then push and combine each element in turn. The\naccumulator lives on the stack.\n\nExamples\n--------\n« [1 2 3 4] 0 [+] fold println\n10"),
    builtin!("foreach", combinators::foreach, "( [a ..] [q] -- .. )\n\nPush each element and run the quotation."),
    builtin!("get", get_from, "( obj k -- obj obj[k] )"),
    builtin!("hash", hash_, "( a -- i )"),
    builtin!("help", help_, "( [w] --  )\n\nPrint the docstring of the callable inside the quotation.\n\nExamples\n--------\n« [swap] help\n( a b -- b a )"),
    builtin!("if", combinators::if_, "( [c] [t] [f] -- .. )\n\nApply the condition to a copy of the top element, then run the\nmatching branch."),
    builtin!("input", input_, "(  -- s )"),
    builtin!("int", cast_int, "( a -- i )"),
    builtin!("keep", combinators::keep, "( a [q] -- .. a )\n\nRun the quotation with the element on top, then push the element\nagain."),
    builtin!("len", len_, "( [..] -- i )"),
    builtin!(
        "linrec",
        combinators::linrec,
        "( [c] [t] [e] [p] -- .. )\n\nLinear recursion. While the condition applied to a copy of the top\nis falsy, run the else quotation and count the pass; once truthy,\nrun the true quotation, then run the post quotation once per\ncounted pass.\n\nExamples\n--------\n« 5 [dup 1 <=] [] [dup 1 -] [*] linrec println\n120"
    ),
    builtin!("list", list_, "( a -- [a] )"),
    builtin!("list2", list2, "( a b -- [a b] )"),
    builtin!("list3", list3, "( a b c -- [a b c] )"),
    builtin!("listn", listn, "( .. n -- [..][n] )"),
    builtin!(
        "map",
        combinators::map,
        "( [a ..] [q] -- [q(a) ..] )\n\nExamples\n--------\n« [1 2 3] [dup *] map println\n[1, 4, 9]"
    ),
    builtin!("max", max_, "( [..] -- a )"),
    builtin!("min", min_, "( [..] -- a )"),
    builtin!(
        "negate",
        negate,
        "( x -- y )\n\nNegate the element.\n\nExamples\n--------\n« 1 negate println\n-1"
    ),
    builtin!("nip", nip, "( a b -- b )"),
    builtin!("nop", nop, "(  --  )\n\nNo operation, pass."),
    builtin!("not", not_, "( a -- ? )"),
    builtin!("or", or_, "( a b -- c )"),
    builtin!("over", over, "( a b -- a b a )"),
    builtin!("prepend", prepend, "( [..] a -- [a ..] )"),
    builtin!("print", print_, "( a --  )"),
    builtin!("println", println_, "( a --  )"),
    builtin!(
        "range",
        range_,
        "( end -- [0 .. end-1] )\n( [end] -- [0 .. end-1] )\n( [start end] -- [start .. end-1] )\n( [start end step] -- [start .. start+step .. end-1] )"
    ),
    builtin!("repeat", combinators::repeat, "( n [q] -- .. )"),
    builtin!("repr", repr_, "( a -- s )"),
    builtin!("return", return_, "(  -- ! )\n\nLeave the enclosing word early."),
    builtin!("rolldown", rolldown, "( a b c -- b c a )"),
    builtin!("rollup", rollup, "( a b c -- c a b )"),
    builtin!("rotate", rotate, "( a b c -- c b a )"),
    builtin!("set", set_, "( [..] -- {..} )"),
    builtin!("slice", slice_, "( [stop] -- sl )\n( [start stop] -- sl )\n( [start stop step] -- sl )"),
    builtin!("stack", print_stack, "(  --  )\n\nPretty-print the stack, top first."),
    builtin!("str", cast_str, "( a -- s )"),
    builtin!("sum", sum_, "( [..] -- x )"),
    builtin!("swap", swap, "( a b -- b a )"),
    builtin!("tri", combinators::tri, "( a [q1] [q2] [q3] -- .. )"),
    builtin!("tuck", tuck, "( a b -- b a b )"),
    builtin!("tuple", tuple_, "( [..] -- (..) )"),
    builtin!("unless", combinators::unless, "( [c] [f] -- .. )"),
    builtin!("when", combinators::when, "( [c] [t] -- .. )"),
    builtin!(
        "while",
        combinators::while_,
        "( [stop] [body] -- .. )\n\nRun the body while the stop quotation, applied to a copy of the\ntop element, stays truthy."
    ),
    builtin!("xor", xor, "( a b -- ? )"),
    builtin!("|", bit_or, "( i j -- k )"),
    builtin!("~", bit_not, "( i -- j )"),
];

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Pop the right operand, combine with the left in place.
fn binop(stack: &mut Stack, f: impl Fn(&Value, &Value) -> Result<Value>) -> Result<()> {
    stack.require(2)?;
    let right = stack.pop()?;
    let result = f(stack.peek(0)?, &right)?;
    stack.poke(0, result)
}

/// Transform the top element in place.
fn unop(stack: &mut Stack, f: impl Fn(&Value) -> Result<Value>) -> Result<()> {
    let result = f(stack.peek(0)?)?;
    stack.poke(0, result)
}

fn comparison(stack: &mut Stack, keep: impl Fn(std::cmp::Ordering) -> bool) -> Result<()> {
    binop(stack, |a, b| {
        Ok(Value::Bool(keep(operators::compare(a, b)?)))
    })
}

fn iterable_items(value: &Value) -> Result<Vec<Value>> {
    value
        .to_items()
        .ok_or_else(|| Error::type_mismatch("iterable", value.type_name()))
}

fn int_arg(value: &Value) -> Result<i64> {
    value
        .as_int()
        .ok_or_else(|| Error::type_mismatch("int", value.type_name()))
}

// ---------------------------------------------------------------------------
// Numeric and bitwise operators
// ---------------------------------------------------------------------------

fn nop(_vm: &mut Vm, _stack: &mut Stack) -> Result<()> {
    Ok(())
}

fn negate(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, operators::negate)
}

fn plus(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::add)
}

fn minus(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::sub)
}

fn mul(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::mul)
}

fn div(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::div)
}

fn floor_div(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::floor_div)
}

fn modulo(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::modulo)
}

fn power(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::pow)
}

fn increment(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, operators::increment)
}

fn decrement(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, operators::decrement)
}

fn bit_not(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, operators::bit_not)
}

fn bit_and(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::bit_and)
}

fn bit_or(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::bit_or)
}

fn bit_xor(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::bit_xor)
}

fn bit_lshift(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::shl)
}

fn bit_rshift(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, operators::shr)
}

// ---------------------------------------------------------------------------
// Comparison operators
// ---------------------------------------------------------------------------

fn eq(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, |a, b| Ok(Value::Bool(a == b)))
}

fn ne(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, |a, b| Ok(Value::Bool(a != b)))
}

fn lt(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    comparison(stack, std::cmp::Ordering::is_lt)
}

fn le(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    comparison(stack, std::cmp::Ordering::is_le)
}

fn gt(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    comparison(stack, std::cmp::Ordering::is_gt)
}

fn ge(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    comparison(stack, std::cmp::Ordering::is_ge)
}

// ---------------------------------------------------------------------------
// Logical operators
// ---------------------------------------------------------------------------

fn not_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| Ok(Value::Bool(!a.is_truthy())))
}

/// Value-preserving: leaves the deciding operand, like the source language.
fn and_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, |a, b| {
        Ok(if a.is_truthy() { b.clone() } else { a.clone() })
    })
}

fn or_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, |a, b| {
        Ok(if a.is_truthy() { a.clone() } else { b.clone() })
    })
}

fn xor(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    binop(stack, |a, b| {
        Ok(Value::Bool(a.is_truthy() != b.is_truthy()))
    })
}

// ---------------------------------------------------------------------------
// Host-call argument collectors
// ---------------------------------------------------------------------------

fn append_args(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let value = stack.pop()?;
    stack.args.push(value);
    Ok(())
}

fn append_kwargs(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let value = stack.pop()?;
    let Value::Map(pairs) = &value else {
        return Err(Error::type_mismatch("map", value.type_name()));
    };
    for (k, v) in pairs.borrow().iter() {
        if let Some(existing) = stack.kwargs.iter_mut().find(|(key, _)| key == k) {
            existing.1 = v.clone();
        } else {
            stack.kwargs.push((k.clone(), v.clone()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scalar words
// ---------------------------------------------------------------------------

fn abs_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| match a {
        Value::Int(i) => Ok(Value::Int(i.wrapping_abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        _ => Err(Error::type_mismatch("number", a.type_name())),
    })
}

fn all_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        Ok(Value::Bool(iterable_items(a)?.iter().all(Value::is_truthy)))
    })
}

fn any_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        Ok(Value::Bool(iterable_items(a)?.iter().any(Value::is_truthy)))
    })
}

fn ascii_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        let mut out = String::new();
        for c in a.repr().chars() {
            if c.is_ascii() {
                out.push(c);
            } else if (c as u32) <= 0xFFFF {
                out.push_str(&format!("\\u{:04x}", c as u32));
            } else {
                out.push_str(&format!("\\U{:08x}", c as u32));
            }
        }
        Ok(Value::Str(out))
    })
}

fn bin_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        let i = int_arg(a)?;
        Ok(Value::Str(if i < 0 {
            format!("-0b{:b}", i.unsigned_abs())
        } else {
            format!("0b{i:b}")
        }))
    })
}

fn chr_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        let i = int_arg(a)?;
        let c = u32::try_from(i)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| Error::Argument(format!("chr() arg {i} out of range")))?;
        Ok(Value::Str(c.to_string()))
    })
}

fn hash_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| Ok(Value::Int(hash_value(a)?)))
}

fn hash_value(value: &Value) -> Result<i64> {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    hash_into(value, &mut hasher)?;
    Ok(hasher.finish() as i64)
}

fn hash_into(value: &Value, hasher: &mut impl Hasher) -> Result<()> {
    match value {
        Value::None => 0u8.hash(hasher),
        // Numeric values that compare equal hash equal.
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => {
            let f = value.as_float().unwrap_or(0.0);
            1u8.hash(hasher);
            f.to_bits().hash(hasher);
        }
        Value::Str(s) => {
            2u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Tuple(items) => {
            3u8.hash(hasher);
            for item in items.iter() {
                hash_into(item, hasher)?;
            }
        }
        _ => return Err(Error::type_mismatch("hashable value", value.type_name())),
    }
    Ok(())
}

fn len_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        let len = match a {
            Value::Str(s) => s.chars().count(),
            _ => iterable_items(a)?.len(),
        };
        Ok(Value::Int(len as i64))
    })
}

fn max_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    extremum(stack, std::cmp::Ordering::is_gt)
}

fn min_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    extremum(stack, std::cmp::Ordering::is_lt)
}

/// `max`/`min` unpack the top iterable.
fn extremum(stack: &mut Stack, wins: impl Fn(std::cmp::Ordering) -> bool) -> Result<()> {
    unop(stack, |a| {
        let items = iterable_items(a)?;
        let mut items = items.into_iter();
        let mut best = items
            .next()
            .ok_or_else(|| Error::Argument("empty iterable".to_string()))?;
        for item in items {
            if wins(operators::compare(&item, &best)?) {
                best = item;
            }
        }
        Ok(best)
    })
}

fn repr_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| Ok(Value::Str(a.repr())))
}

fn sum_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        let mut total = Value::Int(0);
        for item in iterable_items(a)? {
            total = operators::add(&total, &item)?;
        }
        Ok(total)
    })
}

// ---------------------------------------------------------------------------
// Stack shufflers
// ---------------------------------------------------------------------------

fn drop_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.pop().map(|_| ())
}

fn drop2(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.pop()?;
    stack.pop().map(|_| ())
}

fn dup(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let top = stack.peek(0)?.clone();
    stack.push(top);
    Ok(())
}

fn swap(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.swap(0, 1)
}

fn over(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let under = stack.peek(1)?.clone();
    stack.push(under);
    Ok(())
}

fn nip(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let top = stack.pop()?;
    stack.poke(0, top)
}

fn tuck(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.require(2)?;
    let top = stack.peek(0)?.clone();
    stack.insert(2, top)
}

fn rollup(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.require(3)?;
    let c = stack.pop()?;
    let b = stack.pop()?;
    let a = stack.pop()?;
    stack.push(c);
    stack.push(a);
    stack.push(b);
    Ok(())
}

fn rolldown(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.require(3)?;
    let c = stack.pop()?;
    let b = stack.pop()?;
    let a = stack.pop()?;
    stack.push(b);
    stack.push(c);
    stack.push(a);
    Ok(())
}

fn rotate(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.swap(0, 2)
}

// ---------------------------------------------------------------------------
// Types and casting
// ---------------------------------------------------------------------------

fn cast_bool(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| Ok(Value::Bool(a.is_truthy())))
}

fn cast_int(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| match a {
        Value::Int(_) => Ok(a.clone()),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Error::Argument(format!("invalid literal for int: '{s}'"))),
        _ => Err(Error::type_mismatch("number or string", a.type_name())),
    })
}

fn cast_float(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| match a {
        Value::Float(_) => Ok(a.clone()),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Bool(b) => Ok(Value::Float(f64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Error::Argument(format!("invalid literal for float: '{s}'"))),
        _ => Err(Error::type_mismatch("number or string", a.type_name())),
    })
}

fn cast_str(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| Ok(Value::Str(a.to_string())))
}

fn set_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        let mut items: Vec<Value> = Vec::new();
        for item in iterable_items(a)? {
            if !items.contains(&item) {
                items.push(item);
            }
        }
        Ok(Value::Set(Rc::new(std::cell::RefCell::new(items))))
    })
}

fn tuple_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| Ok(Value::Tuple(Rc::new(iterable_items(a)?))))
}

/// Wraps the top element in a fresh single-element list.
fn list_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| Ok(Value::list(vec![a.clone()])))
}

fn list2(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.require(2)?;
    let b = stack.pop()?;
    let a = stack.pop()?;
    stack.push(Value::list(vec![a, b]));
    Ok(())
}

fn list3(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.require(3)?;
    let c = stack.pop()?;
    let b = stack.pop()?;
    let a = stack.pop()?;
    stack.push(Value::list(vec![a, b, c]));
    Ok(())
}

fn listn(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let n = int_arg(&stack.pop()?)?;
    let n = usize::try_from(n).map_err(|_| Error::Argument(format!("bad list size {n}")))?;
    stack.require(n)?;
    let mut items = Vec::with_capacity(n);
    for _ in 0..n {
        items.push(stack.pop()?);
    }
    items.reverse();
    stack.push(Value::list(items));
    Ok(())
}

// ---------------------------------------------------------------------------
// Printing and input
// ---------------------------------------------------------------------------

fn print_(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let value = stack.pop()?;
    vm.print(&value.to_string());
    Ok(())
}

fn println_(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let value = stack.pop()?;
    vm.print(&format!("{value}\n"));
    Ok(())
}

fn input_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| Error::Argument(format!("input failed: {e}")))?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    stack.push(Value::Str(line));
    Ok(())
}

fn print_stack(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    if stack.is_empty() {
        vm.print(" # (empty)\n");
        return Ok(());
    }
    vm.print(" # [type]     : [value]\n");
    for value in stack.items().iter().rev() {
        let rendered = value.to_string().replace('\n', &format!("\n{}", " ".repeat(16)));
        vm.print(&format!(" - {:10} : {}\n", value.type_name(), rendered));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sequence words
// ---------------------------------------------------------------------------

fn list_handle(value: &Value) -> Result<crate::value::ListHandle> {
    match value {
        Value::List(items) => Ok(items.clone()),
        other => Err(Error::type_mismatch("list", other.type_name())),
    }
}

fn append(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let value = stack.pop()?;
    let items = list_handle(stack.peek(0)?)?;
    items.borrow_mut().push(value);
    Ok(())
}

fn extend(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let value = stack.pop()?;
    let items = list_handle(stack.peek(0)?)?;
    items.borrow_mut().extend(iterable_items(&value)?);
    Ok(())
}

fn prepend(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let value = stack.pop()?;
    let items = list_handle(stack.peek(0)?)?;
    items.borrow_mut().insert(0, value);
    Ok(())
}

/// One to three integers out of a value that may itself be a bare int.
fn spec_ints(value: &Value, what: &str) -> Result<Vec<Option<i64>>> {
    let items = match value.to_items() {
        Some(items) => items,
        None => vec![value.clone()],
    };
    if items.is_empty() || items.len() > 3 {
        return Err(Error::Argument(format!(
            "{what} takes 1 to 3 integers, got {}",
            items.len()
        )));
    }
    items
        .iter()
        .map(|item| match item {
            Value::None => Ok(None),
            _ => int_arg(item).map(Some),
        })
        .collect()
}

fn range_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        let parts = spec_ints(a, "range")?;
        let parts: Vec<i64> = parts
            .into_iter()
            .map(|p| p.ok_or_else(|| Error::type_mismatch("int", "NoneType")))
            .collect::<Result<_>>()?;
        let (start, stop, step) = match parts[..] {
            [stop] => (0, stop, 1),
            [start, stop] => (start, stop, 1),
            [start, stop, step] => (start, stop, step),
            _ => unreachable!("spec_ints bounds the arity"),
        };
        if step == 0 {
            return Err(Error::Argument("range step cannot be zero".to_string()));
        }
        Ok(Value::Range { start, stop, step })
    })
}

fn slice_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    unop(stack, |a| {
        let parts = spec_ints(a, "slice")?;
        let (start, stop, step) = match parts[..] {
            [stop] => (None, stop, None),
            [start, stop] => (start, stop, None),
            [start, stop, step] => (start, stop, step),
            _ => unreachable!("spec_ints bounds the arity"),
        };
        Ok(Value::Slice { start, stop, step })
    })
}

/// Subscript: `( obj k -- obj obj[k] )`. The object stays put.
fn get_from(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let key = stack.pop()?;
    let obj = stack.peek(0)?.clone();
    let result = subscript(&obj, &key)?;
    stack.push(result);
    Ok(())
}

fn subscript(obj: &Value, key: &Value) -> Result<Value> {
    match (obj, key) {
        (Value::List(items), Value::Int(i)) => {
            let items = items.borrow();
            Ok(items[resolve_index(*i, items.len())?].clone())
        }
        (Value::Tuple(items), Value::Int(i)) => Ok(items[resolve_index(*i, items.len())?].clone()),
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(chars[resolve_index(*i, chars.len())?].to_string()))
        }
        (Value::List(items), Value::Slice { start, stop, step }) => {
            let items = items.borrow();
            let selected = resolve_slice(*start, *stop, *step, items.len())?
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(Value::list(selected))
        }
        (Value::Tuple(items), Value::Slice { start, stop, step }) => {
            let selected = resolve_slice(*start, *stop, *step, items.len())?
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(Value::Tuple(Rc::new(selected)))
        }
        (Value::Str(s), Value::Slice { start, stop, step }) => {
            let chars: Vec<char> = s.chars().collect();
            let selected: String = resolve_slice(*start, *stop, *step, chars.len())?
                .into_iter()
                .map(|i| chars[i])
                .collect();
            Ok(Value::Str(selected))
        }
        (Value::Map(pairs), key) => pairs
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::Argument(format!("key not found: {}", key.repr()))),
        _ => Err(Error::type_mismatch(
            "subscriptable object and index",
            format!("{} and {}", obj.type_name(), key.type_name()),
        )),
    }
}

/// In-place store: `( obj v k -- obj )`.
fn set_to(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let key = stack.pop()?;
    let value = stack.pop()?;
    let obj = stack.peek(0)?.clone();
    match (&obj, &key) {
        (Value::List(items), Value::Int(i)) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            items[resolve_index(*i, len)?] = value;
            Ok(())
        }
        (Value::List(items), Value::Slice { start, stop, step }) => {
            let replacement = iterable_items(&value)?;
            let mut items = items.borrow_mut();
            let len = items.len();
            let indices = resolve_slice(*start, *stop, *step, len)?;
            if step.unwrap_or(1) == 1 {
                let at = indices.first().copied().unwrap_or_else(|| {
                    // An empty step-1 selection still has an insertion point.
                    resolve_slice(*start, None, None, len)
                        .map(|ix| ix.first().copied().unwrap_or(len))
                        .unwrap_or(len)
                });
                let end = indices.last().map_or(at, |last| last + 1);
                items.splice(at..end, replacement);
                Ok(())
            } else if indices.len() == replacement.len() {
                for (i, v) in indices.into_iter().zip(replacement) {
                    items[i] = v;
                }
                Ok(())
            } else {
                Err(Error::Argument(format!(
                    "cannot assign {} values to an extended slice of size {}",
                    replacement.len(),
                    indices.len()
                )))
            }
        }
        (Value::Map(pairs), key) => {
            let mut pairs = pairs.borrow_mut();
            if let Some(pair) = pairs.iter_mut().find(|(k, _)| k == key) {
                pair.1 = value;
            } else {
                pairs.push((key.clone(), value));
            }
            Ok(())
        }
        _ => Err(Error::type_mismatch(
            "mutable object and index",
            format!("{} and {}", obj.type_name(), key.type_name()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Control words
// ---------------------------------------------------------------------------

fn error(_vm: &mut Vm, _stack: &mut Stack) -> Result<()> {
    Err(Error::Raised("Raised an explicit error.".to_string()))
}

fn assert_(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    if stack.pop()?.is_truthy() {
        Ok(())
    } else {
        Err(Error::Assertion)
    }
}

fn return_(_vm: &mut Vm, _stack: &mut Stack) -> Result<()> {
    Err(Error::WordReturn)
}

fn exit(_vm: &mut Vm, _stack: &mut Stack) -> Result<()> {
    Err(Error::Exit)
}

fn dump(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    stack.clear();
    Ok(())
}

// ---------------------------------------------------------------------------
// Documentation
// ---------------------------------------------------------------------------

fn help_(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    let Value::List(items) = &quote else {
        return Err(Error::Argument("help must take a quotation".to_string()));
    };
    let items = items.borrow();
    let Some(first) = items.first() else {
        return Err(Error::Argument("help passed an empty list".to_string()));
    };
    match first {
        Value::Callable(callable) => match callable.doc().filter(|doc| !doc.is_empty()) {
            Some(doc) => vm.print(&format!("{}\n", dedent(doc))),
            None => vm.print(&format!(
                "\"{}\" has no docstring available\n",
                callable.name()
            )),
        },
        other => vm.print(&format!(
            "type \"{}\" has no docstring available\n",
            other.type_name()
        )),
    }
    Ok(())
}

/// Strip the common leading whitespace from every non-empty line.
fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|line| if line.len() >= margin { &line[margin..] } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in TABLE.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} before {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn dedent_strips_common_margin() {
        assert_eq!(dedent("  a\n    b\n  c"), "a\n  b\nc");
        assert_eq!(dedent("( a b -- b a )"), "( a b -- b a )");
    }
}
