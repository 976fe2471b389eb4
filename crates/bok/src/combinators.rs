//! Higher-order control-flow words.
//!
//! A combinator consumes one or more quotations from the stack and executes
//! them in a specific pattern through the VM's two primitives: `call_quote`
//! (run a quotation against a stack) and `apply_to_top` (run a predicate
//! quotation against a one-element sub-stack holding a copy of the current
//! top, without touching the main stack).

use crate::error::{Error, Result};
use crate::stack::Stack;
use crate::value::Value;
use crate::vm::Vm;

fn items_of(value: &Value) -> Result<Vec<Value>> {
    value
        .to_items()
        .ok_or_else(|| Error::Argument(format!("expected an iterable, got {}", value.type_name())))
}

/// `eval`/`exec`: call the quotation at the top.
pub(crate) fn exec_(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    vm.call_quote(&quote, stack)
}

/// Each element is evaluated on a fresh single-element sub-stack; the result
/// list replaces the iterable in place.
pub(crate) fn map(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    let items = items_of(stack.peek(0)?)?;
    let mut results = Vec::with_capacity(items.len());
    for value in items {
        let mut sub = Stack::seeded(vec![value]);
        vm.call_quote(&quote, &mut sub)?;
        results.push(sub.pop()?);
    }
    stack.poke(0, Value::list(results))
}

/// Keep the elements whose predicate residue is truthy.
pub(crate) fn filter(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    let items = items_of(&stack.pop()?)?;
    let mut kept = Vec::new();
    for value in items {
        let mut sub = Stack::seeded(vec![value.clone()]);
        vm.call_quote(&quote, &mut sub)?;
        if sub.pop()?.is_truthy() {
            kept.push(value);
        }
    }
    stack.push(Value::list(kept));
    Ok(())
}

/// The accumulator lives on the main stack: push the seed, then push and
/// combine each element.
pub(crate) fn fold(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    let initial = stack.pop()?;
    let items = items_of(&stack.pop()?)?;
    stack.push(initial);
    for value in items {
        stack.push(value);
        vm.call_quote(&quote, stack)?;
    }
    Ok(())
}

/// Run the quotation underneath the top element.
pub(crate) fn dip(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    let value = stack.pop()?;
    vm.call_quote(&quote, stack)?;
    stack.push(value);
    Ok(())
}

/// Run the quotation with the element on top, then push the element again.
pub(crate) fn keep(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    let value = stack.peek(0)?.clone();
    vm.call_quote(&quote, stack)?;
    stack.push(value);
    Ok(())
}

/// Apply two quotations each to a fresh copy of the element.
pub(crate) fn bi(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let q2 = stack.pop()?;
    let q1 = stack.pop()?;
    let value = stack.pop()?;
    stack.push(value.clone());
    vm.call_quote(&q1, stack)?;
    stack.push(value);
    vm.call_quote(&q2, stack)
}

/// Three-way `bi`.
pub(crate) fn tri(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let q3 = stack.pop()?;
    let q2 = stack.pop()?;
    let q1 = stack.pop()?;
    let value = stack.pop()?;
    stack.push(value.clone());
    vm.call_quote(&q1, stack)?;
    stack.push(value.clone());
    vm.call_quote(&q2, stack)?;
    stack.push(value);
    vm.call_quote(&q3, stack)
}

/// Pair the two values with the two quotations.
pub(crate) fn cleave(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let q2 = stack.pop()?;
    let q1 = stack.pop()?;
    let v2 = stack.pop()?;
    let v1 = stack.pop()?;
    stack.push(v1);
    vm.call_quote(&q1, stack)?;
    stack.push(v2);
    vm.call_quote(&q2, stack)
}

/// Tail-expressed linear recursion: count else-passes until the condition's
/// top-copy turns truthy, run the true branch once, then unwind with the
/// post quotation once per counted pass.
pub(crate) fn linrec(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let post_q = stack.pop()?;
    let else_q = stack.pop()?;
    let true_q = stack.pop()?;
    let cond_q = stack.pop()?;
    let mut passes = 0usize;
    loop {
        if vm.apply_to_top(&cond_q, stack)?.is_truthy() {
            vm.call_quote(&true_q, stack)?;
            break;
        }
        vm.call_quote(&else_q, stack)?;
        passes += 1;
    }
    for _ in 0..passes {
        vm.call_quote(&post_q, stack)?;
    }
    Ok(())
}

/// Run the body while the stop condition's top-copy stays truthy.
pub(crate) fn while_(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let body_q = stack.pop()?;
    let stop_q = stack.pop()?;
    while vm.apply_to_top(&stop_q, stack)?.is_truthy() {
        vm.call_quote(&body_q, stack)?;
    }
    Ok(())
}

/// Push each element and run the quotation.
pub(crate) fn foreach(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    let items = items_of(&stack.pop()?)?;
    for value in items {
        stack.push(value);
        vm.call_quote(&quote, stack)?;
    }
    Ok(())
}

pub(crate) fn repeat(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let quote = stack.pop()?;
    let n = stack.pop()?;
    let n = n
        .as_int()
        .ok_or_else(|| Error::type_mismatch("int", n.type_name()))?;
    for _ in 0..n.max(0) {
        vm.call_quote(&quote, stack)?;
    }
    Ok(())
}

/// Push one of two values depending on the condition. No quotations are
/// called.
pub(crate) fn choice(_vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let false_value = stack.pop()?;
    let true_value = stack.pop()?;
    let condition = stack.pop()?;
    stack.push(if condition.is_truthy() {
        true_value
    } else {
        false_value
    });
    Ok(())
}

pub(crate) fn if_(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let false_clause = stack.pop()?;
    let true_clause = stack.pop()?;
    let cond_clause = stack.pop()?;
    if vm.apply_to_top(&cond_clause, stack)?.is_truthy() {
        vm.call_quote(&true_clause, stack)
    } else {
        vm.call_quote(&false_clause, stack)
    }
}

pub(crate) fn when(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let true_clause = stack.pop()?;
    let cond_clause = stack.pop()?;
    if vm.apply_to_top(&cond_clause, stack)?.is_truthy() {
        vm.call_quote(&true_clause, stack)?;
    }
    Ok(())
}

pub(crate) fn unless(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let false_clause = stack.pop()?;
    let cond_clause = stack.pop()?;
    if !vm.apply_to_top(&cond_clause, stack)?.is_truthy() {
        vm.call_quote(&false_clause, stack)?;
    }
    Ok(())
}

/// Run the first expression whose predicate's top-copy is truthy.
pub(crate) fn cond(vm: &mut Vm, stack: &mut Stack) -> Result<()> {
    let pairs = stack.pop()?;
    for pair in items_of(&pairs)? {
        let entry = items_of(&pair)?;
        let [pred, expr] = entry.as_slice() else {
            return Err(Error::Argument(format!(
                "cond takes predicate/expression pairs, got {} elements",
                entry.len()
            )));
        };
        if vm.apply_to_top(pred, stack)?.is_truthy() {
            vm.call_quote(expr, stack)?;
            break;
        }
    }
    Ok(())
}
