//! End-to-end tests driving the machine the way a host would: run source,
//! inspect the operand stack and the printed output.

use bok::{Error, Limits, Machine, Value};
use pretty_assertions::assert_eq;

fn run(source: &str) -> Machine {
    let mut machine = Machine::new();
    machine.run_source(source).unwrap();
    machine
}

fn stack_of(source: &str) -> Vec<Value> {
    run(source).stack().to_vec()
}

fn output_of(source: &str) -> String {
    let mut machine = run(source);
    machine.take_output()
}

fn list(items: Vec<Value>) -> Value {
    Value::list(items)
}

fn ints(items: &[i64]) -> Value {
    Value::list(items.iter().copied().map(Value::Int).collect())
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

#[test]
fn test_numeric_literals() {
    assert_eq!(
        stack_of("1 -2 0x1f 0o17 0b101 2.5 1e3"),
        vec![
            Value::Int(1),
            Value::Int(-2),
            Value::Int(31),
            Value::Int(15),
            Value::Int(5),
            Value::Float(2.5),
            Value::Float(1000.0),
        ]
    );
}

#[test]
fn test_string_literals() {
    assert_eq!(
        stack_of(r#"'a' "b" 'c\nd' r'e\nf'"#),
        vec![
            Value::from("a"),
            Value::from("b"),
            Value::from("c\nd"),
            Value::from("e\\nf"),
        ]
    );
}

#[test]
fn test_bool_and_none_literals() {
    assert_eq!(
        stack_of("True False None"),
        vec![Value::Bool(true), Value::Bool(false), Value::None]
    );
}

#[test]
fn test_list_literals_nest() {
    assert_eq!(
        stack_of("[1 [2 3] 'x']"),
        vec![list(vec![
            Value::Int(1),
            ints(&[2, 3]),
            Value::from("x"),
        ])]
    );
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(stack_of("1 # push one\n2"), vec![Value::Int(1), Value::Int(2)]);
}

// ---------------------------------------------------------------------------
// Arithmetic and comparison
// ---------------------------------------------------------------------------

#[test]
fn test_basic_arithmetic() {
    assert_eq!(output_of("1 1 + println"), "2\n");
    assert_eq!(stack_of("10 3 -"), vec![Value::Int(7)]);
    assert_eq!(stack_of("4 5 *"), vec![Value::Int(20)]);
    assert_eq!(stack_of("1 2 /"), vec![Value::Float(0.5)]);
    assert_eq!(stack_of("7 2 //"), vec![Value::Int(3)]);
    assert_eq!(stack_of("-7 2 //"), vec![Value::Int(-4)]);
    assert_eq!(stack_of("7 2 %"), vec![Value::Int(1)]);
    assert_eq!(stack_of("2 8 **"), vec![Value::Int(256)]);
    assert_eq!(stack_of("5 ++"), vec![Value::Int(6)]);
    assert_eq!(stack_of("5 --"), vec![Value::Int(4)]);
    assert_eq!(stack_of("3 negate"), vec![Value::Int(-3)]);
}

#[test]
fn test_mixed_numeric_types_promote() {
    assert_eq!(stack_of("1 2.0 +"), vec![Value::Float(3.0)]);
    assert_eq!(output_of("2.0 2 * println"), "4.0\n");
}

#[test]
fn test_plus_concatenates() {
    assert_eq!(output_of("[1 2] [3] + println"), "[1, 2, 3]\n");
    assert_eq!(stack_of("'ab' 'cd' +"), vec![Value::from("abcd")]);
}

#[test]
fn test_mul_repeats() {
    assert_eq!(output_of("[1] 3 * println"), "[1, 1, 1]\n");
    assert_eq!(stack_of("'ab' 3 *"), vec![Value::from("ababab")]);
}

#[test]
fn test_comparisons() {
    assert_eq!(stack_of("1 2 <"), vec![Value::Bool(true)]);
    assert_eq!(stack_of("2 2 <="), vec![Value::Bool(true)]);
    assert_eq!(stack_of("1 2 >"), vec![Value::Bool(false)]);
    assert_eq!(stack_of("2 2 >="), vec![Value::Bool(true)]);
    assert_eq!(stack_of("1 1.0 =="), vec![Value::Bool(true)]);
    assert_eq!(stack_of("1 '1' =="), vec![Value::Bool(false)]);
    assert_eq!(stack_of("1 2 !="), vec![Value::Bool(true)]);
    assert_eq!(stack_of("'a' 'b' <"), vec![Value::Bool(true)]);
    assert_eq!(stack_of("[1 2] [1 3] <"), vec![Value::Bool(true)]);
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(stack_of("6 3 &"), vec![Value::Int(2)]);
    assert_eq!(stack_of("6 3 |"), vec![Value::Int(7)]);
    assert_eq!(stack_of("6 3 ^"), vec![Value::Int(5)]);
    assert_eq!(stack_of("1 3 <<"), vec![Value::Int(8)]);
    assert_eq!(stack_of("8 2 >>"), vec![Value::Int(2)]);
    assert_eq!(stack_of("5 ~"), vec![Value::Int(-6)]);
}

#[test]
fn test_logical_operators_preserve_values() {
    assert_eq!(stack_of("0 5 or"), vec![Value::Int(5)]);
    assert_eq!(stack_of("3 5 or"), vec![Value::Int(3)]);
    assert_eq!(stack_of("0 5 and"), vec![Value::Int(0)]);
    assert_eq!(stack_of("3 5 and"), vec![Value::Int(5)]);
    assert_eq!(stack_of("1 0 xor"), vec![Value::Bool(true)]);
    assert_eq!(stack_of("1 1 xor"), vec![Value::Bool(false)]);
    assert_eq!(stack_of("0 not"), vec![Value::Bool(true)]);
}

// ---------------------------------------------------------------------------
// Stack shufflers
// ---------------------------------------------------------------------------

#[test]
fn test_dup_drop_is_identity() {
    assert_eq!(stack_of("1 dup drop"), vec![Value::Int(1)]);
}

#[test]
fn test_swap_swap_is_identity() {
    assert_eq!(stack_of("1 2 swap swap"), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_shufflers() {
    assert_eq!(stack_of("1 2 swap"), vec![Value::Int(2), Value::Int(1)]);
    assert_eq!(stack_of("1 2 over"), vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
    assert_eq!(stack_of("1 2 nip"), vec![Value::Int(2)]);
    assert_eq!(stack_of("1 2 tuck"), vec![Value::Int(2), Value::Int(1), Value::Int(2)]);
    assert_eq!(stack_of("1 2 3 rollup"), vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
    assert_eq!(stack_of("1 2 3 rolldown"), vec![Value::Int(2), Value::Int(3), Value::Int(1)]);
    assert_eq!(stack_of("1 2 3 rotate"), vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
    assert_eq!(stack_of("1 2 drop2"), Vec::<Value>::new());
    assert_eq!(stack_of("1 nop"), vec![Value::Int(1)]);
}

#[test]
fn test_list_builders() {
    assert_eq!(stack_of("1 2 list2"), vec![ints(&[1, 2])]);
    assert_eq!(stack_of("1 2 3 list3"), vec![ints(&[1, 2, 3])]);
    assert_eq!(stack_of("1 2 3 2 listn"), vec![Value::Int(1), ints(&[2, 3])]);
    assert_eq!(stack_of("5 list"), vec![ints(&[5])]);
}

// ---------------------------------------------------------------------------
// Casts and scalars
// ---------------------------------------------------------------------------

#[test]
fn test_casts() {
    assert_eq!(stack_of("2.9 int"), vec![Value::Int(2)]);
    assert_eq!(stack_of("'42' int"), vec![Value::Int(42)]);
    assert_eq!(stack_of("True int"), vec![Value::Int(1)]);
    assert_eq!(stack_of("1 float"), vec![Value::Float(1.0)]);
    assert_eq!(stack_of("'2.5' float"), vec![Value::Float(2.5)]);
    assert_eq!(stack_of("0 bool"), vec![Value::Bool(false)]);
    assert_eq!(stack_of("'x' bool"), vec![Value::Bool(true)]);
    assert_eq!(stack_of("42 str"), vec![Value::from("42")]);
}

#[test]
fn test_set_and_tuple_casts() {
    assert_eq!(output_of("[1 2 2 3] set println"), "{1, 2, 3}\n");
    assert_eq!(output_of("[1 2] tuple println"), "(1, 2)\n");
    assert_eq!(stack_of("[1 2 2] set len"), vec![Value::Int(2)]);
}

#[test]
fn test_scalar_words() {
    assert_eq!(stack_of("-5 abs"), vec![Value::Int(5)]);
    assert_eq!(stack_of("[1 0 1] all"), vec![Value::Bool(false)]);
    assert_eq!(stack_of("[0 0 1] any"), vec![Value::Bool(true)]);
    assert_eq!(stack_of("5 bin"), vec![Value::from("0b101")]);
    assert_eq!(stack_of("-5 bin"), vec![Value::from("-0b101")]);
    assert_eq!(stack_of("65 chr"), vec![Value::from("A")]);
    assert_eq!(stack_of("'abc' len"), vec![Value::Int(3)]);
    assert_eq!(stack_of("[3 1 2] max"), vec![Value::Int(3)]);
    assert_eq!(stack_of("[3 1 2] min"), vec![Value::Int(1)]);
    assert_eq!(stack_of("[1 2 3] sum"), vec![Value::Int(6)]);
    assert_eq!(stack_of("'hi' repr"), vec![Value::from("'hi'")]);
}

#[test]
fn test_hash_is_stable_within_a_process() {
    let values = stack_of("'key' hash 'key' hash 1 hash 1.0 hash");
    assert_eq!(values[0], values[1]);
    assert_eq!(values[2], values[3]);
}

#[test]
fn test_ascii_escapes_non_ascii() {
    assert_eq!(stack_of("'h\u{e9}' ascii"), vec![Value::from("'h\\u00e9'")]);
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

#[test]
fn test_append_extend_prepend_mutate_in_place() {
    assert_eq!(stack_of("[1] 2 append"), vec![ints(&[1, 2])]);
    assert_eq!(stack_of("[1] [2 3] extend"), vec![ints(&[1, 2, 3])]);
    assert_eq!(stack_of("[2] 1 prepend"), vec![ints(&[1, 2])]);
}

#[test]
fn test_list_mutation_is_shared() {
    // dup copies the handle, not the storage.
    let values = stack_of("[] dup 5 append");
    assert_eq!(values, vec![ints(&[5]), ints(&[5])]);

    // A list literal inside a word body is one shared object across calls.
    assert_eq!(
        stack_of("(f [] 1 append) f f drop"),
        vec![ints(&[1, 1])]
    );
}

#[test]
fn test_range_forms() {
    assert_eq!(output_of("[2 5] range [] map println"), "[2, 3, 4]\n");
    assert_eq!(output_of("[1 10 3] range [] map println"), "[1, 4, 7]\n");
    assert_eq!(output_of("5 range [] map println"), "[0, 1, 2, 3, 4]\n");
    assert_eq!(stack_of("[2 5] range len"), vec![Value::Int(3)]);
}

#[test]
fn test_get_leaves_the_object() {
    assert_eq!(stack_of("[1 2 3] 1 get"), vec![ints(&[1, 2, 3]), Value::Int(2)]);
    assert_eq!(stack_of("[1 2 3] -1 get"), vec![ints(&[1, 2, 3]), Value::Int(3)]);
    assert_eq!(stack_of("'abc' 0 get"), vec![Value::from("abc"), Value::from("a")]);
}

#[test]
fn test_slice_subscript() {
    assert_eq!(
        stack_of("[1 2 3 4] [1 3] slice get"),
        vec![ints(&[1, 2, 3, 4]), ints(&[2, 3])]
    );
    assert_eq!(
        stack_of("'abcd' [None None -1] slice get"),
        vec![Value::from("abcd"), Value::from("dcba")]
    );
}

#[test]
fn test_assign_mutates_in_place() {
    assert_eq!(stack_of("[1 2 3] 9 1 assign"), vec![ints(&[1, 9, 3])]);
    assert_eq!(
        stack_of("[1 2 3 4] [9 9] [1 3] slice assign"),
        vec![ints(&[1, 9, 9, 4])]
    );
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

#[test]
fn test_print_and_println() {
    assert_eq!(output_of("1 print 2 print"), "12");
    assert_eq!(output_of("None println True println"), "None\nTrue\n");
    assert_eq!(output_of("2.5 println"), "2.5\n");
    assert_eq!(output_of("4.0 println"), "4.0\n");
    assert_eq!(output_of("['a' 1] println"), "['a', 1]\n");
}

#[test]
fn test_stack_word_pretty_prints() {
    assert_eq!(output_of("stack"), " # (empty)\n");
    assert_eq!(
        output_of("1 'a' stack"),
        " # [type]     : [value]\n - str        : a\n - int        : 1\n"
    );
}

#[test]
fn test_dump_clears_the_stack() {
    assert_eq!(stack_of("1 2 3 dump"), Vec::<Value>::new());
}

// ---------------------------------------------------------------------------
// Word definitions, variables, scoping
// ---------------------------------------------------------------------------

#[test]
fn test_word_definition_with_variable() {
    assert_eq!(output_of("(square :x x x *) 4 square println"), "16\n");
}

#[test]
fn test_word_definitions_persist_across_runs() {
    let mut machine = Machine::new();
    machine.run_source("(double 2 *)").unwrap();
    machine.run_source("21 double println").unwrap();
    assert_eq!(machine.take_output(), "42\n");
}

#[test]
fn test_variables_clear_when_the_word_finishes() {
    assert_eq!(
        stack_of("(w :x x) 5 w w.x"),
        vec![Value::Int(5), Value::None]
    );
}

#[test]
fn test_return_leaves_the_word_early_and_clears_variables() {
    assert_eq!(stack_of("(f 1 return 2) f"), vec![Value::Int(1)]);
    assert_eq!(
        stack_of("(f :x x return) 7 f f.x"),
        vec![Value::Int(7), Value::None]
    );
}

#[test]
fn test_return_outside_a_word_is_an_error() {
    let mut machine = Machine::new();
    assert_eq!(machine.run_source("return"), Err(Error::WordReturn));
}

#[test]
fn test_nested_words_are_scoped() {
    assert_eq!(
        output_of("(outer (inner 10 +) 1 inner inner) outer println"),
        "21\n"
    );
    // The nested word is not reachable bare from the top level.
    let mut machine = Machine::new();
    machine.run_source("(outer (inner 1))").unwrap();
    assert!(matches!(
        machine.run_source("inner"),
        Err(Error::Name(name)) if name == "inner"
    ));
    // But it is reachable by its qualified name.
    machine.run_source("outer.inner").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(1)]);
}

#[test]
fn test_linrec_gauss_sum() {
    assert_eq!(
        output_of("(gauss [0 ==] [] [dup 1 -] [+] linrec) 4 gauss println"),
        "10\n"
    );
}

#[test]
fn test_mutual_recursion() {
    let source = "
        (iseven [0 ==] [drop True] [1 - isodd] if)
        (isodd [0 ==] [drop False] [1 - iseven] if)
        3 iseven
    ";
    assert_eq!(stack_of(source), vec![Value::Bool(false)]);
}

#[test]
fn test_variable_slots_are_shared_across_activations() {
    // The inner activation writes the same slot and clears it on the way
    // out, so the outer read sees None. Deliberate semantics.
    assert_eq!(
        stack_of("(r :n n [2 <] [2 r] [] if n) 1 r"),
        vec![Value::Int(1), Value::Int(2), Value::Int(2), Value::None]
    );
}

#[test]
fn test_docstrings_attach_to_words() {
    assert_eq!(output_of("(sq d'( x -- x*x )' dup *) [sq] help"), "( x -- x*x )\n");
    // A plain string in first position is a literal, not a docstring.
    assert_eq!(output_of("(greet 'hi' println) greet"), "hi\n");
}

// ---------------------------------------------------------------------------
// Quotations and combinators
// ---------------------------------------------------------------------------

#[test]
fn test_quotation_eval_matches_inline_execution() {
    assert_eq!(stack_of("[1 2 +] exec"), stack_of("1 2 +"));
    assert_eq!(stack_of("[5] eval"), vec![Value::Int(5)]);
}

#[test]
fn test_map() {
    assert_eq!(output_of("[1 2 3] [dup *] map println"), "[1, 4, 9]\n");
    assert_eq!(output_of("'ab' [] map println"), "['a', 'b']\n");
}

#[test]
fn test_filter() {
    assert_eq!(output_of("[1 2 3 4] [2 % 0 ==] filter println"), "[2, 4]\n");
}

#[test]
fn test_fold() {
    assert_eq!(output_of("[1 2 3 4] 0 [+] fold println"), "10\n");
    assert_eq!(output_of("[1 2 3] 1 [*] fold println"), "6\n");
}

#[test]
fn test_dip_and_keep() {
    assert_eq!(stack_of("1 2 [3 +] dip"), vec![Value::Int(4), Value::Int(2)]);
    assert_eq!(stack_of("5 [1 +] keep"), vec![Value::Int(6), Value::Int(5)]);
}

#[test]
fn test_bi_tri_cleave() {
    assert_eq!(stack_of("2 [1 +] [2 *] bi"), vec![Value::Int(3), Value::Int(4)]);
    assert_eq!(
        stack_of("2 [1 +] [2 *] [3 -] tri"),
        vec![Value::Int(3), Value::Int(4), Value::Int(-1)]
    );
    assert_eq!(
        stack_of("1 2 [3 +] [4 *] cleave"),
        vec![Value::Int(4), Value::Int(8)]
    );
}

#[test]
fn test_while_counts_down() {
    assert_eq!(stack_of("5 [0 >] [1 -] while"), vec![Value::Int(0)]);
}

#[test]
fn test_foreach() {
    assert_eq!(output_of("[10 20 30] [println] foreach"), "10\n20\n30\n");
}

#[test]
fn test_repeat() {
    assert_eq!(stack_of("3 [1] repeat"), vec![Value::Int(1), Value::Int(1), Value::Int(1)]);
    assert_eq!(stack_of("0 [1] repeat"), Vec::<Value>::new());
}

#[test]
fn test_choice_pushes_without_calling() {
    assert_eq!(stack_of("True 1 2 choice"), vec![Value::Int(1)]);
    assert_eq!(stack_of("False 1 2 choice"), vec![Value::Int(2)]);
}

#[test]
fn test_if_when_unless() {
    assert_eq!(
        stack_of("5 [0 >] ['pos'] ['neg'] if"),
        vec![Value::Int(5), Value::from("pos")]
    );
    assert_eq!(
        stack_of("-5 [0 >] ['pos'] ['neg'] if"),
        vec![Value::Int(-5), Value::from("neg")]
    );
    assert_eq!(stack_of("5 [0 >] [10 +] when"), vec![Value::Int(15)]);
    assert_eq!(stack_of("0 [0 >] [10 +] when"), vec![Value::Int(0)]);
    assert_eq!(stack_of("0 [0 >] [1 +] unless"), vec![Value::Int(1)]);
    assert_eq!(stack_of("5 [0 >] [1 +] unless"), vec![Value::Int(5)]);
}

#[test]
fn test_cond_runs_the_first_truthy_branch() {
    let source = "[[[0 >] ['pos']] [[0 <] ['neg']] [[True] ['zero']]] cond";
    assert_eq!(
        stack_of(&format!("5 {source}")),
        vec![Value::Int(5), Value::from("pos")]
    );
    assert_eq!(
        stack_of(&format!("-5 {source}")),
        vec![Value::Int(-5), Value::from("neg")]
    );
    assert_eq!(
        stack_of(&format!("0 {source}")),
        vec![Value::Int(0), Value::from("zero")]
    );
}

#[test]
fn test_linrec_factorial() {
    assert_eq!(
        stack_of("5 [dup 1 <=] [] [dup 1 -] [*] linrec"),
        vec![Value::Int(120)]
    );
    assert_eq!(
        stack_of("1 [dup 1 <=] [] [dup 1 -] [*] linrec"),
        vec![Value::Int(1)]
    );
}

#[test]
fn test_predicates_do_not_disturb_the_main_stack() {
    // The while condition runs on a copy of the top; the 0 > comparison
    // never consumes the real operand.
    assert_eq!(
        stack_of("1 5 [0 >] [1 -] while drop"),
        vec![Value::Int(1)]
    );
}

#[test]
fn test_combinator_rejects_non_quotation() {
    let mut machine = Machine::new();
    assert!(matches!(
        machine.run_source("1 2 map"),
        Err(Error::Argument(_))
    ));
    assert!(matches!(machine.run_source("5 exec"), Err(Error::Argument(_))));
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

#[test]
fn test_help_prints_builtin_docstrings() {
    assert_eq!(output_of("[swap] help"), "( a b -- b a )\n");
    assert!(output_of("[map] help").contains("( [a ..] [q] -- [q(a) ..] )"));
}

#[test]
fn test_help_reports_missing_docstrings() {
    assert_eq!(
        output_of("(f 1) [f] help"),
        "\"f\" has no docstring available\n"
    );
    assert_eq!(
        output_of("[5] help"),
        "type \"int\" has no docstring available\n"
    );
}

#[test]
fn test_help_rejects_bad_input() {
    let mut machine = Machine::new();
    assert!(matches!(machine.run_source("5 help"), Err(Error::Argument(_))));
    assert!(matches!(machine.run_source("[] help"), Err(Error::Argument(_))));
}

// ---------------------------------------------------------------------------
// Errors and recovery
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_name_is_a_name_error() {
    let mut machine = Machine::new();
    assert_eq!(
        machine.run_source("ghost"),
        Err(Error::Name("ghost".to_string()))
    );
}

#[test]
fn test_stack_underflow() {
    let mut machine = Machine::new();
    assert_eq!(machine.run_source("+"), Err(Error::StackUnderflow));
    assert_eq!(machine.run_source("1 swap"), Err(Error::StackUnderflow));
}

#[test]
fn test_type_mismatch() {
    let mut machine = Machine::new();
    assert!(matches!(machine.run_source("1 'a' -"), Err(Error::Type { .. })));
    assert!(matches!(machine.run_source("'a' ~"), Err(Error::Type { .. })));
}

#[test]
fn test_division_by_zero() {
    let mut machine = Machine::new();
    assert_eq!(machine.run_source("1 0 /"), Err(Error::DivisionByZero));
    assert_eq!(machine.run_source("1 0 //"), Err(Error::DivisionByZero));
}

#[test]
fn test_assert_and_error_words() {
    let mut machine = Machine::new();
    machine.run_source("True assert").unwrap();
    assert_eq!(machine.run_source("False assert"), Err(Error::Assertion));
    assert!(matches!(machine.run_source("error"), Err(Error::Raised(_))));
}

#[test]
fn test_parse_errors_carry_positions() {
    let mut machine = Machine::new();
    let err = machine.run_source("1\n  )").unwrap_err();
    assert_eq!(
        err,
        Error::Parse {
            line: 2,
            column: 3,
            message: "token )".to_string()
        }
    );
    assert!(machine.run_source("[1 2").is_err());
}

#[test]
fn test_runtime_errors_clear_the_stack_and_machine_stays_usable() {
    let mut machine = Machine::new();
    machine.run_source("1 2 3").unwrap();
    assert!(machine.run_source("ghost").is_err());
    assert_eq!(machine.stack(), &[] as &[Value]);
    machine.run_source("7 println").unwrap();
    assert_eq!(machine.take_output(), "7\n");
}

#[test]
fn test_parse_errors_leave_the_stack_alone() {
    let mut machine = Machine::new();
    machine.run_source("1 2").unwrap();
    assert!(machine.run_source("[oops").is_err());
    assert_eq!(machine.stack(), &[Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_exit_preserves_the_stack() {
    let mut machine = Machine::new();
    assert_eq!(machine.run_source("1 exit"), Err(Error::Exit));
    assert_eq!(machine.stack(), &[Value::Int(1)]);
}

#[test]
fn test_step_limit_stops_runaway_programs() {
    let mut machine = Machine::new();
    machine.limit(Limits {
        max_steps: Some(10_000),
    });
    assert_eq!(
        machine.run_source("[True] [] while"),
        Err(Error::StepLimitExceeded(10_000))
    );
    // The limit is per run; the machine recovers.
    machine.run_source("1 1 +").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(2)]);
}

// ---------------------------------------------------------------------------
// Host bridge
// ---------------------------------------------------------------------------

#[test]
fn test_host_fn_applies_to_iterable_top() {
    let mut machine = Machine::new();
    machine.register_fn("total", |args, _| {
        let mut sum = 0;
        for arg in args {
            sum += arg.as_int().unwrap_or(0);
        }
        Ok(Value::Int(sum))
    });
    machine.run_source("[1 2 3] total").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(6)]);
}

#[test]
fn test_host_fn_applies_to_scalar_top() {
    let mut machine = Machine::new();
    machine.register_fn("double", |args, _| {
        Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
    });
    machine.run_source("21 double").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(21 * 2)]);
}

#[test]
fn test_host_fn_uses_collected_arguments() {
    let mut machine = Machine::new();
    machine.register_fn("pack", |args, _| Ok(Value::list(args.to_vec())));
    machine.run_source("1 >* 2 >* 3 >* pack").unwrap();
    assert_eq!(
        machine.stack(),
        &[Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])]
    );
}

#[test]
fn test_host_call_clears_argument_buffers() {
    let mut machine = Machine::new();
    machine.register_fn("count_args", |args, _| Ok(Value::Int(args.len() as i64)));
    machine.run_source("1 >* 2 >* count_args count_args").unwrap();
    // Second call sees empty buffers and applies to the top (the 2 from the
    // first call's result).
    assert_eq!(machine.stack(), &[Value::Int(1)]);
}

#[test]
fn test_host_fn_receives_kwargs() {
    let mut machine = Machine::new();
    machine.register_fn("mkopts", |_, _| {
        Ok(Value::Map(std::rc::Rc::new(std::cell::RefCell::new(vec![(
            Value::from("scale"),
            Value::Int(3),
        )]))))
    });
    machine.register_fn("apply_scale", |args, kwargs| {
        let x = args[0].as_int().unwrap_or(0);
        let scale = kwargs
            .iter()
            .find(|(k, _)| k == &Value::from("scale"))
            .and_then(|(_, v)| v.as_int())
            .unwrap_or(1);
        Ok(Value::Int(x * scale))
    });
    machine
        .run_source("None mkopts >** 7 >* apply_scale")
        .unwrap();
    assert_eq!(machine.stack(), &[Value::Int(21)]);
}

#[test]
fn test_array_backend_words() {
    let mut machine = Machine::new();
    machine.register_array_fn("linalg.norm", |args, _| {
        let mut total = 0.0;
        for arg in args {
            let x = arg.as_float().unwrap_or(0.0);
            total += x * x;
        }
        Ok(Value::Float(total.sqrt()))
    });
    machine.run_source("[3 4] @linalg.norm").unwrap();
    assert_eq!(machine.stack(), &[Value::Float(5.0)]);
}

#[test]
fn test_unregistered_array_path_is_a_name_error() {
    let mut machine = Machine::new();
    assert!(matches!(
        machine.run_source("[1] @missing.word"),
        Err(Error::Name(name)) if name == "@missing.word"
    ));
}

// ---------------------------------------------------------------------------
// Host facade details
// ---------------------------------------------------------------------------

#[test]
fn test_parse_then_run_separately() {
    let mut machine = Machine::new();
    machine.parse("1 2 +").unwrap();
    assert_eq!(machine.stack(), &[] as &[Value]);
    machine.run().unwrap();
    assert_eq!(machine.stack(), &[Value::Int(3)]);
}

#[test]
fn test_definitions_happen_at_parse_time() {
    let mut machine = Machine::new();
    machine.parse("(triple 3 *)").unwrap();
    // Never ran, but the definition is live.
    machine.run_source("5 triple").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(15)]);
}

#[test]
fn test_push_pop_from_the_host() {
    let mut machine = Machine::new();
    machine.push(Value::Int(4));
    machine.run_source("dup *").unwrap();
    assert_eq!(machine.pop().unwrap(), Value::Int(16));
}

#[test]
fn test_word_names_include_definitions() {
    let mut machine = Machine::new();
    machine.run_source("(myword 1)").unwrap();
    let names = machine.word_names();
    assert!(names.iter().any(|n| n == "myword"));
    assert!(names.iter().any(|n| n == "swap"));
}

#[test]
fn test_blank_input_runs_nothing() {
    let mut machine = Machine::new();
    machine.run_source("1").unwrap();
    machine.run_source("   \n# just a comment\n").unwrap();
    assert_eq!(machine.stack(), &[Value::Int(1)]);
}
