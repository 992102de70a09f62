use super::*;
use crate::language::{
    diagnostics::Diagnostics, lexer::tokenize, parser::parse, resolve::resolve_program,
};

fn resolved(source: &str) -> Program {
    let tokens = tokenize(source).expect("tokenize");
    let mut program = parse(&tokens).expect("parse");
    let mut diags = Diagnostics::new();
    resolve_program(&mut program, &mut diags);
    assert!(!diags.has_errors(), "{:?}", diags.entries());
    program
}

fn emit_with(source: &str, table: &TokenTable) -> String {
    let program = resolved(source);
    let mut out = Emitter::new(Vec::new(), table);
    emit_program(&program, &mut out).expect("emit");
    String::from_utf8(out.finish().expect("finish")).expect("utf8")
}

fn emit(source: &str) -> String {
    emit_with(source, &TokenTable::oz())
}

#[test]
fn blocks_without_declarations_are_elided() {
    assert_eq!(emit("{Show 1}"), "{Show 1}\n");
}

#[test]
fn declarations_open_exactly_one_local() {
    assert_eq!(
        emit("val x = 1 + 2 {Show x}"),
        "local\n  X = 1 + 2\nin\n  {Show X}\nend\n"
    );
}

#[test]
fn cells_are_created_assigned_and_read() {
    assert_eq!(
        emit("var n = 0 var s in n = n + 1 s = 2 {Show n}"),
        "local\n  N = {NewCell 0}\n  S = {NewCell _}\nin\n  N := @N + 1\n  S := 2\n  {Show @N}\nend\n"
    );
}

#[test]
fn compound_assignment_reads_the_cell() {
    assert_eq!(
        emit("var total = 0 var name = \"a\" in total += 2 name += \"b\""),
        "local\n  Total = {NewCell 0}\n  Name = {NewCell \"a\"}\nin\n  Total := (@Total + 2)\n  Name := {Append @Name \"b\"}\nend\n"
    );
}

#[test]
fn case_clauses_are_led_by_of_then_separators() {
    let text = emit(
        "val l = [1 2]\ncase l of nil then {Show 0} of [x] then {Show x} of h|t then {Show h} else {Show 9} end",
    );
    assert_eq!(
        text,
        "local\n  L = [1 2]\nin\n  case L of nil then\n    {Show 0}\n  [] [X] then\n    {Show X}\n  [] H|T then\n    {Show H}\n  else\n    {Show 9}\n  end\nend\n"
    );
    let of = text.find(" of ").expect("of");
    let separators: Vec<_> = text.match_indices("[] ").map(|(at, _)| at).collect();
    assert_eq!(separators.len(), 2);
    assert!(separators.iter().all(|at| *at > of));
    let default = text.find("  else\n").expect("else");
    assert!(separators.iter().all(|at| *at < default));
}

#[test]
fn anonymous_function_keeps_placeholder_and_recurses_by_name() {
    assert_eq!(
        emit("val fact = fun {$ n} if n == 0 then 1 else n * {fact n - 1} end end\n{Show {fact 5}}"),
        "local\n  Fact = fun {$ N}\n    if N == 0 then\n      1\n    else\n      N * {Fact (N - 1)}\n    end\n  end\nin\n  {Show {Fact 5}}\nend\n"
    );
}

#[test]
fn classes_keep_attribute_and_method_case() {
    let source = "class Counter\n  attr count:0\n  meth init(start) count = start end\n  meth inc(by) count += by end\n  meth get() => count end\nend\nval c = new Counter.init(5)\n{Show c.get()}";
    assert_eq!(
        emit(source),
        "local\n  class Counter\n    attr count:0\n    meth init(Start)\n      count := Start\n    end\n    meth inc(By)\n      count := (@count + By)\n    end\n    meth get($)\n      @count\n    end\n  end\n  C = {New Counter init(5)}\nin\n  {Show {C get($)}}\nend\n"
    );
}

#[test]
fn super_calls_name_the_base_class() {
    let source = "declare\nclass Base meth init() skip end end\nclass Derived extends Base meth init() super(Base).init() end end";
    assert_eq!(
        emit(source),
        "declare\n  class Base\n    meth init\n      skip\n    end\n  end\n  class Derived from Base\n    meth init\n      Base, init\n    end\n  end\n"
    );
}

#[test]
fn functors_export_with_labels() {
    let source = "declare functor M import System define export add fun {Add X Y} X + Y end export val version = 1 end";
    assert_eq!(
        emit(source),
        "declare\n  functor M\n  import System\n  export add:Add version:Version\n  define\n    fun {Add X Y}\n      X + Y\n    end\n    Version = 1\n  end\n"
    );
}

#[test]
fn division_follows_operand_type() {
    assert_eq!(
        emit("val a = 7 / 2 val b = 7.0 / 2.0"),
        "local\n  A = 7 div 2\n  B = 7.0 / 2.0\nin\n  skip\nend\n"
    );
}

#[test]
fn discarded_values_are_bound_to_wildcard() {
    assert_eq!(
        emit("fun {Twice X} X * 2 end {Twice 3}"),
        "local\n  fun {Twice X}\n    X * 2\n  end\nin\n  _ = {Twice 3}\nend\n"
    );
}

#[test]
fn string_addition_appends() {
    assert_eq!(
        emit("val s = \"a\" + \"b\""),
        "local\n  S = {Append \"a\" \"b\"}\nin\n  skip\nend\n"
    );
}

#[test]
fn loops_bind_an_upper_case_iterator() {
    assert_eq!(
        emit("for i in 1..3 do {Show i} end"),
        "for I in 1..3 do\n  {Show I}\nend\n"
    );
}

#[test]
fn spellings_come_from_the_table() {
    let table = TokenTable::oz().with(HostToken::CellAssign, "<-");
    assert_eq!(
        emit_with("var n = 0 in n = 1", &table),
        "local\n  N = {NewCell 0}\nin\n  N <- 1\nend\n"
    );
}

#[test]
fn missing_spelling_fails_the_emission() {
    let program = resolved("{Show 1}");
    let table = TokenTable::from_pairs([]);
    let mut out = Emitter::new(Vec::new(), &table);
    let err = emit_program(&program, &mut out).expect_err("no spellings");
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}
