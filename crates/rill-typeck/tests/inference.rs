//! Inference over whole programs: literals, locals, branches, loops, and
//! method calls with the per-signature cache.

use rill_common::span::Span;
use rill_parser::ast::{Expr, ExprKind, NodeId, Program};
use rill_typeck::{InferConfig, Module, Ty, TypeError};

// ── Helpers ────────────────────────────────────────────────────────────

fn parse(src: &str) -> Program {
    let parse = rill_parser::parse(src);
    assert!(parse.ok(), "parse errors: {:?}", parse.errors());
    parse.into_program()
}

fn check(src: &str) -> Module {
    rill_typeck::infer(&parse(src)).unwrap_or_else(|e| panic!("type error: {e}\nsource:\n{src}"))
}

fn check_err(src: &str) -> TypeError {
    match rill_typeck::infer(&parse(src)) {
        Ok(module) => panic!("expected a type error, got result {}", module.result_type()),
        Err(err) => err,
    }
}

fn result(src: &str) -> String {
    check(src).result_type().to_string()
}

/// `name: type` for each binding site in source order, then the result type.
fn dump_bindings(src: &str) -> String {
    fn site(module: &Module, id: NodeId, name: &str, out: &mut Vec<String>) {
        let ty = module
            .type_of(id)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "<untyped>".to_string());
        out.push(format!("{name}: {ty}"));
    }

    fn walk(expr: &Expr, module: &Module, out: &mut Vec<String>) {
        match &expr.kind {
            ExprKind::Assign(a) => {
                site(module, a.target.id, &a.target.name, out);
                walk(&a.value, module, out);
            }
            ExprKind::Call(c) => {
                for arg in &c.args {
                    walk(arg, module, out);
                }
                if let Some(block) = &c.block {
                    for p in &block.params {
                        site(module, p.id, &p.name, out);
                    }
                    for s in &block.body {
                        walk(s, module, out);
                    }
                }
            }
            ExprKind::Def(d) => {
                for p in &d.params {
                    site(module, p.id, &p.name, out);
                }
                for s in &d.body {
                    walk(s, module, out);
                }
            }
            ExprKind::Yield(y) => y.args.iter().for_each(|a| walk(a, module, out)),
            ExprKind::If(i) => {
                walk(&i.cond, module, out);
                i.then_body.iter().for_each(|s| walk(s, module, out));
                if let Some(body) = &i.else_body {
                    body.iter().for_each(|s| walk(s, module, out));
                }
            }
            ExprKind::While(w) => {
                walk(&w.cond, module, out);
                w.body.iter().for_each(|s| walk(s, module, out));
            }
            ExprKind::Literal(_) | ExprKind::Var(_) => {}
        }
    }
    let program = parse(src);
    let module = rill_typeck::infer(&program).unwrap();
    let mut out = Vec::new();
    for stmt in &program.stmts {
        walk(stmt, &module, &mut out);
    }
    out.push(format!("result: {}", module.result_type()));
    out.join("\n")
}

// ── Literals and locals ────────────────────────────────────────────────

#[test]
fn test_literal_types() {
    let cases = [
        ("1", "Int"),
        ("2.5", "Float"),
        ("'a'", "Char"),
        ("\"hi\"", "String"),
        ("true", "Bool"),
        ("false", "Bool"),
        ("nil", "Nil"),
        ("", "Nil"),
    ];
    for (src, expected) in cases {
        assert_eq!(result(src), expected, "source: {src:?}");
    }
}

#[test]
fn test_sequential_assignment_narrows() {
    assert_eq!(result("x = 1\nx = 'a'\nx"), "Char");
}

#[test]
fn test_assignment_annotates_target_and_node() {
    let program = parse("x = 2.5");
    let module = rill_typeck::infer(&program).unwrap();
    let stmt = program.last().unwrap();
    let assign = stmt.as_assign().unwrap();
    assert_eq!(module.type_of(stmt.id), Some(&Ty::float()));
    assert_eq!(module.type_of(assign.target.id), Some(&Ty::float()));
    assert_eq!(module.type_of(assign.value.id), Some(&Ty::float()));
}

#[test]
fn test_self_assignment_is_unbound() {
    let err = check_err("x = x");
    match &err {
        TypeError::UnboundVariable { name, method, .. } => {
            assert_eq!(name, "x");
            assert_eq!(method, &None);
        }
        other => panic!("expected UnboundVariable, got {other:?}"),
    }
    assert_eq!(err.span(), Span::new(4, 5));
}

#[test]
fn test_unbound_variable_from_external_ast() {
    let program = Program {
        stmts: vec![Expr {
            id: NodeId(0),
            span: Span::new(0, 1),
            kind: ExprKind::Var("q".to_string()),
        }],
    };
    let err = rill_typeck::infer(&program).unwrap_err();
    assert_eq!(
        err,
        TypeError::UnboundVariable {
            name: "q".to_string(),
            node: NodeId(0),
            span: Span::new(0, 1),
            method: None,
        }
    );
}

#[test]
fn test_json_ast_input() {
    let src = "def id(v)\n  v\nend\nid('c')";
    let json = serde_json::to_string(&parse(src)).unwrap();
    let program: Program = serde_json::from_str(&json).unwrap();
    let module = rill_typeck::infer(&program).unwrap();
    assert_eq!(module.result_type(), &Ty::char());
}

// ── Branches ───────────────────────────────────────────────────────────

#[test]
fn test_if_merges_branch_bindings() {
    assert_eq!(result("x = 1\nif true\n  x = 'a'\nend\nx"), "Char | Int");
    assert_eq!(
        result("x = 1\nif true\n  x = 'a'\nelse\n  x = \"s\"\nend\nx"),
        "Char | String"
    );
}

#[test]
fn test_if_type_joins_branches() {
    assert_eq!(result("if true\n  1\nelse\n  2.5\nend"), "Float | Int");
    assert_eq!(result("if true\n  1\nend"), "Int | Nil");
    assert_eq!(result("if true; 'c'; else; 'd'; end"), "Char");
}

#[test]
fn test_branch_only_declaration_merges_with_nil() {
    assert_eq!(result("if true\n  z = 1\nend\nz"), "Int | Nil");
}

#[test]
fn test_elsif_chain() {
    let src = "x = 1
if true
  x = 'a'
elsif false
  x = \"s\"
end
x";
    assert_eq!(result(src), "Char | Int | String");
}

// ── Loops ──────────────────────────────────────────────────────────────

#[test]
fn test_while_is_nil_and_merges() {
    assert_eq!(result("while false\nend"), "Nil");
    assert_eq!(result("x = 1\nwhile true\n  x = 'a'\nend\nx"), "Char | Int");
}

#[test]
fn test_while_reaches_fixpoint() {
    let src = "a = 1
b = 'c'
while true
  b = a
  a = 2.5
end
b";
    assert_eq!(result(src), "Char | Float | Int");
}

// ── Methods ────────────────────────────────────────────────────────────

#[test]
fn test_def_is_nil() {
    assert_eq!(result("def f\nend"), "Nil");
    assert_eq!(result("def f\nend\nf"), "Nil");
}

#[test]
fn test_cache_per_signature() {
    let src = "def id(x)\n  x\nend\nid(1)\nid('a')\nid(2)";
    let module = check(src);
    assert_eq!(module.result_type(), &Ty::int());

    let info = module.method("id").unwrap();
    let instances: Vec<String> = info
        .instances()
        .iter()
        .map(|i| format!("{} -> {}", i.signature, i.returns))
        .collect();
    insta::assert_snapshot!(instances.join("\n"), @r"
    (Int) -> Int
    (Char) -> Char
    ");
}

#[test]
fn test_param_annotations_join_across_signatures() {
    let out = dump_bindings("def id(x)\n  x\nend\nid(1)\nid('a')");
    insta::assert_snapshot!(out, @r"
    x: Char | Int
    result: Char
    ");
}

#[test]
fn test_binding_dump_through_yielding_method() {
    let out = dump_bindings(
        "def twice(v)
  yield v
  yield 'c'
end
acc = nil
twice(1) do |item|
  acc = item
end
acc",
    );
    insta::assert_snapshot!(out, @r"
    v: Int
    acc: Nil
    item: Char | Int
    acc: Char | Int
    result: Char | Int | Nil
    ");
}

#[test]
fn test_methods_may_call_later_definitions() {
    assert_eq!(result("def a\n  b\nend\ndef b\n  1.5\nend\na"), "Float");
}

#[test]
fn test_redefinition_replaces_method() {
    let src = "def f\n  1\nend\na = f\ndef f\n  'c'\nend\nb = f\nb";
    let module = check(src);
    assert_eq!(module.result_type(), &Ty::char());
    let info = module.method("f").unwrap();
    assert_eq!(info.instances().len(), 1);
    assert_eq!(info.instances()[0].returns, Ty::char());
}

#[test]
fn test_method_body_does_not_see_caller_locals() {
    let err = check_err("x = 1\ndef m\n  x\nend\nm");
    match err {
        TypeError::UnresolvedMethod { name, method, .. } => {
            assert_eq!(name, "x");
            assert_eq!(method.as_deref(), Some("m"));
        }
        other => panic!("expected UnresolvedMethod, got {other:?}"),
    }
}

#[test]
fn test_unresolved_method() {
    let err = check_err("x = 1\nfoo(1)");
    assert!(matches!(err, TypeError::UnresolvedMethod { ref name, .. } if name == "foo"));
    assert_eq!(err.span(), Span::new(6, 9));
}

#[test]
fn test_arity_mismatch() {
    let err = check_err("def f(a)\n  a\nend\nf(1, 2)");
    match err {
        TypeError::ArityMismatch {
            name,
            expected,
            found,
            ..
        } => {
            assert_eq!(name, "f");
            assert_eq!(expected, 1);
            assert_eq!(found, 2);
        }
        other => panic!("expected ArityMismatch, got {other:?}"),
    }
}

// ── Recursion ──────────────────────────────────────────────────────────

#[test]
fn test_recursion_without_base_case_terminates() {
    assert_eq!(result("def f(x)\n  f(x)\nend\nf(1)"), "Nil");
}

#[test]
fn test_recursion_with_base_case_uses_placeholder() {
    let src = "def count(n)
  if n
    1
  else
    count(n)
  end
end
count(true)";
    assert_eq!(result(src), "Int | Nil");
}

#[test]
fn test_mutual_recursion_terminates() {
    let src = "def ping(n)\n  pong(n)\nend\ndef pong(n)\n  ping('c')\nend\nping(1)";
    assert_eq!(result(src), "Nil");
}

#[test]
fn test_recursion_limit() {
    let program = parse("def a\n  b\nend\ndef b\n  1\nend\na");
    let config = InferConfig::default().with_max_depth(1);
    let err = rill_typeck::infer_with_config(&program, &config).unwrap_err();
    match err {
        TypeError::RecursionLimitExceeded {
            name,
            limit,
            method,
            ..
        } => {
            assert_eq!(name, "b");
            assert_eq!(limit, 1);
            assert_eq!(method.as_deref(), Some("a"));
        }
        other => panic!("expected RecursionLimitExceeded, got {other:?}"),
    }

    let config = InferConfig::default().with_max_depth(2);
    let module = rill_typeck::infer_with_config(&program, &config).unwrap();
    assert_eq!(module.result_type(), &Ty::int());
}

#[test]
fn test_module_report_serializes() {
    let module = check("def id(x)\n  x\nend\nid(1)");
    let json = serde_json::to_value(&module).unwrap();
    assert_eq!(json["result"], "Int");
    assert_eq!(json["methods"][0]["name"], "id");
    assert_eq!(json["methods"][0]["instances"][0]["signature"][0], "Int");
    assert_eq!(json["methods"][0]["instances"][0]["returns"], "Int");
}
