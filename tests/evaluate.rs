//! End-to-end evaluation: build an input tree, run the evaluator, compare
//! the serialized CSS.

use std::rc::Rc;

use sass_eval::ast::{BinaryOp, Stmt};
use sass_eval::{EvalOptions, Evaluator};

mod common;
use common::{Ctx, TestLogger};

fn compile(ctx: &Ctx, body: Vec<Stmt>) -> String {
    let mut evaluator = Evaluator::new(EvalOptions {
        logger: Some(Rc::new(TestLogger::default()) as Rc<dyn sass_eval::Logger>),
        ..EvalOptions::default()
    });
    evaluator
        .run(&ctx.sheet(body))
        .unwrap()
        .to_css_string()
        .unwrap()
}

fn compile_err(ctx: &Ctx, body: Vec<Stmt>) -> String {
    let mut evaluator = Evaluator::new(EvalOptions {
        logger: Some(Rc::new(TestLogger::default()) as Rc<dyn sass_eval::Logger>),
        ..EvalOptions::default()
    });
    match evaluator.run(&ctx.sheet(body)) {
        Ok(result) => match result.to_css_string() {
            Ok(css) => panic!("expected an error, got:\n{}", css),
            Err(e) => e.message().to_owned(),
        },
        Err(e) => e.message().to_owned(),
    }
}

#[test]
fn variable_in_arithmetic() {
    // $a: 1; .x { width: $a + 2px }
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.var("a", ctx.num(1.0)),
            ctx.style_rule(
                ".x",
                vec![ctx.decl(
                    "width",
                    ctx.bin(BinaryOp::Plus, ctx.variable("a"), ctx.unit(2.0, "px")),
                )],
            ),
        ],
    );
    assert_eq!(css, ".x {\n  width: 3px;\n}\n");
}

#[test]
fn mixin_include() {
    // @mixin m($c) { color: $c } .x { @include m(red) }
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.mixin("m", &["c"], vec![ctx.decl("color", ctx.variable("c"))]),
            ctx.style_rule(".x", vec![ctx.include("m", vec![ctx.ident("red")])]),
        ],
    );
    assert_eq!(css, ".x {\n  color: red;\n}\n");
}

#[test]
fn parent_selector_nesting() {
    // .a { &:hover { color: red } }
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![ctx.style_rule(
            ".a",
            vec![ctx.style_rule("&:hover", vec![ctx.decl("color", ctx.ident("red"))])],
        )],
    );
    assert_eq!(css, ".a:hover {\n  color: red;\n}\n");
}

#[test]
fn extend_combines_selectors() {
    // .a { @extend .b } .b { color: red }
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.style_rule(".a", vec![ctx.extend(".b")]),
            ctx.style_rule(".b", vec![ctx.decl("color", ctx.ident("red"))]),
        ],
    );
    assert_eq!(css, ".a, .b {\n  color: red;\n}\n");
}

#[test]
fn nested_media_merges_queries() {
    // @media screen { .a { @media (min-width: 1px) { color: red } } }
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![ctx.media(
            "screen",
            vec![ctx.style_rule(
                ".a",
                vec![ctx.media(
                    "(min-width: 1px)",
                    vec![ctx.decl("color", ctx.ident("red"))],
                )],
            )],
        )],
    );
    assert_eq!(
        css,
        "@media screen and (min-width: 1px) {\n  .a {\n    color: red;\n  }\n}\n"
    );
}

#[test]
fn function_with_return() {
    // @function f() { @return 1 } .x { width: f() + 2 }
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.function("f", &[], vec![ctx.ret(ctx.num(1.0))]),
            ctx.style_rule(
                ".x",
                vec![ctx.decl(
                    "width",
                    ctx.bin(BinaryOp::Plus, ctx.call("f", vec![]), ctx.num(2.0)),
                )],
            ),
        ],
    );
    assert_eq!(css, ".x {\n  width: 3;\n}\n");
}

#[test]
fn disjoint_media_is_dropped() {
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![ctx.media(
            "screen",
            vec![ctx.media("print", vec![
                ctx.style_rule(".a", vec![ctx.decl("color", ctx.ident("red"))]),
            ])],
        )],
    );
    assert_eq!(css, "");
}

#[test]
fn if_branches_and_scoping() {
    // $x: 1; @if ... { $x: 2 } @else { $x: 3 } — assignment escapes
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.var("x", ctx.num(1.0)),
            ctx.if_else(
                ctx.bin(BinaryOp::LessThan, ctx.num(1.0), ctx.num(2.0)),
                vec![ctx.var("x", ctx.num(2.0))],
                vec![ctx.var("x", ctx.num(3.0))],
            ),
            ctx.style_rule(".a", vec![ctx.decl("width", ctx.variable("x"))]),
        ],
    );
    assert_eq!(css, ".a {\n  width: 2;\n}\n");
}

#[test]
fn each_destructures_with_null_padding() {
    use sass_eval::ast::Each;
    use sass_eval::value::ListSeparator;

    let ctx = Ctx::new();
    let pairs = ctx.list(
        vec![
            ctx.list(vec![ctx.ident("a"), ctx.num(1.0)], ListSeparator::Space),
            ctx.list(vec![ctx.ident("b")], ListSeparator::Space),
        ],
        ListSeparator::Comma,
    );
    let css = compile(
        &ctx,
        vec![Stmt::Each(Each {
            variables: vec!["name".to_owned(), "size".to_owned()],
            list: pairs,
            body: vec![ctx.style_rule(
                ".x",
                vec![
                    ctx.decl("grid-area", ctx.variable("name")),
                    ctx.decl("z-index", ctx.variable("size")),
                ],
            )],
            span: ctx.span,
        })],
    );
    // the second element has no size; null declarations are omitted
    assert_eq!(
        css,
        ".x {\n  grid-area: a;\n  z-index: 1;\n}\n\n.x {\n  grid-area: b;\n}\n"
    );
}

#[test]
fn for_loop_inclusive_and_exclusive() {
    use sass_eval::ast::For;

    let ctx = Ctx::new();
    let body = |ctx: &Ctx| {
        vec![ctx.style_rule(".x", vec![ctx.decl("z-index", ctx.variable("i"))])]
    };

    let css = compile(
        &ctx,
        vec![Stmt::For(For {
            variable: "i".to_owned(),
            from: ctx.num(1.0),
            to: ctx.num(3.0),
            exclusive: true,
            body: body(&ctx),
            span: ctx.span,
        })],
    );
    assert_eq!(css, ".x {\n  z-index: 1;\n}\n\n.x {\n  z-index: 2;\n}\n");

    // from == to, exclusive: zero iterations
    let css = compile(
        &ctx,
        vec![Stmt::For(For {
            variable: "i".to_owned(),
            from: ctx.num(2.0),
            to: ctx.num(2.0),
            exclusive: true,
            body: body(&ctx),
            span: ctx.span,
        })],
    );
    assert_eq!(css, "");
}

#[test]
fn for_rejects_non_integer_bounds() {
    use sass_eval::ast::For;

    let ctx = Ctx::new();
    let message = compile_err(
        &ctx,
        vec![Stmt::For(For {
            variable: "i".to_owned(),
            from: ctx.num(1.5),
            to: ctx.num(3.0),
            exclusive: false,
            body: vec![],
            span: ctx.span,
        })],
    );
    assert_eq!(message, "1.5 is not an int.");
}

#[test]
fn content_block_is_invoked() {
    // @mixin wrap { .inner { @content } } @include wrap { color: red }
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.mixin(
                "wrap",
                &[],
                vec![ctx.style_rule(".inner", vec![ctx.content()])],
            ),
            ctx.include_with_content("wrap", vec![], vec![ctx.decl("color", ctx.ident("red"))]),
        ],
    );
    assert_eq!(css, ".inner {\n  color: red;\n}\n");
}

#[test]
fn include_without_content_block_is_silent() {
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.mixin(
                "wrap",
                &[],
                vec![ctx.style_rule(".inner", vec![
                    ctx.content(),
                    ctx.decl("margin", ctx.num(0.0)),
                ])],
            ),
            ctx.include("wrap", vec![]),
        ],
    );
    assert_eq!(css, ".inner {\n  margin: 0;\n}\n");
}

#[test]
fn nested_declarations_combine_names() {
    // .x { font: 10px { weight: bold } }
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![ctx.style_rule(
            ".x",
            vec![ctx.nested_decl(
                "font",
                Some(ctx.unit(10.0, "px")),
                vec![ctx.decl("weight", ctx.ident("bold"))],
            )],
        )],
    );
    assert_eq!(css, ".x {\n  font: 10px;\n  font-weight: bold;\n}\n");
}

#[test]
fn null_declarations_are_omitted() {
    use sass_eval::ast::Expr;

    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![ctx.style_rule(
            ".x",
            vec![
                ctx.decl("color", Expr::Null { span: ctx.span }),
                ctx.decl("width", ctx.num(1.0)),
            ],
        )],
    );
    assert_eq!(css, ".x {\n  width: 1;\n}\n");
}

#[test]
fn custom_property_may_not_be_empty() {
    let ctx = Ctx::new();
    let message = compile_err(
        &ctx,
        vec![ctx.style_rule(".x", vec![ctx.decl("--empty", ctx.ident(""))])],
    );
    assert_eq!(message, "Custom property values may not be empty.");
}

#[test]
fn undefined_variable_is_an_error() {
    let ctx = Ctx::new();
    let message = compile_err(
        &ctx,
        vec![ctx.style_rule(".x", vec![ctx.decl("width", ctx.variable("missing"))])],
    );
    assert_eq!(message, "Undefined variable.");
}

#[test]
fn undefined_mixin_is_an_error() {
    let ctx = Ctx::new();
    let message = compile_err(&ctx, vec![ctx.include("missing", vec![])]);
    assert_eq!(message, "Undefined mixin.");
}

#[test]
fn function_must_return() {
    let ctx = Ctx::new();
    let message = compile_err(
        &ctx,
        vec![
            ctx.function("f", &[], vec![]),
            ctx.style_rule(".x", vec![ctx.decl("width", ctx.call("f", vec![]))]),
        ],
    );
    assert_eq!(message, "Function finished without @return.");
}

#[test]
fn plain_css_call_rejects_keywords() {
    let ctx = Ctx::new();
    let message = compile_err(
        &ctx,
        vec![ctx.style_rule(
            ".x",
            vec![ctx.decl(
                "background",
                ctx.call_named("unknown-function", vec![("a", ctx.num(1.0))]),
            )],
        )],
    );
    assert_eq!(message, "Plain CSS functions don't support keyword arguments.");
}

#[test]
fn plain_css_call_serializes() {
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![ctx.style_rule(
            ".x",
            vec![ctx.decl(
                "background",
                ctx.call("some-function", vec![ctx.quoted("a"), ctx.num(1.0)]),
            )],
        )],
    );
    assert_eq!(css, ".x {\n  background: some-function(\"a\", 1);\n}\n");
}

#[test]
fn lazy_if_function_skips_untaken_branch() {
    let ctx = Ctx::new();
    // the untaken branch would raise: it references an undefined variable
    let css = compile(
        &ctx,
        vec![ctx.style_rule(
            ".x",
            vec![ctx.decl(
                "width",
                ctx.call(
                    "if",
                    vec![
                        ctx.bin(BinaryOp::Equals, ctx.num(1.0), ctx.num(1.0)),
                        ctx.num(10.0),
                        ctx.variable("missing"),
                    ],
                ),
            )],
        )],
    );
    assert_eq!(css, ".x {\n  width: 10;\n}\n");
}

#[test]
fn at_root_escapes_style_rules() {
    use sass_eval::ast::AtRoot;

    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![ctx.style_rule(
            ".outer",
            vec![
                ctx.decl("color", ctx.ident("blue")),
                Stmt::AtRoot(AtRoot {
                    query: None,
                    body: vec![ctx.style_rule(".top", vec![
                        ctx.decl("color", ctx.ident("red")),
                    ])],
                    span: ctx.span,
                }),
            ],
        )],
    );
    assert_eq!(
        css,
        ".outer {\n  color: blue;\n}\n.top {\n  color: red;\n}\n"
    );
}

#[test]
fn keyframes_blocks() {
    use sass_eval::ast::AtRule;
    use sass_eval::ast::Interpolation;

    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![Stmt::AtRule(AtRule {
            name: Interpolation::plain("keyframes", ctx.span),
            value: Some(Interpolation::plain("spin", ctx.span)),
            body: Some(vec![
                ctx.style_rule("from", vec![ctx.decl("opacity", ctx.num(0.0))]),
                ctx.style_rule("to", vec![ctx.decl("opacity", ctx.num(1.0))]),
            ]),
            span: ctx.span,
        })],
    );
    assert_eq!(
        css,
        "@keyframes spin {\n  from {\n    opacity: 0;\n  }\n  to {\n    opacity: 1;\n  }\n}\n"
    );
}

#[test]
fn warn_and_debug_reach_the_logger() {
    let ctx = Ctx::new();
    let logger = Rc::new(TestLogger::default());
    let mut evaluator = Evaluator::new(EvalOptions {
        logger: Some(Rc::clone(&logger) as Rc<dyn sass_eval::Logger>),
        ..EvalOptions::default()
    });

    evaluator
        .run(&ctx.sheet(vec![
            Stmt::Warn {
                value: ctx.quoted("careful"),
                span: ctx.span,
            },
            Stmt::Debug {
                value: ctx.num(42.0),
                span: ctx.span,
            },
        ]))
        .unwrap();

    assert_eq!(logger.warnings.borrow().as_slice(), ["careful"]);
    assert_eq!(logger.debugs.borrow().as_slice(), ["42"]);
}

#[test]
fn error_rule_aborts_with_message() {
    let ctx = Ctx::new();
    let message = compile_err(
        &ctx,
        vec![Stmt::Error {
            value: ctx.quoted("boom"),
            span: ctx.span,
        }],
    );
    assert_eq!(message, "\"boom\"");
}

#[test]
fn declarations_require_a_rule_context() {
    let ctx = Ctx::new();
    let message = compile_err(&ctx, vec![ctx.decl("color", ctx.ident("red"))]);
    assert_eq!(message, "Declarations may only be used within style rules.");
}

#[test]
fn empty_rules_are_invisible() {
    let ctx = Ctx::new();
    let css = compile(&ctx, vec![ctx.style_rule(".empty", vec![])]);
    assert_eq!(css, "");
}
