//! `@extend` behavior, including across modules and media scopes.

use std::rc::Rc;

use sass_eval::ast::{Stmt, Use, UseNamespace};
use sass_eval::importer::{ImportCache, Importer, MemoryImporter};
use sass_eval::{EvalOptions, Evaluator};

mod common;
use common::{Ctx, TestLogger};

fn compile(ctx: &Ctx, body: Vec<Stmt>) -> Result<String, String> {
    let mut evaluator = Evaluator::new(EvalOptions {
        logger: Some(Rc::new(TestLogger::default()) as Rc<dyn sass_eval::Logger>),
        ..EvalOptions::default()
    });
    match evaluator.run(&ctx.sheet(body)) {
        Ok(result) => result
            .to_css_string()
            .map_err(|e| e.message().to_owned()),
        Err(e) => Err(e.message().to_owned()),
    }
}

#[test]
fn extension_rewrites_later_compounds() {
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.style_rule(".a", vec![ctx.extend(".b")]),
            ctx.style_rule(".b:hover", vec![ctx.decl("color", ctx.ident("red"))]),
        ],
    )
    .unwrap();
    assert_eq!(css, ".a:hover, .b:hover {\n  color: red;\n}\n");
}

#[test]
fn unsatisfied_extend_errors() {
    let ctx = Ctx::new();
    let err = compile(
        &ctx,
        vec![ctx.style_rule(".a", vec![
            ctx.extend(".missing"),
            ctx.decl("color", ctx.ident("red")),
        ])],
    )
    .unwrap_err();
    assert_eq!(err, "The target selector was not found.");
}

#[test]
fn optional_extend_never_errors() {
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![ctx.style_rule(".a", vec![
            ctx.extend_optional(".missing"),
            ctx.decl("color", ctx.ident("red")),
        ])],
    )
    .unwrap();
    assert_eq!(css, ".a {\n  color: red;\n}\n");
}

#[test]
fn extend_is_scoped_to_its_media_context() {
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            // the extension lives inside @media screen
            ctx.media(
                "screen",
                vec![ctx.style_rule(".a", vec![
                    ctx.extend(".b"),
                    ctx.decl("margin", ctx.num(0.0)),
                ])],
            ),
            // same media context: extended
            ctx.media(
                "screen",
                vec![ctx.style_rule(".b", vec![ctx.decl("color", ctx.ident("red"))])],
            ),
            // different context: untouched
            ctx.style_rule(".b", vec![ctx.decl("color", ctx.ident("blue"))]),
        ],
    )
    .unwrap();

    assert!(
        css.contains("@media screen {\n  .a, .b {\n    color: red;\n  }\n}"),
        "extension missing in matching media context:\n{}",
        css
    );
    assert!(
        css.contains("\n.b {\n  color: blue;\n}"),
        "extension leaked across media contexts:\n{}",
        css
    );
}

#[test]
fn extension_in_root_applies_to_used_module() {
    let ctx = Ctx::new();
    let lib = ctx.sheet(vec![ctx.style_rule(
        ".b",
        vec![ctx.decl("color", ctx.ident("red"))],
    )]);
    let main = ctx.sheet(vec![
        Stmt::Use(Use {
            url: "lib".to_owned(),
            namespace: UseNamespace::Derived,
            configuration: Vec::new(),
            span: ctx.span,
        }),
        ctx.style_rule(".a", vec![ctx.extend(".b")]),
    ]);

    let mut importer = MemoryImporter::new();
    importer.insert("lib.scss", lib);
    let mut evaluator = Evaluator::new(EvalOptions {
        import_cache: Some(Rc::new(ImportCache::new(vec![
            Rc::new(importer) as Rc<dyn Importer>
        ]))),
        logger: Some(Rc::new(TestLogger::default()) as Rc<dyn sass_eval::Logger>),
        ..EvalOptions::default()
    });

    let css = evaluator.run(&main).unwrap().to_css_string().unwrap();
    assert_eq!(css, ".b, .a {\n  color: red;\n}\n");
}

#[test]
fn extension_satisfied_by_upstream_module_does_not_error() {
    let ctx = Ctx::new();
    let lib = ctx.sheet(vec![ctx.style_rule(
        ".b",
        vec![ctx.decl("color", ctx.ident("red"))],
    )]);
    let main = ctx.sheet(vec![
        Stmt::Use(Use {
            url: "lib".to_owned(),
            namespace: UseNamespace::Derived,
            configuration: Vec::new(),
            span: ctx.span,
        }),
        ctx.style_rule(".a", vec![ctx.extend(".b"), ctx.decl("margin", ctx.num(0.0))]),
    ]);

    let mut importer = MemoryImporter::new();
    importer.insert("lib.scss", lib);
    let mut evaluator = Evaluator::new(EvalOptions {
        import_cache: Some(Rc::new(ImportCache::new(vec![
            Rc::new(importer) as Rc<dyn Importer>
        ]))),
        logger: Some(Rc::new(TestLogger::default()) as Rc<dyn sass_eval::Logger>),
        ..EvalOptions::default()
    });

    assert!(evaluator.run(&main).is_ok());
}

#[test]
fn placeholder_rules_appear_only_through_extension() {
    let ctx = Ctx::new();
    let css = compile(
        &ctx,
        vec![
            ctx.style_rule("%base", vec![ctx.decl("color", ctx.ident("red"))]),
            ctx.style_rule(".a", vec![ctx.extend("%base")]),
        ],
    )
    .unwrap();
    assert_eq!(css, ".a {\n  color: red;\n}\n");
}
