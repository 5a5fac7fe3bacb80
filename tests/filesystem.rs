//! Loading through the filesystem importer.

use std::rc::Rc;

use sass_eval::ast::{Import, ImportArg, Stmt};
use sass_eval::importer::{FilesystemImporter, ImportCache, Importer, ParseFn};
use sass_eval::{EvalOptions, Evaluator};

mod common;
use common::{Ctx, TestLogger};

#[test]
fn imports_resolve_partials_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("_lib.scss"), ".lib { color: red }").unwrap();

    let ctx = Ctx::new();
    // the host parser is out of scope; this stand-in returns a fixed tree
    let lib_sheet = ctx.sheet(vec![ctx.style_rule(
        ".lib",
        vec![ctx.decl("color", ctx.ident("red"))],
    )]);
    let parse: ParseFn = Rc::new(move |_text, _url| Ok(lib_sheet.clone()));

    let importer = FilesystemImporter::new(dir.path(), parse);
    let mut evaluator = Evaluator::new(EvalOptions {
        import_cache: Some(Rc::new(ImportCache::new(vec![
            Rc::new(importer) as Rc<dyn Importer>
        ]))),
        logger: Some(Rc::new(TestLogger::default()) as Rc<dyn sass_eval::Logger>),
        ..EvalOptions::default()
    });

    let main = ctx.sheet(vec![Stmt::Import(Import {
        imports: vec![ImportArg::Dynamic {
            url: "lib".to_owned(),
            span: ctx.span,
        }],
        span: ctx.span,
    })]);

    let result = evaluator.run(&main).unwrap();
    assert_eq!(result.to_css_string().unwrap(), ".lib {\n  color: red;\n}\n");

    // file URLs are recorded as filesystem paths
    assert!(result
        .included_files
        .iter()
        .any(|path| path.ends_with("_lib.scss")));
}

#[test]
fn package_urls_are_rejected_with_a_specific_error() {
    let ctx = Ctx::new();
    let parse: ParseFn = {
        let empty = ctx.sheet(vec![]);
        Rc::new(move |_text, _url| Ok(empty.clone()))
    };
    let importer = FilesystemImporter::new(".", parse);
    let mut evaluator = Evaluator::new(EvalOptions {
        import_cache: Some(Rc::new(ImportCache::new(vec![
            Rc::new(importer) as Rc<dyn Importer>
        ]))),
        logger: Some(Rc::new(TestLogger::default()) as Rc<dyn sass_eval::Logger>),
        ..EvalOptions::default()
    });

    let main = ctx.sheet(vec![Stmt::Import(Import {
        imports: vec![ImportArg::Dynamic {
            url: "package:foo/bar".to_owned(),
            span: ctx.span,
        }],
        span: ctx.span,
    })]);

    let err = evaluator.run(&main).unwrap_err();
    assert_eq!(err.message(), "\"package:\" URLs aren't supported.");
}
