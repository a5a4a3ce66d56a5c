use std::path::{Path, PathBuf};

use sr_core::meta::TypeSource;
use sr_core::{GenError, SourcePos};
use sr_emit::typeexpr::parse_type;
use sr_emit::{FieldResolver, GenContext, Template, TypeResolver, type_id};
use sr_parser::parse_file;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Module `abc` with four model packages and a logic file importing them.
fn fixture() -> (tempfile::TempDir, GenContext) {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(root, "go.mod", "module abc\n\ngo 1.21\n");
    write(
        root,
        "internal/model1/m1.go",
        "package model1\n\ntype M1 struct {\n\tName string\n}\n",
    );
    write(
        root,
        "internal/model2/m2.go",
        "package model2\n\nimport \"abc/internal/model3\"\n\ntype M2 struct {\n\tInner model3.M3\n\tCount int\n}\n",
    );
    write(
        root,
        "internal/model3/m3.go",
        "package model3\n\nimport \"time\"\n\ntype M3 struct {\n\tAt time.Time\n}\n",
    );
    write(
        root,
        "internal/model/cycle.go",
        "package model\n\ntype A struct {\n\tB *B\n}\n\ntype B struct {\n\tA []A\n}\n\ntype Foo int\n\ntype FooBar struct {\n\tF Foo\n}\n",
    );
    write(
        root,
        "internal/model/generic.go",
        "package model\n\nimport \"io\"\n\ntype Page[T any] struct {\n\tItems []T\n\tOwner *Foo\n}\n\ntype Pair[K comparable, V Base] struct {\n\tKey K\n\tVal V\n}\n\ntype Base interface {\n\tName() string\n}\n\ntype R interface {\n\tio.Reader\n\tBase\n\tGet() Foo\n}\n\ntype Number interface {\n\t~int | ~float64\n}\n",
    );
    write(
        root,
        "internal/logic/x/x.go",
        "package x\n\nimport (\n\t\"context\"\n\n\t\"abc/internal/model\"\n\t\"abc/internal/model1\"\n\t\"abc/internal/model2\"\n)\n\nfunc (s *sX) Get(ctx context.Context, a model1.M1, b *model2.M2) (map[string][]*model.FooBar, error) {\n\treturn nil, nil\n}\n",
    );
    let ctx = GenContext::load(root).unwrap();
    (tmp, ctx)
}

fn logic_file(ctx: &GenContext) -> sr_parser::SourceFile {
    parse_file(&ctx.project.root().join("internal/logic/x/x.go")).unwrap()
}

fn pos(file: &sr_parser::SourceFile) -> SourcePos {
    SourcePos::new(&file.path, 12, 3)
}

fn placeholder(package: &str, name: &str) -> String {
    format!("{{{{{}}}}}", type_id(package, name))
}

#[test]
fn test_resolves_type_graph_across_packages() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);

    let template = resolver.resolve(&file, "model2.M2", &pos(&file)).unwrap();
    let m2 = type_id("abc/internal/model2", "M2");
    assert_ne!(template.to_string(), "model2.M2");
    assert_eq!(template.to_string(), format!("{{{{{m2}}}}}"));

    let types = resolver.closure(&template).unwrap();
    let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["M2", "M3", "Time"]);
    assert!(types[2].import().is_some_and(|i| i.path == "time"));

    // Relocated code references its field types by id.
    let m3 = type_id("abc/internal/model3", "M3");
    let code = types[0].code().unwrap();
    assert!(code.starts_with("type M2 struct"));
    assert!(code.contains(&format!("Inner {{{{{m3}}}}}")));
    assert!(code.contains("Count int"));

    // Neither model2 nor model3 is the model package.
    assert_eq!(resolver.warnings().len(), 2);
}

#[test]
fn test_builtin_only_expressions_stay_literal() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);

    let template = resolver
        .resolve(&file, "map[string]int", &pos(&file))
        .unwrap();
    assert_eq!(template, Template::literal("map[string]int"));
    assert!(resolver.types().is_empty());
}

#[test]
fn test_unknown_scope_reports_position() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);

    let err = resolver
        .resolve(&file, "[]model9.Thing", &pos(&file))
        .unwrap_err();
    match err {
        GenError::UnresolvedScope { pos, scope } => {
            assert_eq!(scope, "model9");
            assert_eq!((pos.line, pos.column), (12, 3));
            assert_eq!(pos.file, file.path);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_type_is_reported() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);

    let err = resolver.resolve(&file, "model1.Nope", &pos(&file)).unwrap_err();
    assert!(matches!(
        err,
        GenError::TypeNotFound { ref package, ref name, .. }
            if package == "abc/internal/model1" && name == "Nope"
    ));
}

#[test]
fn test_cycles_resolve_once_per_type() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);

    let template = resolver.resolve(&file, "*model.A", &pos(&file)).unwrap();
    let types = resolver.closure(&template).unwrap();
    let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(resolver.types().len(), 2);
    assert!(resolver.warnings().is_empty());
}

#[test]
fn test_prefix_names_are_distinct_types() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);

    let template = resolver
        .resolve(&file, "map[model.Foo]model.FooBar", &pos(&file))
        .unwrap();
    let foo = type_id("abc/internal/model", "Foo");
    let foo_bar = type_id("abc/internal/model", "FooBar");
    assert_eq!(
        template.to_string(),
        format!("map[{{{{{foo}}}}}]{{{{{foo_bar}}}}}")
    );
    assert_eq!(
        template
            .substitute(resolver.types(), "abc/internal/srpc/service/x")
            .unwrap(),
        "map[model.Foo]model.FooBar"
    );
}

#[test]
fn test_relocated_declarations_parse_after_substitution() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);
    let template = resolver.resolve(&file, "model2.M2", &pos(&file)).unwrap();
    let types = resolver.closure(&template).unwrap();

    let target = "abc/internal/srpc/service/x";
    for ty in types.iter().filter(|t| t.is_relocated()) {
        let mut moved = ty.clone();
        moved.relocate_to(target);
        let TypeSource::Relocated { code } = &moved.source else {
            unreachable!();
        };
        let mut all = types.clone();
        for t in &mut all {
            t.relocate_to(target);
        }
        let rendered = sr_emit::substitute(code, &all, target).unwrap();
        let body = rendered.strip_prefix("type ").unwrap();
        let (name, underlying) = body.split_once(' ').unwrap();
        assert_eq!(name, ty.name);
        parse_type(underlying).unwrap();
    }
}

#[test]
fn test_field_resolution_is_memoized() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let function = &file.functions[0];
    let mut fields = FieldResolver::new(&ctx, "abc/internal/srpc/slot");

    let result = &function.results[0];
    let first = fields.resolve(&file, result).unwrap().to_string();
    let second = fields.resolve(&file, result).unwrap().to_string();
    assert_eq!(first, "map[string][]*model.FooBar");
    assert_eq!(first, second);

    let meta = fields.field_meta(&file, "", result).unwrap();
    let foo_bar = type_id("abc/internal/model", "FooBar");
    assert_eq!(meta.ty, format!("map[string][]*{{{{{foo_bar}}}}}"));
    let names: Vec<&str> = meta.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["FooBar", "Foo"]);
}

#[test]
fn test_generic_declarations_keep_type_parameters() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);

    let template = resolver
        .resolve(&file, "model.Page[model.Foo]", &pos(&file))
        .unwrap();
    let foo = placeholder("abc/internal/model", "Foo");
    assert_eq!(
        template.to_string(),
        format!("{}[{foo}]", placeholder("abc/internal/model", "Page"))
    );
    let types = resolver.closure(&template).unwrap();
    let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Page", "Foo"]);
    assert_eq!(
        types[0].code().unwrap(),
        format!("type Page[T any] struct {{\n\tItems []T\n\tOwner *{foo}\n}}")
    );

    // Constraints resolve like fields; the parameters themselves do not.
    let template = resolver
        .resolve(&file, "model.Pair[string, model.Base]", &pos(&file))
        .unwrap();
    let pair = resolver.closure(&template).unwrap();
    assert_eq!(
        pair[0].code().unwrap(),
        format!(
            "type Pair[K comparable, V {}] struct {{\n\tKey K\n\tVal V\n}}",
            placeholder("abc/internal/model", "Base")
        )
    );
    assert!(resolver.types().iter().all(|t| t.name != "K" && t.name != "V"));
}

#[test]
fn test_embedded_interfaces_are_resolved() {
    let (_tmp, ctx) = fixture();
    let file = logic_file(&ctx);
    let mut resolver = TypeResolver::new(&ctx);

    let template = resolver.resolve(&file, "model.R", &pos(&file)).unwrap();
    let types = resolver.closure(&template).unwrap();
    let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["R", "Reader", "Base", "Foo"]);
    assert!(types[1].import().is_some_and(|i| i.path == "io"));
    assert_eq!(
        types[0].code().unwrap(),
        format!(
            "type R interface {{\n\t{}\n\t{}\n\tGet() {}\n}}",
            placeholder("io", "Reader"),
            placeholder("abc/internal/model", "Base"),
            placeholder("abc/internal/model", "Foo")
        )
    );

    let target = "abc/internal/srpc/service/x";
    let mut moved = types.clone();
    for t in &mut moved {
        t.relocate_to(target);
    }
    let rendered = sr_emit::substitute(moved[0].code().unwrap(), &moved, target).unwrap();
    assert_eq!(
        rendered,
        "type R interface {\n\tio.Reader\n\tBase\n\tGet() Foo\n}"
    );

    // Approximation terms carry no references.
    let template = resolver.resolve(&file, "model.Number", &pos(&file)).unwrap();
    let number = resolver.closure(&template).unwrap();
    assert_eq!(number.len(), 1);
    assert_eq!(
        number[0].code().unwrap(),
        "type Number interface {\n\t~int | ~float64\n}"
    );
}
