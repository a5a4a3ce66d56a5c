use std::path::Path;

use sr_parser::{combine_structs, parse_source, type_param_names};

const LOGIC: &str = r#"package user

import (
	"context"
	"time"

	"demo/internal/model"
	m2 "demo/internal/model2"
	_ "embed"

	"github.com/aundis/mate"
)

type sUser struct {
	mate.Slot
	db     *DB
	a, b   int
	Filter func(ctx context.Context, names ...string) error
}

type IUser interface {
	Get(ctx context.Context, id int) (*model.User, error)
	List(ctx context.Context, ids ...int) ([]m2.Item, int, error)
}

type IDs []int

type Stamp = time.Time

func (s *sUser) Get(ctx context.Context, id int) (*model.User, error) {
	return nil, nil
}

func helper() {}
"#;

#[test]
fn test_package_and_imports() {
    let file = parse_source(Path::new("user.go"), LOGIC.to_string()).unwrap();
    assert_eq!(file.package, "user");
    let exports: Vec<&str> = file.imports.iter().map(|i| i.export.as_str()).collect();
    assert_eq!(exports, vec!["context", "time", "model", "m2", "_", "mate"]);
    assert_eq!(
        file.lookup_import("m2").map(|i| i.path.as_str()),
        Some("demo/internal/model2")
    );
    assert!(file.lookup_import("model2").is_none());
}

#[test]
fn test_struct_fields_and_tags() {
    let file = parse_source(Path::new("user.go"), LOGIC.to_string()).unwrap();
    let st = file.struct_type("sUser").unwrap();
    let names: Vec<&str> = st.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["", "db", "a", "b", "Filter"]);
    assert!(st.embedded("mate.Slot").is_some());
    assert_eq!(st.fields[1].ty, "*DB");
    assert_eq!(&file.source[st.fields[1].ty_range.clone()], "*DB");

    let filter = &st.fields[4];
    let sig = filter.signature.as_ref().expect("function type has a signature");
    assert_eq!(sig.params.len(), 2);
    assert_eq!(sig.params[1].ty, "...string");
    assert!(sig.params[1].is_variadic());
    assert_eq!(sig.results[0].ty, "error");
}

#[test]
fn test_interface_methods() {
    let file = parse_source(Path::new("user.go"), LOGIC.to_string()).unwrap();
    let it = file.interface("IUser").unwrap();
    assert_eq!(it.methods.len(), 2);

    let get = &it.methods[0];
    assert_eq!(get.name, "Get");
    assert_eq!(get.params[0].name, "ctx");
    assert_eq!(get.params[0].ty, "context.Context");
    assert_eq!(get.results[0].ty, "*model.User");
    assert_eq!(get.results[1].ty, "error");

    let list = &it.methods[1];
    assert_eq!(list.params[1].ty, "...int");
    assert_eq!(list.results.len(), 3);
    // Positions are 1-based line:column of the parameter name.
    assert_eq!(list.params[1].pos.line, 23);
    assert_eq!(list.params[1].pos.column, 28);
}

#[test]
fn test_named_types_and_methods() {
    let file = parse_source(Path::new("user.go"), LOGIC.to_string()).unwrap();
    let names: Vec<&str> = file.named_types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["IDs", "Stamp"]);
    assert!(file.named_types[1].is_alias);
    assert_eq!(file.named_types[0].underlying.ty, "[]int");

    assert_eq!(file.functions.len(), 2);
    assert_eq!(file.functions[0].receiver.as_deref(), Some("sUser"));
    assert_eq!(file.functions[1].receiver, None);
}

#[test]
fn test_combine_structs_across_files() {
    let a = parse_source(
        Path::new("a.go"),
        "package user\n\ntype sUser struct{}\n\nfunc (s *sUser) A() {}\n".to_string(),
    )
    .unwrap();
    let b = parse_source(
        Path::new("b.go"),
        "package user\n\nfunc (s sUser) B() {}\nfunc (o *other) C() {}\n".to_string(),
    )
    .unwrap();
    let files = vec![a, b];
    let combined = combine_structs(&files);
    assert_eq!(combined.len(), 1);
    let methods: Vec<&str> = combined[0]
        .methods
        .iter()
        .map(|m| m.function.name.as_str())
        .collect();
    assert_eq!(methods, vec!["A", "B"]);
    assert_eq!(combined[0].methods[1].file.path, Path::new("b.go"));
}

#[test]
fn test_syntax_error_is_reported() {
    let err = parse_source(Path::new("bad.go"), "package x\nfunc (".to_string()).unwrap_err();
    assert!(err.to_string().contains("bad.go"));
}

#[test]
fn test_type_params_and_embeds() {
    let src = "package model\n\nimport \"io\"\n\ntype Page[K, V any] struct {\n\tItems map[K]V\n}\n\ntype Num[T ~int | ~string] []T\n\ntype R interface {\n\tio.Reader\n\tBase\n\tGet() int\n}\n";
    let file = parse_source(Path::new("model.go"), src.to_string()).unwrap();

    let page = file.struct_type("Page").unwrap();
    assert_eq!(page.type_params.len(), 1);
    let names: Vec<&str> = type_param_names(&page.type_params).collect();
    assert_eq!(names, vec!["K", "V"]);
    assert_eq!(page.type_params[0].constraint[0].ty, "any");

    let num = &file.named_types[0];
    let terms: Vec<&str> = num.type_params[0]
        .constraint
        .iter()
        .map(|f| &file.source[f.ty_range.clone()])
        .collect();
    assert_eq!(terms, vec!["int", "string"]);

    let it = file.interface("R").unwrap();
    let embeds: Vec<&str> = it.embeds.iter().map(|f| f.ty.as_str()).collect();
    assert_eq!(embeds, vec!["io.Reader", "Base"]);
    assert_eq!(&file.source[it.embeds[0].ty_range.clone()], "io.Reader");
    assert_eq!(it.methods.len(), 1);
}
