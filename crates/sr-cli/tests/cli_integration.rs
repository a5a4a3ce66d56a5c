//! Integration tests for the flows behind `sr get`, `ols` and `fls`, driven
//! from a saved `Helper.list` response.

use std::path::Path;

use sr_cli::client::{FileHelperSource, HelperSource};
use sr_cli::split_reference;
use sr_core::meta::{HelperQuery, KIND_SLOT};
use sr_emit::pipeline::{self, GenKind};
use sr_emit::{GenContext, function_listing, materialize_call, object_listing};

const HELPERS: &str = r#"{
  "list": [
    {
      "Name": "Account",
      "Kind": "slot",
      "Functions": [
        {
          "Name": "Find",
          "Parameters": [
            {"Name": "ctx", "Type": "{{ctx1}}", "Types": [
              {"Id": "ctx1", "Name": "Context", "From": "context", "Import": {"Path": "context", "Alias": ""}}
            ]},
            {"Name": "id", "Type": "int"}
          ],
          "Results": [
            {"Name": "", "Type": "*{{acc1}}", "Types": [
              {"Id": "acc1", "Name": "Profile", "From": "bank/internal/model", "Code": "type Profile struct {\n\tOwner string\n\tOpened {{tm1}}\n}"},
              {"Id": "tm1", "Name": "Time", "From": "time", "Import": {"Path": "time", "Alias": ""}}
            ]},
            {"Name": "", "Type": "error"}
          ]
        }
      ]
    },
    {"Name": "Closed", "Kind": "signal", "Functions": []}
  ]
}"#;

fn project(root: &Path) -> GenContext {
    std::fs::write(root.join("go.mod"), "module shop\n\ngo 1.21\n").unwrap();
    GenContext::load(root).unwrap()
}

#[test]
fn test_ols_and_fls_from_saved_helpers() {
    let tmp = tempfile::tempdir().unwrap();
    let helpers = tmp.path().join("helpers.json");
    std::fs::write(&helpers, HELPERS).unwrap();
    let source = FileHelperSource::new(&helpers);

    let all = source.list("bank", &HelperQuery::default()).unwrap();
    assert_eq!(object_listing(&all), vec!["[slot] Account", "[signal] Closed"]);

    let (target, object) = split_reference("bank@Account").unwrap();
    let found = source
        .list(target, &HelperQuery::new(object.unwrap(), ""))
        .unwrap();
    assert_eq!(
        function_listing(&found[0]).unwrap(),
        vec!["Find(ctx context.Context, id int) (*model.Profile, error)"]
    );
}

#[test]
fn test_get_call_then_gen_call() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = project(tmp.path());
    let helpers = tmp.path().join("helpers.json");
    std::fs::write(&helpers, HELPERS).unwrap();

    let objects = FileHelperSource::new(&helpers)
        .list("bank", &HelperQuery::new("", KIND_SLOT))
        .unwrap();
    assert_eq!(objects.len(), 1);
    let staging = materialize_call(&ctx, "bank", &objects).unwrap();
    let written = pipeline::commit(&ctx, staging).unwrap().written;
    assert_eq!(written.len(), 2);

    let dir = ctx.project.service_dir("bank");
    let model = std::fs::read_to_string(dir.join("model.go")).unwrap();
    assert!(model.contains("package bank\n"));
    assert!(model.contains("\tOpened time.Time\n"));

    let report = pipeline::run(&ctx, GenKind::Call).unwrap();
    assert_eq!(report.written, vec![dir.join("generate.go")]);
    let client = std::fs::read_to_string(dir.join("generate.go")).unwrap();
    assert!(client.contains("var Account IAccount = &cAccount{}"));
    assert!(client.contains("\tR1 *Profile `json:\"r1\"`\n"));

    // Fetching again replaces the generated declarations in place.
    let staging = materialize_call(&ctx, "bank", &objects).unwrap();
    let again = pipeline::commit(&ctx, staging).unwrap();
    assert!(again.written.is_empty());
    assert_eq!(again.unchanged.len(), 2);
}
