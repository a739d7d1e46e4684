//! Command-line runs over documents in a temporary directory

use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use swap_cli::{command, execute, exit_code, EXIT_ROLLED_BACK, EXIT_USAGE};
use swap_engine::TransactionError;
use swap_scene::{SceneDocument, SceneError};
use tempfile::TempDir;

const SCENE: &str = r#"{
  "nodes": [
    { "key": "canvas", "name": "Canvas", "children": [
      { "key": "before", "name": "Before" },
      { "key": "a", "name": "A",
        "components": [ { "key": "a.image", "kind": "Image" } ],
        "children": [
          { "key": "foo", "name": "Foo", "active": false },
          { "key": "bar", "name": "Bar", "children": [ { "key": "baz", "name": "Baz" } ] }
        ] },
      { "key": "after", "name": "After" }
    ] },
    { "key": "z", "name": "Z", "components": [
      { "key": "z.follow", "kind": "Follow", "fields": {
        "target": { "ref": "a" },
        "graphic": { "ref": "a.image" },
        "speed": 2.5
      } }
    ] }
  ]
}"#;

const TEMPLATE: &str = "
nodes:
  - key: button
    name: Button
    components:
      - key: button.image
        kind: Image
    children:
      - key: button.foo
        name: Foo
";

struct Workspace {
    dir: TempDir,
    scene: PathBuf,
    template: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let scene = dir.path().join("scene.json");
    let template = dir.path().join("button.yaml");
    fs::write(&scene, SCENE).unwrap();
    fs::write(&template, TEMPLATE).unwrap();
    Workspace {
        dir,
        scene,
        template,
    }
}

fn run(args: &[&str]) -> anyhow::Result<String> {
    let matches = command().try_get_matches_from(args.iter().copied())?;
    let mut out = Vec::new();
    execute(&matches, &mut out)?;
    Ok(String::from_utf8(out)?)
}

fn path(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn replace_writes_merged_scene() {
    let ws = workspace();
    let out = ws.dir.path().join("out.json");

    let summary = run(&[
        "swap",
        "replace",
        "--scene",
        path(&ws.scene),
        "--template",
        path(&ws.template),
        "--select",
        "a",
        "--out",
        path(&out),
        "--json",
    ])
    .unwrap();

    let summary: Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(summary["template"], "Button");
    assert_eq!(summary["replaced"][0]["key"], "a");
    assert_eq!(summary["replaced"][0]["adopted"], 1);
    assert_eq!(summary["replaced"][0]["rewritten"], 2);

    let doc = SceneDocument::load(&out).unwrap();
    let canvas = &doc.nodes[0];
    let names: Vec<&str> = canvas.children.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Before", "A", "After"]);

    let a = &canvas.children[1];
    assert_eq!(a.key, "a");
    assert_eq!(a.components.len(), 1);
    let image_key = a.components[0].key.clone();
    assert_eq!(a.children[0].name, "Foo");
    assert!(!a.children[0].active);
    assert_eq!(a.children[1].key, "bar");
    assert_eq!(a.children[1].children[0].key, "baz");

    let follow = serde_json::to_value(&doc.nodes[1].components[0].fields).unwrap();
    assert_eq!(follow["target"], serde_json::json!({ "ref": "a" }));
    assert_eq!(follow["graphic"], serde_json::json!({ "ref": image_key }));
    assert_eq!(follow["speed"], serde_json::json!(2.5));

    // The input is untouched when --out is given
    assert_eq!(fs::read_to_string(&ws.scene).unwrap(), SCENE);
}

#[test]
fn replace_in_place_by_default() {
    let ws = workspace();

    let text = run(&[
        "swap",
        "replace",
        "--scene",
        path(&ws.scene),
        "--template",
        path(&ws.template),
        "--select",
        "a",
    ])
    .unwrap();

    assert!(text.starts_with("replaced 1 node(s) with 'Button'"));
    let doc = SceneDocument::load(&ws.scene).unwrap();
    let a = &doc.nodes[0].children[1];
    assert_eq!(a.key, "a");
    assert_eq!(a.children[0].name, "Foo");
    assert_ne!(fs::read_to_string(&ws.scene).unwrap(), SCENE);
}

#[test]
fn empty_selection_changes_nothing() {
    let ws = workspace();

    let text = run(&[
        "swap",
        "replace",
        "--scene",
        path(&ws.scene),
        "--template",
        path(&ws.template),
    ])
    .unwrap();

    assert_eq!(text, "nothing selected, scene unchanged\n");
    assert_eq!(fs::read_to_string(&ws.scene).unwrap(), SCENE);
}

#[test]
fn unknown_key_is_usage_error() {
    let ws = workspace();

    let err = run(&[
        "swap",
        "replace",
        "--scene",
        path(&ws.scene),
        "--template",
        path(&ws.template),
        "--select",
        "missing",
    ])
    .unwrap_err();

    assert!(err.to_string().contains("missing"));
    assert_eq!(exit_code(&err), EXIT_USAGE);
}

#[test]
fn nested_selection_is_usage_error() {
    let ws = workspace();

    let err = run(&[
        "swap",
        "replace",
        "--scene",
        path(&ws.scene),
        "--template",
        path(&ws.template),
        "--select",
        "a",
        "bar",
    ])
    .unwrap_err();

    assert!(err.downcast_ref::<TransactionError>().is_some());
    assert_eq!(exit_code(&err), EXIT_USAGE);
    assert_eq!(fs::read_to_string(&ws.scene).unwrap(), SCENE);
}

#[test]
fn failed_transaction_exit_code() {
    let node = SceneDocument::from_json_str(r#"{ "nodes": [ { "key": "x", "name": "X" } ] }"#)
        .unwrap()
        .to_scene()
        .unwrap()
        .0
        .roots()[0];
    let err = anyhow::Error::new(TransactionError::Replace {
        root: node,
        source: SceneError::UnknownNode(node),
    });
    assert_eq!(exit_code(&err), EXIT_ROLLED_BACK);
}

#[test]
fn config_disables_descendant_remap() {
    let ws = workspace();
    let config = ws.dir.path().join("swap.toml");
    fs::write(&config, "remap_descendants = false\n").unwrap();
    let scene = SCENE.replace(
        r#""graphic": { "ref": "a.image" },"#,
        r#""graphic": { "ref": "foo" },"#,
    );
    fs::write(&ws.scene, &scene).unwrap();

    let summary = run(&[
        "swap",
        "replace",
        "--scene",
        path(&ws.scene),
        "--template",
        path(&ws.template),
        "--select",
        "a",
        "--config",
        path(&config),
        "--json",
    ])
    .unwrap();

    let summary: Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(summary["replaced"][0]["rewritten"], 1);
    // The skipped reference pointed at the destroyed Foo and is written empty
    let doc = SceneDocument::load(&ws.scene).unwrap();
    let follow = serde_json::to_value(&doc.nodes[1].components[0].fields).unwrap();
    assert_eq!(follow["graphic"], serde_json::json!({ "ref": null }));
}

#[test]
fn inspect_lists_references() {
    let ws = workspace();

    let report = run(&["swap", "inspect", "--scene", path(&ws.scene), "--json"]).unwrap();
    let report: Value = serde_json::from_str(&report).unwrap();

    let nodes = report["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 8);
    assert_eq!(nodes[2]["path"], "Canvas/A");
    assert_eq!(nodes[2]["depth"], 1);
    assert_eq!(nodes[3]["active"], false);

    let references = report["references"].as_array().unwrap();
    assert_eq!(references.len(), 2);
    assert_eq!(references[0]["owner"], "z.follow");
    assert_eq!(references[0]["field"], "target");
    assert_eq!(references[0]["target_path"], "Canvas/A");
    assert_eq!(references[1]["target"], "a.image");
}

#[test]
fn inspect_text() {
    let ws = workspace();

    let text = run(&["swap", "inspect", "--scene", path(&ws.scene)]).unwrap();

    assert!(text.contains("  Canvas/A/Foo [foo] (inactive)"));
    assert!(text.contains("z.follow Follow.target -> Canvas/A [a]"));
}

#[test]
fn missing_subcommand_rejected() {
    assert!(command().try_get_matches_from(["swap"]).is_err());
}
