//! Variable resolution order across defaults, overlays, scripts and overrides.

use manifest_harness::TemplateSource;
use manifest_harness::source::SourceKind;
use manifest_harness::test_utils::{TemplateDir, TemplateFixture};
use serde_yaml::Value;

fn greeting_dir(extra: &[TemplateFixture]) -> TemplateDir {
    let mut fixtures = vec![TemplateFixture::config_map()];
    fixtures.extend_from_slice(extra);
    TemplateDir::with_fixtures(&fixtures).unwrap()
}

#[test]
fn test_later_overlay_wins() {
    let dir = greeting_dir(&[
        TemplateFixture::values("a.yml", [("greeting", "from-a"), ("name", "a")]),
        TemplateFixture::values("b.yml", [("greeting", "from-b")]),
    ]);

    let env = dir.context(["configmap.yml", "a.yml", "b.yml"]).resolve_environment().unwrap();
    assert_eq!(env.get("greeting"), Some("from-b"));
    assert_eq!(env.get("name"), Some("a"));

    let env = dir.context(["configmap.yml", "b.yml", "a.yml"]).resolve_environment().unwrap();
    assert_eq!(env.get("greeting"), Some("from-a"));
}

#[test]
fn test_default_is_lowest_layer() {
    let dir = greeting_dir(&[TemplateFixture::values("v.yml", [("name", "uaa")])]);
    let rendered = dir.context(["configmap.yml", "v.yml"]).render().unwrap();
    assert_eq!(rendered.documents()[0]["data"]["greeting"], Value::from("hello"));
}

#[test]
fn test_override_beats_every_layer() {
    let dir = greeting_dir(&[
        TemplateFixture::values("v.yml", [("greeting", "overlay"), ("name", "uaa")]),
        TemplateFixture::script("shout.star", "- set:\n    greeting: \"{{ greeting | upper }}\"\n"),
    ]);
    let ctx = dir.context(["configmap.yml", "v.yml", "shout.star"]);
    assert_eq!(ctx.resolve_environment().unwrap().get("greeting"), Some("OVERLAY"));

    let overridden = ctx.with_data([("greeting", "override")]);
    let rendered = overridden.render().unwrap();
    assert_eq!(rendered.documents()[0]["data"]["greeting"], Value::from("override"));
}

#[test]
fn test_scripts_chain_in_order() {
    let dir = greeting_dir(&[
        TemplateFixture::values("v.yml", [("name", "uaa")]),
        TemplateFixture::script("one.star", "- set:\n    greeting: \"{{ greeting }}-one\"\n"),
        TemplateFixture::script("two.star", "- set:\n    greeting: \"{{ greeting }}-two\"\n"),
    ]);
    let env = dir.context(["configmap.yml", "v.yml", "one.star", "two.star"]).resolve_environment().unwrap();
    assert_eq!(env.get("greeting"), Some("hello-one-two"));
}

#[test]
fn test_script_default_yields_to_overlay() {
    let dir = greeting_dir(&[
        TemplateFixture::values("v.yml", [("name", "uaa")]),
        TemplateFixture::script("derive.star", "- default:\n    name: derived\n    greeting: derived\n"),
    ]);
    let env = dir.context(["configmap.yml", "v.yml", "derive.star"]).resolve_environment().unwrap();
    assert_eq!(env.get("name"), Some("uaa"));
    assert_eq!(env.get("greeting"), Some("hello"));
}

#[test]
fn test_namespaced_overlay() {
    let dir = TemplateDir::with_fixtures(&[
        TemplateFixture::new(
            "db.yml",
            "kind: Secret\nstringData:\n  url: \"{{ database.scheme }}://{{ database.host }}\"\n",
        ),
        TemplateFixture::new("database.yml", "#@data/values\n#@namespace database\nscheme: hsqldb\nhost: localhost\n"),
        TemplateFixture::new("host.yml", "#@data/values\nhost: db.internal\n"),
    ])
    .unwrap();

    let rendered = dir.context(["db.yml", "database.yml"]).render().unwrap();
    assert_eq!(rendered.documents()[0]["stringData"]["url"], Value::from("hsqldb://localhost"));

    let ctx = manifest_harness::RenderingContext::new(vec![
        TemplateSource::file(dir.path().join("db.yml")),
        TemplateSource::file(dir.path().join("database.yml")),
        TemplateSource::overlay_in(dir.path().join("host.yml"), "database"),
    ]);
    let rendered = ctx.render().unwrap();
    assert_eq!(rendered.documents()[0]["stringData"]["url"], Value::from("hsqldb://db.internal"));
}

#[test]
fn test_inline_sources_mix_with_files() {
    let dir = greeting_dir(&[]);
    let ctx = dir
        .context(["configmap.yml"])
        .with_source(TemplateSource::inline(SourceKind::Overlay, "inline-values", "name: inline\n"));
    let rendered = ctx.render().unwrap();
    assert_eq!(rendered.documents()[0]["metadata"]["name"], Value::from("inline"));
}

#[test]
fn test_with_data_merges_and_shares_nothing() {
    let dir = greeting_dir(&[]);
    let base = dir.context(["configmap.yml"]).with_data([("name", "first")]);
    let second = base.clone().with_data([("name", "second"), ("greeting", "hi")]);

    assert_eq!(base.overrides().get("name"), Some("first"));
    assert_eq!(base.overrides().len(), 1);
    assert_eq!(second.overrides().get("name"), Some("second"));
    assert_eq!(second.overrides().get("greeting"), Some("hi"));
}
