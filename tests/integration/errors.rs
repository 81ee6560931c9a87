//! Failures abort the render and say why.

use crate::common::{path_to_file, uaa_context};
use manifest_harness::TemplateSource;
use manifest_harness::config::RenderSettings;
use manifest_harness::core::user_friendly_error;
use manifest_harness::render::RenderError;
use manifest_harness::script::ScriptError;
use manifest_harness::source::SourceKind;
use manifest_harness::templating::{ResolutionError, TemplateError};
use manifest_harness::test_utils::{TemplateDir, TemplateFixture};

#[test]
fn test_missing_template_file() {
    let ctx = uaa_context().with_source(TemplateSource::file(path_to_file("missing.yml")));
    let err = ctx.render().unwrap_err();
    assert!(matches!(err, RenderError::Template(TemplateError::Unreadable { .. })));
    assert!(err.to_string().contains("missing.yml"));
}

#[test]
fn test_unknown_variable_suggests_close_names() {
    let dir = TemplateDir::with_fixtures(&[
        TemplateFixture::new("cm.yml", "kind: ConfigMap\ndata:\n  memory: \"{{ resources.requests.memroy }}\"\n"),
    ])
    .unwrap();
    let ctx = dir.context(["cm.yml"]).with_data([("resources.requests.memory", "512Mi")]);

    let err = ctx.render().unwrap_err();
    let RenderError::Resolution(resolution) = &err else {
        panic!("expected a resolution error, got {:?}", err);
    };
    match resolution {
        ResolutionError::VariableNotFound {
            variable,
            suggestions,
            ..
        } => {
            assert_eq!(variable, "resources.requests.memroy");
            assert_eq!(suggestions, &vec!["resources.requests.memory".to_string()]);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let report = user_friendly_error(err.into()).to_string();
    assert!(report.contains("Did you mean one of these?"));
    assert!(report.contains("  - resources.requests.memory"));
}

#[test]
fn test_script_assertion_failure() {
    // Scripts run after every overlay, whatever their position in the set
    let ctx = uaa_context().with_source(TemplateSource::inline(
        SourceKind::Overlay,
        "bad-memory.yml",
        "resources:\n  requests:\n    memory: 512M\n",
    ));

    let err = ctx.render().unwrap_err();
    assert!(matches!(err, RenderError::Script(ScriptError::AssertionFailed { .. })));
    assert!(err.to_string().contains("binary suffix"));
}

#[test]
fn test_template_size_limit() {
    let ctx = uaa_context().with_settings(RenderSettings {
        max_template_size: 64,
    });
    assert!(matches!(ctx.render().unwrap_err(), RenderError::Template(TemplateError::TooLarge { .. })));
}

#[test]
fn test_invalid_yaml_after_substitution() {
    let dir = TemplateDir::with_fixtures(&[TemplateFixture::new("cm.yml", "kind: ConfigMap\ndata: {{ value }}\n")])
        .unwrap();
    let err = dir.context(["cm.yml"]).with_data([("value", "[unclosed")]).render().unwrap_err();
    assert!(matches!(err, RenderError::Template(TemplateError::InvalidYaml { .. })));
}

#[test]
fn test_misplaced_directive() {
    let dir = TemplateDir::with_fixtures(&[
        TemplateFixture::config_map(),
        TemplateFixture::new("v.yml", "#@data/values\n#@match kind=ConfigMap\nname: uaa\n"),
    ])
    .unwrap();
    let err = dir.context(["configmap.yml", "v.yml"]).render().unwrap_err();
    assert!(matches!(err, RenderError::Template(TemplateError::MisplacedDirective { .. })));
}

#[test]
fn test_no_partial_document_on_failure() {
    let dir = TemplateDir::with_fixtures(&[
        TemplateFixture::new("ok.yml", "kind: Service\n"),
        TemplateFixture::new("broken.yml", "kind: ConfigMap\ndata:\n  x: \"{{ undefined }}\"\n"),
    ])
    .unwrap();
    assert!(dir.context(["ok.yml", "broken.yml"]).render().is_err());
}
