//! Scenarios described by a render manifest on disk.

use crate::common::path_to_file;
use manifest_harness::config::RenderManifest;
use manifest_harness::matchers::{produce_yaml, representing_deployment};
use manifest_harness::source::SourceKind;
use tempfile::TempDir;

#[test]
fn test_render_manifest_fixture() {
    let manifest = RenderManifest::load(&path_to_file("render.toml")).unwrap();
    assert_eq!(manifest.settings.max_template_size, 65536);
    assert_eq!(manifest.sources.len(), 6);
    assert_eq!(manifest.sources[4].kind, SourceKind::Script);

    produce_yaml(
        &manifest.into_context(),
        representing_deployment()
            .with_namespace("default")
            .with_labels([("app.kubernetes.io/version", "77.0.0")])
            .with_pod_matching(|pod| {
                pod.with_container_matching(|c| {
                    c.with_name("uaa")
                        .with_env_var("spring_profiles", "postgresql")
                        .with_image_containing("cfidentity/uaa@sha256:")
                })
            }),
    )
    .unwrap();
}

#[test]
fn test_manifest_with_absolute_paths() {
    let temp = TempDir::new().unwrap();
    let manifest_path = temp.path().join("render.toml");
    let content = format!(
        "[[sources]]\npath = {:?}\n[[sources]]\npath = {:?}\n[[sources]]\npath = {:?}\n[[sources]]\npath = {:?}\n\n[overrides]\nimage = \"uaa:local\"\n",
        path_to_file("deployment.yml").display().to_string(),
        path_to_file("values/_values.yml").display().to_string(),
        path_to_file("values/image.yml").display().to_string(),
        path_to_file("deployment.star").display().to_string(),
    );
    std::fs::write(&manifest_path, content).unwrap();

    let ctx = RenderManifest::load(&manifest_path).unwrap().into_context();
    produce_yaml(
        &ctx,
        representing_deployment()
            .with_pod_matching(|pod| pod.with_container_matching(|c| c.with_name("uaa").with_image("uaa:local"))),
    )
    .unwrap();
}

#[test]
fn test_invalid_manifest_names_the_file() {
    let temp = TempDir::new().unwrap();
    let manifest_path = temp.path().join("render.toml");
    std::fs::write(&manifest_path, "[overrides]\nimage = \"x\"\n").unwrap();

    let err = RenderManifest::load(&manifest_path).unwrap_err();
    assert!(format!("{:#}", err).contains("At least one [[sources]] entry is required"));
    assert!(err.to_string().contains("render.toml"));
}
