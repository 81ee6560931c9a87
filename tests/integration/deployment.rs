//! End-to-end scenarios for the UAA Deployment templates.

use crate::common::{path_to_file, uaa_context};
use manifest_harness::TemplateSource;
use manifest_harness::matchers::{produce_yaml, representing_deployment};
use manifest_harness::source::SourceKind;
use serde_yaml::Value;

#[test]
fn test_renders_a_deployment_for_the_uaa() {
    produce_yaml(
        &uaa_context(),
        representing_deployment().with_pod_matching(|pod| {
            pod.with_service_account_matching("uaa").with_container_matching(|container| {
                container
                    .with_name("uaa")
                    .with_image_containing("cfidentity/uaa@sha256:")
                    .with_env_var("spring_profiles", "default,hsqldb")
                    .with_env_var("UAA_CONFIG_PATH", "/etc/config")
                    .with_env_var("BPL_TOMCAT_ACCESS_LOGGING", "y")
                    .with_env_var(
                        "JAVA_OPTS",
                        "-Djava.security.egd=file:/dev/./urandom -Dlogging.config=/etc/config/log4j2.properties",
                    )
                    .with_resource_requests("512Mi", "500m")
            })
        }),
    )
    .unwrap();
}

#[test]
fn test_renders_a_custom_image() {
    let ctx = uaa_context().with_data([("image", "image from testing")]);

    produce_yaml(
        &ctx,
        representing_deployment().with_pod_matching(|pod| {
            pod.with_container_matching(|container| container.with_name("uaa").with_image("image from testing"))
        }),
    )
    .unwrap();
}

#[test]
fn test_renders_custom_resource_requests() {
    let ctx = uaa_context()
        .with_data([("resources.requests.memory", "888Mi"), ("resources.requests.cpu", "999m")]);

    produce_yaml(
        &ctx,
        representing_deployment().with_pod_matching(|pod| {
            pod.with_container_matching(|container| {
                container
                    .with_name("uaa")
                    .with_resource_requests("888Mi", "999m")
                    .with_image_containing("cfidentity/uaa@sha256:")
            })
        }),
    )
    .unwrap();
}

#[test]
fn test_renders_custom_database_scheme() {
    let database_scheme = "postgresql";
    let ctx = uaa_context().with_data([("database.scheme", database_scheme)]);

    produce_yaml(
        &ctx,
        representing_deployment().with_pod_matching(|pod| {
            pod.with_container_matching(|container| {
                container.with_name("uaa").with_env_var("spring_profiles", database_scheme)
            })
        }),
    )
    .unwrap();
}

#[test]
fn test_renders_common_labels() {
    let ctx = uaa_context().with_source(manifest_harness::TemplateSource::file(path_to_file("metadata.yml")));
    let ctx = ctx.with_data([("version", "1.0.0")]);

    let labels = [
        ("app.kubernetes.io/name", "uaa"),
        ("app.kubernetes.io/instance", "uaa-standalone"),
        ("app.kubernetes.io/version", "1.0.0"),
        ("app.kubernetes.io/component", "authorization_server"),
        ("app.kubernetes.io/part-of", "uaa"),
        ("app.kubernetes.io/managed-by", "kubectl"),
    ];

    produce_yaml(
        &ctx,
        representing_deployment()
            .with_labels(labels)
            .with_namespace("default")
            .with_pod_matching(|pod| pod.with_labels(labels)),
    )
    .unwrap();
}

#[test]
fn test_patch_keeps_existing_pod_labels() {
    let ctx = uaa_context().with_source(TemplateSource::patch(path_to_file("metadata.yml")));
    let rendered = ctx.render().unwrap();
    let deployment = rendered.find_by_kind("Deployment").unwrap();

    let pod_labels = &deployment["spec"]["template"]["metadata"]["labels"];
    assert_eq!(pod_labels["app"], Value::from("uaa"));
    assert_eq!(pod_labels["app.kubernetes.io/version"], Value::from(""));
    assert_eq!(deployment["spec"]["selector"]["matchLabels"]["app"], Value::from("uaa"));
}

#[test]
fn test_namespace_absent_without_metadata_patch() {
    let rendered = uaa_context().render().unwrap();
    let deployment = rendered.find_by_kind("Deployment").unwrap();
    assert!(deployment["metadata"].get("namespace").is_none());
    assert!(deployment["metadata"].get("labels").is_none());
}

#[test]
fn test_typed_values_after_substitution() {
    let rendered = uaa_context().with_data([("replicas", "3")]).render().unwrap();
    let deployment = rendered.find_by_kind("Deployment").unwrap();
    assert_eq!(deployment["spec"]["replicas"], Value::from(3));

    let matcher = representing_deployment().with_replicas(3).with_name("uaa");
    manifest_harness::evaluate(&matcher.build(), &rendered).unwrap();
}

#[test]
fn test_patch_selected_by_container_name() {
    let patch = "#@patch\n#@match spec.template.spec.containers[name=uaa].name=uaa\nmetadata:\n  annotations:\n    team: identity\n";
    let other = "#@patch\n#@match spec.template.spec.containers[name=nginx].name=nginx\nmetadata:\n  annotations:\n    team: web\n";
    let rendered = uaa_context()
        .with_source(TemplateSource::inline(SourceKind::Patch, "team.yml", patch))
        .with_source(TemplateSource::inline(SourceKind::Patch, "web.yml", other))
        .render()
        .unwrap();

    let deployment = rendered.find_by_kind("Deployment").unwrap();
    assert_eq!(deployment["metadata"]["annotations"]["team"], Value::from("identity"));
}
