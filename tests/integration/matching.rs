//! Matcher behaviour against rendered UAA manifests.

use crate::common::uaa_context;
use manifest_harness::core::Error;
use manifest_harness::matchers::{
    FieldPath, MatchError, Matcher, Selector, evaluate, produce_yaml, representing_deployment,
};

#[test]
fn test_mismatch_names_the_full_path() {
    let err = produce_yaml(
        &uaa_context(),
        representing_deployment().with_pod_matching(|pod| {
            pod.with_container_matching(|c| c.with_name("uaa").with_env_var("spring_profiles", "postgresql"))
        }),
    )
    .unwrap_err();

    let mismatch = match err {
        Error::Match(mismatch) => mismatch,
        other => panic!("expected a match failure, got {:?}", other),
    };
    assert_eq!(
        mismatch.to_string(),
        r#"[kind=Deployment].spec.template.spec.containers[name=uaa].env[spring_profiles] expected "postgresql" got "default,hsqldb""#
    );
}

#[test]
fn test_missing_container_is_not_found() {
    let err = produce_yaml(
        &uaa_context(),
        representing_deployment()
            .with_pod_matching(|pod| pod.with_container_matching(|c| c.with_name("nginx").with_image("nginx"))),
    )
    .unwrap_err();

    let mismatch = err.as_match_error().unwrap();
    assert!(matches!(mismatch, MatchError::NotFound { .. }));
    assert_eq!(mismatch.path().to_string(), "[kind=Deployment].spec.template.spec.containers[name=nginx]");
}

#[test]
fn test_missing_env_var_is_not_found() {
    let err = produce_yaml(
        &uaa_context(),
        representing_deployment().with_pod_matching(|pod| {
            pod.with_container_matching(|c| c.with_name("uaa").with_env_var("SPRING_PROFILES_ACTIVE", "x"))
        }),
    )
    .unwrap_err();
    assert!(err.as_match_error().is_some_and(MatchError::is_not_found));
}

#[test]
fn test_generic_matcher_over_rendered_document() {
    let rendered = uaa_context().render().unwrap();

    let volume = Matcher::new().with_field("configMap.name", "uaa-config");
    let matcher = Matcher::new().with_lookup(
        FieldPath::root(),
        Selector::field_equals("kind", "Deployment"),
        Matcher::new()
            .with_field("apiVersion", "apps/v1")
            .with_subset("spec.selector.matchLabels", [("app", "uaa")])
            .with_lookup("spec.template.spec.volumes", Selector::field_equals("name", "uaa-config"), volume)
            .with_field(FieldPath::parse("spec.template.spec.containers[0].ports[0].containerPort").unwrap(), 8080),
    );
    evaluate(&matcher, &rendered).unwrap();
}

#[test]
fn test_matcher_is_reusable_across_documents() {
    let matcher: Matcher = representing_deployment()
        .with_pod_matching(|pod| pod.with_container_matching(|c| c.with_name("uaa").with_resource_requests("888Mi", "999m")))
        .into();

    let default = uaa_context().render().unwrap();
    let custom = uaa_context()
        .with_data([("resources.requests.memory", "888Mi"), ("resources.requests.cpu", "999m")])
        .render()
        .unwrap();

    assert!(evaluate(&matcher, &default).is_err());
    assert!(evaluate(&matcher, &custom).is_ok());
    assert!(evaluate(&matcher, &default).is_err());
}
