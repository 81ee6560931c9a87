//! Unrelated scenarios render and match in parallel without coordination.

use crate::common::uaa_context;
use manifest_harness::matchers::{produce_yaml, representing_deployment};

#[test]
fn test_parallel_scenarios() {
    let base = uaa_context();
    let schemes = ["hsqldb", "postgresql", "mysql", "sqlserver"];

    std::thread::scope(|scope| {
        for scheme in schemes {
            let ctx = base.clone().with_data([("database.scheme", scheme)]);
            scope.spawn(move || {
                let expected = if scheme == "hsqldb" { "default,hsqldb" } else { scheme };
                for _ in 0..5 {
                    produce_yaml(
                        &ctx,
                        representing_deployment().with_pod_matching(|pod| {
                            pod.with_container_matching(|c| c.with_name("uaa").with_env_var("spring_profiles", expected))
                        }),
                    )
                    .unwrap();
                }
            });
        }
    });

    assert!(base.overrides().is_empty());
}

#[test]
fn test_shared_document_across_threads() {
    let rendered = uaa_context().render().unwrap();
    let matcher = manifest_harness::Matcher::from(representing_deployment().with_name("uaa"));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| manifest_harness::evaluate(&matcher, &rendered).unwrap());
        }
    });
}
