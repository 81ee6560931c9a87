//! Typed builders for Deployment, pod template and container expectations.
//!
//! Each builder is a thin vocabulary over [`Matcher`]; they add no evaluation
//! logic of their own.
//!
//! ```rust
//! use manifest_harness::matchers::representing_deployment;
//!
//! let matcher = representing_deployment().with_pod_matching(|pod| {
//!     pod.with_service_account_matching("uaa").with_container_matching(|container| {
//!         container
//!             .with_name("uaa")
//!             .with_image_containing("cfidentity/uaa@sha256:")
//!             .with_env_var("UAA_CONFIG_PATH", "/etc/config")
//!             .with_resource_requests("512Mi", "500m")
//!     })
//! });
//! ```

use std::collections::BTreeMap;

use super::matcher::{Matcher, Selector};
use super::path::FieldPath;

/// Start describing the first document of kind `Deployment`.
pub fn representing_deployment() -> DeploymentMatcher {
    DeploymentMatcher::default()
}

fn sorted_labels<I, K, V>(labels: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    labels.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentMatcher {
    matcher: Matcher,
}

impl DeploymentMatcher {
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.map(|m| m.with_field("metadata.name", name.into()))
    }

    #[must_use]
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        self.map(|m| m.with_field("metadata.namespace", namespace.into()))
    }

    /// The Deployment's own labels must include these.
    #[must_use]
    pub fn with_labels<I, K, V>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.map(|m| m.with_subset("metadata.labels", sorted_labels(labels)))
    }

    #[must_use]
    pub fn with_replicas(self, replicas: u32) -> Self {
        self.map(|m| m.with_field("spec.replicas", replicas))
    }

    /// Constrain the pod template at `spec.template`.
    #[must_use]
    pub fn with_pod_matching(self, build: impl FnOnce(PodMatcher) -> PodMatcher) -> Self {
        let pod = build(PodMatcher::default());
        self.map(|m| m.with_child("spec.template", pod.matcher))
    }

    /// The generic matcher, rooted at the document list.
    pub fn build(self) -> Matcher {
        Matcher::new().with_lookup(FieldPath::root(), Selector::field_equals("kind", "Deployment"), self.matcher)
    }

    fn map(self, f: impl FnOnce(Matcher) -> Matcher) -> Self {
        Self {
            matcher: f(self.matcher),
        }
    }
}

impl From<DeploymentMatcher> for Matcher {
    fn from(deployment: DeploymentMatcher) -> Self {
        deployment.build()
    }
}

/// Expectations on a pod template (`metadata` plus `spec`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodMatcher {
    matcher: Matcher,
}

impl PodMatcher {
    #[must_use]
    pub fn with_labels<I, K, V>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            matcher: self.matcher.with_subset("metadata.labels", sorted_labels(labels)),
        }
    }

    #[must_use]
    pub fn with_service_account_matching(self, name: impl Into<String>) -> Self {
        Self {
            matcher: self.matcher.with_field("spec.serviceAccountName", name.into()),
        }
    }

    /// Constrain a container. A container matcher with a name is looked up by
    /// that name; without one, any container satisfying it passes.
    #[must_use]
    pub fn with_container_matching(self, build: impl FnOnce(ContainerMatcher) -> ContainerMatcher) -> Self {
        let container = build(ContainerMatcher::default());
        let selector = match &container.name {
            Some(name) => Selector::field_equals("name", name.clone()),
            None => Selector::Any,
        };
        Self {
            matcher: self.matcher.with_lookup("spec.containers", selector, container.matcher),
        }
    }

    pub fn into_matcher(self) -> Matcher {
        self.matcher
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerMatcher {
    name: Option<String>,
    matcher: Matcher,
}

impl ContainerMatcher {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.matcher = self.matcher.with_field("name", name.clone());
        self.name = Some(name);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.matcher = self.matcher.with_field("image", image.into());
        self
    }

    /// For digest-pinned images where only a stable prefix is known.
    #[must_use]
    pub fn with_image_containing(mut self, substring: impl Into<String>) -> Self {
        self.matcher = self.matcher.with_field_containing("image", substring);
        self
    }

    #[must_use]
    pub fn with_env_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.matcher = self.matcher.with_entry("env", "name", name, "value", value.into());
        self
    }

    #[must_use]
    pub fn with_resource_requests(mut self, memory: impl Into<String>, cpu: impl Into<String>) -> Self {
        self.matcher =
            self.matcher.with_subset("resources.requests", [("memory", memory.into()), ("cpu", cpu.into())]);
        self
    }

    #[must_use]
    pub fn with_resource_limits(mut self, memory: impl Into<String>, cpu: impl Into<String>) -> Self {
        self.matcher =
            self.matcher.with_subset("resources.limits", [("memory", memory.into()), ("cpu", cpu.into())]);
        self
    }

    pub fn into_matcher(self) -> Matcher {
        self.matcher
    }
}
