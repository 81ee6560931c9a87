use super::matcher::{Matcher, evaluate};
use crate::core::Result;
use crate::render::RenderingContext;

/// Render `context` and evaluate `matcher` against the result.
///
/// A render failure and a match failure are both returned as
/// [`crate::core::Error`], so a test can use `?` or `unwrap()` on either.
///
/// ```rust,no_run
/// use manifest_harness::matchers::{produce_yaml, representing_deployment};
/// use manifest_harness::render::RenderingContext;
///
/// # fn example() -> manifest_harness::core::Result<()> {
/// let ctx = RenderingContext::from_paths(["deployment.yml", "values/_values.yml"])
///     .with_data([("image", "image from testing")]);
/// produce_yaml(
///     &ctx,
///     representing_deployment().with_pod_matching(|pod| {
///         pod.with_container_matching(|c| c.with_name("uaa").with_image("image from testing"))
///     }),
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn produce_yaml(context: &RenderingContext, matcher: impl Into<Matcher>) -> Result<()> {
    let rendered = context.render()?;
    evaluate(&matcher.into(), &rendered)?;
    Ok(())
}
