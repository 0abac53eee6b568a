//! Build argument augmentation.

use std::path::Path;

use crate::constants::LOCAL_REPO_OVERRIDE_PREFIX;

/// Point the nested build at `local_store_root` unless the user already did.
///
/// When any argument starts with `-Dmaven.repo.local=`, `arguments` is
/// returned unchanged. Otherwise `-Dmaven.repo.local=<local_store_root>` is
/// appended. Applying the function to its own output changes nothing.
#[must_use]
pub fn enhance_build_arguments(
    arguments: &[String],
    configuration_location: &Path,
    local_store_root: &Path,
) -> Vec<String> {
    if let Some(arg) = arguments.iter().find(|arg| arg.starts_with(LOCAL_REPO_OVERRIDE_PREFIX)) {
        tracing::debug!(
            target: "srcdeps",
            "Forwarding {} to the nested build as set in {}",
            arg,
            configuration_location.display()
        );
        return arguments.to_vec();
    }

    let arg = format!("{LOCAL_REPO_OVERRIDE_PREFIX}{}", local_store_root.display());
    tracing::debug!(target: "srcdeps", "Forwarding {} from the outer build to the nested build", arg);
    let mut enhanced = arguments.to_vec();
    enhanced.push(arg);
    enhanced
}
