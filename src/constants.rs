//! Global constants used throughout the srcdeps codebase.
//!
//! Flag names, environment variables, file names and timeouts that are shared
//! between modules live here so they are defined exactly once.

use std::time::Duration;

/// Build argument prefix that points the nested build at a local artifact store.
///
/// An argument starting with this prefix is never added twice; a user-supplied
/// one always wins.
pub const LOCAL_REPO_OVERRIDE_PREFIX: &str = "-Dmaven.repo.local=";

/// Default upper bound for a single source build (one hour).
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "srcdeps.yaml";

/// Environment variable holding an explicit configuration file path.
pub const ENV_CONFIG_PATH: &str = "SRCDEPS_YAML_PATH";

/// Environment variable overriding the global skip flag (`true`/`false`).
pub const ENV_SKIP: &str = "SRCDEPS_SKIP";

/// Environment variable overriding the forwarded property names (comma separated).
pub const ENV_FORWARD_PROPERTIES: &str = "SRCDEPS_FORWARD_PROPERTIES";

/// Environment variable overriding the build workspace root.
pub const ENV_BUILD_ROOT: &str = "SRCDEPS_BUILD_ROOT";

/// Environment variable overriding the local Maven repository location.
pub const ENV_MAVEN_REPO_LOCAL: &str = "SRCDEPS_MAVEN_REPO_LOCAL";

/// Extension of the per-workspace lock files.
pub const LOCK_FILE_EXTENSION: &str = "lock";

/// Directory under the build root holding the lock files, mirroring the workspace tree.
///
/// Repository id segments never contain `.`, so no workspace can live here.
pub const LOCKS_DIR_NAME: &str = ".locks";

/// `versions-maven-plugin` used to stamp the source version into the checked out project.
pub const DEFAULT_VERSIONS_MAVEN_PLUGIN_VERSION: &str = "2.16.2";

/// URL prefix marking a Git SCM URL (`git:https://...`).
pub const GIT_URL_PREFIX: &str = "git:";
