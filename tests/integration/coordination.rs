//! Build coordination against an on-disk Maven local repository.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use srcdeps::build::{BuildRequest, BuildService};
use srcdeps::config::{Configuration, ConfigurationService};
use srcdeps::constants::LOCAL_REPO_OVERRIDE_PREFIX;
use srcdeps::coordinator::{BuildCoordinator, BuildOutcome};
use srcdeps::core::{DependencyCoordinate, SrcdepsError};
use srcdeps::resolver::ResolutionInterceptor;
use srcdeps::store::{LocalStore, MavenLocalStore};
use srcdeps::test_utils::{CapturedEvents, init_test_logging};
use srcdeps::workspace::LockingBuildDirectories;

const CONFIG: &str = r#"
configModelVersion: 2.2
forwardProperties:
  - SRCDEPS_IT_*
buildTimeout: 10m
repositories:
  org.example:
    selectors:
      - org.example
    urls:
      - git:https://github.com/example/foo.git
    buildArguments:
      - -Pfast
  org.other:
    selectors:
      - "org.other:*:*-SRC-tag-*"
    urls:
      - git:https://github.com/other/other.git
    skipTests: false
"#;

/// Installs the requested artifacts into the repository named by
/// `-Dmaven.repo.local=` in the build arguments, like a real Maven build would.
#[derive(Default)]
struct InstallingBuild {
    artifacts: Vec<(String, String)>,
    builds: AtomicUsize,
    requests: std::sync::Mutex<Vec<BuildRequest>>,
}

impl InstallingBuild {
    fn new(artifacts: &[(&str, &str)]) -> Self {
        Self {
            artifacts: artifacts.iter().map(|(g, a)| (g.to_string(), a.to_string())).collect(),
            ..Self::default()
        }
    }

    fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildService for InstallingBuild {
    async fn build(&self, request: &BuildRequest) -> Result<(), SrcdepsError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let repo_local = request
            .build_arguments()
            .iter()
            .find_map(|arg| arg.strip_prefix(LOCAL_REPO_OVERRIDE_PREFIX))
            .map(PathBuf::from)
            .ok_or_else(|| SrcdepsError::BuildFailed {
                operation: "install".to_string(),
                reason: "no local repository argument".to_string(),
            })?;

        let store = MavenLocalStore::new(repo_local);
        for (group, artifact) in &self.artifacts {
            let dir = store.version_directory(group, artifact, request.src_version().as_str());
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(dir.join(format!("{artifact}-{}.jar", request.src_version())), b"jar").await?;
        }
        Ok(())
    }
}

struct Setup {
    _temp: TempDir,
    local_repo: PathBuf,
    build_root: PathBuf,
    configuration: ConfigurationService,
}

async fn setup() -> Setup {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("srcdeps.yaml");
    std::fs::write(&config_path, CONFIG).unwrap();
    let configuration = ConfigurationService::load(&config_path).await.unwrap();
    Setup {
        local_repo: temp.path().join("m2"),
        build_root: temp.path().join("build"),
        _temp: temp,
        configuration,
    }
}

fn coordinator(setup: &Setup, builder: Arc<InstallingBuild>) -> BuildCoordinator {
    BuildCoordinator::from_configuration_service(
        &setup.configuration,
        Arc::new(LockingBuildDirectories::new(&setup.build_root)),
        builder,
        Arc::new(MavenLocalStore::new(&setup.local_repo)),
    )
}

#[tokio::test]
async fn test_end_to_end_branch_build() {
    let setup = setup().await;
    let builder = Arc::new(InstallingBuild::new(&[("org.example", "foo")]));
    let interceptor = ResolutionInterceptor::new(Arc::new(coordinator(&setup, builder.clone())));
    let coordinate: DependencyCoordinate = "org.example:foo:1.2.3-SRC-branch-main".parse().unwrap();

    let outcome = interceptor.resolve(&coordinate).await.unwrap();
    assert_eq!(outcome, Some(BuildOutcome::Built));
    assert_eq!(builder.builds(), 1);

    let installed = setup.local_repo.join("org/example/foo/1.2.3-SRC-branch-main");
    assert!(installed.join("foo-1.2.3-SRC-branch-main.jar").exists());

    let requests = builder.requests.lock().unwrap().clone();
    let request = &requests[0];
    assert_eq!(request.project_root_directory(), setup.build_root.join("org/example/1.2.3/branch-main"));
    assert_eq!(request.scm_urls(), ["git:https://github.com/example/foo.git"]);
    assert_eq!(
        request.build_arguments(),
        ["-Pfast".to_string(), format!("-Dmaven.repo.local={}", setup.local_repo.display())]
    );
    assert_eq!(request.timeout(), std::time::Duration::from_secs(600));
    assert_eq!(request.forward_properties(), ["SRCDEPS_IT_*"]);

    // A second resolution finds the artifact without building.
    let again = interceptor.resolve(&coordinate).await.unwrap();
    assert_eq!(again, Some(BuildOutcome::AlreadyAvailable));
    assert_eq!(builder.builds(), 1);
}

#[tokio::test]
async fn test_user_local_repository_override_is_kept() {
    let setup = setup().await;
    let other_repo = setup.local_repo.with_file_name("other-m2");
    let mut configuration = (*setup.configuration.configuration()).clone();
    configuration.repositories[0].build_arguments = vec![format!("-Dmaven.repo.local={}", other_repo.display())];
    let service = ConfigurationService::from_configuration(configuration, setup.configuration.location().to_path_buf())
        .unwrap();

    let builder = Arc::new(InstallingBuild::new(&[("org.example", "foo")]));
    let coordinator = BuildCoordinator::from_configuration_service(
        &service,
        Arc::new(LockingBuildDirectories::new(&setup.build_root)),
        builder.clone(),
        Arc::new(MavenLocalStore::new(&setup.local_repo)),
    );

    // The build installs elsewhere, so the coordinator's store never sees it.
    let outcome = coordinator.build_if_necessary("org.example", "foo", "1.0-SRC-tag-v1.0").await.unwrap();
    assert_eq!(outcome, BuildOutcome::Inconsistent);
    assert!(other_repo.join("org/example/foo/1.0-SRC-tag-v1.0").is_dir());

    let requests = builder.requests.lock().unwrap().clone();
    let overrides: Vec<_> =
        requests[0].build_arguments().iter().filter(|a| a.starts_with(LOCAL_REPO_OVERRIDE_PREFIX)).collect();
    assert_eq!(overrides.len(), 1);
}

#[tokio::test]
async fn test_inconsistency_reported_once_without_error() {
    let setup = setup().await;
    // Builds the wrong artifact.
    let builder = Arc::new(InstallingBuild::new(&[("org.example", "bar")]));
    let coordinator = coordinator(&setup, builder.clone());
    let events = CapturedEvents::new();
    let _guard = events.set_default();

    let outcome = coordinator.build_if_necessary("org.example", "foo", "1.0-SRC-revision-abc").await.unwrap();
    assert_eq!(outcome, BuildOutcome::Inconsistent);
    assert_eq!(builder.builds(), 1);
    assert_eq!(events.count(tracing::Level::ERROR, "still not available"), 1);
    assert_eq!(events.count(tracing::Level::ERROR, "org.example:foo:1.0-SRC-revision-abc"), 1);
    assert!(events.messages(tracing::Level::ERROR).iter().all(|m| !m.contains("could not build")));
}

#[tokio::test]
async fn test_selector_with_version_glob() {
    let setup = setup().await;
    let builder = Arc::new(InstallingBuild::new(&[("org.other", "lib")]));
    let coordinator = coordinator(&setup, builder.clone());

    let tagged = coordinator.build_if_necessary("org.other", "lib", "3.0-SRC-tag-v3").await.unwrap();
    assert_eq!(tagged, BuildOutcome::Built);
    let requests = builder.requests.lock().unwrap().clone();
    assert!(!requests[0].skip_tests());

    let err = coordinator.build_if_necessary("org.other", "lib", "3.0-SRC-branch-main").await.unwrap_err();
    assert!(matches!(err, SrcdepsError::RepositoryNotFound { .. }));
}

#[tokio::test]
async fn test_skip_configuration() {
    let setup = setup().await;
    let configuration = Configuration {
        skip: true,
        ..(*setup.configuration.configuration()).clone()
    };
    let service = ConfigurationService::from_configuration(configuration, PathBuf::from("srcdeps.yaml")).unwrap();
    let builder = Arc::new(InstallingBuild::new(&[("org.example", "foo")]));
    let coordinator = BuildCoordinator::from_configuration_service(
        &service,
        Arc::new(LockingBuildDirectories::new(&setup.build_root)),
        builder.clone(),
        Arc::new(MavenLocalStore::new(&setup.local_repo)),
    );

    let outcome = coordinator.build_if_necessary("org.example", "foo", "1.0-SRC-branch-main").await.unwrap();
    assert_eq!(outcome, BuildOutcome::Skipped);
    assert_eq!(builder.builds(), 0);
    assert!(!setup.build_root.exists(), "no workspace may be created when skipping");
}

#[tokio::test]
async fn test_present_artifact_takes_no_lock() {
    let setup = setup().await;
    let store = MavenLocalStore::new(&setup.local_repo);
    std::fs::create_dir_all(store.version_directory("org.example", "foo", "1.0-SRC-branch-main")).unwrap();
    assert!(store.contains("org.example", "foo", "1.0-SRC-branch-main"));

    let builder = Arc::new(InstallingBuild::new(&[("org.example", "foo")]));
    let coordinator = coordinator(&setup, builder.clone());

    let outcome = coordinator.build_if_necessary("org.example", "foo", "1.0-SRC-branch-main").await.unwrap();
    assert_eq!(outcome, BuildOutcome::AlreadyAvailable);
    assert_eq!(builder.builds(), 0);
    assert!(!Path::new(&setup.build_root).exists());
}
