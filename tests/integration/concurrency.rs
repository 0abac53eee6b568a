//! Concurrent resolution: one build per workspace, parallel builds across workspaces.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::Barrier;

use srcdeps::config::Configuration;
use srcdeps::coordinator::{BuildCoordinator, BuildOutcome};
use srcdeps::core::DependencyCoordinate;
use srcdeps::resolver::ResolutionInterceptor;
use srcdeps::test_utils::{
    CountingDirectories, FakeBuildService, InMemoryStore, StubFinder, init_test_logging, sample_repository,
};
use srcdeps::workspace::LockingBuildDirectories;

struct Harness {
    _temp: TempDir,
    builder: Arc<FakeBuildService>,
    directories: Arc<CountingDirectories<LockingBuildDirectories>>,
    coordinator: Arc<BuildCoordinator>,
}

fn harness(builder: impl FnOnce(Arc<InMemoryStore>) -> FakeBuildService) -> Harness {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let store = Arc::new(InMemoryStore::new());
    let builder = Arc::new(builder(store.clone()));
    let directories = Arc::new(CountingDirectories::new(LockingBuildDirectories::new(temp.path())));
    let coordinator = Arc::new(BuildCoordinator::new(
        Arc::new(Configuration::default()),
        "srcdeps.yaml",
        Arc::new(StubFinder::returning(sample_repository("org.example", &["org.example"]))),
        directories.clone(),
        builder.clone(),
        store,
    ));
    Harness {
        _temp: temp,
        builder,
        directories,
        coordinator,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_coordinate_is_built_once() {
    let h = harness(|store| {
        FakeBuildService::installing(store, "org.example", "foo").with_delay(Duration::from_millis(300))
    });
    let callers = 4;
    let barrier = Arc::new(Barrier::new(callers));

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let coordinator = h.coordinator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator.build_if_necessary("org.example", "foo", "1.2.3-SRC-branch-main").await
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(h.builder.builds(), 1);
    assert_eq!(h.builder.max_in_flight(), 1);
    assert_eq!(outcomes.iter().filter(|o| **o == BuildOutcome::Built).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| **o == BuildOutcome::BuiltConcurrently).count(), callers - 1);
    assert_eq!(h.directories.opens(), callers);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_versions_build_in_parallel() {
    let h = harness(|store| {
        FakeBuildService::installing(store, "org.example", "foo").with_delay(Duration::from_millis(400))
    });
    let barrier = Arc::new(Barrier::new(2));

    let start = Instant::now();
    let handles: Vec<_> = ["1.0-SRC-branch-main", "1.0-SRC-tag-v1.0"]
        .into_iter()
        .map(|version| {
            let coordinator = h.coordinator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator.build_if_necessary("org.example", "foo", version).await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), BuildOutcome::Built);
    }

    assert_eq!(h.builder.builds(), 2);
    assert_eq!(h.builder.max_in_flight(), 2);
    assert!(start.elapsed() < Duration::from_millis(750), "builds did not overlap: {:?}", start.elapsed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_reference_different_base_versions_build_in_parallel() {
    let h = harness(|store| {
        FakeBuildService::installing(store, "org.example", "foo").with_delay(Duration::from_millis(400))
    });
    let barrier = Arc::new(Barrier::new(2));

    let start = Instant::now();
    let handles: Vec<_> = ["1.0-SRC-branch-main", "2.0-SRC-branch-main"]
        .into_iter()
        .map(|version| {
            let coordinator = h.coordinator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                coordinator.build_if_necessary("org.example", "foo", version).await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), BuildOutcome::Built);
    }

    assert_eq!(h.builder.builds(), 2);
    assert_eq!(h.builder.max_in_flight(), 2);
    assert!(start.elapsed() < Duration::from_millis(750), "builds did not overlap: {:?}", start.elapsed());

    let mut workspaces: Vec<_> =
        h.builder.requests().iter().map(|r| r.project_root_directory().to_path_buf()).collect();
    workspaces.sort();
    workspaces.dedup();
    assert_eq!(workspaces.len(), 2);
    assert!(workspaces.iter().any(|w| w.ends_with("org/example/1.0/branch-main")));
    assert!(workspaces.iter().any(|w| w.ends_with("org/example/2.0/branch-main")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interceptor_mixed_batch() {
    let h = harness(|store| {
        FakeBuildService::installing(store, "org.example", "foo")
            .also_installing("org.example", "foo-api")
            .with_delay(Duration::from_millis(100))
    });
    let interceptor = ResolutionInterceptor::new(h.coordinator.clone());

    // foo and foo-api share a repository and version, so they share a workspace:
    // one build installs both.
    let coordinates: Vec<DependencyCoordinate> = [
        "org.example:foo:2.0-SRC-branch-release",
        "org.example:foo-api:2.0-SRC-branch-release",
        "org.example:plain:2.0",
    ]
    .iter()
    .map(|c| c.parse().unwrap())
    .collect();

    let results = interceptor.intercept_all(coordinates, 4).await;
    let outcomes: Vec<_> = results.into_iter().map(|(_, r)| r.unwrap()).collect();

    assert_eq!(h.builder.builds(), 1);
    assert_eq!(outcomes[2], None);
    let built: Vec<_> = outcomes[..2].iter().map(|o| o.clone().unwrap()).collect();
    assert!(built.contains(&BuildOutcome::Built));
    assert!(built.iter().all(BuildOutcome::is_available));
}
