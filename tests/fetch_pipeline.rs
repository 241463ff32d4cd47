//! End-to-end tests of the cache → retry → transport pipeline against a mock upstream.

use std::time::{Duration, Instant};

use futures_util::future::join_all;
use profile_aggregator::profile::{ProfileService, ResourceClient};
use profile_aggregator::upstream::{FetchError, ResourceKind, UpstreamError};

mod common;
use common::{repos_json, test_config, user_json, MockUpstream, REPOS_PATH, USER_PATH};

fn client_for(upstream: &MockUpstream) -> ResourceClient {
    ResourceClient::from_config(&test_config(&upstream.base_url())).unwrap()
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_upstream_call() {
    let upstream = MockUpstream::start(|_, _| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        (200, user_json("octocat"))
    })
    .await;
    let client = client_for(&upstream);

    let results = join_all((0..10).map(|_| client.fetch_user("octocat"))).await;

    assert_eq!(upstream.hits(USER_PATH), 1);
    for result in results {
        assert_eq!(result.unwrap().login, "octocat");
    }
}

#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let upstream = MockUpstream::start(|_, _| async { (200, user_json("octocat")) }).await;
    let mut config = test_config(&upstream.base_url());
    config.cache.user_ttl_ms = 200;
    let client = ResourceClient::from_config(&config).unwrap();

    client.fetch_user("octocat").await.unwrap();
    client.fetch_user("octocat").await.unwrap();
    assert_eq!(upstream.hits(USER_PATH), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    client.fetch_user("octocat").await.unwrap();
    assert_eq!(upstream.hits(USER_PATH), 2);
}

#[tokio::test]
async fn test_rate_limited_once_then_success() {
    let upstream = MockUpstream::start(|_, hit| async move {
        if hit == 1 {
            (429, r#"{"message":"rate limited"}"#.to_string())
        } else {
            (200, user_json("octocat"))
        }
    })
    .await;
    let client = client_for(&upstream);

    let profile = client.fetch_user("octocat").await.unwrap();

    assert_eq!(profile.login, "octocat");
    assert_eq!(upstream.hits(USER_PATH), 2);
}

#[tokio::test]
async fn test_rate_limited_until_exhausted() {
    let upstream =
        MockUpstream::start(|_, _| async { (429, r#"{"message":"slow down"}"#.to_string()) })
            .await;
    let client = client_for(&upstream);

    let err = client.fetch_repos("octocat").await.unwrap_err();

    assert_eq!(upstream.hits(REPOS_PATH), 4);
    match err {
        FetchError::Exhausted {
            kind,
            identifier,
            attempts,
            last,
        } => {
            assert_eq!(kind, ResourceKind::Repos);
            assert_eq!(identifier, "octocat");
            assert_eq!(attempts, 4);
            assert!(matches!(last, UpstreamError::RateLimited { .. }));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let upstream =
        MockUpstream::start(|_, _| async { (404, r#"{"message":"Not Found"}"#.to_string()) })
            .await;
    let client = client_for(&upstream);

    let err = client.fetch_user("octocat").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(upstream.hits(USER_PATH), 1);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let upstream = MockUpstream::start(|_, hit| async move {
        if hit == 1 {
            (500, "{}".to_string())
        } else {
            (200, user_json("octocat"))
        }
    })
    .await;
    let client = client_for(&upstream);

    assert!(matches!(
        client.fetch_user("octocat").await,
        Err(FetchError::Upstream(UpstreamError::ServerError { status: 500, .. }))
    ));
    assert_eq!(upstream.hits(USER_PATH), 1);

    client.fetch_user("octocat").await.unwrap();
    assert_eq!(upstream.hits(USER_PATH), 2);
}

#[tokio::test]
async fn test_undecodable_body_is_reported_and_not_cached() {
    let upstream = MockUpstream::start(|_, _| async { (200, "not json".to_string()) }).await;
    let client = client_for(&upstream);

    for _ in 0..2 {
        assert!(matches!(
            client.fetch_user("octocat").await,
            Err(FetchError::Decode {
                kind: ResourceKind::User,
                ..
            })
        ));
    }
    assert_eq!(upstream.hits(USER_PATH), 2);
}

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ResourceClient::from_config(&test_config(&format!("http://{addr}"))).unwrap();
    let err = client.fetch_user("octocat").await.unwrap_err();

    match err {
        FetchError::Exhausted { attempts, last, .. } => {
            assert_eq!(attempts, 4);
            assert!(matches!(last, UpstreamError::TransportFailure { .. }));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_aggregate_combines_both_resources() {
    let upstream = MockUpstream::start(|path, _| async move {
        if path == REPOS_PATH {
            (200, repos_json(&["hello-world", "spoon-knife"]))
        } else {
            (200, user_json("octocat"))
        }
    })
    .await;
    let service = ProfileService::new(client_for(&upstream));

    let aggregate = service.fetch_user_with_repos("octocat").await.unwrap();

    assert_eq!(aggregate.profile.login, "octocat");
    assert_eq!(aggregate.profile.location.as_deref(), Some("San Francisco"));
    let names: Vec<_> = aggregate.repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["hello-world", "spoon-knife"]);
}

#[tokio::test]
async fn test_repos_stay_cached_when_user_lookup_fails() {
    let upstream = MockUpstream::start(|path, _| async move {
        if path == REPOS_PATH {
            (200, repos_json(&["hello-world"]))
        } else {
            (500, r#"{"message":"boom"}"#.to_string())
        }
    })
    .await;
    let service = ProfileService::new(client_for(&upstream));

    let err = service.fetch_user_with_repos("octocat").await.unwrap_err();
    match err {
        FetchError::Upstream(UpstreamError::ServerError { kind, status, .. }) => {
            assert_eq!(kind, ResourceKind::User);
            assert_eq!(status, 500);
        }
        other => panic!("expected the user lookup's error, got {other:?}"),
    }
    assert_eq!(upstream.hits(REPOS_PATH), 1);

    let repos = service.client().fetch_repos("octocat").await.unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(upstream.hits(REPOS_PATH), 1);
}

#[tokio::test]
async fn test_dual_failure_reports_user_error() {
    let upstream = MockUpstream::start(|path, _| async move {
        if path == REPOS_PATH {
            (500, "{}".to_string())
        } else {
            // Fails later than the repos branch.
            tokio::time::sleep(Duration::from_millis(100)).await;
            (404, "{}".to_string())
        }
    })
    .await;
    let service = ProfileService::new(client_for(&upstream));

    let err = service.fetch_user_with_repos("octocat").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.kind(), Some(ResourceKind::User));
}

#[tokio::test]
async fn test_lookups_run_concurrently() {
    let upstream = MockUpstream::start(|path, _| async move {
        tokio::time::sleep(Duration::from_millis(600)).await;
        if path == REPOS_PATH {
            (200, repos_json(&["hello-world"]))
        } else {
            (200, user_json("octocat"))
        }
    })
    .await;
    let service = ProfileService::new(client_for(&upstream));

    let start = Instant::now();
    service.fetch_user_with_repos("octocat").await.unwrap();
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_millis(1100),
        "aggregate took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_invalidate_forces_reload() {
    let upstream = MockUpstream::start(|_, _| async { (200, user_json("octocat")) }).await;
    let client = client_for(&upstream);

    client.fetch_user("octocat").await.unwrap();
    assert!(client.user_cache().peek("octocat").is_some());

    assert!(client.user_cache().invalidate("octocat"));
    assert!(client.user_cache().peek("octocat").is_none());

    client.fetch_user("octocat").await.unwrap();
    assert_eq!(upstream.hits(USER_PATH), 2);
}

#[tokio::test]
async fn test_identifiers_are_path_encoded() {
    let upstream = MockUpstream::start(|_, _| async { (404, "{}".to_string()) }).await;
    let client = client_for(&upstream);

    let _ = client.fetch_user("a b").await;

    assert_eq!(upstream.hits("/users/a%20b"), 1);
}
