//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 限时分发性质测试（mock operation，暂停时钟）
//! - 长时间重复运行的泄漏测试
//! - HTTP e2e 测试（wiremock）

#[cfg(test)]
mod contract_tests {
    use contracts::{Completion, DispatchSummary, OperationError, WorkFailure, WorkItem};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_failure_snapshot() {
        let failure = WorkFailure::Operation(OperationError::status(503, "https://a.test/"));
        let json = serde_json_snapshot(&failure);
        assert_eq!(
            json,
            r#"{"operation":{"kind":"status","code":503,"url":"https://a.test/"}}"#
        );

        let invalid = WorkFailure::invalid_item(&WorkItem::new(""), "descriptor is blank");
        assert_eq!(
            serde_json_snapshot(&invalid),
            r#"{"invalid_work_item":{"item":"","reason":"descriptor is blank"}}"#
        );
    }

    #[test]
    fn test_summary_missing() {
        let summary = DispatchSummary {
            expected: 3,
            collected: 2,
            successes: 2,
            failures: 0,
            completion: Completion::DeadlineExpired,
            elapsed: std::time::Duration::from_millis(100),
        };
        assert_eq!(summary.missing(), 1);
        assert!(summary.timed_out());
    }

    fn serde_json_snapshot<T: serde::Serialize>(value: &T) -> String {
        serde_json::to_string(value).unwrap()
    }
}

#[cfg(test)]
mod dispatch_properties {
    use std::collections::HashSet;
    use std::time::Duration;

    use contracts::{DeadlinePolicy, OperationError, WorkFailure, WorkItem};
    use dispatcher::{from_fn, DispatchError, Dispatcher, MockBehavior, MockOperation};
    use tokio::time::Instant;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn items(names: &[&str]) -> Vec<WorkItem> {
        names.iter().map(|n| WorkItem::new(*n)).collect()
    }

    /// A=10ms, B=20ms, C=10s
    fn abc_mock() -> MockOperation {
        MockOperation::new("abc")
            .on("A", MockBehavior::succeed_after(ms(10)))
            .on("B", MockBehavior::succeed_after(ms(20)))
            .on("C", MockBehavior::succeed_after(ms(10_000)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_generous_timeout_collects_every_item_once() {
        let names: Vec<String> = (0..50).map(|i| format!("item-{i}")).collect();
        let mut op = MockOperation::new("mock");
        for (i, name) in names.iter().enumerate() {
            op = op.on(name.as_str(), MockBehavior::succeed_after(ms(i as u64 % 7 * 3)));
        }
        let list: Vec<WorkItem> = names.iter().map(WorkItem::new).collect();

        let results = Dispatcher::new(op).dispatch(list, ms(10_000)).await.unwrap();

        assert!(results.is_complete());
        assert_eq!(results.len(), 50);
        let positions: HashSet<usize> = results.positions().collect();
        assert_eq!(positions.len(), 50);
        assert!(results.iter().all(|o| o.value() == Some(&o.item.to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_timeout_bounds_the_call() {
        let op = MockOperation::new("mock").with_default(MockBehavior::Hang);
        let started = Instant::now();

        let results = Dispatcher::new(op)
            .dispatch(items(&["x", "y", "z"]), ms(40))
            .await
            .unwrap();

        let waited = started.elapsed();
        assert!(waited >= ms(40) && waited < ms(45), "waited {waited:?}");
        assert!(results.is_empty());
        assert!(results.timed_out());
        assert_eq!(results.missing(), 3);
    }

    #[tokio::test]
    async fn test_empty_list_is_immediate_and_empty() {
        let results = dispatcher::dispatch(MockOperation::new("mock"), Vec::new(), ms(60_000))
            .await
            .unwrap();
        assert!(results.is_empty());
        assert!(results.is_complete());
        assert_eq!(results.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_zero_timeout_is_precondition_error() {
        let dispatcher = Dispatcher::new(MockOperation::new("mock"));
        let err = dispatcher
            .dispatch(items(&["a"]), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTimeout { .. }));
        assert_eq!(dispatcher.metrics().dispatch_count(), 0);
        assert_eq!(dispatcher.metrics().rejected_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_membership_is_stable_across_runs() {
        let dispatcher = Dispatcher::new(abc_mock());

        let first = dispatcher
            .dispatch(items(&["A", "B", "C"]), ms(100))
            .await
            .unwrap();
        let second = dispatcher
            .dispatch(items(&["A", "B", "C"]), ms(100))
            .await
            .unwrap();

        let a: HashSet<_> = first.items().cloned().collect();
        let b: HashSet<_> = second.items().cloned().collect();
        let expected: HashSet<WorkItem> = items(&["A", "B"]).into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a, expected);

        let mut aggregate = observability::DispatchMetricsAggregator::new();
        aggregate.update(&first.summary());
        aggregate.update(&second.summary());
        let summary = aggregate.summary();
        assert_eq!(summary.timed_out_dispatches, 2);
        assert_eq!(summary.total_collected, 4);
        assert_eq!(summary.total_items, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abc_scenario() {
        let started = Instant::now();
        let results = Dispatcher::new(abc_mock())
            .dispatch(items(&["A", "B", "C"]), ms(100))
            .await
            .unwrap();

        assert!(started.elapsed() < ms(105));
        let order: Vec<_> = results.items().map(WorkItem::as_str).collect();
        assert_eq!(order, ["A", "B"]);
        assert!(results.iter().all(|o| o.is_success()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_failure_does_not_affect_siblings() {
        let op = MockOperation::new("mock")
            .with_default(MockBehavior::succeed_after(ms(5)))
            .on("bad", MockBehavior::fail_after(ms(1), "connection reset"));

        let results = Dispatcher::new(op)
            .dispatch(items(&["a", "bad", "c", "d"]), ms(1000))
            .await
            .unwrap();

        assert!(results.is_complete());
        assert_eq!(results.success_count(), 3);
        let failures: Vec<_> = results.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.as_str(), "bad");
        assert!(matches!(failures[0].1, WorkFailure::Operation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closure_operation() {
        let op = from_fn("double", |item: WorkItem| async move {
            match item.as_str().parse::<u64>() {
                Ok(n) => {
                    tokio::time::sleep(Duration::from_millis(n)).await;
                    Ok(n * 2)
                }
                Err(_) => Err(OperationError::payload(format!("not a number: {item}"))),
            }
        });
        let dispatcher = Dispatcher::builder(op)
            .timeout(ms(50))
            .deadline_policy(DeadlinePolicy::Cancel)
            .build()
            .unwrap();

        let results = dispatcher
            .dispatch_default(items(&["10", "x", "20", "80"]))
            .await
            .unwrap();

        let mut values: Vec<u64> = results.successes().map(|(_, v)| *v).collect();
        values.sort();
        assert_eq!(values, [20, 40]);
        assert_eq!(results.failure_count(), 1);
        assert_eq!(results.missing(), 1);
    }
}

#[cfg(test)]
mod leak_tests {
    use std::time::Duration;

    use contracts::{DeadlinePolicy, WorkItem};
    use dispatcher::{Dispatcher, MockBehavior, MockOperation};

    const ROUNDS: usize = 10_000;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn items() -> Vec<WorkItem> {
        ["A", "B", "C"].into_iter().map(WorkItem::new).collect()
    }

    /// Repeated timed-out dispatches must not accumulate live workers
    #[tokio::test(start_paused = true)]
    async fn test_cancel_policy_repeated_timeouts_leave_no_workers() {
        let op = MockOperation::new("leak")
            .on("A", MockBehavior::succeed_after(ms(1)))
            .on("B", MockBehavior::succeed_after(ms(2)))
            .on("C", MockBehavior::Hang);
        let stats = op.stats();
        let dispatcher = Dispatcher::new(op);

        for _ in 0..ROUNDS {
            let results = dispatcher.dispatch(items(), ms(10)).await.unwrap();
            assert_eq!(results.len(), 2);
        }

        // Let the last round's cancelled worker unwind
        tokio::time::sleep(ms(1)).await;

        let metrics = dispatcher.metrics_snapshot();
        assert_eq!(metrics.active_workers, 0);
        assert!(metrics.peak_active_workers <= 4, "peak {}", metrics.peak_active_workers);
        assert_eq!(metrics.timeout_count, ROUNDS as u64);
        assert_eq!(metrics.cancelled_count, ROUNDS as u64);
        assert_eq!(stats.open_resources(), 0);
    }

    /// Abandoned stragglers finish on their own and never block on publish
    #[tokio::test(start_paused = true)]
    async fn test_abandon_policy_stragglers_stay_bounded() {
        let op = MockOperation::new("leak")
            .on("A", MockBehavior::succeed_after(ms(1)))
            .on("B", MockBehavior::succeed_after(ms(2)))
            .on("C", MockBehavior::succeed_after(ms(15)));
        let stats = op.stats();
        let dispatcher = Dispatcher::builder(op)
            .deadline_policy(DeadlinePolicy::Abandon)
            .build()
            .unwrap();

        for _ in 0..ROUNDS {
            let results = dispatcher.dispatch(items(), ms(10)).await.unwrap();
            assert_eq!(results.len(), 2);
        }

        tokio::time::sleep(ms(100)).await;

        let metrics = dispatcher.metrics_snapshot();
        assert_eq!(metrics.active_workers, 0);
        assert!(metrics.peak_active_workers <= 4, "peak {}", metrics.peak_active_workers);
        assert_eq!(metrics.published_count, 3 * ROUNDS as u64);
        assert_eq!(metrics.collected_count, 2 * ROUNDS as u64);
        assert_eq!(stats.completed(), 3 * ROUNDS as u64);
        assert_eq!(stats.open_resources(), 0);
    }
}

#[cfg(test)]
mod http_e2e {
    use std::time::{Duration, Instant};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{OperationError, WorkFailure, WorkItem};
    use dispatcher::{create_dispatcher, Dispatcher, HttpOperation};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with_latencies() -> MockServer {
        let server = MockServer::start().await;
        for (route, delay) in [("/a", 10), ("/b", 30), ("/c", 2_000)] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(route)
                        .set_delay(Duration::from_millis(delay)),
                )
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_http_fanout_returns_fast_responses_within_deadline() {
        let server = server_with_latencies().await;
        let items: Vec<WorkItem> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| WorkItem::new(format!("{}{}", server.uri(), p)))
            .collect();

        let dispatcher = Dispatcher::new(HttpOperation::new("http_get").unwrap());
        let started = Instant::now();
        let results = dispatcher
            .dispatch(items, Duration::from_millis(500))
            .await
            .unwrap();
        let waited = started.elapsed();

        assert!(waited >= Duration::from_millis(500), "waited {waited:?}");
        assert!(waited < Duration::from_millis(1_500), "waited {waited:?}");
        assert!(results.timed_out());
        assert_eq!(results.len(), 2);
        for (_, response) in results.successes() {
            assert_eq!(response.status, 200);
            assert_eq!(response.body_bytes, 2);
        }
    }

    #[tokio::test]
    async fn test_config_driven_fanout() {
        let server = server_with_latencies().await;
        let toml = format!(
            r#"
[dispatcher]
timeout_ms = 1000
max_concurrency = 2

[http]
request_timeout_ms = 800

[[targets]]
url = "{uri}/a"

[[targets]]
url = "{uri}/missing"

[[targets]]
url = "{uri}/b"

[[targets]]
url = "not-a-url"
"#,
            uri = server.uri()
        );
        let blueprint = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        let operation = HttpOperation::from_config("http_get", &blueprint.http).unwrap();
        let dispatcher = create_dispatcher(operation, blueprint.dispatcher.clone()).unwrap();
        let results = dispatcher
            .dispatch_default(blueprint.work_items())
            .await
            .unwrap();

        assert!(results.is_complete());
        assert_eq!(results.success_count(), 2);
        assert_eq!(results.failure_count(), 2);

        let mut saw_status = false;
        let mut saw_invalid = false;
        for (item, reason) in results.failures() {
            match reason {
                WorkFailure::Operation(OperationError::Status { code: 404, .. }) => {
                    assert!(item.as_str().ends_with("/missing"));
                    saw_status = true;
                }
                WorkFailure::InvalidWorkItem { .. } => {
                    assert_eq!(item.as_str(), "not-a-url");
                    saw_invalid = true;
                }
                other => panic!("unexpected failure: {other}"),
            }
        }
        assert!(saw_status && saw_invalid);
    }
}
