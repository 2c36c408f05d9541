mod utils;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use agendo::{GoalStatus, RecordStore, ResultEvent};
    use serde_json::json;

    use crate::utils::{init_tracing, registry};

    #[test]
    fn fresh_server_parks_the_record_in_succeeded() {
        init_tracing();
        let (store, registry) = registry();

        registry.server("k").unwrap();
        let record = store.read("k").unwrap();
        assert_eq!(record.status, GoalStatus::Succeeded);
        assert!(record.goal_id.is_empty());
    }

    #[tokio::test]
    async fn goal_roundtrip_through_the_record() {
        init_tracing();
        let (_store, registry) = registry();

        let server = registry.server("k").unwrap();
        let worker = Arc::clone(&server);
        server.register_goal_callback(move |goal| {
            assert_eq!(goal.goal, json!({"task": "x"}));
            let transition = worker.succeed(json!({"ok": true})).unwrap();
            assert!(transition.is_applied());
        });

        let client = registry.client("k");
        let goal_id = client.send_goal(json!({"task": "x"})).await.unwrap();

        assert!(client.wait_for_result().await.unwrap());
        assert_eq!(
            client.get_result().unwrap(),
            ResultEvent {
                goal_id,
                status: GoalStatus::Succeeded,
                result: json!({"ok": true}),
            }
        );
    }

    #[tokio::test]
    async fn wait_for_result_suspends_until_server_finishes() {
        init_tracing();
        let (_store, registry) = registry();

        let server = registry.server("k").unwrap();
        // claim the goal but leave it running
        server.register_goal_callback(|_| {});

        let client = registry.client("k");
        let goal_id = client.send_goal(json!({"task": "slow"})).await.unwrap();
        assert_eq!(client.get_result().unwrap().status, GoalStatus::Active);

        let finisher = Arc::clone(&server);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            finisher.succeed(json!({"ok": true})).unwrap();
        });

        let resolved = tokio::time::timeout(Duration::from_secs(5), client.wait_for_result())
            .await
            .expect("wait should resolve once the server succeeds")
            .unwrap();
        assert!(resolved);
        let result = client.get_result().unwrap();
        assert_eq!(result.goal_id, goal_id);
        assert_eq!(result.status, GoalStatus::Succeeded);
    }

    #[tokio::test]
    async fn send_goal_replaces_a_finished_goal() {
        init_tracing();
        let (_store, registry) = registry();

        let server = registry.server("k").unwrap();
        let worker = Arc::clone(&server);
        server.register_goal_callback(move |_| {
            worker.succeed(json!({"ok": true})).unwrap();
        });

        let client = registry.client("k");
        let first = client.send_goal(json!({"n": 1})).await.unwrap();
        let second = client.send_goal(json!({"n": 2})).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(client.get_result().unwrap().goal_id, second);
    }
}
