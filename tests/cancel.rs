mod utils;

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use agendo::{CancelOutcome, GoalStatus, RecordStore};
    use serde_json::json;

    use crate::utils::{init_tracing, registry};

    #[tokio::test]
    async fn preempt_roundtrip() {
        init_tracing();
        let (store, registry) = registry();

        let server = registry.server("k").unwrap();
        server.register_goal_callback(|_| {});

        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let worker = Arc::clone(&server);
        server.register_preempt_callback(move |cancel| {
            *sink.lock().unwrap() = Some(cancel.goal_id.clone());
            worker.preempt(json!({"reason": "superseded"})).unwrap();
        });

        let client = registry.client("k");
        let goal_id = client.send_goal(json!({"task": "x"})).await.unwrap();

        let outcome = client.cancel_goal().unwrap();
        assert_eq!(
            outcome,
            CancelOutcome::Requested {
                goal_id: goal_id.clone()
            }
        );
        assert_eq!(seen.lock().unwrap().clone(), Some(goal_id));

        let record = store.read("k").unwrap();
        assert_eq!(record.status, GoalStatus::Preempted);
        assert!(!record.is_preempt_requested, "flag is cleared by the preempt");
        assert_eq!(record.result, json!({"reason": "superseded"}));
    }

    #[test]
    fn cancel_without_outstanding_goal_is_a_noop() {
        init_tracing();
        let (store, registry) = registry();

        registry.server("k").unwrap();
        let before = store.read("k").unwrap();

        let client = registry.client("k");
        assert_eq!(
            client.cancel_goal().unwrap(),
            CancelOutcome::NoActiveGoal {
                current: GoalStatus::Succeeded
            }
        );
        assert_eq!(store.read("k").unwrap(), before);
    }

    #[tokio::test]
    async fn unhonored_cancel_leaves_the_flag_raised() {
        init_tracing();
        let (store, registry) = registry();

        let server = registry.server("k").unwrap();
        // no preempt callback registered: nobody honors the request
        server.register_goal_callback(|_| {});

        let client = registry.client("k");
        client.send_goal(json!({"task": "x"})).await.unwrap();
        client.cancel_goal().unwrap();

        let record = store.read("k").unwrap();
        assert_eq!(record.status, GoalStatus::Active);
        assert!(record.is_preempt_requested);
    }

    #[tokio::test]
    async fn flag_stays_stale_when_goal_succeeds_instead() {
        init_tracing();
        let (store, registry) = registry();

        let server = registry.server("k").unwrap();
        server.register_goal_callback(|_| {});

        let client = registry.client("k");
        client.send_goal(json!({"task": "x"})).await.unwrap();
        client.cancel_goal().unwrap();

        server.succeed(json!({"ok": true})).unwrap();
        let record = store.read("k").unwrap();
        assert_eq!(record.status, GoalStatus::Succeeded);
        assert!(
            record.is_preempt_requested,
            "only the preempt transition clears the flag"
        );
    }
}
