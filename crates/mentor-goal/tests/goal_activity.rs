// goal_activity.rs — GoalStore against the in-memory gateway with an
// activity log attached.

use std::fs;
use std::sync::Arc;

use mentor_gateway::{MemoryGateway, StaticSuggestions};
use mentor_goal::{EventDispatcher, GoalDraft, GoalEvent, GoalStore, LogSink, Priority};
use mentor_session::SessionStore;
use tempfile::tempdir;
use uuid::Uuid;

fn store_with_log(path: &std::path::Path) -> GoalStore {
    let signed_in = MemoryGateway::session_for(Uuid::new_v4());
    let memory = Arc::new(MemoryGateway::new().with_session(signed_in.clone()));
    let session = SessionStore::new();
    session.set_session(Some(signed_in));
    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_sink(Box::new(LogSink::new(path)));
    GoalStore::new(
        memory,
        session,
        Arc::new(StaticSuggestions::titles(["Stretch", "Jog"])),
    )
    .with_events(dispatcher)
}

fn read_events(path: &std::path::Path) -> Vec<GoalEvent> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn confirmed_changes_are_logged_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("activity.jsonl");
    let store = store_with_log(&path);

    let goal = store
        .add_goal(GoalDraft::new("Run a 10k").priority(Priority::High))
        .await
        .unwrap();
    assert_eq!(goal.priority, Priority::High);
    store.fetch_steps(goal.id).await.unwrap();
    store.generate_and_add_steps(&goal).await.unwrap();
    let step = store.add_step(goal.id, "Sign up for a race").await.unwrap();
    store.delete_step(goal.id, step.id).await.unwrap();
    store.toggle_complete(goal.id, true).await.unwrap();
    store.delete_goal(goal.id).await.unwrap();

    let types: Vec<&str> = read_events(&path)
        .iter()
        .map(GoalEvent::event_type)
        .collect();
    assert_eq!(
        types,
        vec![
            "goal_created",
            "steps_generated",
            "step_added",
            "step_deleted",
            "goal_completion_changed",
            "goal_deleted",
        ]
    );
    assert!(read_events(&path).iter().all(|e| e.goal_id() == goal.id));
}

#[tokio::test]
async fn failed_operations_are_not_logged() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("activity.jsonl");
    let store = store_with_log(&path);

    assert!(store.add_goal(GoalDraft::new("")).await.is_err());
    assert!(store.toggle_complete(Uuid::new_v4(), true).await.is_err());

    assert!(!path.exists());
}

#[tokio::test]
async fn concurrent_operations_share_one_loading_flag() {
    let dir = tempdir().unwrap();
    let store = store_with_log(&dir.path().join("activity.jsonl"));

    let (a, b) = tokio::join!(
        store.add_goal(GoalDraft::new("Read 12 books")),
        store.add_goal(GoalDraft::new("Learn to swim")),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let state = store.snapshot();
    assert!(!state.loading);
    assert_eq!(state.goals.len(), 2);
    assert!(state.goal(a.id).is_some());
    assert!(state.goal(b.id).is_some());

    let goals = store.fetch_goals().await.unwrap();
    assert!(goals[0].created_at >= goals[1].created_at);
}
