use super::runner_test_support::*;
use super::*;

#[tokio::test]
async fn choose_then_back_is_a_true_undo() {
    let mut runner = runner_with_flags(&[]);
    runner.start(tavern_dialogue()).await.expect("start");
    runner
        .conversation_flags
        .set("mood", FlagValue::from("wary"));
    let before = runner.serialize().expect("serialize");

    runner.choose(0).await.expect("order ale");
    assert_eq!(current_id(&runner), "bar");
    runner.back().await.expect("back");

    let after = runner.serialize().expect("serialize");
    assert_eq!(after.current_node_id, before.current_node_id);
    assert_eq!(after.conversation_flags, before.conversation_flags);
    assert_eq!(after.history, before.history);
}

#[tokio::test]
async fn back_restores_conversation_flags_but_not_game_flags() {
    let mut runner = runner_with_flags(&[]);
    let log = record_all(&mut runner);
    runner
        .start(dialogue(
            r#"{
  "id": "bribe",
  "startNode": "gate",
  "nodes": {
    "gate": {
      "text": "Halt.",
      "actions": [{"type": "set", "flag": "conv:greeted", "value": true}],
      "choices": [{
        "text": "Bribe",
        "next": "inside",
        "actions": [
          {"type": "set", "flag": "conv:greeted", "value": false},
          {"type": "set", "flag": "conv:bribed", "value": true},
          {"type": "decrement", "flag": "gold", "value": 5}
        ]
      }]
    },
    "inside": {"text": "Go on.", "actions": [{"type": "increment", "flag": "entries"}], "choices": [{"text": "Leave", "next": "gate"}]}
  }
}"#,
        ))
        .await
        .expect("start");
    runner.game_flags().set("gold", FlagValue::Number(20.0));
    runner.choose(0).await.expect("bribe");
    assert_eq!(runner.get_conversation_flags().len(), 2);
    drain(&log);

    let view = runner.back().await.expect("back");
    assert_eq!(current_id(&runner), "gate");
    assert_eq!(current_text(&runner), "Halt.");
    assert_eq!(view.available_choices.len(), 1);

    let flags = runner.get_conversation_flags();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags.get("greeted"), Some(&FlagValue::Bool(true)));
    assert_eq!(runner.game_flags().get("gold"), Some(FlagValue::Number(15.0)));
    assert_eq!(runner.game_flags().get("entries"), Some(FlagValue::Number(1.0)));
    // back re-renders without running node actions.
    assert_eq!(drain(&log), vec!["entered:gate"]);
    assert!(runner.history().is_empty());
}

#[tokio::test]
async fn back_with_empty_history_is_a_no_op() {
    let mut runner = runner_with_flags(&[]);
    runner.start(tavern_dialogue()).await.expect("start");
    let before = runner.serialize().expect("serialize");
    runner.back().await.expect("back");
    assert_eq!(runner.serialize().expect("serialize"), before);
}

#[tokio::test]
async fn back_leaves_the_ended_state() {
    let mut runner = runner_with_flags(&[("n", FlagValue::from("Bob"))]);
    runner.start(greeting_dialogue()).await.expect("start");
    runner.choose(0).await.expect("choose");
    assert!(runner.is_ended());

    runner.back().await.expect("back");
    assert!(!runner.is_ended());
    assert_eq!(current_text(&runner), "Hi Bob");
    runner.choose(0).await.expect("choose again");
}

#[tokio::test]
async fn serialize_start_deserialize_round_trips() {
    let mut runner = runner_with_flags(&[]);
    runner.start(tavern_dialogue()).await.expect("start");
    runner.choose(0).await.expect("order ale");
    let saved = runner.serialize().expect("serialize");
    let node_before = runner.get_current_node().cloned();

    runner.start(tavern_dialogue()).await.expect("start again");
    assert!(runner.history().is_empty());
    let view = runner.deserialize(saved.clone()).await.expect("deserialize");

    assert_eq!(runner.serialize().expect("serialize"), saved);
    assert_eq!(runner.get_current_node().cloned(), node_before);
    assert_eq!(view.available_choices.len(), 1);
    assert_eq!(current_text(&runner), "Ordered: true");
}

#[tokio::test]
async fn serialized_state_is_camel_case_and_excludes_game_flags() {
    let mut runner = runner_with_flags(&[("gold", FlagValue::Number(3.0))]);
    runner.start(tavern_dialogue()).await.expect("start");
    runner.choose(0).await.expect("order ale");

    let value = serde_json::to_value(runner.serialize().expect("serialize")).expect("json");
    assert_eq!(value["dialogueId"], serde_json::json!("tavern"));
    assert_eq!(value["currentNodeId"], serde_json::json!("bar"));
    assert_eq!(value["conversationFlags"], serde_json::json!({"ordered": true}));
    assert_eq!(value["history"][0]["nodeId"], serde_json::json!("door"));
    assert_eq!(value["history"][0]["choiceIndex"], serde_json::json!(0));
    assert!(value["history"][0]["timestamp"].as_i64().is_some());
    assert!(value.get("gameFlags").is_none());
}

#[tokio::test]
async fn deserialize_rejects_bad_states_without_changes() {
    let mut runner = runner_with_flags(&[]);
    runner.start(tavern_dialogue()).await.expect("start");
    runner.choose(0).await.expect("order ale");
    let good = runner.serialize().expect("serialize");

    let mut reserved_position = good.clone();
    reserved_position.current_node_id = "__proto__".to_string();
    let mut unknown_position = good.clone();
    unknown_position.current_node_id = "cellar".to_string();
    let mut reserved_history = good.clone();
    reserved_history.history[0].node_id = "constructor".to_string();
    let mut reserved_flag = good.clone();
    reserved_flag
        .conversation_flags
        .insert("prototype".to_string(), FlagValue::Bool(true));
    let mut reserved_history_flag = good.clone();
    reserved_history_flag.history[0]
        .conversation_flags
        .insert("__proto__".to_string(), FlagValue::Bool(true));

    let cases = [
        (reserved_position, "RUNNER_NODE_RESERVED"),
        (unknown_position, "RUNNER_NODE_UNKNOWN"),
        (reserved_history, "RUNNER_STATE_NODE_RESERVED"),
        (reserved_flag, "RUNNER_STATE_FLAG_RESERVED"),
        (reserved_history_flag, "RUNNER_STATE_FLAG_RESERVED"),
    ];
    for (state, code) in cases {
        let error = runner.deserialize(state).await.expect_err("bad state");
        assert_eq!(error.code, code);
        assert!(error.is_validation());
        assert_eq!(runner.serialize().expect("serialize"), good);
    }
}

#[tokio::test]
async fn deserialize_accepts_state_from_another_dialogue_id() {
    let mut runner = runner_with_flags(&[]);
    runner.start(tavern_dialogue()).await.expect("start");
    let state = SerializedState {
        dialogue_id: "tavern-v0".to_string(),
        current_node_id: "alley".to_string(),
        history: Vec::new(),
        conversation_flags: FlagMap::new(),
    };
    let view = runner.deserialize(state).await.expect("deserialize");
    assert!(view.is_ended);
    assert_eq!(runner.state(), RunnerState::Ended);
}

#[tokio::test]
async fn jump_skips_actions_and_auto_advance() {
    let mut runner = runner_with_flags(&[]);
    let log = record_all(&mut runner);
    runner.start(tavern_dialogue()).await.expect("start");
    runner.choose(0).await.expect("order ale");
    drain(&log);

    let view = runner.jump_to("street").await.expect("jump");
    assert_eq!(current_id(&runner), "street");
    assert!(!view.is_ended);
    assert!(view.available_choices.is_empty());
    assert_eq!(drain(&log), vec!["exited:bar", "entered:street"]);

    let last = runner.history().last().cloned().expect("history entry");
    assert_eq!(last.node_id, "bar");
    assert_eq!(last.choice_index, None);
    assert!(last.choice.is_none());

    runner.jump_to("door").await.expect("jump to door");
    assert_eq!(
        runner.game_flags().get("visits"),
        Some(FlagValue::Number(1.0))
    );

    runner.jump_to("alley").await.expect("jump to end");
    assert!(runner.is_ended());
    assert_eq!(runner.history().len(), 4);

    runner.back().await.expect("back");
    assert_eq!(current_id(&runner), "door");
    assert!(!runner.is_ended());
}

#[tokio::test]
async fn jump_rejects_reserved_and_unknown_targets() {
    let mut runner = runner_with_flags(&[]);
    runner.start(tavern_dialogue()).await.expect("start");

    let reserved = runner.jump_to("__proto__").await.expect_err("reserved");
    assert_eq!(reserved.code, "RUNNER_NODE_RESERVED");
    assert!(reserved.is_validation());
    let unknown = runner.jump_to("cellar").await.expect_err("unknown");
    assert_eq!(unknown.code, "RUNNER_NODE_UNKNOWN");
    assert!(unknown.is_validation());
    assert!(runner.history().is_empty());
    assert_eq!(current_id(&runner), "door");
}

#[tokio::test]
async fn resume_restores_without_running_start_actions() {
    let mut first = runner_with_flags(&[]);
    first.start(tavern_dialogue()).await.expect("start");
    first.choose(0).await.expect("order ale");
    let saved = first.serialize().expect("serialize");

    let mut second = runner_with_flags(&[]);
    let view = second
        .resume(tavern_dialogue(), saved.clone())
        .await
        .expect("resume");
    assert_eq!(current_text(&second), "Ordered: true");
    assert_eq!(view.available_choices.len(), 1);
    assert_eq!(second.serialize().expect("serialize"), saved);
    assert!(second.game_flags().get("visits").is_none());
}

#[tokio::test]
async fn rejected_resume_keeps_the_runner_idle() {
    let mut runner = runner();
    let error = runner
        .resume(
            tavern_dialogue(),
            SerializedState {
                dialogue_id: "tavern".to_string(),
                current_node_id: "cellar".to_string(),
                history: Vec::new(),
                conversation_flags: FlagMap::new(),
            },
        )
        .await
        .expect_err("unknown node");
    assert_eq!(error.code, "RUNNER_NODE_UNKNOWN");
    assert_eq!(runner.state(), RunnerState::Idle);
}

#[tokio::test]
async fn overflowing_counters_still_round_trip_through_json() {
    let mut runner = runner();
    runner
        .start(dialogue(
            r#"{
  "id": "big",
  "startNode": "a",
  "nodes": {
    "a": {
      "text": "A",
      "actions": [
        {"type": "increment", "flag": "conv:k", "value": 1e308},
        {"type": "increment", "flag": "conv:k", "value": 1e308}
      ],
      "choices": [{"text": "on", "next": "b"}]
    },
    "b": {"text": "B", "isEnd": true}
  }
}"#,
        ))
        .await
        .expect("start");

    let saved = runner.serialize().expect("serialize");
    let json = serde_json::to_string(&saved).expect("state json");
    assert!(!json.contains("null"));
    let parsed: SerializedState = serde_json::from_str(&json).expect("state should parse back");
    assert_eq!(parsed.conversation_flags.get("k"), Some(&FlagValue::Number(f64::MAX)));

    runner.deserialize(parsed).await.expect("deserialize");
    assert_eq!(runner.serialize().expect("serialize"), saved);
}

#[tokio::test]
async fn failed_jump_leaves_position_and_history_untouched() {
    let mut runner = DialogueRunner::new(RunnerOptions {
        listener_errors: ListenerErrorPolicy::Abort,
        ..RunnerOptions::default()
    })
    .expect("runner");
    runner.start(greeting_dialogue()).await.expect("start");
    let before = runner.serialize().expect("serialize");
    runner.on(
        EventKind::NodeExited,
        Arc::new(|_event: &DialogueEvent| {
            Err::<(), _>(DialogueError::handler("EXIT_REFUSED", "stay here"))
        }),
    );

    let error = runner.jump_to("e").await.expect_err("listener aborts the jump");
    assert_eq!(error.code, "EXIT_REFUSED");
    assert_eq!(runner.state(), RunnerState::Active);
    assert_eq!(current_id(&runner), "s");
    assert!(runner.history().is_empty());
    assert_eq!(runner.serialize().expect("serialize"), before);
}

#[tokio::test]
async fn deserialize_rejects_history_outside_the_dialogue() {
    let mut runner = runner_with_flags(&[]);
    runner.start(tavern_dialogue()).await.expect("start");
    runner.choose(0).await.expect("order ale");
    let good = runner.serialize().expect("serialize");

    let mut stale = good.clone();
    stale.history[0].node_id = "cellar".to_string();
    let error = runner.deserialize(stale).await.expect_err("stale history");
    assert_eq!(error.code, "RUNNER_STATE_NODE_UNKNOWN");
    assert!(error.is_validation());
    assert_eq!(runner.serialize().expect("serialize"), good);
}
