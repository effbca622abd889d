#![cfg(test)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;

use super::{run_match, MatchError, MatchOptions};
use crate::agent::Agent;
use crate::events::MatchEvent;
use crate::hashing::commit_seed;
use crate::test_utils::{FailingAgent, FixedJsonAgent, PickConfig, PickGame, SleepyAgent};

fn fixed(id: &str, action: serde_json::Value) -> Arc<dyn Agent> {
    Arc::new(FixedJsonAgent::new(id, action))
}

/// Event stream with volatile timing fields zeroed, for purity comparisons.
fn normalized(events: &[MatchEvent]) -> Vec<MatchEvent> {
    events
        .iter()
        .map(|event| match event.clone() {
            MatchEvent::MatchStart {
                match_id,
                started_at: _,
                game_id,
                game_version,
                agents,
                seed_commit,
                config,
                events,
            } => MatchEvent::MatchStart {
                match_id,
                started_at: chrono::DateTime::<chrono::Utc>::MIN_UTC,
                game_id,
                game_version,
                agents,
                seed_commit,
                config,
                events,
            },
            MatchEvent::Turn {
                turn_index,
                player_index,
                observation_hash,
                action,
                timing_ms: _,
                timed_out,
                illegal_action,
                original_action,
                events,
            } => MatchEvent::Turn {
                turn_index,
                player_index,
                observation_hash,
                action,
                timing_ms: 0,
                timed_out,
                illegal_action,
                original_action,
                events,
            },
            MatchEvent::MatchEnd { seed_reveal, results, total_turns, total_time_ms: _ } => {
                MatchEvent::MatchEnd { seed_reveal, results, total_turns, total_time_ms: 0 }
            }
        })
        .collect()
}

#[tokio::test]
async fn timed_out_decision_falls_back_to_first_legal_action() {
    let game = PickGame { rounds: 1 };
    let agents: Vec<Arc<dyn Agent>> = vec![
        Arc::new(SleepyAgent::new("slow", Duration::from_secs(10))),
        fixed("fast", json!(2)),
    ];
    let opts = MatchOptions::new("timeout-seed").with_timeout_ms(100);
    let report = run_match(&game, &agents, opts).await.unwrap();

    let MatchEvent::Turn { timed_out, illegal_action, action, .. } = &report.events[1] else {
        panic!("expected first turn event");
    };
    assert!(*timed_out);
    assert!(!*illegal_action);
    assert_eq!(*action, json!(1));
}

#[tokio::test]
async fn illegal_action_is_recorded_and_substituted() {
    let game = PickGame { rounds: 1 };
    let agents: Vec<Arc<dyn Agent>> = vec![fixed("rogue", json!(999)), fixed("ok", json!(2))];
    let report = run_match(&game, &agents, MatchOptions::new("illegal-seed"))
        .await
        .unwrap();

    let MatchEvent::Turn { illegal_action, original_action, action, timed_out, .. } =
        &report.events[1]
    else {
        panic!("expected first turn event");
    };
    assert!(*illegal_action);
    assert!(!*timed_out);
    assert_eq!(*original_action, Some(json!(999)));
    assert_eq!(*action, json!(1));
}

#[tokio::test]
async fn failing_agent_is_treated_as_illegal_action() {
    let game = PickGame { rounds: 1 };
    let agents: Vec<Arc<dyn Agent>> =
        vec![Arc::new(FailingAgent::new("broken")), fixed("ok", json!(3))];
    let report = run_match(&game, &agents, MatchOptions::new("failure-seed"))
        .await
        .unwrap();

    let MatchEvent::Turn { illegal_action, original_action, action, .. } = &report.events[1]
    else {
        panic!("expected first turn event");
    };
    assert!(*illegal_action);
    assert_eq!(*original_action, None);
    assert_eq!(*action, json!(1));
}

#[tokio::test]
async fn equal_scores_produce_a_draw() {
    let game = PickGame { rounds: 1 };
    let agents: Vec<Arc<dyn Agent>> = vec![fixed("a", json!(2)), fixed("b", json!(2))];
    let report = run_match(&game, &agents, MatchOptions::new("draw-seed"))
        .await
        .unwrap();
    assert!(report.results.is_draw);
    assert_eq!(report.results.winner, None);
}

#[tokio::test]
async fn match_is_pure_given_deterministic_agents() {
    let game = PickGame { rounds: 3 };
    let mut streams = Vec::new();
    for _ in 0..2 {
        let agents: Vec<Arc<dyn Agent>> = vec![
            Arc::new(crate::agents::SeededRandomAgent::new("r1")),
            Arc::new(crate::agents::SeededRandomAgent::new("r2")),
        ];
        let mut opts =
            MatchOptions::new("purity-seed").with_config(PickConfig { rng_bonus: true });
        opts.match_id = Some("purity-match".to_string());
        let report = run_match(&game, &agents, opts).await.unwrap();
        streams.push(normalized(&report.events));
    }
    assert_eq!(streams[0], streams[1]);
}

#[tokio::test]
async fn event_stream_is_strictly_ordered() {
    let game = PickGame { rounds: 2 };
    let agents: Vec<Arc<dyn Agent>> = vec![fixed("a", json!(1)), fixed("b", json!(3))];
    let report = run_match(&game, &agents, MatchOptions::new("order-seed"))
        .await
        .unwrap();

    assert!(matches!(report.events.first(), Some(MatchEvent::MatchStart { .. })));
    assert!(matches!(report.events.last(), Some(MatchEvent::MatchEnd { .. })));
    let turn_indices: Vec<u64> = report
        .events
        .iter()
        .filter_map(|e| match e {
            MatchEvent::Turn { turn_index, .. } => Some(*turn_index),
            _ => None,
        })
        .collect();
    assert_eq!(turn_indices, (0..4).collect::<Vec<u64>>());
    assert_eq!(report.total_turns, 4);
    assert_eq!(report.seed_commit, commit_seed("order-seed"));
}

#[tokio::test]
async fn unsupported_player_count_fails_before_any_event() {
    let game = PickGame { rounds: 1 };
    let agents: Vec<Arc<dyn Agent>> = vec![fixed("solo", json!(1))];
    let err = run_match(&game, &agents, MatchOptions::new("bad-count"))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn event_sink_sees_events_in_emission_order() {
    let game = PickGame { rounds: 1 };
    let agents: Vec<Arc<dyn Agent>> = vec![fixed("a", json!(1)), fixed("b", json!(2))];
    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    let mut opts: MatchOptions<PickConfig> = MatchOptions::new("sink-seed");
    opts.event_sink = Some(Box::new(move |event| {
        sink_seen.lock().push(event.event_name());
    }));
    let report = run_match(&game, &agents, opts).await.unwrap();

    let names: Vec<&'static str> = report.events.iter().map(|e| e.event_name()).collect();
    assert_eq!(*seen.lock(), names);
    assert_eq!(names, vec!["MATCH_START", "TURN", "TURN", "MATCH_END"]);
}

#[tokio::test]
async fn observation_hashes_are_present_and_hex() {
    let game = PickGame { rounds: 1 };
    let agents: Vec<Arc<dyn Agent>> = vec![fixed("a", json!(1)), fixed("b", json!(2))];
    let report = run_match(&game, &agents, MatchOptions::new("hash-seed"))
        .await
        .unwrap();
    for event in &report.events {
        if let MatchEvent::Turn { observation_hash, .. } = event {
            assert_eq!(observation_hash.len(), 64);
            assert!(observation_hash.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
