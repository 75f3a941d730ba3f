mod common;

use chrono::Duration as ChronoDuration;
use common::{GatedGenerator, ScriptedGenerator, ScriptedTransport, t0};
use lure_application::{EligibilityReason, InboundMessage, ReplyOrigin, SessionOrchestrator};
use lure_core::config::EngagementConfig;
use lure_core::conversation::ConversationState;
use lure_core::error::LureError;
use lure_core::intelligence::IntelCategory;
use lure_core::random::ScriptedSource;
use lure_core::reply::{PlatformKind, ReplyGenerator};
use lure_core::report::CallbackStatus;
use lure_core::session::{SessionStatus, SessionStore};
use lure_infrastructure::InMemorySessionStore;
use std::collections::BTreeSet;
use std::sync::Arc;

struct Fixture {
    orchestrator: SessionOrchestrator,
    store: InMemorySessionStore,
    transport: Arc<ScriptedTransport>,
}

fn fixture_with(generator: Arc<dyn ReplyGenerator>, config: EngagementConfig) -> Fixture {
    let store = InMemorySessionStore::new();
    let transport = Arc::new(ScriptedTransport::ok());
    let orchestrator = SessionOrchestrator::new(
        Arc::new(store.clone()),
        transport.clone(),
        generator,
        config,
    )
    // High draws never trigger a probabilistic transition
    .with_draw_source(Arc::new(ScriptedSource::constant(0.99)));
    Fixture {
        orchestrator,
        store,
        transport,
    }
}

fn fixture() -> Fixture {
    fixture_with(
        Arc::new(ScriptedGenerator::new(&["Arre beta, kaun bol raha hai?"])),
        EngagementConfig::default(),
    )
}

fn inbound(session_id: &str, text: &str, minute: i64) -> InboundMessage {
    InboundMessage {
        session_id: session_id.to_string(),
        scam_type: Some("bank_fraud".to_string()),
        platform: PlatformKind::Sms,
        text: text.to_string(),
        timestamp: t0() + ChronoDuration::minutes(minute),
    }
}

#[tokio::test]
async fn test_first_message_creates_session() {
    let f = fixture();

    let first = f
        .orchestrator
        .handle_inbound(inbound("s-1", "Your account is blocked, pay to scammer@ybl", 0))
        .await
        .unwrap();
    let second = f
        .orchestrator
        .handle_inbound(inbound("s-1", "Pay to scammer@ybl now", 1))
        .await
        .unwrap();

    assert!(first.created);
    assert_eq!(first.turn_index, 0);
    assert_eq!(first.state, ConversationState::Initial);
    assert_eq!(first.new_items.len(), 1);
    assert_eq!(first.new_items[0].category, IntelCategory::PaymentIdentifier);

    assert!(!second.created);
    assert_eq!(second.turn_index, 1);
    assert!(second.new_items.is_empty());
    assert_eq!(f.store.len().await, 1);

    let summary = f.orchestrator.summary("s-1").await.unwrap();
    assert_eq!(summary.persona_name, "Shanti Devi");
    assert_eq!(summary.total_turns, 2);
    assert_eq!(summary.intelligence_count, 1);
}

#[tokio::test]
async fn test_untagged_first_message_is_refused() {
    let f = fixture();
    let mut message = inbound("s-1", "hello", 0);
    message.scam_type = None;

    let err = f.orchestrator.handle_inbound(message).await.unwrap_err();

    assert!(matches!(err, LureError::Untagged(ref id) if id == "s-1"));
    assert!(f.store.is_empty().await);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let f = fixture();
    assert!(f.orchestrator.summary("missing").await.unwrap_err().is_not_found());
    assert!(f.orchestrator.kill("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_completed_session_rejects_inbound() {
    let f = fixture();
    f.orchestrator
        .handle_inbound(inbound("s-1", "Pay to scammer@ybl", 0))
        .await
        .unwrap();

    let outcome = f.orchestrator.finalize("s-1").await.unwrap();
    assert_eq!(outcome.status, CallbackStatus::Success);

    let err = f
        .orchestrator
        .handle_inbound(inbound("s-1", "Hello?", 5))
        .await
        .unwrap_err();
    assert!(err.is_state_transition());

    // A repeated finalize returns the cached outcome
    let again = f.orchestrator.finalize("s-1").await.unwrap();
    assert_eq!(again, outcome);
    assert_eq!(f.transport.call_count(), 1);
}

#[tokio::test]
async fn test_kill_forces_conclusion_and_eligibility() {
    let f = fixture();
    f.orchestrator
        .handle_inbound(inbound("s-1", "Pay to scammer@ybl", 0))
        .await
        .unwrap();

    let killed = f.orchestrator.kill("s-1").await.unwrap();
    let transition = killed.transition.unwrap();
    assert_eq!(transition.to, ConversationState::Conclusion);
    assert_eq!(killed.eligibility, Some(EligibilityReason::Killed));

    // Later messages are still recorded but cannot move the state
    let later = f
        .orchestrator
        .handle_inbound(inbound("s-1", "Call me on 9876543210", 1))
        .await
        .unwrap();
    assert_eq!(later.state, ConversationState::Conclusion);
    assert!(later.transition.is_none());
    assert_eq!(later.new_items.len(), 1);

    let again = f.orchestrator.kill("s-1").await.unwrap();
    assert!(again.transition.is_none());

    let summary = f.orchestrator.summary("s-1").await.unwrap();
    assert_eq!(summary.status, SessionStatus::Killed);
}

#[tokio::test]
async fn test_kill_all_reaches_existing_and_new_sessions() {
    let f = fixture();
    for id in ["a", "b"] {
        f.orchestrator
            .handle_inbound(inbound(id, "Pay to scammer@ybl", 0))
            .await
            .unwrap();
    }

    let outcomes = f.orchestrator.kill_all().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.eligibility == Some(EligibilityReason::Killed)));

    let late = f
        .orchestrator
        .handle_inbound(inbound("c", "Hello madam", 0))
        .await
        .unwrap();
    assert!(late.created);
    assert_eq!(late.state, ConversationState::Conclusion);
    assert_eq!(late.eligibility, Some(EligibilityReason::Killed));
}

#[tokio::test]
async fn test_turn_cap_concludes_and_qualifies() {
    let mut config = EngagementConfig::default();
    config.conversation.max_total_turns = 3;
    let f = fixture_with(Arc::new(ScriptedGenerator::new(&["ji?"])), config);

    let mut last = None;
    for minute in 0..3 {
        last = Some(
            f.orchestrator
                .handle_inbound(inbound("s-1", "hello", minute))
                .await
                .unwrap(),
        );
    }
    let last = last.unwrap();

    assert_eq!(last.state, ConversationState::Conclusion);
    assert_eq!(last.eligibility, Some(EligibilityReason::TurnCap));
}

#[tokio::test]
async fn test_accepted_reply_is_attached() {
    let generator = Arc::new(ScriptedGenerator::new(&["Arre beta, kaun bol raha hai?"]));
    let f = fixture_with(generator.clone(), EngagementConfig::default());
    let outcome = f
        .orchestrator
        .handle_inbound(inbound("s-1", "This is bank manager, share OTP", 0))
        .await
        .unwrap();

    let reply = f.orchestrator.compose_reply("s-1", outcome.turn_index).await.unwrap();

    assert_eq!(reply.origin, ReplyOrigin::Generated { attempt: 1 });
    assert_eq!(reply.text, "Arre beta, kaun bol raha hai?");
    assert!(reply.rejections.is_empty());

    let contexts = generator.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].persona_name, "Shanti Devi");
    assert_eq!(contexts[0].inbound, "This is bank manager, share OTP");
    assert_eq!(contexts[0].state, ConversationState::Initial);

    // Each turn takes exactly one reply
    let err = f.orchestrator.compose_reply("s-1", outcome.turn_index).await.unwrap_err();
    assert!(matches!(err, LureError::Internal(_)));
}

#[tokio::test]
async fn test_kill_during_generation_yields_fallback() {
    let generator = Arc::new(GatedGenerator::default());
    let f = fixture_with(generator.clone(), EngagementConfig::default());
    f.orchestrator
        .handle_inbound(inbound("s-1", "Share OTP", 0))
        .await
        .unwrap();

    let operator = async {
        generator.entered.notified().await;
        let killed = f.orchestrator.kill("s-1").await.unwrap();
        generator.release.notify_one();
        killed
    };
    let (reply, killed) = tokio::join!(f.orchestrator.compose_reply("s-1", 0), operator);
    let reply = reply.unwrap();

    assert_eq!(killed.eligibility, Some(EligibilityReason::Killed));
    assert_eq!(reply.origin, ReplyOrigin::Fallback);
    assert_eq!(reply.state, ConversationState::Conclusion);
    assert!(reply.state.tactic().fallback_replies.contains(&reply.text.as_str()));

    let summary = f.orchestrator.summary("s-1").await.unwrap();
    assert_eq!(summary.status, SessionStatus::Killed);
}

#[tokio::test]
async fn test_rejected_candidate_is_regenerated() {
    let generator = Arc::new(ScriptedGenerator::new(&[
        "I am 30 years old, I know these apps",
        "Haan ji, main samajh rahi hoon",
    ]));
    let f = fixture_with(generator.clone(), EngagementConfig::default());
    f.orchestrator
        .handle_inbound(inbound("s-1", "Share OTP", 0))
        .await
        .unwrap();

    let reply = f.orchestrator.compose_reply("s-1", 0).await.unwrap();

    assert_eq!(reply.origin, ReplyOrigin::Generated { attempt: 2 });
    assert_eq!(reply.rejections.len(), 1);
    let contexts = generator.contexts();
    assert_eq!(contexts[1].rejections.len(), 1);
}

#[tokio::test]
async fn test_persistent_contradictions_fall_back_to_safe_reply() {
    let generator = Arc::new(ScriptedGenerator::new(&["I work as an engineer in Mumbai"]));
    let f = fixture_with(generator.clone(), EngagementConfig::default());
    f.orchestrator
        .handle_inbound(inbound("s-1", "Share OTP", 0))
        .await
        .unwrap();

    let reply = f.orchestrator.compose_reply("s-1", 0).await.unwrap();

    assert_eq!(reply.origin, ReplyOrigin::Fallback);
    assert_eq!(reply.rejections.len(), 3);
    assert_eq!(generator.contexts().len(), 3);
    assert!(reply.state.tactic().fallback_replies.contains(&reply.text.as_str()));
}

#[tokio::test]
async fn test_generator_failure_falls_back() {
    let f = fixture_with(Arc::new(ScriptedGenerator::failing()), EngagementConfig::default());
    f.orchestrator
        .handle_inbound(inbound("s-1", "Share OTP", 0))
        .await
        .unwrap();

    let reply = f.orchestrator.compose_reply("s-1", 0).await.unwrap();

    assert_eq!(reply.origin, ReplyOrigin::Fallback);
    assert_eq!(reply.rejections.len(), 1);
}

#[tokio::test]
async fn test_candidate_validation_reports_contradictions() {
    let f = fixture();
    f.orchestrator
        .handle_inbound(inbound("s-1", "hello", 0))
        .await
        .unwrap();

    let err = f
        .orchestrator
        .validate_candidate("s-1", "My wife will send the money")
        .await
        .unwrap_err();
    assert!(err.is_consistency_violation());
    assert!(
        f.orchestrator
            .validate_candidate("s-1", "Beta, my son handles these things")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_unanswered_follow_ups_make_session_eligible() {
    let f = fixture();
    f.orchestrator
        .handle_inbound(inbound("s-1", "Pay to scammer@ybl", 0))
        .await
        .unwrap();

    let mut outcome = None;
    for minute in 1..=3 {
        outcome = Some(
            f.orchestrator
                .record_follow_up("s-1", "Hello ji? Aap wahan ho?", t0() + ChronoDuration::minutes(minute))
                .await
                .unwrap(),
        );
    }
    let outcome = outcome.unwrap();
    assert_eq!(outcome.unanswered, 3);
    assert_eq!(outcome.eligibility, Some(EligibilityReason::AdversarySilent));

    // The adversary answering resets the silence count
    let reply = f
        .orchestrator
        .handle_inbound(inbound("s-1", "Yes madam", 10))
        .await
        .unwrap();
    assert_eq!(reply.eligibility, None);

    let err = f
        .orchestrator
        .record_follow_up("s-1", "I am a man of my word", t0() + ChronoDuration::minutes(11))
        .await
        .unwrap_err();
    assert!(err.is_consistency_violation());
}

#[tokio::test]
async fn test_finalize_if_eligible_waits_for_eligibility() {
    let f = fixture();
    f.orchestrator
        .handle_inbound(inbound("s-1", "Pay to scammer@ybl", 0))
        .await
        .unwrap();

    assert!(f.orchestrator.finalize_if_eligible("s-1").await.unwrap().is_none());
    assert_eq!(f.transport.call_count(), 0);

    f.orchestrator.kill("s-1").await.unwrap();
    let outcome = f.orchestrator.finalize_if_eligible("s-1").await.unwrap().unwrap();
    assert!(outcome.is_success());
    assert_eq!(f.transport.call_count(), 1);
}

#[tokio::test]
async fn test_sweep_expires_skips_busy_and_purges() {
    let f = fixture();
    for id in ["idle", "busy"] {
        f.orchestrator
            .handle_inbound(inbound(id, "Pay to scammer@ybl", 0))
            .await
            .unwrap();
    }

    let busy = f.store.find_by_id("busy").await.unwrap().unwrap();
    let guard = busy.lock().await;
    let first = f
        .orchestrator
        .sweep(t0() + ChronoDuration::minutes(31))
        .await
        .unwrap();
    drop(guard);

    assert_eq!(first.expired, vec!["idle".to_string()]);
    assert_eq!(first.busy, vec!["busy".to_string()]);
    assert!(first.purged.is_empty());

    let summary = f.orchestrator.summary("idle").await.unwrap();
    assert_eq!(summary.status, SessionStatus::Expired);
    assert_eq!(
        f.orchestrator.finalize_if_eligible("idle").await.unwrap().map(|o| o.status),
        Some(CallbackStatus::Success)
    );

    let later = f
        .orchestrator
        .sweep(t0() + ChronoDuration::minutes(31) + ChronoDuration::days(3))
        .await
        .unwrap();
    assert_eq!(later.expired, vec!["busy".to_string()]);
    assert_eq!(later.purged, vec!["idle".to_string()]);
    assert!(f.orchestrator.summary("idle").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_recent_activity_is_not_expired() {
    let f = fixture();
    f.orchestrator
        .handle_inbound(inbound("s-1", "hello", 0))
        .await
        .unwrap();

    let report = f
        .orchestrator
        .sweep(t0() + ChronoDuration::minutes(10))
        .await
        .unwrap();
    assert!(report.expired.is_empty());
    assert_eq!(f.orchestrator.list().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sessions_do_not_share_state() {
    let f = Arc::new(fixture());

    let mut tasks = Vec::new();
    for n in 0..8 {
        let f = f.clone();
        tasks.push(tokio::spawn(async move {
            let id = format!("s-{n}");
            let upi = format!("victim{n}@ybl");
            for minute in 0..3 {
                f.orchestrator
                    .handle_inbound(inbound(&id, &format!("Pay to {upi} now"), minute))
                    .await
                    .unwrap();
            }
            (id, upi)
        }));
    }

    for task in tasks {
        let (id, upi) = task.await.unwrap();
        let handle = f.store.find_by_id(&id).await.unwrap().unwrap();
        let session = handle.lock().await;
        assert_eq!(session.turn_count(), 3);
        let values: Vec<&str> = session
            .intelligence()
            .items()
            .iter()
            .map(|item| item.value.as_str())
            .collect();
        assert_eq!(values, vec![upi.as_str()]);
    }
    assert_eq!(f.orchestrator.list().await.unwrap().len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_messages_on_one_session_are_serialized() {
    let f = Arc::new(fixture());
    let messages = 10;

    let mut tasks = Vec::new();
    for n in 0..messages {
        let f = f.clone();
        tasks.push(tokio::spawn(async move {
            f.orchestrator
                .handle_inbound(inbound("shared", &format!("Message {n}, pay now"), 0))
                .await
                .unwrap()
        }));
    }

    let mut created = 0;
    let mut indices = BTreeSet::new();
    for task in tasks {
        let outcome = task.await.unwrap();
        if outcome.created {
            created += 1;
        }
        assert!(indices.insert(outcome.turn_index), "duplicate turn {}", outcome.turn_index);
    }

    assert_eq!(created, 1);
    assert_eq!(indices, (0..messages).collect::<BTreeSet<u32>>());
    let handle = f.store.find_by_id("shared").await.unwrap().unwrap();
    assert_eq!(handle.lock().await.turn_count(), messages);
    assert_eq!(f.orchestrator.list().await.unwrap().len(), 1);
}
