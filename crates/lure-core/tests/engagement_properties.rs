//! Cross-module properties of the engagement core.

use lure_core::conversation::{ConversationState, ConversationTracker, StateMachineConfig, advance};
use lure_core::intelligence::{COMPLETENESS_CATEGORIES, IntelCategory, IntelligenceStore, extract};
use lure_core::persona::{
    FactKind, MAX_TECH_MULTIPLIER, PersonaTemplate, build_persona, catalogue, select_persona,
    validate_consistency,
};
use lure_core::random::{DrawSource, SeededSource};
use lure_core::temporal::{ComplexityClass, DelayDraws, TimingConfig, compute_delay};
use strum::IntoEnumIterator;

#[test]
fn test_unmapped_tags_fall_back_to_default_persona() {
    let persona = select_persona("something_new");
    assert_eq!(persona.template(), PersonaTemplate::MiddleAgedBusiness);
    assert_eq!(select_persona("").template(), PersonaTemplate::MiddleAgedBusiness);
    assert_eq!(select_persona("Bank-Fraud").template(), PersonaTemplate::ElderlyRetired);
}

#[test]
fn test_absent_relations_are_always_rejected() {
    for persona in catalogue() {
        for kind in persona.facts().absent_relations() {
            for term in kind.terms() {
                for text in [
                    format!("my {term} will send it"),
                    format!("I will ask My {term} tonight."),
                ] {
                    let violation = validate_consistency(&text, &persona).unwrap_err();
                    assert_eq!(violation.fact, FactKind::Family, "{}: {text}", persona.name());
                }
            }
        }
    }
}

#[test]
fn test_fallback_replies_pass_every_persona() {
    for persona in catalogue() {
        for state in ConversationState::iter() {
            for reply in state.tactic().fallback_replies {
                assert!(
                    validate_consistency(reply, &persona).is_ok(),
                    "{} rejects fallback {reply:?}",
                    persona.name()
                );
            }
        }
    }
}

#[test]
fn test_scenario_message_yields_payment_and_contact() {
    let mut store = IntelligenceStore::new();
    let before = store.completeness_score();

    let added = store.add(extract("Send money to scammer@ybl or call 9876543210 now"), 0);

    let pairs: Vec<(IntelCategory, &str)> = added.iter().map(|i| (i.category, i.value.as_str())).collect();
    assert!(pairs.contains(&(IntelCategory::PaymentIdentifier, "scammer@ybl")));
    assert!(pairs.contains(&(IntelCategory::ContactIdentifier, "9876543210")));
    assert!(store.completeness_score() > before);
}

#[test]
fn test_repeated_values_keep_store_cardinality() {
    let mut store = IntelligenceStore::new();
    for turn in 0..5 {
        store.add(extract("UPI: Scammer@YBL, phone +91 9876543210"), turn);
    }
    assert_eq!(store.len(), 2);
    assert!(store.items().iter().all(|item| item.first_seen_turn == 0));
}

#[test]
fn test_completeness_stays_bounded_for_random_message_mixes() {
    let fragments = [
        "pay a@ybl",
        "call 9988776655",
        "open https://x.example.com",
        "account 123456789012",
        "install anydesk",
        "this is RBI",
        "hello",
        "mail me at fraud@example.org",
    ];
    let source = SeededSource::new(11);
    let mut store = IntelligenceStore::new();
    let mut previous = 0.0;
    for turn in 0..60 {
        let pick = (source.draw() * fragments.len() as f64) as usize;
        store.add(extract(fragments[pick.min(fragments.len() - 1)]), turn);
        let score = store.completeness_score();
        assert!(score >= previous);
        assert!(score <= 1.0);
        previous = score;
    }
    assert!(store.len() <= fragments.len() + COMPLETENESS_CATEGORIES.len());
}

#[test]
fn test_delay_tactics_at_turn_cap_concludes() {
    let config = StateMachineConfig::default();
    assert!(config.delay_tactics.max_turns > 1);
    let next = advance(ConversationState::DelayTactics, 1, config.max_total_turns, false, 0.99, &config);
    assert_eq!(next, ConversationState::Conclusion);
}

#[test]
fn test_tracker_reaches_conclusion_by_turn_cap() {
    let config = StateMachineConfig::default();
    let source = SeededSource::new(3);
    let mut tracker = ConversationTracker::new();
    for turn in 1..=config.max_total_turns {
        tracker.record_turn();
        tracker.evaluate(turn, false, source.draw(), &config);
    }
    assert_eq!(tracker.state(), ConversationState::Conclusion);
    let states: Vec<ConversationState> = tracker.transitions().iter().map(|t| t.to).collect();
    assert!(states.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_delay_is_repeatable_and_bounded() {
    let timing = TimingConfig::default();
    let upper = timing.complex.max_secs * MAX_TECH_MULTIPLIER + timing.distraction.max_secs;
    let source = SeededSource::new(5);

    for template in PersonaTemplate::iter() {
        let persona = build_persona(template);
        for class in [ComplexityClass::Simple, ComplexityClass::Medium, ComplexityClass::Complex] {
            for _ in 0..50 {
                let draws = DelayDraws::new(source.draw(), source.draw(), source.draw());
                let first = compute_delay(&persona, class, draws, &timing);
                let second = compute_delay(&persona, class, draws, &timing);
                assert_eq!(first, second);
                assert!(first.as_secs_f64() >= 0.0);
                assert!(first.as_secs_f64() <= upper + 1e-6);
            }
        }
    }
}
