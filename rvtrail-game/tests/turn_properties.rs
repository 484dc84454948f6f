use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rvtrail_game::{
    Action, ActionDraws, CityCatalog, CityKey, Ending, GameState, NarrativeCollaborator,
    NarrativeEffect, NarrativeError, NarrativeEvent, NarrativeOutcome, NarrativeRequest,
    RulesConfig, StatDeltas, TurnOutcome, apply_action, parse_reply, resolve_turn_with,
    upgrade_vehicle,
};

struct BrokenNarrator;

#[async_trait]
impl NarrativeCollaborator for BrokenNarrator {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError> {
        Err(NarrativeError::Malformed("expected value at line 1".into()))
    }
}

/// Emits "event N" with an increasing N and no effect.
#[derive(Default)]
struct CountingNarrator(AtomicU32);

#[async_trait]
impl NarrativeCollaborator for CountingNarrator {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError> {
        let n = self.0.fetch_add(1, Ordering::SeqCst);
        Ok(NarrativeEvent::new(
            format!("event {n}"),
            NarrativeEffect::default(),
        ))
    }
}

/// Answers only after a long pause.
struct StalledNarrator(Duration);

#[async_trait]
impl NarrativeCollaborator for StalledNarrator {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError> {
        tokio::time::sleep(self.0).await;
        Ok(NarrativeEvent::new("too late", NarrativeEffect::materials_only(99)))
    }
}

/// Hands a fixed raw generator reply to the reply parser.
struct RawReplyNarrator(&'static str);

#[async_trait]
impl NarrativeCollaborator for RawReplyNarrator {
    fn name(&self) -> &'static str {
        "raw"
    }

    async fn generate(&self, _request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError> {
        Ok(parse_reply(self.0))
    }
}

fn fresh(city: CityKey) -> (GameState, RulesConfig) {
    let rules = RulesConfig::default();
    let state = GameState::new(city, &rules, &CityCatalog::load_from_static());
    (state, rules)
}

fn stats_in_range(state: &GameState) -> bool {
    let s = state.stats;
    [s.health, s.hunger, s.thirst, s.sanity]
        .iter()
        .all(|v| (0..=100).contains(v))
}

#[tokio::test]
async fn final_advance_wins_and_picks_ending() {
    let (mut state, rules) = fresh(CityKey::Beijing);
    state.distance = 950;
    state.rv.power = 30;

    let resolution = resolve_turn_with(
        &state,
        Action::Advance,
        ActionDraws::none(),
        false,
        &BrokenNarrator,
        &rules,
    )
    .await
    .unwrap();

    let next = &resolution.state;
    assert_eq!(next.distance, 1060);
    assert!(next.is_game_over);
    // sanity 100 - 2 upkeep - 5 advance = 93 > 80, no samples
    assert_eq!(next.ending, Some(Ending::RebuildHope));
    assert_eq!(resolution.outcome, TurnOutcome::Victory(Ending::RebuildHope));
}

#[tokio::test]
async fn samples_decide_ending_before_sanity() {
    let (mut state, rules) = fresh(CityKey::Wuhan);
    state.distance = 990;
    state.inventory.samples = 3;
    let resolution = resolve_turn_with(
        &state,
        Action::Advance,
        ActionDraws::none(),
        false,
        &BrokenNarrator,
        &rules,
    )
    .await
    .unwrap();
    assert_eq!(resolution.state.ending, Some(Ending::UltimateRedemption));
}

#[tokio::test]
async fn risky_scavenge_at_low_health_loses_without_ending() {
    let (mut state, rules) = fresh(CityKey::Shanghai);
    state.stats.health = 3;
    let draws = ActionDraws {
        materials: 10,
        found_food: false,
        found_water: false,
        risk: 3,
    };

    let resolution = resolve_turn_with(&state, Action::Scavenge, draws, false, &BrokenNarrator, &rules)
        .await
        .unwrap();

    assert!(resolution.state.is_game_over);
    assert_eq!(resolution.state.ending, None);
    assert_eq!(resolution.state.stats.health, 0);
    assert!(matches!(resolution.outcome, TurnOutcome::Defeat(_)));
}

#[test]
fn rest_without_supplies_still_heals() {
    let (mut state, rules) = fresh(CityKey::Chengdu);
    state.stats = rvtrail_game::Stats {
        health: 50,
        hunger: 50,
        thirst: 50,
        sanity: 50,
    };
    state.inventory.food = 0;
    state.inventory.water = 0;

    apply_action(&mut state, Action::Rest, &ActionDraws::none(), &rules);

    assert_eq!(state.stats.health, 70);
    assert_eq!(state.stats.sanity, 50 - 2 + 15);
    // only upkeep touches hunger and thirst
    assert_eq!(state.stats.hunger, 45);
    assert_eq!(state.stats.thirst, 42);
    assert_eq!(state.inventory.food, 0);
    assert_eq!(state.inventory.water, 0);
}

#[test]
fn vehicle_upgrade_one_short_changes_nothing() {
    let (mut state, rules) = fresh(CityKey::Harbin);
    state.materials = 29;
    let level = state.rv.level;
    let outcome = upgrade_vehicle(&mut state, &rules.upgrades);
    assert!(!outcome.applied());
    assert_eq!(state.materials, 29);
    assert_eq!(state.rv.level, level);
}

#[tokio::test]
async fn log_is_bounded_and_newest_first() {
    let (mut state, rules) = fresh(CityKey::Guangzhou);
    let narrator = CountingNarrator::default();
    for _ in 0..25 {
        state.stats = rvtrail_game::Stats::full();
        state = resolve_turn_with(&state, Action::Radio, ActionDraws::none(), true, &narrator, &rules)
            .await
            .unwrap()
            .state;
        assert!(state.log.len() <= 10);
    }

    assert_eq!(state.log.len(), 10);
    let numbers: Vec<u32> = state
        .log
        .iter()
        .filter_map(|entry| entry.rsplit("event ").next())
        .filter_map(|n| n.trim().parse().ok())
        .collect();
    assert_eq!(numbers, (15..25).rev().collect::<Vec<u32>>());
}

#[tokio::test]
async fn narrator_error_falls_back_to_fixed_event() {
    let (state, rules) = fresh(CityKey::Xian);

    let plain = resolve_turn_with(&state, Action::Radio, ActionDraws::none(), false, &BrokenNarrator, &rules)
        .await
        .unwrap();
    let fallback = resolve_turn_with(&state, Action::Radio, ActionDraws::none(), true, &BrokenNarrator, &rules)
        .await
        .unwrap();

    assert!(fallback.narrative.is_fallback());
    assert!(fallback.message.ends_with(&rules.narrative.fallback_text));
    assert_eq!(fallback.state.materials, plain.state.materials + 5);
    assert_eq!(fallback.state.stats, plain.state.stats);
    assert_eq!(fallback.state.inventory, plain.state.inventory);
}

#[tokio::test]
async fn every_turn_advances_the_day_by_one() {
    let (state, rules) = fresh(CityKey::Chongqing);
    let draws = ActionDraws {
        materials: 7,
        found_food: true,
        found_water: true,
        risk: 4,
    };
    for action in Action::ALL {
        for consult in [false, true] {
            let broken = resolve_turn_with(&state, action, draws, consult, &BrokenNarrator, &rules)
                .await
                .unwrap();
            let counting = CountingNarrator::default();
            let delivered = resolve_turn_with(&state, action, draws, consult, &counting, &rules)
                .await
                .unwrap();
            assert_eq!(broken.state.day, state.day + 1);
            assert_eq!(delivered.state.day, state.day + 1);
        }
    }
}

#[test]
fn base_actions_keep_stats_and_counters_in_range() {
    let rules = RulesConfig::default();
    let catalog = CityCatalog::load_from_static();
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let mut state = GameState::new(CityKey::Beijing, &rules, &catalog);

    for _ in 0..2_000 {
        if state.stats.any_depleted() {
            state = GameState::new(CityKey::Beijing, &rules, &catalog);
        }
        let action = Action::ALL[rng.gen_range(0..Action::ALL.len())];
        let draws = ActionDraws::roll(action, &mut rng, &rules.scavenge);
        apply_action(&mut state, action, &draws, &rules);

        assert!(stats_in_range(&state), "{:?}", state.stats);
        assert!(state.materials >= 0);
        let inv = state.inventory;
        assert!(inv.food >= 0 && inv.water >= 0 && inv.meds >= 0 && inv.samples >= 0);
    }
}

#[tokio::test]
async fn narrative_merge_floors_but_does_not_cap() {
    struct Windfall;

    #[async_trait]
    impl NarrativeCollaborator for Windfall {
        fn name(&self) -> &'static str {
            "windfall"
        }

        async fn generate(
            &self,
            _request: &NarrativeRequest,
        ) -> Result<NarrativeEvent, NarrativeError> {
            let effect = NarrativeEffect {
                stats: StatDeltas {
                    health: 50,
                    hunger: -500,
                    ..StatDeltas::default()
                },
                materials: -100,
                ..NarrativeEffect::default()
            };
            Ok(NarrativeEvent::new("A strange windfall.", effect))
        }
    }

    let (state, rules) = fresh(CityKey::Beijing);
    let resolution = resolve_turn_with(&state, Action::Radio, ActionDraws::none(), true, &Windfall, &rules)
        .await
        .unwrap();
    assert_eq!(resolution.state.stats.health, 150);
    assert_eq!(resolution.state.stats.hunger, 0);
    assert_eq!(resolution.state.materials, rules.start.materials - 100);
    assert!(resolution.state.is_game_over);
    assert_eq!(resolution.state.ending, None);
}

#[tokio::test]
async fn broken_json_reply_is_delivered_without_effect() {
    let (state, rules) = fresh(CityKey::Harbin);
    let narrator = RawReplyNarrator(
        "Description: Smoke on the horizon.\nJSON: {\"stats\": {\"health\": -oops}}",
    );

    let plain = resolve_turn_with(&state, Action::Radio, ActionDraws::none(), false, &narrator, &rules)
        .await
        .unwrap();
    let resolution = resolve_turn_with(&state, Action::Radio, ActionDraws::none(), true, &narrator, &rules)
        .await
        .unwrap();

    let NarrativeOutcome::Delivered(event) = &resolution.narrative else {
        panic!("expected a delivered event, got {:?}", resolution.narrative);
    };
    assert_eq!(event.text, "Smoke on the horizon.");
    assert!(event.effect.is_empty());
    assert!(resolution.message.ends_with("[Event] Smoke on the horizon."));
    assert_eq!(resolution.state.stats, plain.state.stats);
    assert_eq!(resolution.state.materials, plain.state.materials);
    assert_eq!(resolution.state.inventory, plain.state.inventory);
}

#[tokio::test(start_paused = true)]
async fn slow_narrator_times_out_into_fallback() {
    let (state, rules) = fresh(CityKey::Wuhan);
    let narrator = StalledNarrator(rules.narrative.timeout() + Duration::from_secs(30));

    let resolution = resolve_turn_with(&state, Action::Radio, ActionDraws::none(), true, &narrator, &rules)
        .await
        .unwrap();

    assert!(
        matches!(
            resolution.narrative,
            NarrativeOutcome::Fallback {
                error: NarrativeError::Timeout(_),
                ..
            }
        ),
        "{:?}",
        resolution.narrative
    );
    assert_eq!(resolution.state.materials, state.materials + 5);
    assert_eq!(resolution.state.day, state.day + 1);
    assert!(resolution.message.ends_with(&rules.narrative.fallback_text));
}
