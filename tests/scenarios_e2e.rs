//! End-to-end rules scenarios
//!
//! Small boards built by hand, then played out through the intent API.

use duel_engine::core::{
    BattlefieldId, CardDefinition, CardId, CardType, CostSpec, Domain, DomainSet, Keyword, PlayerId, ResourcePool,
    TargetRef,
};
use duel_engine::game::{queries, CombatStep, Intent, Location, LogCategory, Match, MatchConfig, Phase, TiePolicy};
use duel_engine::zones::Zone;

fn p(seat: u32) -> PlayerId {
    PlayerId::new(seat)
}

fn action_phase_with(config: MatchConfig) -> Match {
    let mut m = Match::new_two_player("Alice", "Bob", config);
    m.turn.phase = Phase::Action;
    for player in m.player_ids() {
        m.player_mut(player).unwrap().mulligan_done = true;
    }
    m
}

fn action_phase() -> Match {
    action_phase_with(MatchConfig::default())
}

fn add(m: &mut Match, seat: u32, def: CardDefinition, zone: Zone) -> CardId {
    m.create_card(def.into_shared(), p(seat), zone).unwrap()
}

fn soldier(might: u32) -> CardDefinition {
    CardDefinition::new("u", "Soldier", CardType::Unit).with_might(might)
}

fn filler() -> CardDefinition {
    CardDefinition::new("f", "Filler", CardType::Spell)
}

fn pass_pair(m: &mut Match, first: PlayerId) {
    m.apply(Intent::PassPriority { player: first }).unwrap();
    m.apply(Intent::PassPriority {
        player: m.opponent(first),
    })
    .unwrap();
}

fn advance(m: &mut Match, times: usize) {
    for _ in 0..times {
        let active = m.active_player();
        m.apply(Intent::AdvancePhase { player: active }).unwrap();
    }
}

#[test]
fn test_restricted_power_paid_from_pool() {
    let mut pool = ResourcePool::with_energy(3);
    pool.add_power(Domain::Fury, 1);
    let fury_or_calm: DomainSet = [Domain::Fury, Domain::Calm].into_iter().collect();
    let cost = CostSpec::new(2, 1, fury_or_calm);

    assert!(pool.can_pay(&cost, DomainSet::empty()));
    pool.pay(&cost, DomainSet::empty()).unwrap();
    assert_eq!(pool.energy, 1);
    assert_eq!(pool.power(Domain::Fury), 0);

    let err = pool.pay(&cost, DomainSet::empty()).unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(pool.energy, 1, "a failed payment spends nothing");
}

#[test]
fn test_announced_ability_resolves_after_two_passes() {
    let mut m = action_phase();
    add(&mut m, 0, filler(), Zone::MainDeck);
    let scholar = add(
        &mut m,
        0,
        soldier(1).with_ability("Exhaust:", "Draw 1."),
        Zone::Base,
    );

    m.apply(Intent::ActivateAbility {
        player: p(0),
        source: scholar,
        targets: vec![],
        auto_pay: false,
    })
    .unwrap();
    assert_eq!(m.chain.len(), 1);
    assert_eq!(m.priority, p(0));
    assert!(!m.card(scholar).unwrap().ready, "the exhaust cost is paid on announce");

    pass_pair(&mut m, p(0));
    assert!(m.chain.is_empty());
    assert_eq!(m.priority, m.active_player());
    assert_eq!(m.player(p(0)).unwrap().hand_size(), 1);

    let again = m.apply(Intent::ActivateAbility {
        player: p(0),
        source: scholar,
        targets: vec![],
        auto_pay: false,
    });
    assert!(again.is_err(), "exhausted source cannot pay again");
}

#[test]
fn test_play_trigger_goes_on_the_chain_after_its_unit() {
    let mut m = action_phase();
    add(&mut m, 0, filler(), Zone::MainDeck);
    let herald = add(
        &mut m,
        0,
        soldier(2).with_ability("When you play me", "Draw 1."),
        Zone::Hand,
    );

    m.apply(Intent::PlayCard {
        player: p(0),
        card: herald,
        destination: None,
        targets: vec![],
        accelerate: false,
        auto_pay: false,
    })
    .unwrap();
    pass_pair(&mut m, p(0));
    assert_eq!(m.card(herald).unwrap().zone, Zone::Base);
    assert_eq!(m.chain.len(), 1, "the play trigger waits on the chain");
    assert_eq!(m.player(p(0)).unwrap().hand_size(), 0);

    pass_pair(&mut m, p(0));
    assert!(m.chain.is_empty());
    assert_eq!(m.player(p(0)).unwrap().hand_size(), 1);
}

#[test]
fn test_two_attackers_against_one_defender() {
    let mut m = action_phase();
    let bf = BattlefieldId::new(0);
    m.battlefield_mut(bf).unwrap().controller = Some(p(1));
    let a1 = add(&mut m, 0, soldier(2), Zone::Base);
    let a2 = add(&mut m, 0, soldier(2), Zone::Base);
    let defender = add(&mut m, 1, soldier(5), Zone::Battlefield(bf));

    m.apply(Intent::DeclareMove {
        player: p(0),
        from: Location::Base,
        to: Location::Battlefield(bf),
        units: vec![a1, a2],
    })
    .unwrap();
    pass_pair(&mut m, p(0));

    let combat = m.combat.as_ref().expect("combat waits for an assignment");
    assert_eq!(combat.step, CombatStep::DamageAssignment);
    assert_eq!(combat.awaiting(), vec![p(1)], "only the side with two recipients assigns");
    assert!(m
        .apply(Intent::AssignCombatDamage {
            player: p(0),
            assignment: vec![(defender, 4)],
        })
        .is_err());
    assert!(m
        .apply(Intent::AssignCombatDamage {
            player: p(1),
            assignment: vec![(a1, 1)],
        })
        .is_err());

    m.apply(Intent::AssignCombatDamage {
        player: p(1),
        assignment: vec![(a1, 2), (a2, 3)],
    })
    .unwrap();

    assert!(m.combat.is_none());
    assert_eq!(m.card(a1).unwrap().zone, Zone::Discard);
    assert_eq!(m.card(a2).unwrap().zone, Zone::Discard);
    assert_eq!(m.card(defender).unwrap().damage, 4);
    let battlefield = m.battlefield(bf).unwrap();
    assert_eq!(battlefield.controller, Some(p(1)));
    assert_eq!(battlefield.contested_by, None);
    assert_eq!(m.player(p(1)).unwrap().score, 0, "keeping control scores nothing");
}

#[test]
fn test_tie_policy_recall_both() {
    let config = MatchConfig {
        tie_policy: TiePolicy::RecallBoth,
        ..MatchConfig::default()
    };
    let mut m = action_phase_with(config);
    let bf = BattlefieldId::new(1);
    m.battlefield_mut(bf).unwrap().controller = Some(p(1));
    let attacker = add(&mut m, 0, soldier(2), Zone::Base);
    let defender = add(&mut m, 1, soldier(3), Zone::Battlefield(bf));
    // A stunned defender deals no damage, so both sides survive
    m.card_mut(defender).unwrap().stunned_until = Some(m.turn_number() + 1);

    m.apply(Intent::DeclareMove {
        player: p(0),
        from: Location::Base,
        to: Location::Battlefield(bf),
        units: vec![attacker],
    })
    .unwrap();
    pass_pair(&mut m, p(0));

    assert!(m.combat.is_none());
    assert_eq!(m.card(attacker).unwrap().zone, Zone::Base);
    assert_eq!(m.card(defender).unwrap().zone, Zone::Base);
    let battlefield = m.battlefield(bf).unwrap();
    assert_eq!(battlefield.controller, Some(p(1)));
    assert_eq!(battlefield.contested_by, None);
}

#[test]
fn test_tie_on_open_battlefield_scores_nothing() {
    let mut m = action_phase();
    let bf = BattlefieldId::new(2);
    assert_eq!(m.battlefield(bf).unwrap().controller, None);
    let attacker = add(&mut m, 0, soldier(2), Zone::Base);
    let defender = add(&mut m, 1, soldier(3), Zone::Battlefield(bf));
    m.card_mut(defender).unwrap().stunned_until = Some(m.turn_number() + 1);

    m.apply(Intent::DeclareMove {
        player: p(0),
        from: Location::Base,
        to: Location::Battlefield(bf),
        units: vec![attacker],
    })
    .unwrap();
    pass_pair(&mut m, p(0));

    assert!(m.combat.is_none());
    assert_eq!(m.card(attacker).unwrap().zone, Zone::Base);
    assert_eq!(m.card(defender).unwrap().zone, Zone::Battlefield(bf));
    let battlefield = m.battlefield(bf).unwrap();
    assert_eq!(battlefield.controller, Some(p(1)), "the defender holds");
    assert_eq!(battlefield.contested_by, None);
    assert_eq!(m.player(p(1)).unwrap().score, 0, "holding after a tie is not a conquest");
    assert_eq!(m.player(p(0)).unwrap().score, 0);
}

#[test]
fn test_champion_plays_from_its_slot() {
    let mut m = action_phase();
    let champion = add(&mut m, 0, soldier(3).with_tag("Champion"), Zone::Champion);
    assert_eq!(m.player(p(0)).unwrap().champion, Some(champion));

    m.apply(Intent::PlayCard {
        player: p(0),
        card: champion,
        destination: None,
        targets: vec![],
        accelerate: false,
        auto_pay: false,
    })
    .unwrap();
    assert_eq!(m.card(champion).unwrap().zone, Zone::Chain);
    assert_eq!(m.player(p(0)).unwrap().champion, None, "the slot empties on play");

    pass_pair(&mut m, p(0));
    assert_eq!(m.card(champion).unwrap().zone, Zone::Base);
    assert!(m.player(p(0)).unwrap().zones.base.contains(champion));
}

#[test]
fn test_might_limited_kill_rejects_a_large_target() {
    let mut m = action_phase();
    let small = add(&mut m, 1, soldier(2), Zone::Base);
    let large = add(&mut m, 1, soldier(3), Zone::Base);
    let cull = add(
        &mut m,
        0,
        CardDefinition::new("k", "Cull", CardType::Spell).with_ability("", "Kill a unit with 2 might or less."),
        Zone::Hand,
    );
    let play = |target: CardId| Intent::PlayCard {
        player: p(0),
        card: cull,
        destination: None,
        targets: vec![TargetRef::Card(target)],
        accelerate: false,
        auto_pay: false,
    };

    assert!(m.apply(play(large)).is_err());
    assert_eq!(m.card(cull).unwrap().zone, Zone::Hand);

    m.apply(play(small)).unwrap();
    pass_pair(&mut m, p(0));
    assert_eq!(m.card(small).unwrap().zone, Zone::Discard);
    assert_eq!(m.card(large).unwrap().zone, Zone::Base);
}

#[test]
fn test_burnout_reshuffles_discard_and_scores_for_opponent() {
    let mut m = Match::new_two_player("Alice", "Bob", MatchConfig::default());
    for _ in 0..3 {
        add(&mut m, 0, filler(), Zone::Discard);
        add(&mut m, 1, filler(), Zone::MainDeck);
    }
    for player in m.player_ids() {
        m.apply(Intent::ConfirmMulligan {
            player,
            recycle: vec![],
        })
        .unwrap();
    }

    // Ready, Scoring, Channel, Draw
    advance(&mut m, 4);
    assert_eq!(m.phase(), Phase::Draw);

    let alice = m.player(p(0)).unwrap();
    assert_eq!(alice.hand_size(), 1);
    assert_eq!(alice.zones.main_deck.len(), 2);
    assert!(alice.zones.discard.is_empty());
    assert_eq!(m.player(p(1)).unwrap().score, 1, "exactly one point for the opponent");
    assert!(m
        .logger
        .logs()
        .iter()
        .any(|e| e.category == LogCategory::Event && e.message.contains("burns out")));
}

#[test]
fn test_hidden_card_waits_a_turn() {
    let mut m = action_phase();
    let bf = BattlefieldId::new(0);
    m.battlefield_mut(bf).unwrap().controller = Some(p(0));
    add(&mut m, 0, filler(), Zone::MainDeck);
    let ambush = add(
        &mut m,
        0,
        CardDefinition::new("h", "Ambush", CardType::Spell)
            .with_cost(3, 0)
            .with_keyword(Keyword::Hidden)
            .with_ability("", "Draw 1."),
        Zone::Hand,
    );
    m.player_mut(p(0)).unwrap().pool.add_power(Domain::Mind, 1);

    m.apply(Intent::HideCard {
        player: p(0),
        card: ambush,
        battlefield: bf,
    })
    .unwrap();
    assert_eq!(m.card(ambush).unwrap().zone, Zone::Facedown(bf));
    assert!(m.player(p(0)).unwrap().pool.is_empty(), "hiding costs one power");

    let play = Intent::PlayCard {
        player: p(0),
        card: ambush,
        destination: None,
        targets: vec![],
        accelerate: false,
        auto_pay: false,
    };
    assert!(m.apply(play.clone()).is_err(), "not on the turn it was hidden");

    m.turn.turn_number += 2;
    m.apply(play).unwrap();
    pass_pair(&mut m, p(0));
    assert_eq!(m.card(ambush).unwrap().zone, Zone::Discard);
    assert_eq!(m.player(p(0)).unwrap().hand_size(), 1, "played for free, effect resolved");
}

#[test]
fn test_equipped_gear_returns_when_host_dies() {
    let mut m = action_phase();
    let host = add(&mut m, 0, soldier(2), Zone::Base);
    let blade = add(
        &mut m,
        0,
        CardDefinition::new("g", "Long Sword", CardType::Gear)
            .with_might(2)
            .with_domain(Domain::Fury)
            .with_keyword(Keyword::Equip(1)),
        Zone::Base,
    );
    m.player_mut(p(0)).unwrap().pool.add_power(Domain::Fury, 1);

    m.apply(Intent::EquipGear {
        player: p(0),
        gear: blade,
        unit: host,
        auto_pay: false,
    })
    .unwrap();
    assert_eq!(m.card(blade).unwrap().attached_to, Some(host));
    assert_eq!(queries::effective_might(&m, host), 4);

    m.kill_card(host).unwrap();
    let gear = m.card(blade).unwrap();
    assert_eq!(gear.zone, Zone::Base);
    assert_eq!(gear.attached_to, None);
    assert!(m.player(p(0)).unwrap().zones.base.contains(blade));
}

#[test]
fn test_concede_ends_the_match() {
    let mut m = action_phase();
    m.apply(Intent::Concede { player: p(0) }).unwrap();
    assert_eq!(m.winner, Some(p(1)));
    assert_eq!(m.phase(), Phase::GameOver);
    let err = m.apply(Intent::AdvancePhase { player: p(0) }).unwrap_err();
    assert!(err.is_rejection());
}
