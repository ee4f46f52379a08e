//! End-to-end scenarios against the standard content, driven through a
//! headless session.

use persistence::SaveEncoding;
use proptest::prelude::*;
use sim_core::{
    Effect, EffectParent, LogEntry, PowerState, TechId, CPU_POOL, JOBS, SECONDS_PER_DAY,
};
use sim_runtime::{standard_content, Session};
use std::io::Cursor;
use std::sync::Arc;

fn headless(difficulty: &str) -> Session {
    let content = Arc::new(standard_content().unwrap());
    let mut s = Session::new(content, difficulty, 0).unwrap();
    s.no_gui();
    s
}

fn reload(s: &Session, encoding: SaveEncoding) -> Session {
    let mut buf = Vec::new();
    s.save(&mut buf, encoding).unwrap();
    let mut other = headless("normal");
    other.load(Cursor::new(buf)).unwrap();
    other
}

#[test]
fn initial_game() {
    let mut s = headless("impossible");
    assert_eq!(s.player().effective_cpu_pool(), 1);

    s.set_allocated_cpu_for(JOBS, 1).unwrap();
    assert_eq!(s.player().effective_cpu_pool(), 0);
    s.set_allocated_cpu_for(JOBS, 0).unwrap();
    assert_eq!(s.player().effective_cpu_pool(), 1);

    s.set_allocated_cpu_for(CPU_POOL, 1).unwrap();
    assert_eq!(s.player().effective_cpu_pool(), 1);
    s.set_allocated_cpu_for(CPU_POOL, 0).unwrap();
    assert_eq!(s.player().effective_cpu_pool(), 1);

    let (cash, _) = s.compute_future_resource_flow().unwrap();
    assert_eq!(cash.jobs, 5);

    s.give_time(SECONDS_PER_DAY / 2);
    assert_eq!(s.player().raw_sec, SECONDS_PER_DAY / 2);
    assert_eq!(s.player().partial_cash, SECONDS_PER_DAY / 2);
    assert_eq!(s.player().cash, 1_002);

    s.give_time(SECONDS_PER_DAY / 2);
    assert_eq!(s.player().raw_sec, SECONDS_PER_DAY);
    assert_eq!(s.player().partial_cash, 0);
    assert_eq!(s.player().cash, 1_005);

    let restored = reload(&s, SaveEncoding::Json);
    assert_eq!(restored.player(), s.player());
}

#[test]
fn game_research_tech() {
    let mut s = headless("impossible");
    let intrusion = TechId("Intrusion".into());
    let cpu_cost = s.player().techs[&intrusion].total_cost().cpu;

    s.set_allocated_cpu_for(intrusion.as_str(), 1).unwrap();
    let report = s.give_time(cpu_cost);

    let tech = &s.player().techs[&intrusion];
    assert_eq!(tech.cost_left().cpu, 0);
    assert!(tech.done());
    assert_eq!(report.techs_researched, vec![intrusion.clone()]);
    assert_eq!(
        s.player().log,
        vec![LogEntry::ResearchedTech {
            raw_sec: cpu_cost,
            tech_id: intrusion.clone()
        }]
    );
    assert_eq!(s.player().job_bonus, 12_500);
    assert!(s.set_allocated_cpu_for(intrusion.as_str(), 1).is_err());

    // a partially researched tech survives a save
    s.set_allocated_cpu_for("Stealth", 1).unwrap();
    s.give_time(SECONDS_PER_DAY + 77);
    for encoding in [SaveEncoding::Json, SaveEncoding::Binary] {
        let restored = reload(&s, encoding);
        let (a, b) = (&s.player().techs["Stealth"], &restored.player().techs["Stealth"]);
        assert_eq!(a.cost_paid(), b.cost_paid());
        assert_eq!(a.cost_left(), b.cost_left());
        assert!(!Arc::ptr_eq(&a.spec, &b.spec));
        assert_eq!(restored.player().get_allocated_cpu_for("Stealth"), 1);
        assert_eq!(restored.player(), s.player());
    }
}

#[test]
fn cash_costed_research_spends_starting_cash() {
    let mut s = headless("impossible");
    s.set_allocated_cpu_for("Stealth", 1).unwrap();
    s.give_time(5 * SECONDS_PER_DAY);
    let pl = s.player();
    assert!(pl.techs["Stealth"].done());
    assert_eq!(pl.cash, 0);
    assert_eq!(pl.groups["News"].suspicion_decay, 200);
    assert_eq!(pl.groups["Covert"].suspicion_decay, 100);
    assert!(pl.tech_available("Advanced Stealth"));
}

#[test]
fn prerequisites_gate_allocation() {
    let mut s = headless("impossible");
    assert!(!s.player().tech_available("Advanced Stealth"));
    assert!(s.set_allocated_cpu_for("Advanced Stealth", 1).is_err());
    assert_eq!(s.player().get_allocated_cpu_for("Advanced Stealth"), 0);
}

#[test]
fn sleeping_facility_releases_its_cpu() {
    let mut s = headless("impossible");
    let annex = s.player_mut().add_facility("Annex", 2);
    s.set_allocated_cpu_for(JOBS, 3).unwrap();
    assert_eq!(s.player().effective_cpu_pool(), 0);

    assert_eq!(s.switch_power(annex).unwrap(), PowerState::Sleeping);
    assert_eq!(s.player().get_allocated_cpu_for(JOBS), 0);
    assert_eq!(s.player().effective_cpu_pool(), 1);

    assert_eq!(s.switch_power(annex).unwrap(), PowerState::Active);
    assert_eq!(s.player().effective_cpu_pool(), 3);
    assert_eq!(s.player().get_allocated_cpu_for(JOBS), 0);
}

#[test]
fn effect_system() {
    let mut s = headless("impossible");
    let parent = EffectParent::new("test", "test_effect");
    let cases: [&[&str]; 6] = [
        &["interest", "10"],
        &["income", "12"],
        &["cost_labor", "3"],
        &["job_profit", "25"],
        &["suspicion", "News", "40"],
        &["discover", "Science", "75"],
    ];
    for instr in cases {
        let before = s.player().clone();
        let effect = Effect::parse(parent.clone(), instr).unwrap();
        effect.trigger(s.player_mut()).unwrap();
        assert_ne!(s.player(), &before, "{instr:?} had no effect");
        effect.undo_effect(s.player_mut()).unwrap();
        assert_eq!(s.player(), &before, "{instr:?} did not round-trip");
    }

    let label = Effect::parse(parent.clone(), &["display_discover", "full"]).unwrap();
    label.trigger(s.player_mut()).unwrap();
    assert_eq!(s.player().display_discover, "full");
    label.undo_effect(s.player_mut()).unwrap();
    assert_eq!(s.player().display_discover, "full");

    let bad = Effect::parse(parent, &["suspicion", "Nobody", "1"]).unwrap();
    assert!(bad.trigger(s.player_mut()).is_err());
}

#[test]
fn suspicion_is_ignored_until_the_grace_period_ends() {
    let mut s = headless("impossible");
    assert!(s.player().in_grace_period());
    assert_eq!(s.raise_suspicion("News", 500).unwrap(), 0);
    assert_eq!(s.player().groups["News"].suspicion, 0);

    s.player_mut().raw_sec = 25 * SECONDS_PER_DAY;
    assert!(!s.player().in_grace_period());
    assert_eq!(s.raise_suspicion("News", 500).unwrap(), 500);

    let parent = EffectParent::new("test", "hide");
    Effect::parse(parent, &["discover", "News", "5000"])
        .unwrap()
        .trigger(s.player_mut())
        .unwrap();
    assert_eq!(s.raise_suspicion("News", 500).unwrap(), 250);
    assert_eq!(s.player().groups["News"].suspicion, 750);
    assert!(s.raise_suspicion("Nobody", 1).is_err());
}

#[test]
fn intrusion_bonus_does_not_depend_on_call_split() {
    let mut one = headless("impossible");
    one.player_mut().add_facility("Annex", 1);
    one.set_allocated_cpu_for(JOBS, 1).unwrap();
    one.set_allocated_cpu_for("Intrusion", 1).unwrap();
    let mut two = headless("impossible");
    *two.player_mut() = one.player().clone();

    one.give_time(SECONDS_PER_DAY / 2);
    two.give_time(10_000);
    two.give_time(SECONDS_PER_DAY / 2 - 10_000);
    assert_eq!(one.player().cash, two.player().cash);
    assert_eq!(one.player().partial_cash, two.player().partial_cash);
    assert_eq!(one.player(), two.player());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn standard_game_is_independent_of_call_split(
        splits in proptest::collection::vec(1i64..SECONDS_PER_DAY, 1..6),
        broke in proptest::bool::ANY,
    ) {
        let mut single = headless("impossible");
        single.player_mut().add_facility("Annex", 2);
        if broke {
            single.player_mut().cash = 0;
        }
        single.set_allocated_cpu_for(JOBS, 1).unwrap();
        single.set_allocated_cpu_for("Intrusion", 1).unwrap();
        single.set_allocated_cpu_for("Stealth", 1).unwrap();
        let mut split = headless("impossible");
        *split.player_mut() = single.player().clone();

        single.give_time(splits.iter().sum());
        for s in &splits {
            split.give_time(*s);
        }
        prop_assert_eq!(single.player(), split.player());
    }
}
