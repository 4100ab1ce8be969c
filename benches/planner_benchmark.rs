//! Benchmarks for the auto-pay planner and the ability text parser
//!
//! The planner enumerates producer subsets, so its cost grows with the number
//! of producers considered. The parser runs on every ability resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use duel_engine::core::{CardId, CostSpec, Domain, DomainSet, ResourcePool};
use duel_engine::game::effect_parser;
use duel_engine::game::payment::{plan_auto_payment, Producer, ProducerKind};

/// A board of `count` ready runes cycling through the domains, plus one seal
fn producers(count: usize) -> Vec<Producer> {
    let mut out: Vec<Producer> = (0..count)
        .map(|i| Producer {
            card: CardId::new(i as u32),
            ready: true,
            kind: ProducerKind::Rune {
                domain: Some(Domain::ALL[i % Domain::ALL.len()]),
            },
        })
        .collect();
    out.push(Producer {
        card: CardId::new(count as u32),
        ready: true,
        kind: ProducerKind::Seal {
            domain: Domain::Calm,
            amount: 1,
        },
    });
    out
}

fn bench_planner(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_auto_payment");
    let fury_or_calm: DomainSet = [Domain::Fury, Domain::Calm].into_iter().collect();
    let cost = CostSpec::new(4, 2, fury_or_calm);
    let pool = ResourcePool::new();

    for count in [4usize, 8, 12] {
        let board = producers(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &board, |b, board| {
            b.iter(|| {
                plan_auto_payment(
                    black_box(&pool),
                    black_box(board),
                    black_box(&cost),
                    DomainSet::empty(),
                    16,
                )
            })
        });
    }
    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let texts = [
        "Draw 1.",
        "Deal 3 to an enemy unit here. Draw 1.",
        "Give a friendly unit +2 might this turn. Then you may move it to your base.",
        "Choose one: Deal 2 to a unit. Or stun an enemy unit.",
    ];
    c.bench_function("parse_effect", |b| {
        b.iter(|| {
            for text in texts.iter() {
                black_box(effect_parser::parse_effect(black_box(text)));
            }
        })
    });
}

criterion_group!(benches, bench_planner, bench_parser);
criterion_main!(benches);
