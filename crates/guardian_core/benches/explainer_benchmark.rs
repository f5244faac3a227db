//! # Explainer Benchmark
//!
//! Rationale lookup sits on the feed path: every incoming event is explained
//! before it is offered to the session. Measures first-match and fall-through
//! cost of the rule table, plus a full demo run through the controller.
//!
//! Run with: `cargo bench --package guardian_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use guardian_core::{
    DemoScript, HeuristicExplainer, NullPresenter, RecordingLinks, SessionConfig, SessionController,
};
use guardian_shared::ChallengeEvent;

fn event(path: &str, user_agent: &str, frequency: f64) -> ChallengeEvent {
    ChallengeEvent {
        id: 1,
        method: "GET".into(),
        path: path.into(),
        source_ip: "203.0.113.9".into(),
        user_agent: user_agent.into(),
        frequency,
        sector: String::new(),
    }
}

/// One event per position in the rule table, plus the fall-through.
fn bench_explain(c: &mut Criterion) {
    let explainer = HeuristicExplainer::new();
    let cases = [
        ("first_rule", event("/v1/users/999999/inject", "BotNet/2.1", 1.0)),
        ("mid_table", event("/v1/accounts/1/balance", "Mozilla/5.0", 1.0)),
        ("last_rule", event("/api/v2/cart/add", "Mozilla/5.0", 1.0)),
        ("fallback", event("/static/app.js", "Mozilla/5.0", 1.0)),
    ];

    let mut group = c.benchmark_group("explain");
    for (name, event) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), event, |b, event| {
            b.iter(|| black_box(explainer.rationale(black_box(event))));
        });
    }
    group.finish();
}

/// Whole demo script, judged correctly, through the controller.
fn bench_demo_run(c: &mut Criterion) {
    c.bench_function("demo_run_builtin", |b| {
        b.iter(|| {
            let mut session = match SessionController::new(
                SessionConfig::default(),
                DemoScript::builtin(),
                NullPresenter,
                RecordingLinks::default(),
            ) {
                Ok(session) => session,
                Err(e) => panic!("{e}"),
            };
            let _ = session.start_demo();
            while let Some(current) = session.state().current_challenge() {
                let verdict = current.correct_verdict();
                session.submit_verdict(verdict);
                session.advance_demo();
            }
            black_box(session.mode())
        });
    });
}

criterion_group!(benches, bench_explain, bench_demo_run);
criterion_main!(benches);
