use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use pprof::criterion::{Output, PProfProfiler};
use std::time::Duration;

use negtrack_core::{ButtonLayout, StimulusSet, TrialType};
use negtrack_experiment::{
    CursorRecorder, ExperimentConfig, ExperimentEvent, ExperimentStateMachine, MemorySink,
    TrialPlan, ViewLog,
};
use negtrack_timing::ManualTimer;

type Machine = ExperimentStateMachine<ManualTimer, ViewLog, MemorySink>;

// Machine sitting in the decision phase of its first trial.
fn deciding() -> (Machine, ManualTimer) {
    let timer = ManualTimer::new();
    let plan = TrialPlan {
        order: (0..12).collect(),
        types: vec![TrialType::TruePositive; 12],
        layout: ButtonLayout::TRUE_LEFT,
    };
    let mut m = ExperimentStateMachine::with_plan(
        ExperimentConfig::default(),
        StimulusSet::no_context(),
        plan,
        timer.clone(),
        ViewLog::default(),
        MemorySink::default(),
    )
    .unwrap();
    m.handle_event(ExperimentEvent::Start);
    while m.reveal_visible() {
        timer.advance_ms(150);
        m.handle_event(ExperimentEvent::Reveal);
    }
    (m, timer)
}

pub fn bench_recorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor_recorder");

    group.bench_function("on_move_kept", |b| {
        b.iter_batched(
            || CursorRecorder::new(0, Duration::from_millis(25)),
            |mut rec| {
                for i in 0..200u64 {
                    black_box(rec.on_move(i as f64, i as f64, i * 25_000_000));
                }
                rec.finish()
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("on_move_throttled", |b| {
        b.iter_batched(
            || CursorRecorder::new(0, Duration::from_millis(25)),
            |mut rec| {
                for i in 0..200u64 {
                    black_box(rec.on_move(i as f64, i as f64, i * 1_000_000));
                }
                rec.finish()
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

pub fn bench_machine_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_machine");
    group.sample_size(60);

    group.bench_function("cursor_moved", |b| {
        b.iter_batched(
            deciding,
            |(mut m, timer)| {
                for i in 0..200 {
                    timer.advance_ms(5);
                    black_box(m.handle_event(ExperimentEvent::CursorMoved {
                        x: i as f64,
                        y: 600.0 - i as f64,
                    }));
                }
                m
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
        .confidence_level(0.95)
        .noise_threshold(0.02)
        .significance_level(0.05);
    targets = bench_recorder, bench_machine_moves
}

criterion_main!(benches);
