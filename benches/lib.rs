//! # tickbridge 性能基准测试
//!
//! 使用 Criterion.rs 进行性能基准测试。
//!
//! ## 基准测试分组
//! - `scheduler`: TickScheduler 提交与 tick 吞吐
//! - `bridge`: 脚本调用校验与调度
//!
//! ## 使用方法
//! ```bash
//! cargo bench            # 运行所有
//! cargo bench scheduler  # 只运行调度器基准
//! ```

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tickbridge::runtime::scheduler::{Affinity, HostScheduler, TaskSpec};
use tickbridge::runtime::value::{Arity, NativeFunction, ScriptValue};
use tickbridge::{ScriptRegistry, TickScheduler};

// ============================================================================
// Scheduler Benchmarks
// ============================================================================

fn bench_submit_and_tick(c: &mut Criterion) {
    let scheduler = TickScheduler::new().unwrap();
    c.bench_function("submit_and_tick_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                scheduler
                    .submit(TaskSpec::once(Affinity::Cooperative, 0), Box::new(|| {}))
                    .unwrap();
            }
            scheduler.tick();
        })
    });
}

fn bench_repeating_tick(c: &mut Criterion) {
    let scheduler = TickScheduler::new().unwrap();
    for _ in 0..1000 {
        scheduler
            .submit(TaskSpec::repeating(Affinity::Cooperative, 0, 1), Box::new(|| {}))
            .unwrap();
    }
    c.bench_function("tick_1000_timers", |b| b.iter(|| scheduler.tick()));
}

// ============================================================================
// Bridge Benchmarks
// ============================================================================

fn bench_bridge_run_later(c: &mut Criterion) {
    let host = Arc::new(TickScheduler::new().unwrap());
    let registry = ScriptRegistry::new(host.clone());
    let context = registry.on_script_loaded("bench");
    let bridge = registry.bridge(&context);
    let callback = NativeFunction::new("noop", Arity::Fixed(0), |_| Ok(ScriptValue::Nil)).into_value();

    c.bench_function("bridge_run_later", |b| {
        b.iter(|| {
            bridge
                .run_later(&[callback.clone(), ScriptValue::Int(1)])
                .unwrap();
            host.tick();
        })
    });
}

fn bench_bridge_rejects_bad_arguments(c: &mut Criterion) {
    let host = Arc::new(TickScheduler::new().unwrap());
    let registry = ScriptRegistry::new(host);
    let context = registry.on_script_loaded("bench");
    let bridge = registry.bridge(&context);
    let args = [ScriptValue::from("not a function"), ScriptValue::Int(-1)];

    c.bench_function("bridge_invalid_argument", |b| {
        b.iter(|| black_box(bridge.run_later(black_box(&args)).is_err()))
    });
}

criterion_group!(scheduler, bench_submit_and_tick, bench_repeating_tick);
criterion_group!(
    bridge,
    bench_bridge_run_later,
    bench_bridge_rejects_bad_arguments
);
criterion_main!(scheduler, bridge);
