//! Cooperative vs parallel execution through the bridge

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use tickbridge::runtime::scheduler::SchedulerConfig;
use tickbridge::runtime::value::{Arity, NativeFunction, ScriptValue};
use tickbridge::{ScriptRegistry, TickScheduler};

#[test]
fn test_sync_and_async_land_on_different_threads() {
    let host = Arc::new(
        TickScheduler::with_config(SchedulerConfig {
            async_workers: 2,
            thread_name: "script-pool".to_string(),
        })
        .unwrap(),
    );
    let registry = ScriptRegistry::new(host.clone());
    let context = registry.on_script_loaded("threads");
    let scheduler = registry.bridge(&context);

    let (tx, rx) = channel::unbounded();
    for (label, op) in [("sync", "runLater"), ("async", "runLaterAsync")] {
        let tx = tx.clone();
        let cb = NativeFunction::new(label, Arity::Fixed(0), move |_| {
            let _ = tx.send((label, thread::current().name().map(str::to_string)));
            Ok(ScriptValue::Nil)
        });
        scheduler
            .call(op, &[cb.into_value(), ScriptValue::Int(1)])
            .unwrap();
    }

    host.tick();
    host.quiesce();

    let mut seen: Vec<(&str, Option<String>)> = rx.try_iter().collect();
    seen.sort();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].0, "sync");
    assert_eq!(seen[1].1, thread::current().name().map(str::to_string));
    assert_eq!(seen[0].0, "async");
    assert!(seen[0].1.as_deref().unwrap().starts_with("script-pool-"));

    registry.unload_all();
}

#[test]
fn test_async_callback_may_schedule_sync_work() {
    let host = Arc::new(TickScheduler::new().unwrap());
    let registry = ScriptRegistry::new(host.clone());
    let context = registry.on_script_loaded("handoff");
    let scheduler = registry.bridge(&context);

    let (tx, rx) = channel::unbounded();
    let back_on_tick = scheduler.clone();
    let fetch = NativeFunction::new("fetch", Arity::Fixed(0), move |_| {
        let tx = tx.clone();
        let apply = NativeFunction::new("apply", Arity::Fixed(0), move |_| {
            let _ = tx.send(thread::current().id());
            Ok(ScriptValue::Nil)
        });
        back_on_tick.run(&[apply.into_value()])?;
        Ok(ScriptValue::Nil)
    });
    scheduler.run_async(&[fetch.into_value()]).unwrap();

    host.tick();
    host.quiesce();
    host.tick();

    let ran_on = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(ran_on, thread::current().id());
    assert!(context.is_empty());
}
