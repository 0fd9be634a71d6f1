//! End-to-end script lifecycle: load, schedule, reload, unload

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tickbridge::runtime::value::{Arity, NativeFunction, ScriptValue};
use tickbridge::{HostScheduler, ScriptRegistry, TickScheduler};

/// Stands in for a script's global environment: the scheduler table.
fn scheduler_member(
    members: &[(&'static str, ScriptValue)],
    name: &str,
) -> ScriptValue {
    members
        .iter()
        .find(|(member, _)| *member == name)
        .map(|(_, value)| value.clone())
        .unwrap()
}

#[test]
fn test_script_schedules_and_is_torn_down() {
    let host = Arc::new(TickScheduler::new().unwrap());
    let registry = ScriptRegistry::new(host.clone());

    let context = registry.on_script_loaded("announcer");
    let members = registry.bridge(&context).members();
    let run_timer = scheduler_member(&members, "runTimer");
    let run_later = scheduler_member(&members, "runLater");

    let log = Arc::new(Mutex::new(Vec::new()));
    let timer_log = log.clone();
    let announce = NativeFunction::new("announce", Arity::Fixed(0), move |_| {
        timer_log.lock().push("tick");
        Ok(ScriptValue::Nil)
    });
    let later_log = log.clone();
    let once = NativeFunction::new("once", Arity::Fixed(0), move |_| {
        later_log.lock().push("later");
        Ok(ScriptValue::Nil)
    });

    run_timer
        .as_function()
        .unwrap()
        .call(&[announce.into_value(), ScriptValue::Int(0), ScriptValue::Int(10)])
        .unwrap();
    run_later
        .as_function()
        .unwrap()
        .call(&[once.into_value(), ScriptValue::Int(5)])
        .unwrap();
    assert_eq!(context.len(), 2);

    host.advance(12);
    assert_eq!(*log.lock(), vec!["tick", "later", "tick"]);
    assert_eq!(context.len(), 1);

    registry.on_script_unloaded(&context);
    host.advance(30);
    assert_eq!(log.lock().len(), 3);
    assert!(host.is_empty());
}

#[test]
fn test_reload_replaces_tasks() {
    let host = Arc::new(TickScheduler::new().unwrap());
    let registry = ScriptRegistry::new(host.clone());
    let old_runs = Arc::new(AtomicUsize::new(0));
    let new_runs = Arc::new(AtomicUsize::new(0));

    let load = |runs: &Arc<AtomicUsize>| {
        let context = registry.on_script_loaded("particles");
        let runs = runs.clone();
        let cb = NativeFunction::new("emit", Arity::Fixed(0), move |_| {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptValue::Nil)
        });
        registry
            .bridge(&context)
            .run_timer(&[cb.into_value(), ScriptValue::Int(0), ScriptValue::Int(1)])
            .unwrap();
        context
    };

    let old = load(&old_runs);
    host.advance(3);
    let new = load(&new_runs);
    host.advance(3);

    assert_eq!(old_runs.load(Ordering::SeqCst), 3);
    assert_eq!(new_runs.load(Ordering::SeqCst), 3);
    assert!(old.is_empty());
    assert_eq!(new.len(), 1);

    registry.unload_all();
    assert!(host.is_empty());
}

#[test]
fn test_countdown_timer_cancels_itself() {
    let host = Arc::new(TickScheduler::new().unwrap());
    let registry = ScriptRegistry::new(host.clone());
    let context = registry.on_script_loaded("countdown");
    let remaining = Arc::new(AtomicUsize::new(3));

    let counter = remaining.clone();
    let tick_down = NativeFunction::new("tickDown", Arity::Fixed(1), move |args| {
        if counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            if let Some(cancel) = args[0].as_task().and_then(|task| task.get("cancel")) {
                cancel.as_function().unwrap().call(&[])?;
            }
        }
        Ok(ScriptValue::Nil)
    });

    let task = registry
        .bridge(&context)
        .run_timer(&[tick_down.into_value(), ScriptValue::Int(2), ScriptValue::Int(2)])
        .unwrap();
    let id = task.as_task().unwrap().task_id();

    host.advance(20);
    assert_eq!(remaining.load(Ordering::SeqCst), 0);
    assert!(!host.is_active(id));
    assert!(context.is_empty());
}
