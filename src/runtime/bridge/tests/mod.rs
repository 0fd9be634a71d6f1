//! Bridge 单元测试
//!
//! 测试参数校验、回调适配、脚本任务归属与卸载


use crate::runtime::bridge::{CallbackFailure, FailureReporter, ScriptContext, TaskSchedulerBridge};
use crate::runtime::scheduler::{SchedulerConfig, TickScheduler};
use crate::runtime::value::{Arity, NativeFunction, ScriptValue};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Keeps every reported failure.
#[derive(Default)]
pub(super) struct CollectingReporter {
    failures: Mutex<Vec<CallbackFailure>>,
}

impl CollectingReporter {
    pub(super) fn failures(&self) -> Vec<CallbackFailure> {
        self.failures.lock().clone()
    }
}

impl FailureReporter for CollectingReporter {
    fn report(
        &self,
        failure: &CallbackFailure,
    ) {
        self.failures.lock().push(failure.clone());
    }
}

pub(super) struct Fixture {
    pub host: Arc<TickScheduler>,
    pub context: Arc<ScriptContext>,
    pub bridge: TaskSchedulerBridge,
    pub reporter: Arc<CollectingReporter>,
}

pub(super) fn fixture(script: &str) -> Fixture {
    let host = Arc::new(
        TickScheduler::with_config(SchedulerConfig {
            async_workers: 2,
            ..SchedulerConfig::default()
        })
        .unwrap(),
    );
    let context = ScriptContext::new(script, host.clone());
    let reporter = Arc::new(CollectingReporter::default());
    let bridge = TaskSchedulerBridge::with_reporter(context.clone(), reporter.clone());
    Fixture {
        host,
        context,
        bridge,
        reporter,
    }
}

/// A callable of the given arity that counts its invocations.
pub(super) fn counting(arity: Arity) -> (ScriptValue, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let f = NativeFunction::new("counting", arity, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptValue::Nil)
    });
    (f.into_value(), calls)
}
