//! Scheduler 单元测试
//!
//! 测试任务状态机、定时队列和 TickScheduler 的调度行为


use crate::runtime::scheduler::{
    Affinity, SchedulerConfig, TaskHandle, TaskId, TaskIdGenerator, TaskKind, TaskSpec, TaskState,
};

#[cfg(test)]
mod task_id_tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId(7).to_string(), "Task(7)");
    }

    #[test]
    fn test_task_id_ordering() {
        assert!(TaskId(1) < TaskId(2));
        assert_eq!(TaskId::from(3u64).inner(), 3);
    }

    #[test]
    fn test_generator_starts_at_one_and_never_repeats() {
        let ids = TaskIdGenerator::new();
        let first = ids.next();
        let second = ids.next();
        assert_eq!(first, TaskId(1));
        assert_eq!(second, TaskId(2));
    }
}

#[cfg(test)]
mod task_state_tests {
    use super::*;

    #[test]
    fn test_state_u8_mapping() {
        for state in [
            TaskState::Scheduled,
            TaskState::Running,
            TaskState::Completed,
            TaskState::Cancelled,
        ] {
            assert_eq!(TaskState::from_u8(state.as_u8()), state);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Scheduled.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
    }
}

#[cfg(test)]
mod task_spec_tests {
    use super::*;

    #[test]
    fn test_once_spec() {
        let spec = TaskSpec::once(Affinity::Cooperative, 5);
        assert_eq!(spec.kind, TaskKind::OneShot);
        assert_eq!(spec.delay_ticks, 5);
        assert_eq!(spec.period_ticks(), None);
        assert!(!spec.is_repeating());
    }

    #[test]
    fn test_repeating_spec_zero_period_becomes_one() {
        let spec = TaskSpec::repeating(Affinity::Parallel, 0, 0);
        assert_eq!(spec.period_ticks(), Some(1));
        assert!(spec.is_repeating());
    }
}

#[cfg(test)]
mod task_handle_tests {
    use super::*;

    fn once() -> TaskHandle {
        TaskHandle::new(TaskId(1), TaskSpec::once(Affinity::Cooperative, 0))
    }

    fn repeating() -> TaskHandle {
        TaskHandle::new(TaskId(2), TaskSpec::repeating(Affinity::Cooperative, 0, 3))
    }

    #[test]
    fn test_one_shot_happy_path() {
        let handle = once();
        assert_eq!(handle.state(), TaskState::Scheduled);
        assert!(handle.begin_run());
        assert_eq!(handle.state(), TaskState::Running);
        assert!(handle.end_run());
        assert_eq!(handle.state(), TaskState::Completed);
        assert!(handle.is_finished());
    }

    #[test]
    fn test_repeating_returns_to_scheduled() {
        let handle = repeating();
        for _ in 0..3 {
            assert!(handle.begin_run());
            assert!(handle.end_run());
            assert_eq!(handle.state(), TaskState::Scheduled);
        }
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let handle = once();
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
        assert!(!handle.begin_run());
    }

    #[test]
    fn test_cancel_after_completion_is_noop() {
        let handle = once();
        handle.begin_run();
        handle.end_run();
        assert!(!handle.cancel());
        assert_eq!(handle.state(), TaskState::Completed);
    }

    #[test]
    fn test_cancel_while_running_stops_recurrence() {
        let handle = repeating();
        assert!(handle.begin_run());
        assert!(handle.cancel());
        assert!(!handle.end_run());
        assert_eq!(handle.state(), TaskState::Cancelled);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = once();
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle, clone);
    }

    #[test]
    fn test_complete_from_scheduled() {
        let handle = repeating();
        assert!(handle.complete());
        assert_eq!(handle.state(), TaskState::Completed);
        assert!(!handle.complete());
    }
}

#[cfg(test)]
mod scheduler_config_tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.async_workers, 0);
        assert_eq!(config.thread_name, "tick-async");
    }
}
