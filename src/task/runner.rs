//! タスクランナー
//!
//! アクティブなタスクを1つ保持し、2つのリアルタイム入口から呼び出します。
//! 終了結果（成功/失敗）を返したタスクは同じ呼び出し内で破棄され、
//! 以後の PWM 周期ではドライバ段が解放されます。

use super::{ControlTask, DebugVariables, EventCounter, HardwareStatus, PwmOutput, Task, TaskResult};
use crate::math::{Scalar, Vector};

#[derive(Debug)]
pub struct TaskRunner {
    active: Option<Task>,
    last_result: Option<(&'static str, TaskResult)>,
    pwm_periods: EventCounter,
    main_checks: EventCounter,
    task_failures: EventCounter,
}

impl TaskRunner {
    pub const fn new() -> Self {
        Self {
            active: None,
            last_result: None,
            pwm_periods: EventCounter::new(),
            main_checks: EventCounter::new(),
            task_failures: EventCounter::new(),
        }
    }

    /// タスクを開始し、それまでのタスクを返す
    pub fn start(&mut self, task: impl Into<Task>) -> Option<Task> {
        let task = task.into();
        info!("task start: {}", task.name());
        self.active.replace(task)
    }

    /// アクティブなタスクを停止
    pub fn stop(&mut self) -> Option<Task> {
        self.active.take()
    }

    /// PWM周期処理（割り込みコンテキスト）
    ///
    /// アクティブなタスクがなければドライバを解放する。
    #[inline]
    pub fn on_pwm_period(&mut self, phase_currents_ab: Vector<2>, inverter_voltage: Scalar) -> PwmOutput {
        self.pwm_periods.increment();
        match self.active.as_mut() {
            Some(task) => task.on_pwm_period(phase_currents_ab, inverter_voltage),
            None => PwmOutput::INACTIVE,
        }
    }

    /// メイン周期チェック
    ///
    /// アクティブなタスクがなければ `None`。
    pub fn on_main_check(&mut self, period: Scalar, hw_status: &HardwareStatus) -> Option<TaskResult> {
        let task = self.active.as_mut()?;
        self.main_checks.increment();

        let result = task.on_main_check(period, hw_status);
        if result.is_terminal() {
            let name = task.name();
            if let TaskResult::Failure(code) = result {
                self.task_failures.increment();
                warn!("task {} failed: exit code {}", name, code);
            } else {
                info!("task {} finished", name);
            }
            self.last_result = Some((name, result));
            self.active = None;
        }
        Some(result)
    }

    /// アクティブなタスク名
    pub fn active_name(&self) -> Option<&'static str> {
        self.active.as_ref().map(|task| task.name())
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.active, None | Some(Task::Idle(_)))
    }

    /// アクティブなタスクのデバッグ変数（なければゼロ）
    pub fn debug_variables(&self) -> DebugVariables {
        self.active
            .as_ref()
            .map(|task| task.debug_variables())
            .unwrap_or([0.0; super::NUM_DEBUG_VARIABLES])
    }

    /// 最後に終了したタスクの名前と結果
    pub fn last_result(&self) -> Option<(&'static str, TaskResult)> {
        self.last_result
    }

    pub fn pwm_periods(&self) -> EventCounter {
        self.pwm_periods
    }

    pub fn main_checks(&self) -> EventCounter {
        self.main_checks
    }

    pub fn task_failures(&self) -> EventCounter {
        self.task_failures
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::test_support::*;
    use super::super::{BeepingTask, IdleTask};
    use super::*;

    #[test]
    fn test_no_task_releases_driver() {
        let mut runner = TaskRunner::new();
        assert_eq!(runner.on_pwm_period([0.0, 0.0], 24.0), PwmOutput::INACTIVE);
        assert_eq!(runner.on_main_check(1.0e-3, &POWER_OK), None);
        assert_eq!(runner.active_name(), None);
        assert_eq!(runner.debug_variables(), [0.0; 7]);
        assert_eq!(runner.pwm_periods().get(), 1);
        assert_eq!(runner.main_checks().get(), 0);
    }

    #[test]
    fn test_start_replaces_previous_task() {
        let context = context_with_period(1.0e-3);
        let mut runner = TaskRunner::new();
        assert!(runner.start(IdleTask::new(context)).is_none());
        assert!(runner.is_idle());

        let previous = runner.start(BeepingTask::new(context, 1000.0, 0.5));
        assert_eq!(previous.map(|task| task.name()), Some("idle"));
        assert_eq!(runner.active_name(), Some("beep"));
        assert!(!runner.is_idle());
    }

    #[test]
    fn test_terminal_result_drops_task() {
        let context = context_with_period(1.0 / 1024.0);
        let mut runner = TaskRunner::new();
        runner.start(BeepingTask::new(context, 1000.0, 4.0 / 1024.0));

        let mut results = Vec::new();
        for _ in 0..10 {
            runner.on_pwm_period([0.0, 0.0], 24.0);
            if let Some(result) = runner.on_main_check(1.0 / 1024.0, &POWER_OK) {
                results.push(result);
            }
        }

        assert_eq!(
            results,
            [
                TaskResult::InProgress,
                TaskResult::InProgress,
                TaskResult::InProgress,
                TaskResult::Success
            ]
        );
        assert_eq!(runner.active_name(), None);
        assert_eq!(runner.last_result(), Some(("beep", TaskResult::Success)));
        assert_eq!(runner.main_checks().get(), 4);
        assert_eq!(runner.pwm_periods().get(), 10);
        assert_eq!(runner.task_failures().get(), 0);

        // 終了後はドライバ解放
        assert_eq!(runner.on_pwm_period([0.0, 0.0], 24.0), PwmOutput::INACTIVE);
    }

    #[test]
    fn test_failure_counted() {
        let context = context_with_period(1.0e-3);
        let mut runner = TaskRunner::new();
        runner.start(BeepingTask::new(context, 1000.0, 1.0));
        assert_eq!(
            runner.on_main_check(1.0e-3, &POWER_FAULT),
            Some(TaskResult::Failure(BeepingTask::EXIT_CODE_BAD_HARDWARE_STATUS))
        );
        assert_eq!(runner.task_failures().get(), 1);
        assert_eq!(
            runner.last_result(),
            Some(("beep", TaskResult::Failure(BeepingTask::EXIT_CODE_BAD_HARDWARE_STATUS)))
        );
        assert_eq!(runner.on_main_check(1.0e-3, &POWER_FAULT), None);
    }

    #[test]
    fn test_debug_variables_forwarded() {
        let context = context_with_period(1.0e-3);
        let mut runner = TaskRunner::new();
        runner.start(BeepingTask::new(context, 500.0, 1.0));
        let vars = runner.debug_variables();
        assert_eq!(vars[0], 1.0);
        assert!((vars[2] - 2.0e-3).abs() < 1.0e-6);
    }
}
