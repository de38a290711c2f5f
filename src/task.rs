//! 制御タスクフレームワーク
//!
//! 各制御戦略（ビープ、始動、アイドル）は [`ControlTask`] を実装し、
//! 2つのリアルタイム入口から呼び出されます:
//!
//! - [`ControlTask::on_pwm_period`]: PWM周期ごと（高優先度）。3相出力を返す。
//! - [`ControlTask::on_main_check`]: メイン周期ごと（低優先度）。進捗/成功/失敗を返す。
//!
//! 次にどのタスクを実行するかは [`Supervisor`] が決めます。
//!
//! タスクの集合は閉じているため、動的ディスパッチではなく [`Task`] 列挙型の
//! `match` で振り分けます。ヒープ割り当ては行いません。

pub mod beeping;
pub mod context;
pub mod counter;
pub mod idle;
pub mod runner;
pub mod spinup;
pub mod supervisor;

pub use beeping::BeepingTask;
pub use context::{BoardContext, HardwareStatus, PwmTiming, TaskContext};
pub use counter::EventCounter;
pub use idle::IdleTask;
pub use runner::TaskRunner;
pub use spinup::SpinupTask;
pub use supervisor::{BootSequence, Supervisor};

use crate::math::{Scalar, Vector};

/// デバッグ変数の数
pub const NUM_DEBUG_VARIABLES: usize = 7;

/// テレメトリ用のデバッグ変数
pub type DebugVariables = [Scalar; NUM_DEBUG_VARIABLES];

/// タスク失敗理由を表す小さな整数
pub type ExitCode = u8;

/// PWM周期ごとの出力
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmOutput {
    /// 各相の変調率 (0.0-1.0)
    pub phases: Vector<3>,
    /// ドライバ段を有効に保つか
    pub driver_active: bool,
}

impl PwmOutput {
    /// ドライバ段を解放した安全状態
    pub const INACTIVE: Self = Self {
        phases: [0.0; 3],
        driver_active: false,
    };

    /// ドライバ有効のまま電流を指令しない状態
    pub const ZERO_ACTIVE: Self = Self {
        phases: [0.0; 3],
        driver_active: true,
    };
}

/// メイン周期チェックの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskResult {
    InProgress,
    Success,
    Failure(ExitCode),
}

impl TaskResult {
    /// 成功または失敗（以後タスクは呼び出されない）
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// 制御戦略の共通インターフェース
pub trait ControlTask {
    /// タスク識別名
    fn name(&self) -> &'static str;

    /// PWM周期ごとの出力計算
    ///
    /// 割り込みコンテキストから呼ばれる。割り当て・ブロッキング禁止、
    /// 同じ内部状態と入力に対して常に同じ出力を返すこと。
    ///
    /// # 引数
    /// * `phase_currents_ab` - A相・B相の測定電流 [A]（C相は平衡条件から導出）
    /// * `inverter_voltage` - 測定インバータ電圧 [V]
    fn on_pwm_period(&mut self, phase_currents_ab: Vector<2>, inverter_voltage: Scalar)
        -> PwmOutput;

    /// メイン周期ごとの状態チェック
    ///
    /// # 引数
    /// * `period` - 前回呼び出しからの経過時間 [s]
    /// * `hw_status` - ボード状態
    fn on_main_check(&mut self, period: Scalar, hw_status: &HardwareStatus) -> TaskResult;

    /// テレメトリ用デバッグ変数
    fn debug_variables(&self) -> DebugVariables;
}

/// 全制御タスク
///
/// タスク切替時に一度だけ構築され、以後は静的な `match` で振り分ける。
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Idle(IdleTask),
    Beeping(BeepingTask),
    Spinup(SpinupTask),
}

impl ControlTask for Task {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle(task) => task.name(),
            Self::Beeping(task) => task.name(),
            Self::Spinup(task) => task.name(),
        }
    }

    #[inline]
    fn on_pwm_period(&mut self, phase_currents_ab: Vector<2>, inverter_voltage: Scalar) -> PwmOutput {
        match self {
            Self::Idle(task) => task.on_pwm_period(phase_currents_ab, inverter_voltage),
            Self::Beeping(task) => task.on_pwm_period(phase_currents_ab, inverter_voltage),
            Self::Spinup(task) => task.on_pwm_period(phase_currents_ab, inverter_voltage),
        }
    }

    fn on_main_check(&mut self, period: Scalar, hw_status: &HardwareStatus) -> TaskResult {
        match self {
            Self::Idle(task) => task.on_main_check(period, hw_status),
            Self::Beeping(task) => task.on_main_check(period, hw_status),
            Self::Spinup(task) => task.on_main_check(period, hw_status),
        }
    }

    fn debug_variables(&self) -> DebugVariables {
        match self {
            Self::Idle(task) => task.debug_variables(),
            Self::Beeping(task) => task.debug_variables(),
            Self::Spinup(task) => task.debug_variables(),
        }
    }
}

impl From<IdleTask> for Task {
    fn from(task: IdleTask) -> Self {
        Self::Idle(task)
    }
}

impl From<BeepingTask> for Task {
    fn from(task: BeepingTask) -> Self {
        Self::Beeping(task)
    }
}

impl From<SpinupTask> for Task {
    fn from(task: SpinupTask) -> Self {
        Self::Spinup(task)
    }
}

#[cfg(test)]
mod tests {
    use super::context::test_support::*;
    use super::*;

    #[test]
    fn test_task_result_terminal() {
        assert!(!TaskResult::InProgress.is_terminal());
        assert!(TaskResult::Success.is_terminal());
        assert!(TaskResult::Failure(1).is_terminal());
    }

    #[test]
    fn test_task_dispatch_names() {
        let context = context_with_period(50.0e-6);
        let tasks = [
            Task::from(IdleTask::new(context)),
            Task::from(BeepingTask::new(context, 1000.0, 0.5)),
            Task::from(SpinupTask::new(context)),
        ];
        let names: Vec<_> = tasks.iter().map(|task| task.name()).collect();
        assert_eq!(names, ["idle", "beep", "spinup"]);
    }

    #[test]
    fn test_task_dispatch_forwards_state() {
        let context = context_with_period(1.0e-3);
        let mut task = Task::from(BeepingTask::new(context, 1000.0, 0.5));
        let output = task.on_pwm_period([0.0, 0.0], 24.0);
        assert!(output.driver_active);
        assert_eq!(output.phases, [1.0, 0.0, 0.0]);
        assert_eq!(task.on_main_check(1.0e-3, &POWER_OK), TaskResult::InProgress);
        assert_eq!(task.on_main_check(1.0e-3, &POWER_FAULT), TaskResult::Failure(1));
    }
}
