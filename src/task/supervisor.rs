//! タスクスーパーバイザ
//!
//! 起動シーケンス（電源確立待ち → 起動ビープ → アイドル）を進め、
//! 終了したタスクの後に何を実行するかを決めます。
//! 失敗したタスクの後は常にアイドルへ戻ります。

use super::{BeepingTask, HardwareStatus, IdleTask, SpinupTask, Task, TaskContext, TaskResult, TaskRunner};
use crate::math::Scalar;

/// 起動シーケンス設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootSequence {
    /// 起動ビープ周波数 [Hz]
    pub beep_frequency: Scalar,
    /// 起動ビープ継続時間 [s]
    pub beep_duration: Scalar,
    /// ビープ成功後にオープンループ始動を行う
    pub spinup_after_beep: bool,
}

/// 起動シーケンスの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// 電源電圧が正常になるまでアイドルで待機
    WaitingForPower,
    Beeping,
    SpinningUp,
    /// 起動シーケンス完了
    Running,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Supervisor {
    context: TaskContext,
    sequence: BootSequence,
    stage: Stage,
}

impl Supervisor {
    pub fn new(context: TaskContext, sequence: BootSequence) -> Self {
        Self {
            context,
            sequence,
            stage: Stage::WaitingForPower,
        }
    }

    /// アイドルタスクで起動シーケンスを開始
    pub fn begin(&mut self, runner: &mut TaskRunner) {
        self.stage = Stage::WaitingForPower;
        runner.start(IdleTask::new(self.context));
    }

    /// 以後に生成するタスクのコンテキストを差し替え
    pub fn set_context(&mut self, context: TaskContext) {
        self.context = context;
    }

    pub fn context(&self) -> &TaskContext {
        &self.context
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// メイン周期チェック
    ///
    /// 電源が確立した最初の周期で起動ビープを開始する。アクティブなタスクが
    /// 終了した（またはタスクがない）場合は次のタスクを開始する。
    /// 戻り値はランナーの結果そのまま。
    pub fn on_main_check(
        &mut self,
        runner: &mut TaskRunner,
        period: Scalar,
        hw_status: &HardwareStatus,
    ) -> Option<TaskResult> {
        if self.stage == Stage::WaitingForPower && hw_status.power_ok {
            info!("power good: {}V, starting power-on beep", hw_status.bus_voltage);
            runner.start(BeepingTask::new(
                self.context,
                self.sequence.beep_frequency,
                self.sequence.beep_duration,
            ));
            self.stage = Stage::Beeping;
        }

        let result = runner.on_main_check(period, hw_status);
        if result.map_or(true, |r| r.is_terminal()) {
            self.advance(runner, result);
        }
        result
    }

    fn advance(&mut self, runner: &mut TaskRunner, result: Option<TaskResult>) {
        let (stage, next): (Stage, Task) = match self.stage {
            Stage::WaitingForPower => (Stage::WaitingForPower, IdleTask::new(self.context).into()),
            Stage::Beeping
                if self.sequence.spinup_after_beep && result == Some(TaskResult::Success) =>
            {
                (Stage::SpinningUp, SpinupTask::new(self.context).into())
            }
            _ => (Stage::Running, IdleTask::new(self.context).into()),
        };
        self.stage = stage;
        runner.start(next);
    }
}
