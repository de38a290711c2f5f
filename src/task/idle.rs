//! アイドルタスク
//!
//! ドライバ段を解放したまま待機します。終了しません。

use super::{ControlTask, DebugVariables, HardwareStatus, PwmOutput, TaskContext, TaskResult};
use crate::math::{Scalar, Vector};

#[derive(Debug, Clone, PartialEq)]
pub struct IdleTask {
    context: TaskContext,
}

impl IdleTask {
    pub fn new(context: TaskContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &TaskContext {
        &self.context
    }
}

impl ControlTask for IdleTask {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn on_pwm_period(&mut self, _phase_currents_ab: Vector<2>, _inverter_voltage: Scalar) -> PwmOutput {
        PwmOutput::INACTIVE
    }

    fn on_main_check(&mut self, _period: Scalar, _hw_status: &HardwareStatus) -> TaskResult {
        TaskResult::InProgress
    }

    fn debug_variables(&self) -> DebugVariables {
        [0.0; super::NUM_DEBUG_VARIABLES]
    }
}
