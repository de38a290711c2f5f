//! 診断用ビープタスク
//!
//! 3相に順番に単発パルスを印加してモーター巻線を鳴らします。
//! 周波数と継続時間は生成時に安全範囲へ制限され、以後の検証は不要です。

use super::{
    ControlTask, DebugVariables, ExitCode, HardwareStatus, PwmOutput, TaskContext, TaskResult,
};
use crate::math::{Range, Scalar, Vector};

/// ビープタスク
#[derive(Debug, Clone, PartialEq)]
pub struct BeepingTask {
    context: TaskContext,
    /// 励磁周期 [s]（制限済み周波数の逆数）
    excitation_period: Scalar,
    /// 残り時間 [s]
    remaining_duration: Scalar,
    /// 次の励磁までの時間 [s]
    time_to_next_excitation: Scalar,
    /// 次に励磁する相（mod 3で使用）
    next_phase_index: u32,
}

impl BeepingTask {
    /// 継続時間の安全範囲 [s]
    pub const DURATION_LIMITS: Range = Range::new(0.0, 3.0);
    /// 周波数の安全範囲 [Hz]
    pub const FREQUENCY_LIMITS: Range = Range::new(100.0, 15_000.0);

    /// 電源異常
    pub const EXIT_CODE_BAD_HARDWARE_STATUS: ExitCode = 1;

    /// 新しいビープタスクを作成
    ///
    /// # 引数
    /// * `context` - タスクコンテキスト
    /// * `frequency` - ビープ周波数 [Hz]（100Hz～15kHzに制限）
    /// * `duration` - 継続時間 [s]（0～3sに制限）
    pub fn new(context: TaskContext, frequency: Scalar, duration: Scalar) -> Self {
        let excitation_period = 1.0 / Self::FREQUENCY_LIMITS.constrain(frequency);
        Self {
            context,
            excitation_period,
            remaining_duration: Self::DURATION_LIMITS.constrain(duration),
            time_to_next_excitation: excitation_period,
            next_phase_index: 0,
        }
    }

    /// 励磁周期 [s]
    pub fn excitation_period(&self) -> Scalar {
        self.excitation_period
    }

    /// 残り時間 [s]
    pub fn remaining_duration(&self) -> Scalar {
        self.remaining_duration
    }
}

impl ControlTask for BeepingTask {
    fn name(&self) -> &'static str {
        "beep"
    }

    fn on_pwm_period(&mut self, _phase_currents_ab: Vector<2>, _inverter_voltage: Scalar) -> PwmOutput {
        // 残り時間が負になったらドライバを解放
        if self.remaining_duration < 0.0 {
            return PwmOutput::INACTIVE;
        }

        let pwm_period = self.context.board().pwm.period;
        self.remaining_duration -= pwm_period;
        self.time_to_next_excitation -= pwm_period;

        if self.time_to_next_excitation <= 0.0 {
            self.time_to_next_excitation += self.excitation_period;

            let mut phases = [0.0; 3];
            phases[(self.next_phase_index % 3) as usize] = 1.0;
            self.next_phase_index = self.next_phase_index.wrapping_add(1);

            PwmOutput {
                phases,
                driver_active: true,
            }
        } else {
            // パルス間もドライバは有効のまま
            PwmOutput::ZERO_ACTIVE
        }
    }

    fn on_main_check(&mut self, _period: Scalar, hw_status: &HardwareStatus) -> TaskResult {
        if !hw_status.power_ok {
            return TaskResult::Failure(Self::EXIT_CODE_BAD_HARDWARE_STATUS);
        }

        if self.remaining_duration <= 0.0 {
            return TaskResult::Success;
        }

        TaskResult::InProgress
    }

    fn debug_variables(&self) -> DebugVariables {
        [
            self.remaining_duration,
            self.time_to_next_excitation,
            self.excitation_period,
            (self.next_phase_index % 3) as Scalar,
            0.0,
            0.0,
            0.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::test_support::*;
    use super::*;

    const EPSILON: f32 = 1.0e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    /// Index of the phase carrying the pulse, if any
    fn pulse_phase(output: &PwmOutput) -> Option<usize> {
        output.phases.iter().position(|&p| p == 1.0)
    }

    #[test]
    fn test_frequency_clamping() {
        let context = context_with_period(50.0e-6);
        for &(requested, effective) in &[
            (10.0, 100.0),
            (-5.0, 100.0),
            (1_000.0, 1_000.0),
            (20_000.0, 15_000.0),
            (f32::INFINITY, 15_000.0),
            (f32::NAN, 100.0),
        ] {
            let task = BeepingTask::new(context, requested, 1.0);
            assert!(approx_eq(task.excitation_period(), 1.0 / effective));
        }
    }

    #[test]
    fn test_duration_clamping() {
        let context = context_with_period(50.0e-6);
        assert_eq!(BeepingTask::new(context, 1000.0, 10.0).remaining_duration(), 3.0);
        assert_eq!(BeepingTask::new(context, 1000.0, -1.0).remaining_duration(), 0.0);
        assert_eq!(BeepingTask::new(context, 1000.0, f32::NAN).remaining_duration(), 0.0);
    }

    #[test]
    fn test_driver_released_after_clamped_duration() {
        // 2^-10 s periods keep the arithmetic exact
        let period = 1.0 / 1024.0;
        let context = context_with_period(period);
        let mut task = BeepingTask::new(context, 1000.0, 100.0);

        let mut active_periods = 0u32;
        for _ in 0..4000 {
            if task.on_pwm_period([0.0, 0.0], 24.0).driver_active {
                active_periods += 1;
            } else {
                break;
            }
        }

        // Duration clamps to 3 s = 3072 periods; the period that brings the
        // remaining time to exactly zero is still driven
        assert_eq!(active_periods, 3073);
        assert_eq!(task.on_pwm_period([0.0, 0.0], 24.0), PwmOutput::INACTIVE);
    }

    #[test]
    fn test_zero_duration_drives_single_period() {
        let context = context_with_period(1.0 / 1024.0);
        let mut task = BeepingTask::new(context, 1000.0, -3.0);
        assert_eq!(task.on_main_check(0.001, &POWER_OK), TaskResult::Success);
        assert!(task.on_pwm_period([0.0, 0.0], 24.0).driver_active);
        assert_eq!(task.on_pwm_period([0.0, 0.0], 24.0), PwmOutput::INACTIVE);
    }

    #[test]
    fn test_power_fault_fails_regardless_of_duration() {
        let context = context_with_period(50.0e-6);

        let mut task = BeepingTask::new(context, 1000.0, 1.0);
        assert_eq!(
            task.on_main_check(0.001, &POWER_FAULT),
            TaskResult::Failure(BeepingTask::EXIT_CODE_BAD_HARDWARE_STATUS)
        );

        let mut exhausted = BeepingTask::new(context, 1000.0, 0.0);
        assert_eq!(
            exhausted.on_main_check(0.001, &POWER_FAULT),
            TaskResult::Failure(BeepingTask::EXIT_CODE_BAD_HARDWARE_STATUS)
        );
    }

    #[test]
    fn test_success_when_duration_exhausted() {
        let context = context_with_period(50.0e-6);
        let mut task = BeepingTask::new(context, 1000.0, 0.0);
        assert_eq!(task.on_main_check(0.001, &POWER_OK), TaskResult::Success);
    }

    #[test]
    fn test_exact_pulse_schedule() {
        // 1024 Hz tone, 8192 Hz PWM: a pulse every 8 periods, exactly
        let context = context_with_period(1.0 / 8192.0);
        let mut task = BeepingTask::new(context, 1024.0, 0.5);

        let mut pulses = Vec::new();
        for n in 1..=64u32 {
            let output = task.on_pwm_period([0.0, 0.0], 24.0);
            assert!(output.driver_active);
            if let Some(phase) = pulse_phase(&output) {
                pulses.push((n, phase));
            }
        }

        let expected: Vec<_> = (1..=8u32).map(|k| (8 * k, ((k - 1) % 3) as usize)).collect();
        assert_eq!(pulses, expected);
    }

    #[test]
    fn test_beep_scenario_1khz_one_second() {
        let pwm_period = 1.0e-4;
        let main_period = 1.0e-3;
        let context = context_with_period(pwm_period);
        let mut task = BeepingTask::new(context, 1000.0, 1.0);

        let mut elapsed = 0.0f64;
        let mut pulse_times = Vec::new();
        let mut expected_phase = 0usize;
        let mut success_at = None;

        'outer: for _ in 0..1100 {
            for _ in 0..10 {
                let output = task.on_pwm_period([0.0, 0.0], 24.0);
                elapsed += pwm_period as f64;
                // The duration may run out one PWM period before the main check sees it
                assert!(
                    output.driver_active || elapsed > 1.0 - 2.0e-3,
                    "driver released early at {}",
                    elapsed
                );
                if let Some(phase) = pulse_phase(&output) {
                    assert_eq!(phase, expected_phase);
                    expected_phase = (expected_phase + 1) % 3;
                    pulse_times.push(elapsed);
                }
            }
            match task.on_main_check(main_period, &POWER_OK) {
                TaskResult::InProgress => {}
                TaskResult::Success => {
                    success_at = Some(elapsed);
                    break 'outer;
                }
                other => panic!("unexpected result {:?}", other),
            }
        }

        let success_at = success_at.expect("task never completed");
        assert!((success_at - 1.0).abs() <= 2.0e-3, "completed at {}", success_at);

        // One pulse per millisecond
        assert!(pulse_times.len() >= 990);
        for pair in pulse_times.windows(2) {
            let interval = pair[1] - pair[0];
            assert!((interval - 1.0e-3).abs() <= 1.5e-4, "interval {}", interval);
        }
    }

    #[test]
    fn test_phase_index_wraps() {
        let context = context_with_period(1.0e-3);
        let mut task = BeepingTask::new(context, 1000.0, 1.0);
        task.next_phase_index = u32::MAX;
        // u32::MAX % 3 == 0, then wraps to 0
        let first = task.on_pwm_period([0.0, 0.0], 24.0);
        assert_eq!(pulse_phase(&first), Some(0));
        let second = task.on_pwm_period([0.0, 0.0], 24.0);
        assert_eq!(pulse_phase(&second), Some(0));
    }
}
