//! オープンループ始動タスク
//!
//! q軸電圧を固定し、電気角速度を0から目標値まで一定加速度で上げます。
//! 位置センサを使わないため、回転子が追従しているかは判定しません。

use super::{
    ControlTask, DebugVariables, ExitCode, HardwareStatus, PwmOutput, TaskContext, TaskResult,
};
use crate::foc::units::{convert_rotation_rate_mechanical_to_electrical, convert_rpm_to_angular_velocity};
use crate::foc::{clarke, inverse_park, normalize_angle, svpwm};
use crate::math::{Range, Scalar, Vector, SQRT_3};

#[derive(Debug, Clone, PartialEq)]
pub struct SpinupTask {
    context: TaskContext,
    /// q軸電圧指令 [V]
    voltage: Scalar,
    /// 電気角加速度 [rad/s²]
    acceleration: Scalar,
    /// 目標電気角速度 [rad/s]
    target_velocity: Scalar,
    /// 電気角速度 [rad/s]
    velocity: Scalar,
    /// 電気角 [rad]
    angle: Scalar,
    /// 経過時間 [s]
    elapsed: Scalar,
    /// 直近のインバータ電圧 [V]（PWM周期が一度も来ていなければNone）
    last_inverter_voltage: Option<Scalar>,
    /// 直近の電流 [A] (α, β)
    last_current_ab: Vector<2>,
}

/// 機械RPM → 電気角速度 [rad/s]
fn electrical_rad_per_sec(rpm: Scalar, num_poles: u32) -> Scalar {
    // 極数はTaskContext生成時に検証済み
    convert_rotation_rate_mechanical_to_electrical(convert_rpm_to_angular_velocity(rpm), num_poles)
        .unwrap_or(0.0)
}

impl SpinupTask {
    /// 電源異常
    pub const EXIT_CODE_BAD_HARDWARE_STATUS: ExitCode = 1;
    /// 目標速度に到達する前にタイムアウト
    pub const EXIT_CODE_TIMEOUT: ExitCode = 2;
    /// インバータ電圧が指令電圧を出力するのに不足
    pub const EXIT_CODE_LOW_INVERTER_VOLTAGE: ExitCode = 3;

    pub fn new(context: TaskContext) -> Self {
        let controller = &context.config().controller;
        let num_poles = context.config().motor.num_poles;

        let voltage = Range::new(0.0, controller.max_voltage).constrain(controller.spinup_voltage);
        let acceleration =
            electrical_rad_per_sec(controller.spinup_acceleration_rpm_per_s, num_poles);
        let target_velocity = electrical_rad_per_sec(controller.spinup_target_rpm, num_poles);

        Self {
            context,
            voltage,
            acceleration,
            target_velocity,
            velocity: 0.0,
            angle: 0.0,
            elapsed: 0.0,
            last_inverter_voltage: None,
            last_current_ab: [0.0; 2],
        }
    }

    /// 電気角速度 [rad/s]
    pub fn velocity(&self) -> Scalar {
        self.velocity
    }

    /// 目標電気角速度 [rad/s]
    pub fn target_velocity(&self) -> Scalar {
        self.target_velocity
    }

    /// 指令電圧を線形変調域で出すのに必要なインバータ電圧 [V]
    pub fn min_inverter_voltage(&self) -> Scalar {
        self.voltage * SQRT_3
    }
}

impl ControlTask for SpinupTask {
    fn name(&self) -> &'static str {
        "spinup"
    }

    fn on_pwm_period(&mut self, phase_currents_ab: Vector<2>, inverter_voltage: Scalar) -> PwmOutput {
        let dt = self.context.board().pwm.period;

        self.last_current_ab = clarke(phase_currents_ab);
        self.last_inverter_voltage = Some(inverter_voltage);

        self.velocity = (self.velocity + self.acceleration * dt).min(self.target_velocity);
        self.angle = normalize_angle(self.angle + self.velocity * dt);

        let [v_alpha, v_beta] = inverse_park(0.0, self.voltage, self.angle);

        PwmOutput {
            phases: svpwm(v_alpha, v_beta, inverter_voltage),
            driver_active: true,
        }
    }

    fn on_main_check(&mut self, period: Scalar, hw_status: &HardwareStatus) -> TaskResult {
        self.elapsed += period;

        if !hw_status.power_ok {
            return TaskResult::Failure(Self::EXIT_CODE_BAD_HARDWARE_STATUS);
        }

        if self.velocity >= self.target_velocity {
            return TaskResult::Success;
        }

        if self.elapsed > self.context.config().controller.spinup_timeout {
            return TaskResult::Failure(Self::EXIT_CODE_TIMEOUT);
        }

        match self.last_inverter_voltage {
            Some(v) if v < self.min_inverter_voltage() => {
                TaskResult::Failure(Self::EXIT_CODE_LOW_INVERTER_VOLTAGE)
            }
            _ => TaskResult::InProgress,
        }
    }

    fn debug_variables(&self) -> DebugVariables {
        [
            self.angle,
            self.velocity,
            self.target_velocity,
            self.voltage,
            self.last_inverter_voltage.unwrap_or(0.0),
            self.last_current_ab[0],
            self.last_current_ab[1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::test_support::*;
    use super::*;
    use crate::config::ConfigSnapshot;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn context_with_config(config: ConfigSnapshot) -> TaskContext {
        TaskContext::new(config, board_with_period(50.0e-6)).unwrap()
    }

    #[test]
    fn test_target_velocity_uses_pole_pairs() {
        let task = SpinupTask::new(context_with_period(50.0e-6));
        // 500 RPM mechanical, 6 pole pairs → 3000 RPM electrical
        let expected = 3000.0 * 2.0 * core::f32::consts::PI / 60.0;
        assert!(approx_eq(task.target_velocity(), expected));
    }

    #[test]
    fn test_small_spinup_voltage_kept() {
        let mut config = ConfigSnapshot::default();
        config.controller.spinup_voltage = 1.0e-3;
        let task = SpinupTask::new(context_with_config(config));
        assert!(approx_eq(task.voltage, 1.0e-3));
        assert!(task.min_inverter_voltage() < 0.01);
    }

    #[test]
    fn test_outputs_stay_in_modulation_range() {
        let mut task = SpinupTask::new(context_with_period(50.0e-6));
        for _ in 0..5000 {
            let output = task.on_pwm_period([0.5, -0.25], 24.0);
            assert!(output.driver_active);
            for phase in output.phases {
                assert!((0.0..=1.0).contains(&phase), "phase {}", phase);
            }
        }
    }

    #[test]
    fn test_zero_bus_voltage_gives_midpoint() {
        let mut task = SpinupTask::new(context_with_period(50.0e-6));
        let output = task.on_pwm_period([0.0, 0.0], 0.0);
        assert_eq!(output.phases, crate::foc::svpwm::MIDPOINT);
    }

    #[test]
    fn test_reaches_target_then_succeeds() {
        let mut task = SpinupTask::new(context_with_period(50.0e-6));

        // 20 kHz PWM, 1 kHz main check
        let mut result = TaskResult::InProgress;
        let mut main_checks = 0;
        while result == TaskResult::InProgress && main_checks < 3000 {
            for _ in 0..20 {
                task.on_pwm_period([0.0, 0.0], 24.0);
            }
            result = task.on_main_check(1.0e-3, &POWER_OK);
            main_checks += 1;
        }

        assert_eq!(result, TaskResult::Success);
        // 500 RPM/s to 500 RPM takes one second
        assert!((995..=1005).contains(&main_checks), "took {} checks", main_checks);
        assert!(approx_eq(task.velocity(), task.target_velocity()));
    }

    #[test]
    fn test_timeout_failure() {
        let mut config = ConfigSnapshot::default();
        config.controller.spinup_timeout = 0.1;
        let mut task = SpinupTask::new(context_with_config(config));

        let mut result = TaskResult::InProgress;
        for _ in 0..200 {
            for _ in 0..20 {
                task.on_pwm_period([0.0, 0.0], 24.0);
            }
            result = task.on_main_check(1.0e-3, &POWER_OK);
            if result.is_terminal() {
                break;
            }
        }
        assert_eq!(result, TaskResult::Failure(SpinupTask::EXIT_CODE_TIMEOUT));
    }

    #[test]
    fn test_low_inverter_voltage_failure() {
        let mut task = SpinupTask::new(context_with_period(50.0e-6));
        // 2 V × √3 ≈ 3.46 V required
        task.on_pwm_period([0.0, 0.0], 3.0);
        assert_eq!(
            task.on_main_check(1.0e-3, &POWER_OK),
            TaskResult::Failure(SpinupTask::EXIT_CODE_LOW_INVERTER_VOLTAGE)
        );
    }

    #[test]
    fn test_no_voltage_check_before_first_period() {
        let mut task = SpinupTask::new(context_with_period(50.0e-6));
        assert_eq!(task.on_main_check(1.0e-3, &POWER_OK), TaskResult::InProgress);
    }

    #[test]
    fn test_power_fault_failure() {
        let mut task = SpinupTask::new(context_with_period(50.0e-6));
        task.on_pwm_period([0.0, 0.0], 24.0);
        assert_eq!(
            task.on_main_check(1.0e-3, &POWER_FAULT),
            TaskResult::Failure(SpinupTask::EXIT_CODE_BAD_HARDWARE_STATUS)
        );
    }

    #[test]
    fn test_debug_variables_track_state() {
        let mut task = SpinupTask::new(context_with_period(50.0e-6));
        task.on_pwm_period([1.0, 0.0], 24.0);
        let vars = task.debug_variables();
        assert!(vars[0] > 0.0);
        assert!(vars[1] > 0.0);
        assert_eq!(vars[4], 24.0);
        // clarke([1, 0]) = [1, 1/√3]
        assert!(approx_eq(vars[5], 1.0));
        assert!(approx_eq(vars[6], 1.0 / SQRT_3));
    }
}
