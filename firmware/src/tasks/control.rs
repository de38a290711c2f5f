//! 制御タスク
//!
//! - `pwm_period_task`: PWM周期ごとに電流を測定し、アクティブなタスクの出力を反映（高優先度）
//! - `main_check_task`: 1ms周期でスーパーバイザを進め、起動シーケンスとタスク切替を行う

use embassy_stm32::{
    adc::{Adc, AnyAdcChannel},
    peripherals,
};
use embassy_time::{Duration, Ticker};
use g4_foc::current_sense::CurrentSense;
use g4_foc::task::{BoardContext, Supervisor, TaskContext};
use g4_foc::voltage_monitor::VoltageMonitorConfig;
use g4_foc::TaskResult;

use crate::config::timing;
use crate::motor_driver::MotorDriver;
use crate::state::{self, BUS_VOLTAGE_RAW, CONFIG};

/// 高速パスが所有するペリフェラル
pub struct PwmPeriodResources {
    pub driver: MotorDriver,
    pub current_adc: Adc<'static, peripherals::ADC1>,
    pub phase_a: AnyAdcChannel<peripherals::ADC1>,
    pub phase_b: AnyAdcChannel<peripherals::ADC1>,
    pub bus_adc: Adc<'static, peripherals::ADC2>,
    pub bus_voltage: AnyAdcChannel<peripherals::ADC2>,
    pub current_sense: CurrentSense,
    pub bus_divider: VoltageMonitorConfig,
}

/// PWM周期タスク（割り込みエグゼキュータで実行）
#[embassy_executor::task]
pub async fn pwm_period_task(mut res: PwmPeriodResources, period: Duration) {
    info!("PWM period task started: {}us", period.as_micros());

    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;

        let raw = [
            res.current_adc.blocking_read(&mut res.phase_a),
            res.current_adc.blocking_read(&mut res.phase_b),
        ];
        let phase_currents = res.current_sense.phase_currents(raw);

        // タスクには瞬時値、電圧監視タスクには生値を渡す
        let bus_raw = res.bus_adc.blocking_read(&mut res.bus_voltage);
        BUS_VOLTAGE_RAW.lock(|cell| cell.set(bus_raw));
        let inverter_voltage = res.bus_divider.adc_to_voltage(bus_raw);

        let output = state::with_runner(|runner| runner.on_pwm_period(phase_currents, inverter_voltage));
        res.driver.apply(output);
    }
}

/// 最新の設定スナップショットからコンテキストを作成
///
/// 設定が無効なら直前のコンテキストを使い続ける。
async fn refresh_context(previous: TaskContext, board: BoardContext) -> TaskContext {
    let config = *CONFIG.lock().await;
    match TaskContext::new(config, board) {
        Ok(context) => context,
        Err(e) => {
            warn!("Config rejected (code {}), keeping previous", e.code());
            previous
        }
    }
}

/// メイン周期チェックタスク
///
/// 起動シーケンスはスーパーバイザが進める。タスクが終了したら
/// 最新の設定で次に生成するタスクのコンテキストを作り直す。
#[embassy_executor::task]
pub async fn main_check_task(mut supervisor: Supervisor) {
    info!("Main check task started");

    let board = *supervisor.context().board();
    let period = timing::MAIN_CHECK_PERIOD_MS as f32 / 1000.0;

    let mut ticker = Ticker::every(Duration::from_millis(timing::MAIN_CHECK_PERIOD_MS));
    let mut log_counter = 0u32;

    loop {
        ticker.next().await;

        let hw_status = state::voltage_state().hardware_status();
        let result =
            state::with_runner(|runner| supervisor.on_main_check(runner, period, &hw_status));

        if result.map_or(true, |r| r.is_terminal()) {
            if let Some(TaskResult::Failure(code)) = result {
                let name = state::with_runner(|runner| runner.last_result().map(|(name, _)| name));
                error!("Task {} failed with exit code {}", name.unwrap_or("?"), code);
            }
            let context = refresh_context(*supervisor.context(), board).await;
            supervisor.set_context(context);
        }

        log_counter += 1;
        if log_counter >= timing::STATUS_LOG_DECIMATION {
            log_counter = 0;
            let (name, pwm_periods, main_checks, failures, vars) = state::with_runner(|runner| {
                (
                    runner.active_name().unwrap_or("-"),
                    runner.pwm_periods().get(),
                    runner.main_checks().get(),
                    runner.task_failures().get(),
                    runner.debug_variables(),
                )
            });
            debug!(
                "[Status] stage={} task={} pwm={} checks={} failures={} vbus={}V vars={}",
                supervisor.stage(),
                name,
                pwm_periods,
                main_checks,
                failures,
                hw_status.bus_voltage,
                vars
            );
        }
    }
}
