#![no_std]
#![no_main]

mod fmt;

mod board;
mod config;
mod motor_driver;
mod state;
mod tasks;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::{
    adc::{Adc, AdcChannel, SampleTime},
    gpio::OutputType,
    interrupt::{self, InterruptExt, Priority},
    time::{khz, Hertz},
    timer::{
        complementary_pwm::{ComplementaryPwm, ComplementaryPwmPin},
        low_level::CountingMode,
        simple_pwm::{PwmPin, SimplePwm},
    },
};
use embassy_time::{Duration, Timer};
use g4_foc::board::FatalError;
use g4_foc::current_sense::{CurrentSense, CurrentSenseConfig};
use g4_foc::task::{BoardContext, PwmTiming, Supervisor, TaskContext};
use g4_foc::voltage_monitor::VoltageMonitor;

use motor_driver::MotorDriver;
use tasks::{led_task, main_check_task, pwm_period_task, voltage_monitor_task, PwmPeriodResources};

/// 高速パス用エグゼキュータ
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn UART4() {
    EXECUTOR_HIGH.on_interrupt();
}

/// 高速パスの割り込み優先度
const FAST_PATH_PRIORITY: Priority = Priority::P6;

// 時刻ドライバ（P0）を横取りしないこと
const _: () = core::assert!(FAST_PATH_PRIORITY as u8 > Priority::P0 as u8);

/// 電流オフセット較正のサンプル数
const OFFSET_CALIBRATION_SAMPLES: usize = 64;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 他のペリフェラルより先にCANを無効化
    board::reset_can_controller();

    let p = embassy_stm32::init(board::create_clock_config());

    info!("═══════════════════════════════════════════════════════");
    info!("   g4-foc • FOC Motor Controller • STM32G431VB @ 170MHz");
    info!("═══════════════════════════════════════════════════════");

    // RGBインジケータ（TIM3 CH2/CH3/CH4）
    let led_pwm = SimplePwm::new(
        p.TIM3,
        None,
        Some(PwmPin::new(p.PA4, OutputType::PushPull)),
        Some(PwmPin::new(p.PB0, OutputType::PushPull)),
        Some(PwmPin::new(p.PB7, OutputType::PushPull)),
        khz(1),
        CountingMode::EdgeAlignedUp,
    );
    let (mut watchdog, snapshot) = board::init(p.IWDG, board::Indicator::new(led_pwm));
    *state::CONFIG.lock().await = snapshot;

    let unique_id = board::read_unique_id();
    info!("Unique ID: {:02x}", unique_id);
    match board::try_read_device_signature() {
        Some(signature) => info!("Device signature: {:02x}", signature.as_bytes()),
        None => warn!("Device signature not present"),
    }

    // ADC初期化（ADC1: 相電流、ADC2: バス電圧）
    let mut current_adc = Adc::new(p.ADC1);
    current_adc.set_sample_time(SampleTime::CYCLES24_5);
    let mut bus_adc = Adc::new(p.ADC2);
    bus_adc.set_sample_time(SampleTime::CYCLES24_5);
    let mut phase_a = p.PA0.degrade_adc();
    let mut phase_b = p.PA1.degrade_adc();
    let mut bus_voltage = p.PC1.degrade_adc();

    // PWM初期化（TIM1、3相相補PWM）
    let uvw_pwm = ComplementaryPwm::new(
        p.TIM1,
        Some(PwmPin::new(p.PE9, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(p.PE8, OutputType::PushPull)),
        Some(PwmPin::new(p.PE11, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(p.PE10, OutputType::PushPull)),
        Some(PwmPin::new(p.PE13, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(p.PE12, OutputType::PushPull)),
        None,
        None,
        Hertz(snapshot.pwm.frequency),
        CountingMode::EdgeAlignedUp,
    );
    let mut driver = MotorDriver::new(uvw_pwm);
    driver.set_dead_time(config::dead_time_ticks(snapshot.pwm.dead_time));

    // ドライバ停止中に電流オフセットを較正
    let mut current_sense = CurrentSense::new(CurrentSenseConfig::default());
    let mut samples = [[0u16; 2]; OFFSET_CALIBRATION_SAMPLES];
    for sample in samples.iter_mut() {
        *sample = [
            current_adc.blocking_read(&mut phase_a),
            current_adc.blocking_read(&mut phase_b),
        ];
        Timer::after(Duration::from_micros(100)).await;
    }
    if current_sense.calibrate_offset(&samples).is_err() {
        board::die(FatalError::HardwareInit);
    }

    // 最初のメイン周期より前に電圧監視状態を確定させる
    let mut voltage_monitor = VoltageMonitor::new(config::BUS_VOLTAGE_DIVIDER);
    let bus_raw = bus_adc.blocking_read(&mut bus_voltage);
    state::BUS_VOLTAGE_RAW.lock(|raw| raw.set(bus_raw));
    let voltage_state = voltage_monitor.initialize_with_adc(bus_raw);
    state::VOLTAGE_STATE.lock(|s| s.set(voltage_state));
    info!("Bus voltage at boot: {}V", voltage_state.voltage);

    let pwm_timing = PwmTiming::from_params(&snapshot.pwm);
    let board_context = BoardContext {
        pwm: pwm_timing,
        hardware_version: board::detect_hardware_version(),
    };
    let context = match TaskContext::new(snapshot, board_context) {
        Ok(context) => context,
        Err(e) => board::die(FatalError::ConfigInit(e)),
    };

    let mut supervisor = Supervisor::new(context, config::boot::SEQUENCE);
    state::with_runner(|runner| supervisor.begin(runner));

    // 高速パス（割り込みエグゼキュータ）
    interrupt::UART4.set_priority(FAST_PATH_PRIORITY);
    let fast_spawner = EXECUTOR_HIGH.start(interrupt::UART4);
    let pwm_period = Duration::from_hz(snapshot.pwm.frequency as u64);
    fast_spawner
        .spawn(pwm_period_task(
            PwmPeriodResources {
                driver,
                current_adc,
                phase_a,
                phase_b,
                bus_adc,
                bus_voltage,
                current_sense,
                bus_divider: config::BUS_VOLTAGE_DIVIDER,
            },
            pwm_period,
        ))
        .unwrap();

    spawner.spawn(voltage_monitor_task(voltage_monitor)).unwrap();
    spawner.spawn(main_check_task(supervisor)).unwrap();
    spawner.spawn(led_task()).unwrap();

    info!("Startup complete");

    // ウォッチドッグ給餌
    loop {
        watchdog.pet();
        Timer::after(Duration::from_millis(100)).await;
    }
}
