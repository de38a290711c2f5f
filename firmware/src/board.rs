//! ボード初期化・サービス
//!
//! クロック設定、ウォッチドッグ、RGBインジケータ、致命停止、
//! 固有ID/デバイス署名の読み出しを集約します。

use embassy_stm32::{
    pac, peripherals,
    timer::{simple_pwm::SimplePwm, Channel},
    wdg::IndependentWatchdog,
    Config, Peri,
};
use g4_foc::board::{
    DeviceSignature, FatalError, HardwareVersion, Rgb, UniqueId, DEVICE_SIGNATURE_LEN,
};
use g4_foc::critical::CriticalSectionGuard;
use g4_foc::ConfigSnapshot;

use crate::config;
use crate::state::{INDICATOR, INDICATOR_COLOR};

/// ハードウェアメジャーバージョン
const HW_VERSION_MAJOR: u8 = 1;

/// デバイス署名の格納アドレス（フラッシュ最終ページ）
const DEVICE_SIGNATURE_ADDRESS: usize = 0x0801_F800;

/// RCCクロック設定を初期化
///
/// HSI → PLL（÷4 × 85 ÷ 2）で170MHz生成
pub fn create_clock_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::mux::{Adcsel, ClockMux};
        use embassy_stm32::rcc::{Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk};

        config.rcc.hsi = true;
        config.rcc.pll = Some(Pll {
            source: PllSource::HSI,
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL85,
            divp: None,
            divq: None,
            divr: Some(PllRDiv::DIV2),
        });
        config.rcc.sys = Sysclk::PLL1_R;

        let mut clock_mux = ClockMux::default();
        clock_mux.adc12sel = Adcsel::SYS;
        config.rcc.mux = clock_mux;
    }
    config
}

/// CANコントローラを強制リセット
///
/// ブートローダがFDCANを有効のまま残している可能性があるため、
/// 他のペリフェラルに触れる前に無条件でリセットし、保留中の割り込みを消す。
pub fn reset_can_controller() {
    let _guard = CriticalSectionGuard::acquire();

    pac::RCC.apb1rstr1().modify(|w| w.set_fdcanrst(true));
    pac::RCC.apb1rstr1().modify(|w| w.set_fdcanrst(false));

    cortex_m::peripheral::NVIC::unpend(pac::Interrupt::FDCAN1_IT0);
    cortex_m::peripheral::NVIC::unpend(pac::Interrupt::FDCAN1_IT1);
}

/// RGBインジケータ（TIM3 CH2/CH3/CH4 = R/G/B、反転出力）
pub struct Indicator {
    pwm: SimplePwm<'static, peripherals::TIM3>,
}

impl Indicator {
    const CHANNELS: [Channel; 3] = [Channel::Ch2, Channel::Ch3, Channel::Ch4];

    pub fn new(mut pwm: SimplePwm<'static, peripherals::TIM3>) -> Self {
        use embassy_stm32::timer::low_level::OutputPolarity;

        for channel in Self::CHANNELS {
            // LEDはローで点灯
            pwm.set_polarity(channel, OutputPolarity::ActiveLow);
            pwm.channel(channel).set_duty_cycle(0);
            pwm.channel(channel).enable();
        }
        Self { pwm }
    }

    pub fn set(&mut self, color: Rgb) {
        let max_duty = self.pwm.max_duty_cycle() as u32;
        for (channel, duty) in Self::CHANNELS.into_iter().zip(color.duties(max_duty)) {
            self.pwm.channel(channel).set_duty_cycle(duty as u16);
        }
    }
}

/// ボード初期化
///
/// ウォッチドッグを起動し、インジケータを登録して設定を初期化する。
/// 設定の初期化に失敗した場合は停止する。
pub fn init(
    iwdg: Peri<'static, peripherals::IWDG>,
    indicator: Indicator,
) -> (IndependentWatchdog<'static, peripherals::IWDG>, ConfigSnapshot) {
    let watchdog_reset = watchdog_triggered_last_reset();

    let mut watchdog = IndependentWatchdog::new(iwdg, config::WATCHDOG_TIMEOUT_MS * 1000);
    watchdog.unleash();

    INDICATOR.lock(|cell| *cell.borrow_mut() = Some(indicator));
    set_indicator_rgb(Rgb::BOOT);

    let snapshot = match config::init() {
        Ok(snapshot) => snapshot,
        Err(e) => die(FatalError::ConfigInit(e)),
    };

    let version = detect_hardware_version();
    info!(
        "g4-foc {} / HW {}.{} / {}",
        env!("CARGO_PKG_VERSION"),
        version.major,
        version.minor,
        if watchdog_reset { "WDTRESET" } else { "OK" }
    );

    (watchdog, snapshot)
}

/// 前回のリセット要因がウォッチドッグか（フラグはクリアする）
fn watchdog_triggered_last_reset() -> bool {
    let triggered = pac::RCC.csr().read().iwdgrstf();
    pac::RCC.csr().modify(|w| w.set_rmvf(true));
    triggered
}

/// 致命停止
///
/// モーター出力を止め、インジケータを赤にする。
/// `debug` ビルドではデバッガで調べられるよう停止したままにし、
/// ウォッチドッグによるリセットを待つ。それ以外は即座にリセットする。
pub fn die(reason: FatalError) -> ! {
    cortex_m::interrupt::disable();

    // TIM1主出力を無効化
    pac::TIM1.bdtr().modify(|w| w.set_moe(false));

    error!("FATAL: code {}", reason.code());
    set_indicator_rgb(Rgb::ERROR);

    if cfg!(feature = "debug") {
        loop {
            cortex_m::asm::wfi();
        }
    } else {
        restart()
    }
}

/// システムリセット
pub fn restart() -> ! {
    cortex_m::peripheral::SCB::sys_reset()
}

pub fn read_unique_id() -> UniqueId {
    *embassy_stm32::uid::uid()
}

/// デバイス署名を読み出し（未書き込みならNone）
pub fn try_read_device_signature() -> Option<DeviceSignature> {
    // SAFETY: 署名領域は内蔵フラッシュ内の読み出し専用領域
    let raw = unsafe {
        core::ptr::read_volatile(DEVICE_SIGNATURE_ADDRESS as *const [u8; DEVICE_SIGNATURE_LEN])
    };
    DeviceSignature::from_raw(raw)
}

pub fn detect_hardware_version() -> HardwareVersion {
    HardwareVersion {
        major: HW_VERSION_MAJOR,
        minor: 0,
    }
}

/// インジケータの色を設定
pub fn set_indicator_rgb(color: Rgb) {
    INDICATOR.lock(|cell| {
        if let Some(indicator) = cell.borrow_mut().as_mut() {
            indicator.set(color);
        }
    });
    INDICATOR_COLOR.lock(|current| current.set(color));
}

pub fn indicator_rgb() -> Rgb {
    INDICATOR_COLOR.lock(|current| current.get())
}
