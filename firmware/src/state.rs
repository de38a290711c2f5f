//! グローバル共有状態管理
//!
//! 高速パス（割り込みエグゼキュータ）と通常タスクの双方から触れる状態は
//! クリティカルセクションで保護されたブロッキングMutexに置きます。

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, ThreadModeRawMutex};
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use g4_foc::board::Rgb;
use g4_foc::voltage_monitor::VoltageMonitorState;
use g4_foc::{ConfigSnapshot, TaskRunner};

use crate::board::Indicator;

/// アクティブな制御タスク（PWM周期・メイン周期の両方から使用）
pub static RUNNER: BlockingMutex<CriticalSectionRawMutex, RefCell<TaskRunner>> =
    BlockingMutex::new(RefCell::new(TaskRunner::new()));

/// 電圧監視ステータス
pub static VOLTAGE_STATE: BlockingMutex<CriticalSectionRawMutex, Cell<VoltageMonitorState>> =
    BlockingMutex::new(Cell::new(VoltageMonitorState::new()));

/// バス電圧ADC生値（高速パスで取得、電圧監視タスクで使用）
pub static BUS_VOLTAGE_RAW: BlockingMutex<CriticalSectionRawMutex, Cell<u16>> =
    BlockingMutex::new(Cell::new(0));

/// RGBインジケータ（致命停止時にも使うため共有）
pub static INDICATOR: BlockingMutex<CriticalSectionRawMutex, RefCell<Option<Indicator>>> =
    BlockingMutex::new(RefCell::new(None));

/// 現在表示中の色
pub static INDICATOR_COLOR: BlockingMutex<CriticalSectionRawMutex, Cell<Rgb>> =
    BlockingMutex::new(Cell::new(Rgb::BOOT));

/// 設定スナップショット（次のタスク生成時に反映される）
pub static CONFIG: Mutex<ThreadModeRawMutex, ConfigSnapshot> =
    Mutex::new(ConfigSnapshot::default());

/// タスクランナーを操作
pub fn with_runner<R>(f: impl FnOnce(&mut TaskRunner) -> R) -> R {
    RUNNER.lock(|runner| f(&mut runner.borrow_mut()))
}

pub fn voltage_state() -> VoltageMonitorState {
    VOLTAGE_STATE.lock(|state| state.get())
}
