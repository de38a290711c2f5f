//! タスクモジュール
//!
//! 高速パス（PWM周期）は割り込みエグゼキュータ、それ以外はスレッドモードで動作します。

pub mod control;
pub mod led;
pub mod voltage_monitor;

// タスク関数を再エクスポート
pub use control::{main_check_task, pwm_period_task, PwmPeriodResources};
pub use led::led_task;
pub use voltage_monitor::voltage_monitor_task;
