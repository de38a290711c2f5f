//! モータードライバー抽象化レイヤー
//!
//! 制御タスクの [`PwmOutput`] をTIM1の相補PWMに反映します。

use embassy_stm32::{
    peripherals,
    timer::{complementary_pwm::ComplementaryPwm, Channel},
};
use g4_foc::PwmOutput;

const PHASES: [Channel; 3] = [Channel::Ch1, Channel::Ch2, Channel::Ch3];

/// 3相モータードライバー
pub struct MotorDriver {
    pwm: ComplementaryPwm<'static, peripherals::TIM1>,
    max_duty: u16,
    active: bool,
}

impl MotorDriver {
    /// 全チャネル停止状態で作成
    pub fn new(pwm: ComplementaryPwm<'static, peripherals::TIM1>) -> Self {
        let max_duty = pwm.get_max_duty();
        let mut driver = Self {
            pwm,
            max_duty,
            active: true,
        };
        driver.stop();
        driver
    }

    /// デッドタイムを設定 [タイマーティック]
    pub fn set_dead_time(&mut self, ticks: u16) {
        self.pwm.set_dead_time(ticks);
    }

    /// 変調率 (0.0-1.0) → Duty値
    fn duty(&self, modulation: f32) -> u16 {
        (modulation.clamp(0.0, 1.0) * self.max_duty as f32) as u16
    }

    /// タスク出力を反映
    ///
    /// `driver_active` が偽ならDuty 0で全チャネルを無効化する。
    pub fn apply(&mut self, output: PwmOutput) {
        if !output.driver_active {
            self.stop();
            return;
        }

        for (channel, modulation) in PHASES.into_iter().zip(output.phases) {
            let duty = self.duty(modulation);
            self.pwm.set_duty(channel, duty);
        }

        if !self.active {
            for channel in PHASES {
                self.pwm.enable(channel);
            }
            self.active = true;
        }
    }

    /// 全チャネルのDuty比を0にして停止
    pub fn stop(&mut self) {
        for channel in PHASES {
            self.pwm.set_duty(channel, 0);
        }
        if self.active {
            for channel in PHASES {
                self.pwm.disable(channel);
            }
            self.active = false;
        }
    }
}
