//! ボード関連の値型
//!
//! ペリフェラル操作はファームウェア側で行い、ここではその入出力となる
//! 値型と、ハードウェアに依存しない変換だけを扱います。

use core::fmt;

use crate::config::ConfigError;

/// MCU固有ID（96ビット）
pub type UniqueId = [u8; 12];

/// デバイス署名の長さ [byte]
pub const DEVICE_SIGNATURE_LEN: usize = 128;

/// 製造時に書き込まれるデバイス署名
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DeviceSignature([u8; DEVICE_SIGNATURE_LEN]);

impl DeviceSignature {
    /// 署名領域の生データから作成
    ///
    /// 全バイトが 0xFF または 0x00 の領域は未書き込みとみなし `None`。
    pub fn from_raw(raw: [u8; DEVICE_SIGNATURE_LEN]) -> Option<Self> {
        if raw.iter().all(|&b| b == 0xFF || b == 0x00) {
            return None;
        }
        Some(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; DEVICE_SIGNATURE_LEN] {
        &self.0
    }
}

impl fmt::Debug for DeviceSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceSignature(")?;
        for b in &self.0[..8] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "..)")
    }
}

/// ハードウェアバージョン
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for HardwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// RGBインジケータの色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub const OFF: Self = Self::new(0, 0, 0);
    /// 起動中
    pub const BOOT: Self = Self::new(0, 0, 255);
    /// タスク実行中
    pub const RUNNING: Self = Self::new(255, 160, 0);
    /// アイドル・正常
    pub const IDLE: Self = Self::new(0, 64, 0);
    /// バス電圧異常
    pub const VOLTAGE_FAULT: Self = Self::new(255, 64, 0);
    /// 致命停止
    pub const ERROR: Self = Self::new(255, 0, 0);

    /// 各チャンネルのデューティ [R, G, B]
    pub fn duties(&self, max_duty: u32) -> [u32; 3] {
        [
            indicator_duty(self.red, max_duty),
            indicator_duty(self.green, max_duty),
            indicator_duty(self.blue, max_duty),
        ]
    }
}

/// 8ビット輝度 → PWMデューティ
///
/// LEDは反転出力（ローで点灯）に接続されるため、タイマー側で極性を
/// 反転させる前提で、ここでは輝度に比例した値を返す。
pub fn indicator_duty(value: u8, max_duty: u32) -> u32 {
    (value as u64 * max_duty as u64 / u8::MAX as u64) as u32
}

/// 致命的エラー（ボードは停止する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// 設定の初期化に失敗
    ConfigInit(ConfigError),
    /// ハードウェア初期化に失敗
    HardwareInit,
}

impl FatalError {
    /// 停止理由の数値コード
    pub const fn code(self) -> i32 {
        match self {
            Self::ConfigInit(e) => e.code(),
            Self::HardwareInit => -100,
        }
    }
}

impl From<ConfigError> for FatalError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigInit(e)
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigInit(e) => write!(f, "config init failed ({}): {}", e.code(), e),
            Self::HardwareInit => write!(f, "hardware init failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_signature_rejected() {
        assert_eq!(DeviceSignature::from_raw([0xFF; DEVICE_SIGNATURE_LEN]), None);
        assert_eq!(DeviceSignature::from_raw([0x00; DEVICE_SIGNATURE_LEN]), None);

        // 0xFFと0x00の混在も未書き込み
        let mut mixed = [0xFF; DEVICE_SIGNATURE_LEN];
        mixed[10] = 0x00;
        assert_eq!(DeviceSignature::from_raw(mixed), None);
    }

    #[test]
    fn test_signature_with_data_accepted() {
        let mut raw = [0xFF; DEVICE_SIGNATURE_LEN];
        raw[127] = 0x42;
        let signature = DeviceSignature::from_raw(raw).unwrap();
        assert_eq!(signature.as_bytes()[127], 0x42);
    }

    #[test]
    fn test_indicator_duty_scaling() {
        assert_eq!(indicator_duty(0, 65535), 0);
        assert_eq!(indicator_duty(255, 65535), 65535);
        // 8ビット値×257でフルスケールへ
        assert_eq!(indicator_duty(1, 65535), 257);
        assert_eq!(indicator_duty(128, 1000), 501);
    }

    #[test]
    fn test_error_colour_is_red() {
        assert_eq!(Rgb::ERROR.duties(255), [255, 0, 0]);
    }

    #[test]
    fn test_fatal_error_code() {
        let fatal = FatalError::from(ConfigError::Pwm);
        assert_eq!(fatal.code(), -4);
        assert_eq!(fatal.to_string(), "config init failed (-4): invalid pwm parameters");
        assert_eq!(HardwareVersion { major: 2, minor: 1 }.to_string(), "2.1");
    }

    #[test]
    fn test_hardware_init_error() {
        let fatal = FatalError::HardwareInit;
        assert_eq!(fatal.code(), -100);
        assert_eq!(fatal.to_string(), "hardware init failed");
    }
}
