//! Parsing of the robot's sensor feedback packets.
//!
//! A feedback payload is a run of sub-payloads, each `[id, len, data..]`.
//! The Romi firmware speaks the Kobuki feedback protocol, so ids and layouts
//! follow it. Multi-byte fields are little-endian.

use bytes::Buf;
use tracing::trace;

use crate::error::{FrameError, Result};

const BASIC_SENSOR_DATA: u8 = 0x01;
const DOCKING_IR: u8 = 0x03;
const INERTIAL_SENSOR: u8 = 0x04;
const CLIFF: u8 = 0x05;
const CURRENT: u8 = 0x06;
const HARDWARE_VERSION: u8 = 0x0A;
const FIRMWARE_VERSION: u8 = 0x0B;
const RAW_GYRO: u8 = 0x0D;
const GENERAL_INPUT: u8 = 0x10;
const UNIQUE_ID: u8 = 0x13;
const CONTROLLER_GAIN: u8 = 0x15;

/// Bumper contacts; each side is the OR of its two switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bumps {
    pub left: bool,
    pub center: bool,
    pub right: bool,
}

impl Bumps {
    fn from_bits(bits: u8) -> Self {
        Self {
            right: bits & 0x01 != 0,
            center: bits & 0x02 != 0,
            left: bits & 0x04 != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Buttons {
    pub b0: bool,
    pub b1: bool,
}

impl Buttons {
    fn from_bits(bits: u8) -> Self {
        Self {
            b0: bits & 0x01 != 0,
            b1: bits & 0x02 != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ChargerState {
    #[default]
    Discharging,
    DockingCharged,
    DockingCharging,
    AdapterCharged,
    AdapterCharging,
    Unknown(u8),
}

impl From<u8> for ChargerState {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::Discharging,
            2 => Self::DockingCharged,
            6 => Self::DockingCharging,
            18 => Self::AdapterCharged,
            22 => Self::AdapterCharging,
            other => Self::Unknown(other),
        }
    }
}

/// Raw docking IR readings, one per receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DockingIr {
    pub right: u8,
    pub center: u8,
    pub left: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Version {
    pub patch: u8,
    pub minor: u8,
    pub major: u8,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Raw gyro rates in 0.00875 deg/s units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GyroRate {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GeneralInput {
    pub d0: bool,
    pub d1: bool,
    pub d2: bool,
    pub d3: bool,
    pub a0: u16,
    pub a1: u16,
    pub a2: u16,
    pub a3: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ControllerGain {
    pub user_configured: bool,
    pub kp: u32,
    pub ki: u32,
    pub kd: u32,
}

/// Latest known state of every sensor the Romi reports.
///
/// Fields not present in a given feedback packet keep their previous value
/// when filled through [`update`](Self::update).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SensorFeedback {
    /// Firmware timestamp in ms, wraps at 65536.
    pub timestamp: u16,
    pub bumps: Bumps,
    pub buttons: Buttons,
    pub left_encoder: u16,
    pub right_encoder: u16,
    pub left_pwm: i8,
    pub right_pwm: i8,
    pub left_over_current: bool,
    pub right_over_current: bool,
    /// Motor current in 10 mA units.
    pub left_current: u8,
    pub right_current: u8,
    /// Battery voltage in 0.1 V units.
    pub battery_voltage: u8,
    pub charger: ChargerState,
    pub cliff_left_signal: u16,
    pub cliff_center_signal: u16,
    pub cliff_right_signal: u16,
    /// Calibrated heading in 0.01 degree units.
    pub angle: i16,
    pub angle_rate: i16,
    pub gyro: GyroRate,
    pub docking: DockingIr,
    pub hardware_version: Version,
    pub firmware_version: Version,
    pub unique_id: [u32; 3],
    pub general_input: GeneralInput,
    pub controller_gain: ControllerGain,
}

impl SensorFeedback {
    /// Parse a feedback payload into a fresh value.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut feedback = Self::default();
        feedback.update(payload)?;
        Ok(feedback)
    }

    /// Apply every sub-payload in `payload`. Unknown ids are skipped.
    ///
    /// On error, sub-payloads before the malformed one have been applied.
    pub fn update(&mut self, payload: &[u8]) -> Result<()> {
        let mut rest = payload;
        while !rest.is_empty() {
            let &[id, len, ..] = rest else {
                return Err(FrameError::MalformedFeedback {
                    id: rest[0],
                    reason: "sub-payload header cut short",
                });
            };
            let len = usize::from(len);
            if rest.len() < 2 + len {
                return Err(FrameError::MalformedFeedback {
                    id,
                    reason: "sub-payload runs past end of packet",
                });
            }
            let data = &rest[2..2 + len];
            rest = &rest[2 + len..];

            self.apply(id, data)?;
        }
        Ok(())
    }

    fn apply(&mut self, id: u8, mut data: &[u8]) -> Result<()> {
        let min_len = match id {
            BASIC_SENSOR_DATA => 15,
            DOCKING_IR => 3,
            INERTIAL_SENSOR => 7,
            CLIFF => 6,
            CURRENT => 2,
            HARDWARE_VERSION | FIRMWARE_VERSION => 4,
            RAW_GYRO => 2,
            GENERAL_INPUT => 16,
            UNIQUE_ID => 12,
            CONTROLLER_GAIN => 13,
            _ => {
                trace!(id, len = data.len(), "skipping unknown feedback sub-payload");
                return Ok(());
            }
        };
        if data.len() < min_len {
            return Err(FrameError::MalformedFeedback {
                id,
                reason: "sub-payload shorter than its fixed layout",
            });
        }

        match id {
            BASIC_SENSOR_DATA => {
                self.timestamp = data.get_u16_le();
                self.bumps = Bumps::from_bits(data.get_u8());
                let _wheel_drop = data.get_u8();
                let _cliff = data.get_u8();
                self.left_encoder = data.get_u16_le();
                self.right_encoder = data.get_u16_le();
                self.left_pwm = data.get_i8();
                self.right_pwm = data.get_i8();
                self.buttons = Buttons::from_bits(data.get_u8());
                self.charger = ChargerState::from(data.get_u8());
                self.battery_voltage = data.get_u8();
                let over_current = data.get_u8();
                self.left_over_current = over_current & 0x01 != 0;
                self.right_over_current = over_current & 0x02 != 0;
            }
            DOCKING_IR => {
                self.docking = DockingIr {
                    right: data.get_u8(),
                    center: data.get_u8(),
                    left: data.get_u8(),
                };
            }
            INERTIAL_SENSOR => {
                self.angle = data.get_i16_le();
                self.angle_rate = data.get_i16_le();
            }
            CLIFF => {
                self.cliff_right_signal = data.get_u16_le();
                self.cliff_center_signal = data.get_u16_le();
                self.cliff_left_signal = data.get_u16_le();
            }
            CURRENT => {
                self.left_current = data.get_u8();
                self.right_current = data.get_u8();
            }
            HARDWARE_VERSION | FIRMWARE_VERSION => {
                let version = Version {
                    patch: data.get_u8(),
                    minor: data.get_u8(),
                    major: data.get_u8(),
                };
                if id == HARDWARE_VERSION {
                    self.hardware_version = version;
                } else {
                    self.firmware_version = version;
                }
            }
            RAW_GYRO => {
                let _frame_id = data.get_u8();
                let _data_len = data.get_u8();
                // Samples arrive oldest first; keep the newest.
                while data.remaining() >= 6 {
                    self.gyro = GyroRate {
                        x: data.get_u16_le(),
                        y: data.get_u16_le(),
                        z: data.get_u16_le(),
                    };
                }
            }
            GENERAL_INPUT => {
                let digital = data.get_u16_le();
                self.general_input = GeneralInput {
                    d0: digital & 0x01 != 0,
                    d1: digital & 0x02 != 0,
                    d2: digital & 0x04 != 0,
                    d3: digital & 0x08 != 0,
                    a0: data.get_u16_le(),
                    a1: data.get_u16_le(),
                    a2: data.get_u16_le(),
                    a3: data.get_u16_le(),
                };
            }
            UNIQUE_ID => {
                self.unique_id = [data.get_u32_le(), data.get_u32_le(), data.get_u32_le()];
            }
            CONTROLLER_GAIN => {
                self.controller_gain = ControllerGain {
                    user_configured: data.get_u8() != 0,
                    kp: data.get_u32_le(),
                    ki: data.get_u32_le(),
                    kd: data.get_u32_le(),
                };
            }
            _ => {}
        }
        Ok(())
    }
}
