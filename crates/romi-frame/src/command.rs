/// Sub-payload id of the base-control command.
pub const BASE_CONTROL_ID: u8 = 0x01;

/// Data length of the base-control sub-payload.
pub const BASE_CONTROL_LEN: u8 = 0x04;

/// Approximately half the Romi wheelbase in mm; tuned on the robot.
const HALF_WHEELBASE_MM: f64 = 123.0;

/// A base-control command: forward speed in mm/s and turn radius in mm.
///
/// Radius 0 means straight ahead. Radius ±1 turns in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DriveCommand {
    pub speed: i16,
    pub radius: i16,
}

impl DriveCommand {
    pub const fn new(speed: i16, radius: i16) -> Self {
        Self { speed, radius }
    }

    pub const fn stop() -> Self {
        Self::new(0, 0)
    }

    /// Approximate independent wheel speeds (mm/s) with a speed and radius.
    ///
    /// The faster wheel sets the speed, the left one on a tie.
    pub fn from_wheel_speeds(left: i16, right: i16) -> Self {
        let (speed, turn_sign) = if right.unsigned_abs() > left.unsigned_abs() {
            (right, 1)
        } else {
            (left, -1)
        };

        if left == right {
            return Self::new(speed, 0);
        }

        let sum = f64::from(right) + f64::from(left);
        let diff = f64::from(right) - f64::from(left);
        let estimate = (HALF_WHEELBASE_MM * sum / (2.0 * diff)).round() as i64;

        let radius = match estimate {
            0 => turn_sign,
            r => i16::try_from(r).unwrap_or(0),
        };
        Self::new(speed, radius)
    }

    /// Payload bytes: `[id, len, speed_lo, speed_hi, radius_lo, radius_hi]`.
    pub fn to_payload(&self) -> [u8; 6] {
        let speed = self.speed.to_le_bytes();
        let radius = self.radius.to_le_bytes();
        [
            BASE_CONTROL_ID,
            BASE_CONTROL_LEN,
            speed[0],
            speed[1],
            radius[0],
            radius[1],
        ]
    }

    /// Parse a base-control payload. Returns `None` for anything else.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [BASE_CONTROL_ID, BASE_CONTROL_LEN, s0, s1, r0, r1] => Some(Self::new(
                i16::from_le_bytes([*s0, *s1]),
                i16::from_le_bytes([*r0, *r1]),
            )),
            _ => None,
        }
    }
}
