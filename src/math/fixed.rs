use core::num::NonZeroU32;
use core::ops::{Add, Neg, Sub};

/// Raw analog sample, pre-calibration.
pub type Codepoint = u16;

/// Commanded on-time of a switch, `duty / FULL_SCALE` of the period.
pub type Duty = u16;

pub const FULL_SCALE: Duty = 0xFFFF;
pub const HALF_SCALE: Duty = FULL_SCALE / 2;

const FRAC_BITS: u32 = 16;

/// Signed 16.16 fixed point value. Used for physical quantities (volts,
/// amps) and for loop gains.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed32(i32);

impl Fixed32 {
    pub const ZERO: Fixed32 = Fixed32(0);
    pub const ONE: Fixed32 = Fixed32(1 << FRAC_BITS);
    pub const MAX: Fixed32 = Fixed32(i32::MAX);

    pub const fn from_bits(bits: i32) -> Self {
        Fixed32(bits)
    }

    pub const fn to_bits(self) -> i32 {
        self.0
    }

    pub const fn from_int(value: i16) -> Self {
        Fixed32((value as i32) << FRAC_BITS)
    }

    /// Builds a value from thousandths, e.g. millivolts to volts.
    pub const fn from_milli(milli: i32) -> Self {
        Fixed32((((milli as i64) << FRAC_BITS) / 1000) as i32)
    }

    pub fn from_f32(value: f32) -> Self {
        Fixed32((value * (1u32 << FRAC_BITS) as f32) as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1u32 << FRAC_BITS) as f32
    }

    /// `rhs * self`, keeping the integer scale of `rhs`. The product is
    /// formed in 64 bits and shifted back down, so the result never wraps.
    pub const fn scale(self, rhs: i32) -> i64 {
        (rhs as i64 * self.0 as i64) >> FRAC_BITS
    }
}

impl Add for Fixed32 {
    type Output = Fixed32;

    fn add(self, rhs: Fixed32) -> Fixed32 {
        Fixed32(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Fixed32 {
    type Output = Fixed32;

    fn sub(self, rhs: Fixed32) -> Fixed32 {
        Fixed32(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Fixed32 {
    type Output = Fixed32;

    fn neg(self) -> Fixed32 {
        Fixed32(self.0.saturating_neg())
    }
}

/// Converts a physical value to sensor codepoints using a gain in
/// codepoints per unit. `None` if the result does not fit a codepoint.
pub fn physical_to_codepoints(gain: NonZeroU32, value: Fixed32) -> Option<Codepoint> {
    let code = (gain.get() as i64 * value.to_bits() as i64) >> FRAC_BITS;
    Codepoint::try_from(code).ok()
}

/// Converts sensor codepoints back to a physical value.
pub fn codepoints_to_physical(gain: NonZeroU32, code: Codepoint) -> Fixed32 {
    let value = ((code as i64) << FRAC_BITS) / gain.get() as i64;
    Fixed32(value.min(i32::MAX as i64) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gain(g: u32) -> NonZeroU32 {
        NonZeroU32::new(g).unwrap()
    }

    #[test]
    fn integer_construction() {
        assert_eq!(Fixed32::from_int(1), Fixed32::ONE);
        assert_eq!(Fixed32::from_int(-2).to_bits(), -0x20000);
        assert_eq!(Fixed32::from_milli(5000), Fixed32::from_int(5));
        assert_eq!(Fixed32::from_milli(500).to_bits(), 0x8000);
    }

    #[test]
    fn float_round_trip() {
        assert_eq!(Fixed32::from_f32(1.5).to_bits(), 0x18000);
        assert_eq!(Fixed32::from_bits(0x18000).to_f32(), 1.5);
    }

    #[test]
    fn scale_is_arithmetic() {
        assert_eq!(Fixed32::ONE.scale(-100), -100);
        assert_eq!(Fixed32::from_bits(0x8000).scale(100), 50);
        // floors toward negative infinity like an arithmetic shift
        assert_eq!(Fixed32::from_bits(0x8000).scale(-3), -2);
        // no intermediate overflow
        assert_eq!(Fixed32::from_int(i16::MAX).scale(i32::MAX), i32::MAX as i64 * i16::MAX as i64);
    }

    #[test]
    fn physical_to_codepoints_uses_gain() {
        // 405 codepoints per volt, 5V
        assert_eq!(physical_to_codepoints(gain(405), Fixed32::from_int(5)), Some(2025));
        assert_eq!(
            physical_to_codepoints(gain(1 << FRAC_BITS), Fixed32::from_bits(0xFFFF)),
            Some(0xFFFF)
        );
        assert_eq!(physical_to_codepoints(gain(1 << FRAC_BITS), Fixed32::from_bits(0x10000)), None);
        assert_eq!(physical_to_codepoints(gain(405), Fixed32::from_int(-1)), None);
    }

    #[test]
    fn codepoints_to_physical_inverts() {
        assert_eq!(codepoints_to_physical(gain(405), 2025), Fixed32::from_int(5));
        assert_eq!(codepoints_to_physical(gain(1 << FRAC_BITS), 1234).to_bits(), 1234);
        // saturates rather than wrapping for tiny gains
        assert_eq!(codepoints_to_physical(gain(1), 0xFFFF), Fixed32::MAX);
    }
}
