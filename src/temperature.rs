//! Temperature decoding for the DS3231 MSB/LSB temperature registers.
//!
//! The integer part lives in the MSB register and the top two bits of the LSB
//! register hold quarter degrees. Two decodings are provided:
//!
//! - [`TemperatureMode::Legacy`] reproduces the behaviour of older drivers for
//!   this chip, which scale the magnitude by `0.0` whenever the sign bit is
//!   clear. Every non-negative temperature therefore reads as exactly `0.0`.
//!   Negative readings are decoded as sign and magnitude.
//! - [`TemperatureMode::Signed`] follows the datasheet: the ten bits form a
//!   two's-complement value in units of 0.25°C.
//!
//! `Legacy` is the default so readings stay comparable with existing
//! deployments. Select `Signed` through [`crate::Config`] or
//! [`crate::DS3231::set_temperature_mode`] for real readings.

use crate::registers::{Temperature, TemperatureFraction};

const DEGREES_PER_QUARTER: f32 = 0.25;

/// How the temperature registers are turned into degrees Celsius.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureMode {
    /// Sign and magnitude, with non-negative readings forced to `0.0`
    #[default]
    Legacy,
    /// Two's complement, per the datasheet
    Signed,
}

impl TemperatureMode {
    /// Decodes a pair of temperature registers into degrees Celsius.
    pub fn celsius(self, msb: Temperature, lsb: TemperatureFraction) -> f32 {
        match self {
            TemperatureMode::Legacy => {
                let quarters = (u16::from(msb.magnitude()) << 2) | u16::from(lsb.quarters());
                let sign = if msb.negative() { -1.0 } else { 0.0 };
                sign * f32::from(quarters) * DEGREES_PER_QUARTER
            }
            TemperatureMode::Signed => {
                let quarters = (i16::from(msb.degrees()) << 2) | i16::from(lsb.quarters());
                f32::from(quarters) * DEGREES_PER_QUARTER
            }
        }
    }
}
