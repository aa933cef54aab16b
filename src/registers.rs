//! Register map and bitfield structures for the DS3231 RTC.
//!
//! Time and date registers are plain BCD bytes and are handled by the codec in
//! [`crate::datetime`]. The registers that carry flags or packed fields get a
//! bitfield wrapper here.

use bitfield::bitfield;

/// Register addresses used by this driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (BCD 0-59)
    Seconds = 0x00,
    /// Minutes register (BCD 0-59)
    Minutes = 0x01,
    /// Hours register (BCD 0-23)
    Hours = 0x02,
    /// Day of week register (raw 1-7)
    Weekday = 0x03,
    /// Day of month register (BCD 1-31)
    Day = 0x04,
    /// Month register (BCD 1-12, bit 7 is the century flag)
    Month = 0x05,
    /// Year register (BCD 0-99, offset from 2000)
    Year = 0x06,
    /// Control register
    Control = 0x0E,
    /// Control/Status register
    ControlStatus = 0x0F,
    /// Temperature MSB register
    MSBTemp = 0x11,
    /// Temperature LSB register
    LSBTemp = 0x12,
}

impl From<RegAddr> for u8 {
    fn from(reg: RegAddr) -> Self {
        reg as u8
    }
}

/// Oscillator control (EOSC bit, active low).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    /// Oscillator runs on battery power
    Enabled = 0,
    /// Oscillator stops when on battery power
    Disabled = 1,
}
impl From<u8> for Oscillator {
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => Oscillator::Enabled,
            1 => Oscillator::Disabled,
            _ => panic!("Invalid value for Oscillator: {}", v),
        }
    }
}
impl From<Oscillator> for u8 {
    fn from(v: Oscillator) -> Self {
        v as u8
    }
}

/// Function of the INT/SQW pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptControl {
    /// Output square wave on INT/SQW pin
    SquareWave = 0,
    /// Output alarm interrupt signal on INT/SQW pin
    Interrupt = 1,
}
impl From<u8> for InterruptControl {
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => InterruptControl::SquareWave,
            1 => InterruptControl::Interrupt,
            _ => panic!("Invalid value for InterruptControl: {}", v),
        }
    }
}
impl From<InterruptControl> for u8 {
    fn from(v: InterruptControl) -> Self {
        v as u8
    }
}

/// Square wave output frequency (RS2:RS1).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    /// 1 Hz
    Hz1 = 0b00,
    /// 1.024 kHz
    Hz1024 = 0b01,
    /// 4.096 kHz
    Hz4096 = 0b10,
    /// 8.192 kHz
    Hz8192 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    /// # Panics
    /// Panics if the value does not fit in two bits.
    fn from(v: u8) -> Self {
        match v {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz1024,
            0b10 => SquareWaveFrequency::Hz4096,
            0b11 => SquareWaveFrequency::Hz8192,
            _ => panic!("Invalid value for SquareWaveFrequency: {}", v),
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

// Generates the From<u8> and Into<u8> implementations for a register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Month register: BCD month with the century flag in bit 7.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Month(u8);
    impl Debug;
    /// Century flag, ignored by this driver
    pub century, set_century: 7;
    /// BCD month without the century flag
    pub bcd_month, set_bcd_month: 4, 0;
}
from_register_u8!(Month);

#[cfg(feature = "defmt")]
impl defmt::Format for Month {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Month({=u8:#x}", self.bcd_month());
        if self.century() {
            defmt::write!(f, ", century");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Control register.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Control(u8);
    impl Debug;
    /// Oscillator enable (EOSC, active low)
    pub from into Oscillator, oscillator_enable, set_oscillator_enable: 7, 7;
    /// Square wave keeps running on battery power (BBSQW)
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// Force a temperature conversion (CONV)
    pub convert_temperature, set_convert_temperature: 5;
    /// Square wave frequency (RS2:RS1)
    pub from into SquareWaveFrequency, square_wave_frequency, set_square_wave_frequency: 4, 3;
    /// INT/SQW pin function (INTCN)
    pub from into InterruptControl, interrupt_control, set_interrupt_control: 2, 2;
    /// Alarm 2 interrupt enable (A2IE)
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// Alarm 1 interrupt enable (A1IE)
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Control({}, bbsqw={}, {}, {})",
            self.oscillator_enable(),
            self.battery_backed_square_wave(),
            self.square_wave_frequency(),
            self.interrupt_control()
        );
    }
}

bitfield! {
    /// Control/Status register.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Status(u8);
    impl Debug;
    /// Oscillator stop flag (OSF), cleared by writing 0
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// 32kHz output enable (EN32kHz)
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// Temperature conversion in progress (BSY), read-only
    pub busy, _: 2;
    /// Alarm 2 flag (A2F)
    pub alarm2_flag, set_alarm2_flag: 1;
    /// Alarm 1 flag (A1F)
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Status(osf={}, en32khz={}, bsy={}, a2f={}, a1f={})",
            self.oscillator_stop_flag(),
            self.enable_32khz_output(),
            self.busy(),
            self.alarm2_flag(),
            self.alarm1_flag()
        );
    }
}

bitfield! {
    /// Temperature MSB register (integer part).
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Temperature(u8);
    impl Debug;
    /// Sign bit
    pub negative, _: 7;
    /// Low seven bits of the integer part
    pub magnitude, _: 6, 0;
    /// Integer part as two's complement (-128 to +127)
    pub i8, degrees, _: 7, 0;
}
from_register_u8!(Temperature);

#[cfg(feature = "defmt")]
impl defmt::Format for Temperature {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Temperature({=i8}°C)", self.degrees());
    }
}

bitfield! {
    /// Temperature LSB register (fractional part).
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct TemperatureFraction(u8);
    impl Debug;
    /// Quarter degrees (0-3)
    pub quarters, _: 7, 6;
}
from_register_u8!(TemperatureFraction);

#[cfg(feature = "defmt")]
impl defmt::Format for TemperatureFraction {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TemperatureFraction({=u8}/4°C)", self.quarters());
    }
}
