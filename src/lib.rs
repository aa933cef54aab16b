//! A platform-agnostic register-level driver for the DS3231 real-time clock.
//!
//! The driver translates between the chip's BCD registers and plain integers
//! and issues the I2C transactions for each accessor. It keeps no copy of the
//! clock: every getter goes to the device.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_clock::{Config, DS3231, DEFAULT_ADDRESS};
//!
//! let mut rtc = DS3231::init(i2c, DEFAULT_ADDRESS, &Config::default())?;
//! rtc.set_time(12, 30, 45)?;
//! rtc.set_date(5, 14, 3, 2024)?;
//! let now = rtc.time_string()?; // formats as "12:30:45"
//! let today = rtc.date_string()?; // formats as "14-03-2024"
//! ```
//!
//! # Features
//!
//! - `async`: [`asynch::DS3231`] over `embedded-hal-async`
//! - `log` / `defmt`: diagnostics through the matching logging facade
//!
//! # Atomicity
//!
//! [`DS3231::time_string`], [`DS3231::date_string`], [`DS3231::set_time`] and
//! [`DS3231::set_date`] use one transaction per register, so the clock can
//! tick between them. [`DS3231::time`], [`DS3231::date`],
//! [`DS3231::datetime`] and [`DS3231::set_datetime`] use a single burst
//! transaction instead.
#![no_std]

use chrono::NaiveDateTime;
use embedded_hal::i2c::I2c;
use paste::paste;

#[cfg(feature = "async")]
pub mod asynch;
pub mod datetime;
pub mod registers;
pub mod temperature;

pub use datetime::{bcd_to_decimal, decimal_to_bcd, DS3231DateTimeError, Date, Time};
pub use registers::{
    Control, InterruptControl, Month, Oscillator, RegAddr, SquareWaveFrequency, Status,
    Temperature, TemperatureFraction,
};
pub use temperature::TemperatureMode;

use datetime::{check_weekday, DS3231DateTime};

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        use defmt::debug;
    } else if #[cfg(feature = "log")] {
        use log::debug;
    }
}

/// Fixed I2C address of the DS3231.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Device configuration written by [`DS3231::configure`].
///
/// The default produces control `0x4C` and status `0x08`: oscillator on,
/// battery-backed square wave, 1.024 kHz, INT/SQW in interrupt mode, alarm
/// and oscillator-stop flags cleared, 32kHz output on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub oscillator_enable: Oscillator,
    pub battery_backed_square_wave: bool,
    pub square_wave_frequency: SquareWaveFrequency,
    pub interrupt_control: InterruptControl,
    pub enable_32khz_output: bool,
    /// Decoding used by [`DS3231::temperature`]
    pub temperature_mode: TemperatureMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oscillator_enable: Oscillator::Enabled,
            battery_backed_square_wave: true,
            square_wave_frequency: SquareWaveFrequency::Hz1024,
            interrupt_control: InterruptControl::Interrupt,
            enable_32khz_output: true,
            temperature_mode: TemperatureMode::Legacy,
        }
    }
}

impl Config {
    /// Control register value. Alarm interrupts and forced conversion are off.
    pub fn control(&self) -> Control {
        let mut control = Control::default();
        control.set_oscillator_enable(self.oscillator_enable);
        control.set_battery_backed_square_wave(self.battery_backed_square_wave);
        control.set_square_wave_frequency(self.square_wave_frequency);
        control.set_interrupt_control(self.interrupt_control);
        control
    }

    /// Status register value. Writing it clears OSF, A1F and A2F.
    pub fn status(&self) -> Status {
        let mut status = Status::default();
        status.set_enable_32khz_output(self.enable_32khz_output);
        status
    }
}

/// Errors returned by the driver.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DS3231Error<I2CE> {
    /// The bus transaction failed
    I2c(I2CE),
    /// Input out of range, or registers that do not form a valid date/time
    DateTime(DS3231DateTimeError),
}

impl<I2CE> From<I2CE> for DS3231Error<I2CE> {
    fn from(e: I2CE) -> Self {
        DS3231Error::I2c(e)
    }
}

/// DS3231 Real-Time Clock driver.
pub struct DS3231<I2C: I2c> {
    i2c: I2C,
    address: u8,
    temperature_mode: TemperatureMode,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Creates a driver without touching the device.
    ///
    /// Use this when the control and status registers hold a configuration
    /// that must be kept, e.g. alarms set up by another component.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            temperature_mode: TemperatureMode::default(),
        }
    }

    /// Creates a driver and writes `config` to the device.
    ///
    /// Run once per device connection. Any alarm interrupt setup already on
    /// the chip is reset.
    pub fn init(i2c: I2C, address: u8, config: &Config) -> Result<Self, DS3231Error<I2C::Error>> {
        let mut dev = Self::new(i2c, address);
        dev.configure(config)?;
        Ok(dev)
    }

    /// Writes the control register, then the status register.
    pub fn configure(&mut self, config: &Config) -> Result<(), DS3231Error<I2C::Error>> {
        let control = config.control();
        let status = config.status();
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!(
            "DS3231: writing control={} status={}",
            u8::from(control),
            u8::from(status)
        );
        self.set_control(control)?;
        self.set_status(status)?;
        self.temperature_mode = config.temperature_mode;
        Ok(())
    }

    /// Gives the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn temperature_mode(&self) -> TemperatureMode {
        self.temperature_mode
    }

    /// Changes how [`DS3231::temperature`] decodes readings. No bus traffic.
    pub fn set_temperature_mode(&mut self, mode: TemperatureMode) {
        self.temperature_mode = mode;
    }

    /// Reads one register: address write followed by a one-byte read.
    pub fn read_register(&mut self, reg: RegAddr) -> Result<u8, DS3231Error<I2C::Error>> {
        let mut data = [0];
        self.i2c
            .write_read(self.address, &[u8::from(reg)], &mut data)?;
        Ok(data[0])
    }

    /// Writes one register in a single two-byte transaction.
    pub fn write_register(
        &mut self,
        reg: RegAddr,
        value: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c.write(self.address, &[u8::from(reg), value])?;
        Ok(())
    }

    fn read_burst<const N: usize>(
        &mut self,
        start: RegAddr,
    ) -> Result<[u8; N], DS3231Error<I2C::Error>> {
        let mut data = [0; N];
        self.i2c
            .write_read(self.address, &[u8::from(start)], &mut data)?;
        Ok(data)
    }

    /// Sets the time, writing hours, minutes and seconds in that order.
    ///
    /// All three values are checked first; out-of-range input is rejected
    /// with [`DS3231Error::DateTime`] and nothing is written.
    pub fn set_time(
        &mut self,
        hours: u8,
        minutes: u8,
        seconds: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let time = Time::new(hours, minutes, seconds).map_err(DS3231Error::DateTime)?;
        let [seconds, minutes, hours] = time.to_registers();
        self.write_register(RegAddr::Hours, hours)?;
        self.write_register(RegAddr::Minutes, minutes)?;
        self.write_register(RegAddr::Seconds, seconds)?;
        Ok(())
    }

    pub fn hours(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        Ok(bcd_to_decimal(self.read_register(RegAddr::Hours)?))
    }

    pub fn minutes(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        Ok(bcd_to_decimal(self.read_register(RegAddr::Minutes)?))
    }

    pub fn seconds(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        Ok(bcd_to_decimal(self.read_register(RegAddr::Seconds)?))
    }

    /// Reads hours, minutes and seconds one register at a time.
    ///
    /// The result displays as `HH:MM:SS`. See [`DS3231::time`] for a
    /// consistent snapshot.
    pub fn time_string(&mut self) -> Result<Time, DS3231Error<I2C::Error>> {
        let hours = self.read_register(RegAddr::Hours)?;
        let minutes = self.read_register(RegAddr::Minutes)?;
        let seconds = self.read_register(RegAddr::Seconds)?;
        Ok(Time::from_registers(seconds, minutes, hours))
    }

    /// Reads seconds, minutes and hours in one burst.
    pub fn time(&mut self) -> Result<Time, DS3231Error<I2C::Error>> {
        let [seconds, minutes, hours]: [u8; 3] = self.read_burst(RegAddr::Seconds)?;
        Ok(Time::from_registers(seconds, minutes, hours))
    }

    /// Sets weekday, day, month and year, written in that order.
    ///
    /// The weekday is stored raw; its meaning (which day is 1) is up to the
    /// application. All four values are checked first; out-of-range input is
    /// rejected with [`DS3231Error::DateTime`] and nothing is written.
    pub fn set_date(
        &mut self,
        weekday: u8,
        day: u8,
        month: u8,
        year: u16,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let weekday = check_weekday(weekday).map_err(DS3231Error::DateTime)?;
        let date = Date::new(day, month, year).map_err(DS3231Error::DateTime)?;
        let [day, month, year] = date.to_registers();
        self.write_register(RegAddr::Weekday, weekday)?;
        self.write_register(RegAddr::Day, day)?;
        self.write_register(RegAddr::Month, month)?;
        self.write_register(RegAddr::Year, year)?;
        Ok(())
    }

    pub fn year(&mut self) -> Result<u16, DS3231Error<I2C::Error>> {
        let year = self.read_register(RegAddr::Year)?;
        Ok(datetime::BASE_YEAR + u16::from(bcd_to_decimal(year)))
    }

    /// Reads the month, ignoring the century flag.
    pub fn month(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let month = Month::from(self.read_register(RegAddr::Month)?);
        Ok(bcd_to_decimal(month.bcd_month()))
    }

    pub fn day(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        Ok(bcd_to_decimal(self.read_register(RegAddr::Day)?))
    }

    /// Raw weekday register.
    pub fn weekday(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        self.read_register(RegAddr::Weekday)
    }

    /// Reads day, month and year one register at a time.
    ///
    /// The result displays as `DD-MM-YYYY`. See [`DS3231::date`] for a
    /// consistent snapshot.
    pub fn date_string(&mut self) -> Result<Date, DS3231Error<I2C::Error>> {
        let day = self.read_register(RegAddr::Day)?;
        let month = self.read_register(RegAddr::Month)?;
        let year = self.read_register(RegAddr::Year)?;
        Ok(Date::from_registers(day, month, year))
    }

    /// Reads day, month and year in one burst.
    pub fn date(&mut self) -> Result<Date, DS3231Error<I2C::Error>> {
        let [day, month, year]: [u8; 3] = self.read_burst(RegAddr::Day)?;
        Ok(Date::from_registers(day, month, year))
    }

    /// Reads all seven time/date registers in one burst.
    pub fn datetime(&mut self) -> Result<NaiveDateTime, DS3231Error<I2C::Error>> {
        let data: [u8; 7] = self.read_burst(RegAddr::Seconds)?;
        DS3231DateTime::from(data)
            .into_datetime()
            .map_err(DS3231Error::DateTime)
    }

    /// Writes all seven time/date registers in one burst.
    ///
    /// The weekday register gets 1-7 counted from Sunday.
    pub fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let raw = DS3231DateTime::from_datetime(datetime).map_err(DS3231Error::DateTime)?;
        let data: [u8; 7] = (&raw).into();
        let mut buf = [0; 8];
        buf[0] = u8::from(RegAddr::Seconds);
        buf[1..].copy_from_slice(&data);
        self.i2c.write(self.address, &buf)?;
        Ok(())
    }

    /// Reads the die temperature in °C, 0.25° resolution.
    ///
    /// Decoding depends on [`DS3231::temperature_mode`]; with the default
    /// [`TemperatureMode::Legacy`] every non-negative reading is `0.0`.
    pub fn temperature(&mut self) -> Result<f32, DS3231Error<I2C::Error>> {
        let msb = self.temperature_msb()?;
        let lsb = self.temperature_lsb()?;
        Ok(self.temperature_mode.celsius(msb, lsb))
    }
}

// Typed register access
macro_rules! impl_register_access {
    (
        read_write: [$(($rw_name:ident, $rw_addr:expr, $rw_typ:ty)),* $(,)?],
        read_only: [$(($ro_name:ident, $ro_addr:expr, $ro_typ:ty)),* $(,)?]
    ) => {
        impl<I2C: I2c> DS3231<I2C> {
            $(
                paste! {
                    #[doc = concat!("Reads the ", stringify!($rw_name), " register.")]
                    pub fn $rw_name(&mut self) -> Result<$rw_typ, DS3231Error<I2C::Error>> {
                        Ok(<$rw_typ>::from(self.read_register($rw_addr)?))
                    }

                    #[doc = concat!("Writes the ", stringify!($rw_name), " register.")]
                    pub fn [<set_ $rw_name>](&mut self, value: $rw_typ) -> Result<(), DS3231Error<I2C::Error>> {
                        self.write_register($rw_addr, value.into())
                    }
                }
            )*
            $(
                #[doc = concat!("Reads the ", stringify!($ro_name), " register.")]
                pub fn $ro_name(&mut self) -> Result<$ro_typ, DS3231Error<I2C::Error>> {
                    Ok(<$ro_typ>::from(self.read_register($ro_addr)?))
                }
            )*
        }
    };
}

impl_register_access!(
    read_write: [
        (control, RegAddr::Control, Control),
        (status, RegAddr::ControlStatus, Status),
    ],
    read_only: [
        (temperature_msb, RegAddr::MSBTemp, Temperature),
        (temperature_lsb, RegAddr::LSBTemp, TemperatureFraction),
    ]
);
