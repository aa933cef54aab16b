//! Async implementation of the DS3231 driver.
//!
//! Same operations as the blocking [`crate::DS3231`], over
//! `embedded-hal-async` traits. Only available with the `async` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_clock::{asynch::DS3231, Config, DEFAULT_ADDRESS};
//!
//! let mut rtc = DS3231::init(i2c, DEFAULT_ADDRESS, &Config::default()).await?;
//! let now = rtc.time().await?;
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::datetime::{check_weekday, DS3231DateTime, BASE_YEAR};
use crate::{
    bcd_to_decimal, Config, Control, DS3231Error, Date, Month, RegAddr, Status, Temperature,
    TemperatureFraction, TemperatureMode, Time,
};

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        use defmt::debug;
    } else if #[cfg(feature = "log")] {
        use log::debug;
    }
}

/// DS3231 Real-Time Clock async driver.
pub struct DS3231<I2C: I2c> {
    i2c: I2C,
    address: u8,
    temperature_mode: TemperatureMode,
}

impl<I2C: I2c> DS3231<I2C> {
    /// Creates a driver without touching the device.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            temperature_mode: TemperatureMode::default(),
        }
    }

    /// Creates a driver and writes `config` to the device.
    pub async fn init(
        i2c: I2C,
        address: u8,
        config: &Config,
    ) -> Result<Self, DS3231Error<I2C::Error>> {
        let mut dev = Self::new(i2c, address);
        dev.configure(config).await?;
        Ok(dev)
    }

    /// Writes the control register, then the status register.
    pub async fn configure(&mut self, config: &Config) -> Result<(), DS3231Error<I2C::Error>> {
        let control = config.control();
        let status = config.status();
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!(
            "DS3231: writing control={} status={}",
            u8::from(control),
            u8::from(status)
        );
        self.set_control(control).await?;
        self.set_status(status).await?;
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

    pub fn set_temperature_mode(&mut self, mode: TemperatureMode) {
        self.temperature_mode = mode;
    }

    pub async fn read_register(&mut self, reg: RegAddr) -> Result<u8, DS3231Error<I2C::Error>> {
        let mut data = [0];
        self.i2c
            .write_read(self.address, &[u8::from(reg)], &mut data)
            .await?;
        Ok(data[0])
    }

    pub async fn write_register(
        &mut self,
        reg: RegAddr,
        value: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[u8::from(reg), value])
            .await?;
        Ok(())
    }

    async fn read_burst<const N: usize>(
        &mut self,
        start: RegAddr,
    ) -> Result<[u8; N], DS3231Error<I2C::Error>> {
        let mut data = [0; N];
        self.i2c
            .write_read(self.address, &[u8::from(start)], &mut data)
            .await?;
        Ok(data)
    }

    /// Sets the time, writing hours, minutes and seconds in that order.
    pub async fn set_time(
        &mut self,
        hours: u8,
        minutes: u8,
        seconds: u8,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let time = Time::new(hours, minutes, seconds).map_err(DS3231Error::DateTime)?;
        let [seconds, minutes, hours] = time.to_registers();
        self.write_register(RegAddr::Hours, hours).await?;
        self.write_register(RegAddr::Minutes, minutes).await?;
        self.write_register(RegAddr::Seconds, seconds).await?;
        Ok(())
    }

    pub async fn hours(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        Ok(bcd_to_decimal(self.read_register(RegAddr::Hours).await?))
    }

    pub async fn minutes(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        Ok(bcd_to_decimal(self.read_register(RegAddr::Minutes).await?))
    }

    pub async fn seconds(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        Ok(bcd_to_decimal(self.read_register(RegAddr::Seconds).await?))
    }

    /// Reads hours, minutes and seconds one register at a time.
    pub async fn time_string(&mut self) -> Result<Time, DS3231Error<I2C::Error>> {
        let hours = self.read_register(RegAddr::Hours).await?;
        let minutes = self.read_register(RegAddr::Minutes).await?;
        let seconds = self.read_register(RegAddr::Seconds).await?;
        Ok(Time::from_registers(seconds, minutes, hours))
    }

    /// Reads seconds, minutes and hours in one burst.
    pub async fn time(&mut self) -> Result<Time, DS3231Error<I2C::Error>> {
        let [seconds, minutes, hours]: [u8; 3] = self.read_burst(RegAddr::Seconds).await?;
        Ok(Time::from_registers(seconds, minutes, hours))
    }

    /// Sets weekday, day, month and year, written in that order.
    pub async fn set_date(
        &mut self,
        weekday: u8,
        day: u8,
        month: u8,
        year: u16,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let weekday = check_weekday(weekday).map_err(DS3231Error::DateTime)?;
        let date = Date::new(day, month, year).map_err(DS3231Error::DateTime)?;
        let [day, month, year] = date.to_registers();
        self.write_register(RegAddr::Weekday, weekday).await?;
        self.write_register(RegAddr::Day, day).await?;
        self.write_register(RegAddr::Month, month).await?;
        self.write_register(RegAddr::Year, year).await?;
        Ok(())
    }

    pub async fn year(&mut self) -> Result<u16, DS3231Error<I2C::Error>> {
        let year = self.read_register(RegAddr::Year).await?;
        Ok(BASE_YEAR + u16::from(bcd_to_decimal(year)))
    }

    pub async fn month(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        let month = Month::from(self.read_register(RegAddr::Month).await?);
        Ok(bcd_to_decimal(month.bcd_month()))
    }

    pub async fn day(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        Ok(bcd_to_decimal(self.read_register(RegAddr::Day).await?))
    }

    pub async fn weekday(&mut self) -> Result<u8, DS3231Error<I2C::Error>> {
        self.read_register(RegAddr::Weekday).await
    }

    /// Reads day, month and year one register at a time.
    pub async fn date_string(&mut self) -> Result<Date, DS3231Error<I2C::Error>> {
        let day = self.read_register(RegAddr::Day).await?;
        let month = self.read_register(RegAddr::Month).await?;
        let year = self.read_register(RegAddr::Year).await?;
        Ok(Date::from_registers(day, month, year))
    }

    /// Reads day, month and year in one burst.
    pub async fn date(&mut self) -> Result<Date, DS3231Error<I2C::Error>> {
        let [day, month, year]: [u8; 3] = self.read_burst(RegAddr::Day).await?;
        Ok(Date::from_registers(day, month, year))
    }

    /// Reads all seven time/date registers in one burst.
    pub async fn datetime(&mut self) -> Result<NaiveDateTime, DS3231Error<I2C::Error>> {
        let data: [u8; 7] = self.read_burst(RegAddr::Seconds).await?;
        DS3231DateTime::from(data)
            .into_datetime()
            .map_err(DS3231Error::DateTime)
    }

    /// Writes all seven time/date registers in one burst.
    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), DS3231Error<I2C::Error>> {
        let raw = DS3231DateTime::from_datetime(datetime).map_err(DS3231Error::DateTime)?;
        let data: [u8; 7] = (&raw).into();
        let mut buf = [0; 8];
        buf[0] = u8::from(RegAddr::Seconds);
        buf[1..].copy_from_slice(&data);
        self.i2c.write(self.address, &buf).await?;
        Ok(())
    }

    /// Reads the die temperature in °C according to the temperature mode.
    pub async fn temperature(&mut self) -> Result<f32, DS3231Error<I2C::Error>> {
        let msb = self.temperature_msb().await?;
        let lsb = self.temperature_lsb().await?;
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
                    pub async fn $rw_name(&mut self) -> Result<$rw_typ, DS3231Error<I2C::Error>> {
                        Ok(<$rw_typ>::from(self.read_register($rw_addr).await?))
                    }

                    #[doc = concat!("Writes the ", stringify!($rw_name), " register.")]
                    pub async fn [<set_ $rw_name>](&mut self, value: $rw_typ) -> Result<(), DS3231Error<I2C::Error>> {
                        self.write_register($rw_addr, value.into()).await
                    }
                }
            )*
            $(
                #[doc = concat!("Reads the ", stringify!($ro_name), " register.")]
                pub async fn $ro_name(&mut self) -> Result<$ro_typ, DS3231Error<I2C::Error>> {
                    Ok(<$ro_typ>::from(self.read_register($ro_addr).await?))
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

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use chrono::NaiveDate;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x68;

    async fn setup_mock(expectations: &[I2cTrans]) -> I2cMock {
        I2cMock::new(expectations)
    }

    fn read(reg: RegAddr, value: u8) -> I2cTrans {
        I2cTrans::write_read(DEVICE_ADDRESS, vec![reg as u8], vec![value])
    }

    fn write(reg: RegAddr, value: u8) -> I2cTrans {
        I2cTrans::write(DEVICE_ADDRESS, vec![reg as u8, value])
    }

    #[tokio::test]
    async fn test_async_init() {
        let mock = setup_mock(&[
            write(RegAddr::Control, 0x4C),
            write(RegAddr::ControlStatus, 0x08),
        ])
        .await;
        let dev = DS3231::init(mock, DEVICE_ADDRESS, &Config::default())
            .await
            .unwrap();
        dev.release().done();
    }

    #[tokio::test]
    async fn test_async_set_time_and_read_back() {
        let mock = setup_mock(&[
            write(RegAddr::Hours, 0x23),
            write(RegAddr::Minutes, 0x59),
            write(RegAddr::Seconds, 0x59),
            read(RegAddr::Hours, 0x23),
            read(RegAddr::Minutes, 0x59),
            read(RegAddr::Seconds, 0x59),
        ])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        dev.set_time(23, 59, 59).await.unwrap();
        assert_eq!(dev.hours().await.unwrap(), 23);
        assert_eq!(dev.minutes().await.unwrap(), 59);
        assert_eq!(dev.seconds().await.unwrap(), 59);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_set_time_rejects_out_of_range() {
        let mock = setup_mock(&[]).await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        assert!(matches!(
            dev.set_time(24, 0, 0).await,
            Err(DS3231Error::DateTime(_))
        ));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_set_date_and_read_back() {
        let mock = setup_mock(&[
            write(RegAddr::Weekday, 7),
            write(RegAddr::Day, 0x31),
            write(RegAddr::Month, 0x12),
            write(RegAddr::Year, 0x99),
            read(RegAddr::Weekday, 7),
            read(RegAddr::Day, 0x31),
            read(RegAddr::Month, 0x92),
            read(RegAddr::Year, 0x99),
        ])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        dev.set_date(7, 31, 12, 2099).await.unwrap();
        assert_eq!(dev.weekday().await.unwrap(), 7);
        assert_eq!(dev.day().await.unwrap(), 31);
        // century flag set by the device is ignored
        assert_eq!(dev.month().await.unwrap(), 12);
        assert_eq!(dev.year().await.unwrap(), 2099);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_strings() {
        let mock = setup_mock(&[
            read(RegAddr::Hours, 0x01),
            read(RegAddr::Minutes, 0x02),
            read(RegAddr::Seconds, 0x03),
            read(RegAddr::Day, 0x05),
            read(RegAddr::Month, 0x06),
            read(RegAddr::Year, 0x24),
        ])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        assert_eq!(dev.time_string().await.unwrap().to_string(), "01:02:03");
        assert_eq!(dev.date_string().await.unwrap().to_string(), "05-06-2024");
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_datetime() {
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8],
            vec![0x00, 0x30, 0x15, 0x05, 0x14, 0x03, 0x24],
        )])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        let expected = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        assert_eq!(dev.datetime().await.unwrap(), expected);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_set_datetime() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        let mock = setup_mock(&[I2cTrans::write(
            DEVICE_ADDRESS,
            vec![
                RegAddr::Seconds as u8,
                0x00,
                0x30,
                0x15,
                0x05,
                0x14,
                0x03,
                0x24,
            ],
        )])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        dev.set_datetime(&dt).await.unwrap();
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_temperature() {
        let mock = setup_mock(&[
            read(RegAddr::MSBTemp, 0x19),
            read(RegAddr::LSBTemp, 0x40),
            read(RegAddr::MSBTemp, 0x19),
            read(RegAddr::LSBTemp, 0x40),
        ])
        .await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        assert_eq!(dev.temperature().await.unwrap(), 0.0);
        dev.set_temperature_mode(TemperatureMode::Signed);
        assert_eq!(dev.temperature().await.unwrap(), 25.25);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_write_nack_is_propagated() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);
        let mock = setup_mock(&[write(RegAddr::Weekday, 3).with_error(nack)]).await;
        let mut dev = DS3231::new(mock, DEVICE_ADDRESS);
        let err = dev.set_date(3, 1, 1, 2024).await.unwrap_err();
        assert!(matches!(err, DS3231Error::I2c(e) if e == nack));
        dev.i2c.done();
    }
}
