//! BCD codec and time/date value types for the DS3231 RTC.
//!
//! The DS3231 keeps its clock in seven consecutive registers. All of them
//! except the weekday are binary-coded decimal: the high nibble holds the tens
//! digit and the low nibble the ones digit.
//!
//! # Register Model
//!
//! | Register | Encoding |
//! |---|---|
//! | Seconds, Minutes, Hours | BCD |
//! | Weekday | raw 1-7 |
//! | Day | BCD |
//! | Month | BCD, bit 7 = century flag (ignored) |
//! | Year | BCD offset from 2000 |
//!
//! [`Time`] and [`Date`] are validated on construction. Values decoded from the
//! device are taken as-is, so a corrupted register produces odd numbers rather
//! than a panic.

use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::registers::Month;

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        use defmt::{debug, error};
    } else if #[cfg(feature = "log")] {
        use log::{debug, error};
    }
}

/// Year stored in the year register as `0`.
pub const BASE_YEAR: u16 = 2000;

/// Encodes a decimal value (0-99) as BCD.
///
/// Values above 99 are outside the contract: the result carries a tens nibble
/// above 9, which the device will not interpret sensibly.
pub fn decimal_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Decodes a BCD byte into its decimal value.
///
/// Nibbles above 9 are not rejected.
pub fn bcd_to_decimal(bcd: u8) -> u8 {
    ((bcd >> 4) & 0x0F) * 10 + (bcd & 0x0F)
}

/// Errors that can occur during DS3231 date/time conversion or validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DS3231DateTimeError {
    /// Hours outside 0-23
    InvalidHours,
    /// Minutes outside 0-59
    InvalidMinutes,
    /// Seconds outside 0-59
    InvalidSeconds,
    /// Weekday outside 1-7
    InvalidWeekday,
    /// Day of month outside 1-31
    InvalidDay,
    /// Month outside 1-12
    InvalidMonth,
    /// Year before 2000
    YearNotAfter1999,
    /// Year after 2099; the century flag is not used
    YearNotBefore2100,
    /// The registers do not form a valid calendar date or time
    InvalidDateTime,
}

impl fmt::Display for DS3231DateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DS3231DateTimeError::InvalidHours => "hours must be 0-23",
            DS3231DateTimeError::InvalidMinutes => "minutes must be 0-59",
            DS3231DateTimeError::InvalidSeconds => "seconds must be 0-59",
            DS3231DateTimeError::InvalidWeekday => "weekday must be 1-7",
            DS3231DateTimeError::InvalidDay => "day must be 1-31",
            DS3231DateTimeError::InvalidMonth => "month must be 1-12",
            DS3231DateTimeError::YearNotAfter1999 => "year must be 2000 or later",
            DS3231DateTimeError::YearNotBefore2100 => "year must be 2099 or earlier",
            DS3231DateTimeError::InvalidDateTime => "invalid date/time",
        };
        f.write_str(msg)
    }
}

/// Checks a weekday for [`crate::DS3231::set_date`].
pub(crate) fn check_weekday(weekday: u8) -> Result<u8, DS3231DateTimeError> {
    if (1..=7).contains(&weekday) {
        Ok(weekday)
    } else {
        #[cfg(any(feature = "log", feature = "defmt"))]
        error!("DS3231: rejected weekday {}", weekday);
        Err(DS3231DateTimeError::InvalidWeekday)
    }
}

/// Wall-clock time in 24-hour form.
///
/// Formats as `HH:MM:SS`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Time {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl Time {
    /// Creates a time, checking every field before returning.
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, DS3231DateTimeError> {
        let err = if hours > 23 {
            Some(DS3231DateTimeError::InvalidHours)
        } else if minutes > 59 {
            Some(DS3231DateTimeError::InvalidMinutes)
        } else if seconds > 59 {
            Some(DS3231DateTimeError::InvalidSeconds)
        } else {
            None
        };
        if let Some(err) = err {
            #[cfg(any(feature = "log", feature = "defmt"))]
            error!("DS3231: rejected time {}:{}:{}", hours, minutes, seconds);
            return Err(err);
        }
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    /// Decodes the raw seconds, minutes and hours registers.
    pub(crate) fn from_registers(seconds: u8, minutes: u8, hours: u8) -> Self {
        Self {
            hours: bcd_to_decimal(hours),
            minutes: bcd_to_decimal(minutes),
            seconds: bcd_to_decimal(seconds),
        }
    }

    /// Register bytes in address order: seconds, minutes, hours.
    pub(crate) fn to_registers(self) -> [u8; 3] {
        [
            decimal_to_bcd(self.seconds),
            decimal_to_bcd(self.minutes),
            decimal_to_bcd(self.hours),
        ]
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl TryFrom<NaiveTime> for Time {
    type Error = DS3231DateTimeError;

    fn try_from(time: NaiveTime) -> Result<Self, Self::Error> {
        // leap seconds show up as nanosecond overflow, which is dropped here
        Time::new(
            u8::try_from(time.hour()).map_err(|_| DS3231DateTimeError::InvalidHours)?,
            u8::try_from(time.minute()).map_err(|_| DS3231DateTimeError::InvalidMinutes)?,
            u8::try_from(time.second()).map_err(|_| DS3231DateTimeError::InvalidSeconds)?,
        )
    }
}

impl TryFrom<Time> for NaiveTime {
    type Error = DS3231DateTimeError;

    fn try_from(time: Time) -> Result<Self, Self::Error> {
        NaiveTime::from_hms_opt(
            u32::from(time.hours),
            u32::from(time.minutes),
            u32::from(time.seconds),
        )
        .ok_or(DS3231DateTimeError::InvalidDateTime)
    }
}

/// Calendar date between 2000-01-01 and 2099-12-31.
///
/// Only range checks are applied; 31 February is accepted. Formats as
/// `DD-MM-YYYY`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Date {
    day: u8,
    month: u8,
    year: u16,
}

impl Date {
    /// Creates a date, checking every field before returning.
    pub fn new(day: u8, month: u8, year: u16) -> Result<Self, DS3231DateTimeError> {
        let err = if !(1..=31).contains(&day) {
            Some(DS3231DateTimeError::InvalidDay)
        } else if !(1..=12).contains(&month) {
            Some(DS3231DateTimeError::InvalidMonth)
        } else if year < BASE_YEAR {
            Some(DS3231DateTimeError::YearNotAfter1999)
        } else if year > BASE_YEAR + 99 {
            Some(DS3231DateTimeError::YearNotBefore2100)
        } else {
            None
        };
        if let Some(err) = err {
            #[cfg(any(feature = "log", feature = "defmt"))]
            error!("DS3231: rejected date {}-{}-{}", day, month, year);
            return Err(err);
        }
        Ok(Self { day, month, year })
    }

    /// Decodes the raw day, month and year registers.
    pub(crate) fn from_registers(day: u8, month: u8, year: u8) -> Self {
        let month = Month::from(month);
        #[cfg(any(feature = "log", feature = "defmt"))]
        if month.century() {
            debug!("DS3231: ignoring century flag");
        }
        Self {
            day: bcd_to_decimal(day),
            month: bcd_to_decimal(month.bcd_month()),
            year: BASE_YEAR + u16::from(bcd_to_decimal(year)),
        }
    }

    /// Register bytes in address order: day, month, year.
    pub(crate) fn to_registers(self) -> [u8; 3] {
        // always below 100 once validated
        let offset = (self.year - BASE_YEAR) as u8;
        let mut month = Month::default();
        month.set_bcd_month(decimal_to_bcd(self.month));
        [decimal_to_bcd(self.day), month.into(), decimal_to_bcd(offset)]
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u16 {
        self.year
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:04}", self.day, self.month, self.year)
    }
}

impl TryFrom<NaiveDate> for Date {
    type Error = DS3231DateTimeError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        let year = match u16::try_from(date.year()) {
            Ok(year) => year,
            Err(_) if date.year() < 0 => return Err(DS3231DateTimeError::YearNotAfter1999),
            Err(_) => return Err(DS3231DateTimeError::YearNotBefore2100),
        };
        Date::new(
            u8::try_from(date.day()).map_err(|_| DS3231DateTimeError::InvalidDay)?,
            u8::try_from(date.month()).map_err(|_| DS3231DateTimeError::InvalidMonth)?,
            year,
        )
    }
}

impl TryFrom<Date> for NaiveDate {
    type Error = DS3231DateTimeError;

    fn try_from(date: Date) -> Result<Self, Self::Error> {
        NaiveDate::from_ymd_opt(
            i32::from(date.year),
            u32::from(date.month),
            u32::from(date.day),
        )
        .ok_or(DS3231DateTimeError::InvalidDateTime)
    }
}

/// The seven time/date registers, as read or written in one burst.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct DS3231DateTime {
    time: Time,
    weekday: u8,
    date: Date,
}

impl DS3231DateTime {
    pub(crate) fn from_datetime(datetime: &NaiveDateTime) -> Result<Self, DS3231DateTimeError> {
        let time = Time::try_from(datetime.time())?;
        let date = Date::try_from(datetime.date())?;
        // 1 = Sunday
        let weekday = check_weekday(datetime.weekday().number_from_sunday() as u8)?;
        Ok(Self {
            time,
            weekday,
            date,
        })
    }

    pub(crate) fn into_datetime(self) -> Result<NaiveDateTime, DS3231DateTimeError> {
        let date = NaiveDate::try_from(self.date)?;
        let time = NaiveTime::try_from(self.time)?;
        Ok(NaiveDateTime::new(date, time))
    }
}

impl From<[u8; 7]> for DS3231DateTime {
    fn from(data: [u8; 7]) -> Self {
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!(
            "DS3231: raw datetime {} {} {} {} {} {} {}",
            data[0], data[1], data[2], data[3], data[4], data[5], data[6]
        );
        DS3231DateTime {
            time: Time::from_registers(data[0], data[1], data[2]),
            weekday: data[3],
            date: Date::from_registers(data[4], data[5], data[6]),
        }
    }
}

impl From<&DS3231DateTime> for [u8; 7] {
    fn from(dt: &DS3231DateTime) -> [u8; 7] {
        let [seconds, minutes, hours] = dt.time.to_registers();
        let [day, month, year] = dt.date.to_registers();
        [seconds, minutes, hours, dt.weekday, day, month, year]
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_bcd_round_trip() {
        for value in 0..=99u8 {
            assert_eq!(bcd_to_decimal(decimal_to_bcd(value)), value);
        }
    }

    #[test]
    fn test_bcd_encoding() {
        assert_eq!(decimal_to_bcd(0), 0x00);
        assert_eq!(decimal_to_bcd(9), 0x09);
        assert_eq!(decimal_to_bcd(10), 0x10);
        assert_eq!(decimal_to_bcd(59), 0x59);
        assert_eq!(decimal_to_bcd(99), 0x99);
        assert_eq!(bcd_to_decimal(0x45), 45);
    }

    #[test]
    fn test_bcd_out_of_contract_does_not_panic() {
        // tens nibble above 9 is produced, not rejected
        assert_eq!(decimal_to_bcd(100), 0xA0);
        let _ = decimal_to_bcd(255);
        assert_eq!(bcd_to_decimal(0xFF), 165);
    }

    #[test]
    fn test_time_validation() {
        assert!(Time::new(0, 0, 0).is_ok());
        assert!(Time::new(23, 59, 59).is_ok());
        assert_eq!(Time::new(24, 0, 0), Err(DS3231DateTimeError::InvalidHours));
        assert_eq!(Time::new(0, 60, 0), Err(DS3231DateTimeError::InvalidMinutes));
        assert_eq!(Time::new(0, 0, 60), Err(DS3231DateTimeError::InvalidSeconds));
    }

    #[test]
    fn test_date_validation() {
        assert!(Date::new(1, 1, 2000).is_ok());
        assert!(Date::new(31, 12, 2099).is_ok());
        // no days-in-month check
        assert!(Date::new(31, 2, 2023).is_ok());
        assert_eq!(Date::new(0, 1, 2000), Err(DS3231DateTimeError::InvalidDay));
        assert_eq!(Date::new(32, 1, 2000), Err(DS3231DateTimeError::InvalidDay));
        assert_eq!(Date::new(1, 0, 2000), Err(DS3231DateTimeError::InvalidMonth));
        assert_eq!(Date::new(1, 13, 2000), Err(DS3231DateTimeError::InvalidMonth));
        assert_eq!(
            Date::new(1, 1, 1999),
            Err(DS3231DateTimeError::YearNotAfter1999)
        );
        assert_eq!(
            Date::new(1, 1, 2100),
            Err(DS3231DateTimeError::YearNotBefore2100)
        );
    }

    #[test]
    fn test_weekday_validation() {
        assert_eq!(check_weekday(1), Ok(1));
        assert_eq!(check_weekday(7), Ok(7));
        assert_eq!(check_weekday(0), Err(DS3231DateTimeError::InvalidWeekday));
        assert_eq!(check_weekday(8), Err(DS3231DateTimeError::InvalidWeekday));
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(Time::new(1, 2, 3).unwrap().to_string(), "01:02:03");
        assert_eq!(Time::new(23, 59, 59).unwrap().to_string(), "23:59:59");
        assert_eq!(Date::new(5, 6, 2024).unwrap().to_string(), "05-06-2024");
        assert_eq!(Date::new(31, 12, 2099).unwrap().to_string(), "31-12-2099");
    }

    #[test]
    fn test_register_encoding() {
        let time = Time::new(12, 30, 45).unwrap();
        assert_eq!(time.to_registers(), [0x45, 0x30, 0x12]);
        assert_eq!(Time::from_registers(0x45, 0x30, 0x12), time);

        let date = Date::new(31, 12, 2099).unwrap();
        assert_eq!(date.to_registers(), [0x31, 0x12, 0x99]);
        assert_eq!(Date::from_registers(0x31, 0x12, 0x99), date);
    }

    #[test]
    fn test_century_flag_ignored_on_read() {
        let date = Date::from_registers(0x15, 0x81, 0x24);
        assert_eq!(date.month(), 1);
        assert_eq!(date.year(), 2024);
    }

    #[test]
    fn test_chrono_conversions() {
        let naive = NaiveTime::from_hms_opt(15, 30, 0).unwrap();
        let time = Time::try_from(naive).unwrap();
        assert_eq!(time, Time::new(15, 30, 0).unwrap());
        assert_eq!(NaiveTime::try_from(time).unwrap(), naive);

        let naive = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let date = Date::try_from(naive).unwrap();
        assert_eq!(date, Date::new(14, 3, 2024).unwrap());
        assert_eq!(NaiveDate::try_from(date).unwrap(), naive);

        let too_late = NaiveDate::from_ymd_opt(2100, 1, 1).unwrap();
        assert_eq!(
            Date::try_from(too_late),
            Err(DS3231DateTimeError::YearNotBefore2100)
        );
        // accepted by range checks, rejected by the calendar
        let feb30 = Date::new(30, 2, 2024).unwrap();
        assert_eq!(
            NaiveDate::try_from(feb30),
            Err(DS3231DateTimeError::InvalidDateTime)
        );
    }

    #[test]
    fn test_datetime_registers() {
        // 2024-03-14 (Thursday) 15:30:00
        let dt = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        let raw = DS3231DateTime::from_datetime(&dt).unwrap();
        let data: [u8; 7] = (&raw).into();
        assert_eq!(data, [0x00, 0x30, 0x15, 0x05, 0x14, 0x03, 0x24]);
        assert_eq!(DS3231DateTime::from(data).into_datetime().unwrap(), dt);
    }

    #[test]
    fn test_datetime_year_out_of_range() {
        let dt = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(
            DS3231DateTime::from_datetime(&dt),
            Err(DS3231DateTimeError::YearNotAfter1999)
        );
    }

    #[test]
    fn test_invalid_registers_fail_conversion() {
        // month 0x13 decodes to 13
        let raw = DS3231DateTime::from([0x00, 0x00, 0x00, 0x01, 0x01, 0x13, 0x24]);
        assert_eq!(
            raw.into_datetime(),
            Err(DS3231DateTimeError::InvalidDateTime)
        );
    }
}
