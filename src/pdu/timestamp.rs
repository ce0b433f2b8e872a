// ABOUTME: Service centre timestamp codec, 7 swapped-BCD bytes per TS 23.040 §9.2.3.11
// ABOUTME: Timezone is quarter-hours from UTC with a sign bit inside the BCD

use crate::pdu::error::{PduError, PduResult};
use std::fmt;

/// Service centre timestamp attached to SMS-DELIVER and SMS-STATUS-REPORT.
///
/// The year is two digits as transmitted (2000-relative in practice). The
/// timezone is quarter-hours east of UTC, negative west, range ±79.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub tz_quarter_hours: i8,
}

fn swap(byte: u8) -> u8 {
    byte << 4 | byte >> 4
}

fn from_bcd(byte: u8) -> PduResult<u8> {
    let tens = byte >> 4;
    let units = byte & 0x0F;
    if tens > 9 || units > 9 {
        return Err(PduError::InvalidTimestamp("non-decimal BCD digit"));
    }
    Ok(tens * 10 + units)
}

fn to_bcd(value: u8) -> u8 {
    (value / 10) << 4 | (value % 10)
}

impl Timestamp {
    /// Decode from the 7-byte wire form.
    pub fn decode(data: &[u8]) -> PduResult<Self> {
        if data.len() != 7 {
            return Err(PduError::InvalidTimestamp("timestamp must be 7 bytes"));
        }
        let field = |i: usize| from_bcd(swap(data[i]));

        // Sign lives in bit 3 of the tens digit of the timezone field.
        let tz = swap(data[6]);
        let negative = tz & 0x80 != 0;
        let quarters = from_bcd(tz & 0x7F)? as i8;

        let ts = Timestamp {
            year: field(0)?,
            month: field(1)?,
            day: field(2)?,
            hour: field(3)?,
            minute: field(4)?,
            second: field(5)?,
            tz_quarter_hours: if negative { -quarters } else { quarters },
        };
        if ts.month > 12 || ts.day > 31 || ts.hour > 23 || ts.minute > 59 || ts.second > 59 {
            return Err(PduError::InvalidTimestamp("field out of range"));
        }
        Ok(ts)
    }

    /// Encode into the 7-byte wire form.
    pub fn encode(&self) -> PduResult<[u8; 7]> {
        if self.month > 12
            || self.day > 31
            || self.hour > 23
            || self.minute > 59
            || self.second > 59
            || self.year > 99
            || self.tz_quarter_hours.unsigned_abs() > 79
        {
            return Err(PduError::InvalidTimestamp("field out of range"));
        }
        let mut tz = to_bcd(self.tz_quarter_hours.unsigned_abs());
        if self.tz_quarter_hours < 0 {
            tz |= 0x80;
        }
        Ok([
            swap(to_bcd(self.year)),
            swap(to_bcd(self.month)),
            swap(to_bcd(self.day)),
            swap(to_bcd(self.hour)),
            swap(to_bcd(self.minute)),
            swap(to_bcd(self.second)),
            swap(tz),
        ])
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = i32::from(self.tz_quarter_hours) * 15;
        write!(
            f,
            "{:02}/{:02}/{:02} {:02}:{:02}:{:02} {}{:02}:{:02}",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            if minutes < 0 { '-' } else { '+' },
            minutes.abs() / 60,
            minutes.abs() % 60,
        )
    }
}
