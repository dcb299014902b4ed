//! Wire primitives
//!
//! Layout:
//! - bool: 1 byte, nonzero is true
//! - i32 / i64: little-endian
//! - string: 7-bit varint byte length, then UTF-8 bytes
//! - nullable X: presence bool, then X when present
//! - timestamp: i64 local clock ticks (100 ns since 0001-01-01), then
//!   i64 UTC offset ticks

use chrono::{DateTime, FixedOffset, TimeZone};

use super::errors::{CursorError, CursorResult};

const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;
/// Ticks between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
/// Ticks at 9999-12-31 23:59:59.9999999
const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

/// Splits a timestamp into (local clock ticks, offset ticks)
pub fn to_ticks(timestamp: &DateTime<FixedOffset>) -> (i64, i64) {
    let local = timestamp.naive_local().and_utc();
    let ticks = UNIX_EPOCH_TICKS
        + local.timestamp() * TICKS_PER_SECOND
        + i64::from(local.timestamp_subsec_nanos()) / NANOS_PER_TICK;
    let offset_ticks = i64::from(timestamp.offset().local_minus_utc()) * TICKS_PER_SECOND;
    (ticks, offset_ticks)
}

/// Rebuilds a timestamp from (local clock ticks, offset ticks)
pub fn from_ticks(ticks: i64, offset_ticks: i64) -> CursorResult<DateTime<FixedOffset>> {
    let invalid = || CursorError::InvalidTimestamp {
        ticks,
        offset_ticks,
    };

    if !(0..=MAX_TICKS).contains(&ticks) || offset_ticks % TICKS_PER_SECOND != 0 {
        return Err(invalid());
    }
    let offset_seconds = i32::try_from(offset_ticks / TICKS_PER_SECOND).map_err(|_| invalid())?;
    let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(invalid)?;

    let since_epoch = ticks - UNIX_EPOCH_TICKS;
    let seconds = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK) as u32;
    let local = DateTime::from_timestamp(seconds, nanos)
        .ok_or_else(invalid)?
        .naive_utc();

    offset.from_local_datetime(&local).single().ok_or_else(invalid)
}

/// Append-only encoder
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes a bool and returns it, so presence flags read naturally
    pub fn write_bool(&mut self, value: bool) -> bool {
        self.buf.push(u8::from(value));
        value
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a collection count as i32
    pub fn write_count(&mut self, count: usize) -> CursorResult<()> {
        let count = i32::try_from(count).map_err(|_| CursorError::TooLarge(count))?;
        self.write_i32(count);
        Ok(())
    }

    fn write_varint(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Writes a length-prefixed UTF-8 string
    pub fn write_string(&mut self, value: &str) -> CursorResult<()> {
        let len = value.len();
        if len > i32::MAX as usize {
            return Err(CursorError::TooLarge(len));
        }
        self.write_varint(len as u32);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_nullable_string(&mut self, value: Option<&str>) -> CursorResult<()> {
        match value {
            Some(s) => {
                self.write_bool(true);
                self.write_string(s)
            }
            None => {
                self.write_bool(false);
                Ok(())
            }
        }
    }

    pub fn write_nullable_i32(&mut self, value: Option<i32>) {
        if let Some(v) = value {
            self.write_bool(true);
            self.write_i32(v);
        } else {
            self.write_bool(false);
        }
    }

    pub fn write_nullable_timestamp(&mut self, value: Option<&DateTime<FixedOffset>>) {
        if let Some(ts) = value {
            self.write_bool(true);
            let (ticks, offset_ticks) = to_ticks(ts);
            self.write_i64(ticks);
            self.write_i64(offset_ticks);
        } else {
            self.write_bool(false);
        }
    }
}

/// Forward-only decoder over a byte slice
#[derive(Debug)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> CursorResult<&'a [u8]> {
        if self.remaining() < needed {
            return Err(CursorError::UnexpectedEof {
                offset: self.pos,
                needed,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> CursorResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_bool(&mut self) -> CursorResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> CursorResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i32(&mut self) -> CursorResult<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> CursorResult<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    /// Reads a non-negative i32 count
    pub fn read_count(&mut self) -> CursorResult<usize> {
        let offset = self.pos;
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| CursorError::InvalidLength {
            offset,
            length: i64::from(count),
        })
    }

    fn read_varint(&mut self) -> CursorResult<u32> {
        let offset = self.pos;
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            if shift == 28 && byte > 0x0F {
                break;
            }
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CursorError::InvalidLength {
            offset,
            length: i64::from(value),
        })
    }

    pub fn read_string(&mut self) -> CursorResult<String> {
        let offset = self.pos;
        let len = self.read_varint()?;
        if len > i32::MAX as u32 {
            return Err(CursorError::InvalidLength {
                offset,
                length: i64::from(len),
            });
        }
        let start = self.pos;
        let bytes = self.take(len as usize)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CursorError::InvalidUtf8(start))
    }

    pub fn read_nullable_string(&mut self) -> CursorResult<Option<String>> {
        if self.read_bool()? {
            self.read_string().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_nullable_i32(&mut self) -> CursorResult<Option<i32>> {
        if self.read_bool()? {
            self.read_i32().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_nullable_timestamp(&mut self) -> CursorResult<Option<DateTime<FixedOffset>>> {
        if !self.read_bool()? {
            return Ok(None);
        }
        let ticks = self.read_i64()?;
        let offset_ticks = self.read_i64()?;
        from_ticks(ticks, offset_ticks).map(Some)
    }
}
