use crate::database::column::ColumnType;
use crate::database::value::Value;
use crate::spreadsheet::reference::index_to_reference;
use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use iso8601_duration::Duration as IsoDuration;
use std::fmt::Display;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `1` / `0`
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// ISO 8601 duration strings
    IsoDuration,
    /// Text stored in the cell itself
    InlineString,
    /// Index into the shared string table, resolved to `InlineString` while reading
    SharedString,
    /// Error values such as `#N/A`
    Error,
}

impl CellType {
    /// Maps built-in number format IDs with a date or time meaning.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => {
                Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 })
            }
            _ => None,
        }
    }

    /// Classifies a custom number format code by the date and time tokens outside
    /// quoted literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// A single non-empty cell with its position, type and raw value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value as stored in the file
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the cell to a 64-bit integer.
    ///
    /// Numbers must be whole and within range. Text must be a plain decimal integer
    /// without a superfluous leading zero, so identifiers like `007` stay text.
    pub(crate) fn to_integer(&self) -> Result<i64, String> {
        let failed = || format!("'{}' is not an integer", self.value);
        match self.kind {
            CellType::Number => {
                if let Ok(integer) = self.value.parse::<i64>() {
                    return Ok(integer);
                }
                let number = self.value.parse::<f64>().map_err(|_| failed())?;
                // i64::MAX is not representable as f64, the cast rounds up to 2^63
                if number.fract() == 0.0 && number >= i64::MIN as f64 && number < i64::MAX as f64 {
                    Ok(number as i64)
                } else {
                    Err(failed())
                }
            }
            CellType::InlineString => parse_integer_text(&self.value).ok_or_else(failed),
            _ => Err(failed()),
        }
    }

    /// Converts the cell to a finite double-precision number. Text with a superfluous
    /// leading zero such as `007` is not a number.
    pub(crate) fn to_float(&self) -> Result<f64, String> {
        match self.kind {
            CellType::Number => self
                .value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or_else(|| format!("'{}' is not a number", self.value)),
            CellType::InlineString => {
                parse_float_text(&self.value).ok_or_else(|| format!("'{}' is not a number", self.value))
            }
            _ => Err(format!("'{}' is not a number", self.value)),
        }
    }

    /// Converts the cell to a timestamp.
    ///
    /// Date and date-time formatted numbers use the workbook's epoch; ISO cells and
    /// text accept `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[.f]`, the `T` separated form
    /// and RFC 3339. Time-only values are not timestamps.
    pub(crate) fn to_timestamp(&self) -> Result<NaiveDateTime, String> {
        let failed = || format!("'{}' is not a timestamp", self.value);
        match self.kind {
            CellType::NumberDateTime1900
            | CellType::NumberDate1900
            | CellType::NumberDateTime1904
            | CellType::NumberDate1904 => {
                let serial = self.value.parse::<f64>().map_err(|_| failed())?;
                serial_to_datetime(serial, self.kind.is_1904()).ok_or_else(failed)
            }
            CellType::IsoDateTime | CellType::InlineString => parse_timestamp_text(&self.value).ok_or_else(failed),
            _ => Err(failed()),
        }
    }

    /// Converts the cell to a value of the given column type.
    pub(crate) fn to_value(&self, kind: ColumnType) -> Result<Value, String> {
        match kind {
            ColumnType::Integer => self.to_integer().map(Value::Integer),
            ColumnType::Float => self.to_float().map(Value::Float),
            ColumnType::Timestamp => self.to_timestamp().map(Value::Timestamp),
            ColumnType::String => Ok(Value::String(self.to_string())),
        }
    }
}

impl Display for Cell {
    /// Renders the cell the way a spreadsheet displays it.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let serial = || self.value.parse::<f64>().ok();
        match self.kind {
            CellType::Boolean => write!(f, "{}", self.value == "1" || self.value.eq_ignore_ascii_case("true")),
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                match serial().and_then(|serial| serial_to_datetime(serial, self.kind.is_1904())) {
                    Some(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d")),
                    None => write!(f, "{}", self.value),
                }
            }
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                match serial().and_then(|serial| serial_to_datetime(serial, self.kind.is_1904())) {
                    Some(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S%.f")),
                    None => write!(f, "{}", self.value),
                }
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => match serial().and_then(serial_to_time) {
                Some(time) => write!(f, "{}", time.format("%H:%M:%S%.f")),
                None => write!(f, "{}", self.value),
            },
            CellType::IsoDateTime => write!(f, "{}", self.value.replace('T', " ")),
            CellType::IsoDuration => match self.value.parse::<IsoDuration>() {
                Ok(duration) => {
                    let hours = duration.day as i64 * 24 + duration.hour as i64;
                    let seconds = duration.second.round() as i64;
                    write!(f, "{:02}:{:02}:{:02}", hours, duration.minute as i64, seconds)
                }
                Err(_) => write!(f, "{}", self.value),
            },
            _ => write!(f, "{}", self.value),
        }
    }
}

/// Converts a date serial number to a date-time, rounded to milliseconds.
/// The 1900 system counts the Lotus 1-2-3 phantom 1900-02-29, so serials below 60 shift by a day.
fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc();
    let milliseconds = ((serial - days) * 86_400_000f64).round() as i64;
    let base = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if days < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_days(days as i64)?)?
        .checked_add_signed(Duration::try_milliseconds(milliseconds)?)
}

/// Converts the fractional part of a serial number to a time of day.
fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() {
        return None;
    }
    let milliseconds = (serial.fract().abs() * 86_400_000f64).round() as u32 % 86_400_000;
    NaiveTime::from_num_seconds_from_midnight_opt(milliseconds / 1_000, milliseconds % 1_000 * 1_000_000)
}

fn parse_integer_text(text: &str) -> Option<i64> {
    let text = text.trim();
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    text.parse::<i64>().ok()
}

fn parse_float_text(text: &str) -> Option<f64> {
    let text = text.trim();
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let mut bytes = digits.bytes();
    if bytes.next() == Some(b'0') && bytes.next().is_some_and(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>().ok().filter(|number| number.is_finite())
}

fn parse_timestamp_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime);
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|datetime| datetime.naive_utc())
}
