use logos::{Lexer, Logos};
use thiserror::Error;
use time::{Date, Month};

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t]+")] // Ignore this regex pattern between tokens
enum Token {
    #[regex("[0-9]+")]
    Number,

    #[token("-")]
    Dash,
    #[token("/")]
    Slash,
    #[token(".")]
    Dot,

    #[token("T")]
    TimeMarker,
    #[token(":")]
    Colon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    Dash,
    Slash,
    Dot,
}

#[derive(Debug, Clone, Copy)]
struct Component {
    value: u32,
    digits: usize,
}

#[derive(Debug, Error)]
pub enum DateError {
    #[error("Invalid date: {0}")]
    InvalidDate(#[from] time::error::ComponentRange),
    #[error("Empty date")]
    Empty,
    #[error("Unexpected `{0}` in date")]
    Unexpected(String),
    #[error("Missing {0} in date")]
    Missing(&'static str),
    #[error("Date mixes separators")]
    MixedSeparators,
    #[error("Bad month: {0}")]
    BadMonth(u32),
    #[error("Bad day: {0}")]
    BadDay(u32),
    #[error("Cannot tell where the year is in `{0}`, expecting a four digit year")]
    Unrecognized(String),
}

/// Parses a calendar date without an explicit format string.
///
/// Year-first dates (`2024-03-01`, `2024/03/01`, `2024.03.01`) are read as
/// year, month, day. Dates with a trailing year are month first whatever the
/// separator (`03/01/2024`, `03.01.2024`), unless the leading number cannot be
/// a month (`25/03/2024`, `25.03.2024`). A time of day after the
/// date (`2024-03-01T06:00`, `2024-03-01 06:00:00`) is accepted and dropped.
pub fn parse_date(s: &str) -> Result<Date, DateError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DateError::Empty);
    }
    let mut lexer = Token::lexer(s);

    let first = component(&mut lexer, "first date component")?;
    let sep = separator(&mut lexer)?;
    let second = component(&mut lexer, "second date component")?;
    if separator(&mut lexer)? != sep {
        return Err(DateError::MixedSeparators);
    }
    let third = component(&mut lexer, "third date component")?;
    skip_time_of_day(&mut lexer)?;

    let (year, month, day) = if first.digits == 4 {
        (first.value, second.value, third.value)
    } else if third.digits == 4 {
        if first.value > 12 {
            (third.value, second.value, first.value)
        } else {
            (third.value, first.value, second.value)
        }
    } else {
        return Err(DateError::Unrecognized(s.to_string()));
    };

    build(year, month, day)
}

/// `YYYY-MM-DD`, the way every date appears in the report.
pub fn format_iso(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}

/// Three letter English abbreviation of a month number, `None` outside 1..=12.
pub fn month_abbr(month: u8) -> Option<&'static str> {
    MONTH_ABBR.get(usize::from(month).checked_sub(1)?).copied()
}

pub fn month_name(month: u8) -> Option<String> {
    Month::try_from(month).ok().map(|month| month.to_string())
}

fn component(lexer: &mut Lexer<Token>, what: &'static str) -> Result<Component, DateError> {
    match lexer.next() {
        Some(Ok(Token::Number)) => {
            let slice = lexer.slice();
            let value = slice
                .parse()
                .map_err(|_| DateError::Unexpected(slice.to_string()))?;
            Ok(Component {
                value,
                digits: slice.len(),
            })
        }
        Some(_) => Err(DateError::Unexpected(lexer.slice().to_string())),
        None => Err(DateError::Missing(what)),
    }
}

fn separator(lexer: &mut Lexer<Token>) -> Result<Separator, DateError> {
    match lexer.next() {
        Some(Ok(Token::Dash)) => Ok(Separator::Dash),
        Some(Ok(Token::Slash)) => Ok(Separator::Slash),
        Some(Ok(Token::Dot)) => Ok(Separator::Dot),
        Some(_) => Err(DateError::Unexpected(lexer.slice().to_string())),
        None => Err(DateError::Missing("date separator")),
    }
}

/// Accepts `[T]HH:MM[:SS]` or nothing at all.
fn skip_time_of_day(lexer: &mut Lexer<Token>) -> Result<(), DateError> {
    match lexer.next() {
        None => return Ok(()),
        Some(Ok(Token::TimeMarker)) => {
            component(lexer, "hour")?;
        }
        Some(Ok(Token::Number)) => (),
        Some(_) => return Err(DateError::Unexpected(lexer.slice().to_string())),
    }

    match lexer.next() {
        Some(Ok(Token::Colon)) => (),
        Some(_) => return Err(DateError::Unexpected(lexer.slice().to_string())),
        None => return Err(DateError::Missing("minutes")),
    }
    component(lexer, "minutes")?;

    match lexer.next() {
        None => Ok(()),
        Some(Ok(Token::Colon)) => {
            component(lexer, "seconds")?;
            match lexer.next() {
                None => Ok(()),
                Some(_) => Err(DateError::Unexpected(lexer.slice().to_string())),
            }
        }
        Some(_) => Err(DateError::Unexpected(lexer.slice().to_string())),
    }
}

fn build(year: u32, month: u32, day: u32) -> Result<Date, DateError> {
    let month = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or(DateError::BadMonth(month))?;
    let day = u8::try_from(day).map_err(|_| DateError::BadDay(day))?;
    // four digits at most, always fits
    let year = year as i32;

    Ok(Date::from_calendar_date(year, month, day)?)
}
