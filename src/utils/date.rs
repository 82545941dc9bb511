// Calendar date helpers for deadline extraction
//
// Submissions come from a Spanish-speaking community, so numeric dates are
// read day-first unless that is impossible, and month names are recognised
// in both English and Spanish.

use chrono::{Datelike, NaiveDate};

/// Look up a month by English or Spanish name or abbreviation
pub fn month_from_name(name: &str) -> Option<u32> {
    let name = name.trim_end_matches('.').to_lowercase();
    let month = match name.as_str() {
        "jan" | "january" | "ene" | "enero" => 1,
        "feb" | "february" | "febrero" => 2,
        "mar" | "march" | "marzo" => 3,
        "apr" | "april" | "abr" | "abril" => 4,
        "may" | "mayo" => 5,
        "jun" | "june" | "junio" => 6,
        "jul" | "july" | "julio" => 7,
        "aug" | "august" | "ago" | "agosto" => 8,
        "sep" | "sept" | "september" | "septiembre" | "setiembre" => 9,
        "oct" | "october" | "octubre" => 10,
        "nov" | "november" | "noviembre" => 11,
        "dec" | "december" | "dic" | "diciembre" => 12,
        _ => return None,
    };
    Some(month)
}

/// Build a date from numeric parts written as `a/b[/year]`
///
/// Day-first is assumed; month-first is used only when `b` cannot be a month.
pub fn date_from_numeric(a: u32, b: u32, year: Option<i32>, reference: NaiveDate) -> Option<NaiveDate> {
    let year = year.map(expand_year).unwrap_or_else(|| reference.year());
    let (day, month) = if b > 12 && a <= 12 { (b, a) } else { (a, b) };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Turn a two-digit year into a four-digit one
pub fn expand_year(year: i32) -> i32 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

/// Move a deadline into the future relative to `reference`
///
/// Requesters often type last year's number in January, or omit the year
/// entirely. A date in a past year is moved to the reference year, and a
/// date that has already passed this year rolls over to next year. Dates
/// after the reference are kept.
pub fn normalize_deadline(date: NaiveDate, reference: NaiveDate) -> NaiveDate {
    if date >= reference {
        return date;
    }
    let this_year = with_year_clamped(date, reference.year());
    if this_year >= reference {
        this_year
    } else {
        with_year_clamped(date, reference.year() + 1)
    }
}

// Feb 29 falls back to Feb 28 in non-leap years
fn with_year_clamped(date: NaiveDate, year: i32) -> NaiveDate {
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day() - 1))
        .unwrap_or(date)
}
