// Deadline pillar: a date, a relative time expression or a timeframe
//
// Absolute dates are also resolved to a calendar date (normalized so it lies
// on or after the reference date) for downstream scheduling.

use chrono::{Datelike, Duration, NaiveDate};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use crate::utils::date::{date_from_numeric, expand_year, month_from_name, normalize_deadline};

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?|\
    enero|ene|febrero|marzo|abril|abr|mayo|junio|julio|agosto|ago|septiembre|setiembre|octubre|noviembre|diciembre|dic";

fn iso_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("iso date pattern is valid"))
}

fn numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").expect("numeric date pattern is valid")
    })
}

// A bare `d/m` only counts as a date right after a deadline word, so that
// fractions like "1/2 of the icons" or "a 3/4 layout" are not read as dates
fn numeric_cue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)\b(?:due|by|deadline|before|until|on|no\s+later\s+than",
            r"|fecha|para|entrega|entregar|antes|hasta|plazo|límite|limite)\b",
            r"[\s:,\-]*(?:\S+\s+){0,2}$"
        ))
        .expect("numeric date cue pattern is valid")
    })
}

// "14 de febrero", "14th Feb 2026"
fn day_month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:de\s+)?({})\.?(?:\s+(?:de\s+|del\s+)?(\d{{4}}))?\b",
            MONTHS
        ))
        .expect("day-month pattern is valid")
    })
}

// "February 14", "Feb 14th, 2026"
fn month_day_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?",
            MONTHS
        ))
        .expect("month-day pattern is valid")
    })
}

// "in 3 days", "en 2 semanas", "within 10 business days"
fn offset_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:in|within|en|dentro de)\s+(\d{1,3})\s+(?:business\s+|working\s+)?(days?|weeks?|días?|dias?|semanas?)\b")
            .expect("offset pattern is valid")
    })
}

// Timeframes without a resolvable date
fn relative_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)\b(?:",
            r"today|tonight|tomorrow|eod|eow|eom",
            r"|(?:this|next|end\s+of\s+(?:the\s+)?)\s*(?:week|month|quarter|year|sprint)",
            r"|(?:by|on|before|until|next|this)\s+(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)",
            r"|q[1-4](?:\s+\d{4})?",
            r"|in\s+(?:a|one|two|three)\s+(?:days?|weeks?|months?)",
            r"|(?:in|within)\s+\d{1,3}\s+months?",
            r"|hoy|mañana|pasado\s+mañana",
            r"|(?:esta|la\s+próxima|la\s+proxima|próxima|proxima)\s+semana|la\s+semana\s+que\s+viene",
            r"|(?:este|el\s+próximo|el\s+proximo|próximo|proximo)\s+mes",
            r"|fin(?:ales)?\s+de(?:l)?\s+(?:mes|semana|año|trimestre|sprint)",
            r"|(?:para\s+el|antes\s+del|el)\s+(?:lunes|martes|miércoles|miercoles|jueves|viernes|sábado|sabado|domingo)",
            r"|en\s+\d{1,3}\s+meses",
            r")\b"
        ))
        .expect("relative timeframe pattern is valid")
    })
}

/// What the deadline scan found
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeadlineScan {
    /// Some date, expression or timeframe is present
    pub found: bool,
    /// First resolvable date, normalized against the reference date
    pub date: Option<NaiveDate>,
}

/// Scan `text` for deadline information
pub fn scan_deadline(text: &str, reference: NaiveDate) -> DeadlineScan {
    // (position, resolved date) of every date-like match
    let mut candidates: Vec<(usize, Option<NaiveDate>)> = Vec::new();

    for caps in iso_regex().captures_iter(text) {
        let date = match (num::<i32>(&caps, 1), num::<u32>(&caps, 2), num::<u32>(&caps, 3)) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };
        if date.is_some() {
            candidates.push((start(&caps), date));
        }
    }

    for caps in numeric_regex().captures_iter(text) {
        let (Some(a), Some(b)) = (num::<u32>(&caps, 1), num::<u32>(&caps, 2)) else { continue };
        let year = num::<i32>(&caps, 3);
        if year.is_none() && !numeric_cue_regex().is_match(&text[..start(&caps)]) {
            continue;
        }
        if let Some(date) = date_from_numeric(a, b, year, reference) {
            candidates.push((start(&caps), Some(date)));
        }
    }

    for caps in day_month_regex().captures_iter(text) {
        let date = month_from_name(&caps[2]).and_then(|month| {
            let year = num::<i32>(&caps, 3).map(expand_year).unwrap_or_else(|| reference.year());
            NaiveDate::from_ymd_opt(year, month, num::<u32>(&caps, 1)?)
        });
        if date.is_some() {
            candidates.push((start(&caps), date));
        }
    }

    for caps in month_day_regex().captures_iter(text) {
        let date = month_from_name(&caps[1]).and_then(|month| {
            let year = num::<i32>(&caps, 3).map(expand_year).unwrap_or_else(|| reference.year());
            NaiveDate::from_ymd_opt(year, month, num::<u32>(&caps, 2)?)
        });
        if date.is_some() {
            candidates.push((start(&caps), date));
        }
    }

    for caps in offset_regex().captures_iter(text) {
        let Some(amount) = num::<i64>(&caps, 1) else { continue };
        let unit = caps[2].to_lowercase();
        let days = if unit.starts_with("week") || unit.starts_with("semana") { amount * 7 } else { amount };
        candidates.push((start(&caps), reference.checked_add_signed(Duration::days(days))));
    }

    candidates.sort_by_key(|(pos, _)| *pos);
    let date = candidates
        .iter()
        .find_map(|(_, date)| *date)
        .map(|date| normalize_deadline(date, reference));

    let found = !candidates.is_empty() || relative_regex().is_match(text);
    DeadlineScan { found, date }
}

fn num<T: std::str::FromStr>(caps: &Captures, group: usize) -> Option<T> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

fn start(caps: &Captures) -> usize {
    caps.get(0).map(|m| m.start()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_date() {
        let scan = scan_deadline("Deadline: 2026-03-15 at noon", reference());
        assert!(scan.found);
        assert_eq!(scan.date, Some(ymd(2026, 3, 15)));
    }

    #[test]
    fn test_past_year_is_normalized() {
        let scan = scan_deadline("Entrega el 2025-02-14", reference());
        assert_eq!(scan.date, Some(ymd(2026, 2, 14)));
    }

    #[test]
    fn test_numeric_day_first() {
        assert_eq!(scan_deadline("para el 20/03", reference()).date, Some(ymd(2026, 3, 20)));
        assert_eq!(scan_deadline("due 03/20/2026", reference()).date, Some(ymd(2026, 3, 20)));
        assert_eq!(scan_deadline("Deadline: 15/3", reference()).date, Some(ymd(2026, 3, 15)));
        assert_eq!(scan_deadline("send it 20/03/2026 at the latest", reference()).date, Some(ymd(2026, 3, 20)));
    }

    #[test]
    fn test_month_names() {
        assert_eq!(scan_deadline("antes del 14 de febrero", reference()).date, Some(ymd(2026, 2, 14)));
        assert_eq!(scan_deadline("by March 3rd, 2026", reference()).date, Some(ymd(2026, 3, 3)));
        assert_eq!(scan_deadline("Due Jan 5", reference()).date, Some(ymd(2027, 1, 5)));
    }

    #[test]
    fn test_offsets_resolve_from_reference() {
        assert_eq!(scan_deadline("we need it in 3 days", reference()).date, Some(ymd(2026, 2, 13)));
        assert_eq!(scan_deadline("en 2 semanas", reference()).date, Some(ymd(2026, 2, 24)));
    }

    #[test]
    fn test_relative_timeframes_pass_without_date() {
        for text in ["by Friday please", "end of the month", "next sprint", "Q3", "mañana", "la próxima semana", "para el viernes", "EOD"] {
            let scan = scan_deadline(text, reference());
            assert!(scan.found, "expected a timeframe in '{}'", text);
            assert_eq!(scan.date, None, "no calendar date expected for '{}'", text);
        }
    }

    #[test]
    fn test_earliest_mention_wins() {
        let scan = scan_deadline("review on 2026-03-01, launch 2026-04-01", reference());
        assert_eq!(scan.date, Some(ymd(2026, 3, 1)));
    }

    #[test]
    fn test_no_deadline() {
        assert!(!scan_deadline("Whenever you can, no rush", reference()).found);
        assert!(!scan_deadline("Version 2 of the logo", reference()).found);
        assert!(!scan_deadline("", reference()).found);
        assert!(!scan_deadline("Please deliver 1/2 of the icons first", reference()).found);
        assert!(!scan_deadline("Use a 3/4 layout for the hero", reference()).found);
        assert!(!scan_deadline("Ratio 16/9 for the banner", reference()).found);
    }
}
