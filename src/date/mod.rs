//! Date layout inference.
//!
//! Layouts use the reference-time notation of the scraper that consumes the
//! generated config: `2` day, `1` month, `January`/`Jan` month names,
//! `Monday`/`Mon` weekday names, `2006`/`06` year, `15` or `3` hour, `04`
//! minute, `05` second, `PM` meridiem. Everything else in a layout is a
//! literal.

pub mod lang;

use itertools::Itertools;
use lang::{NameKind, LANGUAGES};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

pub const UNKNOWN_LAYOUT: &str = "unknown";
const HOUR_MARKERS: [&str; 3] = ["uhr", "h", "heures"];

/// Which parts of a date a component covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveredDateParts {
    #[serde(default)]
    pub day: bool,
    #[serde(default)]
    pub month: bool,
    #[serde(default)]
    pub year: bool,
    #[serde(default)]
    pub time: bool,
}

impl CoveredDateParts {
    /// Parses a dash separated list such as `day-month-year`.
    pub fn from_parts(parts: &str) -> Self {
        let parts: Vec<&str> = parts.split('-').map(str::trim).collect();
        CoveredDateParts {
            day: parts.contains(&"day"),
            month: parts.contains(&"month"),
            year: parts.contains(&"year"),
            time: parts.contains(&"time"),
        }
    }

    fn is_empty(&self) -> bool {
        *self == CoveredDateParts::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pub layout: String,
    pub language: Option<&'static str>,
}

impl DateFormat {
    fn new<S: Into<String>>(layout: S, language: Option<&'static str>) -> Self {
        DateFormat {
            layout: layout.into(),
            language,
        }
    }

    pub fn unknown() -> Self {
        DateFormat::new(UNKNOWN_LAYOUT, None)
    }

    pub fn is_unknown(&self) -> bool {
        self.layout == UNKNOWN_LAYOUT
    }

    /// Infers the layout that parses every example. Returns
    /// [`DateFormat::unknown`] when the examples can't be explained.
    pub fn infer<S: AsRef<str>>(examples: &[S], covers: CoveredDateParts) -> Self {
        let examples: Vec<&str> = examples
            .iter()
            .map(|e| e.as_ref().trim())
            .filter(|e| !e.is_empty())
            .collect();
        if examples.is_empty() || covers.is_empty() {
            return DateFormat::unknown();
        }

        let day_only = CoveredDateParts {
            day: true,
            ..Default::default()
        };
        let month_only = CoveredDateParts {
            month: true,
            ..Default::default()
        };

        let format = if covers == day_only {
            Some(DateFormat::new("2", None))
        } else if covers == month_only {
            month_names(&examples)
        } else {
            literal_layout(&examples, covers)
        };
        format.unwrap_or_else(DateFormat::unknown)
    }
}

/// Majority vote over the month names in `examples`.
fn month_names(examples: &[&str]) -> Option<DateFormat> {
    if examples.iter().all(|e| e.chars().all(|c| c.is_ascii_digit())) {
        return Some(DateFormat::new("1", None));
    }

    let mut votes: HashMap<(usize, NameKind), usize> = HashMap::new();
    for example in examples {
        for vote in lang::lookup(example).iter().filter(|(_, kind)| kind.is_month()) {
            *votes.entry(*vote).or_default() += 1;
        }
    }

    votes
        .into_iter()
        .max_by_key(|((lang, kind), count)| (*count, Reverse(*lang), Reverse(*kind)))
        .map(|((lang, kind), _)| DateFormat::new(kind.layout(), Some(LANGUAGES[lang].tag)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Digits,
    Letters,
    Other,
}

fn run_of(c: char) -> Run {
    if c.is_ascii_digit() {
        Run::Digits
    } else if c.is_alphabetic() {
        Run::Letters
    } else {
        Run::Other
    }
}

/// Cuts `s` into maximal runs of digits, letters and everything else.
fn split_runs(s: &str) -> Vec<(Run, &str)> {
    let mut runs = vec![];
    let mut start = 0;
    let mut current: Option<Run> = None;
    for (i, c) in s.char_indices() {
        let run = run_of(c);
        match current {
            Some(prev) if prev == run => {}
            Some(prev) => {
                runs.push((prev, &s[start..i]));
                start = i;
                current = Some(run);
            }
            None => current = Some(run),
        }
    }
    if let Some(run) = current {
        runs.push((run, &s[start..]));
    }
    runs
}

/// Index of the `Uhr`/`h` run marking the digits at `d` as an hour.
fn hour_marker(shape: &[Run], columns: &[Vec<&str>], d: usize) -> Option<usize> {
    let next = match shape.get(d + 1) {
        Some(Run::Other) if columns[d + 1][0].trim().is_empty() => d + 2,
        _ => d + 1,
    };
    let marker = shape.get(next) == Some(&Run::Letters)
        && HOUR_MARKERS.contains(&columns[next][0].to_lowercase().as_str());
    marker.then_some(next)
}

fn max_value(column: &[&str]) -> u32 {
    column.iter().filter_map(|v| v.parse().ok()).max().unwrap_or(0)
}

/// Matches all examples run by run: runs identical in every example stay
/// literal, runs that vary must be explained as a date part.
fn literal_layout(examples: &[&str], covers: CoveredDateParts) -> Option<DateFormat> {
    let split: Vec<Vec<(Run, &str)>> = examples.iter().map(|e| split_runs(e)).collect();
    let shape: Vec<Run> = split[0].iter().map(|(run, _)| *run).collect();
    if split
        .iter()
        .any(|runs| !runs.iter().map(|(run, _)| *run).eq(shape.iter().copied()))
    {
        return None;
    }

    let columns: Vec<Vec<&str>> = (0..shape.len())
        .map(|i| split.iter().map(|runs| runs[i].1).collect())
        .collect();
    let mut tokens: Vec<Option<String>> = vec![None; shape.len()];
    let is_colon = |i: usize| shape.get(i) == Some(&Run::Other) && columns[i][0] == ":";

    for (i, run) in shape.iter().enumerate() {
        if *run == Run::Other {
            if !columns[i].iter().all_equal() {
                return None;
            }
            tokens[i] = Some(columns[i][0].to_string());
        }
    }

    // Letters: meridiem, month and weekday names, literals.
    let mut meridiem = false;
    let mut names: Vec<(usize, Vec<(usize, NameKind)>)> = vec![];
    for (i, run) in shape.iter().enumerate() {
        if *run != Run::Letters {
            continue;
        }
        let column = &columns[i];
        if column
            .iter()
            .all(|w| matches!(w.to_lowercase().as_str(), "am" | "pm"))
        {
            let lowercase = column[0].chars().all(char::is_lowercase);
            tokens[i] = Some(if lowercase { "pm" } else { "PM" }.to_string());
            meridiem = true;
            continue;
        }

        let common: Vec<(usize, NameKind)> = lang::lookup(column[0])
            .iter()
            .filter(|candidate| column.iter().all(|w| lang::lookup(w).contains(candidate)))
            .copied()
            .collect();
        let is_name = common
            .iter()
            .any(|(_, kind)| !kind.is_month() || covers.month);
        if is_name {
            names.push((i, common));
        } else if column.iter().all_equal() {
            tokens[i] = Some(column[0].to_string());
        } else {
            return None;
        }
    }

    let language = if names.is_empty() {
        None
    } else {
        Some((0..LANGUAGES.len()).find(|l| {
            names
                .iter()
                .all(|(_, common)| common.iter().any(|(lang, _)| lang == l))
        })?)
    };

    let mut month = false;
    for (i, common) in names {
        let kinds: Vec<NameKind> = common
            .iter()
            .filter(|(lang, _)| Some(*lang) == language)
            .map(|(_, kind)| *kind)
            .sorted()
            .collect();
        let kind = kinds
            .iter()
            .find(|k| k.is_month() && covers.month && !month)
            .or_else(|| kinds.iter().find(|k| !k.is_month()))?;
        month |= kind.is_month();
        tokens[i] = Some(kind.layout().to_string());
    }

    // Digits: clock time, four digit year, then day and month.
    let hour = if meridiem { "3" } else { "15" };
    let digits: Vec<usize> = (0..shape.len())
        .filter(|i| shape[*i] == Run::Digits)
        .collect();
    let mut time = false;
    for &d in &digits {
        if is_colon(d + 1) && shape.get(d + 2) == Some(&Run::Digits) {
            tokens[d] = Some(hour.to_string());
            tokens[d + 2] = Some("04".to_string());
            if is_colon(d + 3) && shape.get(d + 4) == Some(&Run::Digits) {
                tokens[d + 4] = Some("05".to_string());
            }
            time = true;
            break;
        }
    }
    if covers.time && !time {
        if let Some((d, marker)) = digits
            .iter()
            .find_map(|d| hour_marker(&shape, &columns, *d).map(|m| (*d, m)))
        {
            // `19.30 Uhr`: the run before the marker holds the minutes.
            let dotted = d >= 2
                && shape[d - 2] == Run::Digits
                && tokens[d - 2].is_none()
                && columns[d - 1][0] == ".";
            if dotted {
                tokens[d - 2] = Some(hour.to_string());
                tokens[d] = Some("04".to_string());
            } else {
                tokens[d] = Some(hour.to_string());
                if shape.get(marker + 1) == Some(&Run::Digits) {
                    tokens[marker + 1] = Some("04".to_string());
                }
            }
            time = true;
        }
    }

    let mut year = None;
    if let Some(&d) = digits
        .iter()
        .find(|d| tokens[**d].is_none() && columns[**d].iter().all(|v| v.len() == 4))
    {
        tokens[d] = Some("2006".to_string());
        year = Some(d);
    }

    let mut rest = digits
        .iter()
        .copied()
        .filter(|d| tokens[*d].is_none())
        .collect::<Vec<_>>()
        .into_iter();
    let numeric_month = covers.month && !month;
    let mut day = false;
    if covers.day && numeric_month {
        let (a, b) = (rest.next()?, rest.next()?);
        let (max_a, max_b) = (max_value(&columns[a]), max_value(&columns[b]));
        let month_first = if max_a > 12 || max_b > 12 {
            max_a <= 12
        } else {
            year.map_or(false, |y| y < a)
        };
        let (d, m) = if month_first { (b, a) } else { (a, b) };
        tokens[d] = Some("2".to_string());
        tokens[m] = Some("1".to_string());
        day = true;
        month = true;
    } else if covers.day {
        tokens[rest.next()?] = Some("2".to_string());
        day = true;
    } else if numeric_month {
        tokens[rest.next()?] = Some("1".to_string());
        month = true;
    }
    if covers.year && year.is_none() {
        if let Some(d) = rest.next() {
            tokens[d] = Some("06".to_string());
            year = Some(d);
        }
    }
    if covers.time && !time {
        if let Some(d) = rest.next() {
            tokens[d] = Some(hour.to_string());
            time = true;
        }
    }
    for d in rest {
        if !columns[d].iter().all_equal() {
            return None;
        }
        tokens[d] = Some(columns[d][0].to_string());
    }

    let missing = (covers.day && !day)
        || (covers.month && !month)
        || (covers.year && year.is_none())
        || (covers.time && !time);
    if missing {
        return None;
    }

    let layout = tokens.into_iter().collect::<Option<String>>()?;
    Some(DateFormat::new(
        layout,
        language.map(|l| LANGUAGES[l].tag),
    ))
}
