use lazy_static::lazy_static;
use std::collections::HashMap;

pub struct Language {
    pub tag: &'static str,
    pub months_long: [&'static str; 12],
    pub months_short: [&'static str; 12],
    pub days_long: [&'static str; 7],
    pub days_short: [&'static str; 7],
}

/// Supported languages. Earlier entries win when a name exists in several.
pub const LANGUAGES: [Language; 5] = [
    Language {
        tag: "en_US",
        months_long: [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ],
        months_short: [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ],
        days_long: [
            "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
        ],
        days_short: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    },
    Language {
        tag: "de_DE",
        months_long: [
            "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
            "Oktober", "November", "Dezember",
        ],
        months_short: [
            "Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez",
        ],
        days_long: [
            "Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag", "Sonntag",
        ],
        days_short: ["Mo", "Di", "Mi", "Do", "Fr", "Sa", "So"],
    },
    Language {
        tag: "fr_FR",
        months_long: [
            "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août",
            "septembre", "octobre", "novembre", "décembre",
        ],
        months_short: [
            "janv", "févr", "mars", "avr", "mai", "juin", "juil", "août", "sept", "oct", "nov",
            "déc",
        ],
        days_long: [
            "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
        ],
        days_short: ["lun", "mar", "mer", "jeu", "ven", "sam", "dim"],
    },
    Language {
        tag: "it_IT",
        months_long: [
            "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio", "agosto",
            "settembre", "ottobre", "novembre", "dicembre",
        ],
        months_short: [
            "gen", "feb", "mar", "apr", "mag", "giu", "lug", "ago", "set", "ott", "nov", "dic",
        ],
        days_long: [
            "lunedì", "martedì", "mercoledì", "giovedì", "venerdì", "sabato", "domenica",
        ],
        days_short: ["lun", "mar", "mer", "gio", "ven", "sab", "dom"],
    },
    Language {
        tag: "nl_NL",
        months_long: [
            "januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus",
            "september", "oktober", "november", "december",
        ],
        months_short: [
            "jan", "feb", "mrt", "apr", "mei", "jun", "jul", "aug", "sep", "okt", "nov", "dec",
        ],
        days_long: [
            "maandag", "dinsdag", "woensdag", "donderdag", "vrijdag", "zaterdag", "zondag",
        ],
        days_short: ["ma", "di", "wo", "do", "vr", "za", "zo"],
    },
];

/// What a name stands for. The order is the preference order when a word
/// matches more than one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameKind {
    MonthLong,
    MonthShort,
    DayLong,
    DayShort,
}

impl NameKind {
    pub fn layout(&self) -> &'static str {
        match self {
            NameKind::MonthLong => "January",
            NameKind::MonthShort => "Jan",
            NameKind::DayLong => "Monday",
            NameKind::DayShort => "Mon",
        }
    }

    pub fn is_month(&self) -> bool {
        matches!(self, NameKind::MonthLong | NameKind::MonthShort)
    }
}

lazy_static! {
    static ref NAMES: HashMap<String, Vec<(usize, NameKind)>> = {
        let mut names: HashMap<String, Vec<(usize, NameKind)>> = HashMap::new();
        for (i, lang) in LANGUAGES.iter().enumerate() {
            let tables: [(&[&str], NameKind); 4] = [
                (&lang.months_long, NameKind::MonthLong),
                (&lang.months_short, NameKind::MonthShort),
                (&lang.days_long, NameKind::DayLong),
                (&lang.days_short, NameKind::DayShort),
            ];
            for (table, kind) in tables {
                for name in table {
                    let entry = names.entry(normalize(name)).or_default();
                    if !entry.contains(&(i, kind)) {
                        entry.push((i, kind));
                    }
                }
            }
        }
        names
    };
}

fn normalize(word: &str) -> String {
    word.trim().trim_end_matches('.').to_lowercase()
}

/// Every `(language index, kind)` the word is a name of, case-insensitive.
pub fn lookup(word: &str) -> &'static [(usize, NameKind)] {
    NAMES
        .get(&normalize(word))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("March"), &[(0, NameKind::MonthLong)]);
        assert_eq!(lookup("märz"), &[(1, NameKind::MonthLong)]);
        assert_eq!(
            lookup("May"),
            &[(0, NameKind::MonthLong), (0, NameKind::MonthShort)]
        );
        assert_eq!(lookup("Di."), &[(1, NameKind::DayShort), (4, NameKind::DayShort)]);
        assert!(lookup("Uhr").is_empty());
    }
}
