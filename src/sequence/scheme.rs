use crate::sequence::{Cursor, Direction, SequenceError, Step};
use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;

fn default_date_format() -> String {
    "%Y%m%d".to_string()
}

fn default_separator() -> String {
    "_".to_string()
}

fn default_ordinal_width() -> usize {
    3
}

/// An addressing scheme for a site's local identifiers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IdScheme {
    /// Zero-padded decimal counter within an inclusive range
    Numeric {
        #[serde(default)]
        prefix: String,

        /// Minimum rendered digit count (0 disables padding)
        #[serde(default)]
        width: usize,

        min: u64,
        max: u64,
    },

    /// Date plus per-date ordinal
    Dated {
        #[serde(default)]
        prefix: String,

        /// chrono format string for the date component
        #[serde(rename = "date-format", default = "default_date_format")]
        date_format: String,

        /// Text between the date and the ordinal
        #[serde(default = "default_separator")]
        separator: String,

        #[serde(rename = "ordinal-width", default = "default_ordinal_width")]
        ordinal_width: usize,

        /// Highest ordinal published on a single date
        #[serde(rename = "max-per-date")]
        max_per_date: u32,

        /// Earliest date that may exist; reverse walks stop here
        earliest: NaiveDate,

        /// Latest date that may exist; forward walks stop here when set
        #[serde(default)]
        latest: Option<NaiveDate>,
    },
}

impl IdScheme {
    /// Short name of the scheme, used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Numeric { .. } => "numeric",
            Self::Dated { .. } => "dated",
        }
    }

    /// Renders a cursor as the site's local identifier
    pub fn render(&self, cursor: &Cursor) -> String {
        match (self, cursor) {
            (Self::Numeric { prefix, width, .. }, Cursor::Numeric(n)) => {
                format!("{}{:0width$}", prefix, n, width = *width)
            }
            (
                Self::Dated {
                    prefix,
                    date_format,
                    separator,
                    ordinal_width,
                    ..
                },
                Cursor::Dated { date, ordinal },
            ) => format!(
                "{}{}{}{:0width$}",
                prefix,
                date.format(date_format),
                separator,
                ordinal,
                width = *ordinal_width
            ),
            // Mismatched cursors never come out of `parse`; render something traceable
            (_, Cursor::Numeric(n)) => n.to_string(),
            (_, Cursor::Dated { date, ordinal }) => format!("{}_{}", date, ordinal),
        }
    }

    /// Parses a local identifier into a cursor
    ///
    /// Returns `None` if the identifier does not follow this scheme's layout.
    /// Range checks are not applied here; see [`IdScheme::contains`].
    pub fn parse(&self, id: &str) -> Option<Cursor> {
        let id = id.trim();
        match self {
            Self::Numeric { prefix, .. } => {
                let digits = strip_prefix_ignore_case(id, prefix)?;
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                digits.parse().ok().map(Cursor::Numeric)
            }
            Self::Dated {
                prefix,
                date_format,
                separator,
                ordinal_width,
                ..
            } => {
                let rest = strip_prefix_ignore_case(id, prefix)?;
                let (date_part, ordinal_part) = if separator.is_empty() {
                    if *ordinal_width == 0 || rest.len() <= *ordinal_width {
                        return None;
                    }
                    let split = rest.len() - ordinal_width;
                    if !rest.is_char_boundary(split) {
                        return None;
                    }
                    rest.split_at(split)
                } else {
                    let idx = rest.rfind(separator.as_str())?;
                    (&rest[..idx], &rest[idx + separator.len()..])
                };

                if ordinal_part.is_empty() || !ordinal_part.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }

                let date = NaiveDate::parse_from_str(date_part, date_format).ok()?;
                let ordinal = ordinal_part.parse().ok()?;
                Some(Cursor::Dated { date, ordinal })
            }
        }
    }

    /// Parses an identifier and checks it lies within the scheme's range
    pub fn parse_strict(&self, id: &str) -> Result<Cursor, SequenceError> {
        let cursor = self.parse(id).ok_or_else(|| SequenceError::Unparseable {
            id: id.to_string(),
            scheme: self.name(),
        })?;

        if !self.contains(&cursor) {
            return Err(SequenceError::OutOfRange(id.to_string()));
        }

        Ok(cursor)
    }

    /// Returns true if the cursor lies inside the configured space
    pub fn contains(&self, cursor: &Cursor) -> bool {
        match (self, cursor) {
            (Self::Numeric { min, max, .. }, Cursor::Numeric(n)) => n >= min && n <= max,
            (
                Self::Dated {
                    max_per_date,
                    earliest,
                    latest,
                    ..
                },
                Cursor::Dated { date, ordinal },
            ) => {
                *ordinal >= 1
                    && ordinal <= max_per_date
                    && date >= earliest
                    && latest.map_or(true, |l| *date <= l)
            }
            _ => false,
        }
    }

    /// Computes the candidate that follows `cursor` in the given direction
    ///
    /// # Rules
    ///
    /// | Scheme | Forward | Reverse |
    /// |--------|---------|---------|
    /// | Numeric | `n + 1`, exhausted past `max` | `n - 1`, exhausted below `min` |
    /// | Dated | ordinal + 1; past `max-per-date` → next day, ordinal 1; exhausted past `latest` | ordinal + 1; past `max-per-date` → previous day, ordinal 1; exhausted before `earliest` |
    pub fn next(&self, cursor: &Cursor, direction: Direction) -> Step {
        match (self, cursor) {
            (Self::Numeric { min, max, .. }, Cursor::Numeric(n)) => {
                let next = match direction {
                    Direction::Forward => n.checked_add(1),
                    Direction::Reverse => n.checked_sub(1),
                };
                match next {
                    Some(next) if next >= *min && next <= *max => Step::Next(Cursor::Numeric(next)),
                    _ => Step::Exhausted,
                }
            }
            (
                Self::Dated {
                    max_per_date,
                    earliest,
                    latest,
                    ..
                },
                Cursor::Dated { date, ordinal },
            ) => {
                if *ordinal < *max_per_date {
                    return Step::Next(Cursor::Dated {
                        date: *date,
                        ordinal: ordinal + 1,
                    });
                }

                let rolled = match direction {
                    Direction::Forward => date.checked_add_days(Days::new(1)),
                    Direction::Reverse => date.checked_sub_days(Days::new(1)),
                };

                match rolled {
                    Some(next) if next < *earliest => Step::Exhausted,
                    Some(next) if latest.is_some_and(|l| next > l) => Step::Exhausted,
                    Some(next) => Step::Next(Cursor::Dated {
                        date: next,
                        ordinal: 1,
                    }),
                    None => Step::Exhausted,
                }
            }
            _ => Step::Exhausted,
        }
    }

    /// Returns true if `cursor` lies past `end` in traversal order
    ///
    /// The end identifier itself is not beyond; it is the last candidate
    /// visited.
    pub fn is_beyond(&self, cursor: &Cursor, end: &Cursor, direction: Direction) -> bool {
        match (traversal_key(cursor, direction), traversal_key(end, direction)) {
            (Some(current), Some(end)) => current > end,
            _ => false,
        }
    }
}

/// Maps a cursor to a key that ascends in traversal order
fn traversal_key(cursor: &Cursor, direction: Direction) -> Option<(i128, i128)> {
    let sign = match direction {
        Direction::Forward => 1,
        Direction::Reverse => -1,
    };

    match cursor {
        Cursor::Numeric(n) => Some((sign * i128::from(*n), 0)),
        // Ordinals ascend within a date in both directions; only days flip
        Cursor::Dated { date, ordinal } => Some((
            sign * i128::from(date.num_days_from_ce()),
            i128::from(*ordinal),
        )),
    }
}

fn strip_prefix_ignore_case<'a>(id: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(id);
    }
    let head = id.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&id[prefix.len()..])
    } else {
        None
    }
}
