use std::fmt;
use std::ops::Range;

/// Calendar month names, as used in archive file names and thread keys.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month (1 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(u8);

impl Month {
    pub fn new(number: u8) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self(number))
    }

    /// All twelve months in calendar order
    pub fn all() -> impl Iterator<Item = Month> {
        (1..=12).map(Month)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        MONTH_NAMES
            .iter()
            .position(|m| *m == name)
            .map(|i| Month(i as u8 + 1))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[usize::from(self.0 - 1)]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-open byte range of one email inside an archive, delimiter line included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailSpan {
    pub start: usize,
    pub end: usize,
}

impl EmailSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// One email's raw text, borrowed from the archive it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailRecord<'a> {
    pub span: EmailSpan,
    pub text: &'a str,
}

/// Header fields pulled out of a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailHeaders {
    /// `user@domain`, rewritten from the `user at domain` delimiter line
    pub sender: Option<String>,
    /// First `Message-ID: <...>` value, trimmed
    pub message_id: Option<String>,
    /// First `References: <...>` value, trimmed; absent for thread starters
    pub reference: Option<String>,
}

impl EmailHeaders {
    pub fn is_reply(&self) -> bool {
        self.reference.is_some()
    }
}

/// Groups the messages of one conversation within an archive unit.
///
/// Replies are keyed by the identifier they reference, thread starters by
/// their own identifier. Rendered as `year/MonthName/identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadKey {
    pub year: u16,
    pub month: Month,
    pub message_id: String,
}

impl ThreadKey {
    pub fn new(year: u16, month: Month, message_id: impl Into<String>) -> Self {
        Self {
            year,
            month,
            message_id: message_id.into(),
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.month, self.message_id)
    }
}
