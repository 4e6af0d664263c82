use super::boundary::{Boundary, find_boundary};
use super::types::{EmailRecord, EmailSpan};

/// Lazily cuts an archive into email records.
///
/// Each record runs from its boundary to the start of the next boundary, or
/// to the end of the text for the last one. A delimiter that fails the
/// boundary grammar is not a cut point, so that email stays inside the
/// previous record.
pub struct Segmenter<'a> {
    text: &'a str,
    /// Boundary opening the next record to emit
    pending: Option<Boundary>,
    started: bool,
    from: usize,
}

impl<'a> Segmenter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::starting_at(text, 0)
    }

    /// Resume segmentation from an offset, e.g. the start of a record that was
    /// emitted earlier.
    pub fn starting_at(text: &'a str, from: usize) -> Self {
        Self {
            text,
            pending: None,
            started: false,
            from,
        }
    }

    /// Text before the first boundary (pipermail archives usually have none).
    pub fn preamble(text: &str) -> &str {
        match find_boundary(text, 0) {
            Some(b) => &text[..b.start],
            None => text,
        }
    }
}

impl<'a> Iterator for Segmenter<'a> {
    type Item = EmailRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = if self.started {
            self.pending.take()?
        } else {
            self.started = true;
            find_boundary(self.text, self.from)?
        };

        let end = match find_boundary(self.text, current.end) {
            Some(next) => {
                self.pending = Some(next);
                next.start
            }
            None => self.text.len(),
        };

        let span = EmailSpan {
            start: current.start,
            end,
        };
        Some(EmailRecord {
            span,
            text: &self.text[span.range()],
        })
    }
}

/// Collect every record of an archive eagerly.
pub fn segment(text: &str) -> Vec<EmailRecord<'_>> {
    Segmenter::new(text).collect()
}
