//! Interval merging for stored sessions
//!
//! Sessions of one application are folded together when they overlap or when the
//! gap between them is within the gap-fill threshold. The earliest session of a
//! group survives and absorbs the others.

use chrono::{Duration, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) id: i64,
    pub(crate) start: NaiveDateTime,
    pub(crate) end: NaiveDateTime,
}

/// Result of folding one run of sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedSpan {
    pub(crate) keep: i64,
    pub(crate) start: NaiveDateTime,
    pub(crate) end: NaiveDateTime,
    pub(crate) absorbed: Vec<i64>,
}

impl MergedSpan {
    fn new(span: Span) -> Self {
        Self {
            keep: span.id,
            start: span.start,
            end: span.end,
            absorbed: Vec::new(),
        }
    }

    fn reaches(&self, span: &Span, gap: Duration) -> bool {
        span.start <= self.end + gap
    }

    fn absorb(&mut self, span: Span) {
        if span.end > self.end {
            self.end = span.end;
        }
        self.absorbed.push(span.id);
    }

    pub(crate) fn changed(&self) -> bool {
        !self.absorbed.is_empty()
    }
}

pub(crate) fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    (a_start < b_end && b_start < a_end) || (a_start == b_start && a_end == b_end)
}

/// Fold spans whose gap to the running group is at most `gap`.
pub(crate) fn merge_with_gap(mut spans: Vec<Span>, gap: Duration) -> Vec<MergedSpan> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));

    let mut merged: Vec<MergedSpan> = Vec::new();
    for span in spans {
        match merged.last_mut() {
            Some(current) if current.reaches(&span, gap) => current.absorb(span),
            _ => merged.push(MergedSpan::new(span)),
        }
    }
    merged
}
