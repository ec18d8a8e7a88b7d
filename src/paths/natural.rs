//! Natural ordering of strings
//!
//! Strings are split into alternating runs of digits and non-digits. Runs are
//! compared positionally: digit runs by numeric value, text runs lexicographically,
//! so `file2` sorts before `file10`.

use std::cmp::Ordering;

/// One run of a string as seen by the natural comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

impl<'a> Run<'a> {
    fn cmp_run(&self, other: &Run<'a>) -> Ordering {
        match (self, other) {
            (Run::Digits(a), Run::Digits(b)) => cmp_numeric(a, b),
            (Run::Text(a), Run::Text(b)) => a.cmp(b),
            // Numbers sort ahead of text at the same position
            (Run::Digits(_), Run::Text(_)) => Ordering::Less,
            (Run::Text(_), Run::Digits(_)) => Ordering::Greater,
        }
    }
}

/// Iterator over the digit/non-digit runs of a string
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map_or(self.rest.len(), |(i, _)| i);

        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits { Run::Digits(run) } else { Run::Text(run) })
    }
}

fn runs(s: &str) -> Runs<'_> {
    Runs { rest: s }
}

/// Compare two ASCII digit strings by value, without parsing into a bounded integer
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare two strings in natural order
///
/// Strings whose runs all compare equal (for example `img01` and `img1`) are
/// reported as equal, so a stable sort keeps their input order.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = runs(a);
    let mut right = runs(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match x.cmp_run(&y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// Stable in-place natural sort
pub fn natural_sort<S: AsRef<str>>(items: &mut [S]) {
    items.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

/// Natural sort returning a new vector
#[must_use]
pub fn natsorted<S: AsRef<str>>(mut items: Vec<S>) -> Vec<S> {
    natural_sort(&mut items);
    items
}
