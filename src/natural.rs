//! Natural string ordering for chapter and page names.
//!
//! Plain lexicographic sorting puts `page10.jpg` before `page2.jpg`, which is
//! never what a reader wants. This module provides a pure comparator where
//! embedded digit runs compare by numeric value and letter case is ignored:
//!
//! ```text
//! page1.jpg < page2.jpg < page10.jpg
//! Ch1 < ch2 < CH10
//! ```
//!
//! The comparator does no I/O and holds no state, so the listers in [`crate::scan`]
//! can share it and tests can exercise it in isolation.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two strings naturally: case-insensitive, with digit runs compared
/// by numeric value rather than character by character.
///
/// The ordering is total and deterministic. Strings that are equal under the
/// case-insensitive numeric comparison (`page01` vs `page1`, `A` vs `a`) are
/// tie-broken by plain byte order, so no two distinct strings compare equal.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();

    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let run_a = take_digit_run(&mut ca);
                    let run_b = take_digit_run(&mut cb);
                    match cmp_digit_runs(&run_a, &run_b) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }

                // Case-insensitive char comparison. A char may lowercase to
                // multiple chars (e.g. 'İ'), so compare the iterators.
                match x.to_lowercase().cmp(y.to_lowercase()) {
                    Ordering::Equal => {
                        ca.next();
                        cb.next();
                    }
                    other => return other,
                }
            }
        }
    }
}

/// Consume a maximal run of ASCII digits from the iterator.
fn take_digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare two digit runs by numeric value without parsing them into a fixed
/// width integer, so arbitrarily long runs cannot overflow: strip leading
/// zeros, then a longer run is larger, then compare digits lexically.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
