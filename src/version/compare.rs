//! Dotted version comparison.
//!
//! Versions are split into segments on `.`, `-`, `_` and `+`, and at every
//! boundary between digits and letters. Numeric segments compare by value.
//! Textual segments rank `dev < alpha/a < beta/b < RC/rc < <number> < pl/p`;
//! any other word ranks below `dev`. When one version runs out of segments,
//! a numeric remainder makes the other one newer, while a textual remainder
//! is ranked against a plain number (so `1.0rc1 < 1.0 < 1.0-p1`).

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(u64),
    Word(i8),
}

const NUMBER_RANK: i8 = 4;

fn word_rank(word: &str) -> i8 {
    match word.to_lowercase().as_str() {
        "dev" => 0,
        "alpha" | "a" => 1,
        "beta" | "b" => 2,
        "rc" => 3,
        "#" => NUMBER_RANK,
        "pl" | "p" | "patch" => 5,
        _ => -6,
    }
}

fn flush(current: &mut String, is_digit: bool, out: &mut Vec<Segment>) {
    if current.is_empty() {
        return;
    }
    let segment = if is_digit {
        Segment::Number(current.parse().unwrap_or(u64::MAX))
    } else {
        Segment::Word(word_rank(current))
    };
    out.push(segment);
    current.clear();
}

fn segments(version: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for c in version.trim().chars() {
        if matches!(c, '.' | '-' | '_' | '+') {
            flush(&mut current, current_is_digit, &mut out);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut current, current_is_digit, &mut out);
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    flush(&mut current, current_is_digit, &mut out);
    out
}

fn compare_segment(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Number(x), Segment::Number(y)) => x.cmp(y),
        (Segment::Number(_), Segment::Word(w)) => NUMBER_RANK.cmp(w),
        (Segment::Word(w), Segment::Number(_)) => w.cmp(&NUMBER_RANK),
        (Segment::Word(x), Segment::Word(y)) => x.cmp(y),
    }
}

/// Compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for (x, y) in left.iter().zip(right.iter()) {
        match compare_segment(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    match left.len().cmp(&right.len()) {
        Ordering::Equal => Ordering::Equal,
        Ordering::Greater => match &left[right.len()] {
            Segment::Number(_) => Ordering::Greater,
            Segment::Word(w) => w.cmp(&NUMBER_RANK),
        },
        Ordering::Less => match &right[left.len()] {
            Segment::Number(_) => Ordering::Less,
            Segment::Word(w) => NUMBER_RANK.cmp(w),
        },
    }
}
