//! Address grammar: `segment ('.' segment)*`.
//!
//! A segment is an opaque name (directory, file stem, object key or numeric
//! sequence index — interpreted by whatever the cursor is pointing at) or a
//! range token `[start:end]` selecting an end-exclusive slice of a sequence.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Range {
        start: Option<usize>,
        end: Option<usize>,
    },
}

impl Segment {
    /// The raw key text, if this segment is a plain key.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k.as_str()),
            Segment::Range { .. } => None,
        }
    }

    /// Parse the key as a sequence index.
    pub fn as_index(&self) -> Option<usize> {
        self.as_key().and_then(|k| k.parse().ok())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Range { start, end } => {
                let fmt_bound = |b: &Option<usize>| b.map(|n| n.to_string()).unwrap_or_default();
                write!(f, "[{}:{}]", fmt_bound(start), fmt_bound(end))
            }
        }
    }
}

/// Split a dot-path into segments. Empty tokens are discarded, so leading,
/// trailing and doubled dots are tolerated no-ops.
pub fn parse_path(path: &str) -> Vec<Segment> {
    path.split('.')
        .filter(|token| !token.is_empty())
        .map(parse_segment)
        .collect()
}

fn parse_segment(token: &str) -> Segment {
    if let Some(inner) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        if let Some((start, end)) = inner.split_once(':') {
            let parse_bound = |b: &str| {
                if b.is_empty() {
                    Ok(None)
                } else {
                    b.parse::<usize>().map(Some)
                }
            };
            if let (Ok(start), Ok(end)) = (parse_bound(start), parse_bound(end)) {
                return Segment::Range { start, end };
            }
        }
    }

    Segment::Key(token.to_string())
}
