//! Query string and Accept header parsing.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Bytes escaped inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent decode a query component, treating `+` as a space.
pub fn percent_decode(s: &str) -> String {
    let replaced;
    let input = if s.contains('+') {
        replaced = s.replace('+', " ");
        replaced.as_str()
    } else {
        s
    };

    if input.contains('%') {
        percent_encoding::percent_decode_str(input)
            .decode_utf8_lossy()
            .into_owned()
    } else {
        input.to_string()
    }
}

/// Percent decode a path segment; `+` is kept as is.
pub fn percent_decode_path(s: &str) -> Cow<'_, str> {
    percent_encoding::percent_decode_str(s).decode_utf8_lossy()
}

/// Percent encode a value for use as one path segment.
pub fn encode_path_segment(s: &str) -> Cow<'_, str> {
    utf8_percent_encode(s, PATH_SEGMENT).into()
}

/// Percent encode a catch-all path value, keeping its `/` separators.
pub fn encode_path(s: &str) -> String {
    s.split('/')
        .map(encode_path_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse a query string (or urlencoded form body) into ordered key/value pairs.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity((query.matches('&').count() + 1).min(16));

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = match pair.find('=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, ""),
        };

        if !key.is_empty() {
            params.push((percent_decode(key), percent_decode(value)));
        }
    }

    params
}

/// One entry of an Accept header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub kind: String,
    pub subtype: String,
    pub quality: f32,
    position: usize,
}

impl MediaRange {
    /// Does this range accept the concrete `type/subtype` mime?
    pub fn matches(&self, mime: &str) -> bool {
        let (kind, subtype) = split_mime(mime);
        (self.kind == "*" || self.kind.eq_ignore_ascii_case(kind))
            && (self.subtype == "*" || self.subtype.eq_ignore_ascii_case(subtype))
    }

    fn specificity(&self) -> u8 {
        match (self.kind.as_str(), self.subtype.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ => 2,
        }
    }
}

fn split_mime(mime: &str) -> (&str, &str) {
    let mime = mime.split(';').next().unwrap_or("").trim();
    match mime.find('/') {
        Some(pos) => (&mime[..pos], &mime[pos + 1..]),
        None => (mime, "*"),
    }
}

/// Parse an Accept header, ordered by quality, then specificity, then position.
///
/// Ranges with `q=0` are dropped.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .enumerate()
        .filter_map(|(position, part)| {
            let mut pieces = part.split(';');
            let mime = pieces.next()?.trim();
            if mime.is_empty() {
                return None;
            }
            let (kind, subtype) = split_mime(mime);
            let quality = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some(MediaRange {
                kind: kind.to_string(),
                subtype: subtype.to_string(),
                quality,
                position,
            })
        })
        .filter(|r| r.quality > 0.0)
        .collect();

    ranges.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.specificity().cmp(&a.specificity()))
            .then_with(|| a.position.cmp(&b.position))
    });
    ranges
}
