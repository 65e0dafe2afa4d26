//! Content-Disposition header parsing for multipart parts
//!
//! Handles the subset of RFC 6266 / RFC 7578 that form submissions use:
//! a disposition type followed by `;`-separated parameters whose values are
//! tokens or quoted strings, plus the RFC 5987 extended `filename*` form.

use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Lowercased disposition type, e.g. `form-data`
    pub disposition_type: String,
    pub name: Option<String>,
    /// `filename*` when present and decodable, else `filename`
    pub file_name: Option<String>,
}

impl ContentDisposition {
    /// Parse a raw header value. Returns `None` when there is no disposition type.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments = split_unquoted(raw, ';').into_iter();
        let disposition_type = segments.next()?.trim().to_ascii_lowercase();
        if disposition_type.is_empty() || disposition_type.contains('=') {
            return None;
        }

        let mut name = None;
        let mut file_name = None;
        let mut file_name_ext = None;

        for segment in segments {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            match key.as_str() {
                "name" => name = Some(unquote(value)),
                "filename" => file_name = Some(unquote(value)),
                "filename*" => file_name_ext = decode_ext_value(value),
                _ => {}
            }
        }

        Some(Self {
            disposition_type,
            name,
            file_name: file_name_ext.or(file_name),
        })
    }

    pub fn is_form_data(&self) -> bool {
        self.disposition_type == "form-data"
    }

    /// The declared file name, if present and not blank.
    pub fn declared_file_name(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// Split on `sep` outside of quoted strings.
fn split_unquoted(raw: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&raw[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode `charset'lang'percent-encoded`. Only UTF-8 (and its ASCII subset) is accepted.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut pieces = value.splitn(3, '\'');
    let charset = pieces.next()?.trim();
    let _language = pieces.next()?;
    let encoded = pieces.next()?;

    if !(charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("us-ascii")) {
        return None;
    }

    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}
