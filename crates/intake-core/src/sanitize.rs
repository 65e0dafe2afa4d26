//! Sanitization of untrusted display data

/// Escape a string for inclusion in HTML text or a quoted attribute/header value.
///
/// Escapes `& < > " '`. Control characters are dropped first so the result is
/// also safe inside a quoted `Content-Disposition` file name.
pub fn escape_html(input: &str) -> String {
    let printable: String = input.chars().filter(|c| !c.is_control()).collect();
    html_escape::encode_quoted_attribute(&printable).into_owned()
}
