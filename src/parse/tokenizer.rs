//! Quote-aware field splitting for W3C extended log lines

/// Splits a log line into fields
///
/// The line is trimmed and split on single spaces. A space only separates
/// fields when an even number of `"` characters follows it on the line, so a
/// quoted value such as a user agent keeps its inner spaces. Quotes are left
/// in place; [`crate::parse::LogRecord`] strips them per field.
///
/// Consecutive spaces produce empty fields.
///
/// # Examples
///
/// ```
/// use weblog_star::parse::tokenize;
///
/// let fields = tokenize(r#"GET /index.html "Mozilla/5.0 (X11; Linux)" 200"#);
/// assert_eq!(fields, vec!["GET", "/index.html", "\"Mozilla/5.0 (X11; Linux)\"", "200"]);
/// ```
pub fn tokenize(line: &str) -> Vec<&str> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }

    let mut quotes_after = line.bytes().filter(|&b| b == b'"').count();
    let mut fields = Vec::new();
    let mut start = 0;

    for (i, b) in line.bytes().enumerate() {
        match b {
            b'"' => quotes_after -= 1,
            b' ' if quotes_after % 2 == 0 => {
                fields.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);

    fields
}
