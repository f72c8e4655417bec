//! Named access to the fields of one log line

use crate::parse::tokenize;
use chrono::NaiveDate;

/// Minimum number of fields a usable line carries
pub const MIN_FIELDS: usize = 14;

/// One request from an access log
///
/// Field order follows the W3C extended format as written by IIS:
/// `date time s-ip cs-method cs-uri-stem cs-uri-query s-port cs-username
/// c-ip cs(User-Agent) sc-status sc-bytes cs-bytes time-taken`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub date: String,
    pub time: String,
    pub server_ip: String,
    pub method: String,
    pub uri_stem: String,
    pub uri_query: String,
    pub server_port: String,
    pub username: String,
    pub client_ip: String,
    pub user_agent: String,
    pub status: String,
    pub bytes_sent: String,
    pub bytes_received: String,
    pub time_taken: String,
}

impl LogRecord {
    /// Builds a record from tokenized fields
    ///
    /// Returns `None` when fewer than [`MIN_FIELDS`] fields are present.
    /// Fields past the fourteenth are ignored. Surrounding quotes are
    /// stripped from every field.
    pub fn from_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < MIN_FIELDS {
            return None;
        }

        let field = |i: usize| fields[i].trim_matches('"').to_string();

        Some(Self {
            date: field(0),
            time: field(1),
            server_ip: field(2),
            method: field(3),
            uri_stem: field(4),
            uri_query: field(5),
            server_port: field(6),
            username: field(7),
            client_ip: field(8),
            user_agent: field(9),
            status: field(10),
            bytes_sent: field(11),
            bytes_received: field(12),
            time_taken: field(13),
        })
    }

    /// All fields in log order
    pub fn fields(&self) -> [&str; MIN_FIELDS] {
        [
            &self.date,
            &self.time,
            &self.server_ip,
            &self.method,
            &self.uri_stem,
            &self.uri_query,
            &self.server_port,
            &self.username,
            &self.client_ip,
            &self.user_agent,
            &self.status,
            &self.bytes_sent,
            &self.bytes_received,
            &self.time_taken,
        ]
    }

    /// Parses the date column as `YYYY-MM-DD`
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// What a raw line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// `#Software:`, `#Fields:` and other directive lines
    Directive,
    /// Empty or whitespace-only line
    Blank,
    /// Fewer fields than a request needs
    Short { fields: usize },
    /// A usable request
    Record(LogRecord),
}

/// Classifies and parses one raw line
///
/// # Examples
///
/// ```
/// use weblog_star::parse::{parse_line, ParsedLine};
///
/// assert_eq!(parse_line("#Fields: date time"), ParsedLine::Directive);
/// assert_eq!(parse_line("a b c"), ParsedLine::Short { fields: 3 });
/// ```
pub fn parse_line(line: &str) -> ParsedLine {
    if line.starts_with('#') {
        return ParsedLine::Directive;
    }
    if line.trim().is_empty() {
        return ParsedLine::Blank;
    }

    let fields = tokenize(line);
    match LogRecord::from_fields(&fields) {
        Some(record) => ParsedLine::Record(record),
        None => ParsedLine::Short {
            fields: fields.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"2024-03-01 12:00:01 10.0.0.1 GET /index.html q=1 80 - "203.0.113.9" "Mozilla/5.0 (X11; Linux x86_64) Firefox/118.0" 200 5120 312 15"#;

    #[test]
    fn test_parse_full_line() {
        let ParsedLine::Record(record) = parse_line(LINE) else {
            panic!("expected a record");
        };

        assert_eq!(record.date, "2024-03-01");
        assert_eq!(record.time, "12:00:01");
        assert_eq!(record.server_ip, "10.0.0.1");
        assert_eq!(record.method, "GET");
        assert_eq!(record.uri_stem, "/index.html");
        assert_eq!(record.uri_query, "q=1");
        assert_eq!(record.server_port, "80");
        assert_eq!(record.username, "-");
        assert_eq!(record.client_ip, "203.0.113.9");
        assert_eq!(
            record.user_agent,
            "Mozilla/5.0 (X11; Linux x86_64) Firefox/118.0"
        );
        assert_eq!(record.status, "200");
        assert_eq!(record.bytes_sent, "5120");
        assert_eq!(record.bytes_received, "312");
        assert_eq!(record.time_taken, "15");
    }

    #[test]
    fn test_directive_and_blank_lines() {
        assert_eq!(parse_line("#Software: Microsoft IIS"), ParsedLine::Directive);
        assert_eq!(parse_line(""), ParsedLine::Blank);
        assert_eq!(parse_line("  \t\r\n"), ParsedLine::Blank);
    }

    #[test]
    fn test_short_line_is_rejected() {
        let line = "2024-03-01 12:00:01 10.0.0.1 GET /index.html - 80 - 1.2.3.4 ua 200 10 20";
        assert_eq!(parse_line(line), ParsedLine::Short { fields: 13 });
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let line = format!("{} extra \"more stuff\"", LINE);
        let ParsedLine::Record(record) = parse_line(&line) else {
            panic!("expected a record");
        };
        assert_eq!(record.time_taken, "15");
    }

    #[test]
    fn test_parsed_date() {
        let ParsedLine::Record(mut record) = parse_line(LINE) else {
            panic!("expected a record");
        };
        assert_eq!(
            record.parsed_date(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );

        record.date = "01/03/2024".to_string();
        assert_eq!(record.parsed_date(), None);
    }
}
