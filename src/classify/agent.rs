//! User-agent classification into browser and operating system labels

use regex::{Regex, RegexBuilder};

/// Label used when no rule matches
pub const UNKNOWN: &str = "Unknown";

/// Source form of one pattern in a rule table
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    /// Regex searched for anywhere in the user agent
    pub pattern: &'static str,
    /// When set, the last match of `pattern` must not be followed by this
    pub unless_followed_by: Option<&'static str>,
}

const fn p(pattern: &'static str) -> PatternSpec {
    PatternSpec {
        pattern,
        unless_followed_by: None,
    }
}

const fn p_unless(pattern: &'static str, guard: &'static str) -> PatternSpec {
    PatternSpec {
        pattern,
        unless_followed_by: Some(guard),
    }
}

/// Browser rules in priority order
///
/// `Chrome` precedes `Safari`, `Opera` and `Edge`: Chromium-based agents
/// carry all of those tokens and resolve to `Chrome`.
pub const BROWSER_RULES: &[(&str, &[PatternSpec])] = &[
    ("Firefox", &[p("Firefox")]),
    ("MSIE", &[p("MSIE"), p("Trident")]),
    ("Chrome", &[p("Chrome")]),
    ("Safari", &[p("Safari"), p("AppleWebKit")]),
    ("Opera", &[p("Opera"), p("OPR")]),
    ("Edge", &[p("Edge")]),
    ("Netscape", &[p("Netscape")]),
    ("Baiduspider", &[p("Baiduspider")]),
    ("YandexBot", &[p("YandexBot")]),
    ("Sogou", &[p("Sogou")]),
    ("Panscient", &[p(r"panscient\.com")]),
    ("msnbot", &[p("msnbot")]),
];

/// Operating system rules in priority order
pub const OS_RULES: &[(&str, &[PatternSpec])] = &[
    ("Windows", &[p("Windows NT"), p_unless("Win", "PPC")]),
    ("Mac OS", &[p("Macintosh"), p("Mac OS X")]),
    ("Linux", &[p("Linux")]),
    ("iOS", &[p("iPhone"), p("iPad"), p("iPod")]),
    ("Android", &[p("Android")]),
];

/// Result of classifying one user agent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Classification {
    pub browser: String,
    pub operating_system: String,
}

#[derive(Debug, Clone)]
struct Pattern {
    regex: Regex,
    unless_followed_by: Option<Regex>,
}

impl Pattern {
    fn compile(spec: &PatternSpec) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: case_insensitive(spec.pattern)?,
            unless_followed_by: spec.unless_followed_by.map(case_insensitive).transpose()?,
        })
    }

    fn is_match(&self, haystack: &str) -> bool {
        match &self.unless_followed_by {
            None => self.regex.is_match(haystack),
            // If any occurrence has no guard after it, the last one doesn't either.
            Some(guard) => self
                .regex
                .find_iter(haystack)
                .last()
                .is_some_and(|m| !guard.is_match(&haystack[m.end()..])),
        }
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// An ordered list of (label, patterns) rules
///
/// Rules are evaluated in declaration order and the first one with any
/// matching pattern wins.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<(String, Vec<Pattern>)>,
}

impl RuleTable {
    /// Compiles a rule table, failing on the first invalid pattern
    pub fn compile(specs: &[(&str, &[PatternSpec])]) -> Result<Self, regex::Error> {
        let rules = specs
            .iter()
            .map(|(label, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(Pattern::compile)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((label.to_string(), compiled))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { rules })
    }

    /// Returns the label of the first matching rule, or [`UNKNOWN`]
    pub fn first_match(&self, haystack: &str) -> &str {
        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(haystack)))
            .map(|(label, _)| label.as_str())
            .unwrap_or(UNKNOWN)
    }

    /// Labels in priority order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(label, _)| label.as_str())
    }
}

/// Maps user agents to a browser and an operating system
#[derive(Debug, Clone)]
pub struct AgentClassifier {
    browsers: RuleTable,
    systems: RuleTable,
}

impl AgentClassifier {
    /// Builds a classifier from custom rule tables
    pub fn new(browsers: RuleTable, systems: RuleTable) -> Self {
        Self { browsers, systems }
    }

    /// Builds the classifier with [`BROWSER_RULES`] and [`OS_RULES`]
    pub fn builtin() -> Self {
        Self::new(
            RuleTable::compile(BROWSER_RULES).expect("built-in browser patterns are valid"),
            RuleTable::compile(OS_RULES).expect("built-in OS patterns are valid"),
        )
    }

    /// Classifies a user agent string
    pub fn classify(&self, user_agent: &str) -> Classification {
        Classification {
            browser: self.browsers.first_match(user_agent).to_string(),
            operating_system: self.systems.first_match(user_agent).to_string(),
        }
    }
}

impl Default for AgentClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
