//! Content-type sniffing for scratch buffers.
//!
//! Rules run in a fixed order over the trimmed text and the first match wins.
//! Nothing here fails: text that matches no rule is `plain`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
    Xml,
    Html,
    Csv,
    Sql,
    Yaml,
    Markdown,
    Python,
    Javascript,
    Log,
    Plain,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::Xml => "xml",
            ContentKind::Html => "html",
            ContentKind::Csv => "csv",
            ContentKind::Sql => "sql",
            ContentKind::Yaml => "yaml",
            ContentKind::Markdown => "markdown",
            ContentKind::Python => "python",
            ContentKind::Javascript => "javascript",
            ContentKind::Log => "log",
            ContentKind::Plain => "plain",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ContentKind::Json => ".json",
            ContentKind::Xml => ".xml",
            ContentKind::Html => ".html",
            ContentKind::Csv => ".csv",
            ContentKind::Sql => ".sql",
            ContentKind::Yaml => ".yaml",
            ContentKind::Markdown => ".md",
            ContentKind::Python => ".py",
            ContentKind::Javascript => ".js",
            ContentKind::Log => ".log",
            ContentKind::Plain => ".txt",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub tag: ContentKind,
    pub extension: String,
}

impl ClassificationResult {
    fn of(tag: ContentKind) -> Self {
        Self {
            tag,
            extension: tag.extension().to_string(),
        }
    }
}

type Sniffer = fn(&str) -> bool;

/// Priority order. Earlier entries win when several would match.
const RULES: &[(ContentKind, Sniffer)] = &[
    (ContentKind::Json, is_json),
    (ContentKind::Xml, is_xml),
    (ContentKind::Html, is_html),
    (ContentKind::Csv, is_csv),
    (ContentKind::Sql, is_sql),
    (ContentKind::Yaml, is_yaml),
    (ContentKind::Markdown, is_markdown),
    (ContentKind::Python, is_python),
    (ContentKind::Javascript, is_javascript),
    (ContentKind::Log, is_log),
];

const CSV_SAMPLE_LINES: usize = 20;
const MIN_TABLE_ROWS: usize = 3;
const MIN_LOG_LINES: usize = 2;

pub fn classify(text: &str) -> ClassificationResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ClassificationResult::of(ContentKind::Plain);
    }

    for (kind, sniff) in RULES {
        if sniff(trimmed) {
            let mut result = ClassificationResult::of(*kind);
            if *kind == ContentKind::Csv && csv_delimiter(trimmed) == Some('\t') {
                result.extension = ".tsv".to_string();
            }
            return result;
        }
    }

    ClassificationResult::of(ContentKind::Plain)
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("classifier pattern must compile"))
}

fn html_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?i)<!doctype\s+html|<(?:html|head|body|div|script|span|table)\b",
    )
}

fn is_json(t: &str) -> bool {
    (t.starts_with('{') || t.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(t).is_ok()
}

fn is_xml(t: &str) -> bool {
    static ROOT: OnceLock<Regex> = OnceLock::new();
    if t.starts_with("<?xml") {
        return true;
    }
    if html_tags().is_match(t) {
        return false;
    }
    let body = skip_xml_prolog(t);
    let root = regex(&ROOT, r"^<([A-Za-z_][\w:.-]*)(?:\s[^<>]*)?/?>");
    let Some(caps) = root.captures(body) else {
        return false;
    };
    let open = caps.get(0).map_or("", |m| m.as_str());
    if open.ends_with("/>") && open.len() == body.len() {
        return true;
    }
    body.ends_with(&format!("</{}>", &caps[1]))
}

/// Strips leading `<!-- ... -->` comments and `<!DOCTYPE ...>` declarations.
fn skip_xml_prolog(t: &str) -> &str {
    let mut rest = t.trim_start();
    loop {
        let end = if rest.starts_with("<!--") {
            rest.find("-->").map(|i| i + 3)
        } else if rest
            .get(..9)
            .is_some_and(|p| p.eq_ignore_ascii_case("<!doctype"))
        {
            rest.find('>').map(|i| i + 1)
        } else {
            return rest;
        };
        match end {
            Some(i) => rest = rest[i..].trim_start(),
            None => return rest,
        }
    }
}

fn is_html(t: &str) -> bool {
    html_tags().is_match(t)
}

fn is_csv(t: &str) -> bool {
    csv_delimiter(t).is_some()
}

/// Returns the delimiter of a table-shaped text, tab before comma.
fn csv_delimiter(t: &str) -> Option<char> {
    let lines: Vec<&str> = t
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(CSV_SAMPLE_LINES)
        .collect();
    if lines.len() < MIN_TABLE_ROWS {
        return None;
    }
    ['\t', ','].into_iter().find(|&d| has_table_shape(&lines, d))
}

fn has_table_shape(lines: &[&str], delimiter: char) -> bool {
    static MILLIS: OnceLock<Regex> = OnceLock::new();
    // `10:00:00,123` is a timestamp with milliseconds, not two fields.
    let millis = regex(&MILLIS, r"(\d{2}:\d{2}:\d{2}),(\d)");
    let counts: Vec<usize> = lines
        .iter()
        .map(|l| match delimiter {
            ',' => count_unquoted(&millis.replace_all(l, "$1.$2"), delimiter),
            _ => count_unquoted(l, delimiter),
        })
        .collect();
    let mut freq: HashMap<usize, usize> = HashMap::new();
    for &c in counts.iter().filter(|&&c| c > 0) {
        *freq.entry(c).or_default() += 1;
    }
    let Some((&modal, &rows)) = freq.iter().max_by_key(|(count, rows)| (**rows, **count)) else {
        return false;
    };
    rows >= MIN_TABLE_ROWS && rows * 2 > counts.len() && counts[0] == modal
}

fn count_unquoted(line: &str, delimiter: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

fn is_sql(t: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let statement = regex(
        &RE,
        r"(?i)^(?:SELECT\b|INSERT\s+INTO\b|UPDATE\s+\S+\s+SET\b|DELETE\s+FROM\b|CREATE\s+(?:OR\s+REPLACE\s+|UNIQUE\s+|TEMP(?:ORARY)?\s+)?(?:TABLE|VIEW|INDEX|SCHEMA|DATABASE|TRIGGER|FUNCTION|PROCEDURE)\b|ALTER\s+TABLE\b|DROP\s+(?:TABLE|VIEW|INDEX|SCHEMA|DATABASE)\b|WITH\s+(?:RECURSIVE\s+)?\w+\s+AS\b)",
    );

    // Skip leading `--` comment lines so a commented migration still counts.
    let mut rest = t;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.starts_with("--") {
            rest = trimmed.split_once('\n').map_or("", |(_, r)| r);
        } else {
            rest = trimmed;
            break;
        }
    }
    statement.is_match(rest)
}

fn is_yaml(t: &str) -> bool {
    static KEY: OnceLock<Regex> = OnceLock::new();
    static ITEM: OnceLock<Regex> = OnceLock::new();
    let key = regex(&KEY, r"^ *[A-Za-z_][\w.-]*:(?: +\S.*)?$");
    let item = regex(&ITEM, r"^ *-(?: +\S.*)?$");

    if t.contains('{') || t.contains('}') {
        return false;
    }

    let mut saw_key = false;
    let mut first = true;
    // Indentation of the key that opened a `|`/`>` block scalar.
    let mut block_parent: Option<usize> = None;

    for line in t.lines() {
        let line = line.trim_end();
        let content = line.trim_start();
        if content.is_empty() {
            continue;
        }
        let leading = &line[..line.len() - content.len()];
        if leading.contains('\t') {
            return false;
        }
        let indent = leading.len();

        if let Some(parent) = block_parent {
            if indent > parent {
                continue;
            }
            block_parent = None;
        }
        if content.starts_with('#') {
            continue;
        }

        if first {
            first = false;
            if content != "---" && (indent > 0 || !key.is_match(line)) {
                return false;
            }
        }

        if content == "---" || content == "..." {
            continue;
        }
        if key.is_match(line) {
            saw_key = true;
            let opens_block = content.rsplit_once(": ").is_some_and(|(_, value)| {
                matches!(value, "|" | ">" | "|-" | ">-" | "|+" | ">+")
            });
            if opens_block {
                block_parent = Some(indent);
            }
            continue;
        }
        if item.is_match(line) {
            continue;
        }
        return false;
    }

    saw_key
}

fn is_markdown(t: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?m)^(?:#{1,6}[ \t]+\S|[-*+][ \t]+\S|```|~~~)",
    )
    .is_match(t)
}

fn is_python(t: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let definite = regex(
        &RE,
        r"(?m)^(?:#!.*python|[ \t]*(?:async[ \t]+)?def[ \t]+\w+[ \t]*\(|class[ \t]+\w+.*:[ \t]*$|import[ \t]+[\w.]+(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*[\w.]+(?:[ \t]+as[ \t]+\w+)?)*[ \t]*$|from[ \t]+[\w.]+[ \t]+import[ \t]+\S)",
    );
    definite.is_match(t) || has_python_block(t)
}

/// A control-flow header such as `for x in xs:` followed by a more deeply
/// indented line. Without the indented body the line is usually prose.
fn has_python_block(t: &str) -> bool {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    let header = regex(
        &HEADER,
        r"^[ \t]*(?:if|elif|else|for|while|with|try|except|finally)\b[^{};]*:[ \t]*$",
    );
    let indent = |l: &str| l.len() - l.trim_start().len();

    let mut lines = t.lines().filter(|l| !l.trim().is_empty()).peekable();
    while let Some(line) = lines.next() {
        if header.is_match(line) {
            if let Some(next) = lines.peek() {
                if indent(*next) > indent(line) {
                    return true;
                }
            }
        }
    }
    false
}

fn is_javascript(t: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?m)\bfunction\b[ \t]*[\w$]*[ \t]*\(|^[ \t]*(?:const|let|var)[ \t]+[\w$\[{]|=>|\brequire\(|^[ \t]*import[ \t].*\bfrom\b|^[ \t]*export[ \t]+|\bconsole\.log\(",
    )
    .is_match(t)
}

fn is_log(t: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let line_start = regex(
        &RE,
        r"^(?:\[?(?:\d{4}[-/]\d{2}[-/]\d{2}|\d{2}:\d{2}:\d{2})|\[(?:TRACE|DEBUG|INFO|WARN|WARNING|ERROR|FATAL|CRITICAL)\]|(?:TRACE|DEBUG|INFO|WARN|WARNING|ERROR|FATAL|CRITICAL)[\s:|])",
    );
    t.lines()
        .filter(|l| line_start.is_match(l.trim_start()))
        .take(MIN_LOG_LINES)
        .count()
        >= MIN_LOG_LINES
}
