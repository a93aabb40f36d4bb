//! Splits seed file text into executable SQL statements.
//!
//! Seed files are hand maintained. Besides SQL they carry block comments
//! (including MySQL `/*! ... */` hints), `--` and `#` line comments, free-form
//! prose and transaction control that must not be replayed inside the loader's
//! own transaction. Only statements that start with a keyword from
//! [`STATEMENT_KEYWORDS`] are collected; everything else outside a statement is
//! skipped.

use std::collections::VecDeque;

/// Keywords a line must start with to open a new statement.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "CREATE", "INSERT", "UPDATE", "DELETE", "REPLACE", "ALTER", "DROP", "RENAME", "TRUNCATE",
    "SET", "USE", "LOCK", "UNLOCK", "LOAD", "CALL",
];

/// Statements that are consumed but never yielded. Matched against the upper-cased
/// head of each statement.
pub const SKIPPED_STATEMENT_PREFIXES: &[&str] = &[
    "START TRANSACTION",
    "BEGIN",
    "COMMIT",
    "ROLLBACK",
    "DELIMITER",
];

const LINE_COMMENT_MARKERS: &[&str] = &["--", "#"];

/// How much of a statement is inspected when matching [`SKIPPED_STATEMENT_PREFIXES`].
const SKIP_CHECK_CHARS: usize = 40;

/// Returns a lazy iterator over the statements in `sql_text`.
///
/// Each yielded statement is trimmed and carries no terminating `;`. Text left
/// without a terminator at the end of input is dropped, as is a statement whose
/// quoted literal never closes.
pub fn parse(sql_text: &str) -> Statements {
    Statements {
        text: strip_block_comments(sql_text),
        pos: 0,
        buffer: String::new(),
        scanner: QuoteScanner::default(),
        ready: VecDeque::new(),
    }
}

/// Iterator returned by [`parse`].
#[derive(Debug)]
pub struct Statements {
    text: String,
    // Byte offset of the next unread line in `text`.
    pos: usize,
    // Statement text collected so far; empty when not inside a statement.
    buffer: String,
    // Scan state for `buffer`, valid up to `scanner.scanned`.
    scanner: QuoteScanner,
    ready: VecDeque<String>,
}

impl Iterator for Statements {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(statement) = self.ready.pop_front() {
                return Some(statement);
            }
            let line = self.next_line()?;
            self.push_line(&line);
        }
    }
}

impl Statements {
    /// Next non-blank line that is not a line comment, trimmed.
    fn next_line(&mut self) -> Option<String> {
        while self.pos < self.text.len() {
            let rest = &self.text[self.pos..];
            let (raw, advance) = match rest.find('\n') {
                Some(end) => (&rest[..end], end + 1),
                None => (rest, rest.len()),
            };
            self.pos += advance;

            let line = raw.trim();
            if line.is_empty()
                || LINE_COMMENT_MARKERS
                    .iter()
                    .any(|marker| line.starts_with(marker))
            {
                continue;
            }
            return Some(line.to_owned());
        }
        None
    }

    fn push_line(&mut self, line: &str) {
        if self.buffer.is_empty() {
            if !starts_statement(line) {
                return;
            }
            self.buffer.push_str(line);
        } else {
            self.buffer.push('\n');
            self.buffer.push_str(line);
        }

        let terminators = self.scanner.scan(&self.buffer);
        if terminators.is_empty() {
            return;
        }

        let mut start = 0;
        for end in terminators {
            let statement = self.buffer[start..end].trim();
            start = end + 1;
            if !statement.is_empty() && !is_skipped(statement) {
                self.ready.push_back(statement.to_owned());
            }
        }

        // The remainder starts right after an unquoted terminator, so scanning
        // restarts from a clean state.
        self.buffer = self.buffer[start..].trim().to_owned();
        self.scanner = QuoteScanner::default();
    }
}

/// Incremental scanner that finds `;` outside of `'`, `"` and `` ` `` quotes.
/// A backslash escapes the character after it, quotes included.
#[derive(Debug, Default)]
struct QuoteScanner {
    scanned: usize,
    quote: Option<char>,
    escaped: bool,
}

impl QuoteScanner {
    /// Scans the part of `buffer` not seen yet and returns the byte offsets of
    /// every unquoted `;` in it.
    fn scan(&mut self, buffer: &str) -> Vec<usize> {
        let mut terminators = Vec::new();
        for (offset, ch) in buffer[self.scanned..].char_indices() {
            if self.escaped {
                self.escaped = false;
                continue;
            }
            match (ch, self.quote) {
                ('\\', _) => self.escaped = true,
                (ch, Some(open)) if ch == open => self.quote = None,
                (_, Some(_)) => {}
                ('\'' | '"' | '`', None) => self.quote = Some(ch),
                (';', None) => terminators.push(self.scanned + offset),
                _ => {}
            }
        }
        self.scanned = buffer.len();
        terminators
    }
}

/// Removes `/* ... */` comments, MySQL `/*! ... */` hints included. Unaware of
/// quoting. The first closer ends the comment; an unclosed comment swallows the
/// rest of the text.
fn strip_block_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("/*") {
        out.push_str(&rest[..open]);
        match rest[open + 2..].find("*/") {
            Some(close) => rest = &rest[open + 2 + close + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn starts_statement(line: &str) -> bool {
    let line = line.trim_start();
    STATEMENT_KEYWORDS.iter().any(|keyword| {
        line.get(..keyword.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
            && !line[keyword.len()..]
                .chars()
                .next()
                .is_some_and(|next| next.is_alphanumeric() || next == '_')
    })
}

fn is_skipped(statement: &str) -> bool {
    let head: String = statement
        .chars()
        .take(SKIP_CHECK_CHARS)
        .collect::<String>()
        .to_uppercase();
    SKIPPED_STATEMENT_PREFIXES
        .iter()
        .any(|prefix| head.starts_with(prefix))
}
