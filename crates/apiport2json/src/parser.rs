/// Parser for the breaking-change markdown documents.
///
/// Every document follows one fixed template:
/// - Title header: `## ID: Title`
/// - Ordered `### Section` headers (Scope, Version Introduced, optional Version Reverted, ...)
/// - Checkbox lines `- [x] Quirked`, `- [ ] Optional`, `- [ ] Build-time break`
/// - A category block, an optional `[More information](link)` line and an optional
///   trailing `<!-- ... -->` comment holding `### Original Bug` / `### Notes`
///
/// Parser approach: ordered section scanner over the lines of the document. Lines keep
/// their byte offsets so multi-line bodies are sliced verbatim out of the source text.
use regex::Regex;
use tracing::debug;

use crate::model::{non_blank, BreakingChange};

const SCOPE: &str = "### Scope";
const VERSION_INTRODUCED: &str = "### Version Introduced";
const VERSION_REVERTED: &str = "### Version Reverted";
const SOURCE_ANALYZER_STATUS: &str = "### Source Analyzer Status";
const CHANGE_DESCRIPTION: &str = "### Change Description";
const RECOMMENDED_ACTION: &str = "### Recommended Action";
const AFFECTED_APIS: &str = "### Affected APIs";
const CATEGORY_HEADERS: &[&str] = &["### Category", "### Categories"];

const QUIRKED: &str = "Quirked";
const OPTIONAL: &str = "Optional";
const BUILD_TIME_BREAK: &str = "Build-time break";

const MORE_INFORMATION_PREFIX: &str = "[More information](";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// A document that does not follow the template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line where the mismatch was detected
    pub line: usize,
    pub message: String,
}

/// Extracts [`BreakingChange`] records from markdown documents.
///
/// Holds the compiled patterns so a single instance can be reused across a whole run.
pub struct TemplateParser {
    title_re: Regex,
    checkbox_re: Regex,
    comment_section_re: Regex,
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateParser {
    pub fn new() -> Self {
        Self {
            title_re: Regex::new(r"^## (?P<id>[^:]*): (?P<title>.*)$").expect("valid regex"),
            checkbox_re: Regex::new(r"^- \[(?P<mark>.)\] (?P<label>.+?)\s*$")
                .expect("valid regex"),
            comment_section_re: Regex::new(
                r"^### (?:(?P<known>Original Bug|Notes)(?:\s+|$)|(?P<other>.+?)\s*$)",
            )
            .expect("valid regex"),
        }
    }

    /// Parse one markdown document into a [`BreakingChange`].
    ///
    /// The whole document must match the template; no partial record is produced.
    pub fn parse(&self, content: &str) -> Result<BreakingChange, ParseError> {
        let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
        let mut scanner = Scanner::new(content);

        let (id, title) = self.parse_title(&mut scanner)?;

        scanner.expect_header(SCOPE)?;
        let scope = scanner.single_line(SCOPE)?;

        scanner.expect_header(VERSION_INTRODUCED)?;
        let version_introduced = scanner.single_line(VERSION_INTRODUCED)?;

        let version_reverted = if scanner.accept_header(VERSION_REVERTED) {
            Some(scanner.single_line(VERSION_REVERTED)?)
        } else {
            None
        };

        scanner.expect_header(SOURCE_ANALYZER_STATUS)?;
        let source_analyzer_status = scanner.single_line(SOURCE_ANALYZER_STATUS)?;

        scanner.expect_header(CHANGE_DESCRIPTION)?;
        let description_line = scanner.line_number();
        let description = scanner.take_until(|line| self.checkbox(line, QUIRKED).is_some());
        let description = required(description, CHANGE_DESCRIPTION, description_line)?;

        let quirked = self.expect_checkbox(&mut scanner, QUIRKED)?;
        let optional = self.accept_checkbox(&mut scanner, OPTIONAL).unwrap_or(false);
        let build_time_break = self.expect_checkbox(&mut scanner, BUILD_TIME_BREAK)?;

        scanner.expect_header(RECOMMENDED_ACTION)?;
        let recommended_line = scanner.line_number();
        let recommended_action = scanner.take_until(|line| line.trim() == AFFECTED_APIS);
        let recommended_action = required(recommended_action, RECOMMENDED_ACTION, recommended_line)?;

        scanner.expect_header(AFFECTED_APIS)?;
        let affected_line = scanner.line_number();
        let affected_apis = scanner.take_until(|line| CATEGORY_HEADERS.contains(&line.trim()));
        let affected_apis = required(affected_apis, AFFECTED_APIS, affected_line)?;

        scanner.expect_any_header(CATEGORY_HEADERS)?;
        let category_block = scanner.take_until(is_trailer_start);
        let categories = split_categories(category_block);

        let more_information = parse_more_information(&mut scanner)?;
        let (original_bug, notes) = self.parse_comment(&mut scanner)?;

        scanner.skip_blank();
        if let Some(line) = scanner.peek() {
            return Err(ParseError {
                line: line.number,
                message: format!("unexpected content after categories: `{}`", line.text.trim()),
            });
        }

        Ok(BreakingChange {
            id,
            title,
            scope,
            version_introduced,
            version_reverted,
            source_analyzer_status,
            description,
            quirked,
            optional,
            build_time_break,
            recommended_action,
            affected_apis,
            categories,
            more_information,
            original_bug,
            notes,
        })
    }

    fn parse_title(&self, scanner: &mut Scanner<'_>) -> Result<(i32, String), ParseError> {
        scanner.skip_blank();
        let Some(line) = scanner.peek() else {
            return Err(scanner.error("expected `## <id>: <title>` header, document is empty"));
        };
        let number = line.number;
        let caps = self
            .title_re
            .captures(line.text.trim_start())
            .ok_or_else(|| ParseError {
                line: number,
                message: format!("expected `## <id>: <title>` header, found `{}`", line.text.trim()),
            })?;

        let raw_id = &caps["id"];
        if raw_id.is_empty() || !raw_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError {
                line: number,
                message: format!("id `{raw_id}` is not numeric"),
            });
        }
        let id = raw_id.parse::<i32>().map_err(|e| ParseError {
            line: number,
            message: format!("id `{raw_id}` is out of range: {e}"),
        })?;

        let title = non_blank(&caps["title"]).ok_or_else(|| ParseError {
            line: number,
            message: "title is empty".to_string(),
        })?;

        scanner.advance();
        Ok((id, title))
    }

    /// Return the raw mark if `line` is the checkbox line for `label`.
    fn checkbox(&self, line: &str, label: &str) -> Option<char> {
        let caps = self.checkbox_re.captures(line.trim_start())?;
        if &caps["label"] != label {
            return None;
        }
        caps["mark"].chars().next()
    }

    fn accept_checkbox(&self, scanner: &mut Scanner<'_>, label: &str) -> Option<bool> {
        scanner.skip_blank();
        let mark = self.checkbox(scanner.peek()?.text, label)?;
        scanner.advance();
        // Any non-whitespace mark counts as checked, not only `x`.
        Some(!mark.is_whitespace())
    }

    fn expect_checkbox(&self, scanner: &mut Scanner<'_>, label: &str) -> Result<bool, ParseError> {
        self.accept_checkbox(scanner, label).ok_or_else(|| {
            scanner.unexpected(&format!("`- [ ] {label}` checkbox"))
        })
    }

    /// Parse the optional trailing `<!-- ... -->` comment.
    ///
    /// Returns `(original_bug, notes)`.
    fn parse_comment(
        &self,
        scanner: &mut Scanner<'_>,
    ) -> Result<(Option<String>, Option<String>), ParseError> {
        scanner.skip_blank();
        let Some(line) = scanner.peek() else {
            return Ok((None, None));
        };
        if !line.text.trim_start().starts_with(COMMENT_OPEN) {
            return Ok((None, None));
        }

        let content = scanner.content;
        let open = line.start + line.text.find(COMMENT_OPEN).unwrap_or(0) + COMMENT_OPEN.len();
        let close = content[open..]
            .find(COMMENT_CLOSE)
            .map(|pos| open + pos)
            .ok_or_else(|| ParseError {
                line: line.number,
                message: "unterminated `<!--` comment".to_string(),
            })?;
        scanner.seek(close + COMMENT_CLOSE.len());

        // Section bodies are byte ranges of the comment; text following a known
        // header on the same line belongs to its body.
        let comment = &content[open..close];
        let mut original_bug = None;
        let mut notes = None;
        let mut current: Option<(&str, usize)> = None;
        let mut offset = 0;
        for raw in comment.split_inclusive('\n') {
            let text = raw.trim_end_matches(['\r', '\n']);
            let trimmed = text.trim();
            if let Some(caps) = self.comment_section_re.captures(trimmed) {
                if let Some((name, start)) = current.take() {
                    store_comment_section(
                        name,
                        &comment[start..offset],
                        &mut original_bug,
                        &mut notes,
                    );
                }
                let name = caps
                    .name("known")
                    .or_else(|| caps.name("other"))
                    .map_or("", |m| m.as_str());
                let leading = text.len() - text.trim_start().len();
                let header_end = caps.get(0).map_or(trimmed.len(), |m| m.end());
                current = Some((name, offset + leading + header_end));
            }
            offset += raw.len();
        }
        if let Some((name, start)) = current {
            store_comment_section(name, &comment[start..], &mut original_bug, &mut notes);
        }

        Ok((original_bug, notes))
    }
}

fn store_comment_section(
    name: &str,
    body: &str,
    original_bug: &mut Option<String>,
    notes: &mut Option<String>,
) {
    match name {
        "Original Bug" => *original_bug = non_blank(body),
        "Notes" => *notes = non_blank(body),
        other => debug!(section = other, "ignoring unknown comment section"),
    }
}

/// Parse one markdown document using a freshly built [`TemplateParser`].
pub fn parse_breaking_change(content: &str) -> Result<BreakingChange, ParseError> {
    TemplateParser::new().parse(content)
}

/// Split the category block into one trimmed entry per non-blank line.
pub fn split_categories(block: &str) -> Vec<String> {
    block
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_trailer_start(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with(MORE_INFORMATION_PREFIX) || line.starts_with(COMMENT_OPEN)
}

fn parse_more_information(scanner: &mut Scanner<'_>) -> Result<Option<String>, ParseError> {
    scanner.skip_blank();
    let Some(line) = scanner.peek() else {
        return Ok(None);
    };
    let Some(rest) = line.text.trim().strip_prefix(MORE_INFORMATION_PREFIX) else {
        return Ok(None);
    };
    let target = rest.strip_suffix(')').ok_or_else(|| ParseError {
        line: line.number,
        message: "malformed `[More information](...)` link".to_string(),
    })?;
    let target = non_blank(target);
    scanner.advance();
    Ok(target)
}

fn required(body: &str, section: &str, line: usize) -> Result<String, ParseError> {
    non_blank(body).ok_or_else(|| ParseError {
        line,
        message: format!("`{section}` section is empty"),
    })
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// 1-based line number
    number: usize,
    /// Byte offset of the first character of the line
    start: usize,
    /// Line text without its line terminator
    text: &'a str,
}

impl Line<'_> {
    fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

struct Scanner<'a> {
    content: &'a str,
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(content: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for (index, raw) in content.split_inclusive('\n').enumerate() {
            let text = raw.strip_suffix('\n').unwrap_or(raw);
            let text = text.strip_suffix('\r').unwrap_or(text);
            lines.push(Line {
                number: index + 1,
                start,
                text,
            });
            start += raw.len();
        }
        Self {
            content,
            lines,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Move to the first line that starts at or after byte `offset`.
    fn seek(&mut self, offset: usize) {
        while self.peek().is_some_and(|line| line.end() < offset) {
            self.pos += 1;
        }
        // The line holding `offset` itself may still carry trailing text.
        let content = self.content;
        if let Some(line) = self.peek() {
            if line.start < offset {
                let rest = &content[offset..line.end()];
                if rest.trim().is_empty() {
                    self.pos += 1;
                } else {
                    self.lines[self.pos] = Line {
                        number: line.number,
                        start: offset,
                        text: rest,
                    };
                }
            }
        }
    }

    fn line_number(&self) -> usize {
        self.peek()
            .map(|line| line.number)
            .unwrap_or_else(|| self.lines.len().max(1))
    }

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(|line| line.text.trim().is_empty()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError {
            line: self.line_number(),
            message: message.to_string(),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(line) => self.error(&format!("expected {expected}, found `{}`", line.text.trim())),
            None => self.error(&format!("expected {expected}, reached end of document")),
        }
    }

    fn accept_any_header(&mut self, headers: &[&str]) -> bool {
        self.skip_blank();
        match self.peek() {
            Some(line) if headers.contains(&line.text.trim()) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn accept_header(&mut self, header: &str) -> bool {
        self.accept_any_header(&[header])
    }

    fn expect_any_header(&mut self, headers: &[&str]) -> Result<(), ParseError> {
        if self.accept_any_header(headers) {
            return Ok(());
        }
        let expected = headers
            .iter()
            .map(|h| format!("`{h}`"))
            .collect::<Vec<_>>()
            .join(" or ");
        Err(self.unexpected(&format!("{expected} header")))
    }

    fn expect_header(&mut self, header: &str) -> Result<(), ParseError> {
        self.expect_any_header(&[header])
    }

    /// Take the single non-blank line forming the body of `section`.
    fn single_line(&mut self, section: &str) -> Result<String, ParseError> {
        self.skip_blank();
        let Some(line) = self.peek() else {
            return Err(self.error(&format!("`{section}` section is empty")));
        };
        let value = line.text.trim();
        if value.starts_with("### ") {
            return Err(self.error(&format!("`{section}` section is empty")));
        }
        self.advance();
        Ok(value.to_string())
    }

    /// Consume lines up to (not including) the first line matching `is_end`, or to the
    /// end of the document, and return the covered source text.
    fn take_until(&mut self, is_end: impl Fn(&str) -> bool) -> &'a str {
        let content = self.content;
        let Some(first) = self.peek() else {
            return "";
        };
        let mut end = first.start;
        while let Some(line) = self.peek() {
            if is_end(line.text) {
                break;
            }
            end = line.end();
            self.advance();
        }
        &content[first.start..end]
    }
}
