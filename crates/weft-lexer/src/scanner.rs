//! A lightweight syntax provider based on brace matching
//!
//! Recognises `class|struct|enum|extension|protocol Name[: Inherited, ...] { ... }`
//! with their modifiers, and attributed `var`/`let` properties. Comments and
//! string literals are skipped so braces inside them do not count.

use weft_ast::AccessLevel;

use crate::{AttributeSpan, DeclarationKind, DeclarationRecord, SyntaxProvider};

const MODIFIERS: &[&str] = &[
    "public",
    "internal",
    "private",
    "fileprivate",
    "open",
    "final",
    "static",
    "lazy",
    "weak",
    "unowned",
    "override",
];

/// Words that turn a preceding `class` into a member modifier
const MEMBER_KEYWORDS: &[&str] = &["func", "var", "let", "subscript", "init"];

#[derive(Debug, Clone, Copy, Default)]
pub struct BraceScanner;

impl SyntaxProvider for BraceScanner {
    fn declarations(&self, source: &str) -> Vec<DeclarationRecord> {
        let mut scanner = Scanner::new(source);
        scanner.run();
        scanner.records
    }
}

struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    records: Vec<DeclarationRecord>,
    modifiers: Vec<&'a str>,
    /// Start of the first modifier or attribute of the pending declaration
    start: Option<usize>,
    attribute: Option<AttributeSpan>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            records: Vec::new(),
            modifiers: Vec::new(),
            start: None,
            attribute: None,
        }
    }

    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            let next = self.skip_noise(self.pos);
            if next != self.pos {
                self.pos = next;
                continue;
            }

            match self.bytes[self.pos] {
                b'@' => self.scan_attribute(),
                b'{' | b'}' | b';' => {
                    self.reset();
                    self.pos += 1;
                }
                c if is_ident_start(c) && !self.follows_ident(self.pos) => self.scan_word(),
                _ => self.pos += 1,
            }
        }
    }

    fn reset(&mut self) {
        self.modifiers.clear();
        self.start = None;
        self.attribute = None;
    }

    fn scan_word(&mut self) {
        let start = self.pos;
        let Some((word, end)) = self.read_ident(start) else {
            self.pos += 1;
            return;
        };
        self.pos = end;

        if MODIFIERS.contains(&word) {
            self.start.get_or_insert(start);
            self.modifiers.push(word);
            return;
        }

        if word == "class" {
            let after = self.skip_whitespace(end);
            if let Some((next, _)) = self.read_ident(after) {
                if MEMBER_KEYWORDS.contains(&next) {
                    self.start.get_or_insert(start);
                    return;
                }
            }
        }

        match DeclarationKind::from_keyword(word) {
            Some(DeclarationKind::Property) => self.scan_property(start),
            Some(kind) => self.scan_type(kind, start),
            None => self.reset(),
        }
    }

    /// `@Name` optionally followed by a balanced argument list
    fn scan_attribute(&mut self) {
        let start = self.pos;
        let Some((_, mut end)) = self.read_ident(start + 1) else {
            self.pos += 1;
            return;
        };
        let after = self.skip_whitespace(end);
        if self.bytes.get(after) == Some(&b'(') {
            end = self.matching(after, b'(', b')').map(|close| close + 1).unwrap_or(end);
        }

        self.start.get_or_insert(start);
        self.attribute = Some(AttributeSpan {
            text: self.source[start..end].to_string(),
            offset: start,
            length: end - start,
        });
        self.pos = end;
    }

    fn scan_type(&mut self, kind: DeclarationKind, keyword_start: usize) {
        let name_start = self.skip_whitespace(self.pos);
        let Some((name, mut cursor)) = self.read_qualified_ident(name_start) else {
            self.reset();
            return;
        };

        let mut generics = String::new();
        let after_name = self.skip_whitespace(cursor);
        if self.bytes.get(after_name) == Some(&b'<') {
            if let Some(close) = self.matching(after_name, b'<', b'>') {
                generics = self.source[after_name..=close].to_string();
                cursor = close + 1;
            }
        }

        let Some(open) = self.find_open_brace(cursor) else {
            self.reset();
            return;
        };

        let header = self.source[cursor..open].trim();
        let inherited_types = header
            .strip_prefix(':')
            .map(|list| {
                let list = list.split(" where ").next().unwrap_or(list);
                list.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let close = self.matching(open, b'{', b'}');
        let access_level = self
            .modifiers
            .iter()
            .map(|m| AccessLevel::from_modifier(m))
            .find(|level| *level == AccessLevel::Public)
            .unwrap_or_default();

        let name = format!("{}{}", name, generics);
        // An unclosed body runs to the end of the file and gets no end token
        let mut record = match close {
            Some(close) => {
                DeclarationRecord::new(kind, name, keyword_start, close + 1 - keyword_start).with_body(open + 1)
            }
            None => DeclarationRecord::new(kind, name, keyword_start, self.bytes.len() - keyword_start),
        };
        record.access_level = access_level;
        record.inherited_types = inherited_types;
        self.records.push(record);

        self.reset();
        // Nested declarations live inside the body
        self.pos = open + 1;
    }

    fn scan_property(&mut self, keyword_start: usize) {
        let name_start = self.skip_whitespace(self.pos);
        let Some((name, end)) = self.read_ident(name_start) else {
            self.reset();
            return;
        };
        self.pos = end;

        let Some(attribute) = self.attribute.take() else {
            self.reset();
            return;
        };

        let mut type_name = None;
        let mut type_end = end;
        let colon = self.skip_whitespace(end);
        if self.bytes.get(colon) == Some(&b':') {
            type_end = colon + 1;
            while type_end < self.bytes.len() && !matches!(self.bytes[type_end], b'\n' | b'=' | b'{' | b';') {
                type_end += 1;
            }
            let text = self.source[colon + 1..type_end].trim();
            if !text.is_empty() {
                type_name = Some(text.to_string());
            }
        }

        let start = self.start.unwrap_or(keyword_start).min(keyword_start);
        let mut record = DeclarationRecord::new(DeclarationKind::Property, name, start, type_end - start);
        record.access_level = self
            .modifiers
            .iter()
            .map(|m| AccessLevel::from_modifier(m))
            .find(|level| *level == AccessLevel::Public)
            .unwrap_or_default();
        record.type_name = type_name;
        record.attribute = Some(attribute);
        self.records.push(record);

        self.reset();
        self.pos = type_end;
    }

    // === Low-level helpers ===

    fn follows_ident(&self, pos: usize) -> bool {
        pos > 0 && is_ident_continue(self.bytes[pos - 1])
    }

    fn read_ident(&self, pos: usize) -> Option<(&'a str, usize)> {
        let first = *self.bytes.get(pos)?;
        if !is_ident_start(first) {
            return None;
        }
        let mut end = pos + 1;
        while end < self.bytes.len() && is_ident_continue(self.bytes[end]) {
            end += 1;
        }
        Some((&self.source[pos..end], end))
    }

    /// `Name(.Name)*`, used by extensions of nested types
    fn read_qualified_ident(&self, pos: usize) -> Option<(&'a str, usize)> {
        let (_, mut end) = self.read_ident(pos)?;
        while self.bytes.get(end) == Some(&b'.') {
            match self.read_ident(end + 1) {
                Some((_, next)) => end = next,
                None => break,
            }
        }
        Some((&self.source[pos..end], end))
    }

    fn skip_whitespace(&self, mut pos: usize) -> usize {
        loop {
            while pos < self.bytes.len() && self.bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            let next = self.skip_comment(pos);
            if next == pos {
                return pos;
            }
            pos = next;
        }
    }

    /// Skip a comment or string literal starting at `pos`
    fn skip_noise(&self, pos: usize) -> usize {
        let next = self.skip_comment(pos);
        if next != pos {
            return next;
        }
        self.skip_string(pos)
    }

    fn skip_comment(&self, pos: usize) -> usize {
        let rest = &self.bytes[pos.min(self.bytes.len())..];
        if rest.starts_with(b"//") {
            return rest
                .iter()
                .position(|&b| b == b'\n')
                .map(|n| pos + n)
                .unwrap_or(self.bytes.len());
        }
        if rest.starts_with(b"/*") {
            let mut depth = 0usize;
            let mut i = pos;
            while i < self.bytes.len() {
                if self.bytes[i..].starts_with(b"/*") {
                    depth += 1;
                    i += 2;
                } else if self.bytes[i..].starts_with(b"*/") {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        return i;
                    }
                } else {
                    i += 1;
                }
            }
            return self.bytes.len();
        }
        pos
    }

    fn skip_string(&self, pos: usize) -> usize {
        let rest = &self.bytes[pos.min(self.bytes.len())..];
        if rest.starts_with(b"\"\"\"") {
            let body = pos + 3;
            return find_subslice(&self.bytes[body..], b"\"\"\"")
                .map(|n| body + n + 3)
                .unwrap_or(self.bytes.len());
        }
        if rest.first() == Some(&b'"') {
            let mut i = pos + 1;
            while i < self.bytes.len() {
                match self.bytes[i] {
                    b'\\' => i += 2,
                    b'"' | b'\n' => return i + 1,
                    _ => i += 1,
                }
            }
            return self.bytes.len();
        }
        pos
    }

    /// Index of the delimiter closing the one at `open`
    fn matching(&self, open: usize, opening: u8, closing: u8) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = open;
        while i < self.bytes.len() {
            let next = self.skip_noise(i);
            if next != i {
                i = next;
                continue;
            }
            let b = self.bytes[i];
            if b == opening {
                depth += 1;
            } else if b == closing {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            i += 1;
        }
        None
    }

    /// The `{` opening a type body; `None` if a `;` or `}` comes first
    fn find_open_brace(&self, mut pos: usize) -> Option<usize> {
        while pos < self.bytes.len() {
            let next = self.skip_noise(pos);
            if next != pos {
                pos = next;
                continue;
            }
            match self.bytes[pos] {
                b'{' => return Some(pos),
                b';' | b'}' => return None,
                _ => pos += 1,
            }
        }
        None
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
