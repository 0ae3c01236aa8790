//! Old-style (OpenStep) property lists as used by `project.pbxproj`
//!
//! ```text
//! // !$*UTF8*$!
//! {
//! 	archiveVersion = 1;
//! 	objects = {
//!
//! /* Begin PBXBuildFile section */
//! 		8A5C1492174E662D0006EB36 /* Data in Resources */ = {isa = PBXBuildFile; fileRef = AA5C1491174E662D0006EB36 /* Data */; };
//! /* End PBXBuildFile section */
//! 	};
//! 	rootObject = 29B97313FDCFA39411CA2CEA /* Project object */;
//! }
//! ```
//!
//! The `/* ... */` comment that follows an object identifier is kept as an
//! annotation and written back after every occurrence of that identifier.
//! Other comments are dropped; the section markers are regenerated.

use std::collections::HashMap;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Characters that may appear in a string without quotes
static UNQUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_$/:.]+$").unwrap());

/// Keys whose identifier values Xcode writes without an annotation
const BARE_VALUE_KEYS: &[&str] = &["remoteGlobalIDString"];

/// Keys whose dictionary keys are identifiers written without an annotation
const BARE_KEY_DICTS: &[&str] = &["TargetAttributes"];

/// isa values whose objects Xcode writes on a single line
const SINGLE_LINE_ISAS: &[&str] = &["PBXBuildFile", "PBXFileReference"];

const HEADER: &str = "// !$*UTF8*$!";

/// Property list value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// Dictionary that keeps its keys in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dict {
    entries: Vec<(String, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value of `key`, if it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Replace the value of an existing key or append a new one
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A parsed property list with its identifier annotations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub root: Dict,
    pub annotations: HashMap<String, String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// Parse a property list document whose root is a dictionary
pub fn parse(source: &str) -> Result<Document, ParseError> {
    let mut parser = Parser {
        src: source,
        pos: 0,
        annotations: HashMap::new(),
    };
    parser.skip_trivia()?;
    let root = match parser.parse_value()? {
        Value::Dict(dict) => dict,
        _ => return Err(parser.error("root object must be a dictionary")),
    };
    parser.skip_trivia()?;
    if parser.pos < parser.src.len() {
        return Err(parser.error("unexpected content after root dictionary"));
    }
    Ok(Document {
        root,
        annotations: parser.annotations,
    })
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    annotations: HashMap<String, String>,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> ParseError {
        let consumed = &self.src[..self.pos.min(self.src.len())];
        ParseError {
            line: consumed.matches('\n').count() + 1,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    /// Skip whitespace and comments, returning the last block comment seen
    fn skip_trivia(&mut self) -> Result<Option<&'a str>, ParseError> {
        let mut last_comment = None;
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("/*") {
                let end = trimmed[2..]
                    .find("*/")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                last_comment = Some(trimmed[2..2 + end].trim());
                self.pos += end + 4;
            } else if trimmed.starts_with("//") {
                let end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += end;
            } else {
                return Ok(last_comment);
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        self.skip_trivia()?;
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'{') => self.parse_dict().map(Value::Dict),
            Some(b'(') => self.parse_array().map(Value::Array),
            Some(_) => self.parse_string().map(Value::String),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_dict(&mut self) -> Result<Dict, ParseError> {
        self.expect(b'{')?;
        let mut dict = Dict::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(dict);
            }
            let key = self.parse_string()?;
            self.expect(b'=')?;
            let value = self.parse_value()?;
            self.expect(b';')?;
            dict.insert(key, value);
        }
    }

    fn parse_array(&mut self) -> Result<Vec<Value>, ParseError> {
        self.expect(b'(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(b')') {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {}
                _ => return Err(self.error("expected ',' or ')' in array")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'"') => self.parse_quoted(),
            Some(_) => {
                let rest = self.rest();
                let len = rest
                    .bytes()
                    .take_while(|b| b.is_ascii_alphanumeric() || b"_$/:.-+".contains(b))
                    .count();
                if len == 0 {
                    return Err(self.error(format!(
                        "unexpected character '{}'",
                        rest.chars().next().unwrap_or(' ')
                    )));
                }
                let token = rest[..len].to_string();
                self.pos += len;
                self.capture_annotation(&token)?;
                Ok(token)
            }
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_quoted(&mut self) -> Result<String, ParseError> {
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                other => out.push(other),
            }
        }
        Err(self.error("unterminated string"))
    }

    /// Remember `ID /* comment */` pairs so they can be written back
    fn capture_annotation(&mut self, token: &str) -> Result<(), ParseError> {
        if let Some(comment) = self.skip_trivia()? {
            if !comment.is_empty() {
                self.annotations
                    .entry(token.to_string())
                    .or_insert_with(|| comment.to_string());
            }
        }
        Ok(())
    }
}

/// Serialize a document in Xcode's layout
pub fn write(doc: &Document) -> String {
    let writer = Writer {
        annotations: &doc.annotations,
    };
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str("{\n");
    for (key, value) in doc.root.iter() {
        out.push('\t');
        writer.write_string(&mut out, key, true);
        out.push_str(" = ");
        match (key, value) {
            ("objects", Value::Dict(objects)) => writer.write_objects(&mut out, objects),
            _ => writer.write_value(&mut out, value, key, 1, false),
        }
        out.push_str(";\n");
    }
    out.push_str("}\n");
    out
}

struct Writer<'a> {
    annotations: &'a HashMap<String, String>,
}

impl Writer<'_> {
    fn write_objects(&self, out: &mut String, objects: &Dict) {
        let mut isas: Vec<&str> = objects
            .iter()
            .filter_map(|(_, v)| v.as_dict().and_then(|d| d.get_str("isa")))
            .collect();
        isas.sort_unstable();
        isas.dedup();

        out.push_str("{\n");
        for isa in &isas {
            let single_line = SINGLE_LINE_ISAS.contains(isa);
            let _ = write!(out, "\n/* Begin {} section */\n", isa);
            for (id, object) in objects.iter() {
                if object.as_dict().and_then(|d| d.get_str("isa")) != Some(*isa) {
                    continue;
                }
                out.push_str("\t\t");
                self.write_string(out, id, true);
                out.push_str(" = ");
                self.write_value(out, object, id, 2, single_line);
                out.push_str(";\n");
            }
            let _ = writeln!(out, "/* End {} section */", isa);
        }
        // Objects without an isa are not valid in Xcode but are kept
        for (id, object) in objects.iter() {
            if object.as_dict().and_then(|d| d.get_str("isa")).is_none() {
                out.push_str("\t\t");
                self.write_string(out, id, true);
                out.push_str(" = ");
                self.write_value(out, object, id, 2, false);
                out.push_str(";\n");
            }
        }
        out.push_str("\t}");
    }

    /// Write `value`, the value of `key` in its parent dictionary
    fn write_value(&self, out: &mut String, value: &Value, key: &str, depth: usize, single_line: bool) {
        match value {
            Value::String(s) => self.write_string(out, s, !BARE_VALUE_KEYS.contains(&key)),
            Value::Array(items) if single_line => {
                out.push('(');
                for item in items {
                    self.write_value(out, item, key, depth, true);
                    out.push_str(", ");
                }
                out.push(')');
            }
            Value::Array(items) => {
                out.push_str("(\n");
                for item in items {
                    indent(out, depth + 1);
                    self.write_value(out, item, key, depth + 1, false);
                    out.push_str(",\n");
                }
                indent(out, depth);
                out.push(')');
            }
            Value::Dict(dict) if single_line => {
                let annotate_keys = !BARE_KEY_DICTS.contains(&key);
                out.push('{');
                for (child, item) in dict.iter() {
                    self.write_string(out, child, annotate_keys);
                    out.push_str(" = ");
                    self.write_value(out, item, child, depth, true);
                    out.push_str("; ");
                }
                out.push('}');
            }
            Value::Dict(dict) => {
                let annotate_keys = !BARE_KEY_DICTS.contains(&key);
                out.push_str("{\n");
                for (child, item) in dict.iter() {
                    indent(out, depth + 1);
                    self.write_string(out, child, annotate_keys);
                    out.push_str(" = ");
                    self.write_value(out, item, child, depth + 1, false);
                    out.push_str(";\n");
                }
                indent(out, depth);
                out.push('}');
            }
        }
    }

    fn write_string(&self, out: &mut String, s: &str, annotate: bool) {
        out.push_str(&quote(s));
        if let Some(annotation) = self.annotations.get(s).filter(|_| annotate) {
            let _ = write!(out, " /* {} */", annotation);
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Quote a string when Xcode would
pub fn quote(s: &str) -> String {
    if UNQUOTED.is_match(s) && !s.contains("___") && !s.contains("//") {
        return s.to_string();
    }
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
