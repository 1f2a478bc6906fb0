// src/path.rs
use serde_json::Value;

use crate::errors::{Error, Result};

/// One step of a property path: `a`, `[0]` or `['a b']`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    Key(String),
    Index(usize),
}

/// Parse `a.b[0]['c.d']` into tokens. A plain key is everything up to the
/// next `.` or `[`.
pub fn parse_path(input: &str) -> Result<Vec<PathToken>> {
    let mut p = Parser::new(input);
    let mut out = Vec::new();
    loop {
        if p.consume_char('[') {
            if p.peek_char() == Some('\'') || p.peek_char() == Some('"') {
                out.push(PathToken::Key(p.parse_quoted_string()?));
            } else {
                out.push(PathToken::Index(p.parse_index()?));
            }
            p.expect(']')?;
        } else {
            out.push(PathToken::Key(p.parse_key()?));
        }
        if p.eof() {
            break;
        }
        if p.peek_char() != Some('[') {
            p.expect('.')?;
        }
    }
    Ok(out)
}

/// Walk `tokens` from `root`; `None` when any step is missing.
pub fn lookup<'v>(root: &'v Value, tokens: &[PathToken]) -> Option<&'v Value> {
    tokens.iter().try_fold(root, |cur, token| match (cur, token) {
        (Value::Object(map), PathToken::Key(k)) => map.get(k),
        (Value::Array(items), PathToken::Index(i)) => items.get(*i),
        (Value::Array(items), PathToken::Key(k)) => k.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn syntax(input: &str, msg: impl std::fmt::Display) -> Error {
    Error::InvalidPath(format!("'{input}': {msg}"))
}

struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn parse_key(&mut self) -> Result<String> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '.' || c == '[' {
                break;
            }
            self.i += c.len_utf8();
        }
        if self.i == start {
            return Err(syntax(self.s, "key expected"));
        }
        Ok(self.s[start..self.i].to_string())
    }

    fn parse_index(&mut self) -> Result<usize> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.i += 1;
            } else {
                break;
            }
        }
        self.s[start..self.i]
            .parse::<usize>()
            .map_err(|_| syntax(self.s, "index expected"))
    }

    fn parse_quoted_string(&mut self) -> Result<String> {
        let quote = self.peek_char().ok_or_else(|| syntax(self.s, "string expected"))?;
        self.i += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                if let Some(nc) = self.peek_char() {
                    self.i += nc.len_utf8();
                    out.push(nc);
                }
            } else {
                out.push(c);
            }
        }
        Err(syntax(self.s, "unterminated string"))
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(syntax(self.s, format!("expected '{c}'")))
        }
    }

    fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_mixed_segments() {
        assert_eq!(
            parse_path("a.b[0]['c.d']").unwrap(),
            vec![
                PathToken::Key("a".into()),
                PathToken::Key("b".into()),
                PathToken::Index(0),
                PathToken::Key("c.d".into()),
            ]
        );
        assert_eq!(parse_path("x-y").unwrap(), vec![PathToken::Key("x-y".into())]);
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(parse_path("").is_err());
        assert!(parse_path("a..b").is_err());
        assert!(parse_path("a[x]").is_err());
        assert!(parse_path("a['b").is_err());
    }

    #[test]
    fn lookup_walks_objects_and_arrays() {
        let doc = json!({"a": {"b": [10, {"c.d": true}]}});
        let path = parse_path("a.b[1]['c.d']").unwrap();
        assert_eq!(lookup(&doc, &path), Some(&json!(true)));
        assert_eq!(lookup(&doc, &parse_path("a.b.0").unwrap()), Some(&json!(10)));
        assert_eq!(lookup(&doc, &parse_path("a.missing").unwrap()), None);
    }
}
