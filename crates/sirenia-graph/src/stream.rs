//! Field-tagged token streams consumed by the [`GraphSerializer`](crate::GraphSerializer).
//!
//! The serializer only sees an ordered sequence of nullable, numbered fields with explicit record
//! framing. [`TokenWriter`] and [`TokenReader`] are an in-memory rendition of that stream which can
//! be stored as JSON.

use crate::attribute::AttrValue;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io;

pub trait GraphWriter {
    /// Opens a structured record in `field`.
    fn start_element(&mut self, field: u32) -> Result<()>;
    /// Closes the innermost open record.
    fn end_element(&mut self) -> Result<()>;
    fn write_null(&mut self, field: u32) -> Result<()>;
    fn write_int(&mut self, field: u32, value: i64) -> Result<()>;
    fn write_string(&mut self, field: u32, value: &str) -> Result<()>;
    fn write_object(&mut self, field: u32, value: &AttrValue, is_reference: bool) -> Result<()>;
}

/// Cursor over a field stream. Predicates look at the next field without consuming it.
pub trait GraphReader {
    fn is_field_null(&mut self) -> Result<bool>;
    fn is_field_numeric(&mut self) -> Result<bool>;
    fn is_field_object(&mut self) -> Result<bool>;
    /// `false` at the end of the current record or of the stream.
    fn has_next_field(&mut self) -> Result<bool>;
    fn read_number(&mut self) -> Result<i64>;
    fn read_string(&mut self) -> Result<String>;
    fn read_object(&mut self) -> Result<AttrValue>;
    /// Enters the record in the next field.
    fn start_object(&mut self) -> Result<()>;
    /// Leaves the current record; remaining fields must have been consumed.
    fn end_object(&mut self) -> Result<()>;
    /// Consumes the next field, including a whole nested record.
    fn skip(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Token {
    Start {
        field: u32,
    },
    End,
    Null {
        field: u32,
    },
    Int {
        field: u32,
        value: i64,
    },
    Str {
        field: u32,
        value: String,
    },
    Value {
        field: u32,
        value: AttrValue,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        reference: bool,
    },
}

impl Token {
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Start { .. } => "start",
            Token::End => "end",
            Token::Null { .. } => "null",
            Token::Int { .. } => "int",
            Token::Str { .. } => "string",
            Token::Value { .. } => "value",
        }
    }

    pub fn field(&self) -> Option<u32> {
        match self {
            Token::End => None,
            Token::Start { field }
            | Token::Null { field }
            | Token::Int { field, .. }
            | Token::Str { field, .. }
            | Token::Value { field, .. } => Some(*field),
        }
    }
}

/// Collects written fields as [`Token`]s.
#[derive(Debug, Clone, Default)]
pub struct TokenWriter {
    tokens: Vec<Token>,
    open: usize,
}

impl TokenWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.tokens)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.tokens)?)
    }

    pub fn write_json_to<W: io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &self.tokens).map_err(json_error)
    }
}

impl GraphWriter for TokenWriter {
    fn start_element(&mut self, field: u32) -> Result<()> {
        self.open += 1;
        self.tokens.push(Token::Start { field });
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        if self.open == 0 {
            return Err(Error::UnexpectedToken {
                expected: "open record",
                found: "end".to_string(),
            });
        }
        self.open -= 1;
        self.tokens.push(Token::End);
        Ok(())
    }

    fn write_null(&mut self, field: u32) -> Result<()> {
        self.tokens.push(Token::Null { field });
        Ok(())
    }

    fn write_int(&mut self, field: u32, value: i64) -> Result<()> {
        self.tokens.push(Token::Int { field, value });
        Ok(())
    }

    fn write_string(&mut self, field: u32, value: &str) -> Result<()> {
        self.tokens.push(Token::Str {
            field,
            value: value.to_string(),
        });
        Ok(())
    }

    fn write_object(&mut self, field: u32, value: &AttrValue, is_reference: bool) -> Result<()> {
        self.tokens.push(Token::Value {
            field,
            value: value.clone(),
            reference: is_reference,
        });
        Ok(())
    }
}

/// Reads a [`Token`] sequence.
#[derive(Debug, Clone, Default)]
pub struct TokenReader {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

fn json_error(e: serde_json::Error) -> Error {
    if e.is_io() {
        Error::Io(e.into())
    } else {
        Error::Json(e)
    }
}

impl TokenReader {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_json_reader<R: io::Read>(reader: R) -> Result<Self> {
        let tokens: Vec<Token> = serde_json::from_reader(reader).map_err(json_error)?;
        Ok(Self::new(tokens))
    }

    /// Number of tokens not consumed yet.
    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    fn peek(&self) -> Result<&Token> {
        self.tokens.get(self.pos).ok_or(Error::UnexpectedEnd)
    }

    fn next(&mut self) -> Result<Token> {
        let t = self.tokens.get(self.pos).cloned().ok_or(Error::UnexpectedEnd)?;
        self.pos += 1;
        Ok(t)
    }

    fn unexpected(expected: &'static str, found: &Token) -> Error {
        Error::UnexpectedToken {
            expected,
            found: found.kind().to_string(),
        }
    }
}

impl GraphReader for TokenReader {
    fn is_field_null(&mut self) -> Result<bool> {
        Ok(matches!(self.peek()?, Token::Null { .. }))
    }

    fn is_field_numeric(&mut self) -> Result<bool> {
        Ok(matches!(self.peek()?, Token::Int { .. }))
    }

    fn is_field_object(&mut self) -> Result<bool> {
        Ok(matches!(self.peek()?, Token::Start { .. }))
    }

    fn has_next_field(&mut self) -> Result<bool> {
        match self.tokens.get(self.pos) {
            None if self.depth == 0 => Ok(false),
            None => Err(Error::UnexpectedEnd),
            Some(Token::End) => Ok(false),
            Some(_) => Ok(true),
        }
    }

    fn read_number(&mut self) -> Result<i64> {
        match self.next()? {
            Token::Int { value, .. } => Ok(value),
            other => Err(Self::unexpected("int", &other)),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        match self.next()? {
            Token::Str { value, .. } => Ok(value),
            other => Err(Self::unexpected("string", &other)),
        }
    }

    fn read_object(&mut self) -> Result<AttrValue> {
        match self.next()? {
            Token::Value { value, .. } => Ok(value),
            other => Err(Self::unexpected("value", &other)),
        }
    }

    fn start_object(&mut self) -> Result<()> {
        match self.next()? {
            Token::Start { .. } => {
                self.depth += 1;
                Ok(())
            }
            other => Err(Self::unexpected("start", &other)),
        }
    }

    fn end_object(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::UnexpectedToken {
                expected: "open record",
                found: self.peek().map(Token::kind).unwrap_or("end of stream").to_string(),
            });
        }
        match self.next()? {
            Token::End => {
                self.depth -= 1;
                Ok(())
            }
            other => Err(Self::unexpected("end", &other)),
        }
    }

    fn skip(&mut self) -> Result<()> {
        match self.next()? {
            Token::Start { .. } => {
                let mut nested = 1usize;
                while nested > 0 {
                    match self.next()? {
                        Token::Start { .. } => nested += 1,
                        Token::End => nested -= 1,
                        _ => {}
                    }
                }
                Ok(())
            }
            Token::End => Err(Error::UnexpectedToken {
                expected: "field",
                found: "end".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_reader_skip_consumes_nested_records() {
        let mut r = TokenReader::new(vec![
            Token::Start { field: 1 },
            Token::Int { field: 1, value: 7 },
            Token::Start { field: 2 },
            Token::End,
            Token::End,
            Token::Str {
                field: 2,
                value: "after".into(),
            },
        ]);
        r.skip().unwrap();
        assert_eq!(r.read_string().unwrap(), "after");
        assert!(!r.has_next_field().unwrap());
    }

    #[test]
    fn token_reader_has_next_field_stops_at_record_end() {
        let mut r = TokenReader::new(vec![
            Token::Start { field: 1 },
            Token::Int { field: 1, value: 1 },
            Token::End,
        ]);
        r.start_object().unwrap();
        assert!(r.has_next_field().unwrap());
        assert_eq!(r.read_number().unwrap(), 1);
        assert!(!r.has_next_field().unwrap());
        r.end_object().unwrap();
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn token_reader_reports_truncation_inside_record() {
        let mut r = TokenReader::new(vec![Token::Start { field: 1 }]);
        r.start_object().unwrap();
        assert!(matches!(r.has_next_field(), Err(Error::UnexpectedEnd)));
    }

    #[test]
    fn token_json_uses_kind_tag() {
        let mut w = TokenWriter::new();
        w.start_element(1).unwrap();
        w.write_object(2, &AttrValue::Int(3), false).unwrap();
        w.end_element().unwrap();
        let v: serde_json::Value = serde_json::from_str(&w.to_json().unwrap()).unwrap();
        assert_eq!(
            v,
            serde_json::json!([
                {"kind": "start", "field": 1},
                {"kind": "value", "field": 2, "value": {"int": 3}},
                {"kind": "end"}
            ])
        );
    }

    #[test]
    fn token_writer_rejects_unbalanced_end() {
        let mut w = TokenWriter::new();
        assert!(w.end_element().is_err());
    }
}
