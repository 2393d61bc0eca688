//! Textual type descriptors
//!
//! Grammar: `Identifier ("<" Descriptor ("," Descriptor)* ">")?`, nestable.
//! Parsing tolerates whitespace around tokens; `Display` always writes the
//! canonical form (`Map<String,List<Int>>`) so persisted documents stay
//! diff-stable.

use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// A parsed, not yet resolved, type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Base type name
    pub name: String,
    /// Ordered generic arguments
    pub args: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// A descriptor without generic arguments
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A descriptor with generic arguments
    pub fn generic(name: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse descriptor text
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        };
        let descriptor = parser.descriptor()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(descriptor)
    }

    /// Canonical text form
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Replace every bare identifier found in `params` with the matching
    /// argument. Used to instantiate port templates such as `List<T>`.
    pub fn substitute(&self, params: &[String], args: &[TypeDescriptor]) -> TypeDescriptor {
        if self.args.is_empty() {
            if let Some(index) = params.iter().position(|p| *p == self.name) {
                if let Some(arg) = args.get(index) {
                    return arg.clone();
                }
            }
        }
        TypeDescriptor {
            name: self.name.clone(),
            args: self
                .args
                .iter()
                .map(|a| a.substitute(params, args))
                .collect(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeDescriptor {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn descriptor(&mut self) -> Result<TypeDescriptor> {
        let name = self.identifier()?;
        let mut args = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b'<') {
            self.pos += 1;
            loop {
                args.push(self.descriptor()?);
                self.skip_ws();
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b'>') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => return Err(self.error("expected ',' or '>'")),
                    None => return Err(self.error("unclosed '<'")),
                }
            }
        }
        Ok(TypeDescriptor { name, args })
    }

    fn identifier(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(b) = self.peek() {
            let valid = if self.pos == start {
                b.is_ascii_alphabetic() || b == b'_'
            } else {
                b.is_ascii_alphanumeric() || b == b'_'
            };
            if !valid {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, reason: &str) -> EngineError {
        EngineError::unresolved(self.text, format!("{} at offset {}", reason, self.pos))
    }
}
