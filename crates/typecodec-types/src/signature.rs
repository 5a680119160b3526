//! Parsing of Java-like type signatures into [`TypeExpr`].
//!
//! Used by the model loader and throughout the tests:
//!
//! ```ignore
//! let ty = parse_type(&table, "java.util.Map<String, List<? extends Number>>")?;
//! ```
//!
//! Names resolve as follows: a single identifier is first looked up among
//! the type variables in scope, then among primitives and fully qualified
//! names, then by unique simple name. Dotted names must be fully qualified.
//! After a type argument list, `.Inner<..>` selects a nested class of the
//! preceding type.

use crate::def::{ClassId, ClassTable};
use crate::types::{TypeExpr, TypeVar};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureError {
    /// Byte offset in the signature text.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for SignatureError {}

/// Parse a signature with no type variables in scope.
pub fn parse_type(table: &ClassTable, text: &str) -> Result<TypeExpr, SignatureError> {
    parse_type_in(table, text, &[])
}

/// Parse a signature that may mention the variables in `scope`.
pub fn parse_type_in(
    table: &ClassTable,
    text: &str,
    scope: &[TypeVar],
) -> Result<TypeExpr, SignatureError> {
    let mut parser = SignatureParser {
        table,
        scope,
        src: text,
        pos: 0,
    };
    let ty = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos != text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(ty)
}

struct SignatureParser<'a> {
    table: &'a ClassTable,
    scope: &'a [TypeVar],
    src: &'a str,
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn error(&self, message: impl Into<String>) -> SignatureError {
        SignatureError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), SignatureError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn ident(&mut self) -> Result<&'a str, SignatureError> {
        self.skip_ws();
        let rest = &self.src[self.pos..];
        let len = rest
            .char_indices()
            .find(|&(i, c)| {
                !(c == '_' || c == '$' || c.is_alphabetic() || (i > 0 && c.is_ascii_digit()))
            })
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    /// Peek for `keyword` as a whole word and consume it.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = &self.src[self.pos..];
        let followed_by_ident = rest[keyword.len().min(rest.len())..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if rest.starts_with(keyword) && !followed_by_ident {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Result<TypeExpr, SignatureError> {
        let mut ty = self.parse_element_type()?;
        while self.eat('[') {
            self.expect(']')?;
            ty = TypeExpr::array(ty);
        }
        Ok(ty)
    }

    fn parse_element_type(&mut self) -> Result<TypeExpr, SignatureError> {
        let start = self.pos;
        let mut segments = vec![self.ident()?];
        while self.peek() == Some('.') {
            let save = self.pos;
            self.pos += 1;
            match self.ident() {
                Ok(segment) => segments.push(segment),
                Err(_) => {
                    self.pos = save;
                    break;
                }
            }
        }

        if let [single] = segments.as_slice() {
            if let Some(var) = self.scope.iter().find(|v| &*v.name == *single) {
                return Ok(TypeExpr::Variable(var.clone()));
            }
        }

        let name = segments.join(".");
        let class = self
            .table
            .lookup(&name)
            .or_else(|| match segments.as_slice() {
                [single] => self.table.lookup_simple(single),
                _ => None,
            })
            .ok_or_else(|| SignatureError {
                offset: start,
                message: format!("unknown type '{name}'"),
            })?;

        let mut ty = self.parse_arguments(class, None)?;
        while self.eat('.') {
            let simple = self.ident()?;
            let nested_name = format!("{}.{}", self.table.name(class_of(&ty)), simple);
            let nested = self
                .table
                .lookup(&nested_name)
                .ok_or_else(|| self.error(format!("unknown nested type '{nested_name}'")))?;
            let outer = if self.table.is_inner_class(nested) {
                Some(ty)
            } else {
                None
            };
            ty = self.parse_arguments(nested, outer)?;
        }
        Ok(ty)
    }

    fn parse_arguments(
        &mut self,
        class: ClassId,
        outer: Option<TypeExpr>,
    ) -> Result<TypeExpr, SignatureError> {
        if !self.eat('<') {
            return Ok(match outer {
                Some(outer @ TypeExpr::Parameterized(_)) => TypeExpr::inner(outer, class, Vec::new()),
                _ => TypeExpr::Raw(class),
            });
        }
        let mut args = vec![self.parse_argument()?];
        while self.eat(',') {
            args.push(self.parse_argument()?);
        }
        self.expect('>')?;
        let expected = self.table.class(class).type_params.len();
        if args.len() != expected {
            return Err(self.error(format!(
                "'{}' expects {expected} type arguments, found {}",
                self.table.name(class),
                args.len()
            )));
        }
        Ok(match outer {
            Some(outer) => TypeExpr::inner(outer, class, args),
            None => TypeExpr::parameterized(class, args),
        })
    }

    fn parse_argument(&mut self) -> Result<TypeExpr, SignatureError> {
        if !self.eat('?') {
            return self.parse_type();
        }
        if self.eat_keyword("extends") {
            let mut bounds = vec![self.parse_type()?];
            while self.eat('&') {
                bounds.push(self.parse_type()?);
            }
            Ok(TypeExpr::wildcard(bounds, Vec::new()))
        } else if self.eat_keyword("super") {
            Ok(TypeExpr::super_of(self.parse_type()?))
        } else {
            Ok(TypeExpr::unbounded_wildcard())
        }
    }
}

fn class_of(ty: &TypeExpr) -> ClassId {
    match ty {
        TypeExpr::Parameterized(p) => p.raw,
        TypeExpr::Raw(id) => *id,
        // Only class types reach the nested-name loop.
        _ => crate::def::well_known::OBJECT,
    }
}

#[cfg(test)]
#[path = "../tests/signature_tests.rs"]
mod signature_tests;
