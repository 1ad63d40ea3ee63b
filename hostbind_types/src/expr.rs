use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Scalar types that cross the boundary by value.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Text,
}

impl ScalarType {
    pub const ALL: [ScalarType; 12] = [
        ScalarType::Bool,
        ScalarType::I8,
        ScalarType::I16,
        ScalarType::I32,
        ScalarType::I64,
        ScalarType::U8,
        ScalarType::U16,
        ScalarType::U32,
        ScalarType::U64,
        ScalarType::F32,
        ScalarType::F64,
        ScalarType::Text,
    ];

    /// Keyword spelling in the native type-expression grammar.
    pub fn keyword(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
            ScalarType::Text => "String",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scalar| scalar.keyword() == word)
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, ScalarType::Bool | ScalarType::F32 | ScalarType::F64 | ScalarType::Text)
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }
}

/// A native type as written in a package description.
///
/// The textual form produced by `Display` is canonical: two expressions
/// denote the same native type exactly when their canonical texts are equal.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
#[serde(try_from = "String", into = "String")]
pub enum TypeExpr {
    Scalar(ScalarType),
    /// The failure indicator (`error`), legal only in result lists.
    Error,
    /// A declared type, either bare (`Foo`) or path-qualified (`other::Foo`).
    Named(String),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Array(Box<TypeExpr>, u64),
    Function {
        params: Vec<TypeExpr>,
        result: Option<Box<TypeExpr>>,
    },
}

impl TypeExpr {
    pub fn is_error(&self) -> bool {
        matches!(self, TypeExpr::Error)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, TypeExpr::Function { .. })
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Scalar(scalar) => f.write_str(scalar.keyword()),
            TypeExpr::Error => f.write_str("error"),
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Pointer(inner) => write!(f, "Box<{}>", inner),
            TypeExpr::Slice(inner) => write!(f, "Vec<{}>", inner),
            TypeExpr::Map(key, value) => write!(f, "HashMap<{}, {}>", key, value),
            TypeExpr::Array(inner, len) => write!(f, "[{}; {}]", inner, len),
            TypeExpr::Function { params, result } => {
                f.write_str("fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                f.write_str(")")?;
                if let Some(result) = result {
                    write!(f, " -> {}", result)?;
                }
                Ok(())
            }
        }
    }
}

/// Errors raised while parsing a native type expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    /// The expression was empty or only whitespace.
    #[error("empty type expression")]
    Empty,

    /// A token did not match what the grammar allows at that position.
    #[error("expected {expected} at offset {offset} in `{text}`, found {found}")]
    Unexpected {
        text: String,
        offset: usize,
        expected: &'static str,
        found: String,
    },

    /// A complete type was parsed but input remained.
    #[error("unexpected trailing input at offset {offset} in `{text}`")]
    Trailing { text: String, offset: usize },

    /// An array length did not fit in 64 bits.
    #[error("array length at offset {offset} in `{text}` is out of range")]
    InvalidLength { text: String, offset: usize },
}

impl FromStr for TypeExpr {
    type Err = TypeParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.trim().is_empty() {
            return Err(TypeParseError::Empty);
        }
        let mut parser = Parser { text, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos < text.len() {
            return Err(TypeParseError::Trailing {
                text: text.to_string(),
                offset: parser.pos,
            });
        }
        Ok(ty)
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, TypeParseError> {
        value.parse()
    }
}

impl From<TypeExpr> for String {
    fn from(value: TypeExpr) -> Self {
        value.to_string()
    }
}

/* Recursive descent over the raw text; offsets are byte offsets into it */
struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &'static str) -> Result<(), TypeParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(token))
        }
    }

    fn unexpected(&self, expected: &'static str) -> TypeParseError {
        let found = match self.rest().chars().next() {
            Some(c) => format!("`{}`", c),
            None => "end of input".to_string(),
        };
        TypeParseError::Unexpected {
            text: self.text.to_string(),
            offset: self.pos,
            expected,
            found,
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    /* `a::b::C`, no whitespace inside a segment */
    fn path(&mut self) -> Result<&'a str, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        if self.ident().is_none() {
            return Err(self.unexpected("a type name"));
        }
        while self.rest().starts_with("::") {
            self.pos += 2;
            if self.ident().is_none() {
                return Err(self.unexpected("a path segment"));
            }
        }
        Ok(&self.text[start..self.pos])
    }

    fn parse_type(&mut self) -> Result<TypeExpr, TypeParseError> {
        self.skip_ws();
        if self.eat("[") {
            let elem = self.parse_type()?;
            self.expect(";")?;
            let len = self.parse_length()?;
            self.expect("]")?;
            return Ok(TypeExpr::Array(Box::new(elem), len));
        }

        let name = self.path()?;
        match name {
            "fn" => self.parse_function(),
            "Box" => Ok(TypeExpr::Pointer(Box::new(self.parse_generic1()?))),
            "Vec" => Ok(TypeExpr::Slice(Box::new(self.parse_generic1()?))),
            "HashMap" => {
                self.expect("<")?;
                let key = self.parse_type()?;
                self.expect(",")?;
                let value = self.parse_type()?;
                self.expect(">")?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            "error" => Ok(TypeExpr::Error),
            other => match ScalarType::from_keyword(other) {
                Some(scalar) => Ok(TypeExpr::Scalar(scalar)),
                None => Ok(TypeExpr::Named(other.to_string())),
            },
        }
    }

    fn parse_generic1(&mut self) -> Result<TypeExpr, TypeParseError> {
        self.expect("<")?;
        let inner = self.parse_type()?;
        self.expect(">")?;
        Ok(inner)
    }

    fn parse_function(&mut self) -> Result<TypeExpr, TypeParseError> {
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.eat(")") {
            loop {
                params.push(self.parse_type()?);
                if self.eat(")") {
                    break;
                }
                self.expect(",")?;
            }
        }
        let result = if self.eat("->") {
            Some(Box::new(self.parse_type()?))
        } else {
            None
        };
        Ok(TypeExpr::Function { params, result })
    }

    fn parse_length(&mut self) -> Result<u64, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        let digits = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(self.unexpected("an array length"));
        }
        self.pos += digits;
        self.text[start..self.pos]
            .parse()
            .map_err(|_| TypeParseError::InvalidLength {
                text: self.text.to_string(),
                offset: start,
            })
    }
}
