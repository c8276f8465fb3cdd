//! Identifier types shared by the IR.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A plain identifier: local, field and method names.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct Symbol {
    pub name: String,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol::new(name)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.name
    }
}

/// Fully qualified, dot separated class name (`java.lang.String`).
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    pub const OBJECT: &'static str = "java.lang.Object";
    pub const STRING: &'static str = "java.lang.String";
    pub const CLASS: &'static str = "java.lang.Class";
    pub const THROWABLE: &'static str = "java.lang.Throwable";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn object() -> Self {
        Self::new(Self::OBJECT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Slash separated form used inside class files (`java/lang/String`).
    pub fn internal_name(&self) -> String {
        self.0.replace('.', "/")
    }

    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl Display for ClassName {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        ClassName::new(name)
    }
}

impl From<String> for ClassName {
    fn from(name: String) -> Self {
        ClassName::new(name)
    }
}
