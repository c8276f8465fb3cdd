//! Types as the IR spells them (`int`, `java.lang.String`, `byte[][]`).

use crate::{ClassName, IrError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    StrumDisplay,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    /// Values of these types live on the operand stack as `int`.
    pub fn is_int_like(self) -> bool {
        matches!(
            self,
            PrimitiveType::Boolean
                | PrimitiveType::Byte
                | PrimitiveType::Char
                | PrimitiveType::Short
                | PrimitiveType::Int
        )
    }

    pub fn category(self) -> TypeCategory {
        match self {
            PrimitiveType::Long => TypeCategory::Long,
            PrimitiveType::Float => TypeCategory::Float,
            PrimitiveType::Double => TypeCategory::Double,
            _ => TypeCategory::Int,
        }
    }
}

/// Computational category of a value on the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Int,
    Long,
    Float,
    Double,
    Reference,
    Void,
}

impl TypeCategory {
    /// Number of local-variable / operand-stack slots a value occupies.
    pub fn width(self) -> u16 {
        match self {
            TypeCategory::Long | TypeCategory::Double => 2,
            TypeCategory::Void => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Type {
    Primitive(PrimitiveType),
    Void,
    /// Type of the `null` constant.
    Null,
    Class(ClassName),
    /// `base` is never itself an array; `dims` is at least one.
    Array { base: Box<Type>, dims: u8 },
    Unknown,
}

impl Type {
    pub const BOOLEAN: Type = Type::Primitive(PrimitiveType::Boolean);
    pub const BYTE: Type = Type::Primitive(PrimitiveType::Byte);
    pub const CHAR: Type = Type::Primitive(PrimitiveType::Char);
    pub const SHORT: Type = Type::Primitive(PrimitiveType::Short);
    pub const INT: Type = Type::Primitive(PrimitiveType::Int);
    pub const LONG: Type = Type::Primitive(PrimitiveType::Long);
    pub const FLOAT: Type = Type::Primitive(PrimitiveType::Float);
    pub const DOUBLE: Type = Type::Primitive(PrimitiveType::Double);

    pub fn class(name: impl Into<ClassName>) -> Self {
        Type::Class(name.into())
    }

    pub fn string() -> Self {
        Type::class(ClassName::STRING)
    }

    pub fn object() -> Self {
        Type::class(ClassName::OBJECT)
    }

    /// Array with `element` as its component type.
    pub fn array_of(element: Type) -> Self {
        match element {
            Type::Array { base, dims } => Type::Array {
                base,
                dims: dims + 1,
            },
            other => Type::Array {
                base: Box::new(other),
                dims: 1,
            },
        }
    }

    /// Component type of an array, `None` for anything else.
    pub fn element_type(&self) -> Option<Type> {
        match self {
            Type::Array { base, dims } if *dims > 1 => Some(Type::Array {
                base: base.clone(),
                dims: dims - 1,
            }),
            Type::Array { base, .. } => Some((**base).clone()),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Type::Primitive(prim) => Some(*prim),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Class(_) | Type::Array { .. } | Type::Null | Type::Unknown
        )
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn category(&self) -> TypeCategory {
        match self {
            Type::Primitive(prim) => prim.category(),
            Type::Void => TypeCategory::Void,
            Type::Null | Type::Class(_) | Type::Array { .. } | Type::Unknown => {
                TypeCategory::Reference
            }
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Type::Primitive(prim) => write!(f, "{}", prim),
            Type::Void => f.write_str("void"),
            Type::Null => f.write_str("null_type"),
            Type::Class(name) => write!(f, "{}", name),
            Type::Array { base, dims } => {
                write!(f, "{}", base)?;
                for _ in 0..*dims {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            Type::Unknown => f.write_str("unknown"),
        }
    }
}

impl FromStr for Type {
    type Err = IrError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut base = text.trim();
        let mut dims: u8 = 0;
        while let Some(stripped) = base.strip_suffix("[]") {
            base = stripped.trim_end();
            dims = dims.checked_add(1).ok_or_else(|| IrError::InvalidType {
                message: format!("too many array dimensions in {}", text),
            })?;
        }
        let parsed = match base {
            "void" if dims == 0 => Type::Void,
            "null_type" if dims == 0 => Type::Null,
            "unknown" if dims == 0 => Type::Unknown,
            "void" | "null_type" | "unknown" => {
                return Err(IrError::InvalidType {
                    message: format!("{} cannot be an array component", base),
                })
            }
            _ => match base.parse::<PrimitiveType>() {
                Ok(prim) => Type::Primitive(prim),
                Err(_) => {
                    if base.is_empty() || base.contains(char::is_whitespace) {
                        return Err(IrError::InvalidType {
                            message: format!("invalid type name {:?}", text),
                        });
                    }
                    Type::Class(ClassName::new(base))
                }
            },
        };
        if dims == 0 {
            Ok(parsed)
        } else {
            Ok(Type::Array {
                base: Box::new(parsed),
                dims,
            })
        }
    }
}

impl TryFrom<String> for Type {
    type Error = IrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_textual_type_tags() {
        assert_eq!("int".parse::<Type>().unwrap(), Type::INT);
        assert_eq!(
            "java.lang.String".parse::<Type>().unwrap(),
            Type::string()
        );
        assert_eq!(
            "byte[][]".parse::<Type>().unwrap(),
            Type::array_of(Type::array_of(Type::BYTE))
        );
        assert_eq!("null_type".parse::<Type>().unwrap(), Type::Null);
        assert!("void[]".parse::<Type>().is_err());
        assert!("".parse::<Type>().is_err());
    }

    #[test]
    fn array_element_peels_one_dimension() {
        let matrix: Type = "long[][]".parse().unwrap();
        assert_eq!(matrix.element_type(), Some(Type::array_of(Type::LONG)));
        assert_eq!(
            matrix.element_type().and_then(|row| row.element_type()),
            Some(Type::LONG)
        );
        assert_eq!(Type::INT.element_type(), None);
        assert_eq!(matrix.to_string(), "long[][]");
    }

    #[test]
    fn categories_follow_stack_representation() {
        assert_eq!(Type::BOOLEAN.category(), TypeCategory::Int);
        assert_eq!(Type::CHAR.category(), TypeCategory::Int);
        assert_eq!(Type::DOUBLE.category().width(), 2);
        assert_eq!(Type::string().category(), TypeCategory::Reference);
        assert_eq!(Type::Void.category().width(), 0);
    }
}
