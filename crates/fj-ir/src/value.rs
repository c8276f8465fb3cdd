use crate::{ClassName, Local, Symbol, Type};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum_macros::IntoStaticStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSignature {
    pub owner: ClassName,
    pub name: Symbol,
    pub ty: Type,
}

impl FieldSignature {
    pub fn new(owner: impl Into<ClassName>, name: impl Into<Symbol>, ty: Type) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ty,
        }
    }
}

impl Display for FieldSignature {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "<{}: {} {}>", self.owner, self.ty, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub owner: ClassName,
    pub name: Symbol,
    #[serde(default)]
    pub params: Vec<Type>,
    pub ret: Type,
}

impl MethodSignature {
    pub const CONSTRUCTOR: &'static str = "<init>";
    pub const STATIC_INITIALIZER: &'static str = "<clinit>";

    pub fn new(
        owner: impl Into<ClassName>,
        name: impl Into<Symbol>,
        params: Vec<Type>,
        ret: Type,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            params,
            ret,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name.as_str() == Self::CONSTRUCTOR
    }

    pub fn proto(&self) -> MethodProto {
        MethodProto {
            params: self.params.clone(),
            ret: self.ret.clone(),
        }
    }
}

impl Display for MethodSignature {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "<{}: {} {}({})>",
            self.owner,
            self.ret,
            self.name,
            self.params.iter().join(",")
        )
    }
}

/// Parameter and return types without an owner or name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodProto {
    #[serde(default)]
    pub params: Vec<Type>,
    pub ret: Type,
}

impl Display for MethodProto {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({}){}", self.params.iter().join(","), self.ret)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleTarget {
    Field(FieldSignature),
    Method(MethodSignature),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodHandle {
    pub kind: HandleKind,
    pub target: HandleTarget,
    #[serde(default)]
    pub is_interface: bool,
}

impl Display for MethodHandle {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let kind: &'static str = self.kind.into();
        match &self.target {
            HandleTarget::Field(field) => write!(f, "handle {} {}", kind, field),
            HandleTarget::Method(method) => write!(f, "handle {} {}", kind, method),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    /// A class literal; the payload is the referenced type.
    Class(Type),
    Null,
    MethodHandle(MethodHandle),
    MethodType(MethodProto),
}

impl Constant {
    pub fn ty(&self) -> Type {
        match self {
            Constant::Int(_) => Type::INT,
            Constant::Long(_) => Type::LONG,
            Constant::Float(_) => Type::FLOAT,
            Constant::Double(_) => Type::DOUBLE,
            Constant::Boolean(_) => Type::BOOLEAN,
            Constant::String(_) => Type::string(),
            Constant::Class(_) => Type::class(ClassName::CLASS),
            Constant::Null => Type::Null,
            Constant::MethodHandle(_) => Type::class("java.lang.invoke.MethodHandle"),
            Constant::MethodType(_) => Type::class("java.lang.invoke.MethodType"),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.into()
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Long(value) => write!(f, "{}L", value),
            Constant::Float(value) => write!(f, "{}F", value),
            Constant::Double(value) => write!(f, "{}", value),
            Constant::Boolean(value) => write!(f, "{}", value),
            Constant::String(value) => write!(f, "{:?}", value),
            Constant::Class(ty) => write!(f, "class {}", ty),
            Constant::Null => f.write_str("null"),
            Constant::MethodHandle(handle) => write!(f, "{}", handle),
            Constant::MethodType(proto) => write!(f, "methodtype {}", proto),
        }
    }
}

/// Operand of an expression: either a local or a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Immediate {
    Local(Local),
    Constant(Constant),
}

impl Immediate {
    pub fn ty(&self) -> Type {
        match self {
            Immediate::Local(local) => local.ty.clone(),
            Immediate::Constant(constant) => constant.ty(),
        }
    }

    pub fn as_local(&self) -> Option<&Local> {
        match self {
            Immediate::Local(local) => Some(local),
            Immediate::Constant(_) => None,
        }
    }

    pub fn int(value: i32) -> Self {
        Immediate::Constant(Constant::Int(value))
    }
}

impl From<Local> for Immediate {
    fn from(local: Local) -> Self {
        Immediate::Local(local)
    }
}

impl From<&Local> for Immediate {
    fn from(local: &Local) -> Self {
        Immediate::Local(local.clone())
    }
}

impl From<Constant> for Immediate {
    fn from(constant: Constant) -> Self {
        Immediate::Constant(constant)
    }
}

impl Display for Immediate {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Immediate::Local(local) => write!(f, "{}", local),
            Immediate::Constant(constant) => write!(f, "{}", constant),
        }
    }
}
