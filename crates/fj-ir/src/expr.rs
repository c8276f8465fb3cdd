use crate::{ClassName, FieldSignature, Immediate, Local, MethodSignature, Type};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum_macros::IntoStaticStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    /// Three-way compare of two longs.
    Cmp,
    /// Three-way compare of floating values, NaN yields -1.
    Cmpl,
    /// Three-way compare of floating values, NaN yields 1.
    Cmpg,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Ushr => ">>>",
            BinOp::Cmp => "cmp",
            BinOp::Cmpl => "cmpl",
            BinOp::Cmpg => "cmpg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub op: CmpOp,
    pub lhs: Immediate,
    pub rhs: Immediate,
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.symbol(), self.rhs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRef {
    Instance { base: Local, field: FieldSignature },
    Static { field: FieldSignature },
}

impl FieldRef {
    pub fn field(&self) -> &FieldSignature {
        match self {
            FieldRef::Instance { field, .. } | FieldRef::Static { field } => field,
        }
    }

    pub fn base(&self) -> Option<&Local> {
        match self {
            FieldRef::Instance { base, .. } => Some(base),
            FieldRef::Static { .. } => None,
        }
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FieldRef::Instance { base, field } => write!(f, "{}.{}", base, field),
            FieldRef::Static { field } => write!(f, "{}", field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayRef {
    pub base: Local,
    pub index: Immediate,
}

impl ArrayRef {
    /// Element type read from or written to the array, when the base is an array.
    pub fn element_type(&self) -> Option<Type> {
        self.base.ty.element_type()
    }
}

impl Display for ArrayRef {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}[{}]", self.base, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvokeExpr {
    Static {
        method: MethodSignature,
        #[serde(default)]
        args: Vec<Immediate>,
    },
    Special {
        base: Local,
        method: MethodSignature,
        #[serde(default)]
        args: Vec<Immediate>,
    },
    Virtual {
        base: Local,
        method: MethodSignature,
        #[serde(default)]
        args: Vec<Immediate>,
    },
    Interface {
        base: Local,
        method: MethodSignature,
        #[serde(default)]
        args: Vec<Immediate>,
    },
    Dynamic {
        bootstrap: MethodSignature,
        #[serde(default)]
        bootstrap_args: Vec<Immediate>,
        method: MethodSignature,
        #[serde(default)]
        args: Vec<Immediate>,
    },
}

impl InvokeExpr {
    pub fn method(&self) -> &MethodSignature {
        match self {
            InvokeExpr::Static { method, .. }
            | InvokeExpr::Special { method, .. }
            | InvokeExpr::Virtual { method, .. }
            | InvokeExpr::Interface { method, .. }
            | InvokeExpr::Dynamic { method, .. } => method,
        }
    }

    pub fn args(&self) -> &[Immediate] {
        match self {
            InvokeExpr::Static { args, .. }
            | InvokeExpr::Special { args, .. }
            | InvokeExpr::Virtual { args, .. }
            | InvokeExpr::Interface { args, .. }
            | InvokeExpr::Dynamic { args, .. } => args,
        }
    }

    pub fn base(&self) -> Option<&Local> {
        match self {
            InvokeExpr::Special { base, .. }
            | InvokeExpr::Virtual { base, .. }
            | InvokeExpr::Interface { base, .. } => Some(base),
            InvokeExpr::Static { .. } | InvokeExpr::Dynamic { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.into()
    }
}

impl Display for InvokeExpr {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let args = self.args().iter().join(", ");
        match self {
            InvokeExpr::Static { method, .. } => write!(f, "staticinvoke {}({})", method, args),
            InvokeExpr::Special { base, method, .. } => {
                write!(f, "specialinvoke {}.{}({})", base, method, args)
            }
            InvokeExpr::Virtual { base, method, .. } => {
                write!(f, "virtualinvoke {}.{}({})", base, method, args)
            }
            InvokeExpr::Interface { base, method, .. } => {
                write!(f, "interfaceinvoke {}.{}({})", base, method, args)
            }
            InvokeExpr::Dynamic {
                bootstrap,
                bootstrap_args,
                method,
                ..
            } => write!(
                f,
                "dynamicinvoke {} {}({}) {}({})",
                method.name,
                method.proto(),
                args,
                bootstrap,
                bootstrap_args.iter().join(", ")
            ),
        }
    }
}

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Expr {
    Immediate(Immediate),
    Binary {
        op: BinOp,
        lhs: Immediate,
        rhs: Immediate,
    },
    Neg(Immediate),
    Cast {
        op: Immediate,
        ty: Type,
    },
    InstanceOf {
        op: Immediate,
        check: Type,
    },
    New(ClassName),
    NewArray {
        element: Type,
        size: Immediate,
    },
    /// `ty` is the full array type being created.
    NewMultiArray {
        ty: Type,
        sizes: Vec<Immediate>,
    },
    Length(Immediate),
    Invoke(InvokeExpr),
    Field(FieldRef),
    Array(ArrayRef),
    Phi(Vec<Local>),
}

impl Expr {
    pub fn kind_name(&self) -> &'static str {
        self.into()
    }

    /// Locals read while evaluating the expression.
    pub fn uses(&self) -> Vec<&Local> {
        let mut uses = Vec::new();
        match self {
            Expr::Immediate(op)
            | Expr::Neg(op)
            | Expr::Cast { op, .. }
            | Expr::InstanceOf { op, .. }
            | Expr::Length(op)
            | Expr::NewArray { size: op, .. } => uses.extend(op.as_local()),
            Expr::Binary { lhs, rhs, .. } => {
                uses.extend(lhs.as_local());
                uses.extend(rhs.as_local());
            }
            Expr::New(_) => {}
            Expr::NewMultiArray { sizes, .. } => {
                uses.extend(sizes.iter().filter_map(Immediate::as_local))
            }
            Expr::Invoke(invoke) => uses.extend(invoke_uses(invoke)),
            Expr::Field(field) => uses.extend(field.base()),
            Expr::Array(array) => {
                uses.push(&array.base);
                uses.extend(array.index.as_local());
            }
            Expr::Phi(locals) => uses.extend(locals.iter()),
        }
        uses
    }
}

pub(crate) fn invoke_uses(invoke: &InvokeExpr) -> Vec<&Local> {
    let mut uses: Vec<&Local> = invoke.base().into_iter().collect();
    uses.extend(invoke.args().iter().filter_map(Immediate::as_local));
    if let InvokeExpr::Dynamic { bootstrap_args, .. } = invoke {
        uses.extend(bootstrap_args.iter().filter_map(Immediate::as_local));
    }
    uses
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Expr::Immediate(op) => write!(f, "{}", op),
            Expr::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Expr::Neg(op) => write!(f, "neg {}", op),
            Expr::Cast { op, ty } => write!(f, "({}) {}", ty, op),
            Expr::InstanceOf { op, check } => write!(f, "{} instanceof {}", op, check),
            Expr::New(class) => write!(f, "new {}", class),
            Expr::NewArray { element, size } => write!(f, "newarray ({})[{}]", element, size),
            Expr::NewMultiArray { ty, sizes } => {
                write!(f, "newmultiarray ({})", ty)?;
                for size in sizes {
                    write!(f, "[{}]", size)?;
                }
                Ok(())
            }
            Expr::Length(op) => write!(f, "lengthof {}", op),
            Expr::Invoke(invoke) => write!(f, "{}", invoke),
            Expr::Field(field) => write!(f, "{}", field),
            Expr::Array(array) => write!(f, "{}", array),
            Expr::Phi(locals) => write!(f, "Phi({})", locals.iter().join(", ")),
        }
    }
}

/// Right-hand side of an identity statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityRef {
    This,
    Parameter { index: u16, ty: Type },
    CaughtException,
}

impl Display for IdentityRef {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            IdentityRef::This => f.write_str("@this"),
            IdentityRef::Parameter { index, ty } => write!(f, "@parameter{}: {}", index, ty),
            IdentityRef::CaughtException => f.write_str("@caughtexception"),
        }
    }
}

/// Assignment destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LValue {
    Local(Local),
    Field(FieldRef),
    Array(ArrayRef),
}

impl LValue {
    pub fn as_local(&self) -> Option<&Local> {
        match self {
            LValue::Local(local) => Some(local),
            LValue::Field(_) | LValue::Array(_) => None,
        }
    }
}

impl Display for LValue {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            LValue::Local(local) => write!(f, "{}", local),
            LValue::Field(field) => write!(f, "{}", field),
            LValue::Array(array) => write!(f, "{}", array),
        }
    }
}
