use crate::Opcode;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque branch target handed out by a [`crate::MethodAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(pub u32);

impl Display for Label {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// `newarray` operand codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ArrayKind {
    Boolean = 4,
    Char = 5,
    Float = 6,
    Double = 7,
    Byte = 8,
    Short = 9,
    Int = 10,
    Long = 11,
}

impl ArrayKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            4 => ArrayKind::Boolean,
            5 => ArrayKind::Char,
            6 => ArrayKind::Float,
            7 => ArrayKind::Double,
            8 => ArrayKind::Byte,
            9 => ArrayKind::Short,
            10 => ArrayKind::Int,
            11 => ArrayKind::Long,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ArrayKind::Boolean => "boolean",
            ArrayKind::Char => "char",
            ArrayKind::Float => "float",
            ArrayKind::Double => "double",
            ArrayKind::Byte => "byte",
            ArrayKind::Short => "short",
            ArrayKind::Int => "int",
            ArrayKind::Long => "long",
        }
    }
}

/// Reference kinds of a method handle constant (`REF_getField` = 1 ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HandleTag {
    GetField = 1,
    GetStatic = 2,
    PutField = 3,
    PutStatic = 4,
    InvokeVirtual = 5,
    InvokeStatic = 6,
    InvokeSpecial = 7,
    NewInvokeSpecial = 8,
    InvokeInterface = 9,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    pub tag: HandleTag,
    pub owner: String,
    pub name: String,
    pub desc: String,
    pub interface: bool,
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}:{}.{}{}",
            self.tag as u8, self.owner, self.name, self.desc
        )
    }
}

/// Loadable constant: `ldc` operands and bootstrap-method arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LdcConst {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    /// Class literal, given as a descriptor or internal name.
    Type(String),
    MethodType(String),
    Handle(Handle),
}

impl LdcConst {
    pub fn width(&self) -> u16 {
        match self {
            LdcConst::Long(_) | LdcConst::Double(_) => 2,
            _ => 1,
        }
    }
}

impl Display for LdcConst {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            LdcConst::Int(value) => write!(f, "{}", value),
            LdcConst::Long(value) => write!(f, "{}L", value),
            LdcConst::Float(value) => write!(f, "{:?}F", value),
            LdcConst::Double(value) => write!(f, "{:?}D", value),
            LdcConst::Str(value) => write!(f, "{:?}", value),
            LdcConst::Type(desc) => write!(f, "{}", desc),
            LdcConst::MethodType(desc) => write!(f, "{}", desc),
            LdcConst::Handle(handle) => write!(f, "{}", handle),
        }
    }
}

/// One entry of a method's instruction list. Labels and line numbers are
/// pseudo-instructions that occupy no code bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Insn {
    Simple(Opcode),
    /// `bipush`, `sipush` and `newarray`.
    Int {
        op: Opcode,
        operand: i32,
    },
    Var {
        op: Opcode,
        slot: u16,
    },
    /// `new`, `anewarray`, `checkcast` and `instanceof`.
    Type {
        op: Opcode,
        internal_name: String,
    },
    Field {
        op: Opcode,
        owner: String,
        name: String,
        desc: String,
    },
    Method {
        op: Opcode,
        owner: String,
        name: String,
        desc: String,
        interface: bool,
    },
    InvokeDynamic {
        name: String,
        desc: String,
        bootstrap: Handle,
        args: Vec<LdcConst>,
    },
    Jump {
        op: Opcode,
        target: Label,
    },
    Ldc(LdcConst),
    TableSwitch {
        min: i32,
        max: i32,
        default: Label,
        labels: Vec<Label>,
    },
    LookupSwitch {
        default: Label,
        keys: Vec<i32>,
        labels: Vec<Label>,
    },
    MultiANewArray {
        desc: String,
        dims: u8,
    },
    Label(Label),
    LineNumber {
        line: u32,
        start: Label,
    },
}

impl Insn {
    pub fn opcode(&self) -> Option<Opcode> {
        Some(match self {
            Insn::Simple(op)
            | Insn::Int { op, .. }
            | Insn::Var { op, .. }
            | Insn::Type { op, .. }
            | Insn::Field { op, .. }
            | Insn::Method { op, .. }
            | Insn::Jump { op, .. } => *op,
            Insn::InvokeDynamic { .. } => Opcode::Invokedynamic,
            Insn::Ldc(_) => Opcode::Ldc,
            Insn::TableSwitch { .. } => Opcode::Tableswitch,
            Insn::LookupSwitch { .. } => Opcode::Lookupswitch,
            Insn::MultiANewArray { .. } => Opcode::Multianewarray,
            Insn::Label(_) | Insn::LineNumber { .. } => return None,
        })
    }

    /// Labels this instruction may transfer control to.
    pub fn targets(&self) -> Vec<Label> {
        match self {
            Insn::Jump { target, .. } => vec![*target],
            Insn::TableSwitch {
                default, labels, ..
            }
            | Insn::LookupSwitch {
                default, labels, ..
            } => labels
                .iter()
                .copied()
                .chain(std::iter::once(*default))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Exception-table entry. `exception` is an internal name, `None` catches
/// everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TryCatch {
    pub start: Label,
    pub end: Label,
    pub handler: Label,
    pub exception: Option<String>,
}
