//! Opcode selection by type category.

use crate::error::{LowerError, Result};
use fj_asm::{ArrayKind, Opcode};
use fj_ir::{BinOp, CmpOp, PrimitiveType, Type, TypeCategory};

pub fn load(ty: &Type) -> Result<Opcode> {
    match ty.category() {
        TypeCategory::Int => Ok(Opcode::Iload),
        TypeCategory::Long => Ok(Opcode::Lload),
        TypeCategory::Float => Ok(Opcode::Fload),
        TypeCategory::Double => Ok(Opcode::Dload),
        TypeCategory::Reference => Ok(Opcode::Aload),
        TypeCategory::Void => Err(LowerError::unsupported("type", "load of a void value")),
    }
}

pub fn store(ty: &Type) -> Result<Opcode> {
    match ty.category() {
        TypeCategory::Int => Ok(Opcode::Istore),
        TypeCategory::Long => Ok(Opcode::Lstore),
        TypeCategory::Float => Ok(Opcode::Fstore),
        TypeCategory::Double => Ok(Opcode::Dstore),
        TypeCategory::Reference => Ok(Opcode::Astore),
        TypeCategory::Void => Err(LowerError::unsupported("type", "store of a void value")),
    }
}

pub fn ret(ty: &Type) -> Opcode {
    match ty.category() {
        TypeCategory::Int => Opcode::Ireturn,
        TypeCategory::Long => Opcode::Lreturn,
        TypeCategory::Float => Opcode::Freturn,
        TypeCategory::Double => Opcode::Dreturn,
        TypeCategory::Reference => Opcode::Areturn,
        TypeCategory::Void => Opcode::Return,
    }
}

pub fn array_load(element: &Type) -> Opcode {
    match element {
        Type::Primitive(PrimitiveType::Boolean | PrimitiveType::Byte) => Opcode::Baload,
        Type::Primitive(PrimitiveType::Char) => Opcode::Caload,
        Type::Primitive(PrimitiveType::Short) => Opcode::Saload,
        Type::Primitive(PrimitiveType::Int) => Opcode::Iaload,
        Type::Primitive(PrimitiveType::Long) => Opcode::Laload,
        Type::Primitive(PrimitiveType::Float) => Opcode::Faload,
        Type::Primitive(PrimitiveType::Double) => Opcode::Daload,
        _ => Opcode::Aaload,
    }
}

pub fn array_store(element: &Type) -> Opcode {
    match element {
        Type::Primitive(PrimitiveType::Boolean | PrimitiveType::Byte) => Opcode::Bastore,
        Type::Primitive(PrimitiveType::Char) => Opcode::Castore,
        Type::Primitive(PrimitiveType::Short) => Opcode::Sastore,
        Type::Primitive(PrimitiveType::Int) => Opcode::Iastore,
        Type::Primitive(PrimitiveType::Long) => Opcode::Lastore,
        Type::Primitive(PrimitiveType::Float) => Opcode::Fastore,
        Type::Primitive(PrimitiveType::Double) => Opcode::Dastore,
        _ => Opcode::Aastore,
    }
}

pub fn array_kind(prim: PrimitiveType) -> ArrayKind {
    match prim {
        PrimitiveType::Boolean => ArrayKind::Boolean,
        PrimitiveType::Byte => ArrayKind::Byte,
        PrimitiveType::Char => ArrayKind::Char,
        PrimitiveType::Short => ArrayKind::Short,
        PrimitiveType::Int => ArrayKind::Int,
        PrimitiveType::Long => ArrayKind::Long,
        PrimitiveType::Float => ArrayKind::Float,
        PrimitiveType::Double => ArrayKind::Double,
    }
}

pub fn pop(ty: &Type) -> Option<Opcode> {
    match ty.category().width() {
        0 => None,
        1 => Some(Opcode::Pop),
        _ => Some(Opcode::Pop2),
    }
}

pub fn binary(op: BinOp, category: TypeCategory) -> Result<Opcode> {
    use TypeCategory::{Double, Float, Int, Long};
    let opcode = match (op, category) {
        (BinOp::Add, Int) => Opcode::Iadd,
        (BinOp::Add, Long) => Opcode::Ladd,
        (BinOp::Add, Float) => Opcode::Fadd,
        (BinOp::Add, Double) => Opcode::Dadd,
        (BinOp::Sub, Int) => Opcode::Isub,
        (BinOp::Sub, Long) => Opcode::Lsub,
        (BinOp::Sub, Float) => Opcode::Fsub,
        (BinOp::Sub, Double) => Opcode::Dsub,
        (BinOp::Mul, Int) => Opcode::Imul,
        (BinOp::Mul, Long) => Opcode::Lmul,
        (BinOp::Mul, Float) => Opcode::Fmul,
        (BinOp::Mul, Double) => Opcode::Dmul,
        (BinOp::Div, Int) => Opcode::Idiv,
        (BinOp::Div, Long) => Opcode::Ldiv,
        (BinOp::Div, Float) => Opcode::Fdiv,
        (BinOp::Div, Double) => Opcode::Ddiv,
        (BinOp::Rem, Int) => Opcode::Irem,
        (BinOp::Rem, Long) => Opcode::Lrem,
        (BinOp::Rem, Float) => Opcode::Frem,
        (BinOp::Rem, Double) => Opcode::Drem,
        (BinOp::And, Int) => Opcode::Iand,
        (BinOp::And, Long) => Opcode::Land,
        (BinOp::Or, Int) => Opcode::Ior,
        (BinOp::Or, Long) => Opcode::Lor,
        (BinOp::Xor, Int) => Opcode::Ixor,
        (BinOp::Xor, Long) => Opcode::Lxor,
        (BinOp::Shl, Int) => Opcode::Ishl,
        (BinOp::Shl, Long) => Opcode::Lshl,
        (BinOp::Shr, Int) => Opcode::Ishr,
        (BinOp::Shr, Long) => Opcode::Lshr,
        (BinOp::Ushr, Int) => Opcode::Iushr,
        (BinOp::Ushr, Long) => Opcode::Lushr,
        (BinOp::Cmp, Long) => Opcode::Lcmp,
        (BinOp::Cmpl, Float) => Opcode::Fcmpl,
        (BinOp::Cmpl, Double) => Opcode::Dcmpl,
        (BinOp::Cmpg, Float) => Opcode::Fcmpg,
        (BinOp::Cmpg, Double) => Opcode::Dcmpg,
        (op, category) => {
            return Err(LowerError::unsupported(
                "operator",
                format!("`{}` on {:?} operands", op.symbol(), category),
            ))
        }
    };
    Ok(opcode)
}

pub fn neg(category: TypeCategory) -> Result<Opcode> {
    match category {
        TypeCategory::Int => Ok(Opcode::Ineg),
        TypeCategory::Long => Ok(Opcode::Lneg),
        TypeCategory::Float => Ok(Opcode::Fneg),
        TypeCategory::Double => Ok(Opcode::Dneg),
        TypeCategory::Reference | TypeCategory::Void => Err(LowerError::unsupported(
            "operator",
            format!("negation of {:?} operand", category),
        )),
    }
}

/// Single-operand branch taken when a comparison result satisfies `op`.
pub fn if_zero(op: CmpOp) -> Opcode {
    match op {
        CmpOp::Eq => Opcode::Ifeq,
        CmpOp::Ne => Opcode::Ifne,
        CmpOp::Lt => Opcode::Iflt,
        CmpOp::Le => Opcode::Ifle,
        CmpOp::Gt => Opcode::Ifgt,
        CmpOp::Ge => Opcode::Ifge,
    }
}

pub fn if_icmp(op: CmpOp) -> Opcode {
    match op {
        CmpOp::Eq => Opcode::IfIcmpeq,
        CmpOp::Ne => Opcode::IfIcmpne,
        CmpOp::Lt => Opcode::IfIcmplt,
        CmpOp::Le => Opcode::IfIcmple,
        CmpOp::Gt => Opcode::IfIcmpgt,
        CmpOp::Ge => Opcode::IfIcmpge,
    }
}

pub fn if_acmp(op: CmpOp) -> Result<Opcode> {
    match op {
        CmpOp::Eq => Ok(Opcode::IfAcmpeq),
        CmpOp::Ne => Ok(Opcode::IfAcmpne),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => Err(LowerError::unsupported(
            "comparison",
            format!("`{}` on references", op.symbol()),
        )),
    }
}

/// Comparison that turns a wide or floating pair into an int for `if*`.
/// `<` and `<=` use the `g` variants so NaN takes the false branch.
pub fn compare(op: CmpOp, category: TypeCategory) -> Option<Opcode> {
    let less = matches!(op, CmpOp::Lt | CmpOp::Le);
    match category {
        TypeCategory::Long => Some(Opcode::Lcmp),
        TypeCategory::Float if less => Some(Opcode::Fcmpg),
        TypeCategory::Float => Some(Opcode::Fcmpl),
        TypeCategory::Double if less => Some(Opcode::Dcmpg),
        TypeCategory::Double => Some(Opcode::Dcmpl),
        TypeCategory::Int | TypeCategory::Reference | TypeCategory::Void => None,
    }
}
