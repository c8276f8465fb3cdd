use super::{MethodLowerer, PendingConstruction};
use crate::cast::primitive_cast;
use crate::descriptor::{
    internal_name, method_handle, primitive_wrapper, proto_descriptor, type_descriptor,
};
use crate::error::{LowerError, Result};
use crate::opcodes;
use crate::slots::Binding;
use fj_asm::{LdcConst, Opcode};
use fj_ir::{BinOp, Constant, Expr, FieldRef, Immediate, Local, Type, TypeCategory};

impl MethodLowerer<'_> {
    /// Pushes a constant with the shortest instruction that encodes it.
    pub(super) fn push_constant(&mut self, constant: &Constant) -> Result<()> {
        match constant {
            Constant::Int(value) => self.push_int(*value),
            Constant::Boolean(value) => self.push_int(i32::from(*value)),
            Constant::Long(0) => self.asm.insn(Opcode::Lconst0),
            Constant::Long(1) => self.asm.insn(Opcode::Lconst1),
            Constant::Long(value) => self.asm.ldc(LdcConst::Long(*value)),
            Constant::Float(value) => match value.to_bits() {
                bits if bits == 0f32.to_bits() => self.asm.insn(Opcode::Fconst0),
                bits if bits == 1f32.to_bits() => self.asm.insn(Opcode::Fconst1),
                bits if bits == 2f32.to_bits() => self.asm.insn(Opcode::Fconst2),
                _ => self.asm.ldc(LdcConst::Float(*value)),
            },
            Constant::Double(value) => match value.to_bits() {
                bits if bits == 0f64.to_bits() => self.asm.insn(Opcode::Dconst0),
                bits if bits == 1f64.to_bits() => self.asm.insn(Opcode::Dconst1),
                _ => self.asm.ldc(LdcConst::Double(*value)),
            },
            Constant::String(value) => self.asm.ldc(LdcConst::Str(value.clone())),
            Constant::Class(ty) => self.push_class_literal(ty)?,
            Constant::Null => self.asm.insn(Opcode::AconstNull),
            Constant::MethodHandle(handle) => {
                self.asm.ldc(LdcConst::Handle(method_handle(handle)?))
            }
            Constant::MethodType(proto) => {
                self.asm.ldc(LdcConst::MethodType(proto_descriptor(proto)?))
            }
        }
        Ok(())
    }

    fn push_int(&mut self, value: i32) {
        match value {
            -1 => self.asm.insn(Opcode::IconstM1),
            0 => self.asm.insn(Opcode::Iconst0),
            1 => self.asm.insn(Opcode::Iconst1),
            2 => self.asm.insn(Opcode::Iconst2),
            3 => self.asm.insn(Opcode::Iconst3),
            4 => self.asm.insn(Opcode::Iconst4),
            5 => self.asm.insn(Opcode::Iconst5),
            _ if i8::try_from(value).is_ok() => self.asm.int_insn(Opcode::Bipush, value),
            _ if i16::try_from(value).is_ok() => self.asm.int_insn(Opcode::Sipush, value),
            _ => self.asm.ldc(LdcConst::Int(value)),
        }
    }

    fn push_class_literal(&mut self, ty: &Type) -> Result<()> {
        match ty {
            Type::Primitive(prim) => {
                self.asm.field_insn(
                    Opcode::Getstatic,
                    primitive_wrapper(*prim),
                    "TYPE",
                    "Ljava/lang/Class;",
                );
            }
            Type::Void => {
                self.asm
                    .field_insn(Opcode::Getstatic, "java/lang/Void", "TYPE", "Ljava/lang/Class;");
            }
            Type::Class(_) | Type::Array { .. } => {
                self.asm.ldc(LdcConst::Type(internal_name(ty)?));
            }
            Type::Null | Type::Unknown => {
                return Err(LowerError::unsupported(
                    "constant",
                    format!("class literal of `{}`", ty),
                ))
            }
        }
        Ok(())
    }

    /// Lowers `dst = rhs`.
    pub(super) fn assign_local(&mut self, dst: &Local, rhs: &Expr) -> Result<()> {
        match rhs {
            Expr::Immediate(Immediate::Local(src)) => self.copy_local(dst, src),
            Expr::Cast {
                op: Immediate::Local(src),
                ..
            } if dst.is_handler_ref() => {
                let binding = self.slots.resolve(src)?;
                self.slots.reassign(dst, binding)
            }
            Expr::New(class) => {
                self.asm.type_insn(Opcode::New, &class.internal_name());
                self.asm.insn(Opcode::Dup);
                self.pending.push(PendingConstruction::Allocation {
                    target: dst.clone(),
                });
                Ok(())
            }
            Expr::NewArray { element, size } => {
                self.push_new_array(element, size)?;
                if element.as_primitive().is_some() && self.slots.is_stack_resident(dst)? {
                    self.asm.insn(Opcode::Dup);
                }
                self.store_local(dst)
            }
            Expr::Invoke(invoke) => {
                if invoke.method().ret.is_void() {
                    return Err(LowerError::structural(format!(
                        "void result of {} assigned to {}",
                        invoke.method(),
                        dst
                    )));
                }
                self.lower_invoke(invoke)?;
                self.store_local(dst)
            }
            Expr::Field(FieldRef::Instance { .. }) if self.method.is_static() => {
                self.slots.resolve_declared(dst)?;
                self.push_expr(rhs)?;
                self.store_local(dst)
            }
            _ => {
                self.push_expr(rhs)?;
                self.store_local(dst)
            }
        }
    }

    fn copy_local(&mut self, dst: &Local, src: &Local) -> Result<()> {
        if dst == src {
            return Ok(());
        }
        let source = self.slots.resolve(src)?;
        if dst.is_handler_ref() {
            return self.slots.reassign(dst, source);
        }
        let target = self.slots.resolve(dst)?;
        if matches!(source, Binding::Slot(_)) && source == target {
            return Ok(());
        }
        self.load_local(src)?;
        self.store_local(dst)
    }

    /// Pushes the value of a side-effect-free or invoking expression.
    fn push_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Immediate(immediate) => self.load_immediate(immediate),
            Expr::Binary { op, lhs, rhs } => {
                self.load_immediate(lhs)?;
                self.load_immediate(rhs)?;
                let opcode = opcodes::binary(*op, binary_category(*op, lhs, rhs))?;
                self.asm.insn(opcode);
                Ok(())
            }
            Expr::Neg(op) => {
                self.load_immediate(op)?;
                let opcode = opcodes::neg(op.ty().category())?;
                self.asm.insn(opcode);
                Ok(())
            }
            Expr::Cast { op, ty } => self.push_cast(op, ty),
            Expr::InstanceOf { op, check } => {
                if let Binding::Slot(slot) = self.slots.resolve_immediate(op)? {
                    self.asm.var_insn(Opcode::Aload, slot);
                }
                self.asm.type_insn(Opcode::Instanceof, &internal_name(check)?);
                Ok(())
            }
            Expr::New(class) => Err(LowerError::unsupported(
                "expression",
                format!("new {} outside a local assignment", class),
            )),
            Expr::NewArray { element, size } => self.push_new_array(element, size),
            Expr::NewMultiArray { ty, sizes } => {
                let dims = u8::try_from(sizes.len())
                    .ok()
                    .filter(|dims| *dims > 0)
                    .ok_or_else(|| {
                        LowerError::unsupported(
                            "expression",
                            format!("multi-array with {} dimensions", sizes.len()),
                        )
                    })?;
                for size in sizes {
                    self.load_immediate(size)?;
                }
                self.asm.multi_new_array(&type_descriptor(ty)?, dims);
                Ok(())
            }
            Expr::Length(op) => {
                self.load_immediate(op)?;
                self.asm.insn(Opcode::Arraylength);
                Ok(())
            }
            Expr::Invoke(invoke) => self.lower_invoke(invoke),
            Expr::Field(field) => self.load_field(field),
            Expr::Array(array) => {
                let element = array.element_type().ok_or_else(|| {
                    LowerError::unsupported(
                        "array access",
                        format!("base {} has non-array type `{}`", array.base, array.base.ty),
                    )
                })?;
                self.load_local(&array.base)?;
                self.load_immediate(&array.index)?;
                self.asm.insn(opcodes::array_load(&element));
                Ok(())
            }
            Expr::Phi(_) => Err(LowerError::unsupported("expression", expr.kind_name())),
        }
    }

    fn push_cast(&mut self, op: &Immediate, ty: &Type) -> Result<()> {
        let from = op.ty();
        if ty.is_reference() {
            if from.as_primitive().is_some() {
                return Err(LowerError::unsupported(
                    "cast",
                    format!("`{}` to `{}`", from, ty),
                ));
            }
            self.load_immediate(op)?;
            self.asm.type_insn(Opcode::Checkcast, &internal_name(ty)?);
            return Ok(());
        }
        match (from.as_primitive(), ty.as_primitive()) {
            (Some(from), Some(to)) => {
                self.load_immediate(op)?;
                for opcode in primitive_cast(from, to) {
                    self.asm.insn(*opcode);
                }
                Ok(())
            }
            _ => Err(LowerError::unsupported(
                "cast",
                format!("`{}` to `{}`", from, ty),
            )),
        }
    }

    fn push_new_array(&mut self, element: &Type, size: &Immediate) -> Result<()> {
        self.load_immediate(size)?;
        match element.as_primitive() {
            Some(prim) => self
                .asm
                .int_insn(Opcode::Newarray, i32::from(opcodes::array_kind(prim).code())),
            None => self.asm.type_insn(Opcode::Anewarray, &internal_name(element)?),
        }
        Ok(())
    }
}

/// Category selecting the opcode of a binary operation: the first operand
/// decides unless its type is unknown, then the second, then int. Shifts
/// always follow the value being shifted.
fn binary_category(op: BinOp, lhs: &Immediate, rhs: &Immediate) -> TypeCategory {
    let known = |ty: Type| (!ty.is_unknown() && ty != Type::Null).then(|| ty.category());
    match op {
        BinOp::Shl | BinOp::Shr | BinOp::Ushr => known(lhs.ty()).unwrap_or(TypeCategory::Int),
        _ => known(lhs.ty())
            .or_else(|| known(rhs.ty()))
            .unwrap_or(TypeCategory::Int),
    }
}
