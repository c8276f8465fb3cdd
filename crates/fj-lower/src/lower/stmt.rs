use super::{MethodLowerer, PendingConstruction};
use crate::error::{LowerError, Result};
use crate::opcodes;
use crate::slots::Binding;
use fj_asm::{Label, Opcode};
use itertools::Itertools;
use fj_ir::{
    Condition, Expr, IdentityRef, Immediate, LValue, Local, Stmt, StmtId, StmtKind, TypeCategory,
};
use tracing::{trace, warn};

impl MethodLowerer<'_> {
    pub(super) fn lower_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        trace!("{}: {}", stmt.id, stmt);
        match &stmt.kind {
            StmtKind::Assign { lhs, rhs } => self.lower_assign(lhs, rhs),
            StmtKind::Identity { local, rhs } => self.lower_identity(local, rhs),
            StmtKind::Invoke(invoke) => {
                self.lower_invoke(invoke)?;
                self.discard_result(invoke);
                Ok(())
            }
            StmtKind::If { cond, target } => self.lower_if(cond, *target),
            StmtKind::Goto { target } => self.lower_goto(*target),
            StmtKind::Switch {
                key,
                values,
                targets,
                default,
            } => self.lower_switch(key, values, targets, *default),
            StmtKind::Return(op) => {
                let method = self.method;
                let ret = &method.ret;
                if ret.is_void() {
                    return Err(LowerError::structural("value returned from a void method"));
                }
                self.load_immediate(op)?;
                self.asm.insn(opcodes::ret(ret));
                Ok(())
            }
            StmtKind::ReturnVoid => {
                self.asm.insn(Opcode::Return);
                Ok(())
            }
            StmtKind::Throw(op) => self.with_operand(op, Opcode::Athrow),
            StmtKind::EnterMonitor(op) => self.with_operand(op, Opcode::Monitorenter),
            StmtKind::ExitMonitor(op) => self.with_operand(op, Opcode::Monitorexit),
            StmtKind::Nop => {
                self.asm.insn(Opcode::Nop);
                Ok(())
            }
            StmtKind::Breakpoint => Err(LowerError::unsupported("statement", stmt.kind.kind_name())),
        }
    }

    fn with_operand(&mut self, op: &Immediate, opcode: Opcode) -> Result<()> {
        self.load_immediate(op)?;
        self.asm.insn(opcode);
        Ok(())
    }

    fn lower_assign(&mut self, lhs: &LValue, rhs: &Expr) -> Result<()> {
        match lhs {
            LValue::Local(dst) => self.assign_local(dst, rhs),
            LValue::Field(field) => {
                let Expr::Immediate(value) = rhs else {
                    return Err(LowerError::unsupported("field store of", rhs.kind_name()));
                };
                self.store_field(field, value)
            }
            LValue::Array(array) => {
                let Expr::Immediate(value) = rhs else {
                    return Err(LowerError::unsupported("array store of", rhs.kind_name()));
                };
                let element = array.element_type().ok_or_else(|| {
                    LowerError::unsupported(
                        "array access",
                        format!("base {} has non-array type `{}`", array.base, array.base.ty),
                    )
                })?;
                self.load_local(&array.base)?;
                self.load_immediate(&array.index)?;
                self.load_immediate(value)?;
                self.asm.insn(opcodes::array_store(&element));
                Ok(())
            }
        }
    }

    fn lower_identity(&mut self, local: &Local, rhs: &IdentityRef) -> Result<()> {
        match rhs {
            IdentityRef::This => {
                if self.method.is_static() {
                    warn!("{}: ignoring @this in a static method", self.name);
                    return Ok(());
                }
                if self.method.is_constructor() {
                    self.asm.var_insn(Opcode::Aload, 0);
                    self.pending.push(PendingConstruction::Receiver);
                }
                Ok(())
            }
            IdentityRef::Parameter { index, .. } => {
                let slot = self.slots.parameter_slot(*index).ok_or_else(|| {
                    LowerError::structural(format!(
                        "@parameter{} but the method takes {} parameters",
                        index,
                        self.method.params.len()
                    ))
                })?;
                if !self.body.uses_local(local) {
                    return Ok(());
                }
                match self.slots.resolve(local)? {
                    Binding::Slot(bound) if bound == slot => Ok(()),
                    binding => {
                        let method = self.method;
                        let param = &method.params[usize::from(*index)];
                        self.asm.var_insn(opcodes::load(param)?, slot);
                        if let Binding::Slot(bound) = binding {
                            self.asm.var_insn(opcodes::store(&local.ty)?, bound);
                        }
                        Ok(())
                    }
                }
            }
            IdentityRef::CaughtException => {
                if !self.in_exceptional_block {
                    warn!(
                        "{}: @caughtexception for {} outside a handler block",
                        self.name, local
                    );
                }
                self.store_local(local)
            }
        }
    }

    fn lower_if(&mut self, cond: &Condition, target: StmtId) -> Result<()> {
        let label = self.target_label(target)?;
        self.load_immediate(&cond.lhs)?;
        self.load_immediate(&cond.rhs)?;
        let lhs = cond.lhs.ty();
        let rhs = cond.rhs.ty();
        let jump = if lhs.is_reference() || rhs.is_reference() {
            opcodes::if_acmp(cond.op)?
        } else {
            let category = lhs.category();
            match opcodes::compare(cond.op, category) {
                Some(compare) => {
                    self.asm.insn(compare);
                    opcodes::if_zero(cond.op)
                }
                None if category == TypeCategory::Int => opcodes::if_icmp(cond.op),
                None => {
                    return Err(LowerError::unsupported(
                        "comparison",
                        format!("`{}` on {:?} operands", cond.op.symbol(), category),
                    ))
                }
            }
        };
        self.asm.jump(jump, label);
        Ok(())
    }

    fn lower_goto(&mut self, target: StmtId) -> Result<()> {
        let block = self.layout.block_of(target)?;
        if let Some(label) = self.labels.get(block) {
            self.asm.jump(Opcode::Goto, label);
            return Ok(());
        }
        let body = self.body;
        match body.stmt(target) {
            Some(stmt) if stmt.kind.is_return() => self.lower_stmt(stmt),
            _ => Err(LowerError::structural(format!(
                "goto target {} has no label",
                target
            ))),
        }
    }

    fn lower_switch(
        &mut self,
        key: &Immediate,
        values: &[i32],
        targets: &[StmtId],
        default: StmtId,
    ) -> Result<()> {
        let default = self.target_label(default)?;
        let mut cases = Vec::with_capacity(values.len());
        for (value, target) in values.iter().zip(targets) {
            cases.push((*value, self.target_label(*target)?));
        }
        cases.sort_by_key(|(value, _)| *value);
        let keys = || cases.iter().map(|(value, _)| *value).tuple_windows();
        if let Some((value, _)) = keys().find(|(a, b)| a == b) {
            return Err(LowerError::structural(format!(
                "switch has duplicate case {}",
                value
            )));
        }

        self.load_immediate(key)?;
        let contiguous = keys().all(|(a, b)| b == a + 1);
        let (keys, labels): (Vec<i32>, Vec<Label>) = cases.into_iter().unzip();
        match (keys.first(), keys.last()) {
            (Some(min), Some(max)) if contiguous => {
                self.asm.table_switch(*min, *max, default, labels)
            }
            _ => self.asm.lookup_switch(default, keys, labels),
        }
        Ok(())
    }

    fn target_label(&self, target: StmtId) -> Result<Label> {
        let block = self.layout.block_of(target)?;
        self.labels.get(block).ok_or_else(|| {
            LowerError::structural(format!("branch target {} has no label", target))
        })
    }
}
