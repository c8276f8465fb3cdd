use crate::error::{LowerError, Result};
use fj_ir::{Body, IdentityRef, Immediate, Local, LocalRole, Method, StmtKind};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use tracing::trace;

/// Where a local lives while its method is being lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Slot(u16),
    /// The value is produced onto the operand stack and consumed from there;
    /// loads and stores of it emit nothing.
    Stack,
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Binding::Slot(slot) => write!(f, "slot {}", slot),
            Binding::Stack => f.write_str("stack"),
        }
    }
}

/// Local-variable slot map for one method pass.
///
/// Bindings are created lazily on first lookup and stay fixed for the rest
/// of the pass, except through [`SlotAllocator::reassign`].
#[derive(Debug, Clone, Default)]
pub struct SlotAllocator {
    bindings: HashMap<Local, Binding>,
    next_free: u16,
    param_slots: Vec<u16>,
    first_local: u16,
    declaration_order: Vec<Local>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator with the receiver and every `@parameterN` local already
    /// bound to their JVM argument slots.
    pub fn for_method(method: &Method, body: &Body) -> Result<Self> {
        let mut slots = Self::new();
        let mut next: u16 = if method.is_static() { 0 } else { 1 };
        for param in &method.params {
            slots.param_slots.push(next);
            next = advance(next, param.category().width(), &method.name)?;
        }
        slots.next_free = next;
        slots.first_local = next;
        slots.declaration_order = body.defs().into_iter().rev().cloned().collect();

        for stmt in &body.stmts {
            let StmtKind::Identity { local, rhs } = &stmt.kind else {
                continue;
            };
            if slots.bindings.contains_key(local) {
                continue;
            }
            match rhs {
                IdentityRef::This if !method.is_static() => {
                    slots.bind(local.clone(), Binding::Slot(0))?;
                }
                IdentityRef::Parameter { index, .. } => {
                    if let Some(slot) = slots.parameter_slot(*index) {
                        if !local.is_stack_temp() {
                            slots.bind(local.clone(), Binding::Slot(slot))?;
                        }
                    }
                }
                IdentityRef::This | IdentityRef::CaughtException => {}
            }
        }
        Ok(slots)
    }

    pub fn parameter_slot(&self, index: u16) -> Option<u16> {
        self.param_slots.get(usize::from(index)).copied()
    }

    /// Binding for `local`, allocating one on first sight.
    ///
    /// Fails when the method runs out of the 16-bit slot space.
    pub fn resolve(&mut self, local: &Local) -> Result<Binding> {
        if let Some(binding) = self.bindings.get(local) {
            return Ok(*binding);
        }
        let binding = match local.role {
            LocalRole::Receiver => Binding::Slot(0),
            LocalRole::StackTemp => Binding::Stack,
            LocalRole::Ordinary | LocalRole::HandlerRef => Binding::Slot(self.next_free),
        };
        trace!("bind {} -> {}", local, binding);
        self.bind(local.clone(), binding)?;
        Ok(binding)
    }

    pub fn resolve_immediate(&mut self, immediate: &Immediate) -> Result<Binding> {
        match immediate {
            Immediate::Local(local) => self.resolve(local),
            Immediate::Constant(constant) => Err(LowerError::slot(format!(
                "constant `{}` has no local slot",
                constant
            ))),
        }
    }

    pub fn binding(&self, local: &Local) -> Option<Binding> {
        self.bindings.get(local).copied()
    }

    pub fn is_stack_resident(&mut self, local: &Local) -> Result<bool> {
        Ok(self.resolve(local)? == Binding::Stack)
    }

    /// Force-overwrites the binding of `local`.
    pub fn reassign(&mut self, local: &Local, binding: Binding) -> Result<()> {
        trace!("rebind {} -> {}", local, binding);
        self.bind(local.clone(), binding)
    }

    /// Position of `local` among the method's defined locals, last
    /// definition first.
    pub fn index_from_declaration_order(&self, local: &Local) -> Option<usize> {
        self.declaration_order
            .iter()
            .position(|declared| declared == local)
    }

    /// Binds an unbound local to the slot given by its declaration position
    /// when that slot is still free; falls back to [`Self::resolve`].
    pub fn resolve_declared(&mut self, local: &Local) -> Result<Binding> {
        if let Some(binding) = self.binding(local) {
            return Ok(binding);
        }
        if local.role == LocalRole::Ordinary {
            let candidate = self
                .index_from_declaration_order(local)
                .and_then(|index| u16::try_from(index).ok())
                .and_then(|index| self.first_local.checked_add(index));
            if let Some(slot) = candidate {
                let width = local.ty.category().width().max(1);
                if self.is_free(slot, width) {
                    self.bind(local.clone(), Binding::Slot(slot))?;
                    return Ok(Binding::Slot(slot));
                }
            }
        }
        self.resolve(local)
    }

    /// One past the highest occupied slot.
    pub fn slot_count(&self) -> u16 {
        self.next_free
    }

    /// All bindings, sorted by local name.
    pub fn bindings(&self) -> Vec<(String, Binding)> {
        let mut bindings: Vec<_> = self
            .bindings
            .iter()
            .map(|(local, binding)| (local.name().to_string(), *binding))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    fn is_free(&self, slot: u16, width: u16) -> bool {
        let end = u32::from(slot) + u32::from(width);
        self.bindings.iter().all(|(local, binding)| match binding {
            Binding::Slot(taken) => {
                let width = local.ty.category().width().max(1);
                let taken_end = u32::from(*taken) + u32::from(width);
                end <= u32::from(*taken) || taken_end <= u32::from(slot)
            }
            Binding::Stack => true,
        })
    }

    fn bind(&mut self, local: Local, binding: Binding) -> Result<()> {
        if let Binding::Slot(slot) = binding {
            let end = advance(slot, local.ty.category().width().max(1), local.name())?;
            self.next_free = self.next_free.max(end);
        }
        self.bindings.insert(local, binding);
        Ok(())
    }
}

/// `slot + width`, or a slot error once the 16-bit slot space is exhausted.
fn advance(slot: u16, width: u16, owner: impl Display) -> Result<u16> {
    slot.checked_add(width).ok_or_else(|| {
        LowerError::slot(format!(
            "{} needs slot {} with width {}, past the last local slot",
            owner, slot, width
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fj_ir::{BodyBuilder, Expr, LValue, Type};
    use pretty_assertions::assert_eq;

    fn method_with(params: Vec<Type>, is_static: bool, body: Body) -> Method {
        let method = Method::new("m", params, Type::Void).with_body(body);
        if is_static {
            method.with_modifiers([fj_ir::Modifier::Static])
        } else {
            method
        }
    }

    #[test]
    fn parameters_are_pre_seeded_after_wide_values() {
        let mut builder = BodyBuilder::new();
        let this = builder.local("this", Type::class("A"));
        let l1 = builder.local("l1", Type::LONG);
        let l2 = builder.local("l2", Type::INT);
        builder.push(StmtKind::Identity {
            local: this.clone(),
            rhs: IdentityRef::This,
        });
        builder.push(StmtKind::Identity {
            local: l1.clone(),
            rhs: IdentityRef::Parameter {
                index: 0,
                ty: Type::LONG,
            },
        });
        builder.push(StmtKind::Identity {
            local: l2.clone(),
            rhs: IdentityRef::Parameter {
                index: 1,
                ty: Type::INT,
            },
        });
        builder.push(StmtKind::ReturnVoid);
        let body = builder.build().unwrap();
        let method = method_with(vec![Type::LONG, Type::INT], false, body.clone());

        let mut slots = SlotAllocator::for_method(&method, &body).unwrap();
        assert_eq!(slots.resolve(&this).unwrap(), Binding::Slot(0));
        assert_eq!(slots.resolve(&l1).unwrap(), Binding::Slot(1));
        assert_eq!(slots.resolve(&l2).unwrap(), Binding::Slot(3));
        assert_eq!(slots.slot_count(), 4);

        let fresh = Local::new("l3", Type::DOUBLE);
        assert_eq!(slots.resolve(&fresh).unwrap(), Binding::Slot(4));
        assert_eq!(slots.slot_count(), 6);
        assert_eq!(slots.resolve(&fresh).unwrap(), Binding::Slot(4));
    }

    #[test]
    fn stack_temps_never_get_slots() {
        let mut slots = SlotAllocator::new();
        let temp = Local::new("$stack2", Type::INT);
        assert_eq!(slots.resolve(&temp).unwrap(), Binding::Stack);
        assert_eq!(slots.slot_count(), 0);
        assert!(slots.resolve_immediate(&Immediate::int(3)).is_err());
    }

    #[test]
    fn reassign_overrides_existing_binding() {
        let mut slots = SlotAllocator::new();
        let handler = Local::new("l1#2", Type::class("java.lang.Exception"));
        assert_eq!(slots.resolve(&handler).unwrap(), Binding::Slot(0));
        slots.reassign(&handler, Binding::Stack).unwrap();
        assert_eq!(slots.resolve(&handler).unwrap(), Binding::Stack);
    }

    #[test]
    fn declared_slot_is_used_when_free() {
        let mut builder = BodyBuilder::new();
        let a = builder.local("a", Type::INT);
        let b = builder.local("b", Type::INT);
        builder.push(StmtKind::Assign {
            lhs: LValue::Local(a.clone()),
            rhs: Expr::Immediate(Immediate::int(1)),
        });
        builder.push(StmtKind::Assign {
            lhs: LValue::Local(b.clone()),
            rhs: Expr::Immediate(Immediate::int(2)),
        });
        builder.push(StmtKind::ReturnVoid);
        let body = builder.build().unwrap();
        let method = method_with(Vec::new(), true, body.clone());

        let mut slots = SlotAllocator::for_method(&method, &body).unwrap();
        assert_eq!(slots.index_from_declaration_order(&b), Some(0));
        assert_eq!(slots.index_from_declaration_order(&a), Some(1));
        assert_eq!(slots.resolve_declared(&a).unwrap(), Binding::Slot(1));
        assert_eq!(slots.resolve(&b).unwrap(), Binding::Slot(2));
    }

    #[test]
    fn exhausted_slot_space_is_an_error() {
        let mut slots = SlotAllocator::new();
        slots
            .reassign(&Local::new("last", Type::INT), Binding::Slot(u16::MAX - 1))
            .unwrap();
        let wide = Local::new("wide", Type::LONG);
        assert!(matches!(
            slots.resolve(&wide),
            Err(LowerError::Slot { .. })
        ));

        let params = vec![Type::DOUBLE; 32768];
        let mut builder = BodyBuilder::new();
        builder.push(StmtKind::ReturnVoid);
        let body = builder.build().unwrap();
        let method = method_with(params, true, body.clone());
        assert!(matches!(
            SlotAllocator::for_method(&method, &body),
            Err(LowerError::Slot { .. })
        ));
    }
}
