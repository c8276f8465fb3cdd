use crate::expr::invoke_uses;
use crate::{Condition, Expr, IdentityRef, Immediate, InvokeExpr, LValue, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum_macros::IntoStaticStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StmtId(pub u32);

impl Display for StmtId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: StmtId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StmtKind {
    Assign {
        lhs: LValue,
        rhs: Expr,
    },
    Identity {
        local: Local,
        rhs: IdentityRef,
    },
    Invoke(InvokeExpr),
    If {
        cond: Condition,
        target: StmtId,
    },
    Goto {
        target: StmtId,
    },
    Switch {
        key: Immediate,
        values: Vec<i32>,
        targets: Vec<StmtId>,
        default: StmtId,
    },
    Return(Immediate),
    ReturnVoid,
    Throw(Immediate),
    EnterMonitor(Immediate),
    ExitMonitor(Immediate),
    Nop,
    Breakpoint,
}

impl StmtKind {
    pub fn kind_name(&self) -> &'static str {
        self.into()
    }

    /// Explicit branch targets, in declaration order.
    pub fn branch_targets(&self) -> Vec<StmtId> {
        match self {
            StmtKind::If { target, .. } | StmtKind::Goto { target } => vec![*target],
            StmtKind::Switch {
                targets, default, ..
            } => targets
                .iter()
                .copied()
                .chain(std::iter::once(*default))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether control may continue with the next statement in the list.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self,
            StmtKind::Goto { .. }
                | StmtKind::Switch { .. }
                | StmtKind::Return(_)
                | StmtKind::ReturnVoid
                | StmtKind::Throw(_)
        )
    }

    /// Whether the statement ends a basic block.
    pub fn ends_block(&self) -> bool {
        !self.falls_through() || matches!(self, StmtKind::If { .. })
    }

    pub fn is_return(&self) -> bool {
        matches!(self, StmtKind::Return(_) | StmtKind::ReturnVoid)
    }

    /// Local written by the statement, if any.
    pub fn def(&self) -> Option<&Local> {
        match self {
            StmtKind::Assign {
                lhs: LValue::Local(local),
                ..
            }
            | StmtKind::Identity { local, .. } => Some(local),
            _ => None,
        }
    }

    /// Locals read by the statement.
    pub fn uses(&self) -> Vec<&Local> {
        match self {
            StmtKind::Assign { lhs, rhs } => {
                let mut uses = match lhs {
                    LValue::Local(_) => Vec::new(),
                    LValue::Field(field) => field.base().into_iter().collect(),
                    LValue::Array(array) => {
                        let mut uses = vec![&array.base];
                        uses.extend(array.index.as_local());
                        uses
                    }
                };
                uses.extend(rhs.uses());
                uses
            }
            StmtKind::Identity { .. } => Vec::new(),
            StmtKind::Invoke(invoke) => invoke_uses(invoke),
            StmtKind::If { cond, .. } => cond
                .lhs
                .as_local()
                .into_iter()
                .chain(cond.rhs.as_local())
                .collect(),
            StmtKind::Switch { key, .. } => key.as_local().into_iter().collect(),
            StmtKind::Return(op)
            | StmtKind::Throw(op)
            | StmtKind::EnterMonitor(op)
            | StmtKind::ExitMonitor(op) => op.as_local().into_iter().collect(),
            StmtKind::Goto { .. } | StmtKind::ReturnVoid | StmtKind::Nop | StmtKind::Breakpoint => {
                Vec::new()
            }
        }
    }
}

impl Stmt {
    pub fn new(id: StmtId, kind: StmtKind) -> Self {
        Self {
            id,
            line: None,
            kind,
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Display for StmtKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            StmtKind::Assign { lhs, rhs } => write!(f, "{} = {}", lhs, rhs),
            StmtKind::Identity { local, rhs } => write!(f, "{} := {}", local, rhs),
            StmtKind::Invoke(invoke) => write!(f, "{}", invoke),
            StmtKind::If { cond, target } => write!(f, "if {} goto {}", cond, target),
            StmtKind::Goto { target } => write!(f, "goto {}", target),
            StmtKind::Switch {
                key,
                values,
                targets,
                default,
            } => write!(
                f,
                "switch({}) {{ {} default: goto {} }}",
                key,
                values
                    .iter()
                    .zip(targets)
                    .map(|(value, target)| format!("case {}: goto {};", value, target))
                    .join(" "),
                default
            ),
            StmtKind::Return(op) => write!(f, "return {}", op),
            StmtKind::ReturnVoid => f.write_str("return"),
            StmtKind::Throw(op) => write!(f, "throw {}", op),
            StmtKind::EnterMonitor(op) => write!(f, "entermonitor {}", op),
            StmtKind::ExitMonitor(op) => write!(f, "exitmonitor {}", op),
            StmtKind::Nop => f.write_str("nop"),
            StmtKind::Breakpoint => f.write_str("breakpoint"),
        }
    }
}
