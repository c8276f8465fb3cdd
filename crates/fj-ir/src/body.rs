use crate::{BlockGraph, ClassName, IrError, Local, Stmt, StmtId, StmtKind, TrapDecl, Type};
use serde::{Deserialize, Serialize};

/// A method body: declared locals, the statement list in source order and
/// its block graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BodyDef")]
pub struct Body {
    pub locals: Vec<Local>,
    pub stmts: Vec<Stmt>,
    #[serde(rename = "blocks")]
    pub graph: BlockGraph,
}

/// Serialized form: blocks may be given explicitly or derived from traps.
#[derive(Deserialize)]
struct BodyDef {
    #[serde(default)]
    locals: Vec<Local>,
    stmts: Vec<Stmt>,
    #[serde(default)]
    blocks: Option<BlockGraph>,
    #[serde(default)]
    traps: Vec<TrapDecl>,
}

impl TryFrom<BodyDef> for Body {
    type Error = IrError;

    fn try_from(def: BodyDef) -> Result<Self, Self::Error> {
        match def.blocks {
            Some(graph) => Ok(Body::new(def.locals, def.stmts, graph)),
            None => Body::from_stmts(def.locals, def.stmts, &def.traps),
        }
    }
}

impl Body {
    pub fn new(locals: Vec<Local>, stmts: Vec<Stmt>, graph: BlockGraph) -> Self {
        Self {
            locals,
            stmts,
            graph,
        }
    }

    pub fn from_stmts(
        locals: Vec<Local>,
        stmts: Vec<Stmt>,
        traps: &[TrapDecl],
    ) -> Result<Self, IrError> {
        let graph = BlockGraph::from_stmts(&stmts, traps)?;
        Ok(Self::new(locals, stmts, graph))
    }

    pub fn stmt(&self, id: StmtId) -> Option<&Stmt> {
        self.stmts.iter().find(|stmt| stmt.id == id)
    }

    pub fn position(&self, id: StmtId) -> Option<usize> {
        self.stmts.iter().position(|stmt| stmt.id == id)
    }

    /// Locals written by the body, each once, in statement order.
    pub fn defs(&self) -> Vec<&Local> {
        let mut defs: Vec<&Local> = Vec::new();
        for stmt in &self.stmts {
            if let Some(local) = stmt.kind.def() {
                if !defs.contains(&local) {
                    defs.push(local);
                }
            }
        }
        defs
    }

    pub fn uses_local(&self, local: &Local) -> bool {
        self.stmts
            .iter()
            .any(|stmt| stmt.kind.uses().into_iter().any(|used| used == local))
    }
}

/// Incrementally builds a body; statement ids are handed out in push order.
#[derive(Debug, Default)]
pub struct BodyBuilder {
    locals: Vec<Local>,
    stmts: Vec<Stmt>,
    traps: Vec<TrapDecl>,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or returns the already declared) local with this name and type.
    pub fn local(&mut self, name: &str, ty: Type) -> Local {
        self.declare(Local::new(name, ty))
    }

    pub fn declare(&mut self, local: Local) -> Local {
        if !self.locals.contains(&local) {
            self.locals.push(local.clone());
        }
        local
    }

    /// Id the next pushed statement will get.
    pub fn next_id(&self) -> StmtId {
        StmtId(self.stmts.len() as u32)
    }

    pub fn push(&mut self, kind: StmtKind) -> StmtId {
        let id = self.next_id();
        self.stmts.push(Stmt::new(id, kind));
        id
    }

    pub fn push_at_line(&mut self, line: u32, kind: StmtKind) -> StmtId {
        let id = self.push(kind);
        if let Some(stmt) = self.stmts.last_mut() {
            stmt.line = Some(line);
        }
        id
    }

    pub fn trap(&mut self, exception: impl Into<ClassName>, begin: StmtId, end: StmtId, handler: StmtId) {
        self.traps.push(TrapDecl {
            exception: exception.into(),
            begin,
            end,
            handler,
        });
    }

    pub fn build(self) -> Result<Body, IrError> {
        Body::from_stmts(self.locals, self.stmts, &self.traps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, Immediate, LValue};
    use pretty_assertions::assert_eq;

    #[test]
    fn defs_are_unique_and_ordered() {
        let mut builder = BodyBuilder::new();
        let a = builder.local("a", Type::INT);
        let b = builder.local("b", Type::INT);
        builder.push(StmtKind::Assign {
            lhs: LValue::Local(b.clone()),
            rhs: Expr::Immediate(Immediate::int(1)),
        });
        builder.push(StmtKind::Assign {
            lhs: LValue::Local(a.clone()),
            rhs: Expr::Immediate(Immediate::from(&b)),
        });
        builder.push(StmtKind::Assign {
            lhs: LValue::Local(b.clone()),
            rhs: Expr::Immediate(Immediate::int(2)),
        });
        builder.push(StmtKind::Return(Immediate::from(&a)));
        let body = builder.build().unwrap();

        assert_eq!(body.defs(), vec![&b, &a]);
        assert!(body.uses_local(&a));
        assert!(body.uses_local(&b));
    }

    #[test]
    fn deserializes_body_with_traps() {
        let json = r#"{
            "locals": [{"name": "e", "ty": "java.lang.Exception"}],
            "stmts": [
                {"id": 0, "kind": "nop"},
                {"id": 1, "kind": "return_void"},
                {"id": 2, "kind": {"identity": {"local": {"name": "e", "ty": "java.lang.Exception"}, "rhs": "caught_exception"}}},
                {"id": 3, "kind": "return_void"}
            ],
            "traps": [{"exception": "java.lang.Exception", "begin": 0, "end": 1, "handler": 2}]
        }"#;
        let body: Body = serde_json::from_str(json).unwrap();
        assert_eq!(body.graph.blocks.len(), 3);
        assert_eq!(body.graph.blocks[0].exceptional_successors.len(), 1);
    }
}
