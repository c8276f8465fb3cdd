//! Basic-block view of a method body.

use crate::{ClassName, IrError, Stmt, StmtId, StmtKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionalEdge {
    pub exception: ClassName,
    pub handler: BlockId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub stmts: Vec<StmtId>,
    #[serde(default)]
    pub successors: Vec<BlockId>,
    /// Ordered exception type to handler map.
    #[serde(default)]
    pub exceptional_successors: Vec<ExceptionalEdge>,
}

impl BasicBlock {
    pub fn head(&self) -> Option<StmtId> {
        self.stmts.first().copied()
    }

    pub fn tail(&self) -> Option<StmtId> {
        self.stmts.last().copied()
    }
}

/// Protected statement range as front ends declare it; `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapDecl {
    pub exception: ClassName,
    pub begin: StmtId,
    pub end: StmtId,
    pub handler: StmtId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockGraph {
    pub blocks: Vec<BasicBlock>,
}

impl BlockGraph {
    pub fn new(blocks: Vec<BasicBlock>) -> Self {
        Self { blocks }
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|block| block.id == id)
    }

    /// Maps each statement to the block that owns it.
    pub fn stmt_index(&self) -> HashMap<StmtId, BlockId> {
        self.blocks
            .iter()
            .flat_map(|block| block.stmts.iter().map(move |stmt| (*stmt, block.id)))
            .collect()
    }

    /// Splits a statement list into basic blocks.
    ///
    /// Leaders are the first statement, every branch target, every statement
    /// following a branching or terminal statement, and every trap boundary
    /// and handler. A block is covered by a trap when its head lies in the
    /// trap's `[begin, end)` range.
    pub fn from_stmts(stmts: &[Stmt], traps: &[TrapDecl]) -> Result<Self, IrError> {
        let mut positions = HashMap::with_capacity(stmts.len());
        for (index, stmt) in stmts.iter().enumerate() {
            if positions.insert(stmt.id, index).is_some() {
                return Err(IrError::InvalidGraph {
                    message: format!("duplicate statement id {}", stmt.id),
                });
            }
        }
        let position = |id: StmtId| -> Result<usize, IrError> {
            positions.get(&id).copied().ok_or_else(|| IrError::InvalidGraph {
                message: format!("statement {} is referenced but not defined", id),
            })
        };

        let mut leaders = BTreeSet::new();
        if !stmts.is_empty() {
            leaders.insert(0);
        }
        for (index, stmt) in stmts.iter().enumerate() {
            for target in stmt.kind.branch_targets() {
                leaders.insert(position(target)?);
            }
            if stmt.kind.ends_block() && index + 1 < stmts.len() {
                leaders.insert(index + 1);
            }
        }
        for trap in traps {
            leaders.insert(position(trap.begin)?);
            leaders.insert(position(trap.end)?);
            leaders.insert(position(trap.handler)?);
        }

        let starts: Vec<usize> = leaders.into_iter().collect();
        let mut owner = vec![BlockId(0); stmts.len()];
        let mut blocks = Vec::with_capacity(starts.len());
        for (ordinal, start) in starts.iter().enumerate() {
            let end = starts.get(ordinal + 1).copied().unwrap_or(stmts.len());
            let id = BlockId(ordinal as u32);
            for slot in owner.iter_mut().take(end).skip(*start) {
                *slot = id;
            }
            blocks.push(BasicBlock {
                id,
                stmts: stmts[*start..end].iter().map(|stmt| stmt.id).collect(),
                successors: Vec::new(),
                exceptional_successors: Vec::new(),
            });
        }

        for (ordinal, block) in blocks.iter_mut().enumerate() {
            let last = starts
                .get(ordinal + 1)
                .copied()
                .unwrap_or(stmts.len())
                - 1;
            let tail = &stmts[last];
            let mut successors = Vec::new();
            if matches!(tail.kind, StmtKind::If { .. }) || tail.kind.falls_through() {
                if let Some(next) = owner.get(last + 1) {
                    successors.push(*next);
                }
            }
            for target in tail.kind.branch_targets() {
                successors.push(owner[position(target)?]);
            }
            let mut seen = BTreeSet::new();
            successors.retain(|id| seen.insert(*id));
            block.successors = successors;
        }

        for trap in traps {
            let begin = position(trap.begin)?;
            let end = position(trap.end)?;
            let handler = owner[position(trap.handler)?];
            for (ordinal, start) in starts.iter().enumerate() {
                if *start < begin || *start >= end {
                    continue;
                }
                let edges = &mut blocks[ordinal].exceptional_successors;
                let duplicate = edges
                    .iter()
                    .any(|edge| edge.exception == trap.exception && edge.handler == handler);
                if !duplicate {
                    edges.push(ExceptionalEdge {
                        exception: trap.exception.clone(),
                        handler,
                    });
                }
            }
        }

        Ok(Self { blocks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CmpOp, Condition, Immediate, Local, Type};
    use pretty_assertions::assert_eq;

    fn stmt(id: u32, kind: StmtKind) -> Stmt {
        Stmt::new(StmtId(id), kind)
    }

    #[test]
    fn splits_blocks_at_branches_and_targets() {
        let x = Local::new("x", Type::BOOLEAN);
        let stmts = vec![
            stmt(
                0,
                StmtKind::If {
                    cond: Condition {
                        op: CmpOp::Eq,
                        lhs: Immediate::from(&x),
                        rhs: Immediate::int(0),
                    },
                    target: StmtId(2),
                },
            ),
            stmt(1, StmtKind::Nop),
            stmt(2, StmtKind::ReturnVoid),
        ];
        let graph = BlockGraph::from_stmts(&stmts, &[]).unwrap();
        assert_eq!(graph.blocks.len(), 3);
        assert_eq!(graph.blocks[0].successors, vec![BlockId(1), BlockId(2)]);
        assert_eq!(graph.blocks[1].successors, vec![BlockId(2)]);
        assert!(graph.blocks[2].successors.is_empty());
    }

    #[test]
    fn trap_ranges_become_exceptional_edges() {
        let stmts = vec![
            stmt(0, StmtKind::Nop),
            stmt(1, StmtKind::Nop),
            stmt(2, StmtKind::Goto { target: StmtId(4) }),
            stmt(3, StmtKind::Nop),
            stmt(4, StmtKind::ReturnVoid),
        ];
        let traps = vec![TrapDecl {
            exception: ClassName::new("java.lang.Exception"),
            begin: StmtId(0),
            end: StmtId(3),
            handler: StmtId(3),
        }];
        let graph = BlockGraph::from_stmts(&stmts, &traps).unwrap();
        assert_eq!(graph.blocks[0].stmts, vec![StmtId(0), StmtId(1), StmtId(2)]);
        assert_eq!(
            graph.blocks[0].exceptional_successors,
            vec![ExceptionalEdge {
                exception: ClassName::new("java.lang.Exception"),
                handler: BlockId(1),
            }]
        );
        assert!(graph.blocks[1].exceptional_successors.is_empty());
    }

    #[test]
    fn rejects_dangling_targets() {
        let stmts = vec![stmt(0, StmtKind::Goto { target: StmtId(9) })];
        assert!(BlockGraph::from_stmts(&stmts, &[]).is_err());
    }
}
