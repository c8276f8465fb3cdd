//! Block ordering, branch-target discovery and exception ranges.

use crate::error::{LowerError, Result};
use fj_asm::{Label, MethodAssembler, TryCatch};
use fj_ir::{BasicBlock, Body, BlockId, ClassName, StmtId, StmtKind};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::trace;

/// Exception range in statement terms. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trap {
    pub exception: ClassName,
    pub begin: StmtId,
    pub end: StmtId,
    pub handler: StmtId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Block(BlockId),
    MethodEnd,
}

/// Exception range resolved to blocks of the final order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapBounds {
    pub exception: ClassName,
    pub start: BlockId,
    pub end: Boundary,
    pub handler: BlockId,
}

#[derive(Debug, Clone)]
pub struct BlockLayout {
    pub order: Vec<BlockId>,
    pub traps: Vec<Trap>,
    pub bounds: Vec<TrapBounds>,
    block_of: HashMap<StmtId, BlockId>,
    position: HashMap<BlockId, usize>,
    exceptional: HashSet<BlockId>,
    targets: BTreeSet<BlockId>,
    fallthrough: HashMap<StmtId, BlockId>,
    needs_end_label: bool,
}

impl BlockLayout {
    pub fn build(body: &Body, line_numbers: bool) -> Result<Self> {
        let block_of = body.graph.stmt_index();
        let mut blocks: HashMap<BlockId, &BasicBlock> = HashMap::new();
        for block in &body.graph.blocks {
            if block.stmts.is_empty() {
                return Err(LowerError::structural(format!("block {} is empty", block.id)));
            }
            for stmt in &block.stmts {
                if body.stmt(*stmt).is_none() {
                    return Err(LowerError::structural(format!(
                        "block {} names unknown statement {}",
                        block.id, stmt
                    )));
                }
            }
            blocks.insert(block.id, block);
        }

        let mut order = Vec::new();
        let mut position = HashMap::new();
        for stmt in &body.stmts {
            let block = *block_of.get(&stmt.id).ok_or_else(|| {
                LowerError::structural(format!("statement {} is in no block", stmt.id))
            })?;
            if !position.contains_key(&block) {
                position.insert(block, order.len());
                order.push(block);
            }
        }

        let mut layout = Self {
            order,
            traps: Vec::new(),
            bounds: Vec::new(),
            block_of,
            position,
            exceptional: HashSet::new(),
            targets: BTreeSet::new(),
            fallthrough: HashMap::new(),
            needs_end_label: false,
        };
        layout.collect_traps(&blocks)?;
        layout.resolve_bounds()?;
        layout.collect_targets(body, &blocks, line_numbers)?;
        trace!(
            "layout: order {:?}, {} traps, {} labelled blocks",
            layout.order,
            layout.traps.len(),
            layout.targets.len()
        );
        Ok(layout)
    }

    fn collect_traps(&mut self, blocks: &HashMap<BlockId, &BasicBlock>) -> Result<()> {
        let mut seen = HashSet::new();
        for id in &self.order {
            let block = blocks[id];
            for edge in &block.exceptional_successors {
                let handler = blocks.get(&edge.handler).ok_or_else(|| {
                    LowerError::structural(format!(
                        "block {} has unknown handler block {}",
                        block.id, edge.handler
                    ))
                })?;
                self.exceptional.insert(handler.id);
            }
            if block.stmts.len() < 2 {
                continue;
            }
            let (Some(begin), Some(tail)) = (block.head(), block.tail()) else {
                continue;
            };
            let end = match block.successors.first() {
                Some(next) => blocks
                    .get(next)
                    .and_then(|next| next.head())
                    .ok_or_else(|| {
                        LowerError::structural(format!(
                            "block {} has unknown successor {}",
                            block.id, next
                        ))
                    })?,
                None => tail,
            };
            for edge in &block.exceptional_successors {
                let Some(handler) = blocks[&edge.handler].head() else {
                    continue;
                };
                let trap = Trap {
                    exception: edge.exception.clone(),
                    begin,
                    end,
                    handler,
                };
                if seen.insert(trap.clone()) {
                    self.traps.push(trap);
                }
            }
        }
        Ok(())
    }

    fn resolve_bounds(&mut self) -> Result<()> {
        let mut bounds = Vec::with_capacity(self.traps.len());
        for trap in &self.traps {
            let start = self.block_of(trap.begin)?;
            let handler = self.block_of(trap.handler)?;
            let end_block = self.block_of(trap.end)?;
            let end = if self.position[&end_block] > self.position[&start] {
                Boundary::Block(end_block)
            } else {
                match self.next_block(start) {
                    Some(next) => Boundary::Block(next),
                    None => Boundary::MethodEnd,
                }
            };
            bounds.push(TrapBounds {
                exception: trap.exception.clone(),
                start,
                end,
                handler,
            });
        }
        self.bounds = bounds;
        Ok(())
    }

    fn collect_targets(
        &mut self,
        body: &Body,
        blocks: &HashMap<BlockId, &BasicBlock>,
        line_numbers: bool,
    ) -> Result<()> {
        let mut targets = BTreeSet::new();
        for bound in &self.bounds {
            targets.insert(bound.start);
            targets.insert(bound.handler);
            match bound.end {
                Boundary::Block(block) => {
                    targets.insert(block);
                }
                Boundary::MethodEnd => self.needs_end_label = true,
            }
        }

        for (index, stmt) in body.stmts.iter().enumerate() {
            match &stmt.kind {
                StmtKind::If { target, .. } => {
                    targets.insert(self.block_of(*target)?);
                }
                StmtKind::Goto { target } => {
                    let block = self.block_of(*target)?;
                    if !is_inlinable_return(body, blocks[&block]) {
                        targets.insert(block);
                    }
                }
                StmtKind::Switch {
                    values,
                    targets: cases,
                    default,
                    ..
                } => {
                    if values.len() != cases.len() {
                        return Err(LowerError::structural(format!(
                            "switch {} has {} values but {} targets",
                            stmt.id,
                            values.len(),
                            cases.len()
                        )));
                    }
                    for case in cases.iter().chain(std::iter::once(default)) {
                        targets.insert(self.block_of(*case)?);
                    }
                }
                _ => {}
            }

            let current = self.block_of(stmt.id)?;
            if stmt.kind.falls_through() && blocks[&current].tail() == Some(stmt.id) {
                if let Some(next) = body.stmts.get(index + 1) {
                    let next_block = self.block_of(next.id)?;
                    if self.next_block(current) != Some(next_block) {
                        targets.insert(next_block);
                    }
                    self.fallthrough.insert(stmt.id, next_block);
                }
            }
        }

        if line_numbers {
            for id in &self.order {
                let head = blocks[id].head().and_then(|head| body.stmt(head));
                if head.is_some_and(|stmt| stmt.line.is_some()) {
                    targets.insert(*id);
                }
            }
        }

        self.targets = targets;
        Ok(())
    }

    pub fn block_of(&self, stmt: StmtId) -> Result<BlockId> {
        self.block_of.get(&stmt).copied().ok_or_else(|| {
            LowerError::structural(format!("statement {} is not part of the block graph", stmt))
        })
    }

    pub fn next_block(&self, block: BlockId) -> Option<BlockId> {
        let position = *self.position.get(&block)?;
        self.order.get(position + 1).copied()
    }

    /// Block reached when `stmt`, the tail of its block, falls through.
    pub fn fallthrough_of(&self, stmt: StmtId) -> Option<BlockId> {
        self.fallthrough.get(&stmt).copied()
    }

    pub fn is_exceptional(&self, block: BlockId) -> bool {
        self.exceptional.contains(&block)
    }

    pub fn needs_label(&self, block: BlockId) -> bool {
        self.targets.contains(&block)
    }

    pub fn labelled_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.targets.iter().copied()
    }

    pub fn needs_end_label(&self) -> bool {
        self.needs_end_label
    }
}

/// A goto into a block made of a single return is replaced by the return.
fn is_inlinable_return(body: &Body, block: &BasicBlock) -> bool {
    if block.stmts.len() != 1 {
        return false;
    }
    block
        .head()
        .and_then(|head| body.stmt(head))
        .is_some_and(|stmt| stmt.kind.is_return())
}

/// Labels for the blocks of one layout, created before any emission.
#[derive(Debug, Clone, Default)]
pub struct BlockLabels {
    labels: HashMap<BlockId, Label>,
    end: Option<Label>,
}

impl BlockLabels {
    pub fn assign(layout: &BlockLayout, asm: &mut dyn MethodAssembler) -> Self {
        let mut labels = HashMap::new();
        for block in &layout.order {
            if layout.needs_label(*block) {
                labels.insert(*block, asm.new_label());
            }
        }
        let end = layout.needs_end_label().then(|| asm.new_label());
        Self { labels, end }
    }

    pub fn get(&self, block: BlockId) -> Option<Label> {
        self.labels.get(&block).copied()
    }

    pub fn require(&self, block: BlockId) -> Result<Label> {
        self.get(block).ok_or_else(|| {
            LowerError::structural(format!("block {} has no branch target label", block))
        })
    }

    pub fn boundary(&self, boundary: Boundary) -> Result<Label> {
        match boundary {
            Boundary::Block(block) => self.require(block),
            Boundary::MethodEnd => self
                .end
                .ok_or_else(|| LowerError::structural("method-end label was never created")),
        }
    }

    pub fn end(&self) -> Option<Label> {
        self.end
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn register_traps(
    layout: &BlockLayout,
    labels: &BlockLabels,
    asm: &mut dyn MethodAssembler,
) -> Result<()> {
    for bound in &layout.bounds {
        asm.try_catch(TryCatch {
            start: labels.require(bound.start)?,
            end: labels.boundary(bound.end)?,
            handler: labels.require(bound.handler)?,
            exception: Some(bound.exception.internal_name()),
        });
    }
    Ok(())
}
