use flowgate_core::gates::GateSet;

/// 线性撤销/重做历史。保存的是门集合的完整快照，不是增量补丁：
/// 门数量以十计，快照成本可忽略，换来的是任意状态可直达。
///
/// 约定：`record` 在每次「生效的」变更之前调用（保存变更前的状态），
/// 并清空 redo 栈；未生效的 no-op 不得入栈，否则撤销会出现空步。
#[derive(Debug, Default, Clone)]
pub struct History {
    undo: Vec<GateSet>,
    redo: Vec<GateSet>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在一次生效变更前记录当前状态。任何新变更都使 redo 栈失效。
    pub fn record(&mut self, snapshot: GateSet) {
        self.undo.push(snapshot);
        self.redo.clear();
    }

    /// 回退一步：当前状态压入 redo 栈，返回上一个状态。
    /// 历史为空时返回 `None`，调用方保持现状。
    pub fn undo(&mut self, current: GateSet) -> Option<GateSet> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        Some(previous)
    }

    /// 重做一步：当前状态压回 undo 栈，返回被撤销的状态。
    pub fn redo(&mut self, current: GateSet) -> Option<GateSet> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        Some(next)
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[inline]
    pub fn depths(&self) -> (usize, usize) {
        (self.undo.len(), self.redo.len())
    }
}
