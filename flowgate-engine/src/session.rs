use flowgate_core::geometry::{PlotFrame, Point2};
use flowgate_core::gates::{GateError, GateSet, GateStats, GateUpdate, MoveDirection};
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::history::History;

/// 一次门控会话：散点数据、门集合、激活指针、撤销历史与坐标系。
///
/// 所有修改门集合的入口都遵循同一套规则：
/// - 导入进行中（`begin_import` 之后）一律拒绝，返回 `ImportPending`；
/// - 索引越界是调用方错误，返回 `Err` 且不留历史快照；
/// - UI 时序造成的无效操作静默 no-op（`Ok(false)`），同样不留快照。
/// 因此撤销 N 次必然回到 N 次生效变更之前的状态，不会出现空步。
#[derive(Debug)]
pub struct GatingSession {
    frame: PlotFrame,
    points: Vec<Point2>,
    gates: GateSet,
    active: Option<usize>,
    history: History,
    import_pending: bool,
}

impl GatingSession {
    pub fn new(frame: PlotFrame) -> Self {
        Self {
            frame,
            points: Vec::new(),
            gates: GateSet::new(),
            active: None,
            history: History::new(),
            import_pending: false,
        }
    }

    #[inline]
    pub fn frame(&self) -> &PlotFrame {
        &self.frame
    }

    #[inline]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[inline]
    pub fn gates(&self) -> &GateSet {
        &self.gates
    }

    #[inline]
    pub fn active_gate(&self) -> Option<usize> {
        self.active
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// 载入散点数据，替换现有点集。含 NaN/无穷坐标的点在入口处丢弃，
    /// 后续几何与统计便无需再防御非有限值。
    pub fn load_points(&mut self, points: impl IntoIterator<Item = Point2>) {
        let mut dropped = 0usize;
        self.points.clear();
        for point in points {
            if point.is_finite() {
                self.points.push(point);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(dropped, kept = self.points.len(), "丢弃了非有限坐标的数据点");
        } else {
            debug!(count = self.points.len(), "数据点已载入");
        }
    }

    /// 新建一个空门并将其设为激活门。
    pub fn create_gate(&mut self) -> Result<usize, EngineError> {
        self.check_import()?;
        let before = self.gates.clone();
        let index = self.gates.create_gate();
        self.history.record(before);
        self.active = Some(index);
        debug!(index, "已新建门");
        Ok(index)
    }

    /// 处理一次显示空间点击：反算数据坐标，追加到激活门，
    /// 返回落点的数据坐标。没有激活门时点击无处可去，静默 no-op。
    pub fn handle_click(&mut self, display: Point2) -> Result<Option<Point2>, EngineError> {
        self.check_import()?;
        let Some(index) = self.active else {
            return Ok(None);
        };
        let data = self.frame.to_data(display);
        let before = self.gates.clone();
        if self.gates.add_vertex(index, data)? {
            self.history.record(before);
            Ok(Some(data))
        } else {
            Ok(None)
        }
    }

    /// 闭合激活门并解除激活。顶点不足时维持原状（门保持可绘制）。
    pub fn close_active(&mut self) -> Result<bool, EngineError> {
        self.check_import()?;
        let Some(index) = self.active else {
            return Ok(false);
        };
        let before = self.gates.clone();
        let changed = self.gates.close(index)?;
        if changed {
            self.history.record(before);
            self.active = None;
            debug!(index, "门已闭合");
        }
        Ok(changed)
    }

    /// 更新指定门的样式/可见性字段。
    pub fn update_gate(&mut self, index: usize, update: GateUpdate) -> Result<(), EngineError> {
        self.check_import()?;
        let before = self.gates.clone();
        self.gates.apply(index, update)?;
        self.history.record(before);
        Ok(())
    }

    /// 删除指定门。激活指针一律复位：被删的门可能正是激活门，
    /// 其余情况下索引也已整体前移，不值得追踪。
    pub fn delete_gate(&mut self, index: usize) -> Result<(), EngineError> {
        self.check_import()?;
        let before = self.gates.clone();
        let removed = self.gates.remove(index)?;
        self.history.record(before);
        self.active = None;
        debug!(index, label = %removed.label, "门已删除");
        Ok(())
    }

    /// 上移/下移指定门。生效时激活指针跟随被移动的门。
    pub fn reorder_gate(
        &mut self,
        index: usize,
        direction: MoveDirection,
    ) -> Result<bool, EngineError> {
        self.check_import()?;
        let before = self.gates.clone();
        let changed = self.gates.reorder(index, direction)?;
        if changed {
            self.history.record(before);
            let neighbor = match direction {
                MoveDirection::Up => index - 1,
                MoveDirection::Down => index + 1,
            };
            self.active = match self.active {
                Some(active) if active == index => Some(neighbor),
                Some(active) if active == neighbor => Some(index),
                other => other,
            };
        }
        Ok(changed)
    }

    /// 撤销最近一次生效变更。无历史时 no-op。
    pub fn undo(&mut self) -> Result<bool, EngineError> {
        self.check_import()?;
        let current = self.gates.clone();
        match self.history.undo(current) {
            Some(previous) => {
                self.gates = previous;
                self.active = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 重做最近一次被撤销的变更。
    pub fn redo(&mut self) -> Result<bool, EngineError> {
        self.check_import()?;
        let current = self.gates.clone();
        match self.history.redo(current) {
            Some(next) => {
                self.gates = next;
                self.active = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 进入导入临界区：此后所有变更入口被拒绝，直到 complete/abort。
    pub fn begin_import(&mut self) -> Result<(), EngineError> {
        if self.import_pending {
            return Err(EngineError::ImportPending);
        }
        self.import_pending = true;
        Ok(())
    }

    /// 以导入结果整体替换门集合。替换本身是一次可撤销的变更：
    /// 文档通过结构校验后才提交替换前的快照。
    pub fn complete_import(&mut self, gates: GateSet) {
        let before = std::mem::replace(&mut self.gates, gates);
        self.history.record(before);
        self.active = None;
        self.import_pending = false;
        debug!(count = self.gates.len(), "导入完成");
    }

    /// 放弃导入，恢复可变更状态，现有门集合保持不动。
    pub fn abort_import(&mut self) {
        self.import_pending = false;
        warn!("导入已中止，门集合保持不变");
    }

    #[inline]
    pub fn import_pending(&self) -> bool {
        self.import_pending
    }

    /// 指定门的包含统计。每次调用即时重算，不做缓存。
    pub fn statistics(&self, index: usize) -> Result<GateStats, EngineError> {
        let gate = self
            .gates
            .gate(index)
            .ok_or(GateError::IndexOutOfRange {
                index,
                len: self.gates.len(),
            })?;
        Ok(gate.statistics(&self.points))
    }

    /// 对每个门计算包含统计，顺序与门集合一致。
    pub fn statistics_all(&self) -> Vec<GateStats> {
        self.gates
            .gates()
            .map(|gate| gate.statistics(&self.points))
            .collect()
    }

    fn check_import(&self) -> Result<(), EngineError> {
        if self.import_pending {
            Err(EngineError::ImportPending)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use flowgate_core::geometry::LinearScale;
    use flowgate_core::gates::{GateError, StrokeStyle};

    use super::*;

    fn demo_frame() -> PlotFrame {
        PlotFrame::new(
            LinearScale::new((200.0, 1000.0), (50.0, 750.0)).unwrap(),
            LinearScale::new((0.0, 1000.0), (550.0, 50.0)).unwrap(),
        )
    }

    fn session() -> GatingSession {
        GatingSession::new(demo_frame())
    }

    fn draw_triangle(session: &mut GatingSession) -> usize {
        let index = session.create_gate().unwrap();
        let frame = *session.frame();
        for data in [
            Point2::new(300.0, 100.0),
            Point2::new(700.0, 100.0),
            Point2::new(500.0, 500.0),
        ] {
            let display = frame.to_display(data);
            assert!(session.handle_click(display).unwrap().is_some());
        }
        assert!(session.close_active().unwrap());
        index
    }

    #[test]
    fn click_coordinates_land_in_data_space() {
        let mut session = session();
        let index = draw_triangle(&mut session);

        let gate = session.gates().gate(index).unwrap();
        assert!(gate.closed);
        assert_eq!(gate.vertices.len(), 4);
        assert!((gate.vertices[0].x() - 300.0).abs() < 1e-9);
        assert!((gate.vertices[0].y() - 100.0).abs() < 1e-9);
        assert_eq!(gate.vertices[3], gate.vertices[0]);
    }

    #[test]
    fn clicks_without_an_active_gate_do_nothing() {
        let mut session = session();
        assert!(session
            .handle_click(Point2::new(100.0, 100.0))
            .unwrap()
            .is_none());
        assert!(session.gates().is_empty());
        assert!(!session.can_undo());

        draw_triangle(&mut session);
        // close_active cleared the pointer; a stray click must not reopen
        assert!(session
            .handle_click(Point2::new(100.0, 100.0))
            .unwrap()
            .is_none());
        assert_eq!(session.gates().gate(0).unwrap().vertices.len(), 4);
    }

    #[test]
    fn handle_click_returns_the_data_space_point() {
        let mut session = session();
        session.create_gate().unwrap();
        let display = session.frame().to_display(Point2::new(300.0, 100.0));
        let data = session.handle_click(display).unwrap().unwrap();
        assert!((data.x() - 300.0).abs() < 1e-9);
        assert!((data.y() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn statistics_track_drawn_gates() {
        let mut session = session();
        session.load_points([
            Point2::new(400.0, 150.0),
            Point2::new(500.0, 200.0),
            Point2::new(900.0, 900.0),
            Point2::new(250.0, 50.0),
        ]);
        draw_triangle(&mut session);

        let stats = session.statistics_all();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].inside_count, 2);
        assert_eq!(stats[0].percentage_label(), "50.00");

        let single = session.statistics(0).unwrap();
        assert_eq!(single.inside_count, 2);
        assert!(session.statistics(3).is_err());
    }

    #[test]
    fn load_points_drops_non_finite_coordinates() {
        let mut session = session();
        session.load_points([
            Point2::new(400.0, 150.0),
            Point2::new(f64::NAN, 150.0),
            Point2::new(400.0, f64::INFINITY),
        ]);
        assert_eq!(session.points().len(), 1);
    }

    #[test]
    fn undo_walks_back_through_effective_changes_only() {
        let mut session = session();
        let index = session.create_gate().unwrap();
        let frame = *session.frame();
        for data in [
            Point2::new(300.0, 100.0),
            Point2::new(700.0, 100.0),
        ] {
            session.handle_click(frame.to_display(data)).unwrap();
        }
        // two vertices are not enough to close: no-op, no snapshot
        assert!(!session.close_active().unwrap());
        assert_eq!(session.history.depths().0, 3);

        assert!(session.undo().unwrap());
        assert_eq!(session.gates().gate(index).unwrap().vertices.len(), 1);
        assert!(session.undo().unwrap());
        assert_eq!(session.gates().gate(index).unwrap().vertices.len(), 0);
        assert!(session.undo().unwrap());
        assert!(session.gates().is_empty());
        assert!(!session.undo().unwrap());
    }

    #[test]
    fn redo_is_invalidated_by_a_new_change() {
        let mut session = session();
        session.create_gate().unwrap();
        session.undo().unwrap();
        assert!(session.can_redo());

        session.create_gate().unwrap();
        assert!(!session.can_redo());
        assert!(!session.redo().unwrap());
    }

    #[test]
    fn undo_and_redo_reset_the_active_pointer() {
        let mut session = session();
        session.create_gate().unwrap();
        assert_eq!(session.active_gate(), Some(0));

        session.undo().unwrap();
        assert_eq!(session.active_gate(), None);

        session.redo().unwrap();
        assert_eq!(session.active_gate(), None);
        assert_eq!(session.gates().len(), 1);
    }

    #[test]
    fn update_and_delete_round_trip_through_history() {
        let mut session = session();
        draw_triangle(&mut session);

        session
            .update_gate(0, GateUpdate::Label("CD45+".to_string()))
            .unwrap();
        session
            .update_gate(0, GateUpdate::StrokeStyle(StrokeStyle::Dashed))
            .unwrap();
        session.delete_gate(0).unwrap();
        assert!(session.gates().is_empty());
        assert_eq!(session.active_gate(), None);

        session.undo().unwrap();
        let gate = session.gates().gate(0).unwrap();
        assert_eq!(gate.label, "CD45+");
        assert_eq!(gate.stroke_style, StrokeStyle::Dashed);
        assert_eq!(gate.vertices.len(), 4);
        assert_eq!(session.active_gate(), None);

        session.undo().unwrap();
        assert_eq!(session.gates().gate(0).unwrap().stroke_style, StrokeStyle::Solid);
    }

    #[test]
    fn bad_index_is_an_error_and_leaves_no_snapshot() {
        let mut session = session();
        draw_triangle(&mut session);
        let depth_before = session.history.depths().0;

        let err = session
            .update_gate(5, GateUpdate::Visible(false))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Gate(GateError::IndexOutOfRange { index: 5, .. })
        ));
        assert!(session.delete_gate(5).is_err());
        assert!(session.reorder_gate(5, MoveDirection::Up).is_err());
        assert_eq!(session.history.depths().0, depth_before);
    }

    #[test]
    fn reorder_moves_the_active_pointer_with_the_gate() {
        let mut session = session();
        session.create_gate().unwrap();
        session.create_gate().unwrap();
        let third = session.create_gate().unwrap();
        assert_eq!(session.active_gate(), Some(third));

        assert!(session.reorder_gate(third, MoveDirection::Up).unwrap());
        assert_eq!(session.active_gate(), Some(1));
        assert_eq!(session.gates().gate(1).unwrap().label, "Region 3");

        // boundary no-op keeps the pointer in place
        assert!(!session.reorder_gate(0, MoveDirection::Up).unwrap());
        assert_eq!(session.active_gate(), Some(1));
    }

    #[test]
    fn import_critical_section_rejects_mutations() {
        let mut session = session();
        draw_triangle(&mut session);

        session.begin_import().unwrap();
        assert!(matches!(
            session.create_gate(),
            Err(EngineError::ImportPending)
        ));
        assert!(matches!(
            session.handle_click(Point2::new(0.0, 0.0)),
            Err(EngineError::ImportPending)
        ));
        assert!(matches!(session.undo(), Err(EngineError::ImportPending)));
        assert!(matches!(
            session.begin_import(),
            Err(EngineError::ImportPending)
        ));

        let mut imported = GateSet::new();
        imported.create_gate();
        imported.create_gate();
        session.complete_import(imported);

        assert!(!session.import_pending());
        assert_eq!(session.gates().len(), 2);
        assert_eq!(session.active_gate(), None);

        // the import itself is one undoable step
        assert!(session.undo().unwrap());
        assert_eq!(session.gates().len(), 1);
        assert!(session.gates().gate(0).unwrap().closed);
        assert!(session.redo().unwrap());
        assert_eq!(session.gates().len(), 2);
    }

    #[test]
    fn aborted_import_preserves_state_and_history() {
        let mut session = session();
        draw_triangle(&mut session);
        let depth = session.history.depths().0;

        session.begin_import().unwrap();
        session.abort_import();

        assert!(!session.import_pending());
        assert_eq!(session.gates().len(), 1);
        assert_eq!(session.history.depths().0, depth);
        assert!(session.create_gate().is_ok());
    }
}
