pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    /// 二维点，内部以 `glam::DVec2` 表示。数据空间与显示空间共用该类型。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.x.is_finite() && self.0.y.is_finite()
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 坐标变换构造失败：域或值域退化（端点相等或非有限）。
    /// 这是配置错误，必须在构造时拒绝，而不是运行时除零。
    #[derive(Debug, Error)]
    pub enum ScaleError {
        #[error("degenerate domain [{0}, {1}]")]
        DegenerateDomain(f64, f64),
        #[error("degenerate range [{0}, {1}]")]
        DegenerateRange(f64, f64),
    }

    /// 单轴线性（仿射）映射：数据域 `[d0, d1]` 到显示值域 `[r0, r1]`。
    /// `forward` 与 `invert` 互为逆运算，往返误差在浮点容差内。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct LinearScale {
        d0: f64,
        d1: f64,
        r0: f64,
        r1: f64,
    }

    impl LinearScale {
        pub fn new(domain: (f64, f64), range: (f64, f64)) -> Result<Self, ScaleError> {
            let (d0, d1) = domain;
            let (r0, r1) = range;
            if !d0.is_finite() || !d1.is_finite() || d0 == d1 {
                return Err(ScaleError::DegenerateDomain(d0, d1));
            }
            if !r0.is_finite() || !r1.is_finite() || r0 == r1 {
                return Err(ScaleError::DegenerateRange(r0, r1));
            }
            Ok(Self { d0, d1, r0, r1 })
        }

        #[inline]
        pub fn forward(&self, data: f64) -> f64 {
            self.r0 + (data - self.d0) / (self.d1 - self.d0) * (self.r1 - self.r0)
        }

        #[inline]
        pub fn invert(&self, display: f64) -> f64 {
            self.d0 + (display - self.r0) / (self.r1 - self.r0) * (self.d1 - self.d0)
        }

        #[inline]
        pub fn domain(&self) -> (f64, f64) {
            (self.d0, self.d1)
        }

        #[inline]
        pub fn range(&self) -> (f64, f64) {
            (self.r0, self.r1)
        }
    }

    /// 绘图坐标系：X/Y 两个轴向的线性映射组合。
    /// 点击输入用 `to_data` 反算数据坐标，渲染用 `to_display`。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct PlotFrame {
        x: LinearScale,
        y: LinearScale,
    }

    impl PlotFrame {
        #[inline]
        pub fn new(x: LinearScale, y: LinearScale) -> Self {
            Self { x, y }
        }

        #[inline]
        pub fn to_display(&self, point: Point2) -> Point2 {
            Point2::new(self.x.forward(point.x()), self.y.forward(point.y()))
        }

        #[inline]
        pub fn to_data(&self, point: Point2) -> Point2 {
            Point2::new(self.x.invert(point.x()), self.y.invert(point.y()))
        }

        #[inline]
        pub fn x_scale(&self) -> &LinearScale {
            &self.x
        }

        #[inline]
        pub fn y_scale(&self) -> &LinearScale {
            &self.y
        }
    }

    /// 偶奇规则（射线法）的多边形包含测试。
    ///
    /// 边界视为从最后一个顶点隐式闭合回第一个顶点，因此末尾重复的收尾
    /// 顶点无需特殊处理。不足 3 个互异顶点的多边形不包含任何点。
    /// 恰好落在边界上的点归属由射线测试决定：同一遍计算内保持确定且一致，
    /// 但不承诺总是判为内部或总是判为外部。
    pub fn polygon_contains(vertices: &[Point2], probe: Point2) -> bool {
        if distinct_vertex_count(vertices) < 3 {
            return false;
        }

        let px = probe.x();
        let py = probe.y();
        let mut inside = false;
        let mut j = vertices.len() - 1;
        for i in 0..vertices.len() {
            let (xi, yi) = (vertices[i].x(), vertices[i].y());
            let (xj, yj) = (vertices[j].x(), vertices[j].y());
            if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    fn distinct_vertex_count(vertices: &[Point2]) -> usize {
        let mut count = 0;
        for (i, vertex) in vertices.iter().enumerate() {
            if !vertices[..i].contains(vertex) {
                count += 1;
            }
        }
        count
    }

}

pub mod gates {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::geometry::{Point2, polygon_contains};

    /// 新建门的默认边框色（蓝色），与导入时的回退值保持一致。
    pub const DEFAULT_BORDER_COLOR: &str = "#0000FF";

    const DASHED_PATTERN: [f64; 2] = [5.0, 5.0];

    /// 边框线型。序列化为文档中的 `"SOLID"` / `"DASHED"`。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum StrokeStyle {
        Solid,
        Dashed,
    }

    impl StrokeStyle {
        /// 渲染协作方使用的虚线段描述；实线为空数组。
        #[inline]
        pub fn dash_pattern(self) -> &'static [f64] {
            match self {
                StrokeStyle::Solid => &[],
                StrokeStyle::Dashed => &DASHED_PATTERN,
            }
        }
    }

    impl Default for StrokeStyle {
        fn default() -> Self {
            StrokeStyle::Solid
        }
    }

    /// 一个门（用户手绘的多边形区域）。顶点始终保存数据空间坐标，
    /// 与视口尺寸无关。身份由所属 `GateSet` 中的位置决定，没有独立 ID。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Gate {
        pub vertices: Vec<Point2>,
        pub label: String,
        pub border_color: String,
        pub stroke_style: StrokeStyle,
        pub visible: bool,
        pub closed: bool,
    }

    impl Gate {
        /// 按位置序号 `ordinal`（从 1 计）生成默认标签 `Region N` 的空门。
        pub fn with_ordinal(ordinal: usize) -> Self {
            Self {
                vertices: Vec::new(),
                label: format!("Region {ordinal}"),
                border_color: DEFAULT_BORDER_COLOR.to_string(),
                stroke_style: StrokeStyle::default(),
                visible: true,
                closed: false,
            }
        }

        /// 对点集做包含统计。边界闭合规则见 `polygon_contains`。
        pub fn statistics(&self, points: &[Point2]) -> GateStats {
            let inside_count = points
                .iter()
                .filter(|point| polygon_contains(&self.vertices, **point))
                .count();
            GateStats::new(inside_count, points.len())
        }
    }

    /// 单个门的包含统计。`percentage` 已四舍五入到两位小数；
    /// 空点集显式给出 0，不产生 NaN。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GateStats {
        pub inside_count: usize,
        pub percentage: f64,
    }

    impl GateStats {
        fn new(inside_count: usize, total: usize) -> Self {
            let percentage = if total == 0 {
                0.0
            } else {
                let raw = inside_count as f64 / total as f64 * 100.0;
                (raw * 100.0).round() / 100.0
            };
            Self {
                inside_count,
                percentage,
            }
        }

        /// 展示用的百分比字符串，固定两位小数，如 `"50.00"`。
        pub fn percentage_label(&self) -> String {
            format!("{:.2}", self.percentage)
        }
    }

    /// 针对单个门的一次字段更新。封闭的枚举使未知字段名在编译期即不可能。
    #[derive(Debug, Clone, PartialEq)]
    pub enum GateUpdate {
        Label(String),
        BorderColor(String),
        StrokeStyle(StrokeStyle),
        Visible(bool),
    }

    /// 重排方向。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MoveDirection {
        Up,
        Down,
    }

    #[derive(Debug, Error)]
    pub enum GateError {
        #[error("gate index {index} out of range (len = {len})")]
        IndexOutOfRange { index: usize, len: usize },
    }

    /// 有序的门集合。集合顺序即渲染 z 序（靠后者盖在上层），
    /// 也是上移/下移操作的权威顺序。
    ///
    /// 约定：索引越界是硬错误（`Err`，调用方不得据此快照历史）；
    /// 普通 UI 时序造成的无效操作（向已闭合的门加点、顶点不足时闭合、
    /// 边界处重排）静默退化为 no-op，以 `Ok(false)` 表示未生效。
    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    pub struct GateSet {
        gates: Vec<Gate>,
    }

    impl GateSet {
        pub fn new() -> Self {
            Self::default()
        }

        /// 用现成的门列表构建集合（导入路径）。
        pub fn from_gates(gates: Vec<Gate>) -> Self {
            Self { gates }
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.gates.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.gates.is_empty()
        }

        #[inline]
        pub fn gate(&self, index: usize) -> Option<&Gate> {
            self.gates.get(index)
        }

        #[inline]
        pub fn gates(&self) -> impl Iterator<Item = &Gate> {
            self.gates.iter()
        }

        /// 追加一个默认样式的空门，返回其索引供激活。
        pub fn create_gate(&mut self) -> usize {
            let ordinal = self.gates.len() + 1;
            self.gates.push(Gate::with_ordinal(ordinal));
            self.gates.len() - 1
        }

        /// 向指定门追加一个数据空间顶点。门已闭合时为 no-op。
        pub fn add_vertex(&mut self, index: usize, point: Point2) -> Result<bool, GateError> {
            let gate = self.gate_mut(index)?;
            if gate.closed {
                return Ok(false);
            }
            gate.vertices.push(point);
            Ok(true)
        }

        /// 闭合指定门：复制首顶点为收尾顶点并标记 `closed`。
        /// 顶点不超过 2 个或已闭合时静默 no-op（与原始行为一致）。
        pub fn close(&mut self, index: usize) -> Result<bool, GateError> {
            let gate = self.gate_mut(index)?;
            if gate.closed || gate.vertices.len() <= 2 {
                return Ok(false);
            }
            let first = gate.vertices[0];
            gate.vertices.push(first);
            gate.closed = true;
            Ok(true)
        }

        /// 应用一次字段更新。
        pub fn apply(&mut self, index: usize, update: GateUpdate) -> Result<(), GateError> {
            let gate = self.gate_mut(index)?;
            match update {
                GateUpdate::Label(label) => gate.label = label,
                GateUpdate::BorderColor(color) => gate.border_color = color,
                GateUpdate::StrokeStyle(style) => gate.stroke_style = style,
                GateUpdate::Visible(visible) => gate.visible = visible,
            }
            Ok(())
        }

        /// 删除指定门，后续索引依次前移。
        pub fn remove(&mut self, index: usize) -> Result<Gate, GateError> {
            self.check_index(index)?;
            Ok(self.gates.remove(index))
        }

        /// 与相邻门交换位置。首门上移、末门下移为 no-op。
        pub fn reorder(
            &mut self,
            index: usize,
            direction: MoveDirection,
        ) -> Result<bool, GateError> {
            self.check_index(index)?;
            let neighbor = match direction {
                MoveDirection::Up => {
                    if index == 0 {
                        return Ok(false);
                    }
                    index - 1
                }
                MoveDirection::Down => {
                    if index + 1 == self.gates.len() {
                        return Ok(false);
                    }
                    index + 1
                }
            };
            self.gates.swap(index, neighbor);
            Ok(true)
        }

        fn check_index(&self, index: usize) -> Result<(), GateError> {
            if index < self.gates.len() {
                Ok(())
            } else {
                Err(GateError::IndexOutOfRange {
                    index,
                    len: self.gates.len(),
                })
            }
        }

        fn gate_mut(&mut self, index: usize) -> Result<&mut Gate, GateError> {
            let len = self.gates.len();
            self.gates
                .get_mut(index)
                .ok_or(GateError::IndexOutOfRange { index, len })
        }
    }

}
