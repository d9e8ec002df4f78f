use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use flowgate_core::gates::{DEFAULT_BORDER_COLOR, Gate, GateSet, StrokeStyle};
use flowgate_core::geometry::Point2;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

pub trait GateLoader {
    fn load(&self, path: &Path) -> Result<GateSet, IoError>;
}

pub trait GateSaver {
    fn save(&self, gates: &GateSet, path: &Path) -> Result<(), IoError>;
}

/// JSON 门文件的读写门面。字段命名沿用导出文档的 camelCase 约定。
pub struct JsonGateFile;

impl JsonGateFile {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonGateFile {
    fn default() -> Self {
        Self::new()
    }
}

impl GateLoader for JsonGateFile {
    fn load(&self, path: &Path) -> Result<GateSet, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        gates_from_json(&data)
    }
}

impl GateSaver for JsonGateFile {
    fn save(&self, gates: &GateSet, path: &Path) -> Result<(), IoError> {
        let data = gates_to_json(gates)?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
}

/// 线型字段的宽容解析：既接受 `"SOLID"`/`"DASHED"` 名称，
/// 也接受旧文档中的虚线段数组（空数组表示实线）。
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StrokeStyleField {
    Name(String),
    Dash(Vec<f64>),
}

impl StrokeStyleField {
    fn resolve(self) -> StrokeStyle {
        match self {
            StrokeStyleField::Name(name) => match name.trim().to_ascii_uppercase().as_str() {
                "DASHED" => StrokeStyle::Dashed,
                _ => StrokeStyle::Solid,
            },
            StrokeStyleField::Dash(segments) => {
                if segments.is_empty() {
                    StrokeStyle::Solid
                } else {
                    StrokeStyle::Dashed
                }
            }
        }
    }
}

/// 单个门在文档中的形态。除顶点外其余字段均可缺省，
/// 缺省值与交互端新建门的默认值一致。
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GateRecord {
    vertices: Vec<PointRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stroke_style: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    closed: Option<bool>,
}

impl GateRecord {
    fn from_gate(gate: &Gate) -> Self {
        Self {
            vertices: gate
                .vertices
                .iter()
                .map(|point| PointRecord {
                    x: point.x(),
                    y: point.y(),
                })
                .collect(),
            label: Some(gate.label.clone()),
            border_color: Some(gate.border_color.clone()),
            stroke_style: Some(serde_json::Value::String(
                match gate.stroke_style {
                    StrokeStyle::Solid => "SOLID",
                    StrokeStyle::Dashed => "DASHED",
                }
                .to_string(),
            )),
            visible: Some(gate.visible),
            closed: Some(gate.closed),
        }
    }

    fn into_gate(self, ordinal: usize) -> Result<Gate, IoError> {
        let vertices: Vec<Point2> = self
            .vertices
            .iter()
            .map(|record| Point2::new(record.x, record.y))
            .collect();
        if vertices.iter().any(|point| !point.is_finite()) {
            return Err(IoError::InvalidDocument(format!(
                "门 #{ordinal} 含有非有限坐标的顶点"
            )));
        }

        let stroke_style = match self.stroke_style {
            Some(value) => serde_json::from_value::<StrokeStyleField>(value)
                .map(StrokeStyleField::resolve)
                .unwrap_or_default(),
            None => StrokeStyle::default(),
        };

        // 旧文档没有 closed 字段，按「收尾顶点回到首顶点」推断
        let closed = self.closed.unwrap_or_else(|| {
            vertices.len() >= 4 && vertices.first() == vertices.last()
        });

        Ok(Gate {
            vertices,
            label: self.label.unwrap_or_else(|| format!("Region {ordinal}")),
            border_color: self
                .border_color
                .unwrap_or_else(|| DEFAULT_BORDER_COLOR.to_string()),
            stroke_style,
            visible: self.visible.unwrap_or(true),
            closed,
        })
    }
}

/// 把门集合序列化为 JSON 文本（带缩进，便于人工查看和版本管理）。
pub fn gates_to_json(gates: &GateSet) -> Result<String, IoError> {
    let records: Vec<GateRecord> = gates.gates().map(GateRecord::from_gate).collect();
    serde_json::to_string_pretty(&records)
        .map_err(|err| IoError::InvalidDocument(format!("序列化失败: {err}")))
}

/// 从 JSON 文本解析门集合。顶点字段缺失或类型不符是硬错误；
/// 样式类字段缺失时回退到默认值。
pub fn gates_from_json(data: &str) -> Result<GateSet, IoError> {
    let records: Vec<GateRecord> = serde_json::from_str(data)
        .map_err(|err| IoError::InvalidDocument(format!("JSON 解析失败: {err}")))?;
    let gates = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_gate(index + 1))
        .collect::<Result<Vec<Gate>, IoError>>()?;
    Ok(GateSet::from_gates(gates))
}

/// CSV 散点文件读取：按表头名定位 X/Y 两列。
pub struct CsvPointFile {
    x_column: String,
    y_column: String,
}

impl CsvPointFile {
    pub fn new(x_column: impl Into<String>, y_column: impl Into<String>) -> Self {
        Self {
            x_column: x_column.into(),
            y_column: y_column.into(),
        }
    }

    pub fn load(&self, path: &Path) -> Result<Vec<Point2>, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        points_from_csv(&data, &self.x_column, &self.y_column)
    }
}

/// 解析 CSV 文本为散点。首行必须是表头且包含两个目标列；
/// 数值解析失败或字段缺失的数据行跳过（与空行同样处理）。
pub fn points_from_csv(data: &str, x_column: &str, y_column: &str) -> Result<Vec<Point2>, IoError> {
    let mut lines = data.lines();
    let header = lines
        .next()
        .ok_or_else(|| IoError::InvalidDocument("CSV 为空，缺少表头行".to_string()))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let x_index = columns
        .iter()
        .position(|name| *name == x_column)
        .ok_or_else(|| IoError::InvalidDocument(format!("CSV 表头缺少列 {x_column:?}")))?;
    let y_index = columns
        .iter()
        .position(|name| *name == y_column)
        .ok_or_else(|| IoError::InvalidDocument(format!("CSV 表头缺少列 {y_column:?}")))?;

    let mut points = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let x = fields.get(x_index).and_then(|raw| raw.parse::<f64>().ok());
        let y = fields.get(y_index).and_then(|raw| raw.parse::<f64>().ok());
        if let (Some(x), Some(y)) = (x, y) {
            points.push(Point2::new(x, y));
        }
    }
    Ok(points)
}
