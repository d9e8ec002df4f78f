use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `FLOWGATE_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("FLOWGATE_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 绘图区配置：画布尺寸、留白与两个轴的数据域及标签。
/// 默认值对应 800x600 画布、50 像素留白的经典布局。
#[derive(Debug, Clone, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "PlotConfig::default_width")]
    pub width: f64,
    #[serde(default = "PlotConfig::default_height")]
    pub height: f64,
    #[serde(default = "PlotConfig::default_margin")]
    pub margin: f64,
    #[serde(default = "PlotConfig::default_x_domain")]
    pub x_domain: [f64; 2],
    #[serde(default = "PlotConfig::default_y_domain")]
    pub y_domain: [f64; 2],
    #[serde(default = "PlotConfig::default_x_label")]
    pub x_label: String,
    #[serde(default = "PlotConfig::default_y_label")]
    pub y_label: String,
    #[serde(default = "PlotConfig::default_title")]
    pub title: String,
}

impl PlotConfig {
    fn default_width() -> f64 {
        800.0
    }

    fn default_height() -> f64 {
        600.0
    }

    fn default_margin() -> f64 {
        50.0
    }

    fn default_x_domain() -> [f64; 2] {
        [200.0, 1000.0]
    }

    fn default_y_domain() -> [f64; 2] {
        [0.0, 1000.0]
    }

    fn default_x_label() -> String {
        "CD45-KrO".to_string()
    }

    fn default_y_label() -> String {
        "SS INT LIN".to_string()
    }

    fn default_title() -> String {
        "Cell Distribution (CD45+)".to_string()
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            margin: Self::default_margin(),
            x_domain: Self::default_x_domain(),
            y_domain: Self::default_y_domain(),
            x_label: Self::default_x_label(),
            y_label: Self::default_y_label(),
            title: Self::default_title(),
        }
    }
}

/// 散点数据来源：CSV 文件路径与两个目标列名。
/// 列名默认与轴标签一致，也可以单独覆盖。
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub points_path: Option<PathBuf>,
    #[serde(default = "PlotConfig::default_x_label")]
    pub x_column: String,
    #[serde(default = "PlotConfig::default_y_label")]
    pub y_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            points_path: None,
            x_column: PlotConfig::default_x_label(),
            y_column: PlotConfig::default_y_label(),
        }
    }
}

/// 门文件导出配置。
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "ExportConfig::default_filename")]
    pub default_filename: String,
}

impl ExportConfig {
    fn default_filename() -> String {
        "polygons.json".to_string()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_filename: Self::default_filename(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
