use std::env;
use std::path::PathBuf;

use flowgate_config::{AppConfig, PlotConfig};
use flowgate_core::geometry::{LinearScale, PlotFrame, Point2};
use flowgate_engine::session::GatingSession;
use flowgate_io::CsvPointFile;
use tracing::{info, warn};

use crate::errors::FrontendError;

/// 散点数据来源，便于前端呈现加载信息。
#[derive(Debug, Clone)]
pub enum PointSource {
    Csv(PathBuf),
    Demo,
}

/// 统一封装构建好的会话与元信息。
#[derive(Debug)]
pub struct LoadedSession {
    pub session: GatingSession,
    pub source: PointSource,
    pub config: AppConfig,
}

/// 按绘图配置构建坐标系。X 轴留白从左右两侧各扣去 `margin`；
/// Y 轴显示值域倒置（像素原点在左上角）。
pub fn build_frame(plot: &PlotConfig) -> Result<PlotFrame, FrontendError> {
    let x = LinearScale::new(
        (plot.x_domain[0], plot.x_domain[1]),
        (plot.margin, plot.width - plot.margin),
    )?;
    let y = LinearScale::new(
        (plot.y_domain[0], plot.y_domain[1]),
        (plot.height - plot.margin, plot.margin),
    )?;
    Ok(PlotFrame::new(x, y))
}

/// 构建门控会话：优先从环境变量 `FLOWGATE_POINTS_CSV`（其次配置中的
/// `data.points_path`）加载散点，若失败则回退到内置示例点集。
pub fn load_session_from_env_or_demo(config: AppConfig) -> Result<LoadedSession, FrontendError> {
    let frame = build_frame(&config.plot)?;
    let mut session = GatingSession::new(frame);

    let csv_path = env::var_os("FLOWGATE_POINTS_CSV")
        .map(PathBuf::from)
        .or_else(|| config.data.points_path.clone());

    if let Some(path) = csv_path {
        let loader = CsvPointFile::new(&config.data.x_column, &config.data.y_column);
        match loader.load(&path) {
            Ok(points) => {
                info!(path = %path.display(), count = points.len(), "从 CSV 加载散点成功");
                session.load_points(points);
                return Ok(LoadedSession {
                    session,
                    source: PointSource::Csv(path),
                    config,
                });
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载 CSV 失败，回退到内置示例点集");
            }
        }
    }

    session.load_points(demo_points(&config.plot));
    Ok(LoadedSession {
        session,
        source: PointSource::Demo,
        config,
    })
}

/// 内置示例点集：在数据域内铺一个 20x20 的网格，行为可复现。
pub fn demo_points(plot: &PlotConfig) -> Vec<Point2> {
    const STEPS: usize = 20;
    let mut points = Vec::with_capacity(STEPS * STEPS);
    let (x0, x1) = (plot.x_domain[0], plot.x_domain[1]);
    let (y0, y1) = (plot.y_domain[0], plot.y_domain[1]);
    for row in 0..STEPS {
        for col in 0..STEPS {
            let fx = (col as f64 + 0.5) / STEPS as f64;
            let fy = (row as f64 + 0.5) / STEPS as f64;
            points.push(Point2::new(x0 + fx * (x1 - x0), y0 + fy * (y1 - y0)));
        }
    }
    points
}
