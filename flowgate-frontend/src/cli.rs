use std::env;
use std::path::{Path, PathBuf};

use flowgate_config::AppConfig;
use flowgate_core::geometry::Point2;
use flowgate_engine::command::{CommandBus, CommandContext, CommandRequest};
use flowgate_engine::session::GatingSession;
use flowgate_io::{GateLoader, GateSaver, JsonGateFile};
use tracing::{info, warn};

use crate::errors::FrontendError;
use crate::loader::{LoadedSession, PointSource, load_session_from_env_or_demo};

/// 简易 CLI 演示：加载散点数据（或回退到内置示例），可选导入现有门
/// 文件，否则通过命令总线手绘一个示例门，最后打印统计概览并按需导出。
pub fn run_demo(config: AppConfig) -> Result<(), FrontendError> {
    let LoadedSession {
        mut session,
        source,
        config,
    } = load_session_from_env_or_demo(config)?;

    println!("{}", config.plot.title);
    println!(
        "X 轴: {} [{}, {}]，Y 轴: {} [{}, {}]",
        config.plot.x_label,
        config.plot.x_domain[0],
        config.plot.x_domain[1],
        config.plot.y_label,
        config.plot.y_domain[0],
        config.plot.y_domain[1]
    );
    match &source {
        PointSource::Csv(path) => println!("已从 CSV 加载散点：{}", path.display()),
        PointSource::Demo => println!("使用内置示例点集（{} 个点）", session.points().len()),
    }

    if let Some(path) = env::var_os("FLOWGATE_IMPORT_JSON").map(PathBuf::from) {
        import_gates(&mut session, &path);
    }

    if session.gates().is_empty() {
        draw_demo_gate(&mut session)?;
    }

    print_overview(&session);

    if let Some(path) = env::var_os("FLOWGATE_EXPORT_JSON").map(PathBuf::from) {
        JsonGateFile::new().save(session.gates(), &path)?;
        println!("门集合已导出至 {}", path.display());
    }

    Ok(())
}

/// 导入期间会话处于临界区，其它变更一律被拒绝；
/// 读取失败时中止导入，现有门保持不变。
fn import_gates(session: &mut GatingSession, path: &Path) {
    if let Err(err) = session.begin_import() {
        warn!(error = %err, "无法进入导入流程");
        return;
    }
    match JsonGateFile::new().load(path) {
        Ok(gates) => {
            println!("已从 {} 导入 {} 个门", path.display(), gates.len());
            session.complete_import(gates);
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "导入门文件失败");
            session.abort_import();
        }
    }
}

/// 通过命令总线走一遍标准交互：新建门、三次点击、闭合。
fn draw_demo_gate(session: &mut GatingSession) -> Result<(), FrontendError> {
    let frame = *session.frame();
    let bus = CommandBus::new();
    let mut context = CommandContext { session };

    dispatch(&bus, "new_gate", &mut context);
    for data in [
        Point2::new(350.0, 150.0),
        Point2::new(750.0, 150.0),
        Point2::new(550.0, 600.0),
    ] {
        context.session.handle_click(frame.to_display(data))?;
    }
    dispatch(&bus, "close_gate", &mut context);

    // 顺手演示一次撤销/重做
    dispatch(&bus, "undo", &mut context);
    dispatch(&bus, "redo", &mut context);
    Ok(())
}

fn dispatch(bus: &CommandBus, name: &str, context: &mut CommandContext<'_>) {
    let request = CommandRequest {
        name: name.to_string(),
        args: Vec::new(),
    };
    let response = bus.dispatch(&request, context);
    if let Some(message) = &response.message {
        if response.success {
            info!(command = name, "{message}");
        } else {
            warn!(command = name, "{message}");
        }
    }
}

fn print_overview(session: &GatingSession) {
    let stats = session.statistics_all();
    println!("当前共有 {} 个门：", session.gates().len());
    for (index, (gate, stat)) in session.gates().gates().zip(&stats).enumerate() {
        println!(
            "  - #{index} {} 颜色={} 顶点数={} 闭合={} 可见={} 线型={:?} 命中 {} 点 ({}%)",
            gate.label,
            gate.border_color,
            gate.vertices.len(),
            if gate.closed { "是" } else { "否" },
            if gate.visible { "是" } else { "否" },
            gate.stroke_style,
            stat.inside_count,
            stat.percentage_label()
        );
    }
    println!(
        "可撤销: {}，可重做: {}",
        if session.can_undo() { "是" } else { "否" },
        if session.can_redo() { "是" } else { "否" }
    );
}
