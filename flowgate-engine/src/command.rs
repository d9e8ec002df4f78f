use std::collections::HashMap;

use crate::session::GatingSession;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub session: &'a mut GatingSession,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(NewGateCommand);
        bus.register(CloseGateCommand);
        bus.register(UndoCommand);
        bus.register(RedoCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

struct NewGateCommand;

impl CommandHandler for NewGateCommand {
    fn name(&self) -> &'static str {
        "new_gate"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.session.create_gate() {
            Ok(index) => CommandResponse::ok(format!("已新建门 #{index}，后续点击将加入该门")),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct CloseGateCommand;

impl CommandHandler for CloseGateCommand {
    fn name(&self) -> &'static str {
        "close_gate"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.session.close_active() {
            Ok(true) => CommandResponse::ok("激活门已闭合"),
            Ok(false) => CommandResponse::err("没有可闭合的门（未激活或顶点不足）"),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct UndoCommand;

impl CommandHandler for UndoCommand {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.session.undo() {
            Ok(true) => CommandResponse::ok("已撤销一步"),
            Ok(false) => CommandResponse::err("没有可撤销的操作"),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct RedoCommand;

impl CommandHandler for RedoCommand {
    fn name(&self) -> &'static str {
        "redo"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.session.redo() {
            Ok(true) => CommandResponse::ok("已重做一步"),
            Ok(false) => CommandResponse::err("没有可重做的操作"),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}
