use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use crate::ui::QuitSignal;
use std::io::{self, Stdout};
use std::thread::{self, ThreadId};
use tracing::{debug, error};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// # Summary
/// 终端接管守卫：获取时进入原始模式与备用屏幕，释放时无条件恢复。
///
/// # Invariants
/// - 任何退出路径 (正常返回、错误传播、panic) 都会恢复终端。
pub struct TerminalGuard {
    terminal: Tui,
}

impl TerminalGuard {
    /// # Summary
    /// 接管终端。
    ///
    /// # Logic
    /// 1. 安装 panic hook：界面线程 panic 时先恢复终端，其他线程 panic 时置位退出信号，
    ///    由界面循环正常退出并经守卫恢复终端。
    /// 2. 开启原始模式并切换到备用屏幕。
    /// 3. 任一步骤失败时回滚已完成的步骤。
    ///
    /// # Arguments
    /// * `quit`: 界面循环观察的退出信号。
    pub fn acquire(quit: QuitSignal) -> io::Result<Self> {
        install_panic_hook(PanicPolicy::new(quit));

        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            restore();
            return Err(e);
        }

        match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(terminal) => {
                debug!("Terminal acquired");
                Ok(Self { terminal })
            }
            Err(e) => {
                restore();
                Err(e)
            }
        }
    }

    pub fn terminal(&mut self) -> &mut Tui {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
        if let Err(e) = self.terminal.show_cursor() {
            error!("Failed to show cursor: {}", e);
        }
        debug!("Terminal restored");
    }
}

/// 退出原始模式并离开备用屏幕，失败只记录日志。
fn restore() {
    if let Err(e) = disable_raw_mode() {
        error!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
        error!("Failed to leave alternate screen: {}", e);
    }
}

/// panic 发生的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanicScope {
    // 持有终端的界面线程
    Ui,
    // 后台任务等其他线程
    Background,
}

/// # Summary
/// panic 时的终端处理策略，绑定获取终端的线程。
///
/// # Invariants
/// - 只有界面线程直接恢复终端，避免界面循环仍在绘制时离开备用屏幕。
struct PanicPolicy {
    owner: ThreadId,
    quit: QuitSignal,
}

impl PanicPolicy {
    fn new(quit: QuitSignal) -> Self {
        Self {
            owner: thread::current().id(),
            quit,
        }
    }

    fn handle(&self) -> PanicScope {
        if thread::current().id() == self.owner {
            restore();
            PanicScope::Ui
        } else {
            error!("Background thread panicked, stopping the UI");
            self.quit.trigger();
            PanicScope::Background
        }
    }
}

fn install_panic_hook(policy: PanicPolicy) {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        policy.handle();
        original(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_panic_triggers_quit_without_restoring() {
        let quit = QuitSignal::new();
        let policy = PanicPolicy::new(quit.clone());

        let scope = thread::scope(|s| s.spawn(|| policy.handle()).join().unwrap());

        assert_eq!(scope, PanicScope::Background);
        assert!(quit.is_triggered());
    }
}
