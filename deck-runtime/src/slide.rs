//! # Slide 模块
//!
//! 单张幻灯片的运行时：脚本执行、展示状态游标与就绪屏障。
//!
//! ## 执行模型
//!
//! 展示状态建模为**显式状态机**，没有协程挂起：
//!
//! ```text
//! 脚本主体          -> 状态 0（立即执行）
//! reveal(step) × N -> 状态 1..=N（记录为步骤，等待 advance 触发）
//! ```
//!
//! 每次导航都重新执行一遍脚本、重建步骤序列：重新进入一张幻灯片
//! 等价于重启它的脚本。向后导航因此是"重启 + 快进到目标状态"，
//! 快进阶段的步骤以禁用过渡的方式立即执行。
//!
//! ## 失败语义
//!
//! 脚本主体或步骤返回 `Err` 不会让控制器崩溃：错误锁存到同步屏障，
//! 就绪状态变为 `Failed`，该幻灯片永远不会 `complete`，
//! 但导航到其他幻灯片仍然可用。

use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::barrier::{Readiness, SyncBarrier, SyncHandle};
use crate::command::{Command, SurfaceId};
use crate::error::SlideError;

/// 幻灯片脚本
///
/// 接收 [`SlideSpec`] 控制句柄：主体内容操作立即生效（状态 0），
/// `reveal()` 记录后续的展示状态。
pub type SlideFn = Rc<dyn Fn(&mut SlideSpec<'_>) -> Result<(), SlideError>>;

/// 展示步骤
type StepFn = Box<dyn FnOnce(&mut StepCtx<'_>) -> Result<(), SlideError>>;

/// 初始展示状态
///
/// 向后导航进入上一张幻灯片时要落在它的**最后一个**状态，
/// 而状态总数只有重新执行脚本之后才知道，所以用哨兵值表达"最后"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialState {
    /// 指定状态索引（超出末尾时钳到最后一个状态）
    State(usize),
    /// 最后一个状态
    Last,
}

impl Default for InitialState {
    fn default() -> Self {
        Self::State(0)
    }
}

/// 脚本运行参数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunOptions {
    /// 起始展示状态
    pub initial_state: InitialState,
    /// 是否跳过过渡（脚本内部的定时展示也随之直接跳到结果）
    pub skip_transition: bool,
}

/// 展示步骤的执行上下文
pub struct StepCtx<'a> {
    surface: SurfaceId,
    commands: &'a mut Vec<Command>,
    sync: SyncHandle,
    transitions_enabled: bool,
}

impl<'a> StepCtx<'a> {
    fn new(
        surface: SurfaceId,
        commands: &'a mut Vec<Command>,
        sync: SyncHandle,
        transitions_enabled: bool,
    ) -> Self {
        Self {
            surface,
            commands,
            sync,
            transitions_enabled,
        }
    }

    /// 本幻灯片的舞台表面
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// 在表面上挂载一段文本
    pub fn mount_text(&mut self, text: impl Into<String>) {
        self.commands.push(Command::MountText {
            surface: self.surface,
            text: text.into(),
        });
    }

    /// 发出任意指令
    pub fn emit(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// 同步屏障句柄（内容 widget 用它注册待定票据）
    pub fn sync(&self) -> SyncHandle {
        self.sync.clone()
    }

    /// 本次执行是否允许内部动画
    ///
    /// 请求跳过过渡时、以及重启后快进期间为 `false`，
    /// 脚本应据此直接跳到最终展示结果。
    pub fn transitions_enabled(&self) -> bool {
        self.transitions_enabled
    }
}

/// 脚本构建/控制句柄
///
/// 脚本主体通过它立即挂载状态 0 的内容，并用 [`SlideSpec::reveal`]
/// 记录后续展示状态。
pub struct SlideSpec<'a> {
    ctx: StepCtx<'a>,
    steps: Vec<StepFn>,
}

impl<'a> SlideSpec<'a> {
    /// 记录一个展示状态
    pub fn reveal(
        &mut self,
        step: impl FnOnce(&mut StepCtx<'_>) -> Result<(), SlideError> + 'static,
    ) {
        self.steps.push(Box::new(step));
    }

    /// 在表面上挂载一段文本（状态 0）
    pub fn mount_text(&mut self, text: impl Into<String>) {
        self.ctx.mount_text(text);
    }

    /// 发出任意指令（状态 0）
    pub fn emit(&mut self, command: Command) {
        self.ctx.emit(command);
    }

    /// 本幻灯片的舞台表面
    pub fn surface(&self) -> SurfaceId {
        self.ctx.surface()
    }

    /// 同步屏障句柄
    pub fn sync(&self) -> SyncHandle {
        self.ctx.sync()
    }

    /// 本次执行是否允许内部动画
    pub fn transitions_enabled(&self) -> bool {
        self.ctx.transitions_enabled()
    }

    /// 状态 0 的执行上下文（内容 widget 的挂载入口）
    pub fn ctx(&mut self) -> &mut StepCtx<'a> {
        &mut self.ctx
    }
}

/// 单张幻灯片的运行时
///
/// 控制器每次导航都构造一个全新实例，实例从不跨导航复用。
pub struct SlideRuntime {
    surface: SurfaceId,
    barrier: SyncBarrier,
    steps: VecDeque<StepFn>,
    state_cursor: usize,
    total_states: usize,
    complete: bool,
}

impl SlideRuntime {
    pub(crate) fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            barrier: SyncBarrier::new(),
            steps: VecDeque::new(),
            state_cursor: 0,
            total_states: 1,
            complete: false,
        }
    }

    /// 执行脚本并快进到起始状态
    ///
    /// 脚本返回 `Err` 时错误被锁存到屏障，本函数不向上传播，
    /// 控制器通过就绪状态观察失败。
    pub(crate) fn run(&mut self, script: &SlideFn, opts: RunOptions, commands: &mut Vec<Command>) {
        let mut spec = SlideSpec {
            ctx: StepCtx::new(
                self.surface,
                commands,
                self.barrier.handle(),
                !opts.skip_transition,
            ),
            steps: Vec::new(),
        };
        let result = script(&mut spec);
        self.steps = spec.steps.into();
        self.total_states = 1 + self.steps.len();

        if let Err(error) = result {
            self.barrier.mark_failed(error);
            return;
        }

        if self.steps.is_empty() {
            self.complete = true;
            return;
        }

        // 快进到起始状态（快进期间禁用内部动画）
        let target = match opts.initial_state {
            InitialState::State(n) => n.min(self.total_states - 1),
            InitialState::Last => self.total_states - 1,
        };
        while self.state_cursor < target && !self.failed() {
            self.execute_next_step(commands, false);
        }
    }

    /// 推进到下一个展示状态
    ///
    /// 已经 `complete` 或失败时为 no-op。
    pub(crate) fn advance(&mut self, skip_transition: bool, commands: &mut Vec<Command>) {
        if self.complete || self.failed() {
            return;
        }
        self.execute_next_step(commands, !skip_transition);
    }

    fn execute_next_step(&mut self, commands: &mut Vec<Command>, transitions_enabled: bool) {
        let Some(step) = self.steps.pop_front() else {
            return;
        };
        self.state_cursor += 1;

        let mut ctx = StepCtx::new(
            self.surface,
            commands,
            self.barrier.handle(),
            transitions_enabled,
        );
        if let Err(error) = step(&mut ctx) {
            self.barrier.mark_failed(error);
            return;
        }

        if self.steps.is_empty() {
            self.complete = true;
        }
    }

    /// 本幻灯片的舞台表面
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// 当前展示状态索引
    pub fn state_cursor(&self) -> usize {
        self.state_cursor
    }

    /// 展示状态总数（脚本执行完后才有意义）
    pub fn state_count(&self) -> usize {
        self.total_states
    }

    /// 是否已经走完所有展示状态
    pub fn complete(&self) -> bool {
        self.complete
    }

    /// 脚本或内容是否已失败
    pub fn failed(&self) -> bool {
        matches!(self.barrier.readiness(), Readiness::Failed(_))
    }

    /// 当前就绪状态（每次调用重新计算）
    pub fn readiness(&self) -> Readiness {
        self.barrier.readiness()
    }

    /// 同步屏障句柄
    pub fn sync(&self) -> SyncHandle {
        self.barrier.handle()
    }
}

impl std::fmt::Debug for SlideRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlideRuntime")
            .field("surface", &self.surface)
            .field("state_cursor", &self.state_cursor)
            .field("total_states", &self.total_states)
            .field("complete", &self.complete)
            .field("outstanding", &self.barrier.outstanding())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn run_script(script: SlideFn, opts: RunOptions) -> (SlideRuntime, Vec<Command>) {
        let mut runtime = SlideRuntime::new(SurfaceId(1));
        let mut commands = Vec::new();
        runtime.run(&script, opts, &mut commands);
        (runtime, commands)
    }

    #[test]
    fn test_single_state_slide_is_immediately_complete() {
        let script: SlideFn = Rc::new(|s| {
            s.mount_text("标题");
            Ok(())
        });
        let (runtime, commands) = run_script(script, RunOptions::default());

        assert!(runtime.complete());
        assert_eq!(runtime.state_cursor(), 0);
        assert_eq!(runtime.state_count(), 1);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_reveal_records_deferred_states() {
        let script: SlideFn = Rc::new(|s| {
            s.mount_text("第一行");
            s.reveal(|cx| {
                cx.mount_text("第二行");
                Ok(())
            });
            s.reveal(|cx| {
                cx.mount_text("第三行");
                Ok(())
            });
            Ok(())
        });
        let (mut runtime, mut commands) = run_script(script, RunOptions::default());

        assert!(!runtime.complete());
        assert_eq!(runtime.state_cursor(), 0);
        assert_eq!(runtime.state_count(), 3);
        assert_eq!(commands.len(), 1); // 只有状态 0 的内容

        runtime.advance(false, &mut commands);
        assert_eq!(runtime.state_cursor(), 1);
        assert!(!runtime.complete());

        runtime.advance(false, &mut commands);
        assert_eq!(runtime.state_cursor(), 2);
        assert!(runtime.complete());
        assert_eq!(commands.len(), 3);

        // 已完成后 advance 是 no-op
        runtime.advance(false, &mut commands);
        assert_eq!(runtime.state_cursor(), 2);
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn test_fast_forward_to_initial_state() {
        let script: SlideFn = Rc::new(|s| {
            s.reveal(|cx| {
                cx.mount_text("一");
                Ok(())
            });
            s.reveal(|cx| {
                cx.mount_text("二");
                Ok(())
            });
            Ok(())
        });
        let (runtime, commands) = run_script(
            script,
            RunOptions {
                initial_state: InitialState::State(1),
                skip_transition: true,
            },
        );

        assert_eq!(runtime.state_cursor(), 1);
        assert!(!runtime.complete());
        assert_eq!(commands.len(), 1); // 快进执行了状态 1
    }

    #[test]
    fn test_last_sentinel_lands_on_final_state() {
        let script: SlideFn = Rc::new(|s| {
            s.reveal(|_| Ok(()));
            s.reveal(|_| Ok(()));
            s.reveal(|_| Ok(()));
            Ok(())
        });
        let (runtime, _) = run_script(
            script,
            RunOptions {
                initial_state: InitialState::Last,
                skip_transition: true,
            },
        );

        assert_eq!(runtime.state_cursor(), 3);
        assert!(runtime.complete());
    }

    #[test]
    fn test_initial_state_beyond_end_clamps() {
        let script: SlideFn = Rc::new(|s| {
            s.reveal(|_| Ok(()));
            Ok(())
        });
        let (runtime, _) = run_script(
            script,
            RunOptions {
                initial_state: InitialState::State(99),
                skip_transition: true,
            },
        );

        assert_eq!(runtime.state_cursor(), 1);
        assert!(runtime.complete());
    }

    #[test]
    fn test_fast_forward_disables_transitions() {
        let observed = Rc::new(RefCell::new(Vec::new()));
        let script: SlideFn = {
            let observed = observed.clone();
            Rc::new(move |s| {
                let o1 = observed.clone();
                s.reveal(move |cx| {
                    o1.borrow_mut().push(cx.transitions_enabled());
                    Ok(())
                });
                let o2 = observed.clone();
                s.reveal(move |cx| {
                    o2.borrow_mut().push(cx.transitions_enabled());
                    Ok(())
                });
                Ok(())
            })
        };

        let mut runtime = SlideRuntime::new(SurfaceId(1));
        let mut commands = Vec::new();
        runtime.run(
            &script,
            RunOptions {
                initial_state: InitialState::State(1),
                skip_transition: false,
            },
            &mut commands,
        );
        // 快进执行的步骤禁用动画
        assert_eq!(*observed.borrow(), vec![false]);

        // 正常 advance 允许动画
        runtime.advance(false, &mut commands);
        assert_eq!(*observed.borrow(), vec![false, true]);
    }

    #[test]
    fn test_script_error_fails_readiness() {
        let script: SlideFn = Rc::new(|s| {
            s.mount_text("部分内容");
            Err(SlideError::script("脚本崩了"))
        });
        let (mut runtime, mut commands) = run_script(script, RunOptions::default());

        assert!(runtime.failed());
        assert!(!runtime.complete());
        assert!(matches!(runtime.readiness(), Readiness::Failed(_)));

        // 失败后 advance 是 no-op
        let before = commands.len();
        runtime.advance(false, &mut commands);
        assert_eq!(commands.len(), before);
    }

    #[test]
    fn test_step_error_fails_readiness() {
        let script: SlideFn = Rc::new(|s| {
            s.reveal(|_| Err(SlideError::script("步骤崩了")));
            s.reveal(|cx| {
                cx.mount_text("不应该执行到这里");
                Ok(())
            });
            Ok(())
        });
        let (mut runtime, mut commands) = run_script(script, RunOptions::default());
        assert!(!runtime.failed());

        runtime.advance(false, &mut commands);
        assert!(runtime.failed());
        assert!(!runtime.complete());

        // 后续步骤不再执行
        runtime.advance(false, &mut commands);
        assert_eq!(runtime.state_cursor(), 1);
    }

    #[test]
    fn test_registered_content_blocks_readiness() {
        let script: SlideFn = Rc::new(|s| {
            let sync = s.sync();
            let id = sync.register();
            s.emit(Command::RequestContent {
                content: id,
                source: "code/sample.rs".to_string(),
            });
            Ok(())
        });
        let (runtime, commands) = run_script(script, RunOptions::default());

        assert!(matches!(
            runtime.readiness(),
            Readiness::Pending { outstanding: 1 }
        ));

        // Host 结清票据后就绪达成
        let id = commands
            .iter()
            .find_map(|c| match c {
                Command::RequestContent { content, .. } => Some(*content),
                _ => None,
            })
            .unwrap();
        runtime.sync().settle(id);
        assert_eq!(runtime.readiness(), Readiness::Ready);
    }
}
