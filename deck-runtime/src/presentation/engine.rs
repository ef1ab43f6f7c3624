//! # Engine 模块
//!
//! 演示控制器，deck-runtime 的核心类型。
//!
//! ## 执行模型
//!
//! ```text
//! tick(dt, input) -> (Vec<Command>, NavStatus)
//! ```
//!
//! 1. 把语义化输入翻译成 `next` / `previous`
//! 2. 推进进行中的导航：等内容就绪 → 跑过渡 → 移除旧表面
//! 3. 返回本次产生的指令与新的等待状态
//!
//! ## 双层导航
//!
//! 导航游标有两层：幻灯片索引 × 片内展示状态。`next` 先耗尽当前
//! 幻灯片的展示状态，再切换到下一张；`previous` 把"回退"实现为
//! 重启脚本并快进到目标状态（展示状态是脚本执行的产物，无法在
//! 外部倒带）。
//!
//! ## 过渡与边的关系
//!
//! 注册在第 N 个槽位的过渡在**从第 N 张进入第 N+1 张**时生效：
//! 过渡属于离开前一张的那条边，而不属于目的幻灯片。
//! 因此首次进入第 0 张永远没有过渡，走同步兜底路径。

use std::rc::Rc;

use crate::barrier::Readiness;
use crate::command::{Command, SurfaceId};
use crate::error::{NavError, SlideError};
use crate::input::NavigationInput;
use crate::layout::{Rect, StageLayout};
use crate::slide::{InitialState, RunOptions, SlideFn, SlideRuntime, SlideSpec};
use crate::transition::{
    Transition, TransitionCtx, TransitionFn, TransitionSpec, TransitionStatus, default_transition,
};

/// 导航等待状态
///
/// `tick` 的返回值之一，Host 根据它决定是否继续渲染帧、
/// 或提示用户内容仍在加载。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStatus {
    /// 空闲：没有进行中的导航
    Idle,
    /// 等待异步内容结清
    AwaitingContent { outstanding: usize },
    /// 过渡效果进行中
    Transitioning,
}

/// `go_to` 的可选参数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GoToOptions {
    /// 起始展示状态
    pub initial_state: InitialState,
    /// 跳过进入过渡
    pub skip_transition: bool,
}

/// 备注面板的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesPlacement {
    /// 停靠在主窗口内
    Docked,
    /// 已弹出为独立窗口
    PoppedOut,
}

/// 导航阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavPhase {
    /// 等待进入幻灯片的内容就绪
    AwaitingReady,
    /// 过渡效果进行中
    Transitioning,
}

/// 一次进行中的导航
struct NavigationInFlight {
    /// 目的幻灯片索引
    index: usize,
    /// 正在退出的运行时（过渡结束前保留，之后销毁）
    exiting: Option<SlideRuntime>,
    /// 就绪后要构造的过渡函数
    transition_fn: Option<TransitionFn>,
    /// 进行中的过渡对象
    transition: Option<Box<dyn Transition>>,
    phase: NavPhase,
}

/// 演示控制器
///
/// 持有幻灯片脚本序列与每张幻灯片的过渡函数、当前幻灯片游标、
/// 当前运行时实例、布局状态和进行中的导航。
///
/// # 使用示例
///
/// ```ignore
/// let mut preso = Presentation::new();
/// preso.slide(|s| {
///     s.mount_text("标题页");
///     s.reveal(|cx| {
///         cx.mount_text("第一条要点");
///         Ok(())
///     });
///     Ok(())
/// });
///
/// // 主循环
/// loop {
///     let (commands, status) = preso.tick(dt, input)?;
///     for cmd in commands {
///         host.execute(cmd);
///     }
/// }
/// ```
///
/// # 重入
///
/// 导航之间没有内部互斥：过渡未结束时再次 `go_to` 会替换进行中的
/// 导航，被替换者的退出表面被立即移除（避免滞留舞台）。不想触发
/// 这条路径的 Host 应在 [`Presentation::is_navigating`] 为真时暂缓
/// 发起新导航。
pub struct Presentation {
    slide_fns: Vec<SlideFn>,
    transition_fns: Vec<TransitionFn>,
    default_transition: TransitionFn,
    current_index: Option<usize>,
    current: Option<SlideRuntime>,
    nav: Option<NavigationInFlight>,
    layout: StageLayout,
    notes: NotesPlacement,
    next_surface: u64,
    commands: Vec<Command>,
}

impl Presentation {
    /// 创建空的演示控制器
    pub fn new() -> Self {
        Self {
            slide_fns: Vec::new(),
            transition_fns: Vec::new(),
            default_transition: default_transition(),
            current_index: None,
            current: None,
            nav: None,
            layout: StageLayout::new(),
            notes: NotesPlacement::Docked,
            next_surface: 0,
            commands: Vec::new(),
        }
    }

    /// 追加一张幻灯片
    ///
    /// 同时为它注册默认过渡（交叉淡入淡出）。
    /// 追加第一张幻灯片会立即导航到索引 0。
    pub fn slide<F>(&mut self, script: F)
    where
        F: Fn(&mut SlideSpec<'_>) -> Result<(), SlideError> + 'static,
    {
        self.slide_fns.push(Rc::new(script));
        self.transition_fns.push(self.default_transition.clone());

        if self.slide_fns.len() == 1 {
            self.navigate(0, GoToOptions::default());
        }
    }

    /// 替换最近追加的幻灯片的过渡
    ///
    /// 该过渡在从这张幻灯片进入**下一张**时生效（见模块文档）。
    /// 还没有任何幻灯片时返回 [`NavError::NoSlides`]。
    pub fn transition<F>(&mut self, f: F) -> Result<(), NavError>
    where
        F: Fn(&TransitionSpec) -> Box<dyn Transition> + 'static,
    {
        let Some(slot) = self.transition_fns.last_mut() else {
            return Err(NavError::NoSlides);
        };
        *slot = Rc::new(f);
        Ok(())
    }

    /// 设置后续追加的幻灯片使用的默认过渡
    pub fn set_default_transition<F>(&mut self, f: F)
    where
        F: Fn(&TransitionSpec) -> Box<dyn Transition> + 'static,
    {
        self.default_transition = Rc::new(f);
    }

    /// 导航到指定幻灯片
    ///
    /// 索引越界时返回 [`NavError::SlideOutOfRange`]，不做任何变更。
    /// 导航的完成（就绪、过渡、移除旧表面）发生在后续的 `tick` 里。
    pub fn go_to(&mut self, index: usize, opts: GoToOptions) -> Result<(), NavError> {
        if index >= self.slide_fns.len() {
            return Err(NavError::SlideOutOfRange {
                index,
                count: self.slide_fns.len(),
            });
        }
        self.navigate(index, opts);
        Ok(())
    }

    /// 前进一步
    ///
    /// 当前幻灯片未完成时推进一个展示状态；已完成且存在下一张时
    /// 切换过去；已经在最后一张则什么都不做。
    pub fn next(&mut self, skip_transition: bool) {
        let Some(index) = self.current_index else {
            return;
        };

        let complete = self.current.as_ref().is_some_and(|c| c.complete());
        if complete {
            if index + 1 < self.slide_fns.len() {
                self.navigate(
                    index + 1,
                    GoToOptions {
                        initial_state: InitialState::State(0),
                        skip_transition,
                    },
                );
            }
            return;
        }

        if let Some(current) = self.current.as_mut() {
            current.advance(skip_transition, &mut self.commands);
        }
    }

    /// 后退一步
    ///
    /// 展示游标在 0 且存在上一张时，回到上一张的**最后一个**状态；
    /// 否则重启当前幻灯片并快进到上一个状态。两条路径都跳过过渡。
    pub fn previous(&mut self) {
        let Some(index) = self.current_index else {
            return;
        };
        let cursor = self.current.as_ref().map_or(0, |c| c.state_cursor());

        if cursor == 0 {
            if index > 0 {
                self.navigate(
                    index - 1,
                    GoToOptions {
                        initial_state: InitialState::Last,
                        skip_transition: true,
                    },
                );
            }
            return;
        }

        self.navigate(
            index,
            GoToOptions {
                initial_state: InitialState::State(cursor - 1),
                skip_transition: true,
            },
        );
    }

    /// 核心驱动函数
    ///
    /// 应用可选输入、推进进行中的导航，返回本次产生的指令与
    /// 新的等待状态。
    ///
    /// # 错误
    ///
    /// 幻灯片失败、过渡失败会以错误返回**一次**，进行中的导航随之
    /// 丢弃；已缓冲的指令保留到下一次 `tick` 一并交付。
    pub fn tick(
        &mut self,
        dt: f32,
        input: Option<NavigationInput>,
    ) -> Result<(Vec<Command>, NavStatus), NavError> {
        if let Some(input) = input {
            match input {
                NavigationInput::Forward { skip_transition } => self.next(skip_transition),
                NavigationInput::Backward => self.previous(),
            }
        }

        let status = self.poll_navigation(dt)?;
        Ok((std::mem::take(&mut self.commands), status))
    }

    /// 构造新的运行时并启动导航
    fn navigate(&mut self, index: usize, opts: GoToOptions) {
        // 替换进行中的导航：被替换者的退出表面立即移除，避免滞留舞台
        if let Some(superseded) = self.nav.take() {
            if let Some(exiting) = superseded.exiting {
                self.commands.push(Command::DetachSurface {
                    surface: exiting.surface(),
                });
            }
        }

        let surface = SurfaceId(self.next_surface);
        self.next_surface += 1;

        let script = self.slide_fns[index].clone();
        let mut runtime = SlideRuntime::new(surface);

        // 先透明挂载，再执行脚本：脚本产生的内容落在已附加的表面上
        self.commands.push(Command::AttachSurface {
            surface,
            opacity: 0.0,
        });
        runtime.run(
            &script,
            RunOptions {
                initial_state: opts.initial_state,
                skip_transition: opts.skip_transition,
            },
            &mut self.commands,
        );

        let exiting = self.current.replace(runtime);
        self.current_index = Some(index);

        // 过渡取 index - 1 槽位（离开前一张的那条边）；
        // 进入第 0 张没有前驱，永远不构造过渡
        let transition_fn = if opts.skip_transition || index == 0 {
            None
        } else {
            Some(self.transition_fns[index - 1].clone())
        };

        self.nav = Some(NavigationInFlight {
            index,
            exiting,
            transition_fn,
            transition: None,
            phase: NavPhase::AwaitingReady,
        });
    }

    /// 推进进行中的导航
    fn poll_navigation(&mut self, dt: f32) -> Result<NavStatus, NavError> {
        let Some(nav) = self.nav.as_mut() else {
            return Ok(NavStatus::Idle);
        };

        // 阶段 1：等待进入幻灯片的内容就绪
        if nav.phase == NavPhase::AwaitingReady {
            let readiness = match self.current.as_ref() {
                Some(current) => current.readiness(),
                None => Readiness::Ready,
            };

            match readiness {
                Readiness::Pending { outstanding } => {
                    return Ok(NavStatus::AwaitingContent { outstanding });
                }
                Readiness::Failed(source) => {
                    let index = nav.index;
                    self.nav = None;
                    return Err(NavError::SlideFailed { index, source });
                }
                Readiness::Ready => match nav.transition_fn.take() {
                    Some(make) => {
                        let Some(current) = self.current.as_ref() else {
                            self.nav = None;
                            return Ok(NavStatus::Idle);
                        };
                        let spec = TransitionSpec {
                            entering: current.surface(),
                            exiting: nav.exiting.as_ref().map(|e| e.surface()),
                            stage: self.layout.stage_bounds,
                        };
                        nav.transition = Some(make(&spec));
                        nav.phase = NavPhase::Transitioning;
                    }
                    None => {
                        // 同步兜底路径：直接显示，再移除旧表面
                        if let Some(current) = self.current.as_ref() {
                            self.commands.push(Command::SetOpacity {
                                surface: current.surface(),
                                opacity: 1.0,
                            });
                        }
                        if let Some(exiting) = nav.exiting.take() {
                            self.commands.push(Command::DetachSurface {
                                surface: exiting.surface(),
                            });
                        }
                        self.nav = None;
                        return Ok(NavStatus::Idle);
                    }
                },
            }
        }

        // 阶段 2：过渡进行中（可能与就绪发生在同一个 tick）
        let Some(nav) = self.nav.as_mut() else {
            return Ok(NavStatus::Idle);
        };
        let Some(transition) = nav.transition.as_mut() else {
            return Ok(NavStatus::Idle);
        };

        let result = {
            let mut ctx = TransitionCtx::new(&mut self.commands);
            transition.update(dt, &mut ctx)
        };

        match result {
            Ok(TransitionStatus::Running) => Ok(NavStatus::Transitioning),
            Ok(TransitionStatus::Finished) => {
                if let Some(exiting) = nav.exiting.take() {
                    self.commands.push(Command::DetachSurface {
                        surface: exiting.surface(),
                    });
                }
                self.nav = None;
                Ok(NavStatus::Idle)
            }
            Err(source) => {
                // 退出表面保留在舞台上：已知的降级状态，由调用方决定补救
                let index = nav.index;
                self.nav = None;
                Err(NavError::TransitionFailed { index, source })
            }
        }
    }

    /// 当前幻灯片索引（首次导航前为 `None`）
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// 幻灯片总数
    pub fn slide_count(&self) -> usize {
        self.slide_fns.len()
    }

    /// 当前幻灯片运行时（只读）
    pub fn current(&self) -> Option<&SlideRuntime> {
        self.current.as_ref()
    }

    /// 是否有进行中的导航
    pub fn is_navigating(&self) -> bool {
        self.nav.is_some()
    }

    /// 当前布局状态（只读）
    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    /// 备注面板的位置
    pub fn notes_placement(&self) -> NotesPlacement {
        self.notes
    }

    /// Host 上报舞台容器包围盒
    pub fn set_stage_bounds(&mut self, bounds: Rect) {
        self.layout.stage_bounds = Some(bounds);
        self.emit_stage_transform();
    }

    /// Host 上报备注容器包围盒（弹出后为新窗口的包围盒）
    pub fn set_notes_bounds(&mut self, bounds: Rect) {
        self.layout.notes_bounds = Some(bounds);
        self.emit_notes_transform();
    }

    /// 舞台逻辑宽度（像素，默认 1920）
    pub fn width(&self) -> f64 {
        self.layout.stage_size.width
    }

    /// 舞台逻辑高度（像素，默认 1080）
    pub fn height(&self) -> f64 {
        self.layout.stage_size.height
    }

    /// 备注面板逻辑宽度（像素，默认 1920）
    pub fn notes_width(&self) -> f64 {
        self.layout.notes_size.width
    }

    /// 备注面板逻辑高度（像素，默认 1080）
    pub fn notes_height(&self) -> f64 {
        self.layout.notes_size.height
    }

    /// 设置舞台逻辑宽度并立即重算缩放
    pub fn set_width(&mut self, width: f64) {
        self.layout.stage_size.width = width;
        self.emit_stage_transform();
    }

    /// 设置舞台逻辑高度并立即重算缩放
    pub fn set_height(&mut self, height: f64) {
        self.layout.stage_size.height = height;
        self.emit_stage_transform();
    }

    /// 设置备注面板逻辑宽度并立即重算缩放
    pub fn set_notes_width(&mut self, width: f64) {
        self.layout.notes_size.width = width;
        self.emit_notes_transform();
    }

    /// 设置备注面板逻辑高度并立即重算缩放
    pub fn set_notes_height(&mut self, height: f64) {
        self.layout.notes_size.height = height;
        self.emit_notes_transform();
    }

    /// 把备注面板弹出为独立窗口
    ///
    /// 发出 [`Command::OpenNotesWindow`]；原来的停靠槽位作废，
    /// 新窗口的尺寸由 Host 通过 [`Presentation::set_notes_bounds`]
    /// 继续上报。重复弹出是调用方错误。
    pub fn pop_out_notes(&mut self) -> Result<(), NavError> {
        if self.notes == NotesPlacement::PoppedOut {
            return Err(NavError::NotesAlreadyPoppedOut);
        }
        self.notes = NotesPlacement::PoppedOut;
        // 停靠槽位作废，等新窗口上报包围盒
        self.layout.notes_bounds = None;
        self.commands.push(Command::OpenNotesWindow);
        Ok(())
    }

    fn emit_stage_transform(&mut self) {
        if let Some(transform) = self.layout.stage_transform() {
            self.commands.push(Command::SetStageTransform { transform });
        }
    }

    fn emit_notes_transform(&mut self) {
        if let Some(transform) = self.layout.notes_transform() {
            self.commands.push(Command::SetNotesTransform { transform });
        }
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Presentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presentation")
            .field("slide_count", &self.slide_fns.len())
            .field("current_index", &self.current_index)
            .field("is_navigating", &self.nav.is_some())
            .field("notes", &self.notes)
            .finish()
    }
}
