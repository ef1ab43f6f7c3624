//! # Transition 模块
//!
//! 幻灯片切换的过渡效果契约与默认的交叉淡入淡出实现。
//!
//! ## 执行模型
//!
//! 过渡以帧驱动：Host 每帧调用控制器的 `tick(dt, …)`，引擎把 `dt`
//! 转发给进行中的过渡对象。过渡对象通过 [`TransitionCtx`] 向 Host
//! 发出透明度/变换指令，返回 `Finished` 表示视觉交接完成。
//!
//! ## 契约
//!
//! - 过渡函数 [`TransitionFn`] 接收（进入表面，退出表面或无，舞台
//!   包围盒），构造一个过渡对象
//! - 返回 `Err` 会中止本次导航：退出表面**不会**被移除，错误原样
//!   传给 `tick` 的调用方（已知的降级状态，由调用方决定重试）
//! - 进入第一张幻灯片时没有前驱，不会构造任何过渡

use std::rc::Rc;

use crate::command::{Command, SurfaceId};
use crate::error::TransitionError;
use crate::layout::Rect;

/// 过渡的运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStatus {
    /// 仍在进行中
    Running,
    /// 视觉交接已完成
    Finished,
}

/// 过渡的输入参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSpec {
    /// 正在进入的幻灯片表面
    pub entering: SurfaceId,
    /// 正在退出的幻灯片表面（第一张幻灯片没有）
    pub exiting: Option<SurfaceId>,
    /// 舞台容器包围盒（Host 尚未上报尺寸时为 `None`）
    pub stage: Option<Rect>,
}

/// 过渡执行上下文
///
/// 进行中的过渡通过它向 Host 发指令。
pub struct TransitionCtx<'a> {
    commands: &'a mut Vec<Command>,
}

impl<'a> TransitionCtx<'a> {
    pub(crate) fn new(commands: &'a mut Vec<Command>) -> Self {
        Self { commands }
    }

    /// 设置某个表面的透明度
    pub fn set_opacity(&mut self, surface: SurfaceId, opacity: f32) {
        self.commands.push(Command::SetOpacity { surface, opacity });
    }

    /// 发出任意指令（自定义过渡可以驱动变换等）
    pub fn emit(&mut self, command: Command) {
        self.commands.push(command);
    }
}

/// 进行中的过渡对象
pub trait Transition {
    /// 推进过渡
    ///
    /// # 返回
    ///
    /// - `Ok(Running)`: 过渡仍在进行
    /// - `Ok(Finished)`: 视觉交接完成，退出表面可以移除
    /// - `Err(_)`: 过渡中止，本次导航失败
    fn update(
        &mut self,
        dt: f32,
        ctx: &mut TransitionCtx<'_>,
    ) -> Result<TransitionStatus, TransitionError>;
}

/// 过渡函数：为一次导航构造过渡对象
pub type TransitionFn = Rc<dyn Fn(&TransitionSpec) -> Box<dyn Transition>>;

/// 二次缓动（ease-in-out）
pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// 交叉淡入淡出
///
/// 同时驱动两条透明度曲线：
/// - 退出表面：alpha 1.0 → 0.0
/// - 进入表面：alpha 0.0 → 1.0
#[derive(Debug)]
pub struct CrossFade {
    entering: SurfaceId,
    exiting: Option<SurfaceId>,
    duration: f32,
    elapsed: f32,
}

impl CrossFade {
    /// 默认时长（秒）
    pub const DEFAULT_DURATION: f32 = 0.3;

    /// 以默认时长创建
    pub fn new(spec: &TransitionSpec) -> Self {
        Self::with_duration(spec, Self::DEFAULT_DURATION)
    }

    /// 以指定时长创建
    pub fn with_duration(spec: &TransitionSpec, duration: f32) -> Self {
        Self {
            entering: spec.entering,
            exiting: spec.exiting,
            duration: duration.max(0.01), // 避免除零
            elapsed: 0.0,
        }
    }

    /// 当前进度（0.0 - 1.0）
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

impl Transition for CrossFade {
    fn update(
        &mut self,
        dt: f32,
        ctx: &mut TransitionCtx<'_>,
    ) -> Result<TransitionStatus, TransitionError> {
        self.elapsed += dt.max(0.0);
        let eased = ease_in_out_quad(self.progress());

        ctx.set_opacity(self.entering, eased);
        if let Some(exiting) = self.exiting {
            ctx.set_opacity(exiting, 1.0 - eased);
        }

        if self.progress() >= 1.0 {
            Ok(TransitionStatus::Finished)
        } else {
            Ok(TransitionStatus::Running)
        }
    }
}

/// 默认过渡函数（交叉淡入淡出）
pub fn default_transition() -> TransitionFn {
    Rc::new(|spec| Box::new(CrossFade::new(spec)))
}
