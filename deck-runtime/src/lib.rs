//! # Deck Runtime
//!
//! 幻灯片演示引擎的核心运行时库。
//!
//! ## 架构概述
//!
//! `deck-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 它通过 **命令驱动模式** 与宿主层（Host）通信：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── NavigationInput + dt ───────►│
//!   │                                   │ tick()
//!   │◄─── (Vec<Command>, NavStatus) ───│
//!   │                                   │
//! ```
//!
//! Host 负责渲染表面、采集按键、观察容器尺寸、加载外部内容；
//! 引擎负责幻灯片序列、片内展示状态、过渡编排与就绪同步。
//!
//! ## 核心类型
//!
//! - [`Presentation`]：演示控制器，导航与过渡的编排者
//! - [`Command`]：引擎向 Host 发出的指令
//! - [`NavigationInput`]：Host 向引擎传递的语义化输入
//! - [`NavStatus`]：引擎当前的等待状态
//! - [`SyncBarrier`]：异步内容推迟幻灯片就绪的同步屏障
//!
//! ## 使用示例
//!
//! ```ignore
//! use deck_runtime::Presentation;
//!
//! let mut preso = Presentation::new();
//!
//! preso.slide(|s| {
//!     s.mount_text("标题页");
//!     s.reveal(|cx| {
//!         cx.mount_text("逐条展示的要点");
//!         Ok(())
//!     });
//!     Ok(())
//! });
//!
//! // 主循环
//! loop {
//!     let (commands, status) = preso.tick(dt, input)?;
//!
//!     // Host 执行 commands
//!     for cmd in commands {
//!         host.execute(cmd);
//!     }
//!
//!     // 根据 status 决定是否继续渲染帧
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`command`]：Command 定义
//! - [`input`]：NavigationInput 定义
//! - [`error`]：错误类型定义
//! - [`barrier`]：同步屏障
//! - [`slide`]：单张幻灯片的运行时
//! - [`transition`]：过渡效果契约与默认实现
//! - [`layout`]：逻辑尺寸与等比缩放布局
//! - [`content`]：嵌入式内容 widget（代码块）
//! - [`presentation`]：演示控制器

pub mod barrier;
pub mod command;
pub mod content;
pub mod error;
pub mod input;
pub mod layout;
pub mod presentation;
pub mod slide;
pub mod transition;

// 重导出核心类型
pub use barrier::{ContentId, Readiness, SyncBarrier, SyncHandle};
pub use command::{Command, SurfaceId};
#[cfg(feature = "code")]
pub use content::{CodeBlock, PendingCode};
pub use content::{HighlightedLine, StyledSpan};
pub use error::{DeckError, DeckResult, NavError, SlideError, TransitionError};
pub use input::NavigationInput;
pub use layout::{LogicalSize, Rect, StageLayout, SurfaceTransform};
pub use presentation::{GoToOptions, NavStatus, NotesPlacement, Presentation};
pub use slide::{InitialState, SlideRuntime, SlideSpec, StepCtx};
pub use transition::{
    CrossFade, Transition, TransitionCtx, TransitionFn, TransitionSpec, TransitionStatus,
};
