//! # Error 模块
//!
//! 定义 deck-runtime 中使用的错误类型。

use thiserror::Error;

use crate::barrier::ContentId;

/// 导航错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    /// 幻灯片索引越界
    #[error("幻灯片索引 {index} 越界，当前共 {count} 张")]
    SlideOutOfRange { index: usize, count: usize },

    /// 还没有注册任何幻灯片
    #[error("还没有注册任何幻灯片，无法执行此操作")]
    NoSlides,

    /// 备注面板已经弹出为独立窗口
    #[error("备注面板已经弹出为独立窗口，不能重复弹出")]
    NotesAlreadyPoppedOut,

    /// 幻灯片脚本执行失败
    #[error("幻灯片 {index} 执行失败: {source}")]
    SlideFailed {
        index: usize,
        #[source]
        source: SlideError,
    },

    /// 过渡效果执行失败
    #[error("进入幻灯片 {index} 的过渡效果失败: {source}")]
    TransitionFailed {
        index: usize,
        #[source]
        source: TransitionError,
    },
}

/// 幻灯片脚本错误
///
/// 脚本或展示步骤抛出的错误不会让控制器崩溃，
/// 而是转化为失败的就绪状态，由 Host 决定如何上报。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlideError {
    /// 脚本主体或展示步骤执行出错
    #[error("脚本执行出错: {message}")]
    Script { message: String },

    /// 注册到同步屏障的异步内容加载失败
    #[error("异步内容 {content:?} 加载失败: {reason}")]
    ContentFailed { content: ContentId, reason: String },
}

impl SlideError {
    /// 创建脚本执行错误
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }
}

/// 过渡效果错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// 过渡效果中止
    #[error("过渡效果中止: {message}")]
    Aborted { message: String },
}

impl TransitionError {
    /// 创建中止错误
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }
}

/// deck-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeckError {
    /// 导航错误
    #[error("导航错误: {0}")]
    Nav(#[from] NavError),

    /// 幻灯片错误
    #[error("幻灯片错误: {0}")]
    Slide(#[from] SlideError),

    /// 过渡错误
    #[error("过渡错误: {0}")]
    Transition(#[from] TransitionError),
}

/// Result 类型别名
pub type DeckResult<T> = Result<T, DeckError>;
