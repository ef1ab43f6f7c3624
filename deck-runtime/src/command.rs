//! # Command 模块
//!
//! 定义引擎向 Host 发出的所有指令。
//! Command 是引擎与 Host 之间的**唯一通信方式**。
//!
//! ## 设计原则
//!
//! - **声明式**：Command 描述"做什么"，不描述"怎么做"
//! - **无副作用**：Command 本身不执行任何操作
//! - **引擎无关**：不包含任何渲染后端的类型
//!
//! ## 顺序保证
//!
//! 一次导航内的指令顺序固定：`AttachSurface`（透明挂载）先于
//! 就绪/过渡期间的 `SetOpacity`，`DetachSurface`（移除旧表面）
//! 永远最后，舞台上不会出现空窗。

use serde::{Deserialize, Serialize};

use crate::barrier::ContentId;
use crate::content::HighlightedLine;
use crate::layout::SurfaceTransform;

/// 舞台表面标识符
///
/// 每次导航为新的幻灯片运行时分配一个新表面，表面从不复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

/// 引擎向 Host 发出的指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 把幻灯片表面挂载到舞台
    ///
    /// 挂载时 `opacity` 为 0：内容就绪之前表面不可见。
    AttachSurface { surface: SurfaceId, opacity: f32 },

    /// 把幻灯片表面从舞台移除
    DetachSurface { surface: SurfaceId },

    /// 设置表面透明度（过渡效果逐帧驱动）
    SetOpacity { surface: SurfaceId, opacity: f32 },

    /// 设置舞台整体变换（等比缩放 + 居中平移）
    SetStageTransform { transform: SurfaceTransform },

    /// 设置备注面板变换
    SetNotesTransform { transform: SurfaceTransform },

    /// 打开独立的备注窗口
    ///
    /// Host 创建新的顶层窗口、把备注面板移入其中，
    /// 并在新窗口上继续通过 `set_notes_bounds` 上报尺寸。
    OpenNotesWindow,

    /// 在表面上挂载一段文本内容
    MountText { surface: SurfaceId, text: String },

    /// 在表面上挂载高亮后的代码块
    MountCode {
        surface: SurfaceId,
        content: ContentId,
        lines: Vec<HighlightedLine>,
    },

    /// 请求 Host 加载外部内容
    ///
    /// 加载完成后 Host 通过对应 widget 的回填接口交回文本，
    /// 在此之前幻灯片的就绪被对应票据阻塞。
    RequestContent { content: ContentId, source: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let cmd = Command::AttachSurface {
            surface: SurfaceId(3),
            opacity: 0.0,
        };

        let json = serde_json::to_string(&cmd).unwrap();
        let deserialized: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, deserialized);
    }

    #[test]
    fn test_surface_id_is_copy_and_hashable() {
        use std::collections::HashSet;

        let a = SurfaceId(1);
        let b = a;
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
