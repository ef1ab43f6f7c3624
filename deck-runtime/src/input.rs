//! # Input 模块
//!
//! 定义 Host 向引擎传递的导航输入。
//!
//! ## 设计说明
//!
//! - `NavigationInput` 是 Host 采集用户操作后传递给引擎的语义化输入，
//!   引擎不直接处理鼠标/键盘事件
//! - 典型的按键映射：普通前进键 → `Forward { skip_transition: false }`，
//!   快进键 → `Forward { skip_transition: true }`，后退键 → `Backward`
//! - 后退总是跳过过渡（回退是"重放到上一个状态"，不是视觉切换）

use serde::{Deserialize, Serialize};

/// Host 向引擎传递的导航输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationInput {
    /// 前进：当前幻灯片未完成时推进一个展示状态，已完成时切到下一张
    Forward { skip_transition: bool },

    /// 后退：回到上一个展示状态，或上一张幻灯片的最后一个状态
    Backward,
}

impl NavigationInput {
    /// 创建普通前进输入
    pub fn forward() -> Self {
        Self::Forward {
            skip_transition: false,
        }
    }

    /// 创建跳过过渡的前进输入
    pub fn forward_skipping() -> Self {
        Self::Forward {
            skip_transition: true,
        }
    }

    /// 创建后退输入
    pub fn backward() -> Self {
        Self::Backward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_creation() {
        assert_eq!(
            NavigationInput::forward(),
            NavigationInput::Forward {
                skip_transition: false
            }
        );
        assert_eq!(
            NavigationInput::forward_skipping(),
            NavigationInput::Forward {
                skip_transition: true
            }
        );
        assert_eq!(NavigationInput::backward(), NavigationInput::Backward);
    }

    #[test]
    fn test_input_serialization() {
        let input = NavigationInput::forward_skipping();
        let json = serde_json::to_string(&input).unwrap();
        let deserialized: NavigationInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, deserialized);
    }
}
