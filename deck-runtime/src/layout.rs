//! # Layout 模块
//!
//! 舞台与备注面板的逻辑尺寸、等比缩放与居中布局计算。
//!
//! ## 设计说明
//!
//! - 引擎不读取真实窗口尺寸，Host 在容器尺寸变化时上报包围盒
//! - 舞台与备注面板**各自独立**缩放（备注面板可能被移到独立窗口）
//! - 缩放系数取 `min(容器宽/逻辑宽, 容器高/逻辑高)`，再平移居中

use serde::{Deserialize, Serialize};

/// 容器包围盒（像素）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// 创建包围盒
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 创建原点在 (0, 0) 的包围盒
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// 先平移、后缩放的表面变换
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

/// 逻辑尺寸（像素）
///
/// 幻灯片内容按逻辑尺寸排版，实际显示时整体缩放到容器内。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    /// 创建逻辑尺寸
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// 舞台逻辑尺寸默认值
pub const DEFAULT_STAGE_SIZE: LogicalSize = LogicalSize {
    width: 1920.0,
    height: 1080.0,
};

/// 备注面板逻辑尺寸默认值（与舞台共用同一套默认值）
pub const DEFAULT_NOTES_SIZE: LogicalSize = LogicalSize {
    width: 1920.0,
    height: 1080.0,
};

/// 计算把逻辑尺寸等比放入容器并居中的变换
pub fn fit_into(logical: LogicalSize, bounds: Rect) -> SurfaceTransform {
    let scale = (bounds.width / logical.width).min(bounds.height / logical.height);

    let translate_x = (bounds.width - logical.width * scale) / 2.0 + bounds.x;
    let translate_y = (bounds.height - logical.height * scale) / 2.0 + bounds.y;

    SurfaceTransform {
        translate_x,
        translate_y,
        scale,
    }
}

/// 布局状态
///
/// 逻辑尺寸 + 最近一次上报的容器包围盒。
/// 包围盒在 Host 上报之前为 `None`，此时不产生任何变换
/// （尺寸观察失效时的降级行为：不自动缩放，显式改尺寸仍然生效）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLayout {
    /// 舞台逻辑尺寸
    pub stage_size: LogicalSize,
    /// 备注面板逻辑尺寸
    pub notes_size: LogicalSize,
    /// 舞台容器包围盒
    pub stage_bounds: Option<Rect>,
    /// 备注容器包围盒
    pub notes_bounds: Option<Rect>,
}

impl StageLayout {
    /// 创建默认布局状态
    pub fn new() -> Self {
        Self {
            stage_size: DEFAULT_STAGE_SIZE,
            notes_size: DEFAULT_NOTES_SIZE,
            stage_bounds: None,
            notes_bounds: None,
        }
    }

    /// 当前舞台变换（尚无包围盒时为 `None`）
    pub fn stage_transform(&self) -> Option<SurfaceTransform> {
        self.stage_bounds.map(|b| fit_into(self.stage_size, b))
    }

    /// 当前备注面板变换（尚无包围盒时为 `None`）
    pub fn notes_transform(&self) -> Option<SurfaceTransform> {
        self.notes_bounds.map(|b| fit_into(self.notes_size, b))
    }
}

impl Default for StageLayout {
    fn default() -> Self {
        Self::new()
    }
}
