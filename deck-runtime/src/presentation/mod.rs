//! # Presentation 模块
//!
//! 演示控制器：幻灯片序列、双层导航状态机与布局驱动。
//!
//! ## 模块结构
//!
//! - [`engine`]：核心导航引擎

pub mod engine;

pub use engine::{GoToOptions, NavStatus, NotesPlacement, Presentation};
