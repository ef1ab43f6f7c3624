//! # Barrier 模块
//!
//! 同步屏障：嵌入式内容用来推迟幻灯片"就绪"信号的机制。
//!
//! ## 设计说明
//!
//! - 内容 widget 在产生部分输出之前先 `register()` 一张待定票据，
//!   加载/渲染完成后 `settle()`，失败则 `fail()`
//! - 就绪状态在**每次查询时**重新计算：就绪检查开始之后才注册的
//!   票据同样会阻塞该检查，不存在晚注册被漏掉的竞态
//! - 单线程协作模型，屏障与它派发的句柄通过 `Rc<RefCell>` 共享状态
//! - 没有超时和取消：一张永不结清的票据会让导航无限期停在等待内容
//!   的阶段（文档化的限制，不是静默兜底的对象）

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::SlideError;

/// 待定内容标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub u64);

/// 幻灯片就绪状态
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    /// 仍有未结清的待定内容
    Pending { outstanding: usize },
    /// 所有待定内容都已结清
    Ready,
    /// 脚本或某项内容失败，就绪永远不会达成
    Failed(SlideError),
}

/// 屏障内部状态
#[derive(Debug)]
struct BarrierInner {
    next_id: u64,
    pending: BTreeSet<ContentId>,
    failure: Option<SlideError>,
}

/// 同步屏障
///
/// 每个幻灯片运行时持有一个屏障实例；屏障派发的 [`SyncHandle`]
/// 与屏障共享同一份内部状态。
#[derive(Debug, Clone)]
pub struct SyncBarrier {
    inner: Rc<RefCell<BarrierInner>>,
}

impl SyncBarrier {
    /// 创建空屏障
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BarrierInner {
                next_id: 0,
                pending: BTreeSet::new(),
                failure: None,
            })),
        }
    }

    /// 派发一个内容 widget 使用的句柄
    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            inner: self.inner.clone(),
        }
    }

    /// 注册一张待定票据
    pub fn register(&self) -> ContentId {
        let mut inner = self.inner.borrow_mut();
        let id = ContentId(inner.next_id);
        inner.next_id += 1;
        inner.pending.insert(id);
        id
    }

    /// 结清一张票据（未知 id 为幂等 no-op）
    pub fn settle(&self, id: ContentId) {
        self.inner.borrow_mut().pending.remove(&id);
    }

    /// 以失败结清一张票据
    ///
    /// 票据从待定集合移除，同时锁存失败状态（首个失败胜出）。
    pub fn fail(&self, id: ContentId, reason: impl Into<String>) {
        let mut inner = self.inner.borrow_mut();
        inner.pending.remove(&id);
        if inner.failure.is_none() {
            inner.failure = Some(SlideError::ContentFailed {
                content: id,
                reason: reason.into(),
            });
        }
    }

    /// 锁存一个与票据无关的失败（脚本执行出错时使用）
    pub fn mark_failed(&self, error: SlideError) {
        let mut inner = self.inner.borrow_mut();
        if inner.failure.is_none() {
            inner.failure = Some(error);
        }
    }

    /// 当前未结清的票据数量
    pub fn outstanding(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// 计算当前就绪状态
    pub fn readiness(&self) -> Readiness {
        let inner = self.inner.borrow();
        if let Some(failure) = &inner.failure {
            return Readiness::Failed(failure.clone());
        }
        if inner.pending.is_empty() {
            Readiness::Ready
        } else {
            Readiness::Pending {
                outstanding: inner.pending.len(),
            }
        }
    }
}

impl Default for SyncBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// 内容 widget 持有的屏障句柄
///
/// 只暴露注册/结清操作，widget 不能查询或影响其他内容的状态。
#[derive(Debug, Clone)]
pub struct SyncHandle {
    inner: Rc<RefCell<BarrierInner>>,
}

impl SyncHandle {
    /// 注册一张待定票据
    pub fn register(&self) -> ContentId {
        let mut inner = self.inner.borrow_mut();
        let id = ContentId(inner.next_id);
        inner.next_id += 1;
        inner.pending.insert(id);
        id
    }

    /// 结清一张票据（未知 id 为幂等 no-op）
    pub fn settle(&self, id: ContentId) {
        self.inner.borrow_mut().pending.remove(&id);
    }

    /// 以失败结清一张票据
    pub fn fail(&self, id: ContentId, reason: impl Into<String>) {
        let mut inner = self.inner.borrow_mut();
        inner.pending.remove(&id);
        if inner.failure.is_none() {
            inner.failure = Some(SlideError::ContentFailed {
                content: id,
                reason: reason.into(),
            });
        }
    }
}
