//! # Context 模块
//!
//! 引擎上下文：组件在更新与恢复时能访问的全部共享状态。
//!
//! 所有共享状态都通过 [`EngineContext`] 显式注入，不存在全局单例，
//! 因此组件可以在没有完整引擎的情况下单独测试。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::event::EventBus;

/// 临时设置（跳过模式等）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TempSettings {
    /// 是否处于跳过模式
    pub skip: bool,
    /// 跳过模式下动画被压缩到的帧数（0 表示直接结束）
    pub skip_time: u32,
}

impl TempSettings {
    /// 创建跳过模式设置
    pub fn skipping(skip_time: u32) -> Self {
        Self {
            skip: true,
            skip_time,
        }
    }

    /// 是否为"瞬间跳过"：新启动的动画直接到达终值
    pub fn is_instant_skip(&self) -> bool {
        self.skip && self.skip_time == 0
    }
}

/// 文档（场景脚本等记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// 唯一标识
    pub uid: String,
    /// 显示名称
    pub name: String,
    /// 指令列表
    pub commands: Vec<String>,
}

impl Document {
    pub fn new(uid: impl Into<String>, name: impl Into<String>, commands: Vec<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            commands,
        }
    }
}

/// 文档管理器
///
/// 按 uid 保存已加载的文档。克隆得到的是同一份注册表。
#[derive(Debug, Clone, Default)]
pub struct RecordManager {
    documents: Rc<RefCell<HashMap<String, Rc<Document>>>>,
}

impl RecordManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册文档，同 uid 的旧文档被替换
    pub fn register(&self, document: Document) -> Rc<Document> {
        let document = Rc::new(document);
        self.documents
            .borrow_mut()
            .insert(document.uid.clone(), document.clone());
        document
    }

    /// 按 uid 查找文档
    pub fn document(&self, uid: &str) -> Option<Rc<Document>> {
        self.documents.borrow().get(uid).cloned()
    }

    /// 已注册文档数量
    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }
}

/// 引擎上下文
///
/// 克隆代价很低，所有克隆共享同一份状态。
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    /// 全局事件总线
    pub events: EventBus,
    /// 文档管理器
    pub records: RecordManager,
    settings: Rc<Cell<TempSettings>>,
}

impl EngineContext {
    /// 创建新的引擎上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前临时设置
    pub fn settings(&self) -> TempSettings {
        self.settings.get()
    }

    /// 替换临时设置
    pub fn set_settings(&self, settings: TempSettings) {
        self.settings.set(settings);
    }

    /// 开关跳过模式
    pub fn set_skip(&self, skip: bool, skip_time: u32) {
        self.settings.set(TempSettings { skip, skip_time });
    }
}
