//! # Component 模块
//!
//! 组件基础契约。
//!
//! ## 生命周期
//!
//! ```text
//! 独立构造（无所属对象）
//!   → add_component：记录所属对象
//!   → setup()：首次 update 前调用一次（也可由宿主提前触发）
//!   → update()：对象活跃期间每帧调用
//!   → dispose()：调用一次，之后组件不再被更新
//! ```
//!
//! 所属对象只以 [`ObjectId`] 记录（弱引用），组件不持有对象。
//! 更新时对象存储把所属对象的组件列表暂时取出，
//! 通过 [`ComponentContext`] 把整个存储交给组件读写。

use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::RestoreContext;
use crate::context::{EngineContext, TempSettings};
use crate::error::CodecError;
use crate::object::{GameObject, ObjectId};
use crate::store::ObjectStore;

/// 所有组件共有的状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentBase {
    #[serde(skip)]
    owner: Option<ObjectId>,
    /// 是否参与更新
    pub active: bool,
    #[serde(skip)]
    is_setup: bool,
    #[serde(skip)]
    disposed: bool,
}

impl Default for ComponentBase {
    fn default() -> Self {
        Self {
            owner: None,
            active: true,
            is_setup: false,
            disposed: false,
        }
    }
}

impl ComponentBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所属对象
    pub fn owner(&self) -> Option<ObjectId> {
        self.owner
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub(crate) fn attach(&mut self, owner: ObjectId) {
        self.owner = Some(owner);
    }

    pub(crate) fn detach(&mut self) {
        self.owner = None;
    }

    pub(crate) fn mark_setup(&mut self) {
        self.is_setup = true;
    }

    pub(crate) fn mark_disposed(&mut self) {
        self.disposed = true;
    }
}

/// 组件更新/释放时可访问的上下文
pub struct ComponentContext<'a> {
    /// 所属对象
    pub owner: ObjectId,
    /// 对象存储（所属对象仍在其中，只是组件列表被暂时取出）
    pub objects: &'a mut ObjectStore,
    /// 引擎上下文
    pub engine: &'a EngineContext,
}

impl<'a> ComponentContext<'a> {
    pub fn new(owner: ObjectId, objects: &'a mut ObjectStore, engine: &'a EngineContext) -> Self {
        Self {
            owner,
            objects,
            engine,
        }
    }

    /// 所属对象；对象已不在存储中时返回 `None`
    pub fn object(&self) -> Option<&GameObject> {
        self.objects.get(self.owner)
    }

    pub fn object_mut(&mut self) -> Option<&mut GameObject> {
        self.objects.get_mut(self.owner)
    }

    /// 当前临时设置
    pub fn settings(&self) -> TempSettings {
        self.engine.settings()
    }
}

/// 组件接口
///
/// 对可选数据的缺失（对象不存在、字段为空）必须静默跳过，
/// `update()` 不得因此 panic。
pub trait Component: Any {
    /// 类名，编解码器据此查找类元数据
    fn class_name(&self) -> &'static str;

    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    /// 首次更新前调用一次
    fn setup(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// 每帧调用
    fn update(&mut self, cx: &mut ComponentContext<'_>);

    /// 释放资源与订阅，最多调用一次
    fn dispose(&mut self, _cx: &mut ComponentContext<'_>) {}

    /// 数据包恢复后调用，用于重新建立无法序列化的状态
    ///
    /// `data` 是该组件在数据包中的原始数据。
    fn on_data_bundle_restore(
        &mut self,
        _data: &Value,
        _cx: &mut RestoreContext<'_>,
    ) -> Result<(), CodecError> {
        Ok(())
    }

    /// 默认的字段遍历序列化；不持久化的组件保持默认实现
    fn to_bundle_value(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::Null)
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
