//! # SignalBinding 组件
//!
//! 把全局事件绑定到所属对象的一个动作上。
//!
//! 处理函数只负责计数，动作在所属对象下一次更新时执行，
//! 这样事件可以在任何时刻发出而不需要访问对象存储。

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::codec::RestoreContext;
use crate::component::{Component, ComponentBase, ComponentContext};
use crate::components::container;
use crate::context::EngineContext;
use crate::error::CodecError;
use crate::event::{GameEvent, Subscription};
use crate::object::ObjectId;

/// 收到事件后执行的动作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingAction {
    Show,
    Hide,
    /// 销毁所属对象
    Dispose,
    /// 在所属对象的本地事件总线上转发为另一个事件
    Emit(String),
}

/// 事件绑定
#[derive(Debug, Serialize, Deserialize)]
pub struct SignalBinding {
    #[serde(default)]
    pub base: ComponentBase,
    /// 监听的全局事件名
    pub event: String,
    pub action: BindingAction,
    #[serde(skip)]
    pending: Rc<Cell<u32>>,
    #[serde(skip)]
    subscription: Option<Subscription>,
}

impl SignalBinding {
    pub fn new(event: impl Into<String>, action: BindingAction) -> Self {
        Self {
            base: ComponentBase::new(),
            event: event.into(),
            action,
            pending: Rc::new(Cell::new(0)),
            subscription: None,
        }
    }

    /// 是否已订阅
    pub fn is_bound(&self) -> bool {
        self.subscription.as_ref().is_some_and(|s| s.is_active())
    }

    fn bind(&mut self, engine: &EngineContext, owner: ObjectId) {
        if self.is_bound() {
            return;
        }
        let pending = self.pending.clone();
        self.subscription = Some(engine.events.on_owned(&self.event, owner, move |_| {
            pending.set(pending.get() + 1);
        }));
    }

    fn apply(&self, cx: &mut ComponentContext<'_>) {
        trace!(object = %cx.owner, event = %self.event, action = ?self.action, "signal binding");
        match &self.action {
            BindingAction::Show | BindingAction::Hide => {
                let visible = self.action == BindingAction::Show;
                if let Some(object) = cx.object_mut() {
                    object.set_visible(visible);
                }
                container::propagate_visibility(cx.objects, cx.owner, visible, cx.engine);
            }
            BindingAction::Dispose => cx.objects.dispose_object(cx.owner, cx.engine),
            BindingAction::Emit(name) => {
                if let Some(object) = cx.object() {
                    let events = object.events.clone();
                    events.emit(&GameEvent::new(name.as_str()).with_sender(cx.owner));
                }
            }
        }
    }
}

impl Component for SignalBinding {
    fn class_name(&self) -> &'static str {
        "SignalBinding"
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn setup(&mut self, cx: &mut ComponentContext<'_>) {
        self.bind(cx.engine, cx.owner);
    }

    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        let count = self.pending.replace(0);
        for _ in 0..count {
            if cx.object().is_none_or(|o| o.disposed) {
                break;
            }
            self.apply(cx);
        }
    }

    fn dispose(&mut self, _cx: &mut ComponentContext<'_>) {
        self.subscription = None;
        self.pending.set(0);
    }

    fn on_data_bundle_restore(
        &mut self,
        _data: &Value,
        cx: &mut RestoreContext<'_>,
    ) -> Result<(), CodecError> {
        let engine = cx.engine().clone();
        self.bind(&engine, cx.owner());
        Ok(())
    }

    fn to_bundle_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
