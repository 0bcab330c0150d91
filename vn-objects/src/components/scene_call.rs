//! # SceneCall 组件
//!
//! 子解释器游标：逐帧执行一个 [`Document`] 中的指令。
//!
//! 每帧执行一条，在所属对象的本地事件总线上发出 `"command"`
//! （数据为 `{ "index", "command" }`），全部执行完后发出 `"finish"`。
//! 指令本身的含义由宿主解释。
//!
//! 存档中只记录文档 uid 与执行位置，恢复时通过恢复上下文重新查找文档。

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::codec::RestoreContext;
use crate::component::{Component, ComponentBase, ComponentContext};
use crate::context::Document;
use crate::error::CodecError;
use crate::event::GameEvent;

/// 场景调用
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneCall {
    pub base: ComponentBase,
    /// 下一条要执行的指令
    pub pointer: usize,
    pub finished: bool,
    #[serde(skip)]
    document: Option<Rc<Document>>,
}

impl SceneCall {
    pub fn new(document: Rc<Document>) -> Self {
        Self {
            document: Some(document),
            ..Self::default()
        }
    }

    pub fn document(&self) -> Option<&Rc<Document>> {
        self.document.as_ref()
    }

    /// 文档 uid（用于存档）
    pub fn document_id(&self) -> Option<&str> {
        self.document.as_deref().map(|d| d.uid.as_str())
    }

    fn emit(cx: &ComponentContext<'_>, event: GameEvent) {
        if let Some(object) = cx.object() {
            let events = object.events.clone();
            events.emit(&event.with_sender(cx.owner));
        }
    }
}

impl Component for SceneCall {
    fn class_name(&self) -> &'static str {
        "SceneCall"
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        if self.finished {
            return;
        }
        let Some(document) = self.document.clone() else {
            return;
        };

        if let Some(command) = document.commands.get(self.pointer) {
            let data = json!({ "index": self.pointer, "command": command });
            Self::emit(cx, GameEvent::new("command").with_data(data));
            self.pointer += 1;
        }
        if self.pointer >= document.commands.len() {
            self.finished = true;
            Self::emit(cx, GameEvent::new("finish"));
        }
    }

    fn on_data_bundle_restore(
        &mut self,
        data: &Value,
        cx: &mut RestoreContext<'_>,
    ) -> Result<(), CodecError> {
        let Some(uid) = data.get("document_id").and_then(Value::as_str) else {
            return Ok(());
        };
        match cx.resolve_document(uid) {
            Ok(document) => {
                // 空文档无法区分是否已结束，恢复后按未结束处理
                self.finished =
                    !document.commands.is_empty() && self.pointer >= document.commands.len();
                self.document = Some(document);
                Ok(())
            }
            Err(e) => {
                warn!(object = %cx.owner(), uid, "scene call document missing");
                Err(e)
            }
        }
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

/// SceneCall 的数据包生成函数：只写入文档 uid 与执行位置
pub(crate) fn produce_bundle(component: &dyn Component) -> Result<Value, CodecError> {
    let Some(call) = component.as_any().downcast_ref::<SceneCall>() else {
        return Err(CodecError::MalformedBundle {
            message: format!("组件 '{}' 不是 SceneCall", component.class_name()),
        });
    };
    Ok(json!({
        "document_id": call.document_id(),
        "pointer": call.pointer,
    }))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::context::EngineContext;
    use crate::store::ObjectStore;

    #[test]
    fn test_runs_one_command_per_frame() {
        let engine = EngineContext::new();
        let document = engine.records.register(Document::new(
            "ch01",
            "第一章",
            vec!["bg forest".to_string(), "show alice".to_string()],
        ));
        let mut store = ObjectStore::new();
        let id = store.create("scene");
        store.add_component(id, SceneCall::new(document)).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let (commands, finish) = (log.clone(), log.clone());
        let events = store.get(id).unwrap().events.clone();
        let _a = events.on("command", move |e| {
            commands
                .borrow_mut()
                .push(e.data["command"].as_str().unwrap_or_default().to_string())
        });
        let _b = events.on("finish", move |_| {
            finish.borrow_mut().push("finish".to_string())
        });

        for _ in 0..4 {
            store.update_object(id, &engine);
        }
        assert_eq!(*log.borrow(), vec!["bg forest", "show alice", "finish"]);
    }

    #[test]
    fn test_producer_writes_document_id() {
        let mut call = SceneCall::new(Rc::new(Document::new("ch02", "", Vec::new())));
        call.pointer = 3;

        let value = produce_bundle(&call).unwrap();
        assert_eq!(value, json!({ "document_id": "ch02", "pointer": 3 }));

        let value = produce_bundle(&SceneCall::default()).unwrap();
        assert!(value["document_id"].is_null());
    }
}
