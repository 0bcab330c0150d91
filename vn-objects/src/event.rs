//! # Event 模块
//!
//! 单线程事件总线。
//!
//! 订阅返回 [`Subscription`] 句柄，句柄被 drop 时自动取消订阅。
//! 组件在 `dispose()` 中释放自己持有的句柄即可完成清理，
//! 不需要按 owner 反查。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::object::ObjectId;

/// 事件处理函数
pub type EventHandler = Rc<dyn Fn(&GameEvent)>;

/// 事件
#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    /// 事件名
    pub name: String,
    /// 发出事件的对象
    pub sender: Option<ObjectId>,
    /// 附加数据
    pub data: Value,
}

impl GameEvent {
    /// 创建无附加数据的事件
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sender: None,
            data: Value::Null,
        }
    }

    /// 设置发送者
    pub fn with_sender(mut self, sender: ObjectId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// 设置附加数据
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

struct HandlerEntry {
    id: u64,
    owner: Option<ObjectId>,
    handler: EventHandler,
}

#[derive(Default)]
struct BusInner {
    handlers: HashMap<String, Vec<HandlerEntry>>,
    next_id: u64,
}

impl BusInner {
    fn remove(&mut self, name: &str, id: u64) {
        if let Some(list) = self.handlers.get_mut(name) {
            list.retain(|entry| entry.id != id);
            if list.is_empty() {
                self.handlers.remove(name);
            }
        }
    }
}

/// 事件总线
///
/// 克隆得到的是同一条总线的另一个句柄。
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("events", &inner.handlers.len())
            .finish()
    }
}

impl EventBus {
    /// 创建新的事件总线
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅事件
    pub fn on(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&GameEvent) + 'static,
    ) -> Subscription {
        self.subscribe(name.into(), None, Rc::new(handler))
    }

    /// 订阅事件并记录所属对象，可配合 [`EventBus::off_by_owner`] 批量取消
    pub fn on_owned(
        &self,
        name: impl Into<String>,
        owner: ObjectId,
        handler: impl Fn(&GameEvent) + 'static,
    ) -> Subscription {
        self.subscribe(name.into(), Some(owner), Rc::new(handler))
    }

    fn subscribe(
        &self,
        name: String,
        owner: Option<ObjectId>,
        handler: EventHandler,
    ) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .handlers
            .entry(name.clone())
            .or_default()
            .push(HandlerEntry { id, owner, handler });

        Subscription {
            bus: Rc::downgrade(&self.inner),
            name,
            id,
        }
    }

    /// 发出事件
    ///
    /// 处理函数按订阅顺序调用。调用前先复制处理函数列表，
    /// 因此处理函数内部可以继续订阅或取消订阅。
    ///
    /// # 返回
    /// 被调用的处理函数数量
    pub fn emit(&self, event: &GameEvent) -> usize {
        let handlers: Vec<EventHandler> = {
            let inner = self.inner.borrow();
            match inner.handlers.get(&event.name) {
                Some(list) => list.iter().map(|entry| entry.handler.clone()).collect(),
                None => return 0,
            }
        };

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// 取消某个对象在指定事件上的全部订阅
    ///
    /// # 返回
    /// 被移除的订阅数量
    pub fn off_by_owner(&self, name: &str, owner: ObjectId) -> usize {
        let mut inner = self.inner.borrow_mut();
        let Some(list) = inner.handlers.get_mut(name) else {
            return 0;
        };
        let before = list.len();
        list.retain(|entry| entry.owner != Some(owner));
        let removed = before - list.len();
        if list.is_empty() {
            inner.handlers.remove(name);
        }
        removed
    }

    /// 指定事件当前的订阅数量
    pub fn handler_count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .handlers
            .get(name)
            .map_or(0, |list| list.len())
    }

    /// 清空所有订阅
    pub fn clear(&self) {
        self.inner.borrow_mut().handlers.clear();
    }
}

/// 订阅句柄
///
/// drop 时从总线上移除对应的处理函数；总线已经不存在时什么也不做。
#[must_use = "丢弃 Subscription 会立即取消订阅"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    name: String,
    id: u64,
}

impl Subscription {
    /// 订阅的事件名
    pub fn event_name(&self) -> &str {
        &self.name
    }

    /// 订阅是否仍然有效
    pub fn is_active(&self) -> bool {
        self.bus.upgrade().is_some_and(|bus| {
            bus.borrow()
                .handlers
                .get(&self.name)
                .is_some_and(|list| list.iter().any(|entry| entry.id == self.id))
        })
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().remove(&self.name, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_subscribers() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        let _sub = bus.on("click", move |_| counter.set(counter.get() + 1));

        assert_eq!(bus.emit(&GameEvent::new("click")), 1);
        assert_eq!(bus.emit(&GameEvent::new("other")), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.on("click", |_| {});
        assert!(sub.is_active());
        assert_eq!(bus.handler_count("click"), 1);

        drop(sub);
        assert_eq!(bus.handler_count("click"), 0);
    }

    #[test]
    fn test_off_by_owner() {
        let bus = EventBus::new();
        let owner = ObjectId::new(7);
        let a = bus.on_owned("tick", owner, |_| {});
        let _b = bus.on("tick", |_| {});

        assert_eq!(bus.off_by_owner("tick", owner), 1);
        assert_eq!(bus.handler_count("tick"), 1);
        assert!(!a.is_active());
        // 已移除的句柄 drop 不影响其它订阅
        drop(a);
        assert_eq!(bus.handler_count("tick"), 1);
    }

    #[test]
    fn test_handler_can_unsubscribe_during_emit() {
        let bus = EventBus::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let inner = slot.clone();
        let sub = bus.on("once", move |_| {
            inner.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        assert_eq!(bus.emit(&GameEvent::new("once")), 1);
        assert_eq!(bus.handler_count("once"), 0);
        assert_eq!(bus.emit(&GameEvent::new("once")), 0);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let sub = bus.on("click", |_| {});
        drop(bus);
        assert!(!sub.is_active());
        drop(sub);
    }
}
