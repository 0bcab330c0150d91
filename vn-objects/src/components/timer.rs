//! # Timer 组件
//!
//! 倒计时 / 秒表。事件发到所属对象的本地事件总线上：
//!
//! - 倒计时归零：`"finish"`（每次运行恰好一次）
//! - 秒表每满一秒：`"elapsed"`，附带已经过的秒数

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::component::{Component, ComponentBase, ComponentContext};
use crate::event::GameEvent;

/// 每秒帧数
pub const FRAMES_PER_SECOND: u32 = 60;

/// 计时器
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timer {
    pub base: ComponentBase,
    pub minutes: u32,
    pub seconds: u32,
    /// 秒表模式（正计时）
    pub stopwatch: bool,
    /// 倒计时剩余帧数 / 秒表已经过帧数
    pub frames: u32,
    pub running: bool,
    paused: bool,
}

impl Timer {
    /// 倒计时
    pub fn countdown(minutes: u32, seconds: u32) -> Self {
        Self {
            minutes,
            seconds,
            ..Self::default()
        }
    }

    /// 秒表
    pub fn stopwatch() -> Self {
        Self {
            stopwatch: true,
            ..Self::default()
        }
    }

    /// 开始计时
    pub fn start(&mut self) {
        self.frames = if self.stopwatch {
            0
        } else {
            (self.minutes * 60 + self.seconds) * FRAMES_PER_SECOND
        };
        self.running = true;
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 已经过的整秒数（秒表）或剩余整秒数（倒计时，向上取整）
    pub fn display_seconds(&self) -> u32 {
        if self.stopwatch {
            self.frames / FRAMES_PER_SECOND
        } else {
            self.frames.div_ceil(FRAMES_PER_SECOND)
        }
    }

    fn emit(&self, cx: &ComponentContext<'_>, event: GameEvent) {
        let Some(object) = cx.object() else {
            return;
        };
        let events = object.events.clone();
        events.emit(&event.with_sender(cx.owner));
    }
}

impl Component for Timer {
    fn class_name(&self) -> &'static str {
        "Timer"
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn update(&mut self, cx: &mut ComponentContext<'_>) {
        if !self.running || self.paused {
            return;
        }

        if self.stopwatch {
            self.frames += 1;
            if self.frames % FRAMES_PER_SECOND == 0 {
                let seconds = self.frames / FRAMES_PER_SECOND;
                self.emit(cx, GameEvent::new("elapsed").with_data(json!(seconds)));
            }
            return;
        }

        self.frames = self.frames.saturating_sub(1);
        if self.frames == 0 {
            self.running = false;
            self.emit(cx, GameEvent::new("finish"));
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

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::context::EngineContext;
    use crate::store::ObjectStore;

    #[test]
    fn test_countdown_frames() {
        let mut timer = Timer::countdown(1, 30);
        timer.start();
        assert_eq!(timer.frames, 90 * 60);
        assert_eq!(timer.display_seconds(), 90);
    }

    #[test]
    fn test_countdown_finishes_once() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("timer");
        let mut timer = Timer::countdown(0, 2);
        timer.start();
        store.add_component(id, timer).unwrap();

        let finished = Rc::new(Cell::new(0));
        let counter = finished.clone();
        let _sub = store
            .get(id)
            .unwrap()
            .events
            .on("finish", move |_| counter.set(counter.get() + 1));

        for _ in 0..119 {
            store.update_object(id, &engine);
        }
        assert_eq!(finished.get(), 0);

        store.update_object(id, &engine);
        store.update_object(id, &engine);
        assert_eq!(finished.get(), 1);
        let timer = store.get(id).unwrap().find_component::<Timer>().unwrap();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stopwatch_elapsed_every_second() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("timer");
        let mut timer = Timer::stopwatch();
        timer.start();
        store.add_component(id, timer).unwrap();

        let seconds = Rc::new(Cell::new(0));
        let last = seconds.clone();
        let _sub = store.get(id).unwrap().events.on("elapsed", move |event| {
            last.set(event.data.as_u64().unwrap_or_default());
        });

        for _ in 0..150 {
            store.update_object(id, &engine);
        }
        assert_eq!(seconds.get(), 2);
    }

    #[test]
    fn test_pause_holds_frames() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("timer");
        let mut timer = Timer::countdown(0, 1);
        timer.start();
        timer.pause();
        store.add_component(id, timer).unwrap();

        store.update_object(id, &engine);
        store
            .with_component_mut::<Timer, _>(id, |timer, _| {
                assert_eq!(timer.frames, 60);
                timer.resume();
            })
            .unwrap();
        store.update_object(id, &engine);

        let timer = store.get(id).unwrap().find_component::<Timer>().unwrap();
        assert_eq!(timer.frames, 59);
    }
}
