//! # Demo 模块
//!
//! 无界面演示：搭建场景 → 运行若干帧 → 存档 → 用新的引擎上下文恢复 → 比对。

use std::path::PathBuf;

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, info, warn};
use vn_objects::{
    BindingAction, BlendAnimation, Container, Document, EasingFunction, EngineContext, GameEvent,
    ObjectCodec, ObjectError, ObjectId, Point, SceneCall, SignalBinding, Subscription, Timer,
    World, ZoomAnimation,
};

use crate::bundle_store::BundleStore;
use crate::config::HostConfig;

/// 演示场景使用的文档
pub const PROLOGUE_UID: &str = "prologue";

/// 隐藏角色的全局事件
pub const HIDE_CHARACTERS: &str = "hide_characters";

/// 注册演示文档
///
/// 文档属于资源而非存档，每个引擎上下文都要单独注册。
pub fn register_documents(engine: &EngineContext) {
    engine.records.register(Document::new(
        PROLOGUE_UID,
        "序章",
        vec![
            "bg school_gate".to_string(),
            "show alice".to_string(),
            "say alice 早上好".to_string(),
            "wait 30".to_string(),
        ],
    ));
}

/// 演示场景中的对象
#[derive(Debug, Clone, Copy)]
pub struct DemoScene {
    pub layout: ObjectId,
    pub background: ObjectId,
    pub character: ObjectId,
    pub timer: ObjectId,
    pub scene: ObjectId,
}

/// 搭建演示场景
///
/// 演示文档必须已注册到世界的引擎上下文中。
pub fn build_scene(world: &mut World) -> anyhow::Result<DemoScene> {
    let engine = world.engine().clone();
    let settings = engine.settings();
    let document = engine
        .records
        .document(PROLOGUE_UID)
        .with_context(|| format!("文档 '{PROLOGUE_UID}' 未注册"))?;

    let layout = world.create_root("layout");
    let scene = world.create_root("scene");
    let store = world.store_mut();
    store.add_component(layout, Container::new())?;

    // 背景淡入
    let background = store.create("picture");
    store.add_child(layout, background)?;
    store
        .get_mut(background)
        .ok_or(ObjectError::NotFound { id: background })?
        .opacity = 0.0;
    store.add_component(background, BlendAnimation::new())?;
    store.with_component_mut::<BlendAnimation, _>(background, |anim, object| {
        anim.start(object, settings, 255.0, 60, EasingFunction::EaseOut, None)
    })?;

    // 角色放大，收到事件后隐藏
    let character = store.create("picture");
    store.add_child(layout, character)?;
    store.set_order(character, 10)?;
    store.add_component(character, ZoomAnimation::new())?;
    store.add_component(
        character,
        SignalBinding::new(HIDE_CHARACTERS, BindingAction::Hide),
    )?;
    store.with_component_mut::<ZoomAnimation, _>(character, |anim, object| {
        anim.start(
            object,
            settings,
            Point::new(1.2, 1.2),
            90,
            EasingFunction::EaseInOut,
            None,
        )
    })?;

    let timer = store.create("timer");
    store.add_child(layout, timer)?;
    let mut countdown = Timer::countdown(0, 5);
    countdown.start();
    store.add_component(timer, countdown)?;

    store.add_component(scene, SceneCall::new(document))?;

    Ok(DemoScene {
        layout,
        background,
        character,
        timer,
        scene,
    })
}

/// 订阅演示场景中对象的本地事件，仅用于日志
fn watch(world: &World, scene: &DemoScene) -> Vec<Subscription> {
    let mut subscriptions = Vec::new();
    if let Some(object) = world.store().get(scene.timer) {
        subscriptions.push(object.events.on("finish", |_| info!("倒计时结束")));
    }
    if let Some(object) = world.store().get(scene.scene) {
        subscriptions.push(object.events.on("command", |event| {
            debug!(command = %event.data["command"], "scene command");
        }));
        subscriptions.push(object.events.on("finish", |_| info!("场景执行完毕")));
    }
    subscriptions
}

/// 恢复前后第一个不一致的字段
#[derive(Debug, Clone, PartialEq)]
pub struct Divergence {
    /// 形如 `roots[0].domains[0].objects[1].object.fields.opacity`
    pub path: String,
    pub saved: Value,
    pub restored: Value,
}

/// 演示结果
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub frames: u64,
    pub slot: u32,
    pub path: PathBuf,
    pub objects: usize,
    pub restored_objects: usize,
    pub divergence: Option<Divergence>,
}

/// 运行演示
///
/// `slot` 为 `None` 时使用下一个可用槽位。
pub fn run(config: &HostConfig, slot: Option<u32>) -> anyhow::Result<DemoReport> {
    let engine = EngineContext::new();
    register_documents(&engine);
    engine.set_settings(config.skip.settings());

    let mut world = World::new(engine.clone());
    let scene = build_scene(&mut world)?;
    let _subscriptions = watch(&world, &scene);

    for frame in 0..config.frames {
        if frame == config.frames / 2 {
            let handled = engine.events.emit(&GameEvent::new(HIDE_CHARACTERS));
            debug!(frame, handled, event = HIDE_CHARACTERS, "emit");
        }
        world.update();
    }
    info!(
        frames = world.frame(),
        objects = world.store().len(),
        "模拟完成"
    );

    let codec = ObjectCodec::default();
    let bundle = codec.serialize_world(&world)?;

    let store = BundleStore::new(&config.saves_dir);
    let slot = match slot {
        Some(slot) => slot,
        None => store.next_available_slot().context("没有可用的存档槽位")?,
    };
    let path = store.save(slot, &bundle)?;

    let loaded = store.load(slot)?;
    let fresh = EngineContext::new();
    register_documents(&fresh);
    let restored = codec
        .restore_world(&loaded, &fresh)
        .with_context(|| format!("恢复存档 slot {slot} 失败"))?;

    let again = codec.serialize_world(&restored)?;
    let divergence = first_divergence(
        &serde_json::to_value(&bundle)?,
        &serde_json::to_value(&again)?,
    );
    if let Some(d) = &divergence {
        warn!(path = %d.path, saved = %d.saved, restored = %d.restored, "恢复结果与存档不一致");
    }

    Ok(DemoReport {
        frames: world.frame(),
        slot,
        path,
        objects: world.store().len(),
        restored_objects: restored.store().len(),
        divergence,
    })
}

/// 深度优先比较两个 JSON 值，返回第一个不一致的位置
pub fn first_divergence(saved: &Value, restored: &Value) -> Option<Divergence> {
    let mut path = String::new();
    diverge_at(saved, restored, &mut path)
}

fn diverge_at(saved: &Value, restored: &Value, path: &mut String) -> Option<Divergence> {
    let mismatch = |path: &str| Divergence {
        path: path.to_string(),
        saved: saved.clone(),
        restored: restored.clone(),
    };

    match (saved, restored) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, value) in a {
                let len = path.len();
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(key);
                let found = match b.get(key) {
                    Some(other) => diverge_at(value, other, path),
                    None => Some(Divergence {
                        path: path.clone(),
                        saved: value.clone(),
                        restored: Value::Null,
                    }),
                };
                path.truncate(len);
                if found.is_some() {
                    return found;
                }
            }
            b.keys()
                .find(|key| !a.contains_key(*key))
                .map(|key| Divergence {
                    path: if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    },
                    saved: Value::Null,
                    restored: b[key].clone(),
                })
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Some(mismatch(path.as_str()));
            }
            for (index, (x, y)) in a.iter().zip(b).enumerate() {
                let len = path.len();
                path.push_str(&format!("[{index}]"));
                let found = diverge_at(x, y, path);
                path.truncate(len);
                if found.is_some() {
                    return found;
                }
            }
            None
        }
        _ if saved == restored => None,
        _ => Some(mismatch(path.as_str())),
    }
}
