//! # 对象运行时集成测试
//!
//! 通过公共 API 驱动 World，验证容器、动画、计时器与跳过模式的组合行为。

use std::cell::Cell;
use std::rc::Rc;

use vn_objects::{
    AnimationComponent, BindingAction, BlendAnimation, Component, Container, DisposeBehavior,
    EasingFunction, EngineContext, GameEvent, GameObject, ObjectId, Point, SignalBinding, Timer,
    World, ZoomAnimation,
};

/// 创建一个带容器的根对象和若干子对象
fn layout_with_children(
    world: &mut World,
    behavior: DisposeBehavior,
    orders: &[i32],
) -> (ObjectId, Vec<ObjectId>) {
    let root = world.create_root("layout");
    let store = world.store_mut();
    store
        .add_component(root, Container::with_dispose_behavior(behavior))
        .unwrap();

    let mut children = Vec::new();
    for order in orders {
        let child = store.create("picture");
        store.add_child(root, child).unwrap();
        store.set_order(child, *order).unwrap();
        children.push(child);
    }
    (root, children)
}

fn child_orders(world: &World, parent: ObjectId) -> Vec<i32> {
    let store = world.store();
    store
        .get(parent)
        .unwrap()
        .sub_objects()
        .iter()
        .flatten()
        .map(|id| store.get(*id).unwrap().order)
        .collect()
}

#[test]
fn test_container_sorts_descending_with_stable_ties() {
    let mut world = World::new(EngineContext::new());
    let (root, children) =
        layout_with_children(&mut world, DisposeBehavior::Remove, &[3, 9, 1, 9, 4]);

    world.update();
    assert_eq!(child_orders(&world, root), vec![9, 9, 4, 3, 1]);

    // 相同 order 保持原先的相对顺序
    let slots = world.store().get(root).unwrap().sub_objects().to_vec();
    assert_eq!(slots[0], Some(children[1]));
    assert_eq!(slots[1], Some(children[3]));

    // 修改 order 后下一帧重新排序
    world.store_mut().set_order(children[2], 100).unwrap();
    world.update();
    assert_eq!(child_orders(&world, root), vec![100, 9, 9, 4, 3]);
}

#[test]
fn test_dispose_behaviors() {
    let mut world = World::new(EngineContext::new());
    let (remove_root, removing) =
        layout_with_children(&mut world, DisposeBehavior::Remove, &[0, 0, 0]);
    let (keep_root, keeping) =
        layout_with_children(&mut world, DisposeBehavior::KeepSlot, &[0, 0, 0]);
    world.update();

    world.dispose(removing[1]);
    world.dispose(keeping[1]);
    world.update();

    let store = world.store();
    assert_eq!(
        store.get(remove_root).unwrap().sub_objects(),
        &[Some(removing[0]), Some(removing[2])]
    );
    assert_eq!(
        store.get(keep_root).unwrap().sub_objects(),
        &[Some(keeping[0]), None, Some(keeping[2])]
    );
    assert!(!store.contains(removing[1]));
    assert!(!store.contains(keeping[1]));
}

#[test]
fn test_blend_fade_in_scenario() {
    let mut world = World::new(EngineContext::new());
    let picture = world.create_root("picture");
    let settings = world.engine().settings();
    let fired = Rc::new(Cell::new(0));

    let store = world.store_mut();
    store.get_mut(picture).unwrap().opacity = 0.0;
    store.add_component(picture, BlendAnimation::new()).unwrap();
    let counter = fired.clone();
    store
        .with_component_mut::<BlendAnimation, _>(picture, |anim, object| {
            anim.start(
                object,
                settings,
                255.0,
                10,
                EasingFunction::Linear,
                Some(Box::new(move |object: &mut GameObject, _: &dyn Component| {
                    assert_eq!(object.opacity, 255.0);
                    counter.set(counter.get() + 1);
                })),
            )
        })
        .unwrap();

    for _ in 0..5 {
        world.update();
    }
    let opacity = world.store().get(picture).unwrap().opacity;
    assert!((opacity - 127.5).abs() < 0.01, "opacity = {opacity}");
    assert_eq!(fired.get(), 0);

    for _ in 0..5 {
        world.update();
    }
    assert_eq!(world.store().get(picture).unwrap().opacity, 255.0);
    assert_eq!(fired.get(), 1);

    // 之后的帧不再触发回调
    world.update();
    assert_eq!(fired.get(), 1);
    let anim = world
        .store()
        .get(picture)
        .unwrap()
        .find_component::<BlendAnimation>()
        .unwrap();
    assert!(!anim.is_running());
}

#[test]
fn test_timer_countdown_scenario() {
    let mut world = World::new(EngineContext::new());
    let id = world.create_root("timer");
    let mut timer = Timer::countdown(1, 0);
    timer.start();
    assert_eq!(timer.frames, 60 * 60);
    world.store_mut().add_component(id, timer).unwrap();

    let finished = Rc::new(Cell::new(0));
    let counter = finished.clone();
    let _sub = world
        .store()
        .get(id)
        .unwrap()
        .events
        .on("finish", move |_| counter.set(counter.get() + 1));

    for _ in 0..(60 * 60 - 1) {
        world.update();
    }
    assert_eq!(finished.get(), 0);

    world.update();
    assert_eq!(finished.get(), 1);
    let timer = world
        .store()
        .get(id)
        .unwrap()
        .find_component::<Timer>()
        .unwrap();
    assert!(!timer.is_running());

    for _ in 0..10 {
        world.update();
    }
    assert_eq!(finished.get(), 1);
}

#[test]
fn test_skip_mode_compresses_running_animation() {
    let engine = EngineContext::new();
    let mut world = World::new(engine.clone());
    let picture = world.create_root("picture");
    let settings = engine.settings();

    let store = world.store_mut();
    store.add_component(picture, ZoomAnimation::new()).unwrap();
    store
        .with_component_mut::<ZoomAnimation, _>(picture, |anim, object| {
            anim.start(
                object,
                settings,
                Point::new(3.0, 3.0),
                100,
                EasingFunction::Linear,
                None,
            )
        })
        .unwrap();

    for _ in 0..10 {
        world.update();
    }

    // 剩余部分改为 4 帧，从头播放
    engine.set_skip(true, 4);
    world.update();
    let zoom = world.store().get(picture).unwrap().zoom;
    assert!((zoom.x - 1.5).abs() < 1e-5, "zoom = {zoom:?}");

    for _ in 0..3 {
        world.update();
    }
    assert_eq!(
        world.store().get(picture).unwrap().zoom,
        Point::new(3.0, 3.0)
    );
}

#[test]
fn test_instant_skip_finishes_immediately() {
    let engine = EngineContext::new();
    let mut world = World::new(engine.clone());
    let picture = world.create_root("picture");
    let settings = engine.settings();

    let store = world.store_mut();
    store.get_mut(picture).unwrap().opacity = 0.0;
    store.add_component(picture, BlendAnimation::new()).unwrap();
    store
        .with_component_mut::<BlendAnimation, _>(picture, |anim, object| {
            anim.start(object, settings, 200.0, 60, EasingFunction::EaseIn, None)
        })
        .unwrap();
    world.update();

    engine.set_skip(true, 0);
    world.update();
    assert_eq!(world.store().get(picture).unwrap().opacity, 200.0);
}

#[test]
fn test_signal_binding_disposes_child_through_container() {
    let engine = EngineContext::new();
    let mut world = World::new(engine.clone());
    let (root, children) = layout_with_children(&mut world, DisposeBehavior::Remove, &[0, 0]);
    world
        .store_mut()
        .add_component(
            children[0],
            SignalBinding::new("close_popup", BindingAction::Dispose),
        )
        .unwrap();
    world.update();

    engine.events.emit(&GameEvent::new("close_popup"));
    world.update();
    assert!(world.store().get(children[0]).unwrap().disposed);
    assert_eq!(engine.events.handler_count("close_popup"), 0);

    world.update();
    assert_eq!(
        world.store().get(root).unwrap().sub_objects(),
        &[Some(children[1])]
    );
}

#[test]
fn test_set_visible_propagates_through_container() {
    let mut world = World::new(EngineContext::new());
    let (root, children) = layout_with_children(&mut world, DisposeBehavior::Remove, &[0, 0]);

    world.set_visible(root, false).unwrap();

    let store = world.store();
    assert!(!store.get(root).unwrap().visible);
    assert!(children.iter().all(|c| !store.get(*c).unwrap().visible));
}
