//! # VN Objects
//!
//! Visual Novel Engine 的对象运行时。
//!
//! ## 架构概述
//!
//! 屏幕上的每个实体（图片、布局、计时器……）都是一个 [`GameObject`]：
//! 只保存数据，行为全部来自挂载的 [`Component`]。
//!
//! ```text
//! Host                                World
//!   │                                   │
//!   │──── update() 每帧一次 ───────────►│
//!   │                                   │ 根对象 → 组件（按挂载顺序）
//!   │                                   │        → Container → 子对象 ...
//!   │                                   │
//!   │──── ObjectCodec::serialize ──────►│ WorldBundle（纯数据）
//!   │◄─── ObjectCodec::restore ─────────│ 重建对象图 + 恢复钩子
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! use vn_objects::{BlendAnimation, Container, EasingFunction, EngineContext, World};
//!
//! let mut world = World::new(EngineContext::new());
//! let root = world.create_root("layout");
//! world.store_mut().add_component(root, Container::new())?;
//!
//! let picture = world.store_mut().create("picture");
//! world.store_mut().add_component(picture, BlendAnimation::new())?;
//! world.store_mut().add_child(root, picture)?;
//!
//! let settings = world.engine().settings();
//! world.store_mut().with_component_mut::<BlendAnimation, _>(picture, |anim, object| {
//!     anim.start(object, settings, 0.0, 30, EasingFunction::EaseOut, None)
//! })?;
//!
//! loop {
//!     world.update();
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`easing`]：缓动函数与逐帧插值器
//! - [`component`]：组件契约
//! - [`object`]：游戏对象
//! - [`store`]：对象存储与世界
//! - [`components`]：容器、计时器、事件绑定、场景调用
//! - [`animation`]：动画组件族
//! - [`event`]：事件总线
//! - [`context`]：引擎上下文
//! - [`codec`]：数据包编解码
//! - [`error`]：错误类型定义

pub mod animation;
pub mod codec;
pub mod component;
pub mod components;
pub mod context;
pub mod easing;
pub mod error;
pub mod event;
pub mod object;
pub mod store;

// 重导出核心类型
pub use animation::{
    AnimationCallback, AnimationComponent, AnimationDriver, AnimationState, BlendAnimation,
    BlurAnimation, ImageAnimation, Live2DAnimation, ZoomAnimation,
};
pub use codec::{
    BundleVersion, CodecRegistry, IdPolicy, ObjectBundle, ObjectClass, ObjectCodec,
    RestoreContext, SlotBundle, WorldBundle,
};
pub use component::{Component, ComponentBase, ComponentContext};
pub use components::{
    BindingAction, Container, DisposeBehavior, DomainContainer, SceneCall, SignalBinding, Timer,
};
pub use context::{Document, EngineContext, RecordManager, TempSettings};
pub use easing::{Easing, EasingFunction};
pub use error::{CodecError, ObjectError, VnError, VnResult};
pub use event::{EventBus, GameEvent, Subscription};
pub use object::{
    BlurEffect, DEFAULT_DOMAIN, Effects, GameObject, ObjectDomain, ObjectId, Point, Rect,
    TextureHandle,
};
pub use store::{ObjectStore, World};
