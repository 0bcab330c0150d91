//! # Codec 模块
//!
//! 对象图与数据包之间的转换。
//!
//! ## 序列化
//!
//! 对每个对象：
//! 1. 字段：类有自定义生成函数时用它，否则序列化全部字段再去掉黑名单中的字段
//! 2. 组件：按类的组件过滤写出已注册的组件（未注册的跳过）
//! 3. 子对象：按域写出；已写过的对象只写引用，空槽位写 `empty`
//!
//! ## 恢复
//!
//! 1. 构建：分配 id、反序列化字段、用工厂函数构建组件、递归构建子对象
//! 2. 解析引用：`ref` 槽位指向的对象必须已在本次恢复中出现
//! 3. 钩子：按先父后子的顺序，先调用对象类的恢复函数，再依次调用组件的
//!    `on_data_bundle_restore`
//!
//! 任一步失败时，本次恢复创建的对象全部移除，错误返回给调用方。

mod bundle;
mod context;
mod registry;

pub use bundle::{
    BUNDLE_VERSION_MAJOR, BUNDLE_VERSION_MINOR, BundleVersion, ComponentBundle, DomainBundle,
    ObjectBundle, SlotBundle, WorldBundle,
};
pub use context::RestoreContext;
pub use registry::{
    CodecRegistry, ComponentClass, ComponentFactory, ComponentProducer, ObjectClass,
    ObjectProducer, ObjectRestorer, SUB_OBJECTS_FIELD,
};

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::EngineContext;
use crate::error::CodecError;
use crate::object::{GameObject, ObjectId};
use crate::store::{ObjectStore, World};

/// 恢复时的 id 策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// 保留数据包中的 id（恢复整个世界），重复 id 视为错误
    Preserve,
    /// 分配新 id（把子树恢复到已有的存储中）
    Remap,
}

/// 对象编解码器
#[derive(Debug, Clone)]
pub struct ObjectCodec {
    registry: CodecRegistry,
}

impl Default for ObjectCodec {
    fn default() -> Self {
        Self::new(CodecRegistry::with_defaults())
    }
}

impl ObjectCodec {
    pub fn new(registry: CodecRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CodecRegistry {
        &mut self.registry
    }

    // ========== 序列化 ==========

    /// 序列化整个世界
    pub fn serialize_world(&self, world: &World) -> Result<WorldBundle, CodecError> {
        let mut writer = Writer::new(&self.registry, world.store());
        let mut roots = Vec::with_capacity(world.roots().len());
        for &id in world.roots() {
            match writer.write(id)? {
                Some(SlotBundle::Object(object)) => roots.push(*object),
                _ => debug!(object = %id, "root already written, skipped"),
            }
        }
        Ok(WorldBundle::new(world.frame(), roots))
    }

    /// 序列化一个对象及其子树
    pub fn serialize_object(
        &self,
        store: &ObjectStore,
        id: ObjectId,
    ) -> Result<ObjectBundle, CodecError> {
        let mut writer = Writer::new(&self.registry, store);
        match writer.write(id)? {
            Some(SlotBundle::Object(object)) => Ok(*object),
            _ => Err(CodecError::UnresolvedReference {
                reference: id.to_string(),
            }),
        }
    }

    // ========== 恢复 ==========

    /// 用新的恢复上下文恢复整个世界
    pub fn restore_world(
        &self,
        bundle: &WorldBundle,
        engine: &EngineContext,
    ) -> Result<World, CodecError> {
        let mut cx = RestoreContext::new(engine);
        self.restore_world_with(bundle, &mut cx)
    }

    /// 用调用方提供的恢复上下文恢复整个世界（可预先登记共享对象）
    pub fn restore_world_with(
        &self,
        bundle: &WorldBundle,
        cx: &mut RestoreContext<'_>,
    ) -> Result<World, CodecError> {
        bundle.check_version()?;
        let mut store = ObjectStore::new();
        let roots = self.restore_into(&mut store, &bundle.roots, IdPolicy::Preserve, cx)?;
        Ok(World::from_parts(
            store,
            roots,
            cx.engine().clone(),
            bundle.frame,
        ))
    }

    /// 把一个对象子树恢复到已有的存储中，分配新 id
    ///
    /// 返回的根对象没有父对象，由调用方加入容器或世界根。
    pub fn restore_object(
        &self,
        store: &mut ObjectStore,
        bundle: &ObjectBundle,
        engine: &EngineContext,
    ) -> Result<ObjectId, CodecError> {
        let mut cx = RestoreContext::new(engine);
        let roots = self.restore_into(
            store,
            std::slice::from_ref(bundle),
            IdPolicy::Remap,
            &mut cx,
        )?;
        roots
            .into_iter()
            .next()
            .ok_or_else(|| CodecError::MalformedBundle {
                message: "没有恢复出任何对象".to_string(),
            })
    }

    fn restore_into<'b>(
        &self,
        store: &mut ObjectStore,
        bundles: &'b [ObjectBundle],
        policy: IdPolicy,
        cx: &mut RestoreContext<'_>,
    ) -> Result<Vec<ObjectId>, CodecError> {
        let mut reader = Reader::<'_, 'b>::new(&self.registry, policy);
        let result = reader.run(store, bundles, cx);
        if let Err(e) = &result {
            warn!(error = %e, created = reader.created.len(), "restore failed, rolling back");
            for id in &reader.created {
                store.take(*id);
            }
        }
        result
    }
}

/// 序列化遍历状态
struct Writer<'r> {
    registry: &'r CodecRegistry,
    store: &'r ObjectStore,
    written: HashSet<ObjectId>,
}

impl<'r> Writer<'r> {
    fn new(registry: &'r CodecRegistry, store: &'r ObjectStore) -> Self {
        Self {
            registry,
            store,
            written: HashSet::new(),
        }
    }

    /// 写出一个对象；对象不在存储中时返回 `None`
    fn write(&mut self, id: ObjectId) -> Result<Option<SlotBundle>, CodecError> {
        let (registry, store) = (self.registry, self.store);
        let Some(object) = store.get(id) else {
            return Ok(None);
        };
        if !self.written.insert(id) {
            return Ok(Some(SlotBundle::Ref(id.value())));
        }

        let class = object.class();
        let blacklist = registry.blacklist(class);

        let fields = match registry.object_producer(class) {
            Some(producer) => producer(object)?,
            None => match serde_json::to_value(object)? {
                Value::Object(mut map) => {
                    map.retain(|key, _| !blacklist.contains(key.as_str()));
                    map
                }
                _ => {
                    return Err(CodecError::MalformedBundle {
                        message: format!("对象 {id} 的字段不是 JSON 对象"),
                    });
                }
            },
        };

        let components = self.write_components(object)?;

        let mut domains = Vec::new();
        if !blacklist.contains(SUB_OBJECTS_FIELD) && !has_no_children(object) {
            for domain in object.domains() {
                let mut objects = Vec::with_capacity(domain.objects.len());
                for slot in &domain.objects {
                    let slot = match slot {
                        Some(child) => self.write(*child)?.unwrap_or(SlotBundle::Empty),
                        None => SlotBundle::Empty,
                    };
                    objects.push(slot);
                }
                domains.push(DomainBundle {
                    name: domain.name.clone(),
                    objects,
                    needs_sort: domain.needs_sort,
                });
            }
        }

        Ok(Some(SlotBundle::Object(Box::new(ObjectBundle {
            id: id.value(),
            class: class.to_string(),
            fields,
            components,
            domains,
        }))))
    }

    fn write_components(&self, object: &GameObject) -> Result<Vec<ComponentBundle>, CodecError> {
        let filter = self.registry.bundle_components(object.class());
        let mut components = Vec::new();
        for component in object.components() {
            let class = component.class_name();
            if filter.is_some_and(|f| !f.iter().any(|c| c == class)) {
                continue;
            }
            let Some(meta) = self.registry.component_class(class) else {
                debug!(object = %object.id(), component = class, "unregistered component skipped");
                continue;
            };
            let data = match meta.producer {
                Some(producer) => producer(component)?,
                None => component.to_bundle_value()?,
            };
            components.push(ComponentBundle {
                class: class.to_string(),
                data,
            });
        }
        Ok(components)
    }
}

fn has_no_children(object: &GameObject) -> bool {
    object.domains().len() == 1 && object.sub_objects().is_empty()
}

/// 待解析的引用槽位
struct PendingRef {
    parent: ObjectId,
    domain: String,
    index: usize,
    saved: u64,
}

/// 恢复遍历状态
struct Reader<'r, 'b> {
    registry: &'r CodecRegistry,
    policy: IdPolicy,
    created: Vec<ObjectId>,
    refs: Vec<PendingRef>,
    /// 先父后子
    hooks: Vec<(ObjectId, &'b ObjectBundle)>,
}

impl<'r, 'b> Reader<'r, 'b> {
    fn new(registry: &'r CodecRegistry, policy: IdPolicy) -> Self {
        Self {
            registry,
            policy,
            created: Vec::new(),
            refs: Vec::new(),
            hooks: Vec::new(),
        }
    }

    fn run(
        &mut self,
        store: &mut ObjectStore,
        bundles: &'b [ObjectBundle],
        cx: &mut RestoreContext<'_>,
    ) -> Result<Vec<ObjectId>, CodecError> {
        let mut roots = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            roots.push(self.build(store, bundle, None, cx)?);
        }
        self.resolve_refs(store, cx)?;
        self.run_hooks(store, cx)?;
        Ok(roots)
    }

    fn build(
        &mut self,
        store: &mut ObjectStore,
        bundle: &'b ObjectBundle,
        parent: Option<ObjectId>,
        cx: &mut RestoreContext<'_>,
    ) -> Result<ObjectId, CodecError> {
        let id = match self.policy {
            IdPolicy::Preserve => {
                let id = ObjectId::new(bundle.id);
                if store.contains(id) {
                    return Err(CodecError::DuplicateObject { id: bundle.id });
                }
                if !store.reserve_id(bundle.id) {
                    return Err(CodecError::MalformedBundle {
                        message: format!("对象 id {} 超出范围", bundle.id),
                    });
                }
                id
            }
            IdPolicy::Remap => store.allocate_id(),
        };
        if !cx.map_id(bundle.id, id) {
            return Err(CodecError::DuplicateObject { id: bundle.id });
        }

        let mut object: GameObject = if self.registry.object_producer(&bundle.class).is_some() {
            GameObject::default()
        } else {
            serde_json::from_value(Value::Object(bundle.fields.clone()))?
        };
        object.assign_identity(id, bundle.class.as_str());
        object.parent = parent;
        object.mark_full_update();

        for component in &bundle.components {
            let meta = self
                .registry
                .component_class(&component.class)
                .ok_or_else(|| CodecError::UnknownClass {
                    class: component.class.clone(),
                })?;
            object.add_boxed_component((meta.factory)(component.data.clone())?);
        }

        store.insert(object);
        self.created.push(id);
        self.hooks.push((id, bundle));

        for domain in &bundle.domains {
            let mut slots = Vec::with_capacity(domain.objects.len());
            for (index, slot) in domain.objects.iter().enumerate() {
                let slot = match slot {
                    SlotBundle::Empty => None,
                    SlotBundle::Object(child) => Some(self.build(store, child, Some(id), cx)?),
                    SlotBundle::Ref(saved) => {
                        self.refs.push(PendingRef {
                            parent: id,
                            domain: domain.name.clone(),
                            index,
                            saved: *saved,
                        });
                        None
                    }
                };
                slots.push(slot);
            }
            if let Some(object) = store.get_mut(id) {
                let list = object.ensure_domain(&domain.name);
                list.objects = slots;
                list.needs_sort = domain.needs_sort;
            }
        }

        Ok(id)
    }

    fn resolve_refs(
        &mut self,
        store: &mut ObjectStore,
        cx: &RestoreContext<'_>,
    ) -> Result<(), CodecError> {
        for pending in self.refs.drain(..) {
            let target = cx.object_id(pending.saved).ok_or_else(|| {
                CodecError::UnresolvedReference {
                    reference: format!("object {}", pending.saved),
                }
            })?;
            let slot = store
                .get_mut(pending.parent)
                .and_then(|o| o.domain_index(&pending.domain).map(|i| (o, i)))
                .and_then(|(o, i)| o.domains[i].objects.get_mut(pending.index));
            match slot {
                Some(slot) => *slot = Some(target),
                None => {
                    return Err(CodecError::MalformedBundle {
                        message: format!("引用槽位 {}/{} 不存在", pending.domain, pending.index),
                    });
                }
            }
        }
        Ok(())
    }

    fn run_hooks(
        &mut self,
        store: &mut ObjectStore,
        cx: &mut RestoreContext<'_>,
    ) -> Result<(), CodecError> {
        for &(id, bundle) in &self.hooks {
            cx.set_owner(id);
            let Some(object) = store.get_mut(id) else {
                continue;
            };

            if let Some(restorer) = self.registry.object_restorer(&bundle.class) {
                restorer(object, bundle, cx)?;
            }

            let mut components = std::mem::take(&mut object.components);
            let result = components
                .iter_mut()
                .zip(&bundle.components)
                .try_for_each(|(component, data)| {
                    component.on_data_bundle_restore(&data.data, cx)
                });
            components.append(&mut object.components);
            object.components = components;
            result?;
        }
        Ok(())
    }
}
