//! # Store 模块
//!
//! 对象存储与世界。
//!
//! ## 更新模型
//!
//! ```text
//! World::update()                    每帧一次
//!   └─ 按顺序更新根对象
//!        └─ ObjectStore::update_object(id)
//!             ├─ 取出该对象的组件列表
//!             ├─ 按插入顺序 setup()/update() 每个组件
//!             │    └─ 容器组件递归更新子对象
//!             └─ 放回组件列表，清除脏标记
//! ```
//!
//! 全部操作在单线程内一次执行完毕，不存在挂起或并发。

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::component::{Component, ComponentContext};
use crate::components::container;
use crate::context::EngineContext;
use crate::error::ObjectError;
use crate::object::{DEFAULT_DOMAIN, GameObject, ObjectId, Point};

/// 对象存储
///
/// 以 [`ObjectId`] 为键保存全部对象。父子关系通过 id 表达，
/// 子对象的生命周期由父对象上的容器组件决定。
pub struct ObjectStore {
    objects: HashMap<ObjectId, GameObject>,
    next_object_id: u64,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("objects", &self.objects.len())
            .field("next_object_id", &self.next_object_id)
            .finish()
    }
}

impl ObjectStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            next_object_id: 1,
        }
    }

    pub(crate) fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_object_id);
        self.next_object_id += 1;
        id
    }

    /// 保证后续分配的 id 大于 `raw`
    ///
    /// `raw` 已是最大值时无法再分配，返回 `false`。
    pub(crate) fn reserve_id(&mut self, raw: u64) -> bool {
        match raw.checked_add(1) {
            Some(next) => {
                self.next_object_id = self.next_object_id.max(next);
                true
            }
            None => false,
        }
    }

    pub(crate) fn insert(&mut self, object: GameObject) {
        self.objects.insert(object.id(), object);
    }

    pub(crate) fn take(&mut self, id: ObjectId) -> Option<GameObject> {
        self.objects.remove(&id)
    }

    /// 创建对象
    ///
    /// 新对象没有父对象、没有组件，需要由调用方挂载组件并加入父容器或世界根。
    pub fn create(&mut self, class: impl Into<String>) -> ObjectId {
        let id = self.allocate_id();
        self.objects.insert(id, GameObject::new(id, class));
        id
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut GameObject, ObjectError> {
        self.objects
            .get_mut(&id)
            .ok_or(ObjectError::NotFound { id })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// 所有对象 id（升序）
    pub fn ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        ids.sort();
        ids
    }

    // ========== 组件 ==========

    /// 给对象挂载组件
    pub fn add_component<C: Component>(
        &mut self,
        id: ObjectId,
        component: C,
    ) -> Result<(), ObjectError> {
        let object = self.object_mut(id)?;
        if object.disposed {
            return Err(ObjectError::Disposed { id });
        }
        object.add_component(component);
        Ok(())
    }

    /// 在指定位置插入组件
    pub fn insert_component<C: Component>(
        &mut self,
        id: ObjectId,
        index: usize,
        component: C,
    ) -> Result<(), ObjectError> {
        let object = self.object_mut(id)?;
        if object.disposed {
            return Err(ObjectError::Disposed { id });
        }
        object.insert_component(index, component);
        Ok(())
    }

    /// 移除对象上第一个指定类名的组件
    pub fn remove_component(
        &mut self,
        id: ObjectId,
        class: &str,
    ) -> Result<Box<dyn Component>, ObjectError> {
        self.object_mut(id)?
            .remove_component_by_class(class)
            .ok_or_else(|| ObjectError::ComponentMissing {
                id,
                component: class.to_string(),
            })
    }

    /// 同时借用组件与其所属对象
    ///
    /// 动画的 `start()` 等需要一边修改组件一边读写对象字段的操作经由这里完成。
    pub fn with_component_mut<T: Component, R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut T, &mut GameObject) -> R,
    ) -> Result<R, ObjectError> {
        let object = self.object_mut(id)?;
        let index = object
            .components
            .iter()
            .position(|c| c.as_any().is::<T>())
            .ok_or_else(|| ObjectError::ComponentMissing {
                id,
                component: std::any::type_name::<T>().to_string(),
            })?;

        let mut components = std::mem::take(&mut object.components);
        let result = match components[index].as_any_mut().downcast_mut::<T>() {
            Some(component) => Ok(f(component, &mut *object)),
            None => Err(ObjectError::ComponentMissing {
                id,
                component: std::any::type_name::<T>().to_string(),
            }),
        };
        components.append(&mut object.components);
        object.components = components;
        result
    }

    // ========== 子对象 ==========

    /// 把对象加入父对象的默认域
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) -> Result<(), ObjectError> {
        self.add_child_to_domain(parent, child, DEFAULT_DOMAIN)
    }

    /// 把对象加入父对象的指定域（域不存在时创建）
    ///
    /// 子对象原本属于其它父对象时先从原位置移除。
    ///
    /// 排序、逐帧更新与清理已销毁子对象都由父对象上的容器组件负责。
    /// 父对象没有容器组件时，已销毁的子对象会一直留在存储中，
    /// 需要宿主调用 [`ObjectStore::prune_disposed`]。
    pub fn add_child_to_domain(
        &mut self,
        parent: ObjectId,
        child: ObjectId,
        domain: &str,
    ) -> Result<(), ObjectError> {
        if parent == child {
            return Err(ObjectError::InvalidHierarchy { parent, child });
        }
        if !self.contains(child) {
            return Err(ObjectError::NotFound { id: child });
        }
        if self.is_ancestor(child, parent) {
            return Err(ObjectError::InvalidHierarchy { parent, child });
        }
        if self.object_mut(parent)?.disposed {
            return Err(ObjectError::Disposed { id: parent });
        }

        self.detach_child(child);

        let list = self.object_mut(parent)?.ensure_domain(domain);
        list.objects.push(Some(child));
        list.needs_sort = true;

        self.object_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// `ancestor` 是否为 `id` 的祖先
    fn is_ancestor(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = self.get(id).and_then(|o| o.parent);
        let mut steps = 0;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.objects.len() {
                break;
            }
            current = self.get(parent).and_then(|o| o.parent);
        }
        false
    }

    /// 从当前父对象的域中移除（不销毁）
    fn detach_child(&mut self, child: ObjectId) {
        let Some(parent) = self.get(child).and_then(|o| o.parent) else {
            return;
        };
        if let Some(parent) = self.objects.get_mut(&parent) {
            for domain in &mut parent.domains {
                domain.objects.retain(|slot| *slot != Some(child));
            }
        }
        if let Some(object) = self.objects.get_mut(&child) {
            object.parent = None;
        }
    }

    /// 修改排序键，并要求父对象对应的域重新排序
    pub fn set_order(&mut self, id: ObjectId, order: i32) -> Result<(), ObjectError> {
        let object = self.object_mut(id)?;
        object.order = order;
        let parent = object.parent;

        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(&p)) {
            for domain in &mut parent.domains {
                if domain.objects.contains(&Some(id)) {
                    domain.needs_sort = true;
                }
            }
        }
        Ok(())
    }

    // ========== 生命周期 ==========

    /// 立即对对象的全部组件执行 setup（已 setup 的跳过）
    pub fn setup_object(&mut self, id: ObjectId, engine: &EngineContext) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        if object.disposed {
            return;
        }
        let mut components = std::mem::take(&mut object.components);
        {
            let mut cx = ComponentContext::new(id, self, engine);
            for component in components.iter_mut() {
                setup_component(component.as_mut(), &mut cx);
            }
        }
        self.reattach_components(id, components, engine);
    }

    /// 更新对象：按插入顺序更新每个活跃组件
    ///
    /// 已销毁或不活跃的对象直接跳过；组件在更新过程中销毁所属对象时，
    /// 其后的组件本帧不再更新。
    pub fn update_object(&mut self, id: ObjectId, engine: &EngineContext) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        if object.disposed || !object.active {
            return;
        }

        let mut components = std::mem::take(&mut object.components);
        {
            let mut cx = ComponentContext::new(id, self, engine);
            for component in components.iter_mut() {
                if cx.object().is_none_or(|o| o.disposed) {
                    break;
                }
                run_component(component.as_mut(), &mut cx);
            }
        }
        self.reattach_components(id, components, engine);

        if let Some(object) = self.objects.get_mut(&id) {
            object.clear_dirty();
        }
    }

    /// 把取出的组件放回对象；更新期间新增的组件排在后面
    fn reattach_components(
        &mut self,
        id: ObjectId,
        mut components: Vec<Box<dyn Component>>,
        engine: &EngineContext,
    ) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        components.append(&mut object.components);
        if object.disposed {
            self.dispose_components(id, &mut components, engine);
        }
        if let Some(object) = self.objects.get_mut(&id) {
            components.append(&mut object.components);
            object.components = components;
        }
    }

    fn dispose_components(
        &mut self,
        id: ObjectId,
        components: &mut [Box<dyn Component>],
        engine: &EngineContext,
    ) {
        let mut cx = ComponentContext::new(id, self, engine);
        for component in components.iter_mut() {
            if component.base().is_disposed() {
                continue;
            }
            trace!(object = %id, component = component.class_name(), "dispose component");
            component.dispose(&mut cx);
            component.base_mut().mark_disposed();
        }
    }

    /// 销毁对象及其全部子对象
    ///
    /// 组件立即释放；对象本身留在存储中，
    /// 由父容器（或世界根列表）在下一次更新时移除。
    pub fn dispose_object(&mut self, id: ObjectId, engine: &EngineContext) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        if object.disposed {
            return;
        }
        object.disposed = true;
        let children = object.children();
        let mut components = std::mem::take(&mut object.components);

        self.dispose_components(id, &mut components, engine);
        if let Some(object) = self.objects.get_mut(&id) {
            components.append(&mut object.components);
            object.components = components;
        }
        debug!(object = %id, children = children.len(), "dispose object");

        for child in children {
            self.dispose_object(child, engine);
        }
    }

    /// 销毁父对象某个域中的全部子对象
    pub fn dispose_domain(
        &mut self,
        parent: ObjectId,
        domain: &str,
        engine: &EngineContext,
    ) -> Result<usize, ObjectError> {
        let children: Vec<ObjectId> = match self.object_mut(parent)?.domain(domain) {
            Some(list) => list.live().collect(),
            None => return Ok(0),
        };
        for child in &children {
            self.dispose_object(*child, engine);
        }
        Ok(children.len())
    }

    /// 移除父对象各个域中已销毁的子对象及其全部后代
    ///
    /// 容器组件在更新时自行清理，这里供没有容器组件的父对象使用。
    /// 空槽位保持不变。
    ///
    /// # 返回
    /// 从存储中移除的对象数量
    pub fn prune_disposed(&mut self, parent: ObjectId) -> Result<usize, ObjectError> {
        let disposed: Vec<ObjectId> = self
            .get(parent)
            .ok_or(ObjectError::NotFound { id: parent })?
            .children()
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(|o| o.disposed))
            .collect();
        if disposed.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for child in &disposed {
            removed += self.remove_subtree(*child);
        }
        let object = self.object_mut(parent)?;
        for domain in &mut object.domains {
            domain
                .objects
                .retain(|slot| slot.is_none_or(|id| !disposed.contains(&id)));
        }
        debug!(parent = %parent, removed, "prune disposed children");
        Ok(removed)
    }

    /// 从存储中移除对象及其全部后代
    ///
    /// # 返回
    /// 被移除的对象数量
    pub fn remove_subtree(&mut self, id: ObjectId) -> usize {
        let Some(object) = self.objects.remove(&id) else {
            return 0;
        };
        let mut removed = 1;
        for child in object.children() {
            removed += self.remove_subtree(child);
        }
        removed
    }

    // ========== 派生值 ==========

    /// 原点：沿父链累加各祖先的 offset
    pub fn compute_origin(&self, id: ObjectId) -> Point {
        let mut origin = Point::default();
        let mut current = self.get(id).and_then(|o| o.parent);
        let mut steps = 0;
        while let Some(parent) = current.and_then(|p| self.get(p)) {
            origin = origin + parent.offset;
            steps += 1;
            if steps > self.objects.len() {
                break;
            }
            current = parent.parent;
        }
        origin
    }

    /// 最终 z 序：自身 z_index 加上父链继承的 z 序
    pub fn compute_z_index(&self, id: ObjectId) -> i32 {
        let mut z_index = 0;
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(object) = current.and_then(|c| self.get(c)) {
            z_index += object.z_index;
            steps += 1;
            if steps > self.objects.len() {
                break;
            }
            current = object.parent;
        }
        z_index
    }
}

fn setup_component(component: &mut dyn Component, cx: &mut ComponentContext<'_>) {
    let base = component.base();
    if base.is_setup() || base.is_disposed() {
        return;
    }
    trace!(object = %cx.owner, component = component.class_name(), "setup component");
    component.setup(cx);
    component.base_mut().mark_setup();
}

fn run_component(component: &mut dyn Component, cx: &mut ComponentContext<'_>) {
    let base = component.base();
    if !base.active || base.is_disposed() {
        return;
    }
    assert_eq!(
        base.owner(),
        Some(cx.owner),
        "组件 {} 未挂载到正在更新的对象 {} 上",
        component.class_name(),
        cx.owner
    );
    setup_component(component, cx);
    component.update(cx);
}

/// 世界：对象存储 + 根对象 + 引擎上下文
///
/// 宿主每帧调用一次 [`World::update`]。
pub struct World {
    store: ObjectStore,
    roots: Vec<ObjectId>,
    engine: EngineContext,
    frame: u64,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("objects", &self.store.len())
            .field("roots", &self.roots)
            .field("frame", &self.frame)
            .finish()
    }
}

impl World {
    /// 创建空世界
    pub fn new(engine: EngineContext) -> Self {
        Self {
            store: ObjectStore::new(),
            roots: Vec::new(),
            engine,
            frame: 0,
        }
    }

    pub(crate) fn from_parts(
        store: ObjectStore,
        roots: Vec<ObjectId>,
        engine: EngineContext,
        frame: u64,
    ) -> Self {
        Self {
            store,
            roots,
            engine,
            frame,
        }
    }

    pub fn engine(&self) -> &EngineContext {
        &self.engine
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    /// 根对象（按更新顺序）
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// 已执行的帧数
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// 创建对象并加入根列表
    pub fn create_root(&mut self, class: impl Into<String>) -> ObjectId {
        let id = self.store.create(class);
        self.roots.push(id);
        id
    }

    /// 把已有对象加入根列表
    pub fn add_root(&mut self, id: ObjectId) -> Result<(), ObjectError> {
        if !self.store.contains(id) {
            return Err(ObjectError::NotFound { id });
        }
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
        Ok(())
    }

    /// 推进一帧
    ///
    /// 已销毁的根对象在本次遍历中从根列表和存储中移除。
    pub fn update(&mut self) {
        self.frame += 1;
        let mut index = 0;
        while index < self.roots.len() {
            let id = self.roots[index];
            match self.store.get(id).map(|o| o.disposed) {
                None => {
                    self.roots.remove(index);
                    continue;
                }
                Some(true) => {
                    let removed = self.store.remove_subtree(id);
                    debug!(object = %id, removed, "remove disposed root");
                    self.roots.remove(index);
                    continue;
                }
                Some(false) => self.store.update_object(id, &self.engine),
            }
            index += 1;
        }
    }

    /// 设置可见性，并通过容器立即传递给子对象
    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> Result<(), ObjectError> {
        self.store.object_mut(id)?.set_visible(visible);
        container::propagate_visibility(&mut self.store, id, visible, &self.engine);
        Ok(())
    }

    /// 销毁对象
    pub fn dispose(&mut self, id: ObjectId) {
        self.store.dispose_object(id, &self.engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::component::ComponentBase;

    /// 记录调用次数的测试组件
    #[derive(Default)]
    struct Counter {
        base: ComponentBase,
        setups: Rc<Cell<u32>>,
        updates: Rc<Cell<u32>>,
        disposes: Rc<Cell<u32>>,
        dispose_owner_on_update: bool,
    }

    impl Component for Counter {
        fn class_name(&self) -> &'static str {
            "Counter"
        }
        fn base(&self) -> &ComponentBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }
        fn setup(&mut self, _cx: &mut ComponentContext<'_>) {
            self.setups.set(self.setups.get() + 1);
        }
        fn update(&mut self, cx: &mut ComponentContext<'_>) {
            self.updates.set(self.updates.get() + 1);
            if self.dispose_owner_on_update {
                cx.objects.dispose_object(cx.owner, cx.engine);
            }
        }
        fn dispose(&mut self, _cx: &mut ComponentContext<'_>) {
            self.disposes.set(self.disposes.get() + 1);
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn test_setup_runs_once_lazily() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("picture");
        let counter = Counter::default();
        let (setups, updates) = (counter.setups.clone(), counter.updates.clone());
        store.add_component(id, counter).unwrap();

        store.update_object(id, &engine);
        store.update_object(id, &engine);

        assert_eq!(setups.get(), 1);
        assert_eq!(updates.get(), 2);
    }

    #[test]
    fn test_eager_setup_is_not_repeated() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("picture");
        let counter = Counter::default();
        let setups = counter.setups.clone();
        store.add_component(id, counter).unwrap();

        store.setup_object(id, &engine);
        store.update_object(id, &engine);
        assert_eq!(setups.get(), 1);
    }

    #[test]
    fn test_disposed_object_stops_updating() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("picture");
        let counter = Counter::default();
        let (updates, disposes) = (counter.updates.clone(), counter.disposes.clone());
        store.add_component(id, counter).unwrap();

        store.update_object(id, &engine);
        store.dispose_object(id, &engine);
        store.dispose_object(id, &engine);
        store.update_object(id, &engine);

        assert_eq!(updates.get(), 1);
        assert_eq!(disposes.get(), 1);
    }

    #[test]
    fn test_self_dispose_skips_remaining_components() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let id = store.create("picture");

        let first = Counter {
            dispose_owner_on_update: true,
            ..Counter::default()
        };
        let second = Counter::default();
        let (first_disposes, second_updates, second_disposes) = (
            first.disposes.clone(),
            second.updates.clone(),
            second.disposes.clone(),
        );
        store.add_component(id, first).unwrap();
        store.add_component(id, second).unwrap();

        store.update_object(id, &engine);

        assert_eq!(second_updates.get(), 0);
        assert_eq!(first_disposes.get(), 1);
        assert_eq!(second_disposes.get(), 1);
        assert!(store.get(id).unwrap().disposed);
        assert_eq!(store.get(id).unwrap().component_count(), 2);
    }

    #[test]
    fn test_add_component_to_missing_object() {
        let mut store = ObjectStore::new();
        let result = store.add_component(ObjectId::new(42), Counter::default());
        assert!(matches!(result, Err(ObjectError::NotFound { .. })));
    }

    #[test]
    fn test_origin_and_z_index_follow_parent_chain() {
        let mut store = ObjectStore::new();
        let root = store.create("layout");
        let middle = store.create("layout");
        let leaf = store.create("picture");
        store.add_child(root, middle).unwrap();
        store.add_child(middle, leaf).unwrap();

        store.get_mut(root).unwrap().offset = Point::new(10.0, 5.0);
        store.get_mut(middle).unwrap().offset = Point::new(1.0, 2.0);
        store.get_mut(root).unwrap().z_index = 100;
        store.get_mut(middle).unwrap().z_index = 10;
        store.get_mut(leaf).unwrap().z_index = 1;

        assert_eq!(store.compute_origin(leaf), Point::new(11.0, 7.0));
        assert_eq!(store.compute_origin(root), Point::default());
        assert_eq!(store.compute_z_index(leaf), 111);
        assert_eq!(store.compute_z_index(root), 100);
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut store = ObjectStore::new();
        let a = store.create("layout");
        let b = store.create("layout");
        store.add_child(a, b).unwrap();

        assert!(matches!(
            store.add_child(b, a),
            Err(ObjectError::InvalidHierarchy { .. })
        ));
        assert!(matches!(
            store.add_child(a, a),
            Err(ObjectError::InvalidHierarchy { .. })
        ));
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut store = ObjectStore::new();
        let a = store.create("layout");
        let b = store.create("layout");
        let child = store.create("picture");
        store.add_child(a, child).unwrap();
        store.add_child_to_domain(b, child, "effects").unwrap();

        assert!(store.get(a).unwrap().sub_objects().is_empty());
        assert_eq!(
            store.get(b).unwrap().domain("effects").unwrap().objects,
            vec![Some(child)]
        );
        assert_eq!(store.get(child).unwrap().parent, Some(b));
    }

    #[test]
    fn test_with_component_mut_restores_components() {
        let mut store = ObjectStore::new();
        let id = store.create("picture");
        store.add_component(id, Counter::default()).unwrap();

        let class = store
            .with_component_mut::<Counter, _>(id, |counter, object| {
                object.opacity = 10.0;
                counter.class_name()
            })
            .unwrap();

        assert_eq!(class, "Counter");
        let object = store.get(id).unwrap();
        assert_eq!(object.component_count(), 1);
        assert_eq!(object.opacity, 10.0);
    }

    #[test]
    fn test_prune_disposed_without_container() {
        let engine = EngineContext::new();
        let mut store = ObjectStore::new();
        let parent = store.create("layout");
        let (a, b) = (store.create("picture"), store.create("picture"));
        let grandchild = store.create("picture");
        store.add_child(parent, a).unwrap();
        store.add_child(parent, b).unwrap();
        store.add_child(a, grandchild).unwrap();

        store.dispose_object(a, &engine);
        store.update_object(parent, &engine);
        assert_eq!(store.len(), 4);

        assert_eq!(store.prune_disposed(parent).unwrap(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(parent).unwrap().sub_objects(), &[Some(b)]);
        assert_eq!(store.prune_disposed(parent).unwrap(), 0);
        assert!(matches!(
            store.prune_disposed(ObjectId::new(99)),
            Err(ObjectError::NotFound { .. })
        ));
    }

    #[test]
    fn test_world_removes_disposed_roots() {
        let mut world = World::new(EngineContext::new());
        let keep = world.create_root("layout");
        let gone = world.create_root("layout");
        let child = world.store_mut().create("picture");
        world.store_mut().add_child(gone, child).unwrap();

        world.dispose(gone);
        assert!(world.store().get(child).unwrap().disposed);

        world.update();
        assert_eq!(world.roots(), &[keep]);
        assert!(!world.store().contains(gone));
        assert!(!world.store().contains(child));
        assert_eq!(world.frame(), 1);
    }
}
