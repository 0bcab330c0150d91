//! 恢复上下文。

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::context::{Document, EngineContext};
use crate::error::CodecError;
use crate::object::ObjectId;

/// 恢复上下文
///
/// 在一次恢复过程中传给每个恢复钩子，按字符串键登记/查找共享对象，
/// 用 id 代替直接引用来解析跨对象的关联。
pub struct RestoreContext<'a> {
    engine: &'a EngineContext,
    owner: ObjectId,
    entries: HashMap<String, Rc<dyn Any>>,
    id_map: HashMap<u64, ObjectId>,
}

impl std::fmt::Debug for RestoreContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("RestoreContext")
            .field("owner", &self.owner)
            .field("entries", &keys)
            .field("objects", &self.id_map.len())
            .finish()
    }
}

impl<'a> RestoreContext<'a> {
    pub fn new(engine: &'a EngineContext) -> Self {
        Self {
            engine,
            owner: ObjectId::default(),
            entries: HashMap::new(),
            id_map: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &'a EngineContext {
        self.engine
    }

    /// 当前正在恢复的对象
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: ObjectId) {
        self.owner = owner;
    }

    /// 登记共享对象，同键覆盖
    pub fn register<T: Any>(&mut self, key: impl Into<String>, value: Rc<T>) {
        self.entries.insert(key.into(), value);
    }

    /// 按键查找；类型不符时返回 `None`
    pub fn get<T: Any>(&self, key: &str) -> Option<Rc<T>> {
        self.entries.get(key)?.clone().downcast::<T>().ok()
    }

    /// 按键查找，找不到视为数据完整性错误
    pub fn resolve<T: Any>(&self, key: &str) -> Result<Rc<T>, CodecError> {
        self.get(key)
            .ok_or_else(|| CodecError::UnresolvedReference {
                reference: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 按 uid 解析文档
    ///
    /// 先查上下文，再查文档管理器；从文档管理器找到的文档会登记到上下文中，
    /// 同一次恢复里的其它对象拿到的是同一份。
    pub fn resolve_document(&mut self, uid: &str) -> Result<Rc<Document>, CodecError> {
        let key = format!("document:{uid}");
        if let Some(document) = self.get::<Document>(&key) {
            return Ok(document);
        }
        let document = self.engine.records.document(uid).ok_or_else(|| {
            CodecError::UnresolvedReference {
                reference: key.clone(),
            }
        })?;
        self.register(key, document.clone());
        Ok(document)
    }

    /// 数据包中的对象 id 在恢复后的 id
    pub fn object_id(&self, saved: u64) -> Option<ObjectId> {
        self.id_map.get(&saved).copied()
    }

    /// 记录 id 映射；同一个保存 id 出现两次时返回 `false`
    pub(crate) fn map_id(&mut self, saved: u64, id: ObjectId) -> bool {
        self.id_map.insert(saved, id).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_lookup() {
        let engine = EngineContext::new();
        let mut cx = RestoreContext::new(&engine);
        cx.register("answer", Rc::new(42_u32));

        assert_eq!(*cx.resolve::<u32>("answer").unwrap(), 42);
        assert!(cx.get::<String>("answer").is_none());
        assert!(matches!(
            cx.resolve::<u32>("missing"),
            Err(CodecError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_document_resolution_registers_in_context() {
        let engine = EngineContext::new();
        engine
            .records
            .register(Document::new("ch03", "第三章", Vec::new()));
        let mut cx = RestoreContext::new(&engine);

        let first = cx.resolve_document("ch03").unwrap();
        assert!(cx.contains("document:ch03"));
        let second = cx.resolve_document("ch03").unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        let err = cx.resolve_document("ch99").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"无法解析的引用 'document:ch99'");
    }
}
