//! # BundleStore 模块
//!
//! 数据包存档文件管理，负责读写和 slot 管理。
//!
//! ## 文件布局
//!
//! ```text
//! saves/
//! ├── slot_001.json
//! ├── slot_002.json
//! └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use vn_objects::{CodecError, WorldBundle};

/// 最大存档槽位数
pub const MAX_SLOTS: u32 = 99;

/// 存档错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("存档 IO 错误 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("存档不存在: slot {slot}")]
    NotFound { slot: u32 },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// 数据包存档管理器
#[derive(Debug, Clone)]
pub struct BundleStore {
    saves_dir: PathBuf,
}

impl BundleStore {
    pub fn new(saves_dir: impl AsRef<Path>) -> Self {
        Self {
            saves_dir: saves_dir.as_ref().to_path_buf(),
        }
    }

    pub fn saves_dir(&self) -> &Path {
        &self.saves_dir
    }

    /// 确保存档目录存在
    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.saves_dir).map_err(|e| StoreError::io(&self.saves_dir, e))
    }

    /// 存档文件路径
    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.saves_dir.join(format!("slot_{slot:03}.json"))
    }

    /// 写入存档，返回文件路径
    pub fn save(&self, slot: u32, bundle: &WorldBundle) -> Result<PathBuf, StoreError> {
        self.ensure_dir()?;

        let path = self.slot_path(slot);
        let json = bundle.to_json()?;
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))?;

        info!(slot, objects = bundle.object_count(), path = %path.display(), "存档保存成功");
        Ok(path)
    }

    /// 读取存档（包含版本检查）
    pub fn load(&self, slot: u32) -> Result<WorldBundle, StoreError> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(StoreError::NotFound { slot });
        }

        let json = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let bundle = WorldBundle::from_json(&json)?;

        info!(slot, objects = bundle.object_count(), "存档读取成功");
        Ok(bundle)
    }

    /// 删除存档；不存在时什么也不做
    pub fn delete(&self, slot: u32) -> Result<(), StoreError> {
        let path = self.slot_path(slot);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
            info!(slot, "存档删除成功");
        }
        Ok(())
    }

    pub fn exists(&self, slot: u32) -> bool {
        self.slot_path(slot).exists()
    }

    /// 已有存档的槽位（升序）
    pub fn list_slots(&self) -> Vec<u32> {
        let Ok(entries) = fs::read_dir(&self.saves_dir) else {
            return Vec::new();
        };

        let mut slots: Vec<u32> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                // 解析 slot_XXX.json
                name.strip_prefix("slot_")?
                    .strip_suffix(".json")?
                    .parse()
                    .ok()
            })
            .filter(|slot| (1..=MAX_SLOTS).contains(slot))
            .collect();
        slots.sort_unstable();
        slots
    }

    /// 下一个可用的槽位
    pub fn next_available_slot(&self) -> Option<u32> {
        (1..=MAX_SLOTS).find(|slot| !self.exists(*slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bundle(frame: u64) -> WorldBundle {
        WorldBundle::new(frame, Vec::new())
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path().join("saves"));

        let path = store.save(1, &sample_bundle(30)).unwrap();
        assert!(path.ends_with("slot_001.json"));
        assert!(store.exists(1));

        let loaded = store.load(1).unwrap();
        assert_eq!(loaded, sample_bundle(30));
    }

    #[test]
    fn test_load_missing_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());

        let err = store.load(7).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { slot: 7 }));
    }

    #[test]
    fn test_incompatible_version_is_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        let mut bundle = sample_bundle(0);
        bundle.version.major = 9;
        store.save(2, &bundle).unwrap();

        let err = store.load(2).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"数据包版本 9.0 与当前版本 1.0 不兼容");
    }

    #[test]
    fn test_list_and_next_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = BundleStore::new(dir.path());
        assert!(store.list_slots().is_empty());
        assert_eq!(store.next_available_slot(), Some(1));

        for slot in [3, 1, 2] {
            store.save(slot, &sample_bundle(0)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("slot_abc.json"), "{}").unwrap();

        assert_eq!(store.list_slots(), vec![1, 2, 3]);
        assert_eq!(store.next_available_slot(), Some(4));

        store.delete(2).unwrap();
        store.delete(2).unwrap();
        assert_eq!(store.list_slots(), vec![1, 3]);
        assert_eq!(store.next_available_slot(), Some(2));
    }
}
