//! # Host CLI
//!
//! 无界面宿主：不渲染，只驱动对象运行时并负责配置、日志与存档。
//!
//! ## 模块结构
//!
//! - [`config`]：配置文件与默认值
//! - [`bundle_store`]：`slot_NNN.json` 存档管理
//! - [`demo`]：演示场景、逐帧驱动与存档恢复比对

pub mod bundle_store;
pub mod config;
pub mod demo;

pub use bundle_store::{BundleStore, MAX_SLOTS, StoreError};
pub use config::{ConfigError, HostConfig, SkipConfig};
pub use demo::{DemoReport, DemoScene, Divergence};
