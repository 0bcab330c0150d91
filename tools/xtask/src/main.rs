//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-objects`: 运行 vn-objects 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `bundle-check`: 检查存档数据包（格式、版本、能否恢复）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vn_objects::{CodecError, EngineContext, ObjectCodec, WorldBundle};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,

    /// 运行 vn-objects 覆盖率报告
    CovObjects,

    /// 运行 workspace 覆盖率报告
    CovWorkspace,

    /// 检查存档数据包
    ///
    /// 不带参数：检查 saves/ 下所有 .json 文件；
    /// 带路径参数：检查指定文件或目录。
    BundleCheck {
        /// 文件或目录
        path: Option<PathBuf>,
    },
}

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
        anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Commands::CheckAll => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        Commands::CovObjects => {
            ensure_cargo_llvm_cov_available(&sh)?;
            cmd!(sh, "cargo llvm-cov -p vn-objects --all-features --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::CovWorkspace => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除 xtask，以免稀释信号
            cmd!(
                sh,
                "cargo llvm-cov --workspace --exclude xtask --all-features --html"
            )
            .run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::BundleCheck { path } => bundle_check(path.as_deref())?,
    }

    Ok(())
}

//=============================================================================
// bundle-check 命令实现
//=============================================================================

/// 默认存档目录（相对于 workspace root）
const DEFAULT_SAVES_DIR: &str = "saves";

/// 单个文件的检查结果
enum Outcome {
    Ok(usize),
    /// 数据包完好，但引用了存档之外的资源（文档等）
    Warn(String),
    Error(String),
}

fn bundle_check(path: Option<&Path>) -> anyhow::Result<()> {
    let root = path.unwrap_or(Path::new(DEFAULT_SAVES_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定存档路径",
            root.display()
        );
    }

    let files = collect_bundle_files(root)?;
    if files.is_empty() {
        eprintln!("未找到数据包文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个数据包...\n", files.len());

    let codec = ObjectCodec::default();
    let (mut errors, mut warnings) = (0, 0);
    for file in &files {
        match check_bundle_file(file, &codec) {
            Outcome::Ok(objects) => eprintln!("[OK]    {}: {objects} 个对象", file.display()),
            Outcome::Warn(message) => {
                warnings += 1;
                eprintln!("[WARN]  {}: {message}", file.display());
            }
            Outcome::Error(message) => {
                errors += 1;
                eprintln!("[ERROR] {}: {message}", file.display());
            }
        }
    }

    eprintln!("─────────────────────────────────────────────────────");
    if errors > 0 {
        eprintln!("❌ {errors} 个错误, {warnings} 个警告");
        anyhow::bail!("数据包检查发现错误");
    } else if warnings > 0 {
        eprintln!("⚠️  0 个错误, {warnings} 个警告");
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
    Ok(())
}

/// 收集 .json 文件（单个文件直接返回）
fn collect_bundle_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn check_bundle_file(file: &Path, codec: &ObjectCodec) -> Outcome {
    let json = match std::fs::read_to_string(file) {
        Ok(json) => json,
        Err(e) => return Outcome::Error(format!("无法读取文件 - {e}")),
    };

    let bundle = match WorldBundle::from_json(&json) {
        Ok(bundle) => bundle,
        Err(e) => return Outcome::Error(e.to_string()),
    };

    // 文档属于资源，不在存档中；空引擎上下文下解析不到只算警告
    match codec.restore_world(&bundle, &EngineContext::new()) {
        Ok(world) => Outcome::Ok(world.store().len()),
        Err(CodecError::UnresolvedReference { reference })
            if reference.starts_with("document:") =>
        {
            Outcome::Warn(format!("引用了外部文档 {reference}"))
        }
        Err(e) => Outcome::Error(e.to_string()),
    }
}
