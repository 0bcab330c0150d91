//! Visual Novel Engine - 无界面宿主
//!
//! 读取配置，运行演示场景若干帧，存档后用新的引擎上下文恢复并比对。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use host_cli::{HostConfig, demo};
use tracing::{Level, error, info};

#[derive(Parser, Debug)]
#[command(name = "host-cli")]
#[command(about = "无界面宿主 - 驱动对象运行时并验证存档恢复")]
#[command(version)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 模拟的帧数（覆盖配置文件）
    #[arg(long)]
    frames: Option<u64>,

    /// 存档槽位（默认使用下一个可用槽位）
    #[arg(long)]
    slot: Option<u32>,

    /// 开启跳过模式
    #[arg(long)]
    skip: bool,

    /// 跳过时动画压缩到的帧数
    #[arg(long)]
    skip_time: Option<u32>,

    /// 输出 debug 日志
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// 命令行参数覆盖配置文件
    fn apply(&self, config: &mut HostConfig) {
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if self.skip {
            config.skip.enabled = true;
        }
        if let Some(skip_time) = self.skip_time {
            config.skip.skip_time = skip_time;
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
    }
}

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    // 日志级别来自配置，加载配置时订阅器尚未安装
    let mut config = HostConfig::load(&args.config);
    args.apply(&mut config);
    init_logging(config.level().unwrap_or(Level::INFO));

    if let Err(e) = config.validate() {
        error!(error = %e, "配置无效");
        return ExitCode::from(2);
    }

    match demo::run(&config, args.slot) {
        Ok(report) => {
            info!(
                frames = report.frames,
                slot = report.slot,
                path = %report.path.display(),
                objects = report.objects,
                restored = report.restored_objects,
                "存档恢复完成"
            );
            match report.divergence {
                None => {
                    info!("恢复结果与存档一致");
                    ExitCode::SUCCESS
                }
                Some(d) => {
                    error!(path = %d.path, saved = %d.saved, restored = %d.restored, "恢复结果与存档不一致");
                    ExitCode::from(1)
                }
            }
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
