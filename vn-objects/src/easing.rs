//! # Easing 模块
//!
//! 缓动函数库与逐帧插值器。
//!
//! - [`EasingFunction`]：把 0.0 - 1.0 的时间进度映射为插值进度
//! - [`Easing`]：以帧为单位推进的插值状态机，所有动画组件共用

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// 缓动函数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
    /// 线性（匀速）
    #[default]
    Linear,
    /// 缓入（先慢后快）
    EaseIn,
    /// 缓出（先快后慢）
    EaseOut,
    /// 缓入缓出（两头慢中间快）
    EaseInOut,
    /// 二次缓入
    EaseInQuad,
    /// 二次缓出
    EaseOutQuad,
    /// 二次缓入缓出
    EaseInOutQuad,
    /// 三次缓入
    EaseInCubic,
    /// 三次缓出
    EaseOutCubic,
    /// 三次缓入缓出
    EaseInOutCubic,
    /// 四次缓入
    EaseInQuart,
    /// 四次缓出
    EaseOutQuart,
    /// 四次缓入缓出
    EaseInOutQuart,
    /// 正弦缓入
    EaseInSine,
    /// 正弦缓出
    EaseOutSine,
    /// 正弦缓入缓出
    EaseInOutSine,
    /// 指数缓入
    EaseInExpo,
    /// 指数缓出
    EaseOutExpo,
    /// 圆弧缓入
    EaseInCirc,
    /// 圆弧缓出
    EaseOutCirc,
    /// 回退缓入（先反向再前进）
    EaseInBack,
    /// 回退缓出（冲过头再回来）
    EaseOutBack,
    /// 弹性缓出
    EaseOutElastic,
    /// 弹跳缓入
    EaseInBounce,
    /// 弹跳缓出
    EaseOutBounce,
}

impl EasingFunction {
    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)
    ///
    /// # 返回
    /// - 缓动后的进度值（回退/弹性曲线会短暂越过 0.0 - 1.0）
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseIn | EasingFunction::EaseInCubic => t * t * t,
            EasingFunction::EaseOut | EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOut | EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EasingFunction::EaseInQuad => t * t,
            EasingFunction::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasingFunction::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasingFunction::EaseInQuart => t.powi(4),
            EasingFunction::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            EasingFunction::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            EasingFunction::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            EasingFunction::EaseOutSine => (t * PI / 2.0).sin(),
            EasingFunction::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            EasingFunction::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * t - 10.0)
                }
            }
            EasingFunction::EaseOutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * t)
                }
            }
            EasingFunction::EaseInCirc => 1.0 - (1.0 - t * t).sqrt(),
            EasingFunction::EaseOutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            EasingFunction::EaseInBack => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                c3 * t * t * t - c1 * t * t
            }
            EasingFunction::EaseOutBack => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
            }
            EasingFunction::EaseOutElastic => ease_out_elastic(t),
            EasingFunction::EaseInBounce => 1.0 - ease_out_bounce(1.0 - t),
            EasingFunction::EaseOutBounce => ease_out_bounce(t),
        }
    }
}

/// 弹性缓出
fn ease_out_elastic(t: f32) -> f32 {
    if t == 0.0 {
        0.0
    } else if t == 1.0 {
        1.0
    } else {
        let c4 = (2.0 * PI) / 3.0;
        2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
    }
}

/// 弹跳缓出
fn ease_out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;

    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

/// 逐帧插值器
///
/// 一次运行记录起点与增量，每次 `update_*` 推进一帧并重算当前值。
/// 标量（`value`）与二维（`x`/`y`）两种输出共享同一条时间轴。
///
/// 不变量：`is_running() == (time < duration)`；运行结束的那一帧
/// 输出精确等于 `start + delta`，不受曲线浮点误差影响。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Easing {
    /// 插值曲线
    pub function: EasingFunction,
    /// 已经过的帧数
    pub time: u32,
    /// 总帧数
    pub duration: u32,
    /// 标量起点
    pub start_value: f32,
    /// 标量增量
    pub delta: f32,
    /// 标量当前值
    pub value: f32,
    pub start_x: f32,
    pub start_y: f32,
    pub delta_x: f32,
    pub delta_y: f32,
    pub x: f32,
    pub y: f32,
    /// 本次运行是否已应用过跳过策略
    skipped: bool,
}

impl Easing {
    /// 创建空闲的插值器
    pub fn new(function: EasingFunction) -> Self {
        Self {
            function,
            ..Self::default()
        }
    }

    /// 是否仍在运行
    pub fn is_running(&self) -> bool {
        self.time < self.duration
    }

    /// 本次运行是否已被跳过策略处理
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// 当前插值进度（已应用曲线）
    pub fn progress(&self) -> f32 {
        if self.duration == 0 {
            1.0
        } else {
            self.function.apply(self.time as f32 / self.duration as f32)
        }
    }

    /// 开始标量插值
    ///
    /// `duration == 0` 时立即结束，`value` 直接为终值。
    pub fn start_value(&mut self, value: f32, delta: f32, duration: u32) {
        self.start_value = value;
        self.delta = delta;
        self.value = value;
        self.begin(duration);
    }

    /// 开始二维插值
    pub fn start_position(&mut self, x: f32, y: f32, delta_x: f32, delta_y: f32, duration: u32) {
        self.start_x = x;
        self.start_y = y;
        self.delta_x = delta_x;
        self.delta_y = delta_y;
        self.x = x;
        self.y = y;
        self.begin(duration);
    }

    fn begin(&mut self, duration: u32) {
        self.time = 0;
        self.duration = duration;
        self.skipped = false;
        if duration == 0 {
            self.snap_to_end();
        }
    }

    /// 推进一帧并重算标量值
    pub fn update_value(&mut self) {
        self.advance();
        if self.is_running() {
            self.value = self.start_value + self.delta * self.progress();
        } else {
            self.value = self.start_value + self.delta;
        }
    }

    /// 推进一帧并重算二维值
    pub fn update_position(&mut self) {
        self.advance();
        if self.is_running() {
            let progress = self.progress();
            self.x = self.start_x + self.delta_x * progress;
            self.y = self.start_y + self.delta_y * progress;
        } else {
            self.x = self.start_x + self.delta_x;
            self.y = self.start_y + self.delta_y;
        }
    }

    fn advance(&mut self) {
        if self.time < self.duration {
            self.time += 1;
        }
    }

    /// 应用跳过策略
    ///
    /// - `skip_time == 0`：立即结束，输出为终值
    /// - 否则把剩余部分压缩为 `skip_time` 帧，并从 `time = 0` 重新播放
    ///
    /// 每次运行只生效一次。
    pub fn skip(&mut self, skip_time: u32) {
        if !self.is_running() || self.skipped {
            return;
        }
        self.skipped = true;

        if skip_time == 0 {
            self.time = self.duration;
            self.snap_to_end();
        } else if skip_time < self.duration {
            self.duration = skip_time;
            self.time = 0;
        }
    }

    fn snap_to_end(&mut self) {
        self.value = self.start_value + self.delta;
        self.x = self.start_x + self.delta_x;
        self.y = self.start_y + self.delta_y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(0.5), 0.5);
        assert_eq!(easing.apply(1.0), 1.0);
    }

    #[test]
    fn test_curves_hit_endpoints() {
        let all = [
            EasingFunction::EaseInOut,
            EasingFunction::EaseInQuart,
            EasingFunction::EaseOutQuart,
            EasingFunction::EaseInOutQuart,
            EasingFunction::EaseInExpo,
            EasingFunction::EaseOutExpo,
            EasingFunction::EaseInCirc,
            EasingFunction::EaseOutCirc,
            EasingFunction::EaseInBack,
            EasingFunction::EaseOutBack,
            EasingFunction::EaseInBounce,
            EasingFunction::EaseOutBounce,
        ];
        for f in all {
            assert!(f.apply(0.0).abs() < 0.001, "{f:?} at 0");
            assert!((f.apply(1.0) - 1.0).abs() < 0.001, "{f:?} at 1");
        }
    }

    #[test]
    fn test_clamp() {
        let easing = EasingFunction::Linear;
        assert_eq!(easing.apply(-0.5), 0.0);
        assert_eq!(easing.apply(1.5), 1.0);
    }

    #[test]
    fn test_idle_at_construction() {
        let easing = Easing::new(EasingFunction::Linear);
        assert!(!easing.is_running());
        assert_eq!(easing.value, 0.0);
    }

    #[test]
    fn test_completion_is_exact() {
        let mut easing = Easing::new(EasingFunction::EaseInOutSine);
        easing.start_value(0.1, 0.7, 7);

        for _ in 0..6 {
            easing.update_value();
            assert!(easing.is_running());
        }
        easing.update_value();

        assert!(!easing.is_running());
        assert_eq!(easing.value, 0.1 + 0.7);
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let mut easing = Easing::new(EasingFunction::Linear);
        easing.start_value(10.0, 5.0, 0);
        assert!(!easing.is_running());
        assert_eq!(easing.value, 15.0);
    }

    #[test]
    fn test_position_interpolation() {
        let mut easing = Easing::new(EasingFunction::Linear);
        easing.start_position(0.0, 10.0, 4.0, -10.0, 4);

        easing.update_position();
        easing.update_position();
        assert_eq!(easing.x, 2.0);
        assert_eq!(easing.y, 5.0);

        easing.update_position();
        easing.update_position();
        assert!(!easing.is_running());
        assert_eq!(easing.x, 4.0);
        assert_eq!(easing.y, 0.0);
    }

    #[test]
    fn test_skip_to_end() {
        let mut easing = Easing::new(EasingFunction::Linear);
        easing.start_value(0.0, 100.0, 30);
        easing.update_value();
        easing.update_value();

        easing.skip(0);

        assert!(!easing.is_running());
        assert_eq!(easing.value, 100.0);
    }

    #[test]
    fn test_skip_restarts_with_shorter_duration() {
        let mut easing = Easing::new(EasingFunction::Linear);
        easing.start_value(0.0, 100.0, 30);
        for _ in 0..20 {
            easing.update_value();
        }

        easing.skip(5);
        assert_eq!(easing.duration, 5);
        assert_eq!(easing.time, 0);

        // 同一次运行内再次跳过无效
        easing.skip(2);
        assert_eq!(easing.duration, 5);

        for _ in 0..5 {
            easing.update_value();
        }
        assert!(!easing.is_running());
        assert_eq!(easing.value, 100.0);
    }

    #[test]
    fn test_restart_clears_skip_flag() {
        let mut easing = Easing::new(EasingFunction::Linear);
        easing.start_value(0.0, 1.0, 10);
        easing.skip(3);
        assert!(easing.is_skipped());

        easing.start_value(1.0, -1.0, 10);
        assert!(!easing.is_skipped());
        assert_eq!(easing.duration, 10);
    }
}
