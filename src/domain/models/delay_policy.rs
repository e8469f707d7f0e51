// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use rand::Rng;
use std::time::Duration;

/// 延迟策略
///
/// 运行时配置项，不随作业持久化。用于计算私信目标之间的随机等待时间，
/// 以及同一账号组内作业之间的固定等待时间。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    min_delay_ms: u64,
    max_delay_ms: u64,
    inter_job_delay_secs: u64,
}

impl DelayPolicy {
    /// 创建延迟策略
    ///
    /// 上下界颠倒时会自动交换，保证 `min <= max`
    pub fn new(min_delay_ms: u64, max_delay_ms: u64, inter_job_delay_secs: u64) -> Self {
        let (min_delay_ms, max_delay_ms) = if min_delay_ms <= max_delay_ms {
            (min_delay_ms, max_delay_ms)
        } else {
            (max_delay_ms, min_delay_ms)
        };
        Self {
            min_delay_ms,
            max_delay_ms,
            inter_job_delay_secs,
        }
    }

    /// 不做任何等待的策略
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn min_delay_ms(&self) -> u64 {
        self.min_delay_ms
    }

    pub fn max_delay_ms(&self) -> u64 {
        self.max_delay_ms
    }

    /// 在 `[min_delay_ms, max_delay_ms]` 区间内取一个随机延迟
    pub fn target_delay(&self) -> Duration {
        if self.min_delay_ms == self.max_delay_ms {
            return Duration::from_millis(self.min_delay_ms);
        }
        let ms = rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// 同一账号组内两个作业之间的等待时间
    pub fn inter_job_delay(&self) -> Duration {
        Duration::from_secs(self.inter_job_delay_secs)
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::new(5000, 10000, 0)
    }
}
