//! リクエスト間隔の制御
//!
//! 照会先への負荷と検知を避けるため、プレート間・バッチ間に待機を入れる。
//! 一定バッチごとに長い休止を挟む。

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Delay, PacingConfig};
use crate::traits::Pacing;

/// 設定に従って待機時間を決める標準の [`Pacing`] 実装
pub struct PacingPolicy {
    config: PacingConfig,
    rng: Mutex<StdRng>,
}

impl PacingPolicy {
    pub fn new(config: PacingConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    /// 待機なし
    pub fn immediate() -> Self {
        Self::new(PacingConfig::immediate())
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    fn sample(&self, delay: Delay) -> Duration {
        match delay {
            Delay::Fixed(duration) => duration,
            Delay::Uniform { min, max } => self.uniform(min, max),
            Delay::Jitter { base, jitter } => {
                self.uniform(base.saturating_sub(jitter), base.saturating_add(jitter))
            }
        }
    }

    fn uniform(&self, min: Duration, max: Duration) -> Duration {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        if low == high {
            return low;
        }

        let millis = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            rng.gen_range(low.as_millis()..=high.as_millis())
        };
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}

impl Pacing for PacingPolicy {
    fn inter_plate_delay(&self) -> Duration {
        self.sample(self.config.inter_plate)
    }

    fn inter_batch_delay(&self) -> Duration {
        self.sample(self.config.inter_batch)
    }

    fn human_pause(&self) -> Duration {
        self.sample(self.config.human_pause)
    }

    fn long_cooldown_due(&self, batch_index: usize, total_batches: usize) -> bool {
        let every = self.config.long_cooldown_every;
        let completed = batch_index + 1;
        every > 0 && completed % every == 0 && completed < total_batches
    }

    fn long_cooldown(&self) -> Duration {
        self.config.long_cooldown
    }
}
