//! 稀有度抽取与保底计数规则
//!
//! 抽取顺序:
//! 1. counter100 >= 100 -> 必出 5 星（硬保底）
//! 2. counter50 >= 50 -> 至少 4 星，其中 10% 为 5 星（软保底）
//! 3. 否则在 [0, 100) 上掷一次，按累计区间（从高稀有度开始）匹配
//!
//! 保底判断始终使用本次抽取 *之前* 的计数。

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 硬保底阈值（第 100 抽必出 5 星）
pub const HARD_PITY_THRESHOLD: i32 = 100;
/// 软保底阈值（第 50 抽至少 4 星）
pub const SOFT_PITY_THRESHOLD: i32 = 50;
/// 软保底触发时出 5 星的概率（百分比）
pub const SOFT_PITY_LEGENDARY_PERCENT: f64 = 10.0;

/// 稀有度等级 1-5，5 为最稀有
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RarityTier {
    Common = 1,
    Uncommon = 2,
    Rare = 3,
    Epic = 4,
    Legendary = 5,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("rarity tier must be between 1 and 5, got {0}")]
pub struct InvalidRarity(pub u8);

impl RarityTier {
    pub const ALL: [RarityTier; 5] = [
        RarityTier::Common,
        RarityTier::Uncommon,
        RarityTier::Rare,
        RarityTier::Epic,
        RarityTier::Legendary,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn as_i16(self) -> i16 {
        i16::from(self.value())
    }
}

impl TryFrom<u8> for RarityTier {
    type Error = InvalidRarity;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RarityTier::Common),
            2 => Ok(RarityTier::Uncommon),
            3 => Ok(RarityTier::Rare),
            4 => Ok(RarityTier::Epic),
            5 => Ok(RarityTier::Legendary),
            other => Err(InvalidRarity(other)),
        }
    }
}

impl From<RarityTier> for u8 {
    fn from(tier: RarityTier) -> Self {
        tier.value()
    }
}

/// 概率区间（宽度，单位: 百分比）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBand {
    pub tier: RarityTier,
    pub percent: f64,
}

/// 普通抽取的概率表，按稀有度从高到低排列，宽度之和必须为 100。
/// 修改常量后请确认 `rate_bands_cover_exactly_one_hundred` 测试仍然通过。
pub const RATE_BANDS: [RateBand; 5] = [
    RateBand {
        tier: RarityTier::Legendary,
        percent: 0.5,
    },
    RateBand {
        tier: RarityTier::Epic,
        percent: 4.5,
    },
    RateBand {
        tier: RarityTier::Rare,
        percent: 15.0,
    },
    RateBand {
        tier: RarityTier::Uncommon,
        percent: 35.0,
    },
    RateBand {
        tier: RarityTier::Common,
        percent: 45.0,
    },
];

/// 在 [0, 100) 上均匀掷一次
pub fn roll_percent<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.0..100.0)
}

/// 将掷出的值映射到稀有度（第一个命中的区间生效）
pub fn tier_for_roll(roll: f64) -> RarityTier {
    let mut upper = 0.0;
    for band in RATE_BANDS.iter() {
        upper += band.percent;
        if roll < upper {
            return band.tier;
        }
    }
    // roll 来自 [0, 100)，不会走到这里
    RarityTier::Common
}

/// 根据抽取前的保底计数决定本次稀有度
pub fn select_rarity<R: Rng + ?Sized>(counter50: i32, counter100: i32, rng: &mut R) -> RarityTier {
    if counter100 >= HARD_PITY_THRESHOLD {
        return RarityTier::Legendary;
    }
    if counter50 >= SOFT_PITY_THRESHOLD {
        return if roll_percent(rng) < SOFT_PITY_LEGENDARY_PERCENT {
            RarityTier::Legendary
        } else {
            RarityTier::Epic
        };
    }
    tier_for_roll(roll_percent(rng))
}

/// 用户保底计数快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PityState {
    pub counter50: i32,
    pub counter100: i32,
}

impl PityState {
    pub fn new(counter50: i32, counter100: i32) -> Self {
        Self {
            counter50,
            counter100,
        }
    }

    /// 本次抽取在当前 100 抽周期内的序号（从 1 开始）
    pub fn pity_count_at_draw(&self) -> i32 {
        self.counter100 + 1
    }

    /// 抽到 `tier` 之后的计数:
    /// - 5 星: 两个计数清零
    /// - 4 星: counter50 清零，counter100 + 1
    /// - 3 星及以下: 两个计数各 + 1
    pub fn after_draw(&self, tier: RarityTier) -> PityState {
        match tier {
            RarityTier::Legendary => PityState::new(0, 0),
            RarityTier::Epic => PityState::new(0, self.counter100 + 1),
            _ => PityState::new(self.counter50 + 1, self.counter100 + 1),
        }
    }
}
