//! 徽章扭蛋（gacha）核心规则：稀有度抽取、保底计数、徽章选择与每日日期键。
//!
//! 这里只有纯函数与静态目录，数据库事务见 `services::gacha_service`。

pub mod catalog;
pub mod day;
pub mod picker;
pub mod rarity;

pub use catalog::{BadgeCatalog, BadgeDefinition};
pub use day::day_key;
pub use picker::pick_badge;
pub use rarity::{
    HARD_PITY_THRESHOLD, PityState, RATE_BANDS, RarityTier, RateBand,
    SOFT_PITY_LEGENDARY_PERCENT, SOFT_PITY_THRESHOLD, select_rarity, tier_for_roll,
};
