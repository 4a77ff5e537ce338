use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::gacha::PityState;

/// 保底计数实体（每个用户一行，首次抽取时创建）
/// 说明:
/// - counter50: 距上次 4 星及以上的抽数，达到 50 触发软保底
/// - counter100: 距上次 5 星的抽数，达到 100 触发硬保底
/// - total_draws: 累计抽取次数，持锁递增，作为历史记录的顺序号
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "gacha_pity_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub counter50: i32,
    pub counter100: i32,
    pub total_draws: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn state(&self) -> PityState {
        PityState::new(self.counter50, self.counter100)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
