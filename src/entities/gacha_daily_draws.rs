use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 每日免费抽记录
/// 说明:
/// - last_draw_date: 最近一次免费抽的 UTC 日期 (YYYY-MM-DD)
/// - draw_count: 累计免费抽次数，仅供统计
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "gacha_daily_draws")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub last_draw_date: String,
    pub draw_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn drawn_on(&self, day_key: &str) -> bool {
        self.last_draw_date == day_key
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
