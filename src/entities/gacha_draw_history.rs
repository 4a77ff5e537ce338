use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    /// 每日免费抽
    #[sea_orm(string_value = "daily")]
    Daily,
    /// 消耗抽奖券
    #[sea_orm(string_value = "ticket")]
    Ticket,
}

/// 抽取历史（只追加，不修改）
/// 说明:
/// - badge_code / rarity 为抽取时的快照，目录后续调整不影响历史
/// - pity_count_at_draw: 本次在 100 抽周期中的序号（抽取前 counter100 + 1）
/// - draw_seq: 该用户的第几次抽取，按提交顺序递增，历史按它倒序
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "gacha_draw_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: i64,
    pub badge_code: String,
    pub rarity: i16,
    pub draw_kind: DrawKind,
    pub pity_count_at_draw: i32,
    pub draw_seq: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
