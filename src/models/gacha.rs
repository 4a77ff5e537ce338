use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    DrawKind, draw_history_entity as history_entity, pity_counter_entity as pity_entity,
};
use crate::gacha::{BadgeDefinition, PityState, RateBand};

/// 抽奖券余额响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketBalanceResponse {
    /// 当前可用抽奖券数量
    pub count: i64,
}

/// 每日免费抽状态
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyDrawStatusResponse {
    /// 今天是否还能免费抽
    pub eligible: bool,
    /// 最近一次免费抽的日期 (UTC, YYYY-MM-DD)，从未抽过为 null
    pub last_draw_day: Option<String>,
    /// 服务器判定的今天 (UTC)
    pub today: String,
}

/// 保底计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PityCountersResponse {
    /// 距上次 4 星及以上的抽数
    pub counter50: i32,
    /// 距上次 5 星的抽数
    pub counter100: i32,
}

impl From<PityState> for PityCountersResponse {
    fn from(s: PityState) -> Self {
        PityCountersResponse {
            counter50: s.counter50,
            counter100: s.counter100,
        }
    }
}

impl From<pity_entity::Model> for PityCountersResponse {
    fn from(m: pity_entity::Model) -> Self {
        m.state().into()
    }
}

/// 抽取历史查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawHistoryQuery {
    /// 返回条数 (默认 20，最大 100)
    pub limit: Option<u64>,
}

/// 抽取历史记录
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawHistoryEntryResponse {
    pub id: Uuid,
    pub badge_code: String,
    /// 稀有度 1-5
    pub rarity: i16,
    pub draw_kind: DrawKind,
    /// 本次在 100 抽周期中的序号
    pub pity_count_at_draw: i32,
    /// 该用户的第几次抽取
    pub draw_seq: i64,
    pub created_at: DateTime<Utc>,
}

impl From<history_entity::Model> for DrawHistoryEntryResponse {
    fn from(m: history_entity::Model) -> Self {
        DrawHistoryEntryResponse {
            id: m.id,
            badge_code: m.badge_code,
            rarity: m.rarity,
            draw_kind: m.draw_kind,
            pity_count_at_draw: m.pity_count_at_draw,
            draw_seq: m.draw_seq,
            created_at: m.created_at,
        }
    }
}

/// 徽章展示信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BadgeResponse {
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// 稀有度 1-5
    pub rarity: u8,
    pub category: String,
}

impl From<&BadgeDefinition> for BadgeResponse {
    fn from(b: &BadgeDefinition) -> Self {
        BadgeResponse {
            code: b.code.clone(),
            name: b.name.clone(),
            description: b.description.clone(),
            icon: b.icon.clone(),
            rarity: b.rarity.value(),
            category: b.category.clone(),
        }
    }
}

/// 抽取请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DrawRequest {
    /// daily = 每日免费抽, ticket = 消耗 1 张券
    pub kind: DrawKind,
}

/// 抽取结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    /// 抽到的徽章
    pub badge: BadgeResponse,
    /// 是否为新获得（已拥有则为 false，不会重复发放）
    pub is_new: bool,
    /// 抽取后的保底计数
    pub pity: PityCountersResponse,
}

/// 概率表中的一档
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RateBandResponse {
    pub rarity: u8,
    /// 百分比
    pub percent: f64,
}

impl From<&RateBand> for RateBandResponse {
    fn from(b: &RateBand) -> Self {
        RateBandResponse {
            rarity: b.tier.value(),
            percent: b.percent,
        }
    }
}

/// 公示概率与保底规则
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GachaRatesResponse {
    pub bands: Vec<RateBandResponse>,
    /// 软保底抽数（至少 4 星）
    pub soft_pity_threshold: i32,
    /// 软保底时出 5 星的百分比
    pub soft_pity_legendary_percent: f64,
    /// 硬保底抽数（必出 5 星）
    pub hard_pity_threshold: i32,
}

/// 用户已拥有的徽章
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnedBadgeResponse {
    pub code: String,
    pub acquired_at: DateTime<Utc>,
    /// 目录中已下线的徽章为 null
    pub badge: Option<BadgeResponse>,
}

/// 发放抽奖券（内部接口）
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddTicketsRequest {
    pub user_id: i64,
    /// 必须大于 0
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddTicketsResponse {
    pub new_balance: i64,
}
