use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, RuntimeErr, Set, SqlxError,
    TransactionTrait,
};
use uuid::Uuid;

use crate::config::GachaConfig;
use crate::entities::{
    DrawKind, daily_draw_entity as daily, draw_history_entity as history,
    pity_counter_entity as pity, ticket_balance_entity as tickets, user_badge_entity as owned,
};
use crate::error::{AppError, AppResult};
use crate::gacha::{
    BadgeCatalog, HARD_PITY_THRESHOLD, RATE_BANDS, SOFT_PITY_LEGENDARY_PERCENT,
    SOFT_PITY_THRESHOLD, day_key, pick_badge, select_rarity,
};
use crate::models::{
    AddTicketsResponse, BadgeResponse, DailyDrawStatusResponse, DrawHistoryEntryResponse,
    DrawResponse, GachaRatesResponse, OwnedBadgeResponse, PityCountersResponse,
    TicketBalanceResponse,
};

#[derive(Clone)]
pub struct GachaService {
    pool: DatabaseConnection,
    catalog: Arc<BadgeCatalog>,
    settings: GachaConfig,
}

impl GachaService {
    pub fn new(pool: DatabaseConnection, catalog: Arc<BadgeCatalog>, settings: GachaConfig) -> Self {
        Self {
            pool,
            catalog,
            settings,
        }
    }

    pub fn catalog(&self) -> &BadgeCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &GachaConfig {
        &self.settings
    }

    /// 获取抽奖券余额（无记录视为 0）
    pub async fn get_ticket_balance(&self, user_id: i64) -> AppResult<TicketBalanceResponse> {
        let count = tickets::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .map(|m| m.balance)
            .unwrap_or(0);
        Ok(TicketBalanceResponse { count })
    }

    /// 今天是否还能免费抽
    pub async fn can_draw_daily_today(&self, user_id: i64) -> AppResult<DailyDrawStatusResponse> {
        self.can_draw_daily_at(user_id, Utc::now()).await
    }

    pub async fn can_draw_daily_at(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<DailyDrawStatusResponse> {
        let today = day_key(now);
        let record = daily::Entity::find_by_id(user_id).one(&self.pool).await?;
        let eligible = !record.as_ref().is_some_and(|r| r.drawn_on(&today));
        Ok(DailyDrawStatusResponse {
            eligible,
            last_draw_day: record.map(|r| r.last_draw_date),
            today,
        })
    }

    /// 获取保底计数（无记录视为 0/0）
    pub async fn get_pity_counters(&self, user_id: i64) -> AppResult<PityCountersResponse> {
        let counters = pity::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .map(PityCountersResponse::from)
            .unwrap_or(PityCountersResponse {
                counter50: 0,
                counter100: 0,
            });
        Ok(counters)
    }

    /// 抽取历史（按抽取顺序倒序）
    pub async fn get_draw_history(
        &self,
        user_id: i64,
        limit: Option<u64>,
    ) -> AppResult<Vec<DrawHistoryEntryResponse>> {
        let limit = self.settings.history_limit(limit);
        let rows = history::Entity::find()
            .filter(history::Column::UserId.eq(user_id))
            .order_by_desc(history::Column::DrawSeq)
            .limit(limit)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 用户已拥有的徽章（按获得时间倒序）
    pub async fn list_collection(&self, user_id: i64) -> AppResult<Vec<OwnedBadgeResponse>> {
        let rows = owned::Entity::find()
            .filter(owned::Column::UserId.eq(user_id))
            .order_by_desc(owned::Column::AcquiredAt)
            .all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| OwnedBadgeResponse {
                badge: self.catalog.get(&row.badge_code).map(BadgeResponse::from),
                code: row.badge_code,
                acquired_at: row.acquired_at,
            })
            .collect())
    }

    /// 徽章目录
    pub fn list_badges(&self) -> Vec<BadgeResponse> {
        self.catalog.all().iter().map(BadgeResponse::from).collect()
    }

    /// 公示概率
    pub fn rates(&self) -> GachaRatesResponse {
        GachaRatesResponse {
            bands: RATE_BANDS.iter().map(Into::into).collect(),
            soft_pity_threshold: SOFT_PITY_THRESHOLD,
            soft_pity_legendary_percent: SOFT_PITY_LEGENDARY_PERCENT,
            hard_pity_threshold: HARD_PITY_THRESHOLD,
        }
    }

    /// 为用户发放抽奖券（发帖等业务触发）
    pub async fn add_tickets(&self, user_id: i64, amount: i64) -> AppResult<AddTicketsResponse> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Ticket amount must be positive".into(),
            ));
        }
        let mut attempt = 1;
        loop {
            match self.try_add_tickets(user_id, amount).await {
                Err(AppError::DatabaseError(err))
                    if attempt < self.settings.max_tx_attempts && is_write_conflict(&err) =>
                {
                    log::warn!(
                        "Write conflict while adding tickets for user {user_id} (attempt {attempt}): {err}"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_add_tickets(&self, user_id: i64, amount: i64) -> AppResult<AddTicketsResponse> {
        let now = Utc::now();
        let txn = self.pool.begin().await?;
        self.ensure_ticket_balance_tx(&txn, user_id, now).await?;
        tickets::Entity::update_many()
            .col_expr(
                tickets::Column::Balance,
                Expr::col(tickets::Column::Balance).add(amount),
            )
            .set(tickets::ActiveModel {
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(tickets::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        let new_balance = tickets::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .map(|m| m.balance)
            .ok_or_else(|| {
                AppError::InternalError(format!("Ticket balance for user {user_id} disappeared"))
            })?;
        txn.commit().await?;
        log::info!("Granted {amount} gacha ticket(s) to user {user_id}, balance {new_balance}");
        Ok(AddTicketsResponse { new_balance })
    }

    /// 抽取（使用当前时间与熵源随机数）
    pub async fn draw(&self, user_id: i64, kind: DrawKind) -> AppResult<DrawResponse> {
        let mut rng = ChaCha8Rng::from_entropy();
        self.draw_at(user_id, kind, Utc::now(), &mut rng).await
    }

    /// 抽取
    ///
    /// 整个流程在一个事务内完成，并先锁住该用户的保底计数行，
    /// 同一用户的并发抽取因此串行执行；不同用户互不影响。
    /// 写冲突（序列化失败 / 死锁 / SQLite busy）时从头重试整笔事务。
    ///
    /// `now` 在一次调用中只取一次，日期判断与写入使用同一个日期键。
    pub async fn draw_at<R: Rng + ?Sized>(
        &self,
        user_id: i64,
        kind: DrawKind,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AppResult<DrawResponse> {
        let today = day_key(now);
        let mut attempt = 1;
        loop {
            match self.try_draw(user_id, kind, now, &today, rng).await {
                Err(AppError::DatabaseError(err))
                    if attempt < self.settings.max_tx_attempts && is_write_conflict(&err) =>
                {
                    log::warn!(
                        "Write conflict during draw for user {user_id} (attempt {attempt}): {err}"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_draw<R: Rng + ?Sized>(
        &self,
        user_id: i64,
        kind: DrawKind,
        now: DateTime<Utc>,
        today: &str,
        rng: &mut R,
    ) -> AppResult<DrawResponse> {
        // 任何提前返回都会丢弃事务并回滚，包括惰性创建的行
        let txn = self.pool.begin().await?;

        let counters = self.lock_pity_tx(&txn, user_id, now).await?;
        self.ensure_ticket_balance_tx(&txn, user_id, now).await?;
        let daily_record = daily::Entity::find_by_id(user_id).one(&txn).await?;

        match kind {
            DrawKind::Daily => {
                if daily_record.as_ref().is_some_and(|r| r.drawn_on(today)) {
                    return Err(AppError::AlreadyDrawnToday);
                }
            }
            DrawKind::Ticket => self.consume_ticket_tx(&txn, user_id, now).await?,
        }

        let before = counters.state();
        let tier = select_rarity(before.counter50, before.counter100, rng);
        let badge = pick_badge(&self.catalog, tier, rng)?;

        let already_owned = owned::Entity::find_by_id((user_id, badge.code.clone()))
            .one(&txn)
            .await?
            .is_some();
        if !already_owned {
            owned::Entity::insert(owned::ActiveModel {
                user_id: Set(user_id),
                badge_code: Set(badge.code.clone()),
                acquired_at: Set(now),
            })
            .exec_without_returning(&txn)
            .await?;
        }

        let after = before.after_draw(tier);
        let draw_seq = counters.total_draws + 1;
        {
            let mut am = counters.into_active_model();
            am.counter50 = Set(after.counter50);
            am.counter100 = Set(after.counter100);
            am.total_draws = Set(draw_seq);
            am.updated_at = Set(Some(now));
            am.update(&txn).await?;
        }

        history::Entity::insert(history::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            badge_code: Set(badge.code.clone()),
            rarity: Set(tier.as_i16()),
            draw_kind: Set(kind),
            pity_count_at_draw: Set(before.pity_count_at_draw()),
            draw_seq: Set(draw_seq),
            created_at: Set(now),
        })
        .exec_without_returning(&txn)
        .await?;

        if kind == DrawKind::Daily {
            match daily_record {
                Some(record) => {
                    let draw_count = record.draw_count;
                    let mut am = record.into_active_model();
                    am.last_draw_date = Set(today.to_string());
                    am.draw_count = Set(draw_count + 1);
                    am.updated_at = Set(Some(now));
                    am.update(&txn).await?;
                }
                None => {
                    daily::Entity::insert(daily::ActiveModel {
                        user_id: Set(user_id),
                        last_draw_date: Set(today.to_string()),
                        draw_count: Set(1),
                        created_at: Set(Some(now)),
                        updated_at: Set(Some(now)),
                    })
                    .exec_without_returning(&txn)
                    .await?;
                }
            }
        }

        txn.commit().await?;

        log::info!(
            "User {} drew {} (tier {}, {:?}, new: {}), pity {}/{} -> {}/{}",
            user_id,
            badge.code,
            tier.value(),
            kind,
            !already_owned,
            before.counter50,
            before.counter100,
            after.counter50,
            after.counter100
        );

        Ok(DrawResponse {
            badge: BadgeResponse::from(badge),
            is_new: !already_owned,
            pity: after.into(),
        })
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    /// 获取或初始化保底计数，并对该行加排他锁（SELECT ... FOR UPDATE）
    async fn lock_pity_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<pity::Model, DbErr> {
        pity::Entity::insert(pity::ActiveModel {
            user_id: Set(user_id),
            counter50: Set(0),
            counter100: Set(0),
            total_draws: Set(0),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
        })
        .on_conflict(
            OnConflict::column(pity::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

        pity::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("pity counters for user {user_id}")))
    }

    /// 获取或初始化抽奖券余额（幂等）
    async fn ensure_ticket_balance_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        tickets::Entity::insert(tickets::ActiveModel {
            user_id: Set(user_id),
            balance: Set(0),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
        })
        .on_conflict(
            OnConflict::column(tickets::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;
        Ok(())
    }

    /// 扣减 1 张券（条件更新: balance >= 1），失败则余额不足
    async fn consume_ticket_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = tickets::Entity::update_many()
            .col_expr(
                tickets::Column::Balance,
                Expr::col(tickets::Column::Balance).sub(1),
            )
            .set(tickets::ActiveModel {
                updated_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(tickets::Column::UserId.eq(user_id))
            .filter(tickets::Column::Balance.gte(1))
            .exec(txn)
            .await?;

        if result.rows_affected != 1 {
            return Err(AppError::InsufficientTickets);
        }
        Ok(())
    }
}

/// 是否为可整笔重试的写冲突
fn is_write_conflict(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(SqlxError::Database(db_err)) => {
            db_err.code().is_some_and(|code| is_conflict_code(&code))
        }
        _ => false,
    }
}

/// Postgres: serialization_failure / deadlock_detected
/// SQLite: BUSY 及其扩展码 (RECOVERY / SNAPSHOT / TIMEOUT)
fn is_conflict_code(code: &str) -> bool {
    matches!(code, "40001" | "40P01" | "5" | "261" | "517" | "773")
}
