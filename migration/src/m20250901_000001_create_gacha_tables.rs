use sea_orm_migration::prelude::*;

/// 保底计数（每个用户一行）
#[derive(DeriveIden)]
enum GachaPityCounters {
    Table,
    UserId,
    Counter50,
    Counter100,
    TotalDraws,
    CreatedAt,
    UpdatedAt,
}

/// 抽奖券余额（每个用户一行）
#[derive(DeriveIden)]
enum GachaTicketBalances {
    Table,
    UserId,
    Balance,
    CreatedAt,
    UpdatedAt,
}

/// 每日免费抽记录（每个用户一行）
#[derive(DeriveIden)]
enum GachaDailyDraws {
    Table,
    UserId,
    LastDrawDate,
    DrawCount,
    CreatedAt,
    UpdatedAt,
}

/// 抽取历史（只追加）
#[derive(DeriveIden)]
enum GachaDrawHistory {
    Table,
    Id,
    UserId,
    BadgeCode,
    Rarity,
    DrawKind,
    PityCountAtDraw,
    DrawSeq,
    CreatedAt,
}

/// 用户拥有的徽章
#[derive(DeriveIden)]
enum UserBadges {
    Table,
    UserId,
    BadgeCode,
    AcquiredAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 保底计数表
        manager
            .create_table(
                Table::create()
                    .table(GachaPityCounters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GachaPityCounters::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GachaPityCounters::Counter50)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GachaPityCounters::Counter100)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GachaPityCounters::TotalDraws)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GachaPityCounters::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(GachaPityCounters::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 抽奖券余额表，余额不允许为负
        manager
            .create_table(
                Table::create()
                    .table(GachaTicketBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GachaTicketBalances::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GachaTicketBalances::Balance)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(GachaTicketBalances::Balance).gte(0)),
                    )
                    .col(
                        ColumnDef::new(GachaTicketBalances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(GachaTicketBalances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 每日免费抽记录表
        manager
            .create_table(
                Table::create()
                    .table(GachaDailyDraws::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GachaDailyDraws::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GachaDailyDraws::LastDrawDate)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaDailyDraws::DrawCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GachaDailyDraws::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(GachaDailyDraws::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 抽取历史表
        manager
            .create_table(
                Table::create()
                    .table(GachaDrawHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GachaDrawHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GachaDrawHistory::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaDrawHistory::BadgeCode)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaDrawHistory::Rarity)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaDrawHistory::DrawKind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaDrawHistory::PityCountAtDraw)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaDrawHistory::DrawSeq)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GachaDrawHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 按用户倒序查询历史；同一用户的顺序号不重复
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gacha_draw_history_user_seq")
                    .table(GachaDrawHistory::Table)
                    .col(GachaDrawHistory::UserId)
                    .col(GachaDrawHistory::DrawSeq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 用户徽章表，(user_id, badge_code) 联合主键保证不重复发放
        manager
            .create_table(
                Table::create()
                    .table(UserBadges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserBadges::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserBadges::BadgeCode)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserBadges::AcquiredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserBadges::UserId)
                            .col(UserBadges::BadgeCode),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：历史 -> 每日 -> 券 -> 保底 -> 徽章
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(GachaDrawHistory::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(GachaDailyDraws::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(GachaTicketBalances::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(GachaPityCounters::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(UserBadges::Table).to_owned())
            .await?;

        Ok(())
    }
}
