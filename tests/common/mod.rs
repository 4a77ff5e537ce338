#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::mock::StepRng;
use ramen_gacha::config::GachaConfig;
use ramen_gacha::entities::{
    daily_draw_entity as daily, draw_history_entity as history, pity_counter_entity as pity,
    ticket_balance_entity as tickets, user_badge_entity as owned,
};
use ramen_gacha::gacha::{BadgeCatalog, BadgeDefinition, RarityTier};
use ramen_gacha::services::GachaService;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, EntityTrait, Schema,
    Set,
};
use uuid::Uuid;

pub const INTERNAL_KEY: &str = "test-internal-key";

/// 单连接的内存 SQLite，表结构直接由实体生成
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("failed to open sqlite");
    create_tables(&db).await;
    db
}

/// 文件 SQLite + 多连接，用于真实的并发写竞争
pub struct FileDb {
    pub db: DatabaseConnection,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

pub async fn setup_file_db(max_connections: u32) -> FileDb {
    let path = std::env::temp_dir().join(format!("ramen-gacha-{}.db", Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options
        .max_connections(max_connections)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("failed to open sqlite file");
    create_tables(&db).await;
    FileDb { db, path }
}

async fn create_tables(db: &DatabaseConnection) {
    let schema = Schema::new(DbBackend::Sqlite);
    let statements = [
        schema.create_table_from_entity(pity::Entity),
        schema.create_table_from_entity(tickets::Entity),
        schema.create_table_from_entity(daily::Entity),
        schema.create_table_from_entity(history::Entity),
        schema.create_table_from_entity(owned::Entity),
    ];
    for stmt in statements {
        db.execute(db.get_database_backend().build(&stmt))
            .await
            .expect("failed to create table");
    }
}

fn badge(code: &str, rarity: RarityTier) -> BadgeDefinition {
    BadgeDefinition {
        code: code.to_string(),
        name: format!("Badge {code}"),
        description: format!("Test badge {code}"),
        icon: "🍜".to_string(),
        rarity,
        category: "test".to_string(),
    }
}

/// 每个稀有度恰好一个徽章，抽到的稀有度即可确定徽章
pub fn test_catalog() -> BadgeCatalog {
    BadgeCatalog::new(vec![
        badge("t1", RarityTier::Common),
        badge("t2", RarityTier::Uncommon),
        badge("t3", RarityTier::Rare),
        badge("t4", RarityTier::Epic),
        badge("t5", RarityTier::Legendary),
    ])
    .expect("valid catalog")
}

pub fn test_settings() -> GachaConfig {
    GachaConfig {
        internal_api_key: INTERNAL_KEY.to_string(),
        ..GachaConfig::default()
    }
}

pub fn service_with_catalog(db: &DatabaseConnection, catalog: BadgeCatalog) -> GachaService {
    GachaService::new(db.clone(), Arc::new(catalog), test_settings())
}

pub fn test_service(db: &DatabaseConnection) -> GachaService {
    service_with_catalog(db, test_catalog())
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap()
}

/// 掷出 0：普通抽为 5 星，软保底为 5 星
pub fn roll_low() -> StepRng {
    StepRng::new(0, 0)
}

/// 掷出接近 100：普通抽为 1 星，软保底为 4 星
///
/// 高 32 位决定浮点掷点，低 32 位为 0，徽章选择的整数采样才不会被一直拒绝
pub fn roll_high() -> StepRng {
    StepRng::new(0xFFFF_FFFF_0000_0000, 0)
}

pub async fn seed_pity(db: &DatabaseConnection, user_id: i64, counter50: i32, counter100: i32) {
    pity::Entity::insert(pity::ActiveModel {
        user_id: Set(user_id),
        counter50: Set(counter50),
        counter100: Set(counter100),
        total_draws: Set(0),
        created_at: Set(Some(fixed_now())),
        updated_at: Set(Some(fixed_now())),
    })
    .exec_without_returning(db)
    .await
    .expect("seed pity");
}

pub async fn history_count(db: &DatabaseConnection) -> usize {
    history::Entity::find()
        .all(db)
        .await
        .expect("history query")
        .len()
}

pub async fn owned_count(db: &DatabaseConnection, user_id: i64) -> usize {
    use sea_orm::{ColumnTrait, QueryFilter};
    owned::Entity::find()
        .filter(owned::Column::UserId.eq(user_id))
        .all(db)
        .await
        .expect("ownership query")
        .len()
}
