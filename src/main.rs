use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use ramen_gacha::{
    config::Config,
    database::{create_pool, run_migrations},
    gacha::BadgeCatalog,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::GachaService,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 加载徽章目录；任一稀有度没有徽章属于部署错误，拒绝启动
    let catalog = BadgeCatalog::load(config.gacha.catalog_path.as_deref())
        .expect("Failed to load badge catalog");
    catalog
        .ensure_full_coverage()
        .expect("Badge catalog does not cover every rarity tier");
    let catalog = Arc::new(catalog);

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);
    let gacha_service = GachaService::new(pool.clone(), catalog.clone(), config.gacha.clone());

    if config.gacha.internal_api_key.is_empty() {
        log::warn!("gacha.internal_api_key is empty, internal ticket grant endpoint is disabled");
    }

    log::info!(
        "Starting HTTP server at {}:{} with {} badges",
        config.server.host,
        config.server.port,
        catalog.len()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(gacha_service.clone()))
            .configure(swagger_config)
            .configure(handlers::gacha_internal_config)
            .service(web::scope("/api/v1").configure(handlers::gacha_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
