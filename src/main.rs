use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use tipoff_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
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

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务（令牌由主站签发，这里只校验）
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建服务
    let lock_ledger_service = LockLedgerService::new(pool.clone(), config.scoring.max_locks);
    let season_service = SeasonService::new(pool.clone());
    let scoring_service = ScoringService::new(
        pool.clone(),
        lock_ledger_service.clone(),
        config.scoring.clone(),
    );
    let replenishment_service = ReplenishmentService::new(pool.clone(), lock_ledger_service.clone());
    let leaderboard_service = LeaderboardService::new(pool.clone(), season_service.clone());

    // 启动后台定时任务（结果扫描 + 锁归还）
    tasks::spawn_all(
        config.tasks.clone(),
        scoring_service.clone(),
        replenishment_service.clone(),
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(scoring_service.clone()))
            .app_data(web::Data::new(lock_ledger_service.clone()))
            .app_data(web::Data::new(replenishment_service.clone()))
            .app_data(web::Data::new(leaderboard_service.clone()))
            .app_data(web::Data::new(season_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::scoring_config)
                    .configure(handlers::locks_config)
                    .configure(handlers::leaderboard_config)
                    .configure(handlers::seasons_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
