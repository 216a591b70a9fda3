use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;
use std::sync::Arc;

use linkzup_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{LinkedInClient, PostingAdapter, RazorpayService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

fn io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

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

    let config = Config::from_toml().map_err(io_error)?;

    let pool = create_pool(&config.database).await.map_err(io_error)?;
    run_migrations(&pool).await.map_err(io_error)?;

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    let razorpay = RazorpayService::new(config.razorpay.clone());
    let linkedin: Arc<dyn PostingAdapter> =
        Arc::new(LinkedInClient::new(&config.linkedin).map_err(io_error)?);

    let coupon_service = CouponService::new(pool.clone());
    let payment_service = PaymentService::new(pool.clone(), coupon_service.clone(), razorpay);
    let scheduled_post_service =
        ScheduledPostService::new(pool.clone(), config.scheduler.max_attempts);
    let dispatcher = PostDispatcher::new(
        pool.clone(),
        linkedin,
        config.linkedin.adapter_timeout(),
        config.scheduler.claim_lease_secs,
    );

    tasks::spawn_all(dispatcher.clone(), &config.scheduler);

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let cron_config = config.cron.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(coupon_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(scheduled_post_service.clone()))
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(cron_config.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .configure(handlers::cron_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::coupon_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::scheduled_post_config)
                    .configure(handlers::linkedin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
