use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::sync::Arc;

use taskvault::config::Config;
use taskvault::store::{PgUserStore, UserStore};
use taskvault::{notifier, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let notifier = notifier::from_env();

    log::info!("Starting TaskVault server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::from(notifier.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(web::scope("/api").configure(routes::config))
    })
    .bind(bind_addr)?
    .run()
    .await
}
