use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::info;

use base_of_office::app_state::AppState;
use base_of_office::auth::Authentication;
use base_of_office::config::Config;
use base_of_office::routes::configure_routes;
use base_of_office::store::{DocumentStore, MemoryStore, MongoStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env();

    let store: Arc<dyn DocumentStore> = if config.use_memory_store {
        info!("Using in-memory store (demo mode)");
        Arc::new(MemoryStore::new())
    } else {
        let mongo = MongoStore::init(&config.mongo_uri, &config.database_name)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        Arc::new(mongo)
    };

    let bind_addr = config.bind_addr.clone();
    let frontend_origin = config.frontend_origin.clone();
    let jwt_secret = config.jwt_secret.clone();
    let state = web::Data::new(AppState::build(store, config));

    println!("Server running at http://{}", bind_addr);
    println!("Allowed CORS Origin: {}", frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication::new(jwt_secret.clone()))
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
