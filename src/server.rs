use actix_cors::Cors;
use actix_web::{dev::Server, http::header, middleware, web, App, HttpServer};

use crate::{
    configuration::{AppState, State},
    controller::{farm, lending, pool, stake, supply},
    error::Error,
};

pub async fn server_task(app_state: &AppState<State>) -> Result<(), Error> {
    let app = app_state.clone();
    tokio::spawn(async move {
        let server = init_server(app)?;
        server.await?;
        Ok(())
    })
    .await?
}

fn init_server(app_state: AppState<State>) -> Result<Server, Error> {
    let host = app_state.config.server_host.to_owned();
    let port = app_state.config.port;

    let server = HttpServer::new(move || {
        let app = app_state.clone();
        let allowed_cors = String::from("*");
        let cors_access_all =
            app.config.allowed_origins.contains(&allowed_cors);
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                if cors_access_all {
                    return true;
                }
                let allowed = &app.config.allowed_origins;
                if let Ok(origin) = origin.to_str() {
                    return allowed.contains(&origin.to_owned());
                }
                false
            })
            .allowed_methods(vec!["GET"])
            .allowed_headers(vec![header::ACCEPT])
            .allowed_header(header::CONTENT_TYPE);

        App::new()
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .service(
                web::scope("/v1")
                    .service(
                        web::scope("/supply")
                            .service(supply::circulating)
                            .service(supply::circulating_adjusted)
                            .service(supply::total)
                            .service(supply::max),
                    )
                    .service(
                        web::scope("/lending")
                            .service(lending::list)
                            .service(lending::total_supply)
                            .service(lending::total_borrow),
                    ),
            )
            .service(
                web::scope("/v2")
                    .service(
                        web::scope("/lending")
                            .service(lending::deposit_apy)
                            .service(lending::deposit_rewards_apr)
                            .service(lending::borrow_apy)
                            .service(lending::borrow_rewards_apr),
                    )
                    .service(
                        web::scope("/farm")
                            .service(farm::list)
                            .service(farm::pool_weight)
                            .service(farm::apr)
                            .service(farm::liquidity)
                            .service(farm::bonus_apr),
                    )
                    .service(
                        web::scope("/pool")
                            .service(pool::liquidity)
                            .service(pool::volume)
                            .service(pool::fees)
                            .service(pool::apr),
                    )
                    .service(
                        web::scope("/stake")
                            .service(stake::fees)
                            .service(stake::apr)
                            .service(stake::apy),
                    ),
            )
    })
    .bind((host, port))?
    .disable_signals()
    .run();
    Ok(server)
}
