use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::health::health))
        .merge(qrcode_routes())
        .merge(batch_routes(config))
}

fn qrcode_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::qrcode::create_qrcode))
        .routes(routes!(handlers::qrcode::get_qrcode))
        .routes(routes!(handlers::qrcode::get_qrcode_image))
        .routes(routes!(handlers::qrcode::download_qrcode))
}

fn batch_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let read = OpenApiRouter::new()
        .routes(routes!(handlers::qrcode::get_batch))
        .routes(routes!(handlers::qrcode::download_batch));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::qrcode::create_batch))
        .layer(handlers::qrcode::batch_upload_body_limit(
            config.upload.max_upload_size,
        ));

    read.merge(upload)
}
