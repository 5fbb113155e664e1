#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness probe",
    responses((status = 200, description = "Service is up", body = String)),
)]
pub async fn health() -> &'static str {
    "ok"
}
