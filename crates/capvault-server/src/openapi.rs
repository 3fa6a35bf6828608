use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Capvault API",
        version = "0.1.0",
        description = "S-Craft group-buy drops and keycap collection tracking."
    ),
    paths(
        crate::routes::list_keycaps,
        crate::routes::add_keycap,
        crate::routes::update_keycap,
        crate::routes::delete_keycap,
        crate::routes::get_drops,
        crate::routes::compare,
        crate::routes::debug_scraper,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::KeycapResponse,
        crate::dto::CreateKeycapRequest,
        crate::dto::UpdateKeycapRequest,
        crate::dto::CreateKeycapResponse,
        crate::dto::SuccessResponse,
        crate::dto::DropResponse,
        crate::dto::CompareResponse,
        crate::dto::DebugScraperResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "keycaps", description = "Keycap collection management"),
        (name = "drops", description = "Group-buy listings and reconciliation"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
