use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::DrawKind;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::gacha::get_tickets,
        handlers::gacha::get_daily_status,
        handlers::gacha::get_pity,
        handlers::gacha::get_history,
        handlers::gacha::get_collection,
        handlers::gacha::get_badges,
        handlers::gacha::get_rates,
        handlers::gacha::draw,
        handlers::gacha::add_tickets,
    ),
    components(
        schemas(
            DrawKind,
            DrawRequest,
            DrawResponse,
            BadgeResponse,
            PityCountersResponse,
            TicketBalanceResponse,
            DailyDrawStatusResponse,
            DrawHistoryQuery,
            DrawHistoryEntryResponse,
            OwnedBadgeResponse,
            RateBandResponse,
            GachaRatesResponse,
            AddTicketsRequest,
            AddTicketsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "gacha", description = "Badge gacha API"),
        (name = "gacha_internal", description = "Internal ticket grant API"),
    ),
    info(
        title = "Ramen Gacha API",
        version = "1.0.0",
        description = "Badge gacha REST API documentation"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
