use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{LockLedgerReason, TipLockState};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::scoring::score_outcome,
        handlers::scoring::process_pending,
        handlers::locks::get_balance,
        handlers::locks::get_entries,
        handlers::locks::replenish,
        handlers::leaderboard::get_leaderboard,
        handlers::seasons::get_active_season,
    ),
    components(
        schemas(
            ScoringSummary,
            BatchSummary,
            BatchEventError,
            ScoreOutcomeQuery,
            ProcessPendingQuery,
            LockBalanceResponse,
            PendingForfeiture,
            LockLedgerEntryResponse,
            LockEntryQuery,
            ReplenishmentSummary,
            LeaderboardResponse,
            LeaderboardQuery,
            UserStanding,
            RankedStanding,
            SeasonResponse,
            TipLockState,
            LockLedgerReason,
            ApiError,
            PaginatedLockEntries,
            PaginatedStandings,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "scoring", description = "Outcome scoring API"),
        (name = "locks", description = "Lock token ledger API"),
        (name = "leaderboard", description = "Leaderboard API"),
        (name = "seasons", description = "Season API"),
    ),
    info(
        title = "Tipoff Scoring API",
        version = "1.0.0",
        description = "Prediction scoring and lock ledger REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
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
