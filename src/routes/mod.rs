use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use mealview_mealplan::{MealPlanApi, RecipeImages, SessionGuard, ViewRegistry};

use crate::template::{NotFoundTemplate, Template};

mod health;
mod meal_plans;

#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub views: ViewRegistry,
    pub images: RecipeImages,
    pub guard: SessionGuard,
}

impl AppState {
    pub fn new(config: crate::config::Config, api: Arc<dyn MealPlanApi>) -> Self {
        let views = ViewRegistry::new(api, config.views.idle_timeout());
        let images = RecipeImages::new(&config.api.base_url, &config.api.placeholder_image);
        let guard = SessionGuard::new(&config.session.user_id_cookie, &config.session.token_cookie);

        Self {
            config,
            views,
            images,
            guard,
        }
    }
}

pub async fn fallback(template: Template) -> impl IntoResponse {
    template.render_status(StatusCode::NOT_FOUND, NotFoundTemplate)
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/meal-plans", get(meal_plans::page))
        .route("/meal-plans/views/{view}", get(meal_plans::region))
        .route(
            "/meal-plans/views/{view}/select/{meal_plan}",
            get(meal_plans::select),
        )
        .route("/meal-plans/views/{view}/close", post(meal_plans::close))
        .route("/meal-plans/views/{view}/delete", post(meal_plans::delete))
        .route("/meal-plans/views/{view}/unmount", post(meal_plans::unmount))
        .fallback(fallback)
        .nest_service("/static", crate::assets::AssetsService::new())
        .with_state(app_state)
}
