#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use http_body_util::BodyExt;
use mealview::{AppState, Config, routes::router};
use mealview_mealplan::{Ingredients, MealPlan, MemoryMealPlanApi, Recipe};
use tower::ServiceExt;

pub const COOKIE: &str = "userId=u1; token=t1";

pub struct TestApp {
    pub router: Router,
    pub api: Arc<MemoryMealPlanApi>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub fn create_test_app(api: MemoryMealPlanApi) -> TestApp {
    let config = Config::load(Some("config/default.toml".to_owned())).unwrap();
    let api = Arc::new(api);
    let router = router(AppState::new(config, api.clone()));

    TestApp { router, api }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Mounts a view for `u1` and waits until its fetch has settled.
    pub async fn open(&self) -> (String, String) {
        let page = self.get("/meal-plans", Some(COOKIE)).await;
        assert_eq!(page.status, StatusCode::OK);

        let view = view_id(&page.body);
        let region = self.settle(&format!("/meal-plans/views/{view}")).await;

        (view, region)
    }

    /// Polls a region URI as `u1` until it leaves the loading state.
    pub async fn settle(&self, uri: &str) -> String {
        for _ in 0..100 {
            let region = self.get(uri, Some(COOKIE)).await;
            assert_eq!(region.status, StatusCode::OK);

            if !region.body.contains("class=\"loading\"") {
                return region.body;
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        panic!("{uri} never left the loading state");
    }
}

pub fn view_id(html: &str) -> String {
    let start = html.find("data-view=\"").expect("data-view attribute") + "data-view=\"".len();
    let end = start + html[start..].find('"').unwrap();

    html[start..end].to_owned()
}

pub fn card_count(html: &str) -> usize {
    html.matches("class=\"card\"").count()
}

pub fn has_overlay(html: &str) -> bool {
    html.contains("id=\"meal-plan-overlay\"")
}

pub fn meal_plan(id: &str, title: &str, ingredients: &str) -> MealPlan {
    MealPlan {
        meal_plan_id: id.to_owned(),
        recipe: Some(Recipe {
            title: Some(title.to_owned()),
            description: Some(format!("{title} description")),
            image_path: Some(format!("{id}.jpg")),
            ingredients: Ingredients::parse(ingredients),
            prep_time: Some("15".to_owned()),
            nutrition_info: Some("400 kcal".to_owned()),
            cuisine_type: Some("French".to_owned()),
            meal_type: Some("Dinner".to_owned()),
            ratings_average: Some("4.5".to_owned()),
        }),
    }
}

pub fn two_plans() -> MemoryMealPlanApi {
    MemoryMealPlanApi::new().with_plans(
        "u1",
        vec![
            meal_plan("mp-1", "Pancakes", "Egg, Milk ,Flour"),
            meal_plan("mp-2", "Ratatouille", "Zucchini, Eggplant"),
        ],
    )
}
