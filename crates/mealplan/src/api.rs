use std::time::Duration;

use async_trait::async_trait;
use mealview_shared::{Error, Result, bail};
use reqwest::{Client, RequestBuilder, Response};

use crate::{MealPlan, Recipe, Session};

#[async_trait]
pub trait MealPlanApi: Send + Sync {
    async fn list_by_user(&self, session: &Session) -> Result<Vec<MealPlan>>;

    async fn delete(&self, session: &Session, meal_plan_id: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct HttpMealPlanApi {
    client: Client,
    base_url: String,
}

impl HttpMealPlanApi {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("Meal plan API base url must be http(s), got {base_url:?}");
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Server(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.bearer_auth(&session.token)
    }
}

#[async_trait]
impl MealPlanApi for HttpMealPlanApi {
    #[tracing::instrument(skip_all, fields(user = session.user_id))]
    async fn list_by_user(&self, session: &Session) -> Result<Vec<MealPlan>> {
        let url = format!(
            "{}/api/meal-plans/user/{}",
            self.base_url,
            urlencoding::encode(&session.user_id)
        );

        let resp = self
            .authorized(self.client.get(&url), session)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        let plans = resp.json::<Vec<MealPlan>>().await.map_err(|e| {
            tracing::error!(err = %e, "Invalid meal plan list payload");
            Error::from(e)
        })?;

        tracing::debug!(count = plans.len(), "Meal plans fetched");

        Ok(plans)
    }

    #[tracing::instrument(skip_all, fields(user = session.user_id, meal_plan = meal_plan_id))]
    async fn delete(&self, session: &Session, meal_plan_id: &str) -> Result<()> {
        let url = format!(
            "{}/api/meal-plans/{}",
            self.base_url,
            urlencoding::encode(meal_plan_id)
        );

        let resp = self
            .authorized(self.client.delete(&url), session)
            .send()
            .await?;
        ensure_success(resp).await?;

        Ok(())
    }
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "Meal plan API returned an error");

    Err(Error::Request {
        status: Some(status.as_u16()),
        message: server_message(&body),
    })
}

/// Extracts the human readable message a server put in an error body.
pub fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let message = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(message)) => message,
        Ok(serde_json::Value::Object(fields)) => ["message", "error"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(|v| v.as_str()))
            .map(str::to_owned)?,
        Ok(serde_json::Value::Null) => return None,
        Ok(_) | Err(_) => body.to_owned(),
    };

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_owned())
}

/// Builds recipe image addresses served by the meal plan API.
#[derive(Debug, Clone)]
pub struct RecipeImages {
    base_url: String,
    placeholder: String,
}

impl RecipeImages {
    pub fn new(base_url: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            placeholder: placeholder.into(),
        }
    }

    pub fn url(&self, recipe: Option<&Recipe>) -> String {
        match recipe
            .and_then(|r| r.image_path.as_deref())
            .filter(|p| !p.is_empty())
        {
            Some(path) => {
                let path: Vec<_> = path.split('/').map(urlencoding::encode).collect();

                format!("{}/api/recipe/images/{}", self.base_url, path.join("/"))
            }
            None => self.placeholder.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Request,
        http::{StatusCode, header},
    };
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct Received {
        method: String,
        path: String,
        authorization: Option<String>,
    }

    /// Answers every request with `status` and `body`, recording what it saw.
    async fn remote(status: StatusCode, body: &'static str) -> (String, Arc<Mutex<Vec<Received>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let seen = received.clone();

        let app = axum::Router::new().fallback(move |req: Request| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(Received {
                    method: req.method().to_string(),
                    path: req.uri().path().to_owned(),
                    authorization: req
                        .headers()
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_owned),
                });

                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (format!("http://{addr}"), received)
    }

    fn session(user_id: &str) -> Session {
        Session {
            user_id: user_id.to_owned(),
            token: "secret-token".to_owned(),
        }
    }

    #[tokio::test]
    async fn list_by_user_sends_authorized_get() {
        let (base_url, received) = remote(
            StatusCode::OK,
            r#"[{"mealPlanId": "mp-1", "recipe": {"title": "Pancakes", "ingredients": "Egg, Milk"}}]"#,
        )
        .await;
        let api = HttpMealPlanApi::new(base_url, None).unwrap();

        let plans = api.list_by_user(&session("user 1")).await.unwrap();

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].meal_plan_id, "mp-1");
        assert_eq!(
            received.lock().unwrap().clone(),
            vec![Received {
                method: "GET".to_owned(),
                path: "/api/meal-plans/user/user%201".to_owned(),
                authorization: Some("Bearer secret-token".to_owned()),
            }]
        );
    }

    #[tokio::test]
    async fn delete_sends_authorized_delete() {
        let (base_url, received) = remote(StatusCode::NO_CONTENT, "").await;
        let api = HttpMealPlanApi::new(base_url, None).unwrap();

        api.delete(&session("u1"), "mp/1").await.unwrap();

        assert_eq!(
            received.lock().unwrap().clone(),
            vec![Received {
                method: "DELETE".to_owned(),
                path: "/api/meal-plans/mp%2F1".to_owned(),
                authorization: Some("Bearer secret-token".to_owned()),
            }]
        );
    }

    #[tokio::test]
    async fn error_status_carries_server_message() {
        let (base_url, _) = remote(
            StatusCode::NOT_FOUND,
            r#"{"status": 404, "message": "User not found"}"#,
        )
        .await;
        let api = HttpMealPlanApi::new(base_url, None).unwrap();

        let err = api.list_by_user(&session("u1")).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Request { status: Some(404), ref message } if message.as_deref() == Some("User not found")
        ));
        assert_eq!(err.server_message(), Some("User not found"));
    }

    #[tokio::test]
    async fn error_status_without_body_has_no_message() {
        let (base_url, _) = remote(StatusCode::INTERNAL_SERVER_ERROR, "").await;
        let api = HttpMealPlanApi::new(base_url, None).unwrap();

        let err = api.delete(&session("u1"), "mp-1").await.unwrap_err();

        assert!(matches!(
            err,
            Error::Request {
                status: Some(500),
                message: None
            }
        ));
    }

    #[test]
    fn server_message_from_plain_text() {
        assert_eq!(
            server_message("User not found\n"),
            Some("User not found".to_owned())
        );
    }

    #[test]
    fn server_message_from_json_string() {
        assert_eq!(
            server_message(r#""Token expired""#),
            Some("Token expired".to_owned())
        );
    }

    #[test]
    fn server_message_from_json_object() {
        assert_eq!(
            server_message(r#"{"status": 500, "message": "Database unavailable"}"#),
            Some("Database unavailable".to_owned())
        );
        assert_eq!(
            server_message(r#"{"error": "Forbidden"}"#),
            Some("Forbidden".to_owned())
        );
    }

    #[test]
    fn server_message_absent() {
        assert_eq!(server_message(""), None);
        assert_eq!(server_message("   "), None);
        assert_eq!(server_message("null"), None);
        assert_eq!(server_message(r#"{"status": 500}"#), None);
        assert_eq!(server_message(r#""""#), None);
    }

    #[test]
    fn image_url_for_recipe() {
        let images = RecipeImages::new("http://localhost:8080/", "placeholder.jpg");
        let recipe = Recipe {
            image_path: Some("pan cakes.jpg".to_owned()),
            ..Default::default()
        };

        assert_eq!(
            images.url(Some(&recipe)),
            "http://localhost:8080/api/recipe/images/pan%20cakes.jpg"
        );
    }

    #[test]
    fn image_url_keeps_path_separators() {
        let images = RecipeImages::new("http://localhost:8080", "placeholder.jpg");
        let recipe = Recipe {
            image_path: Some("recipes/2024/pan cakes.jpg".to_owned()),
            ..Default::default()
        };

        assert_eq!(
            images.url(Some(&recipe)),
            "http://localhost:8080/api/recipe/images/recipes/2024/pan%20cakes.jpg"
        );
    }

    #[test]
    fn image_url_falls_back_to_placeholder() {
        let images = RecipeImages::new("http://localhost:8080", "placeholder.jpg");

        assert_eq!(images.url(None), "placeholder.jpg");
        assert_eq!(images.url(Some(&Recipe::default())), "placeholder.jpg");

        let recipe = Recipe {
            image_path: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(images.url(Some(&recipe)), "placeholder.jpg");
    }

    #[test]
    fn base_url_is_normalized() {
        let api = HttpMealPlanApi::new("http://localhost:8080///", None).unwrap();
        assert_eq!(api.base_url, "http://localhost:8080");
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(matches!(
            HttpMealPlanApi::new("localhost:8080", None),
            Err(Error::Server(_))
        ));
    }
}
