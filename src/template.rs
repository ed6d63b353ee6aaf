use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Response},
};
use std::{collections::HashMap, convert::Infallible};

pub(crate) mod filters {
    #[askama::filter_fn]
    pub fn t(value: &str, values: &dyn askama::Values) -> askama::Result<String> {
        let preferred_language = askama::get_value::<String>(values, "preferred_language")
            .map(|lang| lang.to_owned())
            .unwrap_or_else(|_| "en".to_owned());

        Ok(rust_i18n::t!(value, locale = preferred_language).to_string())
    }
}

pub struct Template {
    preferred_language: String,
}

impl Template {
    pub fn new(preferred_language: impl Into<String>) -> Self {
        Self {
            preferred_language: preferred_language.into(),
        }
    }

    fn render_with_values<T: askama::Template>(
        &self,
        template: T,
    ) -> Result<String, askama::Error> {
        let mut values: HashMap<&str, Box<dyn std::any::Any>> = HashMap::new();
        values.insert(
            "preferred_language",
            Box::new(self.preferred_language.to_owned()),
        );

        #[cfg(debug_assertions)]
        {
            values.insert("is_dev", Box::new(true));
        }
        #[cfg(not(debug_assertions))]
        {
            values.insert("is_dev", Box::new(false));
        }

        template.render_with_values(&values)
    }

    pub fn render<T: askama::Template>(&self, template: T) -> Response {
        match self.render_with_values(template) {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template. Error: {err}"),
            )
                .into_response(),
        }
    }

    pub fn render_status<T: askama::Template>(&self, status: StatusCode, template: T) -> Response {
        let mut response = self.render(template);
        if response.status().is_success() {
            *response.status_mut() = status;
        }

        response
    }
}

/// First language tag of `Accept-Language`, ignoring quality values.
fn preferred_language(parts: &Parts) -> String {
    parts
        .headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|tag| tag.split(';').next().unwrap_or_default().trim())
        .filter(|tag| !tag.is_empty() && *tag != "*")
        .map(|tag| tag.split_once('-').map(|(lang, _)| lang).unwrap_or(tag))
        .map(str::to_lowercase)
        .unwrap_or_else(|| "en".to_owned())
}

impl<S: Send + Sync> FromRequestParts<S> for Template {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Template::new(preferred_language(parts)))
    }
}

#[derive(askama::Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate;

#[derive(askama::Template)]
#[template(path = "500.html")]
pub struct ServerTemplate;

#[derive(askama::Template)]
#[template(path = "partials/view-expired.html")]
pub struct ViewExpiredTemplate;

#[derive(askama::Template)]
#[template(path = "partials/alert-error.html")]
pub struct AlertErrorTemplate<'a> {
    pub message: &'a str,
}

/// Renders a blocking alert without touching the current page.
pub fn alert_response(template: &Template, message: &str) -> Response {
    (
        [("ts-swap", "skip")],
        template.render(AlertErrorTemplate { message }),
    )
        .into_response()
}

/// Sends a TwinSpark client to the login view.
pub fn login_response(login_url: &str) -> Response {
    (StatusCode::OK, [("ts-location", login_url.to_owned())]).into_response()
}

#[macro_export]
macro_rules! try_view_response {
    ($result:expr, $template:expr, $login_url:expr) => {
        match $result.await {
            Ok(r) => r,
            Err(::mealview_shared::Error::Forbidden) => {
                tracing::warn!("Session does not own this view");

                return $crate::template::login_response($login_url);
            }
            Err(::mealview_shared::Error::NotFound) => {
                return $template
                    .render_status(
                        ::axum::http::StatusCode::NOT_FOUND,
                        $crate::template::ViewExpiredTemplate,
                    )
                    .into_response();
            }
            Err(err) => {
                tracing::error!("{err}");

                return $template
                    .render_status(
                        ::axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                        $crate::template::ServerTemplate,
                    )
                    .into_response();
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(accept_language: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = accept_language {
            builder = builder.header(header::ACCEPT_LANGUAGE, value);
        }

        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn preferred_language_defaults_to_en() {
        assert_eq!(preferred_language(&parts(None)), "en");
        assert_eq!(preferred_language(&parts(Some("*"))), "en");
        assert_eq!(preferred_language(&parts(Some(""))), "en");
    }

    #[test]
    fn preferred_language_takes_first_tag() {
        assert_eq!(
            preferred_language(&parts(Some("fr-CA,fr;q=0.9,en;q=0.8"))),
            "fr"
        );
        assert_eq!(preferred_language(&parts(Some("EN;q=0.7"))), "en");
    }

    #[test]
    fn login_response_relocates_client() {
        let response = login_response("/login");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("ts-location").unwrap(), "/login");
    }

    #[test]
    fn alert_skips_swap() {
        let response = alert_response(&Template::new("en"), "Nope");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("ts-swap").unwrap(), "skip");
    }
}
