use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use mealview_mealplan::{DELETE_FAILED_MESSAGE, DeleteOutcome, Guard, MealPlanView, Session};
use mealview_shared::Error;
use serde::Deserialize;

use crate::{
    render::{Overlay, Region},
    routes::AppState,
    session::CookieSession,
    template::{ServerTemplate, Template, alert_response, filters, login_response},
};

pub const MEAL_PLAN_NOT_FOUND_MESSAGE: &str = "This meal plan is no longer available.";

#[derive(askama::Template)]
#[template(path = "meal-plans.html")]
pub struct PageTemplate {
    pub view_id: String,
    pub user_id: String,
    pub region: Region,
    pub overlay: Option<Overlay>,
}

#[derive(askama::Template)]
#[template(path = "partials/meal-plans-view.html")]
pub struct ViewTemplate {
    pub view_id: String,
    pub user_id: String,
    pub region: Region,
    pub overlay: Option<Overlay>,
}

impl ViewTemplate {
    fn new(app: &AppState, view_id: impl Into<String>, view: &MealPlanView) -> Self {
        Self {
            view_id: view_id.into(),
            user_id: view.session().user_id.to_owned(),
            region: Region::new(view, &app.images),
            overlay: Overlay::new(view, &app.images),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub view: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ViewQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Session of the caller, read the same way as on page entry.
fn session(app: &AppState, jar: &CookieJar, user_id: Option<&str>) -> Option<Session> {
    match app.guard.resolve(user_id, &CookieSession(jar)) {
        Guard::Authenticated(session) => Some(session),
        Guard::Unauthenticated => None,
    }
}

/// Resolves the caller's session or returns the login redirect.
macro_rules! try_session {
    ($app:expr, $jar:expr, $query:expr) => {
        match session(&$app, &$jar, $query.user_id.as_deref()) {
            Some(session) => session,
            None => {
                tracing::debug!("No session, sending client to login");

                return login_response(&$app.config.session.login_url);
            }
        }
    };
}

#[tracing::instrument(skip_all)]
pub async fn page(
    template: Template,
    State(app): State<AppState>,
    jar: CookieJar,
    Query(input): Query<PageQuery>,
) -> impl IntoResponse {
    let Some(session) = session(&app, &jar, input.user_id.as_deref()) else {
        tracing::debug!("No session, redirecting to login");

        return Redirect::to(&app.config.session.login_url).into_response();
    };

    let remounted = match input.view {
        Some(id) => match app.views.remount(&id, session.clone()).await {
            Ok(view) => Some((id, view)),
            Err(_) => None,
        },
        None => None,
    };

    let (view_id, view) = match remounted {
        Some(found) => found,
        None => {
            let id = app.views.mount(session.clone()).await;
            let view = crate::try_view_response!(
                app.views.snapshot(&id, &session),
                template,
                &app.config.session.login_url
            );

            (id, view)
        }
    };

    tracing::info!(user = session.user_id, view = view_id, "Meal plan view entered");

    let ViewTemplate {
        view_id,
        user_id,
        region,
        overlay,
    } = ViewTemplate::new(&app, view_id, &view);

    template
        .render(PageTemplate {
            view_id,
            user_id,
            region,
            overlay,
        })
        .into_response()
}

pub async fn region(
    template: Template,
    State(app): State<AppState>,
    jar: CookieJar,
    Path((view_id,)): Path<(String,)>,
    Query(input): Query<ViewQuery>,
) -> Response {
    let session = try_session!(app, jar, input);
    let view = crate::try_view_response!(
        app.views.snapshot(&view_id, &session),
        template,
        &app.config.session.login_url
    );

    template
        .render(ViewTemplate::new(&app, view_id, &view))
        .into_response()
}

#[tracing::instrument(skip_all, fields(view = view_id, meal_plan = meal_plan_id))]
pub async fn select(
    template: Template,
    State(app): State<AppState>,
    jar: CookieJar,
    Path((view_id, meal_plan_id)): Path<(String, String)>,
    Query(input): Query<ViewQuery>,
) -> Response {
    let session = try_session!(app, jar, input);
    crate::try_view_response!(
        app.views.snapshot(&view_id, &session),
        template,
        &app.config.session.login_url
    );

    match app.views.select(&view_id, &session, &meal_plan_id).await {
        Ok(view) => template
            .render(ViewTemplate::new(&app, view_id, &view))
            .into_response(),
        Err(Error::NotFound) => {
            tracing::warn!("Selected meal plan is not in the loaded list");

            alert_response(&template, MEAL_PLAN_NOT_FOUND_MESSAGE)
        }
        Err(Error::Forbidden) => login_response(&app.config.session.login_url),
        Err(err) => {
            tracing::error!(err = %err, "Failed to select meal plan");

            template
                .render_status(StatusCode::INTERNAL_SERVER_ERROR, ServerTemplate)
                .into_response()
        }
    }
}

pub async fn close(
    template: Template,
    State(app): State<AppState>,
    jar: CookieJar,
    Path((view_id,)): Path<(String,)>,
    Query(input): Query<ViewQuery>,
) -> Response {
    let session = try_session!(app, jar, input);
    let view = crate::try_view_response!(
        app.views.close(&view_id, &session),
        template,
        &app.config.session.login_url
    );

    template
        .render(ViewTemplate::new(&app, view_id, &view))
        .into_response()
}

#[tracing::instrument(skip_all, fields(view = view_id))]
pub async fn delete(
    template: Template,
    State(app): State<AppState>,
    jar: CookieJar,
    Path((view_id,)): Path<(String,)>,
    Query(input): Query<ViewQuery>,
) -> Response {
    let session = try_session!(app, jar, input);
    let (outcome, view) = crate::try_view_response!(
        app.views.delete_selected(&view_id, &session),
        template,
        &app.config.session.login_url
    );

    match outcome {
        DeleteOutcome::Deleted | DeleteOutcome::NothingSelected => template
            .render(ViewTemplate::new(&app, view_id, &view))
            .into_response(),
        DeleteOutcome::Failed(_) => alert_response(&template, DELETE_FAILED_MESSAGE),
    }
}

pub async fn unmount(
    State(app): State<AppState>,
    jar: CookieJar,
    Path((view_id,)): Path<(String,)>,
    Query(input): Query<ViewQuery>,
) -> Response {
    let session = try_session!(app, jar, input);

    match app.views.unmount(&view_id, &session).await {
        Ok(()) | Err(Error::NotFound) => StatusCode::NO_CONTENT.into_response(),
        Err(Error::Forbidden) => login_response(&app.config.session.login_url),
        Err(err) => {
            tracing::error!(err = %err, "Failed to unmount view");

            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
