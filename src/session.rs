use axum_extra::extract::CookieJar;
use mealview_mealplan::SessionStore;

/// Persisted session read from request cookies. Never written here.
pub struct CookieSession<'a>(pub &'a CookieJar);

impl SessionStore for CookieSession<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|cookie| cookie.value().to_owned())
    }
}
