use axum::response::{IntoResponse, Redirect, Response};

/// Navigator
///
/// The narrow routing contract the gate and the navigation controller depend on.
/// `navigate` is a user-initiated move that keeps history; `redirect` replaces the
/// current entry.
pub trait Navigator {
    fn current_path(&self) -> &str;
    fn navigate(&mut self, path: &str);
    fn redirect(&mut self, path: &str);
}

/// ResponseNavigator
///
/// Server-side navigator for a single HTTP request. The first redirect wins and is
/// turned into a `303 See Other`; later calls are ignored.
#[derive(Debug, Clone)]
pub struct ResponseNavigator {
    current: String,
    redirect: Option<String>,
}

impl ResponseNavigator {
    pub fn new(current_path: impl Into<String>) -> Self {
        Self {
            current: current_path.into(),
            redirect: None,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    pub fn into_redirect(self) -> Option<Response> {
        self.redirect
            .map(|target| Redirect::to(&target).into_response())
    }
}

impl Navigator for ResponseNavigator {
    fn current_path(&self) -> &str {
        &self.current
    }

    fn navigate(&mut self, path: &str) {
        self.current = path.to_string();
    }

    fn redirect(&mut self, path: &str) {
        if self.redirect.is_none() {
            self.redirect = Some(path.to_string());
            self.current = path.to_string();
        }
    }
}
