//! Client route transitions.
//!
//! When the visitor moves between two locations of the same page that differ only
//! in their query (filters, pagination), the previous content must not stay on
//! screen while the new data loads. [`NavigationController`] hides content for
//! those transitions and shows it again once the destination reports it is ready.
//! Navigations to another page are passed straight to the router.

use tokio::sync::watch;
use url::Url;

use crate::navigator::Navigator;

const RESOLVE_BASE: &str = "http://navigation.invalid/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingSlash {
    /// `/courses/` and `/courses` are the same route.
    #[default]
    Ignore,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FragmentPolicy {
    /// A hash-only change is an in-page jump and never hides content.
    #[default]
    Ignore,
    /// A hash-only change is handled like a query change.
    TreatAsQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// Different pathname: standard navigation.
    CrossRoute,
    /// Same pathname, different query: content is suppressed until ready.
    QueryChange,
    FragmentOnly,
    Unchanged,
}

/// RouteMatcher
///
/// Decides whether two locations show "the same page".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMatcher {
    pub trailing_slash: TrailingSlash,
    pub fragment: FragmentPolicy,
}

struct Location {
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl Location {
    fn render(&self) -> String {
        let mut out = self.path.clone();
        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

impl RouteMatcher {
    pub fn strict() -> Self {
        Self {
            trailing_slash: TrailingSlash::Strict,
            fragment: FragmentPolicy::TreatAsQuery,
        }
    }

    fn locate(&self, base: &str, target: &str) -> Option<Location> {
        let root = Url::parse(RESOLVE_BASE).ok()?;
        let base = root.join(base).ok()?;
        let url = base.join(target).ok()?;

        Some(Location {
            path: url.path().to_string(),
            query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
            fragment: url.fragment().filter(|f| !f.is_empty()).map(str::to_string),
        })
    }

    /// Path used to compare routes. Only affects matching, never where the
    /// router is sent.
    fn route_path<'a>(&self, path: &'a str) -> &'a str {
        match self.trailing_slash {
            TrailingSlash::Ignore if path.len() > 1 => {
                let trimmed = path.trim_end_matches('/');
                if trimmed.is_empty() { "/" } else { trimmed }
            }
            _ => path,
        }
    }

    /// Resolves `target` (absolute or relative, e.g. `?page=2`) against `current`
    /// and returns the path, query and fragment as the router should receive them.
    pub fn resolve(&self, current: &str, target: &str) -> String {
        self.locate(current, target)
            .map(|location| location.render())
            .unwrap_or_else(|| target.to_string())
    }

    pub fn classify(&self, current: &str, target: &str) -> NavigationKind {
        let (Some(from), Some(to)) = (self.locate("/", current), self.locate(current, target))
        else {
            return NavigationKind::CrossRoute;
        };

        if self.route_path(&from.path) != self.route_path(&to.path) {
            NavigationKind::CrossRoute
        } else if from.query != to.query {
            NavigationKind::QueryChange
        } else if from.fragment != to.fragment {
            match self.fragment {
                FragmentPolicy::Ignore => NavigationKind::FragmentOnly,
                FragmentPolicy::TreatAsQuery => NavigationKind::QueryChange,
            }
        } else {
            NavigationKind::Unchanged
        }
    }

    /// Whether `a` and `b` name the same location under this matcher's policies.
    pub fn same_location(&self, a: &str, b: &str) -> bool {
        self.classify(a, b) == NavigationKind::Unchanged
    }
}

/// A requested route change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    /// Resolved destination, path plus query and fragment, exactly as handed to
    /// the router.
    pub target_path: String,
    pub is_same_route_different_query: bool,
    pub kind: NavigationKind,
}

/// Identifies one `start_navigation` call; readiness is reported against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavigationTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    Idle,
    Transitioning {
        intent: NavigationIntent,
        ticket: NavigationTicket,
    },
}

/// NavigationController
///
/// One instance per navigation root. At most one transition is pending; a newer
/// `start_navigation` replaces it and readiness signals for replaced tickets are
/// ignored.
pub struct NavigationController<N> {
    navigator: N,
    matcher: RouteMatcher,
    state: NavigationState,
    // Location whose content is currently (or was last) on screen.
    committed: String,
    issued: u64,
    visible: watch::Sender<bool>,
}

impl<N: Navigator> NavigationController<N> {
    pub fn new(navigator: N) -> Self {
        Self::with_matcher(navigator, RouteMatcher::default())
    }

    pub fn with_matcher(navigator: N, matcher: RouteMatcher) -> Self {
        let committed = matcher.resolve("/", navigator.current_path());
        let (visible, _) = watch::channel(true);
        Self {
            navigator,
            matcher,
            state: NavigationState::Idle,
            committed,
            issued: 0,
            visible,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn pending(&self) -> Option<&NavigationIntent> {
        match &self.state {
            NavigationState::Transitioning { intent, .. } => Some(intent),
            NavigationState::Idle => None,
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn committed_location(&self) -> &str {
        &self.committed
    }

    pub fn should_show_content(&self) -> bool {
        *self.visible.borrow()
    }

    /// A boundary that follows `should_show_content`.
    pub fn subscribe(&self) -> ContentBoundary {
        ContentBoundary {
            signal: self.visible.subscribe(),
        }
    }

    pub fn start_navigation(&mut self, target: &str) -> NavigationTicket {
        self.issued += 1;
        let ticket = NavigationTicket(self.issued);

        let target_path = self.matcher.resolve(self.navigator.current_path(), target);
        let kind = self.matcher.classify(&self.committed, &target_path);
        let intent = NavigationIntent {
            target_path,
            is_same_route_different_query: kind == NavigationKind::QueryChange,
            kind,
        };

        if let NavigationState::Transitioning { intent: previous, .. } = &self.state {
            tracing::debug!(from = %previous.target_path, to = %intent.target_path, "navigation superseded");
        }

        self.navigator.navigate(&intent.target_path);

        if intent.is_same_route_different_query {
            self.state = NavigationState::Transitioning { intent, ticket };
            self.visible.send_replace(false);
        } else {
            self.committed = intent.target_path;
            self.state = NavigationState::Idle;
            self.visible.send_replace(true);
        }

        ticket
    }

    /// The destination of `ticket` finished rendering. Returns false when the
    /// ticket is no longer the pending one.
    pub fn signal_ready(&mut self, ticket: NavigationTicket) -> bool {
        match &self.state {
            NavigationState::Transitioning { ticket: pending, .. } if *pending == ticket => {
                self.finish();
                true
            }
            _ => {
                tracing::debug!(?ticket, "stale readiness signal ignored");
                false
            }
        }
    }

    /// The router reports it arrived at `path`. Ends the pending transition when
    /// `path` is its target; later content is still expected via `signal_ready`
    /// otherwise.
    pub fn navigation_settled(&mut self, path: &str) -> bool {
        let arrived = match &self.state {
            NavigationState::Transitioning { intent, .. } => {
                self.matcher.same_location(&intent.target_path, path)
            }
            NavigationState::Idle => false,
        };
        if arrived {
            self.finish();
        }
        arrived
    }

    fn finish(&mut self) {
        let previous = std::mem::replace(&mut self.state, NavigationState::Idle);
        if let NavigationState::Transitioning { intent, .. } = previous {
            self.committed = intent.target_path;
        }
        self.visible.send_replace(true);
    }
}

/// ContentBoundary
///
/// Mounts children only while the controller allows content to show.
#[derive(Debug, Clone)]
pub struct ContentBoundary {
    signal: watch::Receiver<bool>,
}

impl ContentBoundary {
    pub fn is_visible(&self) -> bool {
        *self.signal.borrow()
    }

    pub fn render<T>(&self, children: impl FnOnce() -> T) -> Option<T> {
        if self.is_visible() {
            Some(children())
        } else {
            None
        }
    }

    /// Resolves once content may show. Returns false if the controller was dropped
    /// while content was hidden.
    pub async fn wait_until_visible(&mut self) -> bool {
        self.signal.wait_for(|visible| *visible).await.is_ok()
    }
}
