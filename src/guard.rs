use crate::{
    clock::ClockState,
    models::{AccessPolicy, Location, NavigationOutcome},
    session::{self, SessionState, SessionStoreState},
};

/// Where expired and unauthenticated sessions are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated sessions are sent when they hit a guest-only route.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// SessionEffect
///
/// A write to the session store requested by a rule. Rules stay pure; the guard applies
/// the effects after a rule fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Remove `token` and `tokenExpiry`.
    ClearSession,
    /// Persist the given full path as the pending redirect.
    StashRedirect(String),
}

/// Verdict
///
/// The result of a rule that fired: the outcome plus the store writes it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: NavigationOutcome,
    pub effects: Vec<SessionEffect>,
}

/// GuardInput
///
/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub target: &'a Location,
    pub session: &'a SessionState,
    pub now_ms: i64,
}

/// GuardRule
///
/// A named, pure decision step. Returns `None` when the rule does not apply.
#[derive(Clone, Copy)]
pub struct GuardRule {
    pub name: &'static str,
    pub evaluate: fn(&GuardInput<'_>) -> Option<Verdict>,
}

/// GUARD_RULES
///
/// The ordered rule list. The first rule returning `Some` wins; when none fires the
/// transition proceeds. Expiry comes first, so an expired session is cleared and sent to
/// login even when the target is the login page itself.
pub const GUARD_RULES: [GuardRule; 3] = [
    GuardRule {
        name: "session_expired",
        evaluate: session_expired,
    },
    GuardRule {
        name: "guest_only",
        evaluate: guest_only,
    },
    GuardRule {
        name: "auth_required",
        evaluate: auth_required,
    },
];

fn session_expired(input: &GuardInput<'_>) -> Option<Verdict> {
    input.session.is_expired(input.now_ms).then(|| Verdict {
        outcome: NavigationOutcome::redirect(LOGIN_PATH),
        effects: vec![SessionEffect::ClearSession],
    })
}

fn guest_only(input: &GuardInput<'_>) -> Option<Verdict> {
    (input.target.requires(AccessPolicy::RequiresGuest) && input.session.has_token()).then(|| {
        Verdict {
            outcome: NavigationOutcome::redirect(DASHBOARD_PATH),
            effects: Vec::new(),
        }
    })
}

fn auth_required(input: &GuardInput<'_>) -> Option<Verdict> {
    (input.target.requires(AccessPolicy::RequiresAuth) && !input.session.has_token()).then(|| {
        Verdict {
            outcome: NavigationOutcome::redirect(LOGIN_PATH),
            effects: vec![SessionEffect::StashRedirect(input.target.full_path.clone())],
        }
    })
}

/// evaluate_rules
///
/// Runs the rule list against a session snapshot without touching any store. Returns the
/// name of the rule that fired alongside its verdict.
pub fn evaluate_rules(input: &GuardInput<'_>) -> Option<(&'static str, Verdict)> {
    GUARD_RULES
        .iter()
        .find_map(|rule| (rule.evaluate)(input).map(|verdict| (rule.name, verdict)))
}

/// NavigationGuard
///
/// The synchronous pre-transition decision function, bound to its session store, clock and
/// diagnostics setting. Cheap to clone and shared through the application state.
#[derive(Clone)]
pub struct NavigationGuard {
    store: SessionStoreState,
    clock: ClockState,
    diagnostics_enabled: bool,
}

impl NavigationGuard {
    pub fn new(store: SessionStoreState, clock: ClockState, diagnostics_enabled: bool) -> Self {
        Self {
            store,
            clock,
            diagnostics_enabled,
        }
    }

    pub fn store(&self) -> &SessionStoreState {
        &self.store
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics_enabled
    }

    /// decide
    ///
    /// Decides whether the transition from `previous` to `target` may commit.
    ///
    /// Side effects:
    /// - an expired session has `token` and `tokenExpiry` removed from the store;
    /// - an unauthenticated attempt on a protected route stashes `target.full_path`
    ///   under `redirectTo`.
    ///
    /// Store write failures are logged and never change the outcome.
    pub fn decide(&self, target: &Location, previous: &Location) -> NavigationOutcome {
        let session = SessionState::load(self.store.as_ref());
        let input = GuardInput {
            target,
            session: &session,
            now_ms: self.clock.now_millis(),
        };

        if let Some((rule, verdict)) = evaluate_rules(&input) {
            tracing::debug!(rule, to = %target.full_path, outcome = ?verdict.outcome, "Navigation guard rule fired");
            for effect in &verdict.effects {
                self.apply(effect);
            }
            return verdict.outcome;
        }

        if self.diagnostics_enabled {
            tracing::info!(from = %previous.path, to = %target.path, "Navigating from {} to {}", previous.path, target.path);
        }

        NavigationOutcome::Proceed
    }

    fn apply(&self, effect: &SessionEffect) {
        let result = match effect {
            SessionEffect::ClearSession => session::clear_session(self.store.as_ref()),
            SessionEffect::StashRedirect(path) => session::stash_redirect(self.store.as_ref(), path),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, effect = ?effect, "Failed to apply session effect");
        }
    }
}
