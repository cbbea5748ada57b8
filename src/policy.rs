use regex::RegexSet;

use crate::models::Role;

/// Paths reachable without a session.
pub const PUBLIC_ROUTES: &[&str] = &["/", "/sign-in", "/sign-up", "/api/webhook/register"];

/// Paths reserved for the admin role.
pub const ADMIN_ROUTES: &[&str] = &["/admin(.*)"];

/// RouteMatcher
///
/// A set of path patterns. Each pattern is a regular expression matched against the
/// whole path, so `/sign-in` matches only itself while `/admin(.*)` matches anything
/// starting with `/admin`.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    set: RegexSet,
}

impl RouteMatcher {
    pub fn new(patterns: &[&str]) -> Result<Self, regex::Error> {
        let anchored = patterns.iter().map(|p| format!("^(?:{p})$"));
        Ok(Self {
            set: RegexSet::new(anchored)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.set.is_match(path)
    }
}

/// RoutePolicy
///
/// The two route classes the guard knows about. Everything outside both sets is a
/// protected page open to any signed-in user.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub public: RouteMatcher,
    pub admin: RouteMatcher,
}

impl RoutePolicy {
    pub fn new(public: &[&str], admin: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            public: RouteMatcher::new(public)?,
            admin: RouteMatcher::new(admin)?,
        })
    }

    /// The application's fixed route table.
    pub fn standard() -> Result<Self, regex::Error> {
        Self::new(PUBLIC_ROUTES, ADMIN_ROUTES)
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public.matches(path)
    }

    pub fn is_admin(&self, path: &str) -> bool {
        self.admin.matches(path)
    }
}

/// Caller
///
/// Who is making the request, after session resolution and (for signed-in users) the
/// role lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Caller {
    Anonymous,
    Authenticated { user_id: String, role: Role },
    /// Signed in, but the provider could not tell us the role.
    LookupFailed { user_id: String },
}

/// RedirectTarget
///
/// The four places the guard ever sends a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    SignIn,
    Dashboard,
    AdminDashboard,
    Error,
}

impl RedirectTarget {
    pub fn path(self) -> &'static str {
        match self {
            RedirectTarget::SignIn => "/sign-in",
            RedirectTarget::Dashboard => "/dashboard",
            RedirectTarget::AdminDashboard => "/admin/dashboard",
            RedirectTarget::Error => "/error",
        }
    }

    /// The landing page for a role.
    pub fn home_for(role: Role) -> Self {
        if role.is_admin() {
            RedirectTarget::AdminDashboard
        } else {
            RedirectTarget::Dashboard
        }
    }
}

/// Decision
///
/// The guard's verdict for one request. `rule` names the row of the table that fired,
/// for the debug log.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    PassThrough,
    Redirect {
        target: RedirectTarget,
        rule: &'static str,
    },
}

/// Everything a rule may look at.
struct RouteContext<'a> {
    path: &'a str,
    is_public: bool,
    is_admin_route: bool,
    caller: &'a Caller,
}

impl RouteContext<'_> {
    fn role(&self) -> Option<Role> {
        match self.caller {
            Caller::Authenticated { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// Rule
///
/// One row of the policy table: `check` returns the redirect target when the rule fires.
struct Rule {
    name: &'static str,
    check: fn(&RouteContext<'_>) -> Option<RedirectTarget>,
}

fn require_session(ctx: &RouteContext<'_>) -> Option<RedirectTarget> {
    (matches!(ctx.caller, Caller::Anonymous) && !ctx.is_public).then_some(RedirectTarget::SignIn)
}

fn lookup_failed(ctx: &RouteContext<'_>) -> Option<RedirectTarget> {
    matches!(ctx.caller, Caller::LookupFailed { .. }).then_some(RedirectTarget::Error)
}

fn admin_home(ctx: &RouteContext<'_>) -> Option<RedirectTarget> {
    (ctx.role() == Some(Role::Admin) && ctx.path == RedirectTarget::Dashboard.path())
        .then_some(RedirectTarget::AdminDashboard)
}

fn admin_only(ctx: &RouteContext<'_>) -> Option<RedirectTarget> {
    (ctx.role() == Some(Role::Member) && ctx.is_admin_route).then_some(RedirectTarget::Dashboard)
}

fn signed_in_on_public(ctx: &RouteContext<'_>) -> Option<RedirectTarget> {
    match ctx.role() {
        Some(role) if ctx.is_public => Some(RedirectTarget::home_for(role)),
        _ => None,
    }
}

// Evaluated top to bottom; the first rule that fires decides the request.
// The three role rules are mutually exclusive for any single path.
const RULES: &[Rule] = &[
    Rule { name: "require-session", check: require_session },
    Rule { name: "lookup-failed", check: lookup_failed },
    Rule { name: "admin-home", check: admin_home },
    Rule { name: "admin-only", check: admin_only },
    Rule { name: "signed-in-on-public", check: signed_in_on_public },
];

/// decide
///
/// Applies the rule table to a request path and an already-resolved caller.
///
/// 1. `require-session`: anonymous on a non-public path goes to `/sign-in`.
/// 2. `lookup-failed`: a caller whose role lookup failed goes to `/error`, whatever
///    the path.
/// 3. `admin-home`: an admin asking for `/dashboard` goes to `/admin/dashboard`.
/// 4. `admin-only`: a member on an admin route goes to `/dashboard`.
/// 5. `signed-in-on-public`: any signed-in caller on a public path goes to their
///    role's home.
///
/// When no rule fires the request passes through. The function is pure; the provider
/// lookup has already happened in `guard::resolve_caller`.
pub fn decide(policy: &RoutePolicy, path: &str, caller: &Caller) -> Decision {
    let ctx = RouteContext {
        path,
        is_public: policy.is_public(path),
        is_admin_route: policy.is_admin(path),
        caller,
    };

    RULES
        .iter()
        .find_map(|rule| {
            (rule.check)(&ctx).map(|target| Decision::Redirect {
                target,
                rule: rule.name,
            })
        })
        .unwrap_or(Decision::PassThrough)
}

/// is_guarded_path
///
/// The inbound filter: API routes are always guarded; framework internals under
/// `/_next` and anything that looks like a file (contains a `.`) are served untouched.
pub fn is_guarded_path(path: &str) -> bool {
    if path.starts_with("/api") || path.starts_with("/trpc") {
        return true;
    }
    !(path.starts_with("/_next") || path.contains('.'))
}
