//! Static route table and the role filter applied to it.
//!
//! The table is rebuilt from [`build_routes`] whenever the session changes
//! (see `AppShell::refresh`). A shell that never refreshes keeps the routes
//! computed for the role it started with until it is rebuilt.

use common_auth::Role;

pub const ADMIN_LAYOUT: &str = "/admin";
pub const AUTH_LAYOUT: &str = "/auth";

/// Screen rendered for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    MainDashboard,
    TeacherDashboard,
    AccountantDashboard,
    Students,
    Users,
    Terminals,
    Permissions,
    IdCards,
    ScanTerminal,
    RecordPayment,
    PayDebt,
    CreditReports,
    Entries,
    Profile,
    SignIn,
    SignUp,
    TeacherSignIn,
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Admin,
    TeacherOrAdmin,
    AccountantOrAdmin,
}

impl Audience {
    pub fn admits(self, role: Role) -> bool {
        match (self, role) {
            (Audience::Everyone, _) => true,
            (_, Role::Unknown) => false,
            (Audience::Admin, Role::Admin) => true,
            (Audience::Admin, Role::Teacher | Role::Accountant) => false,
            (Audience::TeacherOrAdmin, Role::Teacher | Role::Admin) => true,
            (Audience::TeacherOrAdmin, Role::Accountant) => false,
            (Audience::AccountantOrAdmin, Role::Accountant | Role::Admin) => true,
            (Audience::AccountantOrAdmin, Role::Teacher) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub name: &'static str,
    pub layout: &'static str,
    pub path: &'static str,
    pub icon: &'static str,
    pub page: Page,
    pub hide_in_sidebar: bool,
    pub audience: Audience,
}

impl RouteDescriptor {
    const fn admin(name: &'static str, path: &'static str, icon: &'static str, page: Page, audience: Audience) -> Self {
        Self {
            name,
            layout: ADMIN_LAYOUT,
            path,
            icon,
            page,
            hide_in_sidebar: false,
            audience,
        }
    }

    const fn auth(name: &'static str, path: &'static str, icon: &'static str, page: Page) -> Self {
        Self {
            name,
            layout: AUTH_LAYOUT,
            path,
            icon,
            page,
            hide_in_sidebar: true,
            audience: Audience::Everyone,
        }
    }

    pub fn full_path(&self) -> String {
        format!("{}{}", self.layout, self.path)
    }

    pub fn matches(&self, path: &str) -> bool {
        path.strip_prefix(self.layout)
            .map(|rest| rest.trim_end_matches('/') == self.path)
            .unwrap_or(false)
    }
}

static ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor::admin("Main Dashboard", "/default", "home", Page::MainDashboard, Audience::Admin),
    RouteDescriptor::admin("Teacher Dashboard", "/teacher-dashboard", "school", Page::TeacherDashboard, Audience::TeacherOrAdmin),
    RouteDescriptor::admin("Accountant Dashboard", "/accountant-dashboard", "calculator", Page::AccountantDashboard, Audience::AccountantOrAdmin),
    RouteDescriptor::admin("Students", "/students", "users", Page::Students, Audience::Admin),
    RouteDescriptor::admin("Users", "/users", "user-cog", Page::Users, Audience::Admin),
    RouteDescriptor::admin("Terminals", "/terminals", "terminal", Page::Terminals, Audience::Admin),
    RouteDescriptor::admin("Permissions", "/permissions", "key", Page::Permissions, Audience::Admin),
    RouteDescriptor::admin("ID Cards", "/id-cards", "id-card", Page::IdCards, Audience::Admin),
    RouteDescriptor::admin("Scan Terminal", "/scan", "qr-code", Page::ScanTerminal, Audience::AccountantOrAdmin),
    RouteDescriptor::admin("Record Payment", "/record-payment", "cash", Page::RecordPayment, Audience::TeacherOrAdmin),
    RouteDescriptor::admin("Pay Debt", "/pay-debt", "wallet", Page::PayDebt, Audience::TeacherOrAdmin),
    RouteDescriptor::admin("Credit Reports", "/credit-reports", "chart-bar", Page::CreditReports, Audience::AccountantOrAdmin),
    RouteDescriptor::admin("Entries", "/entries", "list", Page::Entries, Audience::AccountantOrAdmin),
    RouteDescriptor::admin("Profile", "/profile", "person", Page::Profile, Audience::Everyone),
    RouteDescriptor::auth("Sign In", "/sign-in", "lock", Page::SignIn),
    RouteDescriptor::auth("Sign Up", "/sign-up", "user-plus", Page::SignUp),
    RouteDescriptor::auth("Teacher Sign In", "/teacher-sign-in", "lock", Page::TeacherSignIn),
];

/// Every descriptor, regardless of role.
pub fn all_routes() -> &'static [RouteDescriptor] {
    ROUTES
}

/// Routes visible to `role`, in table order.
pub fn build_routes(role: Role) -> Vec<RouteDescriptor> {
    ROUTES
        .iter()
        .filter(|route| route.audience.admits(role))
        .cloned()
        .collect()
}

pub fn sidebar(routes: &[RouteDescriptor]) -> impl Iterator<Item = &RouteDescriptor> {
    routes.iter().filter(|route| !route.hide_in_sidebar)
}

pub fn find_route<'a>(routes: &'a [RouteDescriptor], path: &str) -> Option<&'a RouteDescriptor> {
    routes.iter().find(|route| route.matches(path))
}
