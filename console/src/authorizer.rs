use common_auth::AuthState;

pub const SIGN_IN_PATH: &str = "/auth/sign-in";
pub const TEACHER_SIGN_IN_PATH: &str = "/auth/teacher-sign-in";
pub const ADMIN_HOME_PATH: &str = "/admin/default";
pub const TEACHER_HOME_PATH: &str = "/admin/teacher-dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Children,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Render(View),
    RedirectTo(&'static str),
}

/// Decide what a protected outlet shows for `path`.
///
/// The sign-in bounces do not look at the role: an authenticated teacher on
/// `/auth/sign-in` still lands on the admin dashboard route.
pub fn authorize(state: AuthState, path: &str) -> Action {
    match state {
        AuthState::Pending => Action::Render(View::Loading),
        AuthState::Unauthenticated if path.contains("teacher") => {
            Action::RedirectTo(TEACHER_SIGN_IN_PATH)
        }
        AuthState::Unauthenticated => Action::RedirectTo(SIGN_IN_PATH),
        AuthState::Authenticated if path == SIGN_IN_PATH => Action::RedirectTo(ADMIN_HOME_PATH),
        AuthState::Authenticated if path == TEACHER_SIGN_IN_PATH => {
            Action::RedirectTo(TEACHER_HOME_PATH)
        }
        AuthState::Authenticated => Action::Render(View::Children),
    }
}
