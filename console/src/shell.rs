use std::sync::Arc;
use std::time::Duration;

use common_auth::{AuthGuard, AuthState, ClaimsResolver, DecodedClaims, Role, TokenStore};
use tracing::info;

use crate::api::Backend;
use crate::authorizer::{authorize, Action, View};
use crate::error::BackendResult;
use crate::models::{Credentials, SignInKind};
use crate::routes::{build_routes, find_route, sidebar, Audience, RouteDescriptor, AUTH_LAYOUT};

/// Result of resolving a path inside the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Loading,
    Page(RouteDescriptor),
    Redirect(&'static str),
    NotFound,
}

/// Session-aware application shell: owns the route table for the current
/// role and hands out auth guards for protected views.
pub struct AppShell {
    resolver: ClaimsResolver,
    backend: Arc<dyn Backend>,
    settle_delay: Duration,
    role: Role,
    routes: Vec<RouteDescriptor>,
}

impl AppShell {
    pub fn new(store: TokenStore, backend: Arc<dyn Backend>, settle_delay: Duration) -> Self {
        let resolver = ClaimsResolver::new(store);
        let role = resolver.role();
        Self {
            resolver,
            backend,
            settle_delay,
            role,
            routes: build_routes(role),
        }
    }

    pub fn store(&self) -> &TokenStore {
        self.resolver.store()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn sidebar(&self) -> Vec<&RouteDescriptor> {
        sidebar(&self.routes).collect()
    }

    pub fn claims(&self) -> Option<DecodedClaims> {
        self.resolver.resolve()
    }

    /// Re-derive the role and route table from the stored session.
    pub fn refresh(&mut self) -> Role {
        let role = self.resolver.role();
        if role != self.role {
            info!(from = %self.role, to = %role, "session role changed");
        }
        self.role = role;
        self.routes = build_routes(role);
        role
    }

    pub async fn sign_in(&mut self, kind: SignInKind, credentials: &Credentials) -> BackendResult<Role> {
        let blob = self.backend.login(kind, credentials).await?;
        self.store().write(&blob)?;
        let role = self.refresh();
        info!(?kind, role = %role, "signed in");
        Ok(role)
    }

    pub fn sign_out(&mut self) -> BackendResult<()> {
        self.store().clear()?;
        self.refresh();
        info!("signed out");
        Ok(())
    }

    /// Start a guard for a protected view. Requires a tokio runtime.
    pub fn mount_guard(&self) -> AuthGuard {
        AuthGuard::mount(self.store().clone(), self.settle_delay)
    }

    /// Resolve `path` under the given guard state.
    ///
    /// Pages under the `/auth` layout that admit everyone (sign in, sign up,
    /// teacher sign in) render for unauthenticated visitors instead of
    /// bouncing to a sign-in page.
    pub fn navigate(&self, state: AuthState, path: &str) -> Navigation {
        if state == AuthState::Unauthenticated {
            if let Some(route) = self.public_auth_route(path) {
                return Navigation::Page(route.clone());
            }
        }

        match authorize(state, path) {
            Action::Render(View::Loading) => Navigation::Loading,
            Action::RedirectTo(target) => Navigation::Redirect(target),
            Action::Render(View::Children) => find_route(&self.routes, path)
                .cloned()
                .map(Navigation::Page)
                .unwrap_or(Navigation::NotFound),
        }
    }

    fn public_auth_route(&self, path: &str) -> Option<&RouteDescriptor> {
        find_route(&self.routes, path)
            .filter(|route| route.layout == AUTH_LAYOUT && route.audience == Audience::Everyone)
    }

    /// School of the signed-in user: the token claim, else the profile the
    /// login response stored next to it.
    pub fn school_id(&self) -> Option<String> {
        self.claims()
            .and_then(|claims| claims.school_id)
            .or_else(|| self.store().read()?.user?.school_id)
    }
}
