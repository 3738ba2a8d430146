//! Admin request authentication.
//!
//! [`authenticate`] decides, for one incoming request, whether it carries a
//! usable session or where the client must go first. It never writes a
//! response itself; callers turn the [`AuthDecision`] (or the [`AuthError`])
//! into an [`AuthResponse`](crate::response::AuthResponse).
//!
//! Document requests (no `Authorization` header) run through these steps,
//! stopping at the first redirect:
//!
//! 1. embedded apps need valid `shop` and `host` parameters, else login
//! 2. the shop must have an offline session (authorization-code strategy
//!    only), and embedded apps loaded outside the admin get that session
//!    checked against the Admin API
//! 3. embedded apps loaded outside the admin are sent into it
//! 4. embedded requests without an `id_token` go through the bounce page
//!
//! Every request then resolves its session from the session token (embedded
//! apps) or the signed session cookie (other apps). What happens when that
//! session is missing or inactive depends on the [`AuthStrategy`].

mod auth_code_flow;
mod decision;
mod error;
mod helpers;
mod routes;
mod token_exchange_flow;

use std::ops::ControlFlow;

use crate::config::{FutureFlag, ShopifyConfig};
use crate::request::RequestContext;
use crate::session_storage::SessionStorage;

pub use decision::{AdminContext, AuthDecision, Redirect};
pub use error::AuthError;
pub use routes::handle_routes;

/// How sessions are obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStrategy {
    /// OAuth authorization-code grant through `/auth` and `/auth/callback`.
    AuthCodeFlow,
    /// Session tokens are exchanged for access tokens. Embedded apps only.
    TokenExchange,
}

impl AuthStrategy {
    /// Picks the strategy for `config`.
    ///
    /// Token exchange needs an embedded app and
    /// [`FutureFlag::NewEmbeddedAuthStrategy`].
    #[must_use]
    pub fn for_config(config: &ShopifyConfig) -> Self {
        if config.is_embedded() && config.is_enabled(FutureFlag::NewEmbeddedAuthStrategy) {
            Self::TokenExchange
        } else {
            Self::AuthCodeFlow
        }
    }
}

/// Authenticates an admin request.
///
/// The OAuth and App Bridge routes are not handled here; see
/// [`handle_routes`].
///
/// # Errors
///
/// Returns an [`AuthError`] when the request cannot be authenticated and no
/// redirect can recover, e.g. the shop is unknown, the Admin API failed, or
/// an XHR request carried an invalid session token.
pub async fn authenticate(
    config: &ShopifyConfig,
    storage: &dyn SessionStorage,
    request: &RequestContext,
) -> Result<AuthDecision, AuthError> {
    let strategy = AuthStrategy::for_config(config);
    config.logger().info(
        "Authenticating admin request",
        &[("path", request.path())],
    );

    if !request.is_xhr() {
        if let ControlFlow::Break(redirect) = helpers::validate_shop_and_host(config, request)? {
            return Ok(AuthDecision::Redirect(redirect));
        }
        if strategy == AuthStrategy::AuthCodeFlow {
            if let ControlFlow::Break(redirect) =
                auth_code_flow::ensure_installed_on_shop(config, storage, request).await?
            {
                return Ok(AuthDecision::Redirect(redirect));
            }
        }
        if let ControlFlow::Break(redirect) =
            helpers::ensure_app_is_embedded_if_required(config, request)?
        {
            return Ok(AuthDecision::Redirect(redirect));
        }
        if let ControlFlow::Break(redirect) =
            helpers::ensure_session_token_search_param(config, request)
        {
            return Ok(AuthDecision::Redirect(redirect));
        }
    }

    let context = match helpers::session_token_context(config, request)? {
        ControlFlow::Continue(context) => context,
        ControlFlow::Break(redirect) => return Ok(AuthDecision::Redirect(redirect)),
    };

    match strategy {
        AuthStrategy::AuthCodeFlow => {
            auth_code_flow::authenticate_session(config, storage, request, context).await
        }
        AuthStrategy::TokenExchange => {
            token_exchange_flow::authenticate_session(config, storage, request, context).await
        }
    }
}
