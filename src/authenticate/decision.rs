//! Outcome of authenticating an admin request.

use crate::auth::oauth::JwtPayload;
use crate::auth::Session;
use crate::clients::GraphqlClient;
use crate::config::{ShopDomain, ShopifyConfig};

/// What to do with an admin request.
#[derive(Debug)]
pub enum AuthDecision {
    /// The request is authenticated; serve it.
    Proceed(AdminContext),
    /// Send the client elsewhere first.
    Redirect(Redirect),
}

impl AuthDecision {
    /// Returns the redirect, if this is one.
    #[must_use]
    pub const fn as_redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Redirect(redirect) => Some(redirect),
            Self::Proceed(_) => None,
        }
    }

    /// Returns the admin context, if the request may proceed.
    #[must_use]
    pub fn into_context(self) -> Option<AdminContext> {
        match self {
            Self::Proceed(context) => Some(context),
            Self::Redirect(_) => None,
        }
    }
}

/// A redirect chosen by the authentication flow.
///
/// Apart from [`Redirect::BeginAuth`], every variant carries its final URL.
/// Begin-auth URLs embed a state nonce, which is drawn when the redirect is
/// turned into a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Redirect {
    /// Start the authorization code flow at the shop's OAuth endpoint.
    BeginAuth {
        /// The shop to authorize.
        shop: ShopDomain,
        /// Whether to request an online token.
        is_online: bool,
    },
    /// Break out of the admin iframe through the exit-iframe page.
    ExitIframe {
        /// `{exit_iframe_path}?...`
        url: String,
    },
    /// Load App Bridge to obtain a fresh session token, then reload.
    BouncePage {
        /// `{patch_session_token_path}?...&shopify-reload=...`
        url: String,
    },
    /// Open the app inside the Shopify admin.
    EmbeddedApp {
        /// `https://{host}/apps/{api_key}`
        url: String,
    },
    /// Go to the login page.
    Login {
        /// The login path.
        url: String,
    },
    /// Tell an XHR client to re-authorize: `401` with reauthorize headers.
    Reauthorize {
        /// `{app_url}{auth.path}?shop={shop}`
        url: String,
    },
}

/// An authenticated admin request.
#[derive(Debug)]
pub struct AdminContext {
    /// The session the request is authenticated with.
    pub session: Session,
    /// The decoded session token, for embedded apps.
    pub session_token: Option<JwtPayload>,
    admin: GraphqlClient,
}

impl AdminContext {
    /// Creates a context with an Admin API client for `session`.
    #[must_use]
    pub fn new(config: &ShopifyConfig, session: Session, session_token: Option<JwtPayload>) -> Self {
        let admin = GraphqlClient::new(&session, Some(config));
        Self {
            session,
            session_token,
            admin,
        }
    }

    /// Returns the Admin GraphQL client for the session's shop.
    #[must_use]
    pub const fn admin(&self) -> &GraphqlClient {
        &self.admin
    }
}
