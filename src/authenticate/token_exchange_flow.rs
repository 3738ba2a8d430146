//! The token-exchange strategy for embedded apps.
//!
//! There are no OAuth redirects: when the session is missing or unusable,
//! the session token the request carries is exchanged for access tokens.

use crate::auth::oauth::{exchange_offline_token, exchange_online_token, OAuthError};
use crate::auth::{AuthScopes, Session};
use crate::authenticate::helpers::{load_session, recover_invalid_jwt, SessionTokenContext};
use crate::authenticate::{AdminContext, AuthDecision, AuthError};
use crate::config::{ShopDomain, ShopifyConfig};
use crate::request::RequestContext;
use crate::session_storage::SessionStorage;

/// Loads the request's session, exchanging the session token for a new one
/// when needed.
pub(crate) async fn authenticate_session(
    config: &ShopifyConfig,
    storage: &dyn SessionStorage,
    request: &RequestContext,
    context: SessionTokenContext,
) -> Result<AuthDecision, AuthError> {
    let logger = config.logger();
    let (Some(shop), Some(token)) = (context.shop, context.token.as_deref()) else {
        return Err(AuthError::InvalidSessionToken { retry: true });
    };

    let session = match &context.session_id {
        Some(id) => load_session(config, storage, id).await?,
        None => None,
    };

    // Granted scopes are managed by Shopify under token exchange.
    if let Some(session) = session.filter(|s| s.is_active(&AuthScopes::new())) {
        logger.debug(
            "Found a valid session",
            &[("shop", shop.as_ref()), ("sessionId", session.id.as_str())],
        );
        return Ok(AuthDecision::Proceed(AdminContext::new(
            config,
            session,
            context.payload,
        )));
    }

    logger.info("No valid session found", &[("shop", shop.as_ref())]);

    let session = match exchange_and_store(config, storage, &shop, token).await {
        Ok(session) => session,
        Err(error) => {
            if !matches!(error, AuthError::OAuth(OAuthError::InvalidJwt { .. })) {
                let message = error.to_string();
                logger.error(
                    "Failed to exchange session token",
                    &[("shop", shop.as_ref()), ("error", message.as_str())],
                );
            }
            return recover_invalid_jwt(config, request, error).map(AuthDecision::Redirect);
        }
    };

    logger.debug(
        "Request is valid, loaded session from session token",
        &[
            ("shop", shop.as_ref()),
            ("isOnline", if session.is_online { "true" } else { "false" }),
        ],
    );
    Ok(AuthDecision::Proceed(AdminContext::new(
        config,
        session,
        context.payload,
    )))
}

/// Exchanges for an offline token, and an online one if the app uses online
/// tokens, storing each. Returns the session the request should use.
async fn exchange_and_store(
    config: &ShopifyConfig,
    storage: &dyn SessionStorage,
    shop: &ShopDomain,
    token: &str,
) -> Result<Session, AuthError> {
    let logger = config.logger();

    logger.info("Requesting offline access token", &[("shop", shop.as_ref())]);
    let offline = exchange_offline_token(config, shop, token).await?;
    storage.store_session(&offline).await?;

    if !config.use_online_tokens() {
        return Ok(offline);
    }

    logger.info("Requesting online access token", &[("shop", shop.as_ref())]);
    let online = exchange_online_token(config, shop, token).await?;
    storage.store_session(&online).await?;

    Ok(online)
}
