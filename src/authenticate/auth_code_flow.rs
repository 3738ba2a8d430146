//! The authorization-code strategy.
//!
//! Sessions are created by the OAuth callback. Requests without a usable
//! session are sent back through `/auth`, either directly or through the
//! exit-iframe page when they arrive inside the admin.

use std::ops::ControlFlow;

use crate::auth::cookies::{self, SESSION_COOKIE_NAME};
use crate::auth::Session;
use crate::authenticate::helpers::{
    load_session, redirect_to_auth_page, validate_offline_session, SessionTokenContext, Step,
};
use crate::authenticate::{AdminContext, AuthDecision, AuthError, Redirect};
use crate::config::ShopifyConfig;
use crate::redirect::{exit_iframe_url, sanitize_shop};
use crate::request::RequestContext;
use crate::session_storage::SessionStorage;

/// Makes sure the shop has an offline session before anything else.
///
/// The shop comes from the `shop` parameter or, failing that, from the
/// signed session cookie. Embedded apps loaded outside the admin also get
/// their offline token checked against the Admin API.
pub(crate) async fn ensure_installed_on_shop(
    config: &ShopifyConfig,
    storage: &dyn SessionStorage,
    request: &RequestContext,
) -> Step {
    let logger = config.logger();
    let shop = match request.query_param("shop") {
        Some(raw) => Some(sanitize_shop(raw).ok_or_else(|| AuthError::InvalidShop {
            shop: raw.to_string(),
        })?),
        None => None,
    };

    logger.debug(
        "Ensuring app is installed on shop",
        &[("shop", shop.as_ref().map_or("", AsRef::as_ref))],
    );

    let offline_id = match &shop {
        Some(shop) => Session::offline_id(shop),
        None => cookies::read_signed(request.cookies(), SESSION_COOKIE_NAME, config)
            .map(str::to_string)
            .ok_or(AuthError::MissingShop)?,
    };

    let Some(offline_session) = load_session(config, storage, &offline_id).await? else {
        let shop = shop.ok_or(AuthError::MissingShop)?;
        logger.info(
            "Could not find a shop, can't authenticate request",
            &[("shop", shop.as_ref())],
        );
        if request.is_embedded_request() {
            return Ok(ControlFlow::Break(Redirect::ExitIframe {
                url: exit_iframe_url(config, request, &shop),
            }));
        }
        return Ok(ControlFlow::Break(Redirect::BeginAuth {
            shop,
            is_online: false,
        }));
    };

    let shop = shop.unwrap_or_else(|| offline_session.shop.clone());

    if config.is_embedded() && !request.is_embedded_request() {
        logger.debug(
            "Ensuring offline session is valid before embedding",
            &[("shop", shop.as_ref())],
        );
        if let ControlFlow::Break(redirect) =
            validate_offline_session(config, &offline_session, &shop).await?
        {
            return Ok(ControlFlow::Break(redirect));
        }
        logger.debug("Offline session is still valid", &[("shop", shop.as_ref())]);
    }

    logger.info("App is installed and ready to load", &[("shop", shop.as_ref())]);
    Ok(ControlFlow::Continue(()))
}

/// Loads the request's session and decides whether it may proceed.
pub(crate) async fn authenticate_session(
    config: &ShopifyConfig,
    storage: &dyn SessionStorage,
    request: &RequestContext,
    context: SessionTokenContext,
) -> Result<AuthDecision, AuthError> {
    let logger = config.logger();
    let session = match &context.session_id {
        Some(id) => load_session(config, storage, id).await?,
        None => None,
    };

    match session {
        Some(session) if session.is_active(config.scopes()) => {
            logger.debug(
                "Found a valid session",
                &[("shop", session.shop.as_ref()), ("sessionId", session.id.as_str())],
            );
            Ok(AuthDecision::Proceed(AdminContext::new(
                config,
                session,
                context.payload,
            )))
        }
        Some(session) => {
            logger.debug(
                "Found a session, but it is not valid. Redirecting to auth page",
                &[("shop", session.shop.as_ref()), ("sessionId", session.id.as_str())],
            );
            let shop = context.shop.unwrap_or(session.shop);
            Ok(AuthDecision::Redirect(redirect_to_auth_page(
                config, request, &shop,
            )))
        }
        None => {
            let shop = context.shop.ok_or(AuthError::MissingShop)?;
            logger.debug(
                "No session found, redirecting to auth page",
                &[("shop", shop.as_ref())],
            );
            Ok(AuthDecision::Redirect(redirect_to_auth_page(
                config, request, &shop,
            )))
        }
    }
}
