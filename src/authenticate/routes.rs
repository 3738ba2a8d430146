//! Requests the library answers itself: the OAuth begin and callback routes
//! and the two App Bridge pages.

use url::Url;

use crate::auth::cookies::{self, expired_state_cookies, session_cookies, STATE_COOKIE_NAME};
use crate::auth::oauth::{validate_auth_callback, AuthQuery, OAuthError, StateParam};
use crate::authenticate::{AuthError, AuthStrategy};
use crate::config::{ShopDomain, ShopifyConfig};
use crate::redirect::{decode_host, embedded_app_url, sanitize_shop, EXIT_IFRAME_PARAM};
use crate::request::RequestContext;
use crate::response::AuthResponse;
use crate::session_storage::SessionStorage;

/// Answers the request if it targets one of the library's routes.
///
/// Returns `Ok(None)` for every other path. The OAuth routes only exist
/// under the authorization-code strategy.
///
/// # Errors
///
/// - [`AuthError::InvalidShop`] for a missing or invalid `shop` on the
///   OAuth routes
/// - [`AuthError::InvalidCallback`] when the callback fails validation
/// - [`AuthError::InvalidExitIframeDestination`] for an off-site exit target
pub async fn handle_routes(
    config: &ShopifyConfig,
    storage: &dyn SessionStorage,
    request: &RequestContext,
) -> Result<Option<AuthResponse>, AuthError> {
    let paths = config.auth_paths();
    let path = request.path();

    if path == paths.patch_session_token_path() {
        config.logger().debug("Rendering bounce page", &[]);
        let shop = request.query_param("shop").and_then(sanitize_shop);
        return Ok(Some(AuthResponse::app_bridge_page(
            config,
            shop.as_ref(),
            None,
        )));
    }

    if path == paths.exit_iframe_path() {
        let destination = exit_iframe_destination(config, request)?;
        config.logger().debug(
            "Rendering exit iframe page",
            &[("destination", destination.as_str())],
        );
        let shop = request.query_param("shop").and_then(sanitize_shop);
        return Ok(Some(AuthResponse::app_bridge_page(
            config,
            shop.as_ref(),
            Some(&destination),
        )));
    }

    if AuthStrategy::for_config(config) != AuthStrategy::AuthCodeFlow {
        return Ok(None);
    }

    if path == paths.path() {
        let shop = required_shop(request)?;
        config
            .logger()
            .info("Handling OAuth begin request", &[("shop", shop.as_ref())]);
        return Ok(Some(AuthResponse::begin_auth(
            config,
            &shop,
            false,
            &StateParam::new(),
        )));
    }

    if path == paths.callback_path() {
        return handle_callback(config, storage, request).await.map(Some);
    }

    Ok(None)
}

fn required_shop(request: &RequestContext) -> Result<ShopDomain, AuthError> {
    let raw = request.query_param("shop").unwrap_or_default();
    sanitize_shop(raw).ok_or_else(|| AuthError::InvalidShop {
        shop: raw.to_string(),
    })
}

/// Resolves the `exitIframe` parameter against the app URL.
///
/// Only paths on the app and absolute URLs on the app's origin are allowed.
fn exit_iframe_destination(
    config: &ShopifyConfig,
    request: &RequestContext,
) -> Result<String, AuthError> {
    let raw = request.query_param(EXIT_IFRAME_PARAM).unwrap_or_default();
    let invalid = || AuthError::InvalidExitIframeDestination {
        destination: raw.to_string(),
    };

    let app_url = Url::parse(config.app_url().as_ref()).map_err(|_| invalid())?;
    let destination = app_url.join(raw).map_err(|_| invalid())?;

    if raw.is_empty() || destination.origin() != app_url.origin() {
        return Err(invalid());
    }
    Ok(destination.to_string())
}

async fn handle_callback(
    config: &ShopifyConfig,
    storage: &dyn SessionStorage,
    request: &RequestContext,
) -> Result<AuthResponse, AuthError> {
    let logger = config.logger();
    let shop = required_shop(request)?;
    let restart = || AuthResponse::begin_auth(config, &shop, false, &StateParam::new());

    let Some(expected_state) = cookies::read_signed(request.cookies(), STATE_COOKIE_NAME, config)
    else {
        let error = OAuthError::MissingStateCookie.to_string();
        logger.error(
            "Error during OAuth callback",
            &[("shop", shop.as_ref()), ("error", error.as_str())],
        );
        return Ok(restart());
    };

    let query = AuthQuery::from_pairs(request.query_pairs().iter().cloned());
    let session = match validate_auth_callback(config, &query, expected_state).await {
        Ok(session) => session,
        Err(error) => {
            let message = error.to_string();
            logger.error(
                "Error during OAuth callback",
                &[("shop", shop.as_ref()), ("error", message.as_str())],
            );
            return match error {
                OAuthError::StateMismatch { .. } | OAuthError::MissingStateCookie => Ok(restart()),
                OAuthError::InvalidHmac | OAuthError::InvalidCallback { .. } => {
                    Err(AuthError::InvalidCallback(error))
                }
                other => Err(AuthError::OAuth(other)),
            };
        }
    };

    storage.store_session(&session).await?;

    if config.use_online_tokens() && !session.is_online {
        logger.info(
            "Requesting online access token for offline session",
            &[("shop", shop.as_ref())],
        );
        return Ok(AuthResponse::begin_auth(
            config,
            &shop,
            true,
            &StateParam::new(),
        ));
    }

    logger.debug(
        "Request is valid, loaded session from OAuth callback",
        &[("shop", shop.as_ref()), ("sessionId", session.id.as_str())],
    );

    let host = request.query_param("host").unwrap_or_default();
    let location = if config.is_embedded() {
        let decoded = decode_host(host).ok_or_else(|| AuthError::InvalidRequest {
            reason: "OAuth callback is missing a valid host".to_string(),
        })?;
        embedded_app_url(config, &decoded)
    } else {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("shop", shop.as_ref())
            .append_pair("host", host)
            .finish();
        format!("/?{query}")
    };

    let mut response = AuthResponse::redirect(&location);
    for cookie in expired_state_cookies(config) {
        response = response.with_cookie(&cookie);
    }
    if !config.is_embedded() {
        for cookie in session_cookies(&session.id, session.expires, config) {
            response = response.with_cookie(&cookie);
        }
    }
    Ok(response)
}
