//! Pipeline steps shared by both authentication strategies.
//!
//! Each step either lets the request continue or ends it with a redirect,
//! expressed as [`ControlFlow`]. Hard failures are [`AuthError`]s.

use std::ops::ControlFlow;

use serde_json::Value;

use crate::auth::cookies::{self, SESSION_COOKIE_NAME};
use crate::auth::oauth::{refresh_access_token, JwtPayload, OAuthError};
use crate::auth::Session;
use crate::authenticate::{AuthError, Redirect};
use crate::clients::{GraphqlClient, GraphqlError, HttpError};
use crate::config::{FutureFlag, ShopDomain, ShopifyConfig};
use crate::redirect::{
    bounce_page_url, decode_host, embedded_app_url, exit_iframe_url, login_url, reauthorize_url,
    sanitize_host, sanitize_shop,
};
use crate::request::RequestContext;
use crate::session_storage::SessionStorage;

/// Cheapest Admin API query that proves an access token still works.
pub(crate) const SHOP_NAME_QUERY: &str = "query shopifyAppShopName { shop { name } }";

/// One step of the pipeline: continue with `T` or stop at a redirect.
pub(crate) type Step<T = ()> = Result<ControlFlow<Redirect, T>, AuthError>;

/// What the session token (or, outside the admin, the cookie) says about the
/// request.
#[derive(Debug, Default)]
pub(crate) struct SessionTokenContext {
    pub shop: Option<ShopDomain>,
    pub session_id: Option<String>,
    pub payload: Option<JwtPayload>,
    pub token: Option<String>,
}

/// Embedded apps only: `shop` and `host` must both be present and valid.
pub(crate) fn validate_shop_and_host(config: &ShopifyConfig, request: &RequestContext) -> Step {
    if !config.is_embedded() {
        return Ok(ControlFlow::Continue(()));
    }
    let logger = config.logger();

    let shop = request.query_param("shop").unwrap_or_default();
    if sanitize_shop(shop).is_none() {
        logger.debug(
            "Missing or invalid shop, redirecting to login path",
            &[("shop", shop)],
        );
        return redirect_to_login(config, request).map(ControlFlow::Break);
    }

    let host = request.query_param("host").unwrap_or_default();
    if sanitize_host(host).is_none() {
        logger.debug("Invalid host, redirecting to login path", &[("host", host)]);
        return redirect_to_login(config, request).map(ControlFlow::Break);
    }

    Ok(ControlFlow::Continue(()))
}

fn redirect_to_login(config: &ShopifyConfig, request: &RequestContext) -> Result<Redirect, AuthError> {
    let login_path = config.auth_paths().login_path();
    if request.path() == login_path {
        return Err(AuthError::CalledFromLoginPath {
            path: login_path.to_string(),
        });
    }
    Ok(Redirect::Login {
        url: login_url(config),
    })
}

/// Embedded apps loaded outside the admin are sent into it.
pub(crate) fn ensure_app_is_embedded_if_required(
    config: &ShopifyConfig,
    request: &RequestContext,
) -> Step {
    if !config.is_embedded() || request.is_embedded_request() {
        return Ok(ControlFlow::Continue(()));
    }

    let shop = request.query_param("shop").unwrap_or_default();
    config
        .logger()
        .debug("App is not embedded, redirecting to Shopify", &[("shop", shop)]);

    match request.query_param("host").and_then(decode_host) {
        Some(host) => Ok(ControlFlow::Break(Redirect::EmbeddedApp {
            url: embedded_app_url(config, &host),
        })),
        None => redirect_to_login(config, request).map(ControlFlow::Break),
    }
}

/// Embedded document requests without an `id_token` go through the bounce page.
pub(crate) fn ensure_session_token_search_param(
    config: &ShopifyConfig,
    request: &RequestContext,
) -> ControlFlow<Redirect> {
    let missing = config.is_embedded()
        && request.is_embedded_request()
        && request.query_param("id_token").is_none();

    if missing {
        let shop = request.query_param("shop").unwrap_or_default();
        config.logger().debug(
            "Missing session token in search params, going to bounce page",
            &[("shop", shop)],
        );
        return ControlFlow::Break(Redirect::BouncePage {
            url: bounce_page_url(config, request),
        });
    }
    ControlFlow::Continue(())
}

/// Document requests bounce for a new token; XHR requests get a `401`.
pub(crate) fn respond_to_invalid_session_token(
    config: &ShopifyConfig,
    request: &RequestContext,
    retry: bool,
) -> Result<Redirect, AuthError> {
    if request.is_xhr() {
        return Err(AuthError::InvalidSessionToken { retry });
    }
    Ok(Redirect::BouncePage {
        url: bounce_page_url(config, request),
    })
}

/// Works out the shop and the session id to load.
///
/// Embedded apps read them from the session token; other apps from the
/// `shop` parameter and the signed session cookie.
pub(crate) fn session_token_context(
    config: &ShopifyConfig,
    request: &RequestContext,
) -> Step<SessionTokenContext> {
    if !config.is_embedded() {
        return Ok(ControlFlow::Continue(SessionTokenContext {
            shop: request.query_param("shop").and_then(sanitize_shop),
            session_id: cookies::read_signed(request.cookies(), SESSION_COOKIE_NAME, config)
                .map(str::to_string),
            payload: None,
            token: None,
        }));
    }

    let logger = config.logger();
    let token = request
        .bearer_token()
        .or_else(|| request.query_param("id_token"));
    let Some(token) = token else {
        logger.debug("Missing session token", &[]);
        return respond_to_invalid_session_token(config, request, true).map(ControlFlow::Break);
    };

    let decoded = JwtPayload::decode(token, config)
        .and_then(|payload| payload.shop().map(|shop| (payload, shop)));
    let (payload, shop) = match decoded {
        Ok(decoded) => decoded,
        Err(error) => {
            let error = error.to_string();
            logger.debug("Failed to validate session token", &[("error", error.as_str())]);
            return respond_to_invalid_session_token(config, request, true).map(ControlFlow::Break);
        }
    };

    let session_id = if config.use_online_tokens() {
        let Some(user_id) = payload.user_id() else {
            logger.debug("Session token has no user, cannot load online session", &[]);
            return respond_to_invalid_session_token(config, request, true).map(ControlFlow::Break);
        };
        Session::online_id(&shop, user_id)
    } else {
        Session::offline_id(&shop)
    };

    logger.debug(
        "Session token is valid",
        &[("shop", shop.as_ref()), ("sessionId", session_id.as_str())],
    );

    Ok(ControlFlow::Continue(SessionTokenContext {
        shop: Some(shop),
        session_id: Some(session_id),
        payload: Some(payload),
        token: Some(token.to_string()),
    }))
}

/// Where to send a request whose session is missing or no longer usable.
pub(crate) fn redirect_to_auth_page(
    config: &ShopifyConfig,
    request: &RequestContext,
    shop: &ShopDomain,
) -> Redirect {
    if request.is_xhr() {
        Redirect::Reauthorize {
            url: reauthorize_url(config, shop),
        }
    } else if request.is_embedded_request() {
        Redirect::ExitIframe {
            url: exit_iframe_url(config, request, shop),
        }
    } else {
        Redirect::BeginAuth {
            shop: shop.clone(),
            is_online: config.use_online_tokens(),
        }
    }
}

/// Loads a session, refreshing an expired offline token when the app opted
/// into expiring offline tokens.
///
/// A failed refresh is logged and the stale session returned, so the caller
/// treats it as inactive.
pub(crate) async fn load_session(
    config: &ShopifyConfig,
    storage: &dyn SessionStorage,
    id: &str,
) -> Result<Option<Session>, AuthError> {
    let Some(session) = storage.load_session(id).await? else {
        return Ok(None);
    };

    if !config.is_enabled(FutureFlag::ExpiringOfflineAccessTokens) || !session.is_refreshable() {
        return Ok(Some(session));
    }
    let Some(refresh_token) = session.refresh_token.as_deref() else {
        return Ok(Some(session));
    };

    let logger = config.logger();
    let shop = session.shop.as_ref();
    logger.debug("Offline access token expired, refreshing", &[("shop", shop)]);

    match refresh_access_token(config, &session.shop, refresh_token).await {
        Ok(mut refreshed) => {
            refreshed.id.clone_from(&session.id);
            refreshed.state.clone_from(&session.state);
            storage.store_session(&refreshed).await?;
            logger.info("Refreshed expired offline access token", &[("shop", shop)]);
            Ok(Some(refreshed))
        }
        Err(error) => {
            let error = error.to_string();
            logger.warning(
                "Failed to refresh offline access token",
                &[("shop", shop), ("error", error.as_str())],
            );
            Ok(Some(session))
        }
    }
}

/// Runs the shop-name query to check that an offline token still works.
///
/// A `401` means the app was uninstalled or the token revoked, and restarts
/// OAuth. Any other failure is logged and surfaces as an error.
pub(crate) async fn validate_offline_session(
    config: &ShopifyConfig,
    session: &Session,
    shop: &ShopDomain,
) -> Step {
    let logger = config.logger();
    let client = GraphqlClient::new(session, Some(config));

    let (status, message) = match client.query(SHOP_NAME_QUERY, None, None).await {
        Ok(response) => match response.body.get("errors") {
            None | Some(Value::Null) => return Ok(ControlFlow::Continue(())),
            Some(_) => {
                let message = error_message(&response.body);
                log_validation_error(config, shop, &message);
                return Err(AuthError::MalformedUpstreamResponse { message });
            }
        },
        Err(GraphqlError::Http(HttpError::Response(error))) if error.code == 401 => {
            logger.info(
                "Failed to validate offline session, redirecting to OAuth",
                &[("shop", shop.as_ref())],
            );
            return Ok(ControlFlow::Break(Redirect::BeginAuth {
                shop: shop.clone(),
                is_online: false,
            }));
        }
        Err(GraphqlError::Http(HttpError::Response(error))) => {
            let body = serde_json::from_str(&error.message)
                .unwrap_or_else(|_| Value::String(error.message.clone()));
            (error.code, error_message(&body))
        }
        Err(other) => (500, other.to_string()),
    };

    log_validation_error(config, shop, &message);
    Err(AuthError::Upstream { status, message })
}

fn log_validation_error(config: &ShopifyConfig, shop: &ShopDomain, message: &str) {
    config.logger().error(
        &format!("Unexpected error during session validation: {message}"),
        &[("shop", shop.as_ref())],
    );
}

/// Extracts a readable message from an upstream error body.
///
/// `{"errors": [{"message": ..}, ..]}` yields the messages joined with `"; "`;
/// anything else is rendered as JSON.
pub(crate) fn error_message(body: &Value) -> String {
    let messages: Option<Vec<&str>> = body
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
        .and_then(|errors| {
            errors
                .iter()
                .map(|error| error.get("message").and_then(Value::as_str))
                .collect()
        });

    match messages {
        Some(messages) => messages.join("; "),
        None => match body {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        },
    }
}

/// Maps a session-token rejection from token exchange onto the
/// invalid-token response; other errors pass through.
pub(crate) fn recover_invalid_jwt(
    config: &ShopifyConfig,
    request: &RequestContext,
    error: AuthError,
) -> Result<Redirect, AuthError> {
    match error {
        AuthError::OAuth(OAuthError::InvalidJwt { reason }) => {
            config
                .logger()
                .debug("Session token was rejected", &[("error", reason.as_str())]);
            respond_to_invalid_session_token(config, request, true)
        }
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_joins_graphql_messages() {
        let body = json!({"errors": [{"message": "First"}, {"message": "Second"}]});
        assert_eq!(error_message(&body), "First; Second");
    }

    #[test]
    fn test_error_message_falls_back_to_json() {
        let body = json!({"errors": ["Something went wrong!"]});
        assert_eq!(error_message(&body), r#"{"errors":["Something went wrong!"]}"#);
    }

    #[test]
    fn test_error_message_keeps_raw_strings() {
        assert_eq!(
            error_message(&Value::String("upstream down".to_string())),
            "upstream down"
        );
    }

    #[test]
    fn test_error_message_without_errors_key() {
        let body = json!({"raw_body": "<html>"});
        assert_eq!(error_message(&body), r#"{"raw_body":"<html>"}"#);
    }
}
