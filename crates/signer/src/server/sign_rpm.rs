//! `/sign_rpm`: sign an uploaded RPM with a named key.

use axum::{
    Extension,
    extract::{Query, Request, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use eyre::{WrapErr, eyre};
use futures::StreamExt;

use super::AppState;
use crate::audit::AuditRecord;
use crate::auth::{ClientIdentity, client_ip};
use crate::error::ServerError;
use crate::rpm::SigningInfo;

pub(crate) async fn sign_rpm_handler(
    State(state): State<AppState>,
    Extension(client): Extension<ClientIdentity>,
    request: Request,
) -> Response {
    serve_sign_rpm(&state, &client, request).await
}

/// Runs one signing request to completion and renders the outcome.
///
/// `client` is the identity established by the authentication layer and
/// is trusted as-is. The response is fully built before it is returned.
pub async fn serve_sign_rpm(state: &AppState, client: &ClientIdentity, request: Request) -> Response {
    match sign_rpm(state, client, request).await {
        Ok(info) => (StatusCode::OK, info.dump()).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn sign_rpm(
    state: &AppState,
    client: &ClientIdentity,
    request: Request,
) -> Result<SigningInfo, ServerError> {
    if request.method() != Method::POST {
        return Err(ServerError::MethodNotAllowed);
    }
    let key_name = query_param(request.uri(), "key")
        .filter(|key| !key.is_empty())
        .ok_or(ServerError::MissingParameter("key"))?;
    let client_ip = client_ip(&request);

    if !state.policy.allowed(client.as_str(), &key_name) {
        state.audit.record(AuditRecord::AccessDenied {
            client: client.to_string(),
            client_ip,
            key: key_name,
        });
        return Err(ServerError::AccessDenied);
    }

    let info = match sign_with_key(state, &key_name, request).await {
        Ok(info) => info,
        Err(err) => {
            if err.is_internal() {
                state.audit.record(AuditRecord::SignFailed {
                    client: client.to_string(),
                    client_ip,
                    key: key_name,
                    error: format!("{err:#}"),
                });
            }
            return Err(err);
        }
    };

    let info = info.with_identity(key_name, client.as_str(), client_ip);
    state.audit.record(AuditRecord::Signed(info.clone()));
    Ok(info)
}

async fn sign_with_key(
    state: &AppState,
    key_name: &str,
    request: Request,
) -> Result<SigningInfo, ServerError> {
    // The policy only grants access to configured keys, so a miss here
    // means the key map and policy were built from different sources.
    let handle = state
        .keys
        .lookup(key_name)
        .ok_or_else(|| eyre!("key {key_name} passed the access check but is not loaded"))?;
    let key = state
        .decoder
        .decode(handle)
        .wrap_err_with(|| format!("decoding token for key {key_name}"))?;

    let body = request.into_body().into_data_stream().boxed();
    Ok(state.signer.sign(body, key.as_ref()).await?)
}

/// First value of `name` in the query string. Repeated parameters are
/// not an error; later values are ignored.
fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}
