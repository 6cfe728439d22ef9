//! Users backend API helpers.
//!
//! One async function per endpoint. They are called from commands and never
//! touch `StateCtx`; callers map the result into compute updates.
//!
//! Every request carries `Authorization: Bearer <token>` when the config has
//! a token. Non-2xx responses become [`UsersApiError::Status`] with the
//! server's message when the body has one.

use log::{debug, trace};
use serde::Serialize;
use serde_json::{Value, json};

use super::envelope::{self, PLAN_LIST, USER_DETAIL};
use super::error::{UsersApiError, server_message};
use super::model::{FilterCriteria, Plan, SessionLimit, UserPage, UserRecord, UserStatus, UserUpdate};
use crate::config::BusinessConfig;
use crate::http::{Client, RequestBuilder, Response};

pub type ApiResult<T> = Result<T, UsersApiError>;

/// `{base}/users/{id}/{tail...}` with the id percent-encoded as one segment.
fn user_url(config: &BusinessConfig, id: &str, tail: &[&str]) -> ApiResult<String> {
    let mut url = reqwest::Url::parse(&config.endpoint("/users"))
        .map_err(|e| UsersApiError::Encode(format!("invalid API base URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| UsersApiError::Encode("API base URL cannot carry a path".to_owned()))?
        .push(id)
        .extend(tail);
    Ok(url.into())
}

fn with_json<T: Serialize>(request: RequestBuilder, body: &T) -> ApiResult<RequestBuilder> {
    request
        .json(body)
        .map_err(|e| UsersApiError::Encode(format!("failed to serialize request: {e}")))
}

async fn send(request: RequestBuilder, config: &BusinessConfig) -> ApiResult<Response> {
    let method = request.method();
    let url = request.url().to_owned();
    trace!("{} {url}", method.as_str());

    let response = request
        .bearer(config.api_token())
        .send()
        .await
        .map_err(|e| UsersApiError::Transport(e.to_string()))?;

    if !response.is_success() {
        debug!("{} {url} -> {}", method.as_str(), response.status);
        return Err(UsersApiError::Status {
            status: response.status,
            message: server_message(&response.body),
        });
    }

    Ok(response)
}

fn body_json(response: &Response, what: &'static str) -> ApiResult<Value> {
    response.json().map_err(|e| UsersApiError::Decode {
        what,
        reason: e.to_string(),
    })
}

/// GET `/users?page=&limit=[&filter=]`
///
/// `filter` is omitted entirely when every criterion is blank.
pub async fn list_users(
    config: &BusinessConfig,
    page: u32,
    limit: u32,
    filters: &FilterCriteria,
) -> ApiResult<UserPage> {
    let mut request = Client::get(config.endpoint("/users"))
        .query("page", page)
        .query("limit", limit);
    if let Some(filter) = filters.to_query_value() {
        request = request.query("filter", filter);
    }

    let response = send(request, config).await?;
    let body = body_json(&response, "user list")?;
    Ok(envelope::aggregation_page(&body))
}

/// GET `/users/detail?id=`
pub async fn get_user(config: &BusinessConfig, id: &str) -> ApiResult<UserRecord> {
    let request = Client::get(config.endpoint("/users/detail")).query("id", id);
    let response = send(request, config).await?;
    let body = body_json(&response, "user detail")?;
    envelope::extract(&body, USER_DETAIL)
}

/// PUT `/users/{id}`
pub async fn update_user(config: &BusinessConfig, id: &str, update: &UserUpdate) -> ApiResult<()> {
    let request = with_json(Client::put(user_url(config, id, &[])?), update)?;
    send(request, config).await.map(drop)
}

/// PUT `/users/{id}/status` with `{"status": bool}`
pub async fn set_status(config: &BusinessConfig, id: &str, status: UserStatus) -> ApiResult<()> {
    let request = with_json(
        Client::put(user_url(config, id, &["status"])?),
        &json!({ "status": status }),
    )?;
    send(request, config).await.map(drop)
}

/// PUT `/users/{id}/password` with `{"password": ...}`
pub async fn reset_password(config: &BusinessConfig, id: &str, password: &str) -> ApiResult<()> {
    let request = with_json(
        Client::put(user_url(config, id, &["password"])?),
        &json!({ "password": password }),
    )?;
    send(request, config).await.map(drop)
}

/// POST `/users/{id}/wallet` with a signed `amount` (negative debits).
pub async fn adjust_wallet(config: &BusinessConfig, id: &str, amount: i64) -> ApiResult<()> {
    let request = with_json(
        Client::post(user_url(config, id, &["wallet"])?),
        &json!({ "amount": amount }),
    )?;
    send(request, config).await.map(drop)
}

/// POST `/users/{id}/plan` with `{"planId": ...}`
pub async fn assign_plan(config: &BusinessConfig, id: &str, plan_id: &str) -> ApiResult<()> {
    let request = with_json(
        Client::post(user_url(config, id, &["plan"])?),
        &json!({ "planId": plan_id }),
    )?;
    send(request, config).await.map(drop)
}

/// DELETE `/users/{id}/plan`
pub async fn unassign_plan(config: &BusinessConfig, id: &str) -> ApiResult<()> {
    let request = Client::delete(user_url(config, id, &["plan"])?);
    send(request, config).await.map(drop)
}

/// PUT `/users/{id}/limits` with `{"isLimit": bool, "allowedSessions": n}`
pub async fn set_limits(config: &BusinessConfig, id: &str, limit: SessionLimit) -> ApiResult<()> {
    let (is_limit, allowed_sessions) = limit.to_wire();
    let request = with_json(
        Client::put(user_url(config, id, &["limits"])?),
        &json!({ "isLimit": is_limit, "allowedSessions": allowed_sessions }),
    )?;
    send(request, config).await.map(drop)
}

/// POST `/users/{id}/request-update`
pub async fn request_device_update(config: &BusinessConfig, id: &str) -> ApiResult<()> {
    let request = Client::post(user_url(config, id, &["request-update"])?);
    send(request, config).await.map(drop)
}

/// POST `/users/request-update`, broadcast to every device.
pub async fn request_all_devices_update(config: &BusinessConfig) -> ApiResult<()> {
    let request = Client::post(config.endpoint("/users/request-update"));
    send(request, config).await.map(drop)
}

/// GET `/plans[?search=]`
pub async fn list_plans(config: &BusinessConfig, search: Option<&str>) -> ApiResult<Vec<Plan>> {
    let mut request = Client::get(config.endpoint("/plans"));
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        request = request.query("search", term);
    }

    let response = send(request, config).await?;
    let body = body_json(&response, "plan list")?;
    envelope::extract(&body, PLAN_LIST)
}
