//! Test utilities for business layer testing with mock servers.
//!
//! ```ignore
//! let mut test_ctx = TestContext::new().await;
//! test_ctx.mock_user_list(vec![sample_user("u1")], 1).await;
//!
//! panel::refresh_users(&mut test_ctx.ctx);
//! test_ctx.flush_and_wait().await;
//!
//! assert_eq!(test_ctx.ctx.compute::<UserListCompute>().records().len(), 1);
//! ```

use std::time::Duration;

use keeper_states::StateCtx;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::BusinessConfig;
use crate::users::panel;

/// Mock server plus a context wired to it.
pub struct TestContext {
    pub mock_server: MockServer,
    pub ctx: StateCtx,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(|config| config).await
    }

    /// Adjust the config (token, debounce, page size) before wiring.
    pub async fn with_config(f: impl FnOnce(BusinessConfig) -> BusinessConfig) -> Self {
        let mock_server = MockServer::start().await;
        let config = f(BusinessConfig::new(mock_server.uri())
            .with_search_debounce(Duration::from_millis(20)));
        let ctx = panel::build_state_ctx(config);
        Self { mock_server, ctx }
    }

    /// Flush queued commands and wait for every task, syncing after each.
    pub async fn flush_and_wait(&mut self) {
        tokio::time::timeout(Duration::from_secs(5), self.ctx.flush_and_await())
            .await
            .expect("timed out waiting for pending tasks");
    }

    pub async fn mock_user_list(&self, users: Vec<Value>, total: u64) {
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(aggregation(users, total)))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_error(&self, http_method: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }
}

pub fn sample_user(id: &str) -> Value {
    json!({
        "_id": id,
        "firstName": "Test",
        "lastName": id.to_uppercase(),
        "username": format!("user_{id}"),
        "email": format!("{id}@example.com"),
        "mobile": "+10000000000",
        "status": true,
        "isLimit": false,
        "allowedSessions": 0
    })
}

pub fn aggregation(users: Vec<Value>, total: u64) -> Value {
    json!([{ "data": users, "total": [{ "count": total }] }])
}
