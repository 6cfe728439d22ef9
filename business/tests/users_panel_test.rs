//! End-to-end flows of the users panel against a mock backend.

use std::time::Duration;

use keeper_business::users::panel::{self, MutationOutcome, SaveOutcome};
use keeper_business::users::{
    ActiveModal, EditUserForm, Mutation, MutationKind, PlanSearchCompute, PlanSearchStatus,
    SessionLimit, SubmitError, UserListCompute, UserListQuery, UserRecord, ValidationError,
    WalletDirection,
};
use keeper_business::{BusinessConfig, Notifications, Route, ToastLevel};
use keeper_states::StateCtx;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    ctx: StateCtx,
}

impl Harness {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let config =
            BusinessConfig::new(server.uri()).with_search_debounce(Duration::from_millis(50));
        let ctx = panel::build_state_ctx(config);
        Self { server, ctx }
    }

    async fn settle(&mut self) {
        tokio::time::timeout(Duration::from_secs(5), self.ctx.flush_and_await())
            .await
            .expect("tasks should finish");
    }

    fn toasts(&mut self) -> Vec<(ToastLevel, String)> {
        self.ctx
            .state_mut::<Notifications>()
            .drain()
            .into_iter()
            .map(|t| (t.level, t.message))
            .collect()
    }
}

fn user(id: &str) -> Value {
    json!({ "_id": id, "firstName": "User", "lastName": id, "status": "active" })
}

fn page_of(users: Vec<Value>, total: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!([{ "data": users, "total": [{ "count": total }] }]))
}

#[tokio::test]
async fn wallet_debit_sends_negative_amount_then_refetches_same_page_once() {
    let mut h = Harness::new().await;

    Mock::given(method("POST"))
        .and(path("/users/u1/wallet"))
        .and(body_json(json!({ "amount": -500 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "2"))
        .and(query_param("filter", r#"{"where":{"name":"ada"}}"#))
        .respond_with(page_of(vec![user("u1")], 11))
        .expect(1)
        .mount(&h.server)
        .await;

    h.ctx.update::<UserListQuery>(|q| {
        q.page = 2;
        q.filters.name = Some("ada".into());
    });
    panel::open_modal(&mut h.ctx, ActiveModal::Wallet(UserRecord::with_id("u1"))).unwrap();
    panel::submit_mutation(&mut h.ctx, Mutation::AdjustWallet {
        amount: 500,
        direction: WalletDirection::Debit,
    })
    .expect("valid debit");
    h.settle().await;

    assert_eq!(
        panel::settle_mutation(&mut h.ctx),
        Some(MutationOutcome::Succeeded(MutationKind::Wallet))
    );
    assert!(!h.ctx.state::<keeper_business::users::ModalState>().active().is_open());

    // A second settle must not queue another refresh.
    assert_eq!(panel::settle_mutation(&mut h.ctx), None);
    h.settle().await;

    assert_eq!(h.ctx.compute::<UserListCompute>().records().len(), 1);
    assert_eq!(h.toasts(), vec![(
        ToastLevel::Success,
        MutationKind::Wallet.success_message().to_owned()
    )]);
}

#[tokio::test]
async fn invalid_inputs_never_reach_the_network() {
    let mut h = Harness::new().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    panel::open_modal(&mut h.ctx, ActiveModal::Password(UserRecord::with_id("u1"))).unwrap();
    assert_eq!(
        panel::submit_mutation(&mut h.ctx, Mutation::ResetPassword("short".into())),
        Err(SubmitError::Invalid(ValidationError::PasswordTooShort { min: 8 }))
    );

    panel::open_modal(&mut h.ctx, ActiveModal::Wallet(UserRecord::with_id("u1"))).unwrap();
    assert_eq!(
        panel::submit_mutation(&mut h.ctx, Mutation::AdjustWallet {
            amount: 0,
            direction: WalletDirection::Credit,
        }),
        Err(SubmitError::Invalid(ValidationError::NonPositiveAmount))
    );

    panel::open_modal(&mut h.ctx, ActiveModal::AssignPlan(UserRecord::with_id("u1"))).unwrap();
    let no_plan = panel::selected_plan_mutation(&h.ctx);
    assert_eq!(
        panel::submit_mutation(&mut h.ctx, no_plan),
        Err(SubmitError::Invalid(ValidationError::PlanNotSelected))
    );

    h.settle().await;

    let levels: Vec<_> = h.toasts().into_iter().map(|(level, _)| level).collect();
    assert_eq!(levels, vec![ToastLevel::Warning; 3]);
}

#[tokio::test]
async fn failed_mutation_keeps_dialog_open_with_server_message() {
    let mut h = Harness::new().await;
    Mock::given(method("PUT"))
        .and(path("/users/u9/limits"))
        .and(body_json(json!({ "isLimit": true, "allowedSessions": 0 })))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "User is online" })),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(page_of(vec![], 0))
        .expect(0)
        .mount(&h.server)
        .await;

    panel::open_modal(&mut h.ctx, ActiveModal::Limits(UserRecord::with_id("u9"))).unwrap();
    panel::submit_mutation(&mut h.ctx, Mutation::SetLimits(SessionLimit::Blocked))
        .expect("blocked is a valid limit");
    h.settle().await;

    assert_eq!(
        panel::settle_mutation(&mut h.ctx),
        Some(MutationOutcome::Failed {
            kind: MutationKind::Limits,
            message: "User is online".into()
        })
    );
    assert_eq!(
        h.ctx
            .state::<keeper_business::users::ModalState>()
            .active()
            .kind(),
        Some(MutationKind::Limits)
    );
    h.settle().await;
    assert_eq!(h.toasts(), vec![(ToastLevel::Error, "User is online".to_owned())]);
}

#[tokio::test]
async fn unassign_and_broadcast_use_their_endpoints() {
    let mut h = Harness::new().await;
    Mock::given(method("DELETE"))
        .and(path("/users/u2/plan"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/request-update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(page_of(vec![], 0))
        .expect(2)
        .mount(&h.server)
        .await;

    panel::open_modal(&mut h.ctx, ActiveModal::UnassignPlan(UserRecord::with_id("u2"))).unwrap();
    panel::submit_mutation(&mut h.ctx, Mutation::UnassignPlan).expect("no input needed");
    h.settle().await;
    assert!(matches!(
        panel::settle_mutation(&mut h.ctx),
        Some(MutationOutcome::Succeeded(MutationKind::UnassignPlan))
    ));
    h.settle().await;

    panel::open_modal(&mut h.ctx, ActiveModal::RequestAllDevicesUpdate).unwrap();
    panel::submit_mutation(&mut h.ctx, Mutation::RequestAllDevicesUpdate)
        .expect("broadcast needs no target");
    h.settle().await;
    assert!(matches!(
        panel::settle_mutation(&mut h.ctx),
        Some(MutationOutcome::Succeeded(MutationKind::RequestAllDevicesUpdate))
    ));
    h.settle().await;
}

#[tokio::test]
async fn plan_search_debounces_to_the_last_term() {
    let mut h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/plans"))
        .and(query_param("search", "gol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "plans": [{ "_id": "p1", "name": "Gold" }]
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plans"))
        .and(query_param("search", "g"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plans"))
        .and(query_param("search", "go"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&h.server)
        .await;

    panel::search_plans(&mut h.ctx, "g");
    panel::search_plans(&mut h.ctx, "go");
    panel::search_plans(&mut h.ctx, "gol");
    h.settle().await;

    let compute = h.ctx.compute::<PlanSearchCompute>();
    assert_eq!(compute.plans().len(), 1);
    assert!(matches!(
        &compute.status,
        PlanSearchStatus::Loaded { term, .. } if term == "gol"
    ));
}

#[tokio::test]
async fn assign_plan_posts_selected_plan() {
    let mut h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path("/users/u3/plan"))
        .and(body_json(json!({ "planId": "p1" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(page_of(vec![user("u3")], 1))
        .mount(&h.server)
        .await;

    panel::open_modal(&mut h.ctx, ActiveModal::AssignPlan(UserRecord::with_id("u3"))).unwrap();
    panel::select_plan(&mut h.ctx, Some("p1".into()));
    let mutation = panel::selected_plan_mutation(&h.ctx);
    panel::submit_mutation(&mut h.ctx, mutation).expect("plan selected");
    h.settle().await;

    assert_eq!(
        panel::settle_mutation(&mut h.ctx),
        Some(MutationOutcome::Succeeded(MutationKind::AssignPlan))
    );
}

#[tokio::test]
async fn slow_stale_list_response_is_discarded() {
    let mut h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "1"))
        .respond_with(page_of(vec![user("old")], 20).set_delay(Duration::from_millis(300)))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "2"))
        .respond_with(page_of(vec![user("new")], 20))
        .mount(&h.server)
        .await;

    h.ctx.dispatch::<keeper_business::users::RefreshUsersCommand>();
    h.ctx.update::<UserListQuery>(|q| q.page = 2);
    h.ctx.dispatch::<keeper_business::users::RefreshUsersCommand>();
    h.settle().await;

    let records = h.ctx.compute::<UserListCompute>().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "new");
}

#[tokio::test]
async fn edit_save_returns_to_list_and_refetches() {
    let mut h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/users/detail"))
        .and(query_param("id", "u5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "_id": "u5",
                "firstName": "Grace",
                "lastName": "Hopper",
                "username": "grace",
                "email": "grace@example.com",
                "mobile": "+1555"
            }
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/u5"))
        .and(body_json(json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "username": "admiral",
            "email": "grace@example.com",
            "mobile": "+1555"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(page_of(vec![user("u5")], 1))
        .expect(1)
        .mount(&h.server)
        .await;

    panel::open_edit(&mut h.ctx, "u5".into());
    h.settle().await;
    assert_eq!(
        panel::settle_edit_load(&mut h.ctx),
        Some(panel::LoadOutcome::Populated)
    );
    assert_eq!(h.ctx.state::<EditUserForm>().first_name, "Grace");

    panel::update_form(&mut h.ctx, |form| form.username = "admiral".into());
    panel::submit_edit(&mut h.ctx).expect("record loaded");
    h.settle().await;

    assert_eq!(panel::settle_edit_save(&mut h.ctx), Some(SaveOutcome::Saved));
    assert_eq!(*h.ctx.state::<Route>(), Route::UserList);
    h.settle().await;
    assert_eq!(h.ctx.compute::<UserListCompute>().records().len(), 1);
}

#[tokio::test]
async fn edit_save_failure_stays_on_form() {
    let mut h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path("/users/detail"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "u6" } })),
        )
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/u6"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "error": "Email already in use" })),
        )
        .mount(&h.server)
        .await;

    panel::open_edit(&mut h.ctx, "u6".into());
    h.settle().await;
    panel::settle_edit_load(&mut h.ctx);
    panel::submit_edit(&mut h.ctx).expect("record loaded");
    h.settle().await;

    assert_eq!(
        panel::settle_edit_save(&mut h.ctx),
        Some(SaveOutcome::Failed("Email already in use".into()))
    );
    assert_eq!(*h.ctx.state::<Route>(), Route::EditUser("u6".into()));
}

#[tokio::test]
async fn slow_wallet_write_is_still_reported_after_close_attempt() {
    let mut h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/wallet"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(page_of(vec![user("u1")], 1))
        .mount(&h.server)
        .await;

    panel::open_modal(&mut h.ctx, ActiveModal::Wallet(UserRecord::with_id("u1"))).unwrap();
    panel::submit_mutation(&mut h.ctx, Mutation::AdjustWallet {
        amount: 100,
        direction: WalletDirection::Credit,
    })
    .expect("valid credit");
    h.ctx.flush_commands();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(panel::close_modal(&mut h.ctx), Err(SubmitError::Busy));
    assert_eq!(
        panel::open_modal(&mut h.ctx, ActiveModal::Status(UserRecord::with_id("u1"))),
        Err(SubmitError::Busy)
    );
    assert_eq!(
        panel::submit_mutation(&mut h.ctx, Mutation::SetStatus(true.into())),
        Err(SubmitError::Busy)
    );

    h.settle().await;
    assert_eq!(
        panel::settle_mutation(&mut h.ctx),
        Some(MutationOutcome::Succeeded(MutationKind::Wallet))
    );
    assert_eq!(h.toasts(), vec![(
        ToastLevel::Success,
        MutationKind::Wallet.success_message().to_owned()
    )]);
}
