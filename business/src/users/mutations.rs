//! Per-user actions submitted from the dialogs.
//!
//! The driver validates locally, stores the pending [`Mutation`] in
//! [`MutationInput`] and launches [`SubmitMutationCommand`]. The command
//! reports into [`MutationCompute`]; `panel::settle_mutation` turns the
//! outcome into a notification, closes the dialog and refreshes the list.

use std::any::Any;
use std::fmt;

use keeper_states::{
    Command, CommandFuture, CommandSnapshot, Compute, LatestOnlyUpdater, SnapshotClone, State,
    state_assign_impl,
};
use log::{error, info};
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use super::api::{self, ApiResult};
use super::error::ValidationError;
use super::modal::ModalState;
use super::model::{SessionLimit, UserStatus};
use crate::config::BusinessConfig;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const GENERATED_PASSWORD_LEN: usize = 12;

/// Random alphanumeric password of [`GENERATED_PASSWORD_LEN`] characters.
pub fn generate_password() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Status,
    Password,
    Wallet,
    AssignPlan,
    UnassignPlan,
    Limits,
    RequestDeviceUpdate,
    RequestAllDevicesUpdate,
}

impl MutationKind {
    pub const ALL: [Self; 8] = [
        Self::Status,
        Self::Password,
        Self::Wallet,
        Self::AssignPlan,
        Self::UnassignPlan,
        Self::Limits,
        Self::RequestDeviceUpdate,
        Self::RequestAllDevicesUpdate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Status => "change status",
            Self::Password => "reset password",
            Self::Wallet => "adjust wallet",
            Self::AssignPlan => "assign plan",
            Self::UnassignPlan => "remove plan",
            Self::Limits => "set session limits",
            Self::RequestDeviceUpdate => "request device update",
            Self::RequestAllDevicesUpdate => "request update on all devices",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Status => "Status updated",
            Self::Password => "Password changed",
            Self::Wallet => "Wallet adjusted",
            Self::AssignPlan => "Plan assigned",
            Self::UnassignPlan => "Plan removed",
            Self::Limits => "Session limits saved",
            Self::RequestDeviceUpdate => "Update requested for the user's device",
            Self::RequestAllDevicesUpdate => "Update requested for all devices",
        }
    }

    pub fn needs_target(self) -> bool {
        !matches!(self, Self::RequestAllDevicesUpdate)
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalletDirection {
    #[default]
    Credit,
    Debit,
}

impl WalletDirection {
    /// Signed amount for the wire: credits positive, debits negative.
    pub fn apply(self, amount: i64) -> i64 {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetStatus(UserStatus),
    ResetPassword(String),
    /// `amount` is the magnitude entered by the operator.
    AdjustWallet {
        amount: i64,
        direction: WalletDirection,
    },
    /// `None` until a plan is picked.
    AssignPlan(Option<Ustr>),
    UnassignPlan,
    SetLimits(SessionLimit),
    RequestDeviceUpdate,
    RequestAllDevicesUpdate,
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::SetStatus(_) => MutationKind::Status,
            Self::ResetPassword(_) => MutationKind::Password,
            Self::AdjustWallet { .. } => MutationKind::Wallet,
            Self::AssignPlan(_) => MutationKind::AssignPlan,
            Self::UnassignPlan => MutationKind::UnassignPlan,
            Self::SetLimits(_) => MutationKind::Limits,
            Self::RequestDeviceUpdate => MutationKind::RequestDeviceUpdate,
            Self::RequestAllDevicesUpdate => MutationKind::RequestAllDevicesUpdate,
        }
    }

    /// Local checks that must pass before anything is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::ResetPassword(password) if password.chars().count() < MIN_PASSWORD_LEN => {
                Err(ValidationError::PasswordTooShort {
                    min: MIN_PASSWORD_LEN,
                })
            }
            Self::AdjustWallet { amount, .. } if *amount <= 0 => {
                Err(ValidationError::NonPositiveAmount)
            }
            Self::AssignPlan(plan) if plan.is_none_or(|id| id.trim().is_empty()) => {
                Err(ValidationError::PlanNotSelected)
            }
            _ => Ok(()),
        }
    }

    async fn execute(&self, config: &BusinessConfig, user: Option<&str>) -> ApiResult<()> {
        // Targets are checked before launch; the broadcast is the only
        // variant that runs without one.
        let id = user.unwrap_or_default();
        match self {
            Self::SetStatus(status) => api::set_status(config, id, *status).await,
            Self::ResetPassword(password) => api::reset_password(config, id, password).await,
            Self::AdjustWallet { amount, direction } => {
                api::adjust_wallet(config, id, direction.apply(*amount)).await
            }
            Self::AssignPlan(plan) => {
                let plan = plan.as_ref().map(Ustr::as_str).unwrap_or_default();
                api::assign_plan(config, id, plan).await
            }
            Self::UnassignPlan => api::unassign_plan(config, id).await,
            Self::SetLimits(limit) => api::set_limits(config, id, *limit).await,
            Self::RequestDeviceUpdate => api::request_device_update(config, id).await,
            Self::RequestAllDevicesUpdate => api::request_all_devices_update(config).await,
        }
    }
}

/// The mutation waiting to be sent by [`SubmitMutationCommand`].
#[derive(Debug, Clone, Default)]
pub struct MutationInput {
    pub mutation: Option<Mutation>,
}

impl SnapshotClone for MutationInput {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for MutationInput {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,

    InFlight {
        kind: MutationKind,
        user: Option<Ustr>,
    },

    Success {
        kind: MutationKind,
        user: Option<Ustr>,
    },

    /// `message` is ready for display.
    Error {
        kind: MutationKind,
        user: Option<Ustr>,
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MutationCompute {
    pub status: MutationStatus,
}

impl MutationCompute {
    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, MutationStatus::InFlight { .. })
    }
}

impl SnapshotClone for MutationCompute {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for MutationCompute {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

// Updated by `SubmitMutationCommand` and the driver.
impl Compute for MutationCompute {}

/// Send the pending [`MutationInput`] for the user in the open dialog.
#[derive(Default, Debug)]
pub struct SubmitMutationCommand;

impl Command for SubmitMutationCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let target = snap.state::<ModalState>().active().target().map(|u| u.id);
        let input = snap.state::<MutationInput>().clone();
        let config = snap.state::<BusinessConfig>().clone();

        Box::pin(async move {
            let Some(mutation) = input.mutation else {
                error!("SubmitMutationCommand launched without a pending mutation");
                updater.set(MutationCompute::default());
                return;
            };
            let kind = mutation.kind();

            let checked = mutation.validate().and_then(|()| {
                if kind.needs_target() && target.is_none() {
                    Err(ValidationError::MissingTarget(kind))
                } else {
                    Ok(())
                }
            });
            if let Err(err) = checked {
                updater.set(MutationCompute {
                    status: MutationStatus::Error {
                        kind,
                        user: target,
                        message: err.to_string(),
                    },
                });
                return;
            }

            updater.set(MutationCompute {
                status: MutationStatus::InFlight { kind, user: target },
            });

            let status = match mutation.execute(&config, target.as_deref()).await {
                Ok(()) => {
                    info!("{kind} succeeded for {}", target.as_deref().unwrap_or("all users"));
                    MutationStatus::Success { kind, user: target }
                }
                Err(err) => {
                    error!("{kind} failed: {err}");
                    MutationStatus::Error {
                        kind,
                        user: target,
                        message: err.user_message(),
                    }
                }
            };
            updater.set(MutationCompute { status });
        })
    }
}
