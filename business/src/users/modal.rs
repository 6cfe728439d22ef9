//! Which action dialog is open, if any.
//!
//! A single tagged value: opening a dialog replaces whatever was open, so
//! two dialogs can never be visible at once.

use std::any::Any;

use keeper_states::{SnapshotClone, State, state_assign_impl};
use log::debug;

use super::error::ValidationError;
use super::model::UserRecord;
use super::mutations::MutationKind;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveModal {
    #[default]
    None,
    Status(UserRecord),
    Password(UserRecord),
    Wallet(UserRecord),
    AssignPlan(UserRecord),
    UnassignPlan(UserRecord),
    Limits(UserRecord),
    RequestDeviceUpdate(UserRecord),
    /// Broadcast; carries no target.
    RequestAllDevicesUpdate,
}

impl ActiveModal {
    /// Build the dialog for `kind`, requiring a target for per-user actions.
    pub fn for_kind(kind: MutationKind, target: Option<UserRecord>) -> Result<Self, ValidationError> {
        if kind == MutationKind::RequestAllDevicesUpdate {
            return Ok(Self::RequestAllDevicesUpdate);
        }

        let user = target.ok_or(ValidationError::MissingTarget(kind))?;
        Ok(match kind {
            MutationKind::Status => Self::Status(user),
            MutationKind::Password => Self::Password(user),
            MutationKind::Wallet => Self::Wallet(user),
            MutationKind::AssignPlan => Self::AssignPlan(user),
            MutationKind::UnassignPlan => Self::UnassignPlan(user),
            MutationKind::Limits => Self::Limits(user),
            MutationKind::RequestDeviceUpdate => Self::RequestDeviceUpdate(user),
            MutationKind::RequestAllDevicesUpdate => Self::RequestAllDevicesUpdate,
        })
    }

    pub fn kind(&self) -> Option<MutationKind> {
        match self {
            Self::None => None,
            Self::Status(_) => Some(MutationKind::Status),
            Self::Password(_) => Some(MutationKind::Password),
            Self::Wallet(_) => Some(MutationKind::Wallet),
            Self::AssignPlan(_) => Some(MutationKind::AssignPlan),
            Self::UnassignPlan(_) => Some(MutationKind::UnassignPlan),
            Self::Limits(_) => Some(MutationKind::Limits),
            Self::RequestDeviceUpdate(_) => Some(MutationKind::RequestDeviceUpdate),
            Self::RequestAllDevicesUpdate => Some(MutationKind::RequestAllDevicesUpdate),
        }
    }

    pub fn target(&self) -> Option<&UserRecord> {
        match self {
            Self::Status(user)
            | Self::Password(user)
            | Self::Wallet(user)
            | Self::AssignPlan(user)
            | Self::UnassignPlan(user)
            | Self::Limits(user)
            | Self::RequestDeviceUpdate(user) => Some(user),
            Self::None | Self::RequestAllDevicesUpdate => None,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Dialog state of the users panel.
#[derive(Debug, Clone, Default)]
pub struct ModalState {
    active: ActiveModal,
}

impl ModalState {
    pub fn active(&self) -> &ActiveModal {
        &self.active
    }

    pub fn open(&mut self, modal: ActiveModal) {
        if self.active.is_open() && self.active != modal {
            debug!(
                "replacing open dialog {:?} with {:?}",
                self.active.kind(),
                modal.kind()
            );
        }
        self.active = modal;
    }

    pub fn close(&mut self) {
        self.active = ActiveModal::None;
    }
}

impl SnapshotClone for ModalState {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for ModalState {
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
