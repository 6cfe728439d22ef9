//! Full-record edit: load one user, edit five fields, save.

use std::any::Any;

use keeper_states::{
    Command, CommandFuture, CommandSnapshot, Compute, LatestOnlyUpdater, SnapshotClone, State,
    state_assign_impl,
};
use log::{error, info};
use tokio_util::sync::CancellationToken;
use ustr::Ustr;

use super::api;
use super::model::{UserRecord, UserUpdate};
use crate::config::BusinessConfig;

/// User being edited.
#[derive(Debug, Clone, Default)]
pub struct EditUserInput {
    pub user_id: Option<Ustr>,
}

impl SnapshotClone for EditUserInput {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for EditUserInput {
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

/// Editable fields. Populated once from the loaded record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditUserForm {
    /// Record the fields were filled from.
    pub source_id: Option<Ustr>,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub mobile: String,
}

impl EditUserForm {
    pub fn from_record(record: &UserRecord) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            source_id: Some(record.id),
            first_name: field(&record.first_name),
            last_name: field(&record.last_name),
            username: field(&record.username),
            email: field(&record.email),
            mobile: field(&record.mobile),
        }
    }

    pub fn to_update(&self) -> UserUpdate {
        UserUpdate {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            username: self.username.trim().to_owned(),
            email: self.email.trim().to_owned(),
            mobile: self.mobile.trim().to_owned(),
        }
    }
}

impl SnapshotClone for EditUserForm {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for EditUserForm {
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

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditLoadStatus {
    #[default]
    Idle,
    Loading,
    Ready(UserRecord),
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct EditUserCompute {
    pub status: EditLoadStatus,
}

impl EditUserCompute {
    pub fn record(&self) -> Option<&UserRecord> {
        match &self.status {
            EditLoadStatus::Ready(record) => Some(record),
            _ => None,
        }
    }
}

impl SnapshotClone for EditUserCompute {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for EditUserCompute {
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

impl Compute for EditUserCompute {}

#[derive(Default, Debug)]
pub struct LoadUserCommand;

impl Command for LoadUserCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let user_id = snap.state::<EditUserInput>().user_id;
        let config = snap.state::<BusinessConfig>().clone();

        Box::pin(async move {
            let Some(user_id) = user_id else {
                error!("LoadUserCommand launched without a user id");
                updater.set(EditUserCompute {
                    status: EditLoadStatus::Error("No user selected".to_owned()),
                });
                return;
            };

            updater.set(EditUserCompute {
                status: EditLoadStatus::Loading,
            });

            let status = match api::get_user(&config, &user_id).await {
                Ok(record) => EditLoadStatus::Ready(record),
                Err(err) => {
                    error!("failed to load user {user_id}: {err}");
                    EditLoadStatus::Error(err.user_message())
                }
            };
            updater.set(EditUserCompute { status });
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct SaveUserCompute {
    pub status: SaveStatus,
}

impl SaveUserCompute {
    pub fn is_saving(&self) -> bool {
        matches!(self.status, SaveStatus::Saving)
    }
}

impl SnapshotClone for SaveUserCompute {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for SaveUserCompute {
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

impl Compute for SaveUserCompute {}

/// PUT the whole form for the user in [`EditUserInput`].
#[derive(Default, Debug)]
pub struct SaveUserCommand;

impl Command for SaveUserCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let user_id = snap.state::<EditUserInput>().user_id;
        let update = snap.state::<EditUserForm>().to_update();
        let config = snap.state::<BusinessConfig>().clone();

        Box::pin(async move {
            let Some(user_id) = user_id else {
                updater.set(SaveUserCompute {
                    status: SaveStatus::Error("No user selected".to_owned()),
                });
                return;
            };

            updater.set(SaveUserCompute {
                status: SaveStatus::Saving,
            });

            let status = match api::update_user(&config, &user_id, &update).await {
                Ok(()) => {
                    info!("saved user {user_id}");
                    SaveStatus::Saved
                }
                Err(err) => {
                    error!("failed to save user {user_id}: {err}");
                    SaveStatus::Error(err.user_message())
                }
            };
            updater.set(SaveUserCompute { status });
        })
    }
}
