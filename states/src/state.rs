use std::any::{Any, type_name};

/// Produces a `Send` copy of a value for command snapshots.
///
/// States that no command reads can keep the default and stay out of
/// snapshots entirely.
pub trait SnapshotClone {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        None
    }
}

/// A value stored in [`crate::StateCtx`].
///
/// Inputs, UI-affine state and compute-shaped caches all implement this.
pub trait State: Any + SnapshotClone + Send {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Replace `self` with a boxed value of the same concrete type.
    fn assign_box(&mut self, new_self: Box<dyn Any + Send>);
}

/// Shared `assign_box` body: downcast and overwrite, log on type mismatch.
pub fn state_assign_impl<T: State>(this: &mut T, new_self: Box<dyn Any + Send>) {
    match new_self.downcast::<T>() {
        Ok(value) => *this = *value,
        Err(_) => log::error!(
            "assign_box received a value that is not a {}",
            type_name::<T>()
        ),
    }
}
