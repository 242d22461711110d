/// FrameSync trait - synchronization objects of one frame slot

use std::any::Any;

use crate::error::Result;

/// Image-available semaphore, render-finished semaphore and in-flight fence
///
/// The fence is created signaled so the first wait on a fresh slot returns
/// immediately.
pub trait FrameSync: Send + Sync {
    /// Block until the slot's last submission has completed (no timeout)
    fn wait(&self) -> Result<()>;

    /// Reset the in-flight fence to unsignaled before the next submission
    fn reset(&self) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}
