//! Lock-guarded world handle shared between concurrent request handlers.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use golmi_core::{ActionError, Command, Configuration, Event, WorldView};
use tracing::warn;

use crate::{apply, World};

static WORLD_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_world_lock_poison_once() {
    if WORLD_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!("world lock poisoned; recovered inner value");
    }
}

/// Cloneable handle to a single world and its configuration.
///
/// Every entry point holds one process-wide exclusive lock for its whole
/// duration, so concurrent commands touching the same entities are applied one
/// after another and never interleave.
#[derive(Clone, Debug)]
pub struct SharedWorld {
    world: Arc<Mutex<World>>,
    config: Arc<Configuration>,
}

impl SharedWorld {
    /// Wraps a world together with the configuration that governs it.
    #[must_use]
    pub fn new(world: World, config: Configuration) -> Self {
        Self {
            world: Arc::new(Mutex::new(world)),
            config: Arc::new(config),
        }
    }

    /// Configuration shared by every handle.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Applies a client command as a single atomic unit of work.
    pub fn apply(&self, command: Command) -> Result<Event, ActionError> {
        let mut world = self.lock();
        apply(&mut world, &self.config, command)
    }

    /// Captures the public snapshot under the lock.
    #[must_use]
    pub fn view(&self) -> WorldView {
        self.lock().to_public_view()
    }

    /// Runs scene setup or administration with exclusive access to the world.
    pub fn with_world<R>(&self, operation: impl FnOnce(&mut World, &Configuration) -> R) -> R {
        let mut world = self.lock();
        operation(&mut *world, self.config.as_ref())
    }

    /// Mutations never write before validating, so a poisoned world is still
    /// consistent and is recovered.
    fn lock(&self) -> MutexGuard<'_, World> {
        match self.world.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_world_lock_poison_once();
                poisoned.into_inner()
            }
        }
    }
}
