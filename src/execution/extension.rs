//! Extending a sequencer with extra state and behavior
//!
//! An [`Extended`] sequencer embeds a fully initialized base [`Sequencer`]
//! and layers an [`Extension`] on top. The base is always set up before the
//! extension's own initializer runs.

use crate::core::config::SequencerConfig;
use crate::execution::scheduler::Scheduler;
use crate::execution::Sequencer;
use std::cell::{Ref, RefCell, RefMut};
use std::ops::Deref;
use std::rc::Rc;
use tracing::debug;

/// State and behavior layered on top of a base sequencer
pub trait Extension: 'static {
    /// Runs once, after the base sequencer has been set up
    ///
    /// Typical uses: registering handlers, queueing initial steps,
    /// adjusting the timeout. The extension is attached to the sequencer
    /// only after this returns, so steps started from here see
    /// [`Sequencer::extension`] return `None`.
    fn initialize(&mut self, _sequencer: &Sequencer) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A sequencer carrying an extension
///
/// Dereferences to the base [`Sequencer`], so every queue, event, and
/// timeout operation is inherited. Steps reach the extension through
/// [`Sequencer::extension`].
pub struct Extended<E: Extension> {
    base: Sequencer,
    extension: Rc<RefCell<E>>,
}

impl<E: Extension> Extended<E> {
    /// Extend a sequencer with default settings on `scheduler`
    pub fn new(scheduler: Rc<dyn Scheduler>, extension: E) -> anyhow::Result<Self> {
        Self::build(Sequencer::new(scheduler), extension)
    }

    /// Extend a sequencer built from `config` on `scheduler`
    pub fn with_scheduler(
        config: SequencerConfig,
        scheduler: Rc<dyn Scheduler>,
        extension: E,
    ) -> anyhow::Result<Self> {
        Self::build(Sequencer::with_scheduler(config, scheduler), extension)
    }

    fn build(base: Sequencer, mut extension: E) -> anyhow::Result<Self> {
        extension.initialize(&base)?;
        let extension = Rc::new(RefCell::new(extension));
        base.attach_extension(extension.clone());
        debug!(
            "Sequencer {}: extended with {}",
            &base.id().to_string()[..8],
            std::any::type_name::<E>()
        );
        Ok(Self { base, extension })
    }

    /// The base sequencer handle
    pub fn sequencer(&self) -> &Sequencer {
        &self.base
    }

    pub fn ext(&self) -> Ref<'_, E> {
        self.extension.borrow()
    }

    pub fn ext_mut(&self) -> RefMut<'_, E> {
        self.extension.borrow_mut()
    }
}

impl<E: Extension> Deref for Extended<E> {
    type Target = Sequencer;

    fn deref(&self) -> &Sequencer {
        &self.base
    }
}

impl<E: Extension> Clone for Extended<E> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            extension: self.extension.clone(),
        }
    }
}
