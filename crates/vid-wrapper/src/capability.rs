//! The page-global `navigator.id` capability slot.
//!
//! At most one capability occupies the slot. A browser-provided one is
//! never replaced. An injected one is replaced only if it can tear itself
//! down, so reloading the wrapper script does not leak listeners or frames.

use vid_transport::{debug, ContextId, Transport};

use crate::endpoint::{UnhookReport, WrapperEndpoint};
use crate::host::PageHost;

/// Something installed in the slot that may know how to remove itself.
pub trait Teardown {
    /// Whether [`Teardown::unhook`] is available right now.
    fn has_teardown(&self) -> bool;

    /// Remove everything this capability attached to the page.
    fn unhook(&mut self) -> UnhookReport;
}

impl<H: PageHost, T: Transport> Teardown for WrapperEndpoint<H, T> {
    fn has_teardown(&self) -> bool {
        WrapperEndpoint::has_teardown(self)
    }

    fn unhook(&mut self) -> UnhookReport {
        WrapperEndpoint::unhook(self)
    }
}

/// Current occupant of the slot.
#[derive(Debug)]
pub enum Capability<W> {
    /// Provided by the browser; left alone
    Native,
    /// Installed by us (`isInjected`)
    Injected(W),
}

/// Result of [`CapabilitySlot::install`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The slot was empty
    Installed,
    /// A previous injection was unhooked and replaced
    Reinstalled(UnhookReport),
    /// Occupied by a native capability or an injection without teardown
    NotSwizzling,
}

/// The `navigator.id` slot of one page.
#[derive(Debug)]
pub struct CapabilitySlot<W> {
    current: Option<Capability<W>>,
}

impl<W> Default for CapabilitySlot<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> CapabilitySlot<W> {
    /// An empty slot.
    pub fn new() -> Self {
        Self { current: None }
    }

    /// A slot already holding the browser's own capability.
    pub fn with_native() -> Self {
        Self {
            current: Some(Capability::Native),
        }
    }

    /// Whether anything occupies the slot.
    pub fn is_present(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the occupant is ours.
    pub fn is_injected(&self) -> bool {
        matches!(self.current, Some(Capability::Injected(_)))
    }

    /// Our installed capability, if any.
    pub fn injected(&self) -> Option<&W> {
        match &self.current {
            Some(Capability::Injected(w)) => Some(w),
            _ => None,
        }
    }

    /// Our installed capability, mutably.
    pub fn injected_mut(&mut self) -> Option<&mut W> {
        match &mut self.current {
            Some(Capability::Injected(w)) => Some(w),
            _ => None,
        }
    }
}

impl<W: Teardown> CapabilitySlot<W> {
    /// Install a capability built by `make`.
    ///
    /// `make` only runs if the slot is empty or the occupant was unhooked.
    pub fn install<E>(
        &mut self,
        make: impl FnOnce() -> Result<W, E>,
    ) -> Result<InstallOutcome, E> {
        let outcome = match &mut self.current {
            None => InstallOutcome::Installed,
            Some(Capability::Injected(existing)) if existing.has_teardown() => {
                debug("navigator.id: Unhooking existing navigator.id.");
                let report = existing.unhook();
                // Unhooked occupants never stay, even if `make` fails.
                self.current = None;
                InstallOutcome::Reinstalled(report)
            }
            Some(_) => {
                debug("navigator.id: Not swizzling.");
                return Ok(InstallOutcome::NotSwizzling);
            }
        };

        let capability = make()?;
        debug("navigator.id: Swizzling navigator.id.");
        self.current = Some(Capability::Injected(capability));
        Ok(outcome)
    }

    /// Run our capability's teardown and empty the slot.
    ///
    /// Returns `None` (leaving the slot untouched) when there is nothing to
    /// unhook: empty, native, or injected without a teardown hook yet.
    pub fn unhook(&mut self) -> Option<UnhookReport> {
        let report = match &mut self.current {
            Some(Capability::Injected(w)) if w.has_teardown() => w.unhook(),
            _ => return None,
        };
        self.current = None;
        Some(report)
    }
}

impl<H: PageHost, T: Transport> CapabilitySlot<WrapperEndpoint<H, T>> {
    /// Service frame of the installed wrapper's current flow.
    pub fn frame(&self) -> Option<ContextId> {
        self.injected().and_then(|w| w.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;
    use crate::TeardownStep;

    #[derive(Debug, Default)]
    struct Fake {
        id: u32,
        armed: bool,
        unhooked: bool,
    }

    impl Teardown for Fake {
        fn has_teardown(&self) -> bool {
            self.armed
        }

        fn unhook(&mut self) -> UnhookReport {
            self.unhooked = true;
            UnhookReport {
                failures: vec![(TeardownStep::Frame, HostError::Dom("gone".into()))],
            }
        }
    }

    fn fake(id: u32, armed: bool) -> Result<Fake, ()> {
        Ok(Fake {
            id,
            armed,
            unhooked: false,
        })
    }

    #[test]
    fn test_install_into_empty_slot() {
        let mut slot = CapabilitySlot::new();
        assert_eq!(slot.install(|| fake(1, false)), Ok(InstallOutcome::Installed));
        assert!(slot.is_injected());
        assert_eq!(slot.injected().map(|f| f.id), Some(1));
    }

    #[test]
    fn test_native_is_never_replaced() {
        let mut slot: CapabilitySlot<Fake> = CapabilitySlot::with_native();
        let mut built = false;
        let outcome = slot.install(|| {
            built = true;
            fake(1, true)
        });

        assert_eq!(outcome, Ok(InstallOutcome::NotSwizzling));
        assert!(!built);
        assert!(slot.is_present());
        assert!(!slot.is_injected());
    }

    #[test]
    fn test_injected_without_teardown_is_kept() {
        let mut slot = CapabilitySlot::new();
        slot.install(|| fake(1, false)).unwrap();

        assert_eq!(slot.install(|| fake(2, false)), Ok(InstallOutcome::NotSwizzling));
        assert_eq!(slot.injected().map(|f| f.id), Some(1));
    }

    #[test]
    fn test_injected_with_teardown_is_reinstalled() {
        let mut slot = CapabilitySlot::new();
        slot.install(|| fake(1, true)).unwrap();

        let outcome = slot.install(|| fake(2, false)).unwrap();

        match outcome {
            InstallOutcome::Reinstalled(report) => assert!(!report.is_clean()),
            other => panic!("Expected Reinstalled, got {:?}", other),
        }
        assert_eq!(slot.injected().map(|f| f.id), Some(2));
    }

    #[test]
    fn test_failed_build_keeps_slot_empty() {
        let mut slot: CapabilitySlot<Fake> = CapabilitySlot::new();
        assert_eq!(slot.install(|| Err("boom")), Err("boom"));
        assert!(!slot.is_present());
    }

    #[test]
    fn test_failed_rebuild_leaves_slot_empty() {
        let mut slot = CapabilitySlot::new();
        slot.install(|| fake(1, true)).unwrap();

        assert_eq!(slot.install(|| Err("boom")), Err("boom"));
        assert!(!slot.is_present());

        assert_eq!(slot.install(|| fake(2, false)), Ok(InstallOutcome::Installed));
        assert_eq!(slot.injected().map(|f| f.id), Some(2));
    }

    #[test]
    fn test_unhook_deletes_capability() {
        let mut slot = CapabilitySlot::new();
        slot.install(|| fake(1, true)).unwrap();

        assert!(slot.unhook().is_some());
        assert!(!slot.is_present());
        assert!(slot.unhook().is_none());
    }

    #[test]
    fn test_unhook_without_teardown_is_noop() {
        let mut slot = CapabilitySlot::new();
        slot.install(|| fake(1, false)).unwrap();

        assert!(slot.unhook().is_none());
        assert!(slot.is_injected());
        assert!(!slot.injected().map(|f| f.unhooked).unwrap_or(true));
    }
}
