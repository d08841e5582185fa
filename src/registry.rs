//! # Stage: RenderResourceRegistry
//!
//! ## Responsibility
//! Sole owner of rendering-resource lifetime: at most one current handle per
//! comparison slot, replaced create-before-release and revoked after a grace
//! period of one render cycle.
//!
//! ## Guarantees
//! - A slot's current handle is always live: handles are only revoked after
//!   they stop being current
//! - Replacement is compare-and-swap: the caller names the handle it
//!   believes is current, and a mismatch changes nothing
//! - A failed build leaves the previous handle installed
//! - A handle retired during render cycle N is revoked when cycle N+1
//!   finishes, so frames still loading it never see a dead resource
//! - At most one retired handle per slot waits out its grace period;
//!   retiring another revokes the older one, so replacements without any
//!   finished cycle cannot pile up
//! - Dropping the registry revokes everything it still holds
//!
//! ## NOT Responsible For
//! - Building documents (see [`crate::preview`])
//! - Deciding when a slot needs a preview (see [`crate::slot`])

use std::collections::{BTreeMap, VecDeque};

use crate::error::PreviewError;
use crate::host::{RenderHandle, RenderResource};
use crate::preview::PreviewDocument;

#[derive(Debug)]
struct Retired {
    slot: usize,
    handle: RenderHandle,
    cycle: u64,
}

/// Per-slot owner of revocable render handles.
#[derive(Debug)]
pub struct RenderResourceRegistry<H: RenderResource> {
    host: H,
    current: BTreeMap<usize, RenderHandle>,
    retired: VecDeque<Retired>,
    cycle: u64,
}

impl<H: RenderResource> RenderResourceRegistry<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            current: BTreeMap::new(),
            retired: VecDeque::new(),
            cycle: 0,
        }
    }

    /// Install a handle for `doc` as the slot's current resource.
    ///
    /// `expected_current` must be the handle the caller last saw for this
    /// slot (`None` if it had none). The prior handle is retired only after
    /// the new one is installed.
    pub fn set(
        &mut self,
        slot: usize,
        expected_current: Option<&RenderHandle>,
        doc: &PreviewDocument,
    ) -> Result<RenderHandle, PreviewError> {
        if self.current.get(&slot) != expected_current {
            tracing::warn!(slot, "stale handle passed to registry set");
            return Err(PreviewError::StaleHandle { slot });
        }

        let handle = self
            .host
            .create(doc)
            .map_err(|source| PreviewError::BuildFailure { slot, source })?;

        tracing::debug!(slot, uri = %handle.uri, bytes = doc.len(), "installed render handle");
        if let Some(previous) = self.current.insert(slot, handle.clone()) {
            self.retire(slot, previous);
        }
        Ok(handle)
    }

    /// Stop pointing `slot` at any resource. Returns whether it had one.
    pub fn release(&mut self, slot: usize) -> bool {
        match self.current.remove(&slot) {
            Some(handle) => {
                tracing::debug!(slot, uri = %handle.uri, "released render handle");
                self.retire(slot, handle);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, slot: usize) -> Option<&RenderHandle> {
        self.current.get(&slot)
    }

    /// Mark the end of a render cycle; revokes handles whose grace period
    /// has elapsed. Returns how many were revoked.
    pub fn finish_render_cycle(&mut self) -> usize {
        let mut revoked = 0;
        while self
            .retired
            .front()
            .is_some_and(|r| r.cycle < self.cycle)
        {
            if let Some(r) = self.retired.pop_front() {
                self.host.revoke(&r.handle);
                revoked += 1;
            }
        }
        self.cycle += 1;
        if revoked > 0 {
            tracing::trace!(revoked, cycle = self.cycle, "render cycle finished");
        }
        revoked
    }

    /// Release every slot (grace period still applies).
    pub fn release_all(&mut self) {
        let slots: Vec<usize> = self.current.keys().copied().collect();
        for slot in slots {
            self.release(slot);
        }
    }

    /// Release every slot and revoke everything immediately, skipping the
    /// grace period. Used when the owning view goes away.
    pub fn flush(&mut self) {
        self.release_all();
        while let Some(r) = self.retired.pop_front() {
            self.host.revoke(&r.handle);
        }
    }

    /// Slots that currently hold a handle, ascending.
    pub fn live_slots(&self) -> Vec<usize> {
        self.current.keys().copied().collect()
    }

    /// Handles waiting out their grace period.
    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    pub fn current_cycle(&self) -> u64 {
        self.cycle
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn retire(&mut self, slot: usize, handle: RenderHandle) {
        if let Some(pos) = self.retired.iter().position(|r| r.slot == slot) {
            if let Some(older) = self.retired.remove(pos) {
                tracing::trace!(slot, uri = %older.handle.uri, "revoked superseded retired handle");
                self.host.revoke(&older.handle);
            }
        }
        self.retired.push_back(Retired {
            slot,
            handle,
            cycle: self.cycle,
        });
    }
}

impl<H: RenderResource> Drop for RenderResourceRegistry<H> {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::MemoryHost;
    use crate::language::Language;
    use crate::preview::build_preview;

    fn doc(text: &str) -> PreviewDocument {
        build_preview(text, &Language::Markup).expect("document")
    }

    #[test]
    fn test_set_then_get() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new());
        let h = reg.set(0, None, &doc("<p>a</p>")).expect("set");
        assert_eq!(reg.get(0), Some(&h));
        assert!(reg.host().is_live(&h));
        assert_eq!(reg.live_slots(), vec![0]);
    }

    #[test]
    fn test_replace_retires_previous_after_install() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new());
        let first = reg.set(1, None, &doc("<p>a</p>")).expect("set");
        let second = reg.set(1, Some(&first), &doc("<p>b</p>")).expect("set");

        assert_eq!(reg.get(1), Some(&second));
        assert_eq!(reg.retired_len(), 1);
        // still live during its grace period
        assert!(reg.host().is_live(&first));
    }

    #[test]
    fn test_stale_expected_handle_is_rejected() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new());
        let first = reg.set(0, None, &doc("<p>a</p>")).expect("set");
        let err = reg.set(0, None, &doc("<p>b</p>")).unwrap_err();
        assert_eq!(err, PreviewError::StaleHandle { slot: 0 });
        assert_eq!(reg.get(0), Some(&first));
        assert_eq!(reg.host().live_count(), 1);
    }

    #[test]
    fn test_build_failure_keeps_previous() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new().with_max_live(1));
        let first = reg.set(0, None, &doc("<p>a</p>")).expect("set");
        let err = reg.set(0, Some(&first), &doc("<p>b</p>")).unwrap_err();
        assert!(matches!(
            err,
            PreviewError::BuildFailure {
                slot: 0,
                source: HostError::Exhausted { .. }
            }
        ));
        assert_eq!(reg.get(0), Some(&first));
        assert!(reg.host().is_live(&first));
        assert_eq!(reg.retired_len(), 0);
    }

    #[test]
    fn test_grace_period_is_one_render_cycle() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new());
        let h = reg.set(0, None, &doc("<p>a</p>")).expect("set");
        assert!(reg.release(0));
        assert!(reg.get(0).is_none());

        assert_eq!(reg.finish_render_cycle(), 0);
        assert!(reg.host().is_live(&h));
        assert_eq!(reg.finish_render_cycle(), 1);
        assert!(!reg.host().is_live(&h));
        assert_eq!(reg.retired_len(), 0);
    }

    #[test]
    fn test_replacements_without_finished_cycle_stay_bounded() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new().with_max_live(3));
        let mut current = reg.set(0, None, &doc("<p>0</p>")).expect("set");
        for n in 1..50 {
            let previous = current.clone();
            current = reg
                .set(0, Some(&previous), &doc(&format!("<p>{n}</p>")))
                .expect("replacement within the host limit");
            // the handle just replaced is still in its grace period
            assert!(reg.host().is_live(&previous));
        }
        assert_eq!(reg.retired_len(), 1);
        assert_eq!(reg.host().live_count(), 2);
    }

    #[test]
    fn test_release_supersedes_retired_handle_of_same_slot() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new());
        let a = reg.set(0, None, &doc("<p>a</p>")).expect("set");
        let b = reg.set(0, Some(&a), &doc("<p>b</p>")).expect("set");
        let other = reg.set(1, None, &doc("<p>c</p>")).expect("set");
        reg.release(1);
        reg.release(0);

        assert!(!reg.host().is_live(&a));
        assert!(reg.host().is_live(&b));
        assert!(reg.host().is_live(&other));
        assert_eq!(reg.retired_len(), 2);
    }

    #[test]
    fn test_release_without_handle() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new());
        assert!(!reg.release(3));
        assert_eq!(reg.retired_len(), 0);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new());
        let a = reg.set(0, None, &doc("<p>a</p>")).expect("set");
        let b = reg.set(1, None, &doc("<p>b</p>")).expect("set");
        reg.release(0);
        assert_eq!(reg.get(1), Some(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_flush_revokes_everything() {
        let mut reg = RenderResourceRegistry::new(MemoryHost::new());
        let a = reg.set(0, None, &doc("<p>a</p>")).expect("set");
        reg.set(0, Some(&a), &doc("<p>b</p>")).expect("set");
        reg.set(2, None, &doc("<p>c</p>")).expect("set");
        reg.flush();
        assert!(reg.live_slots().is_empty());
        assert_eq!(reg.retired_len(), 0);
        assert_eq!(reg.host().live_count(), 0);
    }
}
