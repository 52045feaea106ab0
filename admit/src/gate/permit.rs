//! Admission token handed out by a successful enter.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::OwnedSemaphorePermit;

use super::admission::GateInner;

/// Proof of admission through a [`Gate`](super::Gate).
///
/// Holding a permit occupies one slot. Dropping it releases the slot, decrements
/// the live count and, for the last one out, wakes every [`Gate::wait`](super::Gate::wait)
/// caller. Release happens on every path, including unwinding and after the gate
/// was canceled.
#[must_use = "dropping the permit exits the gate immediately"]
pub struct GatePermit {
    gate: Arc<GateInner>,
    _slot: OwnedSemaphorePermit,
}

impl GatePermit {
    pub(crate) fn admit(gate: Arc<GateInner>, slot: OwnedSemaphorePermit) -> Self {
        let live = gate.live.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(live, capacity = gate.capacity, "Gate admitted");
        Self { gate, _slot: slot }
    }

    /// Leave the gate. Equivalent to dropping the permit.
    pub fn exit(self) {
        drop(self);
    }
}

impl std::fmt::Debug for GatePermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatePermit")
            .field("capacity", &self.gate.capacity)
            .finish_non_exhaustive()
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // The live count drops before the slot (a field) is returned, so a
        // waiting enter can never push the count above capacity.
        let prev = self.gate.live.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "gate exit without matching enter");
        if prev == 1 {
            self.gate.drained.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use crate::Gate;

    fn gate(capacity: usize) -> Gate {
        Gate::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn exit_returns_slot_to_pool() {
        let gate = gate(1);

        let permit = gate.try_enter().unwrap().expect("slot should be free");
        assert!(gate.try_enter().unwrap().is_none());

        permit.exit();
        assert_eq!(gate.count(), 0);
        assert!(gate.try_enter().unwrap().is_some());
    }

    #[test]
    fn drop_is_exit() {
        let gate = gate(2);

        {
            let _a = gate.try_enter().unwrap().unwrap();
            let _b = gate.try_enter().unwrap().unwrap();
            assert_eq!(gate.count(), 2);
        }

        assert_eq!(gate.count(), 0);
        assert_eq!(gate.available(), 2);
    }

    #[test]
    fn exit_after_cancel_still_records_completion() {
        let gate = gate(1);

        let permit = gate.try_enter().unwrap().unwrap();
        gate.cancel();
        assert_eq!(gate.count(), 1);

        permit.exit();
        assert_eq!(gate.count(), 0);
    }

    #[test]
    fn permit_debug_hides_internals() {
        let gate = gate(3);
        let permit = gate.try_enter().unwrap().unwrap();
        assert_eq!(format!("{permit:?}"), "GatePermit { capacity: 3, .. }");
    }
}
