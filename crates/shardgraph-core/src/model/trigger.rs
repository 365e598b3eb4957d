// shardgraph-core/src/model/trigger.rs
// ============================================================================
// Module: Trigger Slot
// Description: Set-once-until-cleared holder for a trigger callback.
// Purpose: Give activations and graphs a uniform way to register "call me
//          back when X happens" without allowing two triggers to silently
//          stack on the same slot.
// Dependencies: crate::model::TriggerSlotError
// ============================================================================

//! ## Overview
//! `shardgraph-core`'s graph layer exposes three trigger slots: an
//! activation's `trigger_on_result`, an activation's
//! `trigger_on_descendants`, and a graph's own `trigger_method`. All three
//! share the same set-once-until-cleared discipline implemented here: a slot
//! holding a trigger refuses a second `set`, and an empty slot refuses
//! `clear`. The evaluator (not this module) decides what a `Trig` payload
//! actually is and when to fire it.

use crate::model::TriggerSlotError;

/// A slot that holds at most one trigger of type `Trig` at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSlot<Trig> {
    /// The currently registered trigger, if any.
    value: Option<Trig>,
}

impl<Trig> TriggerSlot<Trig> {
    /// Returns an empty slot.
    #[must_use]
    pub const fn empty() -> Self {
        Self { value: None }
    }

    /// Registers `trigger` in this slot.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerSlotError::AlreadyPresent`] if the slot already
    /// holds a trigger; callers must [`Self::clear`] it first.
    pub fn set(&mut self, trigger: Trig) -> Result<(), TriggerSlotError> {
        if self.value.is_some() {
            return Err(TriggerSlotError::AlreadyPresent);
        }
        self.value = Some(trigger);
        Ok(())
    }

    /// Removes and returns this slot's trigger.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerSlotError::Absent`] if the slot holds no trigger.
    pub fn clear(&mut self) -> Result<Trig, TriggerSlotError> {
        self.value.take().ok_or(TriggerSlotError::Absent)
    }

    /// Returns a reference to the held trigger, if any.
    #[must_use]
    pub const fn get(&self) -> Option<&Trig> {
        self.value.as_ref()
    }

    /// Returns whether this slot currently holds a trigger.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

impl<Trig> Default for TriggerSlot<Trig> {
    fn default() -> Self {
        Self::empty()
    }
}
