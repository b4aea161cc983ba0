//! Frame-coherent capture of externally-owned state
//!
//! Values owned by collaborators (the scene's current environment map, a
//! UI-driven parameter, the swapchain image) can mutate at any time. Passes
//! must never observe two different values of one logical resource within a
//! single frame, so the registry snapshots every registered value exactly
//! once at frame start and serves the frozen copies for the rest of the
//! frame.

use std::collections::HashMap;

/// Zero-argument accessor for an externally-owned value.
///
/// Returns `Err` with a reason when the value is currently unavailable;
/// that marks the entry invalid for the frame instead of aborting capture.
pub type Getter<V> = Box<dyn Fn() -> Result<V, String>>;

/// Optional sanity check run against each freshly captured value.
pub type Validator<V> = Box<dyn Fn(&V) -> bool>;

struct Entry<V> {
    getter: Getter<V>,
    validator: Option<Validator<V>>,
    value: Option<V>,
    captured_frame: u64,
    valid: bool,
}

/// Per-frame snapshot registry for externally-owned mutable state.
pub struct ExternalResourceRegistry<V> {
    entries: HashMap<String, Entry<V>>,
    frame_index: u64,
    captured_this_frame: bool,
}

impl<V> ExternalResourceRegistry<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            frame_index: 0,
            captured_this_frame: false,
        }
    }

    /// Register an external resource under `id`.
    ///
    /// Re-registering an id replaces the previous getter with a warning.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        getter: Getter<V>,
        validator: Option<Validator<V>>,
    ) {
        let id = id.into();
        if self.entries.contains_key(&id) {
            log::warn!("external resource '{id}' registered twice, replacing previous entry");
        }
        self.entries.insert(
            id,
            Entry {
                getter,
                validator,
                value: None,
                captured_frame: 0,
                valid: false,
            },
        );
    }

    /// Remove a registration. Returns whether an entry was removed.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Snapshot every registered value for the current frame.
    ///
    /// Call exactly once per frame, before any pass executes. A getter
    /// error or validator rejection marks that entry invalid for the frame;
    /// capture of the remaining entries proceeds.
    pub fn capture_all(&mut self) {
        if self.captured_this_frame {
            log::warn!(
                "capture_all() called twice in frame {}; values will be re-captured",
                self.frame_index
            );
        }

        for (id, entry) in &mut self.entries {
            match (entry.getter)() {
                Ok(value) => {
                    let accepted = entry.validator.as_ref().map_or(true, |v| v(&value));
                    if accepted {
                        entry.value = Some(value);
                        entry.captured_frame = self.frame_index;
                        entry.valid = true;
                    } else {
                        log::warn!(
                            "external resource '{id}' failed validation in frame {}",
                            self.frame_index
                        );
                        entry.value = None;
                        entry.valid = false;
                    }
                }
                Err(reason) => {
                    log::warn!("external resource '{id}' getter failed: {reason}");
                    entry.value = None;
                    entry.valid = false;
                }
            }
        }

        self.captured_this_frame = true;
    }

    /// The value captured for this frame, or `None` if the entry is
    /// invalid or unregistered.
    ///
    /// Reading a value captured in an earlier frame means `capture_all`
    /// was not called this frame; that protocol violation is logged but
    /// the stale value is still returned.
    pub fn get(&self, id: &str) -> Option<&V> {
        let entry = self.entries.get(id)?;
        if !entry.valid {
            return None;
        }
        if entry.captured_frame != self.frame_index {
            log::warn!(
                "external resource '{id}' read in frame {} but captured in frame {}; \
                 was capture_all() called this frame?",
                self.frame_index,
                entry.captured_frame
            );
        }
        entry.value.as_ref()
    }

    /// Whether `id` holds a valid capture.
    pub fn is_captured(&self, id: &str) -> bool {
        self.entries.get(id).map_or(false, |e| e.valid)
    }

    /// Advance to the next frame. Captured values persist until the next
    /// `capture_all`, but reads of them will warn.
    pub fn advance_frame(&mut self) {
        self.frame_index += 1;
        self.captured_this_frame = false;
    }

    /// Drop all captured values while keeping registrations (device loss).
    pub fn invalidate_captures(&mut self) {
        for entry in self.entries.values_mut() {
            entry.value = None;
            entry.valid = false;
        }
        self.captured_this_frame = false;
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl<V> Default for ExternalResourceRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
