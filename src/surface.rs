//! Off-screen render surfaces.
//!
//! A [`SurfaceHost`] plays the part of the document body: each render
//! attaches one surface holding its HTML fragment and the returned
//! [`SurfaceGuard`] detaches it when dropped, on success and error paths alike.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::PageGeometry;

#[derive(Debug, Default)]
struct HostState {
    next_id: u64,
    attached: BTreeMap<u64, String>,
}

/// Registry of live surfaces. Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct SurfaceHost {
    state: Arc<Mutex<HostState>>,
}

impl SurfaceHost {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the map half-updated
    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attach a fresh surface holding `html`, labelled for diagnostics.
    pub fn attach(&self, label: impl Into<String>, html: String, page: PageGeometry) -> SurfaceGuard {
        let label = label.into();
        let id = {
            let mut state = self.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.attached.insert(id, label.clone());
            id
        };
        log::debug!("attached surface {} ({})", id, label);
        SurfaceGuard {
            host: self.clone(),
            id,
            html,
            page,
        }
    }

    /// Number of currently attached surfaces
    pub fn attached_count(&self) -> usize {
        self.lock().attached.len()
    }

    /// Labels of attached surfaces in attach order
    pub fn attached_labels(&self) -> Vec<String> {
        self.lock().attached.values().cloned().collect()
    }

    pub fn is_attached(&self, id: u64) -> bool {
        self.lock().attached.contains_key(&id)
    }

    fn detach(&self, id: u64) {
        if self.lock().attached.remove(&id).is_some() {
            log::debug!("detached surface {}", id);
        }
    }
}

/// A live surface. Detaches itself from its host on drop.
#[derive(Debug)]
pub struct SurfaceGuard {
    host: SurfaceHost,
    id: u64,
    html: String,
    page: PageGeometry,
}

impl SurfaceGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn page(&self) -> PageGeometry {
        self.page
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        self.host.detach(self.id);
    }
}
