//! Device Registry
//!
//! Maps the opaque token a device presents to a dense 0-based index and
//! tracks whether the device answered the current sweep round.
//!
//! Indices are only meaningful until the next [`DeviceRegistry::end_sweep_round`]:
//! compaction renumbers the survivors, so anything that lives longer than one
//! dispatch must hold the token and re-resolve.

use std::collections::HashMap;

/// A device known to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Current position in the registry
    pub index: usize,
    /// External identity this index currently represents
    pub token: String,
    /// Answered (or spoke during) the current sweep round
    pub alive: bool,
}

/// Registry of devices seen on the bus
///
/// Not synchronized; callers share it behind a single lock.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    by_token: HashMap<String, usize>,
    round_open: bool,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a token, appending a new device if it has not been seen
    ///
    /// While a sweep round is open the device is marked alive: it just proved
    /// it is there by speaking.
    pub fn resolve(&mut self, token: &str) -> usize {
        let index = match self.by_token.get(token) {
            Some(&index) => index,
            None => {
                let index = self.devices.len();
                self.devices.push(Device {
                    index,
                    token: token.to_owned(),
                    alive: false,
                });
                self.by_token.insert(token.to_owned(), index);
                index
            }
        };

        if self.round_open {
            self.devices[index].alive = true;
        }

        index
    }

    /// Mark a device alive. Stale indices are ignored.
    pub fn mark_alive(&mut self, index: usize) {
        if let Some(device) = self.devices.get_mut(index) {
            device.alive = true;
        }
    }

    /// Snapshot all devices for ping fan-out and clear their liveness flags
    pub fn begin_sweep_round(&mut self) -> Vec<(usize, String)> {
        let snapshot = self
            .devices
            .iter()
            .map(|d| (d.index, d.token.clone()))
            .collect();

        for device in &mut self.devices {
            device.alive = false;
        }
        self.round_open = true;

        snapshot
    }

    /// Evict every device that stayed silent and compact the index space
    ///
    /// Survivors keep their relative order. Returns the evicted tokens.
    pub fn end_sweep_round(&mut self) -> Vec<String> {
        let (survivors, evicted): (Vec<Device>, Vec<Device>) =
            self.devices.drain(..).partition(|d| d.alive);

        self.devices = survivors;
        self.by_token.clear();
        for (index, device) in self.devices.iter_mut().enumerate() {
            device.index = index;
            self.by_token.insert(device.token.clone(), index);
        }
        self.round_open = false;

        evicted.into_iter().map(|d| d.token).collect()
    }

    /// Whether a sweep round is in flight
    pub fn round_open(&self) -> bool {
        self.round_open
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Token currently held by an index
    pub fn token(&self, index: usize) -> Option<&str> {
        self.devices.get(index).map(|d| d.token.as_str())
    }

    /// Index currently held by a token, without registering it
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.by_token.get(token).copied()
    }

    pub fn is_alive(&self, index: usize) -> bool {
        self.devices.get(index).is_some_and(|d| d.alive)
    }

    /// Iterate devices in index order
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }
}
