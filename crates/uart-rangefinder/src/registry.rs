use crate::PollConfig;
use attr_transport::DeviceId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Poll state keyed by device. At most one entry per device.
#[derive(Debug, Default)]
pub struct PollRegistry {
    configs: Mutex<HashMap<DeviceId, Arc<PollConfig>>>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceId, Arc<PollConfig>>> {
        self.configs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new config unless one exists. The check and the insert happen under one
    /// lock, so concurrent callers for the same device get exactly one `Some`.
    pub fn insert_if_absent(
        &self,
        device: &DeviceId,
        make: impl FnOnce() -> PollConfig,
    ) -> Option<Arc<PollConfig>> {
        match self.lock().entry(device.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(v) => Some(v.insert(Arc::new(make())).clone()),
        }
    }

    pub fn get(&self, device: &DeviceId) -> Option<Arc<PollConfig>> {
        self.lock().get(device).cloned()
    }

    pub fn remove(&self, device: &DeviceId) -> Option<Arc<PollConfig>> {
        self.lock().remove(device)
    }

    pub fn contains(&self, device: &DeviceId) -> bool {
        self.lock().contains_key(device)
    }

    pub fn devices(&self) -> Vec<DeviceId> {
        let mut out: Vec<DeviceId> = self.lock().keys().cloned().collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn second_insert_is_rejected() {
        let reg = PollRegistry::new();
        let dev = DeviceId::new("0x01");
        assert!(reg
            .insert_if_absent(&dev, || PollConfig::new(Duration::from_secs(15)))
            .is_some());
        assert!(reg
            .insert_if_absent(&dev, || PollConfig::new(Duration::from_secs(3)))
            .is_none());
        assert_eq!(reg.get(&dev).map(|c| c.interval()), Some(Duration::from_secs(15)));
    }

    #[test]
    fn concurrent_inserts_yield_one_winner() {
        let reg = Arc::new(PollRegistry::new());
        let dev = DeviceId::new("0x02");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = reg.clone();
                let dev = dev.clone();
                thread::spawn(move || {
                    reg.insert_if_absent(&dev, || PollConfig::new(Duration::from_secs(15)))
                        .is_some()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_then_insert_is_fresh() {
        let reg = PollRegistry::new();
        let dev = DeviceId::new("0x03");
        reg.insert_if_absent(&dev, || PollConfig::new(Duration::from_secs(15)));
        let old = reg.remove(&dev).unwrap();
        old.set_interval(Duration::from_secs(4));
        let fresh = reg
            .insert_if_absent(&dev, || PollConfig::new(Duration::from_secs(15)))
            .unwrap();
        assert_eq!(fresh.interval(), Duration::from_secs(15));
        assert!(reg.remove(&DeviceId::new("0x04")).is_none());
    }
}
