//! An explicit, identifier-keyed store of built devices.
//!
//! Devices are inserted once under a fresh v4 UUID and can then be looked up or described.
//! There is no update and no eviction; the store lives as long as its owner.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::definition::{Definition, DfaTable, DpdaTable, DtmTable};
use crate::device::Device;
use crate::types::{AutomatonError, Kind};

/// A summary of a stored device, suitable for serializing back to a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub id: Uuid,
    pub kind: Kind,
    pub states: BTreeSet<String>,
    pub input_symbols: BTreeSet<char>,
    pub initial_state: String,
    pub final_states: BTreeSet<String>,
    pub transition_count: usize,
    pub extras: DeviceExtras,
}

/// The fields only some kinds of device carry, together with their transition tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeviceExtras {
    Dfa {
        transitions: DfaTable,
    },
    Dpda {
        stack_symbols: BTreeSet<char>,
        initial_stack_symbol: char,
        transitions: DpdaTable,
    },
    Dtm {
        tape_symbols: BTreeSet<char>,
        blank_symbol: char,
        transitions: DtmTable,
    },
}

impl DeviceInfo {
    pub fn new(id: Uuid, device: &Device) -> Self {
        let extras = match device.definition() {
            Definition::Dfa(d) => DeviceExtras::Dfa {
                transitions: d.transitions,
            },
            Definition::Dpda(d) => DeviceExtras::Dpda {
                stack_symbols: d.stack_symbols,
                initial_stack_symbol: d.initial_stack_symbol,
                transitions: d.transitions,
            },
            Definition::Dtm(d) => DeviceExtras::Dtm {
                tape_symbols: d.tape_symbols,
                blank_symbol: d.blank_symbol,
                transitions: d.transitions,
            },
        };

        Self {
            id,
            kind: device.kind(),
            states: device.states().clone(),
            input_symbols: device.input_symbols().clone(),
            initial_state: device.initial_state().to_string(),
            final_states: device.final_states().clone(),
            transition_count: device.transition_count(),
            extras,
        }
    }
}

/// Stores devices by identifier. Safe to share between threads.
#[derive(Debug, Default)]
pub struct Registry {
    devices: RwLock<HashMap<Uuid, Arc<Device>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `device` and returns its new identifier.
    pub fn insert(&self, device: Device) -> Result<Uuid, AutomatonError> {
        let id = Uuid::new_v4();
        let kind = device.kind();

        self.devices
            .write()
            .map_err(|_| AutomatonError::Storage("Failed to acquire write lock".to_string()))?
            .insert(id, Arc::new(device));

        tracing::info!(%id, %kind, "device registered");
        Ok(id)
    }

    pub fn get(&self, id: &Uuid) -> Result<Arc<Device>, AutomatonError> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| AutomatonError::NotFound(format!("Device {} not found", id)))
    }

    pub fn info(&self, id: &Uuid) -> Result<DeviceInfo, AutomatonError> {
        self.get(id).map(|device| DeviceInfo::new(*id, &device))
    }

    pub fn len(&self) -> Result<usize, AutomatonError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AutomatonError> {
        Ok(self.read()?.is_empty())
    }

    /// All identifiers, sorted.
    pub fn ids(&self) -> Result<Vec<Uuid>, AutomatonError> {
        let mut ids: Vec<Uuid> = self.read()?.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, Arc<Device>>>, AutomatonError> {
        self.devices
            .read()
            .map_err(|_| AutomatonError::Storage("Failed to acquire read lock".to_string()))
    }
}
