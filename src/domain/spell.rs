//! Compiled operation descriptors ("spells").

use serde::Serialize;

/// Number of register slots carried by each descriptor.
pub const REGISTER_SLOTS: usize = 4;

/// Register bindings for one descriptor.
///
/// Index `k` is the argument slot (for `getIds`) or output slot (for `setIds`);
/// a nonzero value is the register id bound to it, zero means "literal".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RegisterSlots(pub [u32; REGISTER_SLOTS]);

impl RegisterSlots {
    pub fn none() -> Self {
        Self([0; REGISTER_SLOTS])
    }

    /// Bind `slot` to `register`.
    ///
    /// # Panics
    /// Panics if `slot >= REGISTER_SLOTS`; slots are compile-time constants of each spell.
    pub fn with(mut self, slot: usize, register: u32) -> Self {
        self.0[slot] = register;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|r| *r == 0)
    }

    pub fn as_array(&self) -> [u32; REGISTER_SLOTS] {
        self.0
    }
}

/// One step of an atomic multi-step execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub connector: String,
    pub method: String,
    /// Literal arguments; integers are already in on-chain base units.
    pub args: Vec<String>,
    pub get_ids: RegisterSlots,
    pub set_ids: RegisterSlots,
}

impl OperationDescriptor {
    pub fn new(connector: &str, method: &str, args: Vec<String>) -> Self {
        Self {
            connector: connector.to_string(),
            method: method.to_string(),
            args,
            get_ids: RegisterSlots::none(),
            set_ids: RegisterSlots::none(),
        }
    }

    /// Read argument `slot` from `register` at execution time.
    pub fn reading(mut self, slot: usize, register: u32) -> Self {
        self.get_ids = self.get_ids.with(slot, register);
        self
    }

    /// Store output `slot` into `register` after execution.
    pub fn storing(mut self, slot: usize, register: u32) -> Self {
        self.set_ids = self.set_ids.with(slot, register);
        self
    }
}

/// An ordered, immutable list of descriptors produced by one compile call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spell {
    operations: Vec<OperationDescriptor>,
}

impl Spell {
    pub fn new(operations: Vec<OperationDescriptor>) -> Self {
        Self { operations }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Hex SHA-256 of the canonical JSON encoding.
    ///
    /// Two compiles of the same inputs produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        for op in &self.operations {
            // Serializing plain strings and integer arrays cannot fail.
            let encoded = serde_json::to_vec(op).unwrap_or_default();
            hasher.update((encoded.len() as u32).to_le_bytes());
            hasher.update(&encoded);
        }
        hex::encode(hasher.finalize())
    }
}
