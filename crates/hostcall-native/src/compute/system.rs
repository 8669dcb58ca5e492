//! Host system information and the connectivity payload.

use hostcall_common::{Result, StructuredValue};
use std::collections::BTreeMap;

const HELLO_ID: &str = "node";
const HELLO_PRIMES: [i64; 8] = [2, 3, 5, 7, 11, 13, 17, 19];

/// Facts about the machine, queried once when the dispatcher is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    cpu_count: usize,
}

impl SystemInfo {
    /// Asks the OS for the number of logical processors.
    pub fn query() -> Self {
        let cpu_count = num_cpus::get().max(1);
        tracing::info!(cpu_count, "queried system info");
        Self { cpu_count }
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    /// The fixed `hello` payload: an identifier, a few primes and the CPU count.
    pub fn hello(&self) -> StructuredValue {
        let mut map = BTreeMap::new();
        map.insert("id".to_string(), StructuredValue::from(HELLO_ID));
        map.insert("values".to_string(), StructuredValue::from(HELLO_PRIMES.to_vec()));
        map.insert("x".to_string(), StructuredValue::Number(self.cpu_count as f64));
        StructuredValue::Mapping(map)
    }

    pub fn handle_hello(&self, _args: StructuredValue) -> Result<StructuredValue> {
        Ok(self.hello())
    }

    pub fn handle_cpu_count(&self, _args: StructuredValue) -> Result<StructuredValue> {
        Ok(StructuredValue::Integer(self.cpu_count as i64))
    }
}
