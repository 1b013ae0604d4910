//! Customer lookup collaborator
//!
//! Customer management lives outside this core; the engine only needs
//! display names, used for the EFT recipient-name check and for statement
//! assembly. The trait is the seam the surrounding system plugs its
//! customer service into.

use std::collections::HashMap;
use uuid::Uuid;

/// Display name of an account owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerName {
    pub first_name: String,
    pub last_name: String,
}

impl CustomerName {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive match on both parts, ignoring surrounding
    /// whitespace.
    pub fn matches(&self, first_name: &str, last_name: &str) -> bool {
        fold(&self.first_name) == fold(first_name) && fold(&self.last_name) == fold(last_name)
    }
}

/// Uppercase fold. Uppercasing rather than lowercasing so dotless ı maps
/// onto I and "Yılmaz" compares equal to "YILMAZ".
fn fold(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Resolves account owners to display names.
pub trait CustomerDirectory: Send + Sync {
    fn name_of(&self, customer_id: Uuid) -> Option<CustomerName>;
}

/// Map-backed directory for tests and the demo binary.
#[derive(Debug, Default)]
pub struct InMemoryCustomerDirectory {
    names: HashMap<Uuid, CustomerName>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, customer_id: Uuid, name: CustomerName) {
        self.names.insert(customer_id, name);
    }
}

impl CustomerDirectory for InMemoryCustomerDirectory {
    fn name_of(&self, customer_id: Uuid) -> Option<CustomerName> {
        self.names.get(&customer_id).cloned()
    }
}
