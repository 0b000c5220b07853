//! Shipping address directory.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AddressId, UserId};
use serde::Serialize;

use crate::error::CheckoutError;

/// A shipping address on file for a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    pub fn new(
        user_id: UserId,
        street: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            id: AddressId::new(),
            user_id,
            street: street.into(),
            city: city.into(),
            postal_code: postal_code.into(),
            country: country.into(),
        }
    }
}

/// Trait for looking up shipping addresses.
#[async_trait]
pub trait AddressDirectory: Send + Sync {
    /// Looks up an address by id.
    async fn get_address(&self, address_id: AddressId) -> Result<Option<Address>, CheckoutError>;
}

/// In-memory address directory for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressDirectory {
    addresses: Arc<RwLock<HashMap<AddressId, Address>>>,
}

impl InMemoryAddressDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an address and returns its id.
    pub fn add(&self, address: Address) -> AddressId {
        let id = address.id;
        self.addresses.write().unwrap().insert(id, address);
        id
    }
}

#[async_trait]
impl AddressDirectory for InMemoryAddressDirectory {
    async fn get_address(&self, address_id: AddressId) -> Result<Option<Address>, CheckoutError> {
        Ok(self.addresses.read().unwrap().get(&address_id).cloned())
    }
}
