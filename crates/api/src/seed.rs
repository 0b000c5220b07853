//! Demo data seeding.
//!
//! Populates the catalog with a few products and registers a demo user
//! with a shipping address so the API is usable straight after startup.

use checkout::{Address, InMemoryAddressDirectory};
use common::{AddressId, ProductId, UserId};
use store::{ProductRecord, StoreError, StorefrontStore};

/// Identifiers created by the seeder, logged at startup for curl sessions.
#[derive(Debug, Clone)]
pub struct DemoData {
    pub user_id: UserId,
    pub address_id: AddressId,
    pub products: Vec<ProductId>,
}

/// Seeds products with stock plus a demo user address.
pub async fn seed_demo_data<S: StorefrontStore>(
    store: &S,
    addresses: &InMemoryAddressDirectory,
) -> Result<DemoData, StoreError> {
    let catalog: [(&str, i64, i32); 4] = [
        ("Mechanical Keyboard", 8900, 25),
        ("Wireless Mouse", 3500, 40),
        ("27in Monitor", 24900, 10),
        ("USB-C Dock", 12900, 15),
    ];

    let mut products = Vec::with_capacity(catalog.len());
    for (name, price_cents, stock) in catalog {
        let product = ProductRecord::new(name, price_cents);
        let product_id = product.id;
        store.insert_product(product, stock).await?;
        tracing::info!(%product_id, name, price_cents, stock, "seeded product");
        products.push(product_id);
    }

    let user_id = UserId::new();
    let address_id = addresses.add(Address::new(
        user_id,
        "42 Demo Street",
        "Springfield",
        "12345",
        "US",
    ));
    tracing::info!(%user_id, %address_id, "seeded demo user and address");

    Ok(DemoData {
        user_id,
        address_id,
        products,
    })
}
