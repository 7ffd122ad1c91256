//! Basic usage example for `VaultDoc`.

use vaultdoc::prelude::*;
use vaultdoc_memory::{MemoryCache, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("VaultDoc Basic Usage Example");
    println!("============================\n");

    let store = MemoryStore::new();
    let cache = MemoryCache::new();

    // Email is encrypted and searchable through its hidden hash; the API key
    // is only ever stored as a digest.
    let policy = FieldPolicy::new()
        .with_encrypted(["email"])
        .with_hashed(["api_key"])
        .with_automatically_hashed(["email"]);
    let key = EncryptedDocument::<MemoryStore>::generate_key();
    println!("✓ Generated key: {}...\n", &key.to_hex()[..16]);

    let users = EncryptedDocument::new(store.clone(), "users", key, policy);
    let config = CacheConfig::new().with_lookup(["name"]);
    let cached = CachedDocument::new(users, cache.clone(), config);

    cached
        .set(
            &Filter::by_id(1),
            record! {
                "_id" => 1,
                "name" => "alice",
                "email" => "alice@example.com",
                "api_key" => "sk-12345",
            },
        )
        .await?;
    println!("✓ Stored user 1");

    for (field, value) in &store.records()[0] {
        println!("  stored {field}: {value}");
    }
    println!();

    let by_name = cached.get(&Filter::new().equals("name", "alice")).await?;
    println!("✓ Cache lookup by name: {by_name:?}\n");

    let filter = Filter::new().hashed_equals("email_hashed", "alice@example.com")?;
    let by_email = cached.collection().find(&filter, None).await?;
    println!("✓ Search by email hash: {by_email:?}\n");

    cached.collection().increment(&Filter::by_id(1), "logins", Value::Int(1)).await?;
    let user = cached.collection().find(&Filter::by_id(1), None).await?;
    println!("✓ After login: {user:?}");

    Ok(())
}
