//! Example: Two phones sharing a shopping list while offline.
//!
//! Run with `RUST_LOG=trace` to see merge events.

use crdt_sets::clock::SystemClock;
use crdt_sets::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Stores visited (G-Set) ===\n");

    let mut alice_stores = GSet::new();
    let mut bob_stores = GSet::new();
    alice_stores.add("bakery");
    bob_stores.add("market");
    bob_stores.add("bakery");

    alice_stores.merge(&bob_stores);
    println!("Visited: {:?}", alice_stores.snapshot());
    println!("Remove refused: {}", !alice_stores.remove(&"bakery"));

    println!("\n=== Items bought once (2P-Set) ===\n");

    let mut alice_bought = TwoPSet::new();
    let mut bob_bought = TwoPSet::new();

    alice_bought.add("coupon-17");
    bob_bought.remove(&"coupon-17"); // Bob redeemed it before seeing Alice's add

    alice_bought.merge(&bob_bought);
    println!("{alice_bought}");
    println!("coupon-17 usable: {}", alice_bought.contains(&"coupon-17"));

    println!("\n=== Shopping list (LWW-Set) ===\n");

    let mut alice = LwwSet::with_clock(SystemClock::new());
    let mut bob = LwwSet::with_clock(SystemClock::new());

    alice.add("milk");
    alice.add("eggs");
    bob.merge(&alice);

    // Offline: Bob buys the milk, Alice then decides she wants more milk.
    bob.remove(&"milk");
    alice.add("milk");
    alice.add("bread");

    println!("Alice: {:?}", alice.snapshot());
    println!("Bob:   {:?}", bob.snapshot());

    let to_bob = alice.delta(&bob);
    let to_alice = bob.delta(&alice);
    bob.apply_delta(&to_bob);
    alice.apply_delta(&to_alice);

    println!("\n--- After sync ---");
    println!("Alice: {:?}", alice.snapshot());
    println!("Bob:   {:?}", bob.snapshot());
    println!("Converged: {}", alice == bob);
}
