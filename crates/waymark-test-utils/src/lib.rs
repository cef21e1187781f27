//! Testing utilities for Waymark workspace
//!
//! Shared fixtures: a checkout domain with a shopper persona, a checkout
//! journey with one detour, and an expectation with nested behaviors.

#![allow(missing_docs)]

use std::sync::Once;
use waymark_core::{
    BehaviorDecl, DetourDecl, Expectation, JourneyDecl, MilestoneDecl, Persona, RegistryConfig,
    RegistrySet, RejoinPoint, StepDecl,
};
use waymark_registry::DeclId;

static TRACING: Once = Once::new();

/// Route `tracing` output to the test writer, once per test binary
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn decl(path: &str) -> DeclId {
    DeclId::new(path.split("::"))
}

pub fn setup_registry_set() -> RegistrySet {
    init_test_tracing();
    RegistrySet::new(RegistryConfig::default())
}

pub fn setup_registry_set_with(config: RegistryConfig) -> RegistrySet {
    init_test_tracing();
    RegistrySet::new(config)
}

pub fn shopper() -> Persona {
    Persona::new("Shopper")
        .with_role("customer")
        .with_goal("buy things quickly")
}

pub fn checkout_journey() -> JourneyDecl {
    JourneyDecl::new("Checkout")
        .for_persona(decl("people::ShopperPersona"))
        .with_tag("revenue")
        .with_milestone("Cart", 1.0)
        .with_milestone("Payment", 2.0)
        .with_milestone("Confirmation", 3.0)
        .with_detour(
            DetourDecl::new(decl("journeys::AddressFix"), 1.5)
                .triggered_after("Cart")
                .rejoins_at(RejoinPoint::Milestone("Payment".into()))
                .when("address invalid"),
        )
}

pub fn address_fix_journey() -> JourneyDecl {
    JourneyDecl::new("AddressFix")
        .for_persona("Shopper")
        .as_detour()
}

/// Persona, both journeys, their milestones and the payment steps
pub fn seed_checkout(set: &RegistrySet) {
    set.register_persona(shopper(), decl("people::ShopperPersona"))
        .unwrap();
    set.register_journey(address_fix_journey(), decl("journeys::AddressFix"))
        .unwrap();
    set.register_journey(checkout_journey(), decl("journeys::Checkout"))
        .unwrap();

    for (name, order) in [("Cart", 1.0), ("Payment", 2.0), ("Confirmation", 3.0)] {
        set.register_milestone(
            MilestoneDecl::new(name).in_journey("Checkout").at(order),
            decl(&format!("checkout::{name}")),
        )
        .unwrap();
    }

    set.register_step(
        StepDecl::inline("enter_card").at(1),
        decl("checkout::Payment::enter_card"),
    )
    .unwrap();
    set.register_step(
        StepDecl::inline("confirm_amount").at(2).after("enter_card"),
        decl("checkout::Payment::confirm_amount"),
    )
    .unwrap();
}

/// Expectation `EXP-42` with two nested behaviors, declared children first
pub fn seed_cart_totals(set: &RegistrySet) {
    set.register_behavior(
        BehaviorDecl::inline("sums_items").in_category("pricing"),
        decl("specs::CartTotals::sums_items"),
    )
    .unwrap();
    set.register_behavior(
        BehaviorDecl::inline("applies_discount").in_category("pricing"),
        decl("specs::CartTotals::applies_discount"),
    )
    .unwrap();
    set.register_expectation(
        Expectation::new("EXP-42")
            .with_title("Cart totals are correct")
            .in_context("checkout"),
        decl("specs::CartTotals"),
    )
    .unwrap();
}
