use pretty_assertions::assert_eq;
use waymark_core::{
    DetourDecl, DetourFinding, DiagnosticKind, DomainEvent, HandlerDecl, JourneyDecl, LogicDecl,
    RegistryConfig, StepDecl, TestDecl, WaymarkError,
};
use waymark_test_utils::{
    decl, seed_cart_totals, seed_checkout, setup_registry_set, setup_registry_set_with,
};
use waymark_validate::{DetourError, ValidationError};

fn keys<M>(entries: Vec<waymark_core::Entry<M>>) -> Vec<String> {
    entries.into_iter().map(|e| e.key).collect()
}

#[test]
fn test_checkout_journey_is_wired() {
    let set = setup_registry_set();
    seed_checkout(&set);

    assert_eq!(keys(set.journeys().by_persona("Shopper")), ["AddressFix", "Checkout"]);
    assert_eq!(keys(set.journeys().by_tag("revenue")), ["Checkout"]);
    assert_eq!(keys(set.journeys().detour_journeys()), ["AddressFix"]);

    let detours = set.journeys().detours_of("Checkout");
    assert_eq!(detours.len(), 1);
    assert_eq!(detours[0].journey, "AddressFix");

    let audit = set.journeys().validate_detour_graph("Checkout").unwrap();
    assert!(audit.is_clean());

    assert_eq!(
        keys(set.milestones().by_journey("Checkout")),
        ["Cart", "Payment", "Confirmation"]
    );
    assert_eq!(
        keys(set.steps().by_parent("Payment").unwrap()),
        ["enter_card", "confirm_amount"]
    );
    assert_eq!(set.steps().prerequisites_of("confirm_amount"), ["enter_card"]);
    assert!(set.steps().ensure_well_formed("Payment").is_ok());
    assert!(set.diagnostics().is_empty());
}

#[test]
fn test_steps_declared_before_their_milestone() {
    let set = setup_registry_set();
    set.register_step(StepDecl::inline("pack").at(2), decl("ship::Dispatch::pack"))
        .unwrap();
    set.register_step(StepDecl::inline("label").at(1), decl("ship::Dispatch::label"))
        .unwrap();

    assert!(set.steps().by_parent("Dispatch").unwrap().is_empty());

    set.register_milestone(
        waymark_core::MilestoneDecl::new("Dispatch").at(1.0),
        decl("ship::Dispatch"),
    )
    .unwrap();

    assert_eq!(keys(set.steps().by_parent("Dispatch").unwrap()), ["label", "pack"]);
}

#[test]
fn test_lazy_inheritance_chain() {
    let set = setup_registry_set();
    seed_cart_totals(&set);

    // tests nested in behaviors that are themselves still pending
    for (behavior, test) in [
        ("sums_items", "adds_two"),
        ("sums_items", "empty_cart"),
        ("applies_discount", "ten_percent"),
    ] {
        set.register_test(
            TestDecl::inline(test).of_type("unit"),
            decl(&format!("specs::CartTotals::{behavior}::{test}")),
        )
        .unwrap();
    }
    assert!(set.tests().store().is_pending("specs::CartTotals::sums_items::adds_two"));

    assert_eq!(
        keys(set.behaviors().by_expectation("EXP-42")),
        ["sums_items", "applies_discount"]
    );
    assert_eq!(
        keys(set.tests().by_expectation("EXP-42")),
        ["EXP-42-TEST-001", "EXP-42-TEST-002", "EXP-42-TEST-003"]
    );
    assert_eq!(
        keys(set.tests().by_behavior("applies_discount")),
        ["EXP-42-TEST-003"]
    );

    // provisional key still finds the test
    let entry = set
        .tests()
        .get("specs::CartTotals::sums_items::empty_cart")
        .unwrap();
    assert_eq!(entry.key, "EXP-42-TEST-002");

    // later tests continue the counter
    let id = set
        .register_test(TestDecl::for_behavior("rounding", "sums_items"), decl("specs::Rounding"))
        .unwrap();
    assert_eq!(id, "EXP-42-TEST-004");
    assert_eq!(set.tests().count_for_expectation("EXP-42"), 4);
    assert_eq!(set.stats().pending(), 0);
}

#[test]
fn test_unresolved_parent_reported_once() {
    let set = setup_registry_set();
    set.register_test(TestDecl::inline("orphan"), decl("specs::Ghost::orphan"))
        .unwrap();

    set.resolve_all();
    set.resolve_all();
    let _ = set.tests().all();

    let diagnostics = set.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedParent);
    assert_eq!(diagnostics[0].subject, "specs::Ghost::orphan");
}

#[test]
fn test_handlers_run_by_priority() {
    let set = setup_registry_set();
    set.register_event(DomainEvent::new("OrderPlaced").on_aggregate("Order"), decl("events::OrderPlaced"))
        .unwrap();
    for (handler, priority) in [("email", 5), ("ledger", 10), ("audit", 1)] {
        set.register_handler(
            HandlerDecl::new(decl("events::OrderPlaced"), handler).with_priority(priority),
            decl(&format!("handlers::{handler}")),
        )
        .unwrap();
    }

    assert_eq!(
        keys(set.events().handlers_for("OrderPlaced")),
        ["OrderPlaced::ledger", "OrderPlaced::email", "OrderPlaced::audit"]
    );
}

#[test]
fn test_invalid_detour_rejects_journey() {
    let set = setup_registry_set();
    let err = set
        .register_journey(
            JourneyDecl::new("Returns")
                .with_milestone("Request", 1.0)
                .with_milestone("Refund", 2.0)
                .with_detour(DetourDecl::new("Inspection", 2.0)),
            decl("journeys::Returns"),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        WaymarkError::Validation(ValidationError::Detour(DetourError::IntegerOrder { .. }))
    ));
    assert_eq!(err.kind(), "detour");
    assert!(set.journeys().get("Returns").is_none());
}

#[test]
fn test_detour_audit_reports_missing_sub_journey() {
    let set = setup_registry_set();
    set.register_journey(
        JourneyDecl::new("Returns")
            .with_milestone("Request", 1.0)
            .with_milestone("Refund", 2.0)
            .with_detour(DetourDecl::new("Inspection", 1.5)),
        decl("journeys::Returns"),
    )
    .unwrap();

    let audit = set.journeys().validate_detour_graph("Returns").unwrap();
    assert!(audit.is_valid());
    assert_eq!(
        audit.warnings,
        [DetourFinding::SubJourneyMissing {
            detour: "Inspection".to_string()
        }]
    );
    assert_eq!(set.diagnostics()[0].kind, DiagnosticKind::DetourGraph);
}

#[test]
fn test_logic_cycle_detection_modes() {
    let lazy = setup_registry_set();
    lazy.register_logic(LogicDecl::new("pricing").invokes("tax"), decl("logic::Pricing"))
        .unwrap();
    lazy.register_logic(LogicDecl::new("tax").invokes("pricing"), decl("logic::Tax"))
        .unwrap();
    assert_eq!(lazy.logic().find_cycle("pricing").unwrap(), ["pricing", "tax", "pricing"]);
    assert!(lazy.logic().dependency_order().unwrap_err().is_cycle());

    let eager = setup_registry_set_with(RegistryConfig::default().with_eager_cycle_check(true));
    eager
        .register_logic(LogicDecl::new("pricing").invokes("tax"), decl("logic::Pricing"))
        .unwrap();
    let err = eager
        .register_logic(LogicDecl::new("tax").invokes("pricing"), decl("logic::Tax"))
        .unwrap_err();
    assert!(err.is_cycle());
    assert_eq!(eager.stats().logic.total, 1);
}

#[test]
fn test_step_ordering_strictness() {
    let lenient = setup_registry_set();
    let strict = setup_registry_set_with(RegistryConfig::default().with_strict_step_order(true));

    for set in [&lenient, &strict] {
        set.register_step(StepDecl::standalone("a").under("Pack").at(1), decl("pack::A"))
            .unwrap();
        set.register_step(StepDecl::standalone("b").under("Pack").at(3), decl("pack::B"))
            .unwrap();
    }

    assert!(lenient.steps().ensure_well_formed("Pack").is_ok());
    assert!(strict.steps().ensure_well_formed("Pack").is_err());
    assert!(lenient
        .diagnostics()
        .iter()
        .all(|d| d.kind == DiagnosticKind::StepOrdering));
}

#[test]
fn test_duplicate_declarations_rejected() {
    let set = setup_registry_set();
    seed_checkout(&set);

    let err = set
        .register_journey(JourneyDecl::new("Checkout"), decl("journeys::Other"))
        .unwrap_err();
    assert!(err.is_duplicate());

    let err = set
        .register_step(StepDecl::inline("zero").at(0), decl("checkout::Payment::zero"))
        .unwrap_err();
    assert_eq!(err.kind(), "declaration");
}
