//! End-to-end resolution and evaluation tests

use calcgraph::prelude::*;
use calcgraph::{CatalogTranslator, ResolverOptions};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn period() -> FinancialPeriod {
    FinancialPeriod::calendar_year(2024).unwrap()
}

fn company(location: &str) -> CompanyContext {
    CompanyContext::new("acme", period(), location)
}

fn materials() -> MemoryMaterials {
    let mut materials = MemoryMaterials::new();
    materials.insert(
        "acme",
        period(),
        MaterialSheet::new(
            "numbers",
            vec![vec![1.0.into(), 2.0.into(), "x".into(), 4.0.into()]],
        ),
    );
    materials.insert(
        "acme",
        period(),
        MaterialSheet::new(
            "fruit",
            vec![
                vec!["apple".into()],
                vec!["banana".into()],
                vec!["Apple pie".into()],
            ],
        ),
    );
    materials
}

fn create(manager: &VersionManager<'_>, unique_id: &str, expression: Vec<Pointer>) {
    manager
        .create_calculation(unique_id, CalculationData::new("USD", expression))
        .unwrap();
}

#[test]
fn test_sum_and_countif_feed_arithmetic() {
    let store = MemoryStore::new();
    let manager = VersionManager::new(&store);
    create(
        &manager,
        "score",
        vec![
            Pointer::aggregate("numbers", AggregateScope::Row(0), AggregateFunction::Sum),
            Pointer::literal("*"),
            Pointer::aggregate(
                "fruit",
                AggregateScope::Column(0),
                AggregateFunction::CountIf {
                    criteria: "apple".into(),
                },
            ),
        ],
    );

    let materials = materials();
    let result = Calculator::new(&store, &materials)
        .evaluate_latest(&company("berlin"), "score")
        .unwrap();
    assert_eq!(result.value, CalcValue::Number(14.0));
    assert!(result.reasons.is_empty());
}

#[test]
fn test_cycle_through_store() {
    let store = MemoryStore::new();
    let manager = VersionManager::new(&store);
    create(&manager, "a", vec![Pointer::calculation("b")]);
    create(
        &manager,
        "b",
        vec![Pointer::literal("1"), Pointer::literal("+"), Pointer::calculation("a")],
    );

    let materials = materials();
    let calculator = Calculator::new(&store, &materials);
    let result = calculator.evaluate_latest(&company("berlin"), "a").unwrap();
    assert_eq!(result.value, CalcValue::Number(1.0));
    assert_eq!(result.reasons, vec!["cycle detected: a"]);
    assert!(calculator.reference_graph().unwrap().has_cycle("a"));
}

#[test]
fn test_calculation_refs_follow_latest_version() {
    let store = MemoryStore::new();
    let manager = VersionManager::new(&store);
    create(&manager, "base", vec![Pointer::literal("10")]);
    create(
        &manager,
        "double",
        vec![Pointer::calculation("base"), Pointer::literal("*"), Pointer::literal("2")],
    );
    manager
        .edit_calculation("base", CalculationData::new("USD", vec![Pointer::literal("15")]))
        .unwrap();

    let materials = materials();
    let result = Calculator::new(&store, &materials)
        .evaluate_latest(&company("berlin"), "double")
        .unwrap();
    assert_eq!(result.value, CalcValue::Number(30.0));
}

#[test]
fn test_constant_fallback_is_configurable() {
    let store = MemoryStore::new();
    let manager = VersionManager::new(&store);
    manager
        .create_constant(
            Constant::new("rate", 2024, "%")
                .with_sample("global", 2.0)
                .with_sample("paris", 3.0),
        )
        .unwrap();
    create(&manager, "r", vec![Pointer::constant("rate")]);

    let materials = materials();
    let options = CalculatorOptions {
        resolution: ResolverOptions {
            default_location: "global".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let calculator = Calculator::new(&store, &materials).with_options(options);

    let paris = calculator.evaluate_latest(&company("paris"), "r").unwrap();
    assert_eq!(paris.value, CalcValue::Number(3.0));
    let berlin = calculator.evaluate_latest(&company("berlin"), "r").unwrap();
    assert_eq!(berlin.value, CalcValue::Number(2.0));

    // Default options look for a "default" sample, which does not exist
    let strict = Calculator::new(&store, &materials)
        .evaluate_latest(&company("berlin"), "r")
        .unwrap();
    assert_eq!(strict.value, CalcValue::Number(0.0));
    assert_eq!(strict.reasons, vec!["constant unresolved: rate"]);
}

#[test]
fn test_error_result_keeps_resolution_reasons() {
    let store = MemoryStore::new();
    let manager = VersionManager::new(&store);
    create(
        &manager,
        "ratio",
        vec![Pointer::literal("1"), Pointer::literal("/"), Pointer::constant("missing")],
    );

    let materials = materials();
    let mut messages = HashMap::new();
    messages.insert("division by zero".to_string(), "Division durch Null".to_string());
    let translator = CatalogTranslator::new(messages);
    let result = Calculator::new(&store, &materials)
        .with_translator(&translator)
        .evaluate_latest(&company("berlin"), "ratio")
        .unwrap();

    assert_eq!(result.value, CalcValue::Error);
    assert_eq!(
        result.reasons,
        vec!["constant unresolved: missing", "Division durch Null"]
    );
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({
            "value": "ERROR!",
            "reasons": ["constant unresolved: missing", "Division durch Null"]
        })
    );
}

#[test]
fn test_repeated_evaluation_is_identical() {
    let store = MemoryStore::new();
    let manager = VersionManager::new(&store);
    create(
        &manager,
        "mix",
        vec![
            Pointer::material_cell("numbers", 0, 2),
            Pointer::literal("+"),
            Pointer::material_cell("numbers", 0, 3),
            Pointer::literal("-"),
            Pointer::constant("nothing"),
        ],
    );

    let materials = materials();
    let calculator = Calculator::new(&store, &materials);
    let first = calculator.evaluate_latest(&company("berlin"), "mix").unwrap();
    let second = calculator.evaluate_latest(&company("berlin"), "mix").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.value, CalcValue::Number(4.0));
    assert_eq!(
        first.reasons,
        vec!["cell not numeric: numbers[0,2]", "constant unresolved: nothing"]
    );
}
