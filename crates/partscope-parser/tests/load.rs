use partscope_core::{
    expr::Expr,
    model::{ElementKind, Model},
};
use partscope_parser::{ErrorCode, load};

const REINDEER: &str = include_str!("../../../models/reindeer.sysml");
const SLEIGH: &str = include_str!("../../../models/sleigh.sysml");
const WORKSHOP: &str = include_str!("../../../models/workshop.sysml");

fn load_clean(source: &str) -> Model {
    let loaded = load(source).expect("Failed to load");
    assert!(
        loaded.warnings().is_empty(),
        "unexpected warnings: {:?}",
        loaded.warnings()
    );
    loaded.into_parts().0
}

fn first_code(source: &str) -> Option<ErrorCode> {
    let err = load(source).expect_err("Expected loading to fail");
    err.diagnostics()[0].code()
}

#[test]
fn test_reindeer_model() {
    let model = load_clean(REINDEER);

    let reindeer = model
        .find_by_qualified_name("ReindeerModel::Reindeer")
        .expect("Reindeer");
    let rudolph = model.find_by_name("Rudolph").expect("Rudolph");
    assert_eq!(model.element(rudolph).kind(), ElementKind::PartDefinition);
    assert!(model.specializes(rudolph, reindeer));

    let weight = model.feature(reindeer, "weight").expect("weight");
    let rudolph_weight = model.feature(rudolph, "weight").expect("weight");
    assert!(model.redefines_transitively(rudolph_weight, weight));
    assert_eq!(
        model.element(weight).value().map(Expr::to_string),
        Some("500 [kg]".to_string())
    );

    // The nested shorthand redefinitions take their kind from the redefined
    // attributes of ReindeerFeatures.
    let features = model.feature(rudolph, "features").expect("features");
    let nose = model.feature(features, "noseColor").expect("noseColor");
    assert_eq!(model.element(nose).kind(), ElementKind::Feature);
    assert_eq!(model.path_of(nose), "ReindeerModel::Rudolph::features::noseColor");
    assert!(model.element(nose).redefines().is_some());
}

#[test]
fn test_sleigh_model() {
    let model = load_clean(SLEIGH);

    let sleigh = model.find_by_name("SantaSleigh").expect("SantaSleigh");
    let team = model.feature(sleigh, "team").expect("team");
    assert_eq!(model.element(team).kind(), ElementKind::PartUsage);
    assert_eq!(model.element(team).multiplicity(), 8);

    // Inherited from Sleigh
    assert!(model.feature(sleigh, "maxLoad").is_some());

    let mode = model.feature(sleigh, "flightMode").expect("flightMode");
    assert!(matches!(
        model.element(mode).value(),
        Some(Expr::Conditional { .. })
    ));
}

#[test]
fn test_workshop_annotations() {
    let model = load_clean(WORKSHOP);

    let elf = model.find_by_name("Elf").expect("Elf");
    let locales: Vec<_> = model
        .annotations(elf)
        .filter_map(|id| model.element(id).locale())
        .collect();
    assert_eq!(locales, vec!["en_US", "hu_HU", "lt_LT"]);

    let machine = model.find_by_name("ToyMachine").expect("ToyMachine");
    let kinds: Vec<_> = model
        .annotations(machine)
        .map(|id| model.element(id).kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            ElementKind::Comment,
            ElementKind::Comment,
            ElementKind::Documentation,
            ElementKind::Comment,
        ]
    );

    let note = model.find_by_name("SafetyNote").expect("SafetyNote");
    assert_eq!(model.element(note).about(), &[machine, elf]);
}

#[test]
fn test_error_models() {
    assert_eq!(
        first_code(include_str!("../../../models/errors/undefined_type.sysml")),
        Some(ErrorCode::E200)
    );
    assert_eq!(
        first_code(include_str!("../../../models/errors/duplicate_member.sysml")),
        Some(ErrorCode::E203)
    );
    assert_eq!(
        first_code(include_str!(
            "../../../models/errors/generalization_cycle.sysml"
        )),
        Some(ErrorCode::E204)
    );
}

#[test]
fn test_warnings_come_back_with_the_model() {
    let loaded = load(include_str!("../../../models/errors/shadowed_feature.sysml"))
        .expect("Warnings should not fail loading");
    assert!(loaded.has_warnings());
    assert_eq!(loaded.warnings()[0].code(), Some(ErrorCode::E207));
    assert!(loaded.model().find_by_name("Dasher").is_some());
}

#[test]
fn test_syntax_errors_stop_loading() {
    assert_eq!(first_code("part def A { attribute x = ; }"), Some(ErrorCode::E100));
    assert_eq!(first_code("part def A { $ }"), Some(ErrorCode::E002));
    assert_eq!(first_code("doc /* open"), Some(ErrorCode::E003));
}

#[test]
fn test_empty_source() {
    let model = load_clean("");
    assert!(model.is_empty());

    let model = load_clean("// only a comment\n");
    assert!(model.is_empty());
}
