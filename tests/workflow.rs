use specialty_reconciliation::{
    read_survey, CancellationToken, CandidateStatus, EngineError, GroupOrigin, MappingState, MemoryStore, Metric,
    ReconciliationService, SpecialtyKey, SqliteStore,
};
use std::collections::BTreeSet;
use std::sync::Arc;

const SURVEY: &str = "\
vendor,specialty,n,tcc_p25,tcc_p50,tcc_p75,tcc_p90
MGMA,Family Medicine,900,250000,290000,340000,400000
SullivanCotter,Family Practice,610,260000,300000,350000,410000
Gallagher,Family Medicine (General),320,,,,
MGMA,Dermatology,210,400000,500000,600000,700000
Gallagher,Dermatology,95,420000,520000,610000,720000
MGMA,Hem/Onc,150,450000,560000,680000,800000
SullivanCotter,Hematology & Medical Oncology,140,460000,580000,690000,810000
MGMA,Space Medicine,3,100000,200000,300000,400000
";

fn key(name: &str, vendor: &str) -> SpecialtyKey {
    SpecialtyKey::new(name, vendor)
}

fn loaded_service() -> ReconciliationService {
    let store = SqliteStore::open_in_memory().unwrap();
    let service = ReconciliationService::open(Arc::new(store)).unwrap();
    service.ingest(read_survey(SURVEY.as_bytes()).unwrap()).unwrap();
    service
}

fn universe(service: &ReconciliationService) -> BTreeSet<SpecialtyKey> {
    service
        .unmapped()
        .iter()
        .map(|s| s.key())
        .chain(service.groups().iter().flat_map(|g| g.member_keys()))
        .collect()
}

#[test]
fn test_interactive_mapping_end_to_end() {
    let service = loaded_service();
    let before = universe(&service);
    assert_eq!(before.len(), 8);

    // Suggest → approve one, reject the other → finalized group
    let source = key("Family Medicine", "MGMA");
    let candidates = service.suggest(&source).unwrap();
    assert_eq!(candidates.len(), 2);

    service
        .update_status(&source, &key("Family Practice", "SullivanCotter"), CandidateStatus::Approved)
        .unwrap();
    assert_eq!(service.state_of(&source), Some(MappingState::PartiallyResolved));

    let transition = service
        .update_status(&source, &key("Family Medicine (General)", "Gallagher"), CandidateStatus::Rejected)
        .unwrap();
    assert_eq!(transition.state, MappingState::Finalized);
    let family = transition.group_id.unwrap();

    // Committed members never come back as candidates
    let leftovers = service.suggest(&key("Family Medicine (General)", "Gallagher")).unwrap();
    assert!(leftovers.is_empty());

    // Manual group and explicit single source
    let derm = service
        .commit_manual(&[key("Dermatology", "MGMA"), key("Dermatology", "Gallagher")])
        .unwrap();
    let space = service.mark_single_source(&key("Space Medicine", "MGMA")).unwrap();
    let space_group = service.group(&space).unwrap();
    assert!(space_group.is_single_source);
    assert_eq!(space_group.members.len(), 1);
    assert_eq!(space_group.origin, GroupOrigin::SingleSource);

    // Market data
    let family_data = service.market_data(&family).unwrap();
    assert_eq!(family_data.tcc.p50.value, Some(295000.0));
    assert_eq!(family_data.record_count, 1510);

    assert_eq!(service.percentile_rank(&derm, Metric::Tcc, 510000.0).unwrap(), 50.0);
    assert!(matches!(
        service.percentile_rank(&derm, Metric::Cf, 50.0),
        Err(EngineError::MissingBreakpoint { .. })
    ));

    // Universe is conserved through commits and clear-all
    assert_eq!(universe(&service), before);
    assert_eq!(service.clear_all_mappings().unwrap(), 3);
    let pool: BTreeSet<SpecialtyKey> = service.unmapped().iter().map(|s| s.key()).collect();
    assert_eq!(pool, before);
    assert_eq!(service.unmapped().len(), 8);
}

#[test]
fn test_auto_arrange_then_export_import() {
    let service = loaded_service();

    let report = service.auto_arrange(&CancellationToken::new()).unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.groups_created, 3);

    let hem_onc = service
        .groups()
        .into_iter()
        .find(|g| g.contains(&key("Hem/Onc", "MGMA")))
        .unwrap();
    assert_eq!(hem_onc.members.len(), 2);
    assert_eq!(hem_onc.origin, GroupOrigin::AutoArranged);

    let exported = service.export_data().unwrap();
    let copy = ReconciliationService::open(Arc::new(MemoryStore::new())).unwrap();
    assert!(copy.import_data(&exported));
    assert_eq!(copy.groups(), service.groups());
    assert_eq!(copy.unmapped(), service.unmapped());

    // Tampering is caught and leaves the copy as it was
    let tampered = exported.replacen("Space Medicine", "Moon Medicine", 1);
    assert!(!copy.import_data(&tampered));
    assert_eq!(copy.unmapped(), service.unmapped());
}

#[test]
fn test_synonym_queries_through_service() {
    let service = loaded_service();
    let cardiology = service.lookup("cardiology (general)").unwrap();
    assert_eq!(cardiology.name, "Cardiology");

    let outcome = service.add_synonym(&cardiology.id, "Heart Specialist", false).unwrap();
    assert!(outcome.success);

    let outcome = service.add_synonym(&cardiology.id, "OB/GYN", false).unwrap();
    assert!(!outcome.success);
    assert!(outcome.conflict.is_some());
    assert!(!service.get_synonyms(&cardiology.id).contains(&"OB/GYN".to_string()));

    let results = service.search_specialties("cardio");
    assert!(results.iter().any(|s| s.name == "Interventional Cardiology"));

    let history = service.get_history(&specialty_reconciliation::HistoryFilter::for_specialty(&cardiology.id));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].synonym, "Heart Specialist");
}
