use crate::common::{map, seeded_store, News, Product};
use iblock_models::{DirectSection, ElementModel, ModelError, StoreCall};
use serde_json::json;

fn by_id_calls(store: &iblock_models::MemoryStore, id: i64) -> usize {
    store.count_calls(|call| matches!(call, StoreCall::ElementById(called) if *called == id))
}

#[test]
fn test_get_fields_fetches_once() {
    let store = seeded_store();
    let mut lamp = ElementModel::<Product>::new(1);

    assert_eq!(lamp.get_fields(&store).unwrap()["NAME"], json!("Desk lamp"));
    assert_eq!(lamp.get_fields(&store).unwrap()["CODE"], json!("desk-lamp"));

    assert_eq!(by_id_calls(&store, 1), 1);
    assert!(lamp.fields_are_fetched());
}

#[test]
fn test_props_come_with_the_fields_fetch() {
    let store = seeded_store();
    let mut lamp = ElementModel::<Product>::new(1);

    lamp.get_fields(&store).unwrap();
    let props = lamp.get_props(&store).unwrap();
    assert_eq!(props["COLOR"], json!("red"));
    assert_eq!(props["SIZE"], json!("L"));

    assert_eq!(by_id_calls(&store, 1), 1);
    assert!(lamp.props_are_fetched());
}

#[test]
fn test_get_props_fetches_once_when_only_fields_were_filled() {
    let store = seeded_store();
    let mut lamp = ElementModel::<Product>::unbound();
    lamp.fill(map(json!({"ID": "2", "NAME": "Floor lamp"})));
    assert!(lamp.fields_are_fetched());
    assert!(!lamp.props_are_fetched());

    assert_eq!(lamp.get_props(&store).unwrap()["COLOR"], json!("blue"));
    assert!(lamp.props_are_fetched());
    lamp.get_props(&store).unwrap();

    assert_eq!(by_id_calls(&store, 2), 1);
}

#[test]
fn test_get_returns_fields_and_property_values() {
    let store = seeded_store();
    let mut lamp = ElementModel::<Product>::new(2);

    let all = lamp.get(&store).unwrap();
    assert_eq!(all["NAME"], json!("Floor lamp"));
    assert_eq!(all["PROPERTY_VALUES"]["COLOR"], json!("blue"));
    assert_eq!(all["PROPERTIES"]["COLOR"]["NAME"], json!("Color"));
    assert_eq!(store.calls().len(), 1);
}

#[test]
fn test_nested_property_value_is_flattened() {
    let mut lamp = ElementModel::<Product>::new(1);
    lamp.fill_properties(map(json!({"CODE": {"VALUE": "x"}})));

    assert_eq!(lamp.property("CODE"), Some(&json!("x")));
    assert!(lamp.props_are_fetched());
}

#[test]
fn test_refresh_keeps_cached_sections() {
    let store = seeded_store();
    let mut lamp = ElementModel::<Product>::new(1);

    assert_eq!(lamp.get_sections(&store).unwrap(), vec![99, 100]);
    lamp.refresh_fields(&store).unwrap();

    assert_eq!(lamp.field("IBLOCK_SECTION"), Some(&json!([99, 100])));
    assert_eq!(lamp.get_sections(&store).unwrap(), vec![99, 100]);
    assert_eq!(
        store.count_calls(|call| matches!(call, StoreCall::ElementGroups(_))),
        1
    );
}

#[test]
fn test_refresh_prefers_sections_supplied_by_the_fetch() {
    let store = seeded_store();
    store.add_element(
        4,
        5,
        map(json!({"NAME": "Spot", "IBLOCK_SECTION": [100]})),
        map(json!({})),
        vec![100],
    );
    let mut spot = ElementModel::<Product>::new(4);
    spot.set("IBLOCK_SECTION", json!([42]));

    spot.refresh(&store).unwrap();

    assert_eq!(spot.field("IBLOCK_SECTION"), Some(&json!([100])));
}

#[test]
fn test_unbound_model_reads_empty_without_store_calls() {
    let store = seeded_store();
    let mut model = ElementModel::<Product>::unbound();

    assert!(model.get_fields(&store).unwrap().is_empty());
    assert!(model.get_sections(&store).unwrap().is_empty());
    assert!(store.calls().is_empty());
}

#[test]
fn test_vanished_record_is_not_found() {
    let store = seeded_store();
    let mut model = ElementModel::<Product>::new(404);

    let err = model.get_fields(&store).unwrap_err();
    assert!(matches!(err, ModelError::NotFound(404)));
    assert!(!model.fields_are_fetched());
}

#[test]
fn test_get_by_id() {
    let store = seeded_store();

    let lamp = ElementModel::<Product>::get_by_id(&store, 1).unwrap().unwrap();
    assert_eq!(lamp.id(), Some(1));
    assert!(lamp.fields_are_fetched());
    assert_eq!(lamp.property("COLOR"), Some(&json!("red")));

    assert!(ElementModel::<Product>::get_by_id(&store, 404).unwrap().is_none());
    // Element 10 exists, but in another iblock
    assert!(ElementModel::<Product>::get_by_id(&store, 10).unwrap().is_none());
    assert!(ElementModel::<News>::get_by_id(&store, 10).unwrap().is_some());
}

#[test]
fn test_get_by_zero_id_makes_no_call() {
    let store = seeded_store();

    assert!(ElementModel::<Product>::get_by_id(&store, 0).unwrap().is_none());
    assert!(store.calls().is_empty());
}

#[test]
fn test_get_section() {
    let store = seeded_store();

    let mut lamp = ElementModel::<Product>::new(1);
    assert_eq!(lamp.get_section(&store, false).unwrap(), DirectSection::Id(99));

    match lamp.get_section(&store, true).unwrap() {
        DirectSection::Fields(fields) => assert_eq!(fields["NAME"], json!("Lamps")),
        other => panic!("expected section fields, got {other:?}"),
    }

    let mut orphan = ElementModel::<Product>::new(3);
    assert_eq!(orphan.get_section(&store, false).unwrap(), DirectSection::Absent);
    assert_eq!(orphan.get_section(&store, true).unwrap(), DirectSection::Absent);
}

#[test]
fn test_section_model_lazy_and_eager() {
    let store = seeded_store();
    let mut lamp = ElementModel::<Product>::new(2);

    let lazy = lamp.section(&store, false).unwrap().unwrap();
    assert_eq!(lazy.id(), Some(100));
    assert!(!lazy.fields_are_fetched());
    assert_eq!(
        store.count_calls(|call| matches!(
            call,
            StoreCall::SectionById(_) | StoreCall::SectionList { .. }
        )),
        0
    );

    let eager = lamp.section(&store, true).unwrap().unwrap();
    assert!(eager.fields_are_fetched());
    assert_eq!(eager.parent_id(), Some(99));

    let mut orphan = ElementModel::<Product>::new(3);
    assert!(orphan.section(&store, false).unwrap().is_none());
}

#[test]
fn test_section_resolution_without_binding_is_a_configuration_error() {
    let store = seeded_store();
    let mut news = ElementModel::<News>::new(10);

    assert_eq!(news.get_section(&store, false).unwrap(), DirectSection::Absent);

    let err = news.get_section(&store, true).unwrap_err();
    assert!(err.is_configuration());

    let err = news.section(&store, false).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_models_work_through_an_instrumented_store() {
    let store = iblock_models::InstrumentedStore::new(seeded_store());
    let mut lamp = ElementModel::<Product>::new(1);

    assert_eq!(lamp.get_props(&store).unwrap()["COLOR"], json!("red"));
    assert_eq!(lamp.get_sections(&store).unwrap(), vec![99, 100]);
    assert_eq!(store.inner().calls().len(), 2);
}
