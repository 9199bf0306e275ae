use crate::common::{map, seeded_store, Catalog};
use iblock_models::{ModelError, SectionModel, SortOrder, StoreCall};
use serde_json::json;

fn ids(sections: Vec<SectionModel<Catalog>>) -> Vec<i64> {
    sections.iter().filter_map(SectionModel::id).collect()
}

#[test]
fn test_list_is_scoped_and_complete() {
    let store = seeded_store();

    let sections = SectionModel::<Catalog>::query()
        .get_list(&store)
        .unwrap()
        .into_vec();

    assert_eq!(ids(sections.clone()), vec![99, 100]);
    assert!(sections.iter().all(SectionModel::fields_are_fetched));

    match &store.calls()[0] {
        StoreCall::SectionList {
            sort,
            filter,
            count_elements,
            select,
            ..
        } => {
            assert_eq!(sort, &vec![("SORT".to_string(), SortOrder::Asc)]);
            assert_eq!(filter, &map(json!({"IBLOCK_ID": 5})));
            assert!(!*count_elements);
            assert!(select.iter().any(|field| field == "DEPTH_LEVEL"));
            assert!(select.ends_with(&["UF_*".to_string()]));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn test_count_uses_the_count_primitive() {
    let store = seeded_store();

    let count = SectionModel::<Catalog>::query()
        .filter(map(json!({"IBLOCK_SECTION_ID": 99, "IBLOCK_ID": 8})))
        .count(&store)
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(
        store.calls(),
        vec![StoreCall::SectionCount(map(
            json!({"IBLOCK_SECTION_ID": 99, "IBLOCK_ID": 5})
        ))]
    );
}

#[test]
fn test_count_elements_annotates_rows() {
    let store = seeded_store();

    let sections = SectionModel::<Catalog>::query()
        .count_elements(true)
        .key_by("ID")
        .get_list(&store)
        .unwrap();

    assert_eq!(sections.get("99").and_then(SectionModel::element_count), Some(1));
    assert_eq!(sections.get("100").and_then(SectionModel::element_count), Some(2));
}

#[test]
fn test_key_by_name() {
    let store = seeded_store();

    let sections = SectionModel::<Catalog>::query()
        .key_by("NAME")
        .get_list(&store)
        .unwrap();

    assert_eq!(sections.keys(), vec!["Lamps", "Floor"]);
    assert_eq!(sections.get("Floor").and_then(SectionModel::parent_id), Some(99));
}

#[test]
fn test_narrow_select_seeds_partial_sections() {
    let store = seeded_store();

    let mut sections = SectionModel::<Catalog>::query()
        .select(["NAME"])
        .sort([("NAME", SortOrder::Desc)])
        .get_list(&store)
        .unwrap()
        .into_vec();

    let lamps = &mut sections[0];
    assert_eq!(lamps.id(), Some(99));
    assert!(!lamps.fields_are_fetched());
    assert_eq!(lamps.field("SORT"), None);

    assert_eq!(lamps.get_fields(&store).unwrap()["SORT"], json!("10"));
    assert_eq!(
        store.count_calls(|call| matches!(call, StoreCall::SectionById(99))),
        1
    );
}

#[test]
fn test_get_by_id() {
    let store = seeded_store();

    let floor = SectionModel::<Catalog>::get_by_id(&store, 100).unwrap().unwrap();
    assert_eq!(floor.field("NAME"), Some(&json!("Floor")));

    // Section 300 belongs to another iblock
    assert!(SectionModel::<Catalog>::get_by_id(&store, 300).unwrap().is_none());
    assert!(SectionModel::<Catalog>::get_by_id(&store, 0).unwrap().is_none());
}

#[test]
fn test_get_fields_fetches_once() {
    let store = seeded_store();
    let mut floor = SectionModel::<Catalog>::new(100);

    assert_eq!(floor.get_fields(&store).unwrap()["NAME"], json!("Floor"));
    floor.get_fields(&store).unwrap();

    assert_eq!(store.calls(), vec![StoreCall::SectionById(100)]);
    assert_eq!(floor.parent_id(), Some(99));
}

#[test]
fn test_refresh_keeps_element_count() {
    let store = seeded_store();
    let mut floor = SectionModel::<Catalog>::query()
        .count_elements(true)
        .get_by_id(&store, 100)
        .unwrap()
        .unwrap();

    floor.refresh_fields(&store).unwrap();

    assert_eq!(floor.element_count(), Some(2));
}

#[test]
fn test_save_skips_element_count() {
    let store = seeded_store();
    let mut floor = SectionModel::<Catalog>::query()
        .count_elements(true)
        .get_by_id(&store, 100)
        .unwrap()
        .unwrap();
    floor.set("NAME", json!("Floor lamps"));
    store.clear_calls();

    assert!(floor.save(&store, std::iter::empty::<&str>()).unwrap());

    match &store.calls()[..] {
        [StoreCall::SectionUpdate { id, fields }] => {
            assert_eq!(*id, 100);
            assert_eq!(fields["NAME"], json!("Floor lamps"));
            assert!(!fields.contains_key("ELEMENT_CNT"));
            assert!(!fields.contains_key("ID"));
            assert!(!fields.contains_key("IBLOCK_ID"));
        }
        other => panic!("unexpected calls {other:?}"),
    }
    assert_eq!(store.section(100).unwrap()["NAME"], json!("Floor lamps"));
}

#[test]
fn test_vanished_section_is_not_found() {
    let store = seeded_store();

    let err = SectionModel::<Catalog>::new(555).get_fields(&store).unwrap_err();
    assert!(matches!(err, ModelError::NotFound(555)));
}
