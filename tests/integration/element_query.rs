use crate::common::{map, seeded_store, Archive, News, Product};
use iblock_models::{
    Collection, ElementModel, FetchUsing, ModelError, Navigation, QueryDefaults, SortOrder,
    StoreCall,
};
use serde_json::json;

fn ids<K: iblock_models::ElementKind>(collection: Collection<ElementModel<K>>) -> Vec<i64> {
    collection
        .into_iter()
        .filter_map(|model| model.id())
        .collect()
}

fn last_list_call(store: &iblock_models::MemoryStore) -> StoreCall {
    store
        .calls()
        .into_iter()
        .rev()
        .find(|call| matches!(call, StoreCall::ElementList { .. }))
        .expect("no element list call was made")
}

#[test]
fn test_count_uses_the_unsorted_list_convention() {
    let store = seeded_store();

    assert_eq!(ElementModel::<Product>::query().count(&store).unwrap(), 3);
    assert_eq!(ElementModel::<News>::query().count(&store).unwrap(), 1);
    assert_eq!(ElementModel::<Archive>::query().count(&store).unwrap(), 0);

    match last_list_call(&store) {
        StoreCall::ElementList {
            sort,
            filter,
            group_by,
            navigation,
            select,
        } => {
            assert_eq!(sort, None);
            assert_eq!(filter, map(json!({"IBLOCK_ID": 9})));
            assert_eq!(group_by, None);
            assert_eq!(navigation, None);
            assert!(select.is_empty());
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn test_count_honours_the_filter() {
    let store = seeded_store();

    let active = ElementModel::<Product>::query().active().count(&store).unwrap();
    assert_eq!(active, 2);

    let in_floor = ElementModel::<Product>::query()
        .add_filter("SECTION_ID", json!(100))
        .count(&store)
        .unwrap();
    assert_eq!(in_floor, 2);
}

#[test]
fn test_collection_scope_cannot_be_overridden() {
    let store = seeded_store();

    let query = ElementModel::<Product>::query().filter(map(json!({"SECTION_ID": 99, "IBLOCK_ID": 7})));
    assert_eq!(
        query.current_filter(),
        &map(json!({"SECTION_ID": 99, "IBLOCK_ID": 5}))
    );

    let found = ids(query.get_list(&store).unwrap());
    assert_eq!(found, vec![1]);

    match last_list_call(&store) {
        StoreCall::ElementList { filter, .. } => {
            assert_eq!(filter["SECTION_ID"], json!(99));
            assert_eq!(filter["IBLOCK_ID"], json!(5));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn test_list_keeps_store_order() {
    let store = seeded_store();

    let by_sort = ElementModel::<Product>::query().get_list(&store).unwrap();
    assert!(!by_sort.is_keyed());
    assert_eq!(ids(by_sort), vec![2, 1, 3]);

    let by_sort_desc = ElementModel::<Product>::query()
        .sort([("SORT", SortOrder::Desc)])
        .get_list(&store)
        .unwrap();
    assert_eq!(ids(by_sort_desc), vec![3, 1, 2]);
}

#[test]
fn test_key_by_id() {
    let store = seeded_store();

    let keyed = ElementModel::<Product>::query()
        .key_by("ID")
        .get_list(&store)
        .unwrap();

    assert!(keyed.is_keyed());
    assert_eq!(keyed.keys(), vec!["2", "1", "3"]);
    assert_eq!(keyed.get("2").and_then(|lamp| lamp.id()), Some(2));
}

#[test]
fn test_key_by_follows_the_sort() {
    let store = seeded_store();

    let keyed = ElementModel::<Product>::query()
        .sort([("SORT", SortOrder::Desc)])
        .key_by("ID")
        .get_list(&store)
        .unwrap();

    assert_eq!(keyed.keys(), vec!["3", "1", "2"]);
    assert_eq!(ids(keyed), vec![3, 1, 2]);
}

#[test]
fn test_key_by_code() {
    let store = seeded_store();

    let keyed = ElementModel::<Product>::query()
        .key_by("CODE")
        .get_list(&store)
        .unwrap();

    let lamp = keyed.get("desk-lamp").unwrap();
    assert_eq!(lamp.field("NAME"), Some(&json!("Desk lamp")));
}

#[test]
fn test_key_by_missing_field() {
    let store = seeded_store();

    let err = ElementModel::<Product>::query()
        .key_by("XML_ID")
        .get_list(&store)
        .unwrap_err();

    assert!(matches!(err, ModelError::MissingKey(field) if field == "XML_ID"));
}

#[test]
fn test_default_select_expands_standard_fields_and_properties() {
    let store = seeded_store();
    let query = ElementModel::<Product>::query();

    let select = query.normalized_select();
    assert!(select.iter().any(|field| field == "NAME"));
    assert!(select.iter().any(|field| field == "DETAIL_PAGE_URL"));
    assert!(select.ends_with(&["PROPERTY_*".to_string()]));
    assert!(!select.iter().any(|field| field == "FIELDS" || field == "PROPS"));
    assert_eq!(select.iter().filter(|field| *field == "IBLOCK_ID").count(), 1);

    let mut lamps = query.get_list(&store).unwrap().into_vec();
    assert!(lamps.iter().all(|lamp| lamp.fields_are_fetched() && lamp.props_are_fetched()));
    match last_list_call(&store) {
        StoreCall::ElementList { select, .. } => assert!(select.is_empty()),
        other => panic!("unexpected call {other:?}"),
    }

    store.clear_calls();
    let lamp = &mut lamps[0];
    lamp.get_fields(&store).unwrap();
    assert_eq!(lamp.get_props(&store).unwrap()["COLOR"], json!("blue"));
    assert!(store.calls().is_empty());
}

#[test]
fn test_narrow_select_seeds_partial_models() {
    let store = seeded_store();
    let query = ElementModel::<Product>::query().select(["NAME"]);

    assert_eq!(query.normalized_select(), vec!["NAME"]);

    let mut lamps = query.get_list(&store).unwrap().into_vec();
    let lamp = &mut lamps[0];
    assert_eq!(lamp.field("NAME"), Some(&json!("Floor lamp")));
    assert_eq!(lamp.field("CODE"), None);
    assert!(!lamp.fields_are_fetched());

    assert_eq!(lamp.get_fields(&store).unwrap()["CODE"], json!("floor-lamp"));
    assert_eq!(
        store.count_calls(|call| matches!(call, StoreCall::ElementById(2))),
        1
    );
}

#[test]
fn test_simple_rows_carry_properties_inline() {
    let store = seeded_store();
    let query = ElementModel::<Product>::query()
        .fetch_using(FetchUsing::GetNext)
        .select(["NAME", "PROPS"]);

    assert_eq!(query.normalized_select(), vec!["NAME", "IBLOCK_ID", "PROPERTY_*"]);

    let lamps = query.key_by("ID").get_list(&store).unwrap();
    let lamp = lamps.get("1").unwrap();
    assert!(lamp.props_are_fetched());
    assert_eq!(lamp.property("COLOR"), Some(&json!("red")));
    assert_eq!(lamp.property("SIZE"), Some(&json!("L")));
}

#[test]
fn test_row_objects_without_props_leave_properties_unfetched() {
    let store = seeded_store();

    let lamps = ElementModel::<Product>::query()
        .fetch_using(FetchUsing::GetNextElement)
        .select(["FIELDS"])
        .get_list(&store)
        .unwrap()
        .into_vec();

    assert!(lamps[0].fields_are_fetched());
    assert!(!lamps[0].props_are_fetched());
    assert_eq!(lamps[0].property("COLOR"), None);
}

#[test]
fn test_navigation() {
    let store = seeded_store();

    let top = ElementModel::<Product>::query().limit(2).get_list(&store).unwrap();
    assert_eq!(ids(top), vec![2, 1]);

    let second_page = ElementModel::<Product>::query().page(2, 2).get_list(&store).unwrap();
    assert_eq!(ids(second_page), vec![3]);

    match last_list_call(&store) {
        StoreCall::ElementList { navigation, .. } => {
            assert_eq!(navigation, Some(Navigation::page(2, 2)));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn test_first() {
    let store = seeded_store();

    let first = ElementModel::<Product>::query()
        .sort([("CODE", SortOrder::Asc)])
        .first(&store)
        .unwrap()
        .unwrap();
    assert_eq!(first.id(), Some(3));

    let query = ElementModel::<Product>::query().order_by("CODE", SortOrder::Desc);
    assert_eq!(
        query.current_sort(),
        &vec![
            ("SORT".to_string(), SortOrder::Asc),
            ("CODE".to_string(), SortOrder::Desc)
        ]
    );
    assert_eq!(query.first(&store).unwrap().unwrap().id(), Some(2));

    let none = ElementModel::<Archive>::query().first(&store).unwrap();
    assert!(none.is_none());
}

#[test]
fn test_get_by_id_ignores_sort_and_keeps_scope() {
    let store = seeded_store();

    let lamp = ElementModel::<Product>::query()
        .sort([("NAME", SortOrder::Desc)])
        .get_by_id(&store, 3)
        .unwrap()
        .unwrap();
    assert_eq!(lamp.id(), Some(3));

    match last_list_call(&store) {
        StoreCall::ElementList {
            sort,
            filter,
            navigation,
            ..
        } => {
            assert_eq!(sort, Some(Vec::new()));
            assert_eq!(filter, map(json!({"IBLOCK_ID": 5, "ID": 3})));
            assert_eq!(navigation, Some(Navigation::top(1)));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn test_group_by_is_dispatched() {
    let store = seeded_store();

    ElementModel::<Product>::query()
        .group_by(["IBLOCK_SECTION_ID"])
        .get_list(&store)
        .unwrap();

    match last_list_call(&store) {
        StoreCall::ElementList { group_by, .. } => {
            assert_eq!(group_by, Some(vec!["IBLOCK_SECTION_ID".to_string()]));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn test_query_defaults_seed_sort_and_strategy() {
    let store = seeded_store();
    let defaults = QueryDefaults {
        fetch_using: FetchUsing::GetNext,
        sort: vec![("NAME".to_string(), SortOrder::Desc)],
    };

    let query = iblock_models::ElementQuery::<Product>::with_defaults(&defaults).active();
    assert_eq!(query.current_sort(), &defaults.sort);

    let mut lamps = query.get_list(&store).unwrap().into_vec();
    assert_eq!(lamps.len(), 2);
    assert_eq!(lamps[0].id(), Some(2));
    assert_eq!(lamps[1].id(), Some(1));

    // Whole simple rows carry no property columns, so values load on demand
    assert!(lamps[0].fields_are_fetched());
    assert!(!lamps[0].props_are_fetched());
    assert_eq!(lamps[0].get_props(&store).unwrap()["COLOR"], json!("blue"));
}

#[test]
fn test_full_field_select_returns_whole_rows() {
    let store = seeded_store();
    store.add_element(
        20,
        5,
        map(json!({"NAME": "Wall lamp", "SORT": "400", "LOCK_STATUS": "green"})),
        map(json!({})),
        vec![],
    );

    let mut wall = ElementModel::<Product>::get_by_id(&store, 20).unwrap().unwrap();
    assert!(wall.fields_are_fetched());
    assert_eq!(wall.field("LOCK_STATUS"), Some(&json!("green")));
    match last_list_call(&store) {
        StoreCall::ElementList { select, .. } => assert!(select.is_empty()),
        other => panic!("unexpected call {other:?}"),
    }

    store.clear_calls();
    assert_eq!(wall.get_fields(&store).unwrap()["LOCK_STATUS"], json!("green"));
    assert!(store.calls().is_empty());

    let keyed = ElementModel::<Product>::query()
        .select(["FIELDS"])
        .key_by("ID")
        .get_list(&store)
        .unwrap();
    assert_eq!(
        keyed.get("20").and_then(|lamp| lamp.field("LOCK_STATUS")),
        Some(&json!("green"))
    );
}
