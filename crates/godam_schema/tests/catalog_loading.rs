//! Schema, foreign-key and snapshot loading against the in-memory catalog.

use godam_db::{CatalogColumn, TableRef};
use godam_schema::{
    load_foreign_keys, load_table_schema, BusinessKey, CellValue, ExistingKeyMap, IntegerWidth,
    LogicalType, ReferenceSets, SchemaError, REQUIRED_COLUMNS,
};
use godam_test_utils::MemoryCatalog;

fn stock() -> TableRef {
    TableRef::new("public", "stock")
}

fn warehouses() -> TableRef {
    TableRef::new("public", "warehouses")
}

fn fixture() -> MemoryCatalog {
    let catalog = MemoryCatalog::new();
    catalog.add_table(
        &stock(),
        vec![
            CatalogColumn::builtin("part_number", "text", "text", false),
            CatalogColumn::builtin("warehouse_no", "integer", "int4", false),
            CatalogColumn::builtin("sap_pn", "text", "text", true),
            CatalogColumn::builtin("description", "text", "text", true),
            CatalogColumn::builtin("qty", "numeric", "numeric", true),
            CatalogColumn::builtin("vendor_name", "character varying", "varchar", true)
                .with_max_length(40),
        ],
    );
    catalog.add_table(
        &warehouses(),
        vec![CatalogColumn::builtin("id", "bigint", "int8", false)],
    );
    catalog.add_foreign_key(&stock(), "warehouse_no", &warehouses(), "id");
    catalog.add_foreign_key(&stock(), "warehouse_no", &warehouses(), "other");
    for id in ["1", "2", " 3 "] {
        catalog.insert_row(&warehouses(), &[("id", Some(id))]);
    }
    catalog.insert_row(
        &stock(),
        &[
            ("part_number", Some(" P1 ")),
            ("warehouse_no", Some("1")),
            ("qty", Some("4.5")),
        ],
    );
    catalog.insert_row(&stock(), &[("part_number", Some("P2")), ("qty", Some("1"))]);
    catalog
}

#[tokio::test]
async fn schema_is_loaded_in_order_with_logical_types() {
    let catalog = fixture();
    let mut session = catalog.begin();
    let schema = load_table_schema(&mut session, &stock()).await.unwrap();

    assert_eq!(schema.column_names(), REQUIRED_COLUMNS.to_vec());
    assert_eq!(
        schema.column("warehouse_no").unwrap().logical_type,
        LogicalType::Integer(IntegerWidth::Regular)
    );
    assert_eq!(schema.column("vendor_name").unwrap().max_length, Some(40));
    assert!(schema.require_columns(REQUIRED_COLUMNS).is_ok());
}

#[tokio::test]
async fn missing_table_is_schema_not_found() {
    let catalog = fixture();
    let mut session = catalog.begin();
    let err = load_table_schema(&mut session, &TableRef::new("public", "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::SchemaNotFound(name) if name == "public.nope"));
}

#[tokio::test]
async fn reference_values_are_coerced_with_source_column_type() {
    let catalog = fixture();
    let mut session = catalog.begin();
    let schema = load_table_schema(&mut session, &stock()).await.unwrap();
    let fks = load_foreign_keys(&mut session, &stock()).await.unwrap();
    assert_eq!(fks.len(), 1, "first mapping per column wins");

    let refs = ReferenceSets::load(&mut session, &schema, &fks).await.unwrap();
    assert!(refs.is_enabled());
    assert!(refs
        .missing_reference("warehouse_no", &CellValue::Integer(3))
        .is_none());
    let fk = refs
        .missing_reference("warehouse_no", &CellValue::Integer(4))
        .unwrap();
    assert_eq!(fk.describe(), "warehouses.id");
}

#[tokio::test]
async fn snapshot_skips_rows_with_blank_key_parts() {
    let catalog = fixture();
    let mut session = catalog.begin();
    let snapshot = ExistingKeyMap::load(&mut session, &stock()).await.unwrap();

    assert_eq!(snapshot.len(), 1);
    let key = BusinessKey::from_text(Some("P1"), Some("1")).unwrap();
    assert_eq!(snapshot.get(&key), Some(Some("4.5")));
}
