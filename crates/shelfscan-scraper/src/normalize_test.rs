use super::*;

fn row(pairs: &[(&str, &str)]) -> RawRow {
    pairs.iter().copied().collect()
}

// -----------------------------------------------------------------------
// shape
// -----------------------------------------------------------------------

#[test]
fn empty_row_normalizes_to_all_empty_fields() {
    let record = normalize(&RawRow::new());
    assert_eq!(record, CanonicalRecord::default());

    let value = serde_json::to_value(&record).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 9);
    for (key, value) in object {
        assert_eq!(value, "", "field {key} should be an empty string");
    }
}

#[test]
fn unknown_columns_are_dropped() {
    let record = normalize(&row(&[("Name", "Desk Lamp"), ("Warehouse", "B7")]));
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 9);
    assert_eq!(record.product_name, "Desk Lamp");
}

// -----------------------------------------------------------------------
// alias resolution
// -----------------------------------------------------------------------

#[test]
fn header_aliases_map_to_canonical_fields() {
    let record = normalize(&row(&[
        ("Title", "Desk Lamp"),
        ("Category", "home"),
        ("ID", "77"),
        ("Color", "Brass"),
        ("Price", "€49,00"),
        ("Brand", "Lumo"),
        ("SKU", "LMO-7700-1"),
        ("Material", "Steel"),
        ("Last Updated", "2024-03-14"),
    ]));
    assert_eq!(record.product_name, "Desk Lamp");
    assert_eq!(record.product_type, "home");
    assert_eq!(record.id, ProductId::Numeric(77));
    assert_eq!(record.shade, "Brass");
    assert_eq!(record.cost, "€49,00");
    assert_eq!(record.manufacturer, "Lumo");
    assert_eq!(record.sku, "LMO-7700-1");
    assert_eq!(record.composition, "Steel");
    assert_eq!(record.updated, "2024-03-14");
}

#[test]
fn matching_is_case_insensitive_and_trims_keys() {
    let record = normalize(&row(&[("  PRODUCT NAME ", "Desk Lamp"), ("sKu", "A-1")]));
    assert_eq!(record.product_name, "Desk Lamp");
    assert_eq!(record.sku, "A-1");
}

#[test]
fn exact_match_beats_earlier_substring_match() {
    // "Product Code" contains "product" but "Name" is an exact alias.
    let record = normalize(&row(&[("Product Code", "PC-1"), ("Name", "Desk Lamp")]));
    assert_eq!(record.product_name, "Desk Lamp");
}

#[test]
fn substring_fallback_when_no_exact_alias() {
    let record = normalize(&row(&[
        ("Item Name", "Desk Lamp"),
        ("Unit Price (USD)", "$49.00"),
        ("Date Modified", "yesterday"),
    ]));
    assert_eq!(record.product_name, "Desk Lamp");
    assert_eq!(record.cost, "$49.00");
    assert_eq!(record.updated, "yesterday");
}

#[test]
fn earlier_alias_wins_on_ties() {
    // Both "cost" and "price" are exact aliases; "cost" is listed first.
    let record = normalize(&row(&[("Price", "$2"), ("Cost", "$1")]));
    assert_eq!(record.cost, "$1");
}

// -----------------------------------------------------------------------
// value coercion
// -----------------------------------------------------------------------

#[test]
fn id_is_numeric_only_when_all_digits() {
    assert_eq!(normalize(&row(&[("id", " 1042 ")])).id, ProductId::Numeric(1042));
    assert_eq!(
        normalize(&row(&[("id", "A-1042")])).id,
        ProductId::Raw("A-1042".into())
    );
    assert_eq!(normalize(&row(&[("id", "")])).id, ProductId::Absent);
}

#[test]
fn values_are_trimmed_but_not_otherwise_coerced() {
    let record = normalize(&row(&[("Cost", "  $1,299.00 "), ("Updated", " 03/14/2024\n")]));
    assert_eq!(record.cost, "$1,299.00");
    assert_eq!(record.updated, "03/14/2024");
}

// -----------------------------------------------------------------------
// round trip
// -----------------------------------------------------------------------

#[test]
fn normalize_is_idempotent_on_canonical_rows() {
    let record = CanonicalRecord {
        product_name: "Velvet Matte Lipstick".into(),
        product_type: "beauty".into(),
        id: ProductId::Numeric(1042),
        shade: "Crimson".into(),
        cost: "$18.50".into(),
        manufacturer: "GlowCo".into(),
        sku: "GLW-1042-3".into(),
        composition: "Wax/Pigment".into(),
        updated: "03/14/2024".into(),
    };
    assert_eq!(normalize(&record.to_raw_row()), record);

    let sparse = CanonicalRecord {
        product_name: "Mystery".into(),
        id: ProductId::Raw("X-9".into()),
        ..CanonicalRecord::default()
    };
    assert_eq!(normalize(&sparse.to_raw_row()), sparse);
}
