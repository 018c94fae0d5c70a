//! Resolution behaviour over in-memory sheets

use pretty_assertions::assert_eq;
use refbook_core::{
    ColumnType, Error, MemoryReader, ReferenceDefinition, ReferenceResolver, Sheet, Value,
};

fn sheet(name: &str, data: &[&[&str]]) -> Sheet {
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect();
    Sheet::parse_data(name, &rows).unwrap()
}

fn status_definition() -> ReferenceDefinition {
    ReferenceDefinition {
        sheet: "Items".into(),
        column: "status".into(),
        reference_sheet: "Master".into(),
        reference_key: "code".into(),
        reference_value: "label".into(),
        ..Default::default()
    }
}

fn items(status: &str) -> Sheet {
    sheet(
        "Items",
        &[&["string", "ref"], &["id", "status"], &["", ""], &["1", status]],
    )
}

fn resolver(master: Sheet, definitions: Vec<ReferenceDefinition>) -> ReferenceResolver {
    ReferenceResolver::new(definitions, Box::new(MemoryReader::new().with_sheet(master)))
}

#[test]
fn direct_reference_replaces_value_and_type() {
    let master = sheet(
        "Master",
        &[&["string", "string"], &["code", "label"], &[], &["A", "Active"]],
    );
    let mut resolver = resolver(master, vec![status_definition()]);
    let mut items = items("A");

    resolver.resolve(&mut items).unwrap();

    assert_eq!(items.rows[0].cells[1].value, Value::string("Active"));
    assert_eq!(items.rows[0].cells[1].raw, "Active");
    assert_eq!(items.columns[1].ty, Some(ColumnType::String));
    assert_eq!(items.columns[1].name, "status");
}

#[test]
fn direct_reference_adopts_value_column_type() {
    let master = sheet(
        "Master",
        &[&["string", "int"], &["code", "label"], &[], &["A", "10"], &["B", "20"]],
    );
    let mut resolver = resolver(master, vec![status_definition()]);
    let mut items = sheet(
        "Items",
        &[&["string", "ref"], &["id", "status"], &[], &["1", "B"], &["2", "A"]],
    );

    resolver.resolve(&mut items).unwrap();

    let values: Vec<_> = items.rows.iter().map(|r| r.cells[1].value.clone()).collect();
    assert_eq!(values, vec![Value::Int(20), Value::Int(10)]);
    assert_eq!(items.columns[1].ty, Some(ColumnType::Int));
}

#[test]
fn missing_key_reports_value_not_found() {
    let master = sheet(
        "Master",
        &[&["string", "string"], &["code", "label"], &[], &["B", "Blocked"]],
    );
    let mut resolver = resolver(master, vec![status_definition()]);
    let mut items = items("A");

    match resolver.resolve(&mut items).unwrap_err() {
        Error::ValueNotFound {
            sheet,
            row,
            column,
            raw,
            reference_sheet,
            reference_key,
        } => {
            assert_eq!(sheet, "Items");
            assert_eq!(row, 1);
            assert_eq!(column, "status");
            assert_eq!(raw, "A");
            assert_eq!(reference_sheet, "Master");
            assert_eq!(reference_key, "code");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_source_still_fails_lookups() {
    let master = sheet("Master", &[&["string", "string"], &["code", "label"]]);
    let mut resolver = resolver(master, vec![status_definition()]);
    let mut items = items("A");

    assert!(matches!(
        resolver.resolve(&mut items),
        Err(Error::ValueNotFound { row: 1, .. })
    ));
}

#[test]
fn empty_raw_value_is_left_untouched() {
    let master = sheet(
        "Master",
        &[&["string", "string"], &["code", "label"], &[], &["", "Blank"]],
    );
    let mut resolver = resolver(master, vec![status_definition()]);
    let mut items = items("");
    let before = items.rows.clone();

    resolver.resolve(&mut items).unwrap();

    assert_eq!(items.rows, before);
}

#[test]
fn resolving_twice_fails() {
    let master = sheet(
        "Master",
        &[&["string", "string"], &["code", "label"], &[], &["A", "Active"]],
    );
    let mut resolver = resolver(master, vec![status_definition()]);
    let mut items = items("A");

    resolver.resolve(&mut items).unwrap();
    let err = resolver.resolve(&mut items).unwrap_err();

    assert!(matches!(err, Error::ValueNotFound { ref raw, .. } if raw == "Active"));
}

#[test]
fn failed_resolution_keeps_earlier_rows() {
    let master = sheet(
        "Master",
        &[&["string", "string"], &["code", "label"], &[], &["A", "Active"]],
    );
    let mut resolver = resolver(master, vec![status_definition()]);
    let mut items = sheet(
        "Items",
        &[&["string", "ref"], &["id", "status"], &[], &["1", "A"], &["2", "Z"]],
    );

    let err = resolver.resolve(&mut items).unwrap_err();

    assert!(matches!(err, Error::ValueNotFound { row: 2, .. }));
    assert_eq!(items.rows[0].cells[1].value, Value::string("Active"));
    assert_eq!(items.rows[1].cells[1].raw, "Z");
}

fn polymorphic_setup(rewards: &[&[&str]]) -> (ReferenceResolver, Sheet) {
    let rewards = sheet("Rewards", rewards);
    let items = sheet(
        "Items",
        &[&["int", "string"], &["id", "label"], &[], &["1", "Sword"], &["2", "Shield"]],
    );
    let coins = sheet(
        "Coins",
        &[&["string", "int"], &["code", "amount"], &[], &["gold", "100"]],
    );
    let reader = MemoryReader::new()
        .with_sheet(rewards.clone())
        .with_sheet(items)
        .with_sheet(coins);

    let definitions = vec![
        ReferenceDefinition {
            index: 0,
            sheet: "Rewards".into(),
            column: "target".into(),
            reference_sheet: "Rewards".into(),
            reference_key: "kind".into(),
            ..Default::default()
        },
        ReferenceDefinition {
            index: 1,
            reference_sheet: "Items".into(),
            reference_key: "label".into(),
            reference_value: "id".into(),
            reference_name: "item".into(),
            ..Default::default()
        },
        ReferenceDefinition {
            index: 2,
            reference_sheet: "Coins".into(),
            reference_key: "code".into(),
            reference_value: "amount".into(),
            reference_name: "coin".into(),
            ..Default::default()
        },
    ];
    (ReferenceResolver::new(definitions, Box::new(reader)), rewards)
}

#[test]
fn polymorphic_reference_selects_source_per_row() {
    let (mut resolver, mut rewards) = polymorphic_setup(&[
        &["string", "ref"],
        &["kind", "target"],
        &[],
        &["item", "Shield"],
        &["coin", "gold"],
    ]);

    resolver.resolve(&mut rewards).unwrap();

    assert_eq!(rewards.rows[0].cells[1].value, Value::Int(2));
    assert_eq!(rewards.rows[1].cells[1].value, Value::Int(100));
    assert_eq!(rewards.columns[1].ty, Some(ColumnType::Int));
    assert_eq!(rewards.rows[0].cells[0].raw, "item");
}

#[test]
fn polymorphic_unknown_alias_fails() {
    let (mut resolver, mut rewards) = polymorphic_setup(&[
        &["string", "ref"],
        &["kind", "target"],
        &[],
        &["item", "Sword"],
        &["gem", "ruby"],
    ]);

    match resolver.resolve(&mut rewards).unwrap_err() {
        Error::AliasNotFound {
            sheet,
            row,
            column,
            alias,
        } => {
            assert_eq!((sheet.as_str(), row, column.as_str(), alias.as_str()), ("Rewards", 2, "target", "gem"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn polymorphic_declared_type_must_agree() {
    let (mut resolver, mut rewards) = polymorphic_setup(&[
        &["string", "string"],
        &["kind", "target"],
        &[],
        &["item", "Sword"],
    ]);

    let err = resolver.resolve(&mut rewards).unwrap_err();
    assert_eq!(
        err.to_string(),
        "sheet:Rewards row:1 column:target value type mismatch: string, int"
    );
}

#[test]
fn polymorphic_settled_type_cannot_change() {
    let (mut resolver, mut rewards) = {
        let rewards = sheet(
            "Rewards",
            &[&["string", "ref"], &["kind", "target"], &[], &["item", "Sword"], &["title", "hero"]],
        );
        let reader = MemoryReader::new()
            .with_sheet(rewards.clone())
            .with_sheet(sheet(
                "Items",
                &[&["int", "string"], &["id", "label"], &[], &["1", "Sword"]],
            ))
            .with_sheet(sheet(
                "Titles",
                &[&["string", "string"], &["code", "name"], &[], &["hero", "Hero"]],
            ));
        let definitions = vec![
            ReferenceDefinition {
                sheet: "Rewards".into(),
                column: "target".into(),
                reference_sheet: "Rewards".into(),
                reference_key: "kind".into(),
                ..Default::default()
            },
            ReferenceDefinition {
                index: 1,
                reference_sheet: "Items".into(),
                reference_key: "label".into(),
                reference_value: "id".into(),
                reference_name: "item".into(),
                ..Default::default()
            },
            ReferenceDefinition {
                index: 2,
                reference_sheet: "Titles".into(),
                reference_key: "code".into(),
                reference_value: "name".into(),
                reference_name: "title".into(),
                ..Default::default()
            },
        ];
        (ReferenceResolver::new(definitions, Box::new(reader)), rewards)
    };

    assert!(matches!(
        resolver.resolve(&mut rewards),
        Err(Error::TypeMismatch { row: 2, ref declared, ref resolved, .. })
            if declared == "int" && resolved == "string"
    ));
}

#[test]
fn polymorphic_runs_before_direct() {
    // the alias column is itself a direct reference column
    let rewards = sheet(
        "Rewards",
        &[&["ref", "ref"], &["kind", "target"], &[], &["I", "Sword"]],
    );
    let reader = MemoryReader::new()
        .with_sheet(rewards.clone())
        .with_sheet(sheet(
            "Kinds",
            &[&["string", "string"], &["code", "name"], &[], &["I", "item"]],
        ))
        .with_sheet(sheet(
            "Items",
            &[&["int", "string"], &["id", "label"], &[], &["7", "Sword"]],
        ));
    let definitions = vec![
        ReferenceDefinition {
            sheet: "Rewards".into(),
            column: "kind".into(),
            reference_sheet: "Kinds".into(),
            reference_key: "code".into(),
            reference_value: "name".into(),
            ..Default::default()
        },
        ReferenceDefinition {
            index: 1,
            sheet: "Rewards".into(),
            column: "target".into(),
            reference_sheet: "Rewards".into(),
            reference_key: "kind".into(),
            ..Default::default()
        },
        ReferenceDefinition {
            index: 2,
            reference_sheet: "Items".into(),
            reference_key: "label".into(),
            reference_value: "id".into(),
            reference_name: "I".into(),
            ..Default::default()
        },
    ];
    let mut resolver = ReferenceResolver::new(definitions, Box::new(reader));
    let mut rewards = rewards;

    resolver.resolve(&mut rewards).unwrap();

    assert_eq!(rewards.rows[0].cells[0].value, Value::string("item"));
    assert_eq!(rewards.rows[0].cells[1].value, Value::Int(7));
}

#[test]
fn records_contain_only_exportable_columns() {
    let sheet = sheet(
        "Items",
        &[&["int", "string"], &["id", ""], &[], &["1", "spacer"], &["2", ""]],
    );
    let records = sheet.records();

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.keys().copied().collect::<Vec<_>>(), vec!["id"]);
    }
}
