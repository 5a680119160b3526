use super::model::{load_model, parse_model};
use typecodec_types::{Inclusion, Modifiers, SubtypeShape, TypeExpr, well_known};

const LIBRARY: &str = r#"
{
  "classes": [
    {
      "name": "com.example.Shelf",
      "annotations": { "serializable": true },
      "fields": [
        { "name": "books", "type": "java.util.List<com.example.Book>" },
        { "name": "label", "type": "String", "modifiers": ["private"] }
      ]
    },
    {
      "name": "com.example.Book",
      "kind": "record",
      "annotations": { "serializable": true, "inclusion": "NON_NULL" },
      "fields": [
        {
          "name": "title",
          "type": "String",
          "modifiers": ["final"],
          "annotations": { "property": "name", "aliases": ["caption"], "nullable": true }
        }
      ]
    },
    {
      "name": "com.example.Box",
      "typeParams": [{ "name": "T", "bounds": ["java.lang.Object"] }],
      "annotations": { "serializable": true },
      "fields": [{ "name": "value", "type": "T" }],
      "methods": [
        {
          "name": "of",
          "typeParams": [{ "name": "U" }],
          "params": [{ "name": "value", "type": "U" }],
          "returns": "com.example.Box<U>",
          "modifiers": ["public", "static"],
          "annotations": { "creator": true }
        }
      ]
    },
    {
      "name": "com.example.Genre",
      "kind": "enum",
      "constants": ["NOVEL", "POETRY"]
    }
  ],
  "roots": ["com.example.Box<String>", "com.example.Shelf"]
}
"#;

#[test]
fn declares_classes_in_any_order() {
    let model = parse_model(LIBRARY).expect("model should load");
    let table = &model.table;
    let shelf = table.lookup("com.example.Shelf").expect("shelf");
    let book = table.lookup("com.example.Book").expect("book");

    let fields = &table.class(shelf).fields;
    assert_eq!(
        fields[0].ty,
        TypeExpr::parameterized(well_known::LIST, vec![TypeExpr::Raw(book)])
    );
    assert_eq!(fields[0].modifiers, Modifiers::PUBLIC);
    assert_eq!(fields[1].modifiers, Modifiers::empty());
    assert_eq!(fields[1].ty, TypeExpr::Raw(well_known::STRING));
}

#[test]
fn reads_member_and_class_annotations() {
    let model = parse_model(LIBRARY).expect("model should load");
    let table = &model.table;
    let book = table.class(table.lookup("com.example.Book").expect("book"));
    assert_eq!(book.annotations.inclusion, Some(Inclusion::NonNull));
    let title = &book.fields[0];
    assert_eq!(title.modifiers, Modifiers::FINAL);
    assert_eq!(title.annotations.property.as_deref(), Some("name"));
    assert_eq!(title.annotations.aliases.len(), 1);
    assert_eq!(title.annotations.nullable, Some(true));
    assert!(!title.annotations.ignore);
}

#[test]
fn generic_members_see_their_variables() {
    let model = parse_model(LIBRARY).expect("model should load");
    let table = &model.table;
    let id = table.lookup("com.example.Box").expect("box");
    let decl = table.class(id);
    assert_eq!(decl.type_params.len(), 1);
    assert_eq!(decl.type_params[0].bounds, vec![TypeExpr::Raw(well_known::OBJECT)]);
    assert_eq!(decl.fields[0].ty, table.parameterize_with_own_variables(id).params()[0]);

    let factory = &decl.methods[0];
    assert!(factory.is_static());
    assert!(factory.annotations.creator);
    assert_eq!(factory.type_params.len(), 1);
    let returned = factory.return_type.clone().expect("return type");
    assert_eq!(returned.class_id(), Some(id));
    assert!(returned.has_free_variables());
}

#[test]
fn roots_are_serializable_concrete_beans_plus_listed_roots() {
    let model = parse_model(LIBRARY).expect("model should load");
    let table = &model.table;
    let shelf = TypeExpr::Raw(table.lookup("com.example.Shelf").expect("shelf"));
    let book = TypeExpr::Raw(table.lookup("com.example.Book").expect("book"));
    let boxed = model.parse_type("com.example.Box<java.lang.String>").expect("box type");
    assert_eq!(model.roots, vec![shelf, book, boxed]);
}

#[test]
fn enums_get_constants() {
    let model = parse_model(LIBRARY).expect("model should load");
    let genre = model.table.lookup("com.example.Genre").expect("genre");
    assert!(model.table.is_enum(genre));
    let constants: Vec<&str> = model.table.class(genre).enum_constants.iter().map(|c| &**c).collect();
    assert_eq!(constants, ["NOVEL", "POETRY"]);
}

#[test]
fn reads_subtyping() {
    let input = r#"
    {
      "classes": [
        {
          "name": "com.example.Shape",
          "modifiers": ["abstract"],
          "annotations": {
            "serializable": true,
            "subtyping": {
              "as": "PROPERTY",
              "property": "kind",
              "subtypes": [{ "class": "Circle", "names": ["c", "circle"] }, { "class": "com.example.Square" }],
              "defaultImpl": "com.example.Square"
            }
          }
        },
        { "name": "com.example.Circle", "supertype": "com.example.Shape", "annotations": { "serializable": true } },
        { "name": "com.example.Square", "supertype": "com.example.Shape", "annotations": { "serializable": true } }
      ]
    }
    "#;
    let model = parse_model(input).expect("model should load");
    let table = &model.table;
    let shape = table.lookup("com.example.Shape").expect("shape");
    let circle = table.lookup("com.example.Circle").expect("circle");
    let square = table.lookup("com.example.Square").expect("square");

    assert!(table.class(shape).is_abstract());
    assert_eq!(table.class(circle).supertype, Some(TypeExpr::Raw(shape)));
    let info = table.class(shape).annotations.subtyping.clone().expect("subtyping");
    assert_eq!(info.shape, SubtypeShape::Property);
    assert_eq!(&*info.property, "kind");
    assert_eq!(info.subtypes.len(), 2);
    assert_eq!(info.subtypes[0].class, circle);
    assert_eq!(info.subtypes[0].names.len(), 2);
    assert!(info.subtypes[1].names.is_empty());
    assert_eq!(info.default_impl, Some(square));
}

#[test]
fn constructors_keep_parameter_annotations() {
    let input = r#"
    {
      "classes": [{
        "name": "com.example.Money",
        "annotations": { "serializable": true },
        "fields": [{ "name": "cents", "type": "long", "modifiers": ["private", "final"] }],
        "constructors": [{
          "params": [{ "name": "cents", "type": "long", "annotations": { "property": "amount" } }],
          "annotations": { "creator": true }
        }]
      }]
    }
    "#;
    let model = parse_model(input).expect("model should load");
    let money = model.table.class(model.table.lookup("com.example.Money").expect("money"));
    let ctor = &money.constructors[0];
    assert!(ctor.is_constructor());
    assert!(ctor.annotations.creator);
    assert_eq!(ctor.params[0].ty, TypeExpr::Raw(well_known::LONG));
    assert_eq!(ctor.params[0].annotations.property.as_deref(), Some("amount"));
}

#[test]
fn errors_name_the_failing_member() {
    let input = r#"
    {
      "classes": [{
        "name": "com.example.Broken",
        "fields": [{ "name": "next", "type": "com.example.Missing" }]
      }]
    }
    "#;
    let err = parse_model(input).unwrap_err();
    let text = format!("{err:#}");
    assert!(text.contains("class com.example.Broken"), "{text}");
    assert!(text.contains("field next"), "{text}");
    assert!(text.contains("invalid type 'com.example.Missing'"), "{text}");
}

#[test]
fn rejects_duplicate_and_builtin_names() {
    let duplicate = r#"{ "classes": [{ "name": "com.example.A" }, { "name": "com.example.A" }] }"#;
    assert!(parse_model(duplicate).unwrap_err().to_string().contains("declared twice"));

    let builtin = r#"{ "classes": [{ "name": "java.lang.String" }] }"#;
    assert!(parse_model(builtin).unwrap_err().to_string().contains("declared twice"));
}

#[test]
fn unknown_subtype_class_is_an_error() {
    let input = r#"
    {
      "classes": [{
        "name": "com.example.Shape",
        "annotations": { "subtyping": { "as": "WRAPPER_OBJECT", "subtypes": [{ "class": "Hexagon" }] } }
      }]
    }
    "#;
    let text = format!("{:#}", parse_model(input).unwrap_err());
    assert!(text.contains("unknown class 'Hexagon'"), "{text}");
}

#[test]
fn load_model_reads_files() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("model.json");
    std::fs::write(&path, LIBRARY).expect("write model");
    let model = load_model(&path).expect("model should load");
    assert_eq!(model.roots.len(), 3);

    let err = load_model(&temp.path().join("missing.json")).unwrap_err();
    assert!(err.to_string().contains("failed to read model"), "{err}");
}
