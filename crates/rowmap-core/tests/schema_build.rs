use rowmap_core::{
    object::ObjectType,
    schema::{Discriminator, MappedStatement, ResultMap, ResultMapping},
    stmt::Type,
    Schema,
};

use pretty_assertions::assert_eq;

fn schema_builder() -> rowmap_core::schema::Builder {
    let mut builder = Schema::builder();
    builder
        .object_type(
            ObjectType::bean("Author")
                .property("id", Type::I64)
                .property("username", Type::String),
        )
        .object_type(
            ObjectType::bean("Blog")
                .property("id", Type::I64)
                .property("title", Type::String)
                .property("author", Type::object("Author")),
        );
    builder
}

#[test]
fn resolves_property_types_and_handlers() {
    let mut builder = schema_builder();
    builder.result_map(
        ResultMap::new("blog", Type::object("Blog"))
            .mapping(ResultMapping::column("id", "ID").id())
            .mapping(ResultMapping::column("title", "TITLE"))
            .mapping(ResultMapping::column("author.username", "AUTHOR_USERNAME")),
    );

    let schema = builder.build().unwrap();
    let blog = schema.result_map("blog").unwrap();

    let types: Vec<_> = blog.result_mappings().iter().map(|m| m.ty.clone()).collect();
    assert_eq!(types, [Type::I64, Type::String, Type::String]);
    assert!(blog.result_mappings().iter().all(|m| m.handler.is_some()));
    assert_eq!(blog.id_result_mappings().len(), 1);
    assert!(blog.mapped_columns().contains("AUTHOR_USERNAME"));
    assert!(!blog.has_nested_result_maps());
}

#[test]
fn id_mappings_default_to_all() {
    let mut builder = schema_builder();
    builder.result_map(
        ResultMap::new("author", Type::object("Author"))
            .mapping(ResultMapping::column("id", "ID"))
            .mapping(ResultMapping::column("username", "USERNAME")),
    );

    let schema = builder.build().unwrap();
    assert_eq!(
        schema.result_map("author").unwrap().id_result_mappings().len(),
        2
    );
}

#[test]
fn nested_result_map_flags() {
    let mut builder = schema_builder();
    builder
        .result_map(
            ResultMap::new("author", Type::object("Author"))
                .mapping(ResultMapping::column("id", "AUTHOR_ID").id()),
        )
        .result_map(
            ResultMap::new("blog", Type::object("Blog"))
                .mapping(ResultMapping::column("id", "ID").id())
                .mapping(ResultMapping::property("author").nested_result_map("author")),
        );

    let schema = builder.build().unwrap();
    assert!(schema.result_map("blog").unwrap().has_nested_result_maps());

    let nested = &schema.result_map("blog").unwrap().result_mappings()[1];
    assert_eq!(nested.ty, Type::object("Author"));
    assert!(nested.handler.is_none());
}

#[test]
fn extends_merges_parent_mappings() {
    let mut builder = schema_builder();
    builder
        .result_map(
            ResultMap::new("base", Type::object("Blog"))
                .mapping(ResultMapping::column("id", "ID").id())
                .mapping(ResultMapping::column("title", "TITLE")),
        )
        .result_map(
            ResultMap::new("child", Type::object("Blog"))
                .extends("base")
                .mapping(ResultMapping::column("title", "BLOG_TITLE")),
        );

    let schema = builder.build().unwrap();
    let columns: Vec<_> = schema
        .result_map("child")
        .unwrap()
        .result_mappings()
        .iter()
        .map(|m| m.column.clone().unwrap())
        .collect();
    assert_eq!(columns, ["BLOG_TITLE", "ID"]);
}

#[test]
fn extends_cycle_is_rejected() {
    let mut builder = schema_builder();
    builder
        .result_map(ResultMap::new("a", Type::object("Blog")).extends("b"))
        .result_map(ResultMap::new("b", Type::object("Blog")).extends("a"));

    let err = builder.build().unwrap_err();
    assert!(err.is_invalid_schema(), "{err}");
}

#[test]
fn unknown_references_are_schema_errors() {
    let mut builder = schema_builder();
    builder.result_map(
        ResultMap::new("blog", Type::object("Blog"))
            .mapping(ResultMapping::property("author").nested_result_map("missing")),
    );
    let err = builder.build().unwrap_err();
    assert!(err.is_invalid_schema());
    assert!(err.to_string().contains("unknown result map `missing`"), "{err}");

    let mut builder = schema_builder();
    builder.result_map(
        ResultMap::new("blog", Type::object("Blog"))
            .discriminator(Discriminator::new("KIND").case("1", "nowhere")),
    );
    assert!(builder.build().unwrap_err().is_invalid_schema());

    let mut builder = schema_builder();
    builder.statement(MappedStatement::new("blog.find"));
    let err = builder.build().unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid schema: statement `blog.find` has no result map"
    );
}

#[test]
fn result_type_creates_inline_map() {
    let mut builder = schema_builder();
    builder.statement(MappedStatement::new("author.all").result_type(Type::object("Author")));

    let schema = builder.build().unwrap();
    let statement = schema.statement("author.all").unwrap();
    assert_eq!(statement.result_maps, ["author.all-Inline"]);
    assert!(schema
        .result_map("author.all-Inline")
        .unwrap()
        .result_mappings()
        .is_empty());
}

#[test]
fn result_set_mapping_needs_foreign_column() {
    let mut builder = schema_builder();
    builder
        .result_map(ResultMap::new("author", Type::object("Author")))
        .result_map(
            ResultMap::new("blog", Type::object("Blog")).mapping(
                ResultMapping::column("author", "AUTHOR_ID, EXTRA")
                    .nested_result_map("author")
                    .result_set("authors", "ID"),
            ),
        );

    assert!(builder.build().unwrap_err().is_invalid_schema());
}

#[test]
fn discriminator_column_gets_a_handler() {
    let mut builder = schema_builder();
    builder
        .result_map(ResultMap::new("author", Type::object("Author")))
        .result_map(
            ResultMap::new("blog", Type::object("Blog"))
                .mapping(ResultMapping::column("id", "ID").id())
                .discriminator(Discriminator::new("KIND").ty(Type::I64).case("1", "author")),
        );

    let schema = builder.build().unwrap();
    let blog = schema.result_map("blog").unwrap();
    let discriminator = blog.discriminator.as_ref().unwrap();

    assert_eq!(discriminator.mapping.ty, Type::I64);
    assert!(discriminator.mapping.handler.is_some());
    assert_eq!(discriminator.map_id_for("1"), Some("author"));
}
