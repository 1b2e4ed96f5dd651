#[macro_use]
mod support;

use support::*;

use rowmap::{
    object::ObjectType,
    schema::{MappedStatement, ResultMap, ResultMapping},
    AutoMappingBehavior, Result, ResultSetHandler, Schema, Settings, Type, UnknownColumnBehavior,
    Value,
};

use pretty_assertions::assert_eq;
use std::sync::Arc;

fn auto_schema(settings: Settings) -> Arc<Schema> {
    let mut builder = builder(settings);
    builder
        .statement(MappedStatement::new("author.auto").result_type(Type::object("Author")))
        .statement(MappedStatement::new("author.map").result_type(Type::object("map")))
        .statement(MappedStatement::new("author.count").result_type(Type::I64));
    Arc::new(builder.build().unwrap())
}

fn select(schema: Arc<Schema>, id: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Result<Vec<Value>> {
    ResultSetHandler::for_statement(schema, id)?.handle_result_sets([source(columns, rows)])
}

fn author_columns() -> (&'static [&'static str], Vec<Vec<Value>>) {
    (
        &["ID", "USERNAME", "FIRST_NAME", "NICK"],
        vec![row![1_i64, "jdoe", "John", "jd"]],
    )
}

#[test]
fn unlisted_columns_map_by_name() {
    let (columns, rows) = author_columns();
    let authors = select(auto_schema(Settings::default()), "author.auto", columns, rows).unwrap();

    let author = authors[0].expect_object();
    assert_eq!(author.peek("id"), Value::I64(1));
    assert_eq!(author.peek("username"), Value::from("jdoe"));
    assert!(!author.contains("firstName"));
}

#[test]
fn underscores_map_to_camel_case() {
    let settings = Settings {
        map_underscore_to_camel_case: true,
        ..Settings::default()
    };
    let (columns, rows) = author_columns();
    let authors = select(auto_schema(settings), "author.auto", columns, rows).unwrap();

    assert_eq!(authors[0].expect_object().peek("firstName"), Value::from("John"));
}

#[test]
fn unknown_column_policies() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rowmap=warn")
        .with_test_writer()
        .try_init();

    for (behavior, fails) in [
        (UnknownColumnBehavior::None, false),
        (UnknownColumnBehavior::Warning, false),
        (UnknownColumnBehavior::Failing, true),
    ] {
        let settings = Settings {
            map_underscore_to_camel_case: true,
            auto_mapping_unknown_column_behavior: behavior,
            ..Settings::default()
        };
        let (columns, rows) = author_columns();
        let res = select(auto_schema(settings), "author.auto", columns, rows);

        match res {
            Ok(authors) => {
                assert!(!fails, "{behavior:?}");
                assert_eq!(authors.len(), 1);
            }
            Err(err) => {
                assert!(fails, "{behavior:?}: {err}");
                assert!(err.is_unknown_column());
                assert!(err.to_string().contains("`NICK`"), "{err}");
            }
        }
    }
}

#[test]
fn map_targets_take_every_column() {
    let (columns, rows) = author_columns();
    let rows = select(auto_schema(Settings::default()), "author.map", columns, rows).unwrap();

    let row = rows[0].expect_object();
    assert_eq!(row.peek("USERNAME"), Value::from("jdoe"));
    assert_eq!(row.peek("NICK"), Value::from("jd"));
}

#[test]
fn scalar_targets_read_the_first_column() {
    let counts = select(
        auto_schema(Settings::default()),
        "author.count",
        &["COUNT"],
        vec![row![3_i64], row![Value::Null]],
    )
    .unwrap();

    assert_eq!(counts, [Value::I64(3), Value::Null]);
}

fn blog_without_title(settings: Settings, auto_mapping: Option<bool>) -> Arc<Schema> {
    let mut blog = ResultMap::new("blog", Type::object("Blog"))
        .mapping(ResultMapping::column("id", "ID").id())
        .mapping(ResultMapping::property("posts").nested_result_map("post"));
    if let Some(enabled) = auto_mapping {
        blog = blog.auto_mapping(enabled);
    }

    let mut builder = builder(settings);
    builder
        .result_map(
            ResultMap::new("post", Type::object("Post"))
                .mapping(ResultMapping::column("id", "POST_ID").id())
                .mapping(ResultMapping::column("subject", "POST_SUBJECT")),
        )
        .result_map(blog)
        .statement(MappedStatement::new("blog.select").result_map("blog"));
    Arc::new(builder.build().unwrap())
}

fn title_of_first_blog(schema: Arc<Schema>) -> Value {
    let blogs = ResultSetHandler::for_statement(schema, "blog.select")
        .unwrap()
        .handle_result_sets([blog_rows(three_blogs())])
        .unwrap();
    blogs[0].expect_object().peek("title")
}

#[test]
fn partial_auto_mapping_skips_nested_maps() {
    assert_eq!(
        title_of_first_blog(blog_without_title(Settings::default(), None)),
        Value::Null
    );

    let full = Settings {
        auto_mapping_behavior: AutoMappingBehavior::Full,
        ..Settings::default()
    };
    assert_eq!(
        title_of_first_blog(blog_without_title(full.clone(), None)),
        Value::from("a")
    );

    // The result map's own switch wins over the global behavior
    assert_eq!(
        title_of_first_blog(blog_without_title(full, Some(false))),
        Value::Null
    );
    assert_eq!(
        title_of_first_blog(blog_without_title(Settings::default(), Some(true))),
        Value::from("a")
    );
}

#[test]
fn null_columns_skip_setters_unless_asked() {
    let rows = || vec![row![1_i64, Value::Null]];

    let authors = select(author_schema(Settings::default()), "author.select", &["ID", "USERNAME"], rows()).unwrap();
    assert!(!authors[0].expect_object().contains("username"));

    let settings = Settings {
        call_setters_on_nulls: true,
        ..Settings::default()
    };
    let authors = select(author_schema(settings), "author.select", &["ID", "USERNAME"], rows()).unwrap();
    assert!(authors[0].expect_object().contains("username"));
    assert_eq!(authors[0].expect_object().peek("username"), Value::Null);
}

#[test]
fn empty_rows_produce_null_unless_asked() {
    let rows = || vec![row![Value::Null, Value::Null]];

    let authors = select(author_schema(Settings::default()), "author.select", &["ID", "USERNAME"], rows()).unwrap();
    assert_eq!(authors, [Value::Null]);

    let settings = Settings {
        return_instance_for_empty_row: true,
        ..Settings::default()
    };
    let authors = select(author_schema(settings), "author.select", &["ID", "USERNAME"], rows()).unwrap();
    assert_eq!(authors[0].expect_object().type_name(), "Author");
}

fn point_builder() -> rowmap::schema::Builder {
    let mut builder = Schema::builder();
    builder.object_type(
        ObjectType::bean("Point")
            .read_only("x", Type::I64)
            .read_only("y", Type::I64)
            .constructor(["x", "y"]),
    );
    builder
}

#[test]
fn constructor_mappings_build_immutable_objects() {
    let mut builder = point_builder();
    builder
        .result_map(
            ResultMap::new("point", Type::object("Point"))
                .mapping(ResultMapping::column("x", "X").constructor())
                .mapping(ResultMapping::column("y", "Y").constructor()),
        )
        .statement(MappedStatement::new("point.select").result_map("point"));
    let schema = Arc::new(builder.build().unwrap());

    let points = select(
        schema,
        "point.select",
        &["X", "Y"],
        vec![row![1_i64, 2_i64], row![Value::Null, Value::Null]],
    )
    .unwrap();

    let point = points[0].expect_object();
    assert_eq!(point.peek("x"), Value::I64(1));
    assert_eq!(point.peek("y"), Value::I64(2));

    // Every argument null
    assert_eq!(points[1], Value::Null);
}

#[test]
fn columns_feed_the_constructor_in_order() {
    let mut builder = point_builder();
    builder.statement(MappedStatement::new("point.auto").result_type(Type::object("Point")));
    let schema = Arc::new(builder.build().unwrap());

    let points = select(schema.clone(), "point.auto", &["A", "B"], vec![row![3_i64, 4_i64]]).unwrap();
    let point = points[0].expect_object();
    assert_eq!(point.peek("x"), Value::I64(3));
    assert_eq!(point.peek("y"), Value::I64(4));

    let err = select(schema, "point.auto", &["A"], vec![row![3_i64]]).unwrap_err();
    assert!(err.is_invalid_schema(), "{err}");
}

#[test]
fn conversion_failures_name_the_column() {
    let err = select(
        author_schema(Settings::default()),
        "author.select",
        &["ID", "USERNAME"],
        vec![row!["one", "jdoe"]],
    )
    .unwrap_err();

    assert!(err.is_result_mapping(), "{err}");
    assert!(err.to_string().contains("`ID`"), "{err}");
}

#[test]
fn prefixed_auto_mapping_skips_columns_split_mid_character() {
    let settings = Settings {
        auto_mapping_behavior: AutoMappingBehavior::Full,
        ..Settings::default()
    };

    let mut builder = builder(settings);
    builder
        .result_map(ResultMap::new("post", Type::object("Post")))
        .result_map(
            ResultMap::new("blog", Type::object("Blog"))
                .mapping(ResultMapping::column("id", "ID").id())
                .mapping(
                    ResultMapping::property("posts")
                        .nested_result_map("post")
                        .column_prefix("s"),
                ),
        )
        .statement(MappedStatement::new("blog.select").result_map("blog"));
    let schema = Arc::new(builder.build().unwrap());

    // `ſ` upper-cases to the one byte prefix `S` but is two bytes wide
    let blogs = select(
        schema,
        "blog.select",
        &["ID", "SID", "SSUBJECT", "ſubject"],
        vec![
            row![1_i64, 10_i64, "first", "x"],
            row![1_i64, 11_i64, "second", "y"],
        ],
    )
    .unwrap();

    assert_eq!(blogs.len(), 1);
    let posts = blogs[0].expect_object().peek("posts");
    let posts = posts.expect_list();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].expect_object().peek("id"), Value::I64(10));
    assert_eq!(posts[1].expect_object().peek("subject"), Value::from("second"));
}
