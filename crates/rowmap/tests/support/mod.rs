#![allow(dead_code)]

use rowmap::{
    driver::MemoryRows,
    object::ObjectType,
    schema::{Builder, MappedStatement, ResultMap, ResultMapping},
    RowSource, Schema, Settings, Type, Value,
};

use std::sync::Arc;

/// Builds a row out of anything convertible into a value.
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$(::rowmap::Value::from($value)),*]
    };
}

pub fn source(columns: &[&str], rows: Vec<Vec<Value>>) -> Box<dyn RowSource> {
    Box::new(MemoryRows::from_rows(columns, rows))
}

/// Builder with the blog domain registered.
pub fn builder(settings: Settings) -> Builder {
    let mut builder = Schema::builder();
    builder
        .settings(settings)
        .object_type(
            ObjectType::bean("Author")
                .property("id", Type::I64)
                .property("username", Type::String)
                .property("firstName", Type::String)
                .property("blogs", Type::list(Type::object("Blog"))),
        )
        .object_type(
            ObjectType::bean("Post")
                .property("id", Type::I64)
                .property("subject", Type::String)
                .property("blog", Type::object("Blog")),
        )
        .object_type(
            ObjectType::bean("Blog")
                .property("id", Type::I64)
                .property("title", Type::String)
                .property("author", Type::object("Author"))
                .property("posts", Type::list(Type::object("Post")))
                .property("comments", Type::list(Type::object("Post"))),
        );
    builder
}

/// `blog` joined with its posts, read from `ID, TITLE, POST_ID, POST_SUBJECT`.
pub fn blog_schema(settings: Settings, ordered: bool) -> Arc<Schema> {
    let mut builder = builder(settings);
    builder
        .result_map(
            ResultMap::new("post", Type::object("Post"))
                .mapping(ResultMapping::column("id", "POST_ID").id())
                .mapping(ResultMapping::column("subject", "POST_SUBJECT")),
        )
        .result_map(
            ResultMap::new("blog", Type::object("Blog"))
                .mapping(ResultMapping::column("id", "ID").id())
                .mapping(ResultMapping::column("title", "TITLE"))
                .mapping(ResultMapping::property("posts").nested_result_map("post")),
        )
        .statement(
            MappedStatement::new("blog.select")
                .result_map("blog")
                .ordered(ordered),
        );
    Arc::new(builder.build().unwrap())
}

pub fn blog_rows(rows: Vec<Vec<Value>>) -> Box<dyn RowSource> {
    source(&["ID", "TITLE", "POST_ID", "POST_SUBJECT"], rows)
}

/// Two blogs, the first with two posts, then a blog without posts.
pub fn three_blogs() -> Vec<Vec<Value>> {
    vec![
        row![1_i64, "a", 10_i64, "x"],
        row![1_i64, "a", 11_i64, "y"],
        row![2_i64, "b", 20_i64, "z"],
        row![3_i64, "c", Value::Null, Value::Null],
    ]
}

pub fn subjects(blog: &Value) -> Vec<Value> {
    blog.expect_object()
        .peek("posts")
        .expect_list()
        .iter()
        .map(|post| post.expect_object().peek("subject"))
        .collect()
}

pub fn ids(values: &[Value]) -> Vec<Value> {
    values
        .iter()
        .map(|value| value.expect_object().peek("id"))
        .collect()
}

/// `author` read from `ID, USERNAME`, selected by `author.select`.
pub fn author_schema(settings: Settings) -> Arc<Schema> {
    let mut builder = builder(settings);
    builder
        .result_map(
            ResultMap::new("author", Type::object("Author"))
                .mapping(ResultMapping::column("id", "ID").id())
                .mapping(ResultMapping::column("username", "USERNAME")),
        )
        .statement(MappedStatement::new("author.select").result_map("author"));
    Arc::new(builder.build().unwrap())
}

/// Authors `1..=count`, named `user<id>`.
pub fn author_rows(count: i64) -> MemoryRows {
    MemoryRows::from_rows(
        &["ID", "USERNAME"],
        (1..=count).map(|id| row![id, format!("user{id}")]),
    )
}
