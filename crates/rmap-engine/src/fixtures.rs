//! Persistable types shared by the engine tests.

use std::sync::OnceLock;

use chrono::NaiveDate;
use rmap_schema::{Persistable, Schema};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Thing {
    pub id: String,
    pub name: String,
    pub count: i32,
}

impl Persistable for Thing {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Thing")
                .identity("id", |t| &t.id, |t, v| t.id = v)
                .field("name", |t| &t.name, |t, v| t.name = v)
                .field("count", |t| &t.count, |t, v| t.count = v)
                .build()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Holder {
    pub id: String,
    pub items: Vec<String>,
    pub scores: Vec<i64>,
}

impl Persistable for Holder {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Holder")
                .identity("id", |h| &h.id, |h, v| h.id = v)
                .list("items", |h| &h.items, |h, v| h.items = v)
                .list("scores", |h| &h.scores, |h, v| h.scores = v)
                .build()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Child {
    pub id: String,
    pub value: i32,
}

impl Persistable for Child {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Child")
                .identity("id", |c| &c.id, |c, v| c.id = v)
                .field("value", |c| &c.value, |c, v| c.value = v)
                .build()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Parent {
    pub id: String,
    pub child: Option<Child>,
}

impl Persistable for Parent {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Parent")
                .identity("id", |p| &p.id, |p, v| p.id = v)
                .reference("child", |p| p.child.as_ref(), |p, v| p.child = Some(v))
                .build()
        })
    }
}

/// Numeric identity and a list of references.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Team {
    pub id: i64,
    pub name: Option<String>,
    pub members: Vec<Child>,
}

impl Persistable for Team {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Team")
                .identity("id", |t| &t.id, |t, v| t.id = v)
                .field("name", |t| &t.name, |t, v| t.name = v)
                .references("members", |t| &t.members, |t, v| t.members = v)
                .build()
        })
    }
}

/// References to a type whose identity is numeric.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct League {
    pub id: String,
    pub top: Option<Team>,
    pub teams: Vec<Team>,
}

impl Persistable for League {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("League")
                .identity("id", |l| &l.id, |l, v| l.id = v)
                .reference("top", |l| l.top.as_ref(), |l, v| l.top = Some(v))
                .references("teams", |l| &l.teams, |l, v| l.teams = v)
                .build()
        })
    }
}

/// Every scalar kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Sample {
    pub id: String,
    pub small: i32,
    pub large: i64,
    pub ratio: f64,
    pub weight: f32,
    pub active: bool,
    pub day: Option<NaiveDate>,
}

impl Persistable for Sample {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Sample")
                .identity("id", |s| &s.id, |s, v| s.id = v)
                .field("small", |s| &s.small, |s, v| s.small = v)
                .field("large", |s| &s.large, |s, v| s.large = v)
                .field("ratio", |s| &s.ratio, |s, v| s.ratio = v)
                .field("weight", |s| &s.weight, |s, v| s.weight = v)
                .field("active", |s| &s.active, |s, v| s.active = v)
                .field("day", |s| &s.day, |s, v| s.day = v)
                .build()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Issue {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub description: String,
}

impl Persistable for Issue {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Issue")
                .identity("id", |i| &i.id, |i, v| i.id = v)
                .field("date", |i| &i.date, |i, v| i.date = v)
                .field("description", |i| &i.description, |i, v| i.description = v)
                .build()
        })
    }
}

/// Legacy-keyed record with a lazy reference list and an aliased field.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Repo {
    pub id: String,
    pub url: String,
    pub author_name: String,
    pub issues: Vec<Issue>,
}

impl Persistable for Repo {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Repo")
                .identity("id", |r| &r.id, |r, v| r.id = v)
                .field("url", |r| &r.url, |r, v| r.url = v)
                .field("authorName", |r| &r.author_name, |r, v| r.author_name = v)
                .references("issues", |r| &r.issues, |r, v| r.issues = v)
                .lazy("issues")
                .aliases("url", &["htmlUrl", "URL"])
                .build()
        })
    }
}

/// A singly linked node; lets a graph point back at itself.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub next: Option<Box<Node>>,
}

impl Persistable for Node {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Node")
                .identity("id", |n| &n.id, |n, v| n.id = v)
                .field("label", |n| &n.label, |n, v| n.label = v)
                .reference("next", |n| n.next.as_deref(), |n, v| n.next = Some(Box::new(v)))
                .build()
        })
    }
}

#[derive(Debug, Default)]
pub struct NoIdentity {
    pub name: String,
}

impl Persistable for NoIdentity {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("NoIdentity")
                .field("name", |n| &n.name, |n, v| n.name = v)
                .build()
        })
    }
}

/// A field name that collides with the type marker.
#[derive(Debug, Default)]
pub struct Clashing {
    pub id: String,
    pub class: String,
}

impl Persistable for Clashing {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Self>("Clashing")
                .identity("id", |c| &c.id, |c, v| c.id = v)
                .field("_class", |c| &c.class, |c, v| c.class = v)
                .build()
        })
    }
}

pub fn child(id: &str, value: i32) -> Child {
    Child {
        id: id.to_string(),
        value,
    }
}
