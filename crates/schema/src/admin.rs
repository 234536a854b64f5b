//! Operator console configuration: per-model display, search, filter and bulk-action hints.
//!
//! The registry is an explicit [`AdminSite`] value built at startup and handed to whoever
//! serves the console; nothing here is global.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use quizdesk_core::RecordId;

use crate::kind::ResourceKind;
use crate::record::Record;

/// Bulk actions an operator can run over a selection of records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    SetCorrectAnswer,
    SetIncorrectAnswer,
}

impl AdminAction {
    pub fn name(self) -> &'static str {
        match self {
            AdminAction::SetCorrectAnswer => "set_correct_answer",
            AdminAction::SetIncorrectAnswer => "set_incorrect_answer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AdminAction::SetCorrectAnswer => "Mark answers as correct",
            AdminAction::SetIncorrectAnswer => "Mark answers as incorrect",
        }
    }

    /// The changed record, or `None` when the action does not apply to it.
    pub fn apply(self, record: &Record) -> Option<Record> {
        match (self, record) {
            (AdminAction::SetCorrectAnswer, Record::Answer(a)) => {
                let mut a = a.clone();
                a.is_correct = true;
                Some(Record::Answer(a))
            }
            (AdminAction::SetIncorrectAnswer, Record::Answer(a)) => {
                let mut a = a.clone();
                a.is_correct = false;
                Some(Record::Answer(a))
            }
            _ => None,
        }
    }
}

/// Display configuration of one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelAdmin {
    pub kind: ResourceKind,
    pub list_display: &'static [&'static str],
    pub list_display_links: &'static [&'static str],
    /// Field paths searched by `q`; `a__b` follows reference `a` and reads `b`.
    pub search_fields: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    /// Sort keys; a leading `-` sorts descending.
    pub ordering: &'static [&'static str],
    pub list_per_page: usize,
    pub readonly_fields: &'static [&'static str],
    pub list_editable: &'static [&'static str],
    pub actions: &'static [AdminAction],
}

impl ModelAdmin {
    fn plain(kind: ResourceKind) -> Self {
        Self {
            kind,
            list_display: &["id"],
            list_display_links: &[],
            search_fields: &[],
            list_filter: &[],
            ordering: &["id"],
            list_per_page: 10,
            readonly_fields: &[],
            list_editable: &[],
            actions: &[],
        }
    }

    /// Kinds a changelist may follow references into: every non-final segment of the
    /// search, filter and ordering paths, plus reference columns of `list_display`.
    /// Reference fields are named after the singular of their target.
    pub fn reachable_kinds(&self) -> Vec<ResourceKind> {
        let hops = self
            .search_fields
            .iter()
            .chain(self.list_filter)
            .copied()
            .chain(self.ordering.iter().map(|path| path.trim_start_matches('-')))
            .flat_map(|path| {
                let segments: Vec<&str> = path.split("__").collect();
                segments[..segments.len() - 1].to_vec()
            })
            .chain(self.list_display.iter().copied());

        let mut kinds: Vec<ResourceKind> = Vec::new();
        for field in hops {
            let target = ResourceKind::ALL.into_iter().find(|k| k.singular() == field);
            if let Some(kind) = target.filter(|k| !kinds.contains(k)) {
                kinds.push(kind);
            }
        }
        kinds
    }

    pub fn action(&self, name: &str) -> Option<AdminAction> {
        self.actions.iter().copied().find(|a| a.name() == name)
    }

    /// Records matching `query` (case-insensitive substring over `search_fields`)
    /// and every `filters` pair (exact match on a `list_filter` path).
    pub fn select(
        &self,
        records: Vec<Record>,
        index: &RecordIndex,
        query: Option<&str>,
        filters: &[(String, String)],
    ) -> Vec<Record> {
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        records
            .into_iter()
            .filter(|record| match &needle {
                None => true,
                Some(needle) => self.search_fields.iter().any(|path| {
                    lookup(record, path, index)
                        .map(|v| render(&v).to_lowercase().contains(needle.as_str()))
                        .unwrap_or(false)
                }),
            })
            .filter(|record| {
                filters
                    .iter()
                    .filter(|(path, _)| self.list_filter.contains(&path.as_str()))
                    .all(|(path, expected)| {
                        lookup(record, path, index)
                            .map(|v| render(&v) == *expected)
                            .unwrap_or(false)
                    })
            })
            .collect()
    }

    /// Sort per `ordering`.
    pub fn order(&self, records: &mut [Record], index: &RecordIndex) {
        records.sort_by(|a, b| {
            for key in self.ordering {
                let (path, descending) = match key.strip_prefix('-') {
                    Some(path) => (path, true),
                    None => (*key, false),
                };
                let ord = compare(lookup(a, path, index), lookup(b, path, index));
                let ord = if descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// One changelist row: the `list_display` columns of `record`.
    pub fn row(&self, record: &Record, index: &RecordIndex) -> Map<String, Value> {
        self.list_display
            .iter()
            .map(|column| {
                let value = match (*column, record) {
                    ("short_info", Record::Question(q)) => {
                        Value::String(format!("Description: {} characters", q.text.chars().count()))
                    }
                    _ => display_value(record, column, index),
                };
                (column.to_string(), value)
            })
            .collect()
    }
}

/// Registry of every model exposed in the console.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSite {
    pub site_header: String,
    pub index_title: String,
    models: BTreeMap<ResourceKind, ModelAdmin>,
}

impl AdminSite {
    pub fn new(site_header: impl Into<String>, index_title: impl Into<String>) -> Self {
        Self {
            site_header: site_header.into(),
            index_title: index_title.into(),
            models: BTreeMap::new(),
        }
    }

    /// Register `admin`, replacing any earlier registration of the same model.
    pub fn register(&mut self, admin: ModelAdmin) -> &mut Self {
        self.models.insert(admin.kind, admin);
        self
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&ModelAdmin> {
        self.models.get(&kind)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelAdmin> {
        self.models.values()
    }

    /// The console configuration for the six record types.
    pub fn with_defaults() -> Self {
        let mut site = Self::new("DRF site model administration", "Applications and models");
        site.register(ModelAdmin {
            list_display: &["id", "title"],
            list_display_links: &["title"],
            search_fields: &["title"],
            list_filter: &["title"],
            ..ModelAdmin::plain(ResourceKind::Subject)
        })
        .register(ModelAdmin {
            list_display: &["id", "name"],
            list_display_links: &["name"],
            search_fields: &["name"],
            list_filter: &["name"],
            ..ModelAdmin::plain(ResourceKind::Student)
        })
        .register(ModelAdmin {
            list_display: &["id", "student", "subject", "date", "result"],
            list_display_links: &["student", "subject", "date", "result"],
            search_fields: &["result", "subject__title"],
            list_filter: &["result", "subject__title"],
            ..ModelAdmin::plain(ResourceKind::Attempt)
        })
        .register(ModelAdmin {
            list_display: &["id", "text", "subject", "short_info"],
            list_display_links: &["text", "subject"],
            search_fields: &["text", "subject__title"],
            list_filter: &["text", "subject__title"],
            ..ModelAdmin::plain(ResourceKind::Question)
        })
        .register(ModelAdmin {
            list_display: &["id", "text", "is_correct", "question"],
            list_display_links: &["text", "question"],
            search_fields: &["text", "question__text"],
            list_filter: &["text", "question__text", "is_correct"],
            readonly_fields: &["text"],
            list_editable: &["is_correct"],
            actions: &[AdminAction::SetCorrectAnswer, AdminAction::SetIncorrectAnswer],
            ..ModelAdmin::plain(ResourceKind::Answer)
        })
        .register(ModelAdmin {
            list_display: &["id", "attempt", "question", "answer"],
            list_display_links: &["attempt"],
            search_fields: &["question__text", "answer__text"],
            list_filter: &["question__text", "answer__text"],
            list_editable: &["question", "answer"],
            ..ModelAdmin::plain(ResourceKind::Testing)
        });
        site
    }
}

/// Lookup table used to follow references while searching and rendering.
#[derive(Debug, Default)]
pub struct RecordIndex {
    records: HashMap<(ResourceKind, RecordId), Record>,
}

impl RecordIndex {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| ((r.kind(), r.id()), r))
                .collect(),
        }
    }

    pub fn get(&self, kind: ResourceKind, id: RecordId) -> Option<&Record> {
        self.records.get(&(kind, id))
    }
}

/// Resolve a `a__b__c` path against `record`.
fn lookup(record: &Record, path: &str, index: &RecordIndex) -> Option<Value> {
    let (head, rest) = match path.split_once("__") {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let value = record.to_json().get(head)?.clone();
    match rest {
        None => Some(value),
        Some(rest) => {
            let target = referenced(record, head, &value, index)?;
            lookup(target, rest, index)
        }
    }
}

fn referenced<'a>(
    record: &Record,
    field: &str,
    value: &Value,
    index: &'a RecordIndex,
) -> Option<&'a Record> {
    let id: RecordId = value.as_str()?.parse().ok()?;
    record
        .references()
        .into_iter()
        .find(|(kind, rid)| *rid == id && kind.singular() == field)
        .and_then(|(kind, rid)| index.get(kind, rid))
}

/// Column value; references are shown by the display string of their target.
fn display_value(record: &Record, column: &str, index: &RecordIndex) -> Value {
    let Some(value) = record.to_json().get(column).cloned() else {
        return Value::Null;
    };
    match referenced(record, column, &value, index) {
        Some(target) => Value::String(target.display()),
        None => value,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(a: Option<Value>, b: Option<Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => render(&x).cmp(&render(&y)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
