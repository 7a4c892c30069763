//! Fixture tables queries are evaluated against.
//!
//! A [`FixtureSet`] is a named bundle of tables used to seed a
//! [`FixtureStore`]. The store owns the tables for one simulator; tables are
//! replaced wholesale, never merged, and rows keep their insertion order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use livemock_proto::{Row, Value};

/// Build a row from `(column, value)` pairs.
pub fn row<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(column, value)| (column.into(), value.into())).collect()
}

/// Named bundle of tables used to seed a [`FixtureStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSet {
    name: String,
    tables: BTreeMap<String, Vec<Row>>,
}

impl FixtureSet {
    /// A set without tables.
    ///
    /// It has no `status` table, so a simulator built on it can only enter a
    /// scope without the status probe (`enter_with(false)` or
    /// `MockConfig::expect_status_query = false`) unless one is added.
    pub fn empty() -> Self {
        Self { name: "empty".to_string(), tables: BTreeMap::new() }
    }

    /// Default monitoring tables, versioned with the current date.
    pub fn monitoring() -> Self {
        Self::monitoring_at(Utc::now())
    }

    /// Default monitoring tables as seen at `now`.
    ///
    /// Tables: `status`, `downtimes`, `hosts`, `services`, `hostgroups` and
    /// `servicegroups`. Only `status` depends on `now`: its version strings
    /// carry the date with dots (`2024.01.31`) and `program_start` is the
    /// Unix timestamp.
    pub fn monitoring_at(now: DateTime<Utc>) -> Self {
        let today = now.format("%Y.%m.%d").to_string();
        let helper_usage = 0.001_519_53;
        let average_latency = 0.084_603_9;

        Self { name: "monitoring".to_string(), tables: BTreeMap::new() }
            .with_table("status", vec![row([
                ("livestatus_version", Value::from(today.as_str())),
                ("program_version", Value::from(format!("Check_MK {today}"))),
                ("program_start", Value::Int(now.timestamp())),
                ("num_hosts", Value::Int(1)),
                ("num_services", Value::Int(36)),
                ("helper_usage_cmk", Value::Float(helper_usage)),
                ("helper_usage_fetcher", Value::Float(helper_usage)),
                ("helper_usage_checker", Value::Float(helper_usage)),
                ("helper_usage_generic", Value::Float(helper_usage)),
                ("average_latency_cmk", Value::Float(average_latency)),
                ("average_latency_fetcher", Value::Float(average_latency)),
                ("average_latency_generic", Value::Float(average_latency)),
            ])])
            .with_table("downtimes", vec![row([
                ("id", Value::Int(54)),
                ("host_name", Value::from("heute")),
                ("service_description", Value::from("CPU load")),
                ("is_service", Value::Int(1)),
                ("author", Value::from("cmkadmin")),
                ("start_time", Value::Int(1_593_770_319)),
                ("end_time", Value::Int(1_596_448_719)),
                ("recurring", Value::Int(0)),
                ("comment", Value::from("Downtime for service")),
            ])])
            .with_table("hosts", vec![
                row([("name", Value::from("heute")), ("parents", Value::from(vec!["example.com"]))]),
                row([("name", Value::from("example.com")), ("parents", Value::List(vec![]))]),
            ])
            .with_table("services", vec![
                row([("host_name", "example.com"), ("description", "Memory")]),
                row([("host_name", "example.com"), ("description", "CPU load")]),
                row([("host_name", "heute"), ("description", "CPU load")]),
            ])
            .with_table("hostgroups", vec![
                row([("name", Value::from("heute")), ("members", Value::from(vec!["heute"]))]),
                row([
                    ("name", Value::from("example")),
                    ("members", Value::from(vec!["example.com", "heute"])),
                ]),
            ])
            .with_table("servicegroups", vec![
                row([
                    ("name", Value::from("heute")),
                    ("members", Value::from(vec![vec!["heute", "Memory"]])),
                ]),
                row([
                    ("name", Value::from("example")),
                    ("members", Value::from(vec![
                        vec!["example.com", "Memory"],
                        vec!["example.com", "CPU load"],
                        vec!["heute", "CPU load"],
                    ])),
                ]),
            ])
    }

    /// Add or replace a table.
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.insert(name.into(), rows);
        self
    }

    /// Name of the set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the tables in the set, sorted.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

impl Default for FixtureSet {
    fn default() -> Self {
        Self::monitoring()
    }
}

/// Tables of one simulator instance.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    tables: BTreeMap<String, Vec<Row>>,
}

impl FixtureStore {
    /// Seed a store with the tables of `set`.
    pub fn new(set: FixtureSet) -> Self {
        Self { tables: set.tables }
    }

    /// Add a table, replacing any table of the same name.
    ///
    /// Returns the rows that were replaced.
    pub fn add_table(&mut self, name: impl Into<String>, rows: Vec<Row>) -> Option<Vec<Row>> {
        self.tables.insert(name.into(), rows)
    }

    /// Rows of a table, in insertion order.
    pub fn table(&self, name: &str) -> Option<&[Row]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// Whether a table is stored.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Sorted union of the columns present across a table's rows.
    ///
    /// Empty for unknown or empty tables.
    pub fn columns(&self, name: &str) -> Vec<String> {
        let Some(rows) = self.tables.get(name) else {
            return Vec::new();
        };
        rows.iter().flat_map(Row::keys).cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }
}
