//! Star schema assembly
//!
//! Two layouts are supported. `combined` keys one dimension table by the
//! (browser, operating system, file type) tuple and keeps geolocation inline
//! in the fact table. `staged` gives every attribute its own dimension table
//! and writes the set under `staging/`.

use crate::classify::Classification;
use crate::config::SchemaVariant;
use crate::geo::Geolocation;
use crate::output::{Dataset, Table};
use crate::parse::LogRecord;
use crate::state::{DimensionId, DimensionRegistry};
use chrono::NaiveDate;

/// A fully enriched request, ready to become a fact row
#[derive(Debug, Clone)]
pub struct Request {
    pub record: LogRecord,
    pub classification: Classification,
    pub file_type: String,
    pub geolocation: Geolocation,
    pub is_crawler: bool,
}

/// Dimension key of the combined layout
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentDimension {
    pub browser: String,
    pub operating_system: String,
    pub file_type: String,
}

/// Fact row of the combined layout
#[derive(Debug, Clone)]
pub struct CombinedFact {
    pub dimension_id: DimensionId,
    pub record: LogRecord,
    pub is_crawler: bool,
    pub geolocation: Geolocation,
}

/// Fact row of the staged layout
#[derive(Debug, Clone)]
pub struct StagedFact {
    pub record: LogRecord,
    pub browser_id: DimensionId,
    pub os_id: DimensionId,
    pub file_type_id: DimensionId,
    pub date_id: DimensionId,
    pub ip_id: DimensionId,
    pub geolocation_id: DimensionId,
    pub is_crawler: bool,
}

const COMBINED_FACT_COLUMNS: &[&str] = &[
    "dimension_id",
    "date",
    "time",
    "s-ip",
    "cs-method",
    "cs-uri-stem",
    "cs-uri-query",
    "s-port",
    "cs-username",
    "c-ip",
    "cs(User-Agent)",
    "sc-status",
    "sc-bytes",
    "cs-bytes",
    "time-taken",
    "is_crawler",
    "postcode",
    "city",
    "state",
    "country",
];

const STAGED_FACT_COLUMNS: &[&str] = &[
    "date",
    "time",
    "s_ip",
    "method",
    "uri_stem",
    "uri_query",
    "s_port",
    "username",
    "ip_address",
    "user_agent",
    "status",
    "bytes_sent",
    "bytes_received",
    "time_taken",
    "browser_id",
    "os_id",
    "file_type_id",
    "date_id",
    "ip_id",
    "geolocation_id",
    "is_crawler",
];

const GEOLOCATION_COLUMNS: &[&str] = &["id", "postcode", "city", "state", "country"];

/// Accumulates fact rows and dimensions for one layout
#[derive(Debug, Clone)]
pub enum StarSchema {
    Combined(CombinedSchema),
    Staged(StagedSchema),
}

impl StarSchema {
    /// Creates an empty schema of the given layout
    pub fn new(variant: SchemaVariant) -> Self {
        match variant {
            SchemaVariant::Combined => Self::Combined(CombinedSchema::default()),
            SchemaVariant::Staged => Self::Staged(StagedSchema::default()),
        }
    }

    /// Returns true if the layout can hold this record
    ///
    /// The staged layout has a date dimension and needs a `YYYY-MM-DD` date.
    pub fn accepts(&self, record: &LogRecord) -> bool {
        match self {
            Self::Combined(_) => true,
            Self::Staged(_) => record.parsed_date().is_some(),
        }
    }

    /// Interns the request's dimensions and appends its fact row
    ///
    /// Returns false, appending nothing, if the layout rejects the record.
    pub fn append(&mut self, request: Request) -> bool {
        match self {
            Self::Combined(schema) => {
                schema.append(request);
                true
            }
            Self::Staged(schema) => schema.append(request),
        }
    }

    /// Number of fact rows so far
    pub fn fact_count(&self) -> usize {
        match self {
            Self::Combined(schema) => schema.facts.len(),
            Self::Staged(schema) => schema.facts.len(),
        }
    }

    /// Row counts of the dimension tables, in output order
    pub fn dimension_counts(&self) -> Vec<(&'static str, u64)> {
        let count = |n: usize| n as u64;
        match self {
            Self::Combined(schema) => vec![("dimensions", count(schema.dimensions.len()))],
            Self::Staged(schema) => vec![
                ("browsers", count(schema.browsers.len())),
                ("operating_systems", count(schema.operating_systems.len())),
                ("file_types", count(schema.file_types.len())),
                ("dates", count(schema.dates.len())),
                ("ips", count(schema.ips.len())),
                ("geolocations", count(schema.geolocations.len())),
            ],
        }
    }

    /// Materializes the dimension and fact tables
    pub fn into_dataset(self) -> Dataset {
        match self {
            Self::Combined(schema) => schema.into_dataset(),
            Self::Staged(schema) => schema.into_dataset(),
        }
    }
}

/// Combined layout: one (browser, OS, file type) dimension
#[derive(Debug, Clone, Default)]
pub struct CombinedSchema {
    dimensions: DimensionRegistry<AgentDimension>,
    facts: Vec<CombinedFact>,
}

impl CombinedSchema {
    fn append(&mut self, request: Request) {
        let dimension_id = self.dimensions.intern(AgentDimension {
            browser: request.classification.browser,
            operating_system: request.classification.operating_system,
            file_type: request.file_type,
        });

        self.facts.push(CombinedFact {
            dimension_id,
            record: request.record,
            is_crawler: request.is_crawler,
            geolocation: request.geolocation,
        });
    }

    /// The dimension registry
    pub fn dimensions(&self) -> &DimensionRegistry<AgentDimension> {
        &self.dimensions
    }

    /// Fact rows in input order
    pub fn facts(&self) -> &[CombinedFact] {
        &self.facts
    }

    fn into_dataset(self) -> Dataset {
        let mut dimensions = Table::new(
            "dimensions",
            &["id", "browser", "operating_system", "file_type"],
        );
        for (id, key) in self.dimensions.iter() {
            dimensions.push_row(vec![
                id.to_string(),
                key.browser.clone(),
                key.operating_system.clone(),
                key.file_type.clone(),
            ]);
        }

        let mut facts = Table::new("facts", COMBINED_FACT_COLUMNS);
        for fact in self.facts {
            let mut row = Vec::with_capacity(COMBINED_FACT_COLUMNS.len());
            row.push(fact.dimension_id.to_string());
            row.extend(fact.record.fields().iter().map(|f| f.to_string()));
            row.push(crawler_flag(fact.is_crawler));
            row.extend(geolocation_values(fact.geolocation));
            facts.push_row(row);
        }

        Dataset {
            subdirectory: None,
            tables: vec![dimensions, facts],
        }
    }
}

/// Staged layout: one table per dimension
#[derive(Debug, Clone, Default)]
pub struct StagedSchema {
    browsers: DimensionRegistry<String>,
    operating_systems: DimensionRegistry<String>,
    file_types: DimensionRegistry<String>,
    dates: DimensionRegistry<NaiveDate>,
    ips: DimensionRegistry<String>,
    geolocations: DimensionRegistry<Geolocation>,
    facts: Vec<StagedFact>,
}

impl StagedSchema {
    fn append(&mut self, request: Request) -> bool {
        let Some(date) = request.record.parsed_date() else {
            return false;
        };

        let fact = StagedFact {
            browser_id: self.browsers.intern(request.classification.browser),
            os_id: self
                .operating_systems
                .intern(request.classification.operating_system),
            file_type_id: self.file_types.intern(request.file_type),
            date_id: self.dates.intern(date),
            ip_id: self.ips.intern(request.record.client_ip.clone()),
            geolocation_id: self.geolocations.intern(request.geolocation),
            is_crawler: request.is_crawler,
            record: request.record,
        };
        self.facts.push(fact);
        true
    }

    /// Fact rows in input order
    pub fn facts(&self) -> &[StagedFact] {
        &self.facts
    }

    fn into_dataset(self) -> Dataset {
        let mut geolocations = Table::new("geolocations", GEOLOCATION_COLUMNS);
        for (id, geo) in self.geolocations.iter() {
            let mut row = vec![id.to_string()];
            row.extend(geolocation_values(geo.clone()));
            geolocations.push_row(row);
        }

        let mut dates = Table::new("dates", &["id", "date"]);
        for (id, date) in self.dates.iter() {
            dates.push_row(vec![id.to_string(), date.format("%Y-%m-%d").to_string()]);
        }

        let mut crawler_data = Table::new("crawler_data", &["ip_address", "is_crawler"]);
        let mut facts = Table::new("facts", STAGED_FACT_COLUMNS);
        for fact in self.facts {
            crawler_data.push_row(vec![
                fact.record.client_ip.clone(),
                crawler_flag(fact.is_crawler),
            ]);

            let mut row = Vec::with_capacity(STAGED_FACT_COLUMNS.len());
            row.extend(fact.record.fields().iter().map(|f| f.to_string()));
            row.extend(
                [
                    fact.browser_id,
                    fact.os_id,
                    fact.file_type_id,
                    fact.date_id,
                    fact.ip_id,
                    fact.geolocation_id,
                ]
                .iter()
                .map(|id| id.to_string()),
            );
            row.push(crawler_flag(fact.is_crawler));
            facts.push_row(row);
        }

        Dataset {
            subdirectory: Some("staging"),
            tables: vec![
                name_table("browsers", &self.browsers),
                name_table("operating_systems", &self.operating_systems),
                name_table("file_types", &self.file_types),
                dates,
                id_table("ips", "ip_address", &self.ips),
                geolocations,
                crawler_data,
                facts,
            ],
        }
    }
}

fn name_table(name: &'static str, registry: &DimensionRegistry<String>) -> Table {
    id_table(name, "name", registry)
}

fn id_table(
    name: &'static str,
    column: &'static str,
    registry: &DimensionRegistry<String>,
) -> Table {
    let mut table = Table::new(name, &["id", column]);
    for (id, value) in registry.iter() {
        table.push_row(vec![id.to_string(), value.clone()]);
    }
    table
}

fn geolocation_values(geo: Geolocation) -> [String; 4] {
    [geo.postcode, geo.city, geo.state, geo.country]
}

fn crawler_flag(is_crawler: bool) -> String {
    let flag = if is_crawler { "1" } else { "0" };
    flag.to_string()
}
