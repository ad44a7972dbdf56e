//! Pest catalog domain: pest records, their grouped control methods, and the
//! storage port the HTTP layer talks to.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::SagipResult;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// The three fixed control-method tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlCategory {
    Cultural,
    Biological,
    Chemical,
}

impl ControlCategory {
    pub const ALL: [ControlCategory; 3] = [
        ControlCategory::Cultural,
        ControlCategory::Biological,
        ControlCategory::Chemical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ControlCategory::Cultural => "Cultural",
            ControlCategory::Biological => "Biological",
            ControlCategory::Chemical => "Chemical",
        }
    }
}

impl fmt::Display for ControlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for ControlCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cultural" => Ok(ControlCategory::Cultural),
            "Biological" => Ok(ControlCategory::Biological),
            "Chemical" => Ok(ControlCategory::Chemical),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Control methods of one pest, partitioned by category. Serializes with all
/// three keys present; each key is optional when decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMethods {
    #[serde(rename = "Cultural", default)]
    pub cultural: Vec<String>,
    #[serde(rename = "Biological", default)]
    pub biological: Vec<String>,
    #[serde(rename = "Chemical", default)]
    pub chemical: Vec<String>,
}

impl ControlMethods {
    /// Decodes the JSON text carried in the `controlMethods` form field.
    ///
    /// Absent, empty, or malformed input yields the empty structure instead of
    /// an error.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str(raw) {
            Ok(methods) => methods,
            Err(e) => {
                tracing::warn!("Ignoring malformed controlMethods payload: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, category: ControlCategory) -> &[String] {
        match category {
            ControlCategory::Cultural => &self.cultural,
            ControlCategory::Biological => &self.biological,
            ControlCategory::Chemical => &self.chemical,
        }
    }

    pub fn push(&mut self, category: ControlCategory, description: String) {
        match category {
            ControlCategory::Cultural => self.cultural.push(description),
            ControlCategory::Biological => self.biological.push(description),
            ControlCategory::Chemical => self.chemical.push(description),
        }
    }

    /// Flattens into `(category, description)` pairs, category by category.
    pub fn entries(&self) -> impl Iterator<Item = (ControlCategory, &str)> + '_ {
        ControlCategory::ALL.into_iter().flat_map(move |category| {
            self.get(category)
                .iter()
                .map(move |description| (category, description.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.cultural.len() + self.biological.len() + self.chemical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row of the `pest` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PestRecord {
    pub id_pest: i32,
    pub pest_name: String,
    pub tagalog_name: Option<String>,
    pub pest_img: Option<String>,
    pub identifying_marks: Option<String>,
    pub where_to_find: Option<String>,
    pub damage: Option<String>,
    pub life_cycle: Option<String>,
    pub life_cycle_img: Option<String>,
    pub host: Option<String>,
}

/// One row of the `controlmethod` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ControlMethodRow {
    pub id_pest: i32,
    pub category: String,
    pub description: String,
}

/// A pest as served by `GET /pests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pest {
    #[serde(flatten)]
    pub record: PestRecord,
    pub control_methods: ControlMethods,
}

/// Merges control-method rows into their pests.
///
/// Rows must arrive in insertion order; that order is kept within each
/// category. Rows for unknown pests or with an unrecognized category are
/// dropped.
pub fn group_control_methods(records: Vec<PestRecord>, rows: Vec<ControlMethodRow>) -> Vec<Pest> {
    let mut grouped: HashMap<i32, ControlMethods> = HashMap::with_capacity(records.len());
    for row in rows {
        let category = match row.category.parse::<ControlCategory>() {
            Ok(category) => category,
            Err(UnknownCategory(tag)) => {
                tracing::warn!(id_pest = row.id_pest, "Skipping control method with unknown category {:?}", tag);
                continue;
            }
        };
        grouped
            .entry(row.id_pest)
            .or_default()
            .push(category, row.description);
    }

    records
        .into_iter()
        .map(|record| {
            let control_methods = grouped.remove(&record.id_pest).unwrap_or_default();
            Pest {
                record,
                control_methods,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPest {
    pub pest_name: String,
    pub tagalog_name: Option<String>,
    pub pest_img: Option<String>,
    pub identifying_marks: Option<String>,
    pub where_to_find: Option<String>,
    pub damage: Option<String>,
    pub life_cycle: Option<String>,
    pub life_cycle_img: Option<String>,
    pub host: Option<String>,
    pub control_methods: ControlMethods,
}

/// Changes applied by an update. `None` leaves the stored column untouched;
/// the control methods are always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PestUpdate {
    pub pest_name: Option<String>,
    pub tagalog_name: Option<String>,
    pub pest_img: Option<String>,
    pub identifying_marks: Option<String>,
    pub where_to_find: Option<String>,
    pub damage: Option<String>,
    pub life_cycle: Option<String>,
    pub life_cycle_img: Option<String>,
    pub host: Option<String>,
    pub control_methods: ControlMethods,
}

impl PestUpdate {
    /// Column assignments for the `UPDATE pest SET ...` list, in a stable
    /// order. Only supplied fields appear.
    pub fn assignments(&self) -> Vec<(&'static str, &str)> {
        [
            ("pest_name", &self.pest_name),
            ("tagalog_name", &self.tagalog_name),
            ("identifying_marks", &self.identifying_marks),
            ("where_to_find", &self.where_to_find),
            ("damage", &self.damage),
            ("life_cycle", &self.life_cycle),
            ("host", &self.host),
            ("pest_img", &self.pest_img),
            ("life_cycle_img", &self.life_cycle_img),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }
}

/// Storage port for pests and their control methods.
#[async_trait]
pub trait PestStore: Send + Sync {
    /// All pests, each with all three control-method categories present.
    async fn list_pests(&self) -> SagipResult<Vec<Pest>>;

    /// Distinct non-empty host values.
    async fn distinct_hosts(&self) -> SagipResult<Vec<String>>;

    /// Inserts the pest and its control methods, returning the new id.
    async fn create_pest(&self, pest: NewPest) -> SagipResult<i32>;

    /// Applies `update` and replaces the control methods atomically.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SagipError::NotFound`] when no pest has `id`.
    async fn update_pest(&self, id: i32, update: PestUpdate) -> SagipResult<()>;

    /// Removes the pest and its control methods. Returns `false` when no pest
    /// row matched.
    async fn delete_pest(&self, id: i32) -> SagipResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i32, name: &str) -> PestRecord {
        PestRecord {
            id_pest: id,
            pest_name: name.to_string(),
            tagalog_name: None,
            pest_img: None,
            identifying_marks: None,
            where_to_find: None,
            damage: None,
            life_cycle: None,
            life_cycle_img: None,
            host: None,
        }
    }

    fn row(id: i32, category: &str, description: &str) -> ControlMethodRow {
        ControlMethodRow {
            id_pest: id,
            category: category.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn parses_category_tags_exactly() {
        for category in ControlCategory::ALL {
            assert_eq!(category.as_str().parse::<ControlCategory>(), Ok(category));
        }
        assert!("cultural".parse::<ControlCategory>().is_err());
        assert!("Mechanical".parse::<ControlCategory>().is_err());
    }

    #[test]
    fn lenient_parse_accepts_partial_structures() {
        let methods = ControlMethods::parse_lenient(Some(r#"{"Chemical":["b","c"]}"#));
        assert!(methods.cultural.is_empty());
        assert!(methods.biological.is_empty());
        assert_eq!(methods.chemical, vec!["b", "c"]);
    }

    #[test]
    fn lenient_parse_falls_back_to_empty() {
        assert!(ControlMethods::parse_lenient(None).is_empty());
        assert!(ControlMethods::parse_lenient(Some("   ")).is_empty());
        assert!(ControlMethods::parse_lenient(Some("{not json")).is_empty());
        assert!(ControlMethods::parse_lenient(Some("null")).is_empty());
        assert!(ControlMethods::parse_lenient(Some(r#"{"Cultural":"weed"}"#)).is_empty());
    }

    #[test]
    fn entries_walk_categories_in_fixed_order() {
        let methods = ControlMethods {
            cultural: vec!["a".into()],
            biological: vec![],
            chemical: vec!["b".into(), "c".into()],
        };
        let entries: Vec<_> = methods.entries().collect();
        assert_eq!(
            entries,
            vec![
                (ControlCategory::Cultural, "a"),
                (ControlCategory::Chemical, "b"),
                (ControlCategory::Chemical, "c"),
            ]
        );
        assert_eq!(methods.len(), 3);
    }

    #[test]
    fn grouping_keeps_every_category_key() {
        let pests = group_control_methods(vec![record(1, "Stem borer")], vec![]);
        let json = serde_json::to_value(&pests[0]).unwrap();
        let keys: Vec<_> = json["controlMethods"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys.len(), 3);
        for key in ["Cultural", "Biological", "Chemical"] {
            assert_eq!(json["controlMethods"][key], serde_json::json!([]));
        }
        assert_eq!(json["pestName"], "Stem borer");
        assert_eq!(json["idPest"], 1);
    }

    #[test]
    fn grouping_partitions_rows_by_pest_and_category() {
        let pests = group_control_methods(
            vec![record(1, "Armyworm"), record(2, "Rice bug")],
            vec![
                row(2, "Chemical", "b"),
                row(1, "Cultural", "flood field"),
                row(2, "Cultural", "a"),
                row(2, "Chemical", "c"),
                row(1, "Mechanical", "hand picking"),
                row(9, "Cultural", "orphan"),
            ],
        );

        assert_eq!(pests.len(), 2);
        assert_eq!(pests[0].control_methods.cultural, vec!["flood field"]);
        assert!(pests[0].control_methods.chemical.is_empty());
        assert_eq!(pests[1].control_methods.cultural, vec!["a"]);
        assert!(pests[1].control_methods.biological.is_empty());
        assert_eq!(pests[1].control_methods.chemical, vec!["b", "c"]);
    }

    #[test]
    fn update_assignments_skip_absent_fields() {
        let update = PestUpdate {
            pest_name: Some("Leaf folder".into()),
            host: Some(String::new()),
            life_cycle_img: Some("/uploads/lifecycle/1.png".into()),
            ..PestUpdate::default()
        };
        assert_eq!(
            update.assignments(),
            vec![
                ("pest_name", "Leaf folder"),
                ("host", ""),
                ("life_cycle_img", "/uploads/lifecycle/1.png"),
            ]
        );
        assert!(PestUpdate::default().assignments().is_empty());
    }
}
