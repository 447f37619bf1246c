use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Value written for any field the listing page did not resolve
pub const NO_INFORMATION: &str = "Brak informacji";

fn no_information() -> String {
    NO_INFORMATION.to_string()
}

/// Geocoordinates read from the "view in maps" link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

impl Coordinates {
    pub fn unknown() -> Self {
        Self {
            latitude: no_information(),
            longitude: no_information(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.latitude != NO_INFORMATION && self.longitude != NO_INFORMATION
    }
}

/// Fields every listing page carries in a fixed place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFields {
    pub price: String,
    pub price_per_sqm: String,
    pub area: String,
    pub rooms_count: String,
    pub address: String,
    pub agency_name: String,
    pub published: String,
}

impl StaticFields {
    /// Names under which the static fields are stored
    pub const NAMES: [&'static str; 7] = [
        "Price",
        "Price per sqm",
        "Area",
        "Rooms count",
        "Address",
        "Real estate office name",
        "Date",
    ];

    pub fn unknown() -> Self {
        Self {
            price: no_information(),
            price_per_sqm: no_information(),
            area: no_information(),
            rooms_count: no_information(),
            address: no_information(),
            agency_name: no_information(),
            published: no_information(),
        }
    }

    /// Build from `(name, value)` lookups; a missing name falls back to the sentinel
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&'static str) -> Option<String>,
    {
        let mut field = |name| lookup(name).unwrap_or_else(no_information);
        Self {
            price: field(Self::NAMES[0]),
            price_per_sqm: field(Self::NAMES[1]),
            area: field(Self::NAMES[2]),
            rooms_count: field(Self::NAMES[3]),
            address: field(Self::NAMES[4]),
            agency_name: field(Self::NAMES[5]),
            published: field(Self::NAMES[6]),
        }
    }

    pub fn into_pairs(self) -> [(&'static str, String); 7] {
        [
            (Self::NAMES[0], self.price),
            (Self::NAMES[1], self.price_per_sqm),
            (Self::NAMES[2], self.area),
            (Self::NAMES[3], self.rooms_count),
            (Self::NAMES[4], self.address),
            (Self::NAMES[5], self.agency_name),
            (Self::NAMES[6], self.published),
        ]
    }
}

/// A group of extracted fields, merged into a [`PropertyRecord`] at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldGroup {
    Static(StaticFields),
    /// Details-table entries whose keys vary from listing to listing, in page order
    Dynamic(Vec<(String, String)>),
}

/// One scraped listing, stored as a flat JSON object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyRecord {
    pub link: String,
    #[serde(default)]
    pub page_number: u32,
    #[serde(rename = "Latitude", default = "no_information")]
    pub latitude: String,
    #[serde(rename = "Longitude", default = "no_information")]
    pub longitude: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
    /// Extracted fields in insertion order. Values written by this crate are
    /// strings, but any JSON value already in the store is kept as is.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PropertyRecord {
    /// Keys owned by the record itself; extracted fields never take them
    pub const RESERVED_KEYS: [&'static str; 5] =
        ["link", "page_number", "Latitude", "Longitude", "scraped_at"];

    pub fn new(link: impl Into<String>, page_number: u32, coordinates: Coordinates) -> Self {
        Self {
            link: link.into(),
            page_number,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            scraped_at: Some(Utc::now()),
            fields: Map::new(),
        }
    }

    /// Merge a field group; later groups overwrite keys set by earlier ones
    pub fn merge(&mut self, group: FieldGroup) {
        match group {
            FieldGroup::Static(fields) => {
                for (name, value) in fields.into_pairs() {
                    self.fields.insert(name.to_string(), Value::String(value));
                }
            }
            FieldGroup::Dynamic(entries) => {
                for (label, value) in entries {
                    let key = Self::field_key(label);
                    self.fields.insert(key, Value::String(value));
                }
            }
        }
    }

    /// Details labels that clash with a record key are stored under a suffixed name
    fn field_key(label: String) -> String {
        if Self::RESERVED_KEYS.contains(&label.as_str()) {
            let renamed = format!("{label} (details)");
            warn!(
                label = %label,
                stored_as = %renamed,
                "Details label clashes with a record key"
            );
            renamed
        } else {
            label
        }
    }

    pub fn with(mut self, group: FieldGroup) -> Self {
        self.merge(group);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}
