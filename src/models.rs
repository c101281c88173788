use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// One sample row: column label → cell text, in column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Insertion-ordered string-keyed map, serialized as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<T>(Vec<(String, T)>);

impl<T> OrderedMap<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Appends without checking for an existing key; callers feed unique labels.
    pub fn push(&mut self, key: impl Into<String>, value: T) {
        self.0.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(String, T)> for OrderedMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Serialize> Serialize for OrderedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Dominant value pattern of a column, as shares of its non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PatternSignal {
    pub numeric_ratio: f64,
    pub date_ratio: f64,
    pub boolean_ratio: f64,
    pub unique_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CleanupReport {
    pub dropped_rows: usize,
    pub dropped_columns: usize,
    /// Coverage per normalized column, measured before any pruning.
    pub column_coverage: OrderedMap<f64>,
    /// Signals measured on the final cleaned sheet.
    pub pattern_signals: OrderedMap<PatternSignal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetPreview {
    pub sheet: String,
    pub columns: Vec<String>,
    pub sample_row_count: usize,
    pub preview_rows: Vec<Record>,
    /// Cleaned rows before truncation.
    pub total_rows: usize,
    pub truncated: bool,
    #[serde(flatten)]
    pub cleanup: CleanupReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetCursor {
    pub current: String,
    pub available: Vec<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub filename: String,
    pub sheets: Vec<SheetPreview>,
    pub total_sheets: usize,
    pub total_rows_estimate: Option<usize>,
    pub navigation: Option<SheetCursor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SheetMetadata {
    pub total_rows: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeResponse {
    pub filename: String,
    pub sheets: OrderedMap<Vec<Record>>,
    pub metadata: OrderedMap<SheetMetadata>,
    pub navigation: Option<SheetCursor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSummary {
    pub column: String,
    pub lower_cap: f64,
    pub upper_cap: f64,
    pub capped_values: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SheetMlPreview {
    pub sheet: String,
    pub missingness: OrderedMap<f64>,
    pub outliers: Vec<OutlierSummary>,
    pub feature_names: Vec<String>,
    pub feature_preview: Vec<Vec<f64>>,
    pub pipeline_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MlPipelineResponse {
    pub filename: String,
    pub sheets: Vec<SheetMlPreview>,
}
