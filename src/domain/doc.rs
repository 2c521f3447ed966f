// Document adapter - raw database documents to chart readings, recipe runs and markers
use super::point::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const RECIPE_START: &str = "recipe_start";
pub const RECIPE_END: &str = "recipe_end";
pub const MARKER: &str = "marker";

/// Document timestamps are Unix seconds; the chart works in milliseconds.
const MS_PER_SECOND: f64 = 1000.0;

/// A telemetry value as stored by the device: numeric readings, or text for
/// sentinel documents (recipe ids, marker labels) and stringly-typed sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocValue {
    Number(f64),
    Text(String),
}

impl DocValue {
    /// Numeric reading, parsing text values such as `"20.5"`.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// An environmental data point document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    pub timestamp: f64,
    pub value: DocValue,
    pub variable: String,
    #[serde(default)]
    pub is_desired: bool,
}

impl Doc {
    /// Decode a raw document, or `None` when it is not a data point.
    pub fn from_json(raw: &Value) -> Option<Self> {
        let doc = Self::deserialize(raw).ok()?;
        doc.timestamp.is_finite().then_some(doc)
    }

    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp * MS_PER_SECOND
    }
}

/// A user annotation on the time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub timestamp: f64,
    pub label: String,
}

impl Marker {
    pub fn new(timestamp: f64, label: impl Into<String>) -> Self {
        Self {
            timestamp,
            label: label.into(),
        }
    }
}

/// Decode every data point document in a batch; anything else is skipped.
pub fn parse_batch(raw: &[Value]) -> Vec<Doc> {
    raw.iter().filter_map(Doc::from_json).collect()
}

/// Chart reading for a document, in milliseconds. Sentinel documents and
/// non-numeric values yield nothing.
pub fn read_point(doc: &Doc) -> Option<Point> {
    if is_recipe_start(doc) || is_recipe_end(doc) || is_marker(doc) {
        return None;
    }
    doc.value
        .as_f64()
        .map(|value| Point::new(doc.timestamp_ms(), value))
}

pub fn is_recipe_start(doc: &Doc) -> bool {
    doc.variable == RECIPE_START
}

pub fn is_recipe_end(doc: &Doc) -> bool {
    doc.variable == RECIPE_END
}

pub fn is_marker(doc: &Doc) -> bool {
    doc.variable == MARKER
}

fn most_recent<P>(docs: &[Doc], predicate: P) -> Option<f64>
where
    P: Fn(&Doc) -> bool,
{
    docs.iter()
        .filter(|doc| predicate(doc))
        .map(Doc::timestamp_ms)
        .max_by(f64::total_cmp)
}

/// Timestamp (ms) of the latest recipe start in the batch.
pub fn most_recent_recipe_start(docs: &[Doc]) -> Option<f64> {
    most_recent(docs, is_recipe_start)
}

/// Timestamp (ms) of the latest recipe end in the batch.
pub fn most_recent_recipe_end(docs: &[Doc]) -> Option<f64> {
    most_recent(docs, is_recipe_end)
}

/// A recipe is running when its latest start has no end at or after it.
pub fn is_recipe_running(docs: &[Doc]) -> bool {
    match (most_recent_recipe_start(docs), most_recent_recipe_end(docs)) {
        (Some(start), Some(end)) => start > end,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Whether `candidate` should replace `current`. Absent candidates never win;
/// anything wins over an absent current value.
pub fn is_later(candidate: Option<f64>, current: Option<f64>) -> bool {
    match (candidate, current) {
        (Some(candidate), Some(current)) => candidate > current,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

pub fn read_marker(doc: &Doc) -> Option<Marker> {
    is_marker(doc).then(|| Marker::new(doc.timestamp_ms(), doc.value.as_text()))
}

/// Database document for a marker, keyed by its timestamp.
pub fn marker_doc(marker: &Marker) -> Value {
    let seconds = marker.timestamp / MS_PER_SECOND;
    json!({
        "_id": format!("{}_{}", MARKER, marker.timestamp as i64),
        "timestamp": seconds,
        "value": marker.label,
        "variable": MARKER,
        "is_desired": false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(variable: &str, timestamp: f64, value: DocValue) -> Doc {
        Doc {
            timestamp,
            value,
            variable: variable.to_string(),
            is_desired: false,
        }
    }

    #[test]
    fn test_from_json_tolerates_shapes() {
        let raw = json!({"timestamp": 1000, "value": "20", "variable": "air_temperature", "is_desired": false});
        let parsed = Doc::from_json(&raw).unwrap();
        assert_eq!(parsed.value, DocValue::Text("20".to_string()));
        assert_eq!(parsed.timestamp_ms(), 1_000_000.0);

        let no_flag = json!({"timestamp": 5.5, "value": 3.2, "variable": "water_ph"});
        assert!(!Doc::from_json(&no_flag).unwrap().is_desired);

        assert!(Doc::from_json(&json!({"value": 1, "variable": "x"})).is_none());
        assert!(Doc::from_json(&json!({"_id": "recipe_1", "operations": []})).is_none());
        assert_eq!(parse_batch(&[raw, json!(null), json!([1, 2])]).len(), 1);
    }

    #[test]
    fn test_read_point_converts_to_ms() {
        let reading = doc("air_temperature", 1000.0, DocValue::Text("20".to_string()));
        assert_eq!(read_point(&reading), Some(Point::new(1_000_000.0, 20.0)));

        let text = doc("air_temperature", 1000.0, DocValue::Text("on".to_string()));
        assert_eq!(read_point(&text), None);

        let start = doc(RECIPE_START, 1000.0, DocValue::Number(3.0));
        assert_eq!(read_point(&start), None);
    }

    #[test]
    fn test_recipe_running() {
        let mut docs = vec![doc(RECIPE_START, 10.0, DocValue::Text("basil".to_string()))];
        assert!(is_recipe_running(&docs));

        docs.push(doc(RECIPE_END, 20.0, DocValue::Text("basil".to_string())));
        assert!(!is_recipe_running(&docs));

        assert!(!is_recipe_running(&[]));
        assert_eq!(most_recent_recipe_start(&docs), Some(10_000.0));
        assert_eq!(most_recent_recipe_end(&docs), Some(20_000.0));
    }

    #[test]
    fn test_is_later() {
        assert!(!is_later(Some(50.0), Some(100.0)));
        assert!(is_later(Some(150.0), Some(100.0)));
        assert!(is_later(Some(1.0), None));
        assert!(!is_later(None, Some(1.0)));
        assert!(!is_later(Some(100.0), Some(100.0)));
    }

    #[test]
    fn test_marker_roundtrip_through_doc() {
        let marker = Marker::new(1_500_000.0, "");
        let raw = marker_doc(&marker);
        assert_eq!(raw["_id"], "marker_1500000");
        let doc = Doc::from_json(&raw).unwrap();
        assert_eq!(read_marker(&doc), Some(marker));
        assert_eq!(read_point(&doc), None);
    }
}
