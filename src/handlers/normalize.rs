use serde_json::{Map, Value};

use crate::error::ScanError;
use crate::models::{AnalysisResult, BiotechInsights, RecyclingStatistics};

/// Map an extracted JSON object onto [`AnalysisResult`].
///
/// Required members must be present with the right primitive type. The biotech
/// block is passed through only when the model returned it; nothing is defaulted.
/// A zero score and `recyclable: false` are not cross-checked.
pub fn normalize(value: &Value) -> Result<AnalysisResult, ScanError> {
    let root = value
        .as_object()
        .ok_or_else(|| ScanError::Normalization("<root object>".to_string()))?;

    let stats_value = root
        .get("recycling_statistics")
        .ok_or_else(|| missing("recycling_statistics"))?;
    let stats = stats_value
        .as_object()
        .ok_or_else(|| missing("recycling_statistics"))?;

    let recycling_statistics = RecyclingStatistics {
        global_recycling_rate: string_field(stats, "global_recycling_rate", "recycling_statistics.")?,
        common_issues: string_list(stats, "common_issues", "recycling_statistics.")?,
        processing_notes: string_field(stats, "processing_notes", "recycling_statistics.")?,
    };

    let biotech_insights = match root.get("biotech_insights") {
        None | Some(Value::Null) => None,
        Some(Value::Object(biotech)) => Some(BiotechInsights {
            biodegradable: optional_bool(biotech, "biodegradable")?,
            bio_recycling_applicable: optional_bool(biotech, "bio_recycling_applicable")?,
            biotech_notes: optional_string(biotech, "biotech_notes")?,
        }),
        Some(_) => return Err(missing("biotech_insights")),
    };

    Ok(AnalysisResult {
        detected_object: string_field(root, "detected_object", "")?,
        recyclability_score: score_field(root)?,
        is_recyclable: root
            .get("recyclable")
            .and_then(Value::as_bool)
            .ok_or_else(|| missing("recyclable"))?,
        material: string_field(root, "material", "")?,
        recycling_statistics,
        biotech_insights,
        recommendation: string_field(root, "recommendation", "")?,
    })
}

fn missing(field: &str) -> ScanError {
    ScanError::Normalization(field.to_string())
}

fn string_field(map: &Map<String, Value>, key: &str, prefix: &str) -> Result<String, ScanError> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(&format!("{}{}", prefix, key)))
}

fn string_list(map: &Map<String, Value>, key: &str, prefix: &str) -> Result<Vec<String>, ScanError> {
    let items = map
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| missing(&format!("{}{}", prefix, key)))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| missing(&format!("{}{}[]", prefix, key)))
        })
        .collect()
}

/// Integral number in 0..=100; `85.0` is accepted, `85.5` is not.
fn score_field(map: &Map<String, Value>) -> Result<u8, ScanError> {
    let number = match map.get("recyclability_score") {
        Some(Value::Number(n)) => n,
        _ => return Err(missing("recyclability_score")),
    };

    let score = if let Some(n) = number.as_u64() {
        Some(n)
    } else {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .map(|f| f as u64)
    };

    match score {
        Some(s) if s <= 100 => Ok(s as u8),
        _ => Err(missing("recyclability_score")),
    }
}

fn optional_bool(map: &Map<String, Value>, key: &str) -> Result<Option<bool>, ScanError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(missing(&format!("biotech_insights.{}", key))),
    }
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Result<Option<String>, ScanError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(missing(&format!("biotech_insights.{}", key))),
    }
}
