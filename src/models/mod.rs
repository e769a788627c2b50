use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image received from the client, held only for the duration of one request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, declared_type: Option<&str>, file_name: Option<String>) -> Self {
        let mime_type = detect_mime_type(declared_type, file_name.as_deref(), &bytes);
        Self {
            bytes,
            mime_type,
            file_name,
        }
    }
}

/// Declared part type first, then the file extension, then magic bytes.
fn detect_mime_type(declared: Option<&str>, file_name: Option<&str>, bytes: &[u8]) -> String {
    if let Some(declared) = declared {
        let declared = declared.trim();
        if !declared.is_empty() && declared != "application/octet-stream" {
            return declared.to_string();
        }
    }

    if let Some(name) = file_name {
        let lower = name.to_lowercase();
        let by_extension = match lower.rsplit_once('.').map(|(_, ext)| ext) {
            Some("png") => Some("image/png"),
            Some("jpg") | Some("jpeg") => Some("image/jpeg"),
            Some("gif") => Some("image/gif"),
            Some("webp") => Some("image/webp"),
            Some("heic") => Some("image/heic"),
            Some("bmp") => Some("image/bmp"),
            _ => None,
        };
        if let Some(mime) = by_extension {
            return mime.to_string();
        }
    }

    let sniffed = if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    };
    sniffed.to_string()
}

/// Structured recyclability assessment produced from the model reply.
///
/// Serializes to the same snake_case shape the model is asked to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub detected_object: String,
    pub recyclability_score: u8,
    #[serde(rename = "recyclable")]
    pub is_recyclable: bool,
    pub material: String,
    pub recycling_statistics: RecyclingStatistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biotech_insights: Option<BiotechInsights>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecyclingStatistics {
    pub global_recycling_rate: String,
    pub common_issues: Vec<String>,
    pub processing_notes: String,
}

/// Only requested by the biotech prompt variant; every member may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiotechInsights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biodegradable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_recycling_applicable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biotech_notes: Option<String>,
}

impl AnalysisResult {
    pub fn recyclability_tier(&self) -> RecyclabilityTier {
        RecyclabilityTier::from_score(self.recyclability_score)
    }

    pub fn co2_tier(&self) -> Co2Tier {
        Co2Tier::from_score(self.recyclability_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecyclabilityTier {
    #[serde(rename = "Highly Recyclable")]
    HighlyRecyclable,
    #[serde(rename = "Recyclable")]
    Recyclable,
    #[serde(rename = "Limited Recyclability")]
    LimitedRecyclability,
    #[serde(rename = "Special Handling")]
    SpecialHandling,
    #[serde(rename = "Not Recyclable")]
    NotRecyclable,
}

impl RecyclabilityTier {
    /// Thresholds are inclusive on the lower edge: 80 is "Highly Recyclable".
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => RecyclabilityTier::HighlyRecyclable,
            60..=79 => RecyclabilityTier::Recyclable,
            40..=59 => RecyclabilityTier::LimitedRecyclability,
            20..=39 => RecyclabilityTier::SpecialHandling,
            _ => RecyclabilityTier::NotRecyclable,
        }
    }
}

impl std::fmt::Display for RecyclabilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecyclabilityTier::HighlyRecyclable => "Highly Recyclable",
            RecyclabilityTier::Recyclable => "Recyclable",
            RecyclabilityTier::LimitedRecyclability => "Limited Recyclability",
            RecyclabilityTier::SpecialHandling => "Special Handling",
            RecyclabilityTier::NotRecyclable => "Not Recyclable",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Co2Tier {
    Low,
    Medium,
    High,
}

impl Co2Tier {
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => Co2Tier::Low,
            40..=69 => Co2Tier::Medium,
            _ => Co2Tier::High,
        }
    }
}

impl std::fmt::Display for Co2Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Co2Tier::Low => "Low",
            Co2Tier::Medium => "Medium",
            Co2Tier::High => "High",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialBreakdown {
    pub name: String,
    pub percentage: u8,
    pub recyclability_tier: RecyclabilityTier,
    pub co2_tier: Co2Tier,
    pub description: String,
    pub global_recycling_rate: String,
    pub disposal_tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biodegradable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_recycling_applicable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biotech_notes: Option<String>,
}

/// UI-ready record derived from an [`AnalysisResult`]; the shape stored by the
/// persistence endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub material: String,
    pub is_recyclable: bool,
    pub recycling_info: String,
    pub materials: Vec<MaterialBreakdown>,
    pub disposal_recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ScanRecord {
    pub fn from_analysis(result: &AnalysisResult) -> Self {
        let stats = &result.recycling_statistics;
        let biotech = result.biotech_insights.clone().unwrap_or_default();

        let mut disposal_tips = stats.common_issues.clone();
        disposal_tips.push(result.recommendation.clone());

        let breakdown = MaterialBreakdown {
            name: result.material.clone(),
            percentage: result.recyclability_score,
            recyclability_tier: result.recyclability_tier(),
            co2_tier: result.co2_tier(),
            description: stats.processing_notes.clone(),
            global_recycling_rate: stats.global_recycling_rate.clone(),
            disposal_tips,
            biodegradable: biotech.biodegradable,
            bio_recycling_applicable: biotech.bio_recycling_applicable,
            biotech_notes: biotech.biotech_notes,
        };

        Self {
            material: result.detected_object.clone(),
            is_recyclable: result.is_recyclable,
            recycling_info: format!("{} - {}", result.material, stats.processing_notes),
            materials: vec![breakdown],
            disposal_recommendation: result.recommendation.clone(),
            created_at: None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recyclability_tier_boundaries() {
        let cases = [
            (0, RecyclabilityTier::NotRecyclable),
            (19, RecyclabilityTier::NotRecyclable),
            (20, RecyclabilityTier::SpecialHandling),
            (39, RecyclabilityTier::SpecialHandling),
            (40, RecyclabilityTier::LimitedRecyclability),
            (59, RecyclabilityTier::LimitedRecyclability),
            (60, RecyclabilityTier::Recyclable),
            (79, RecyclabilityTier::Recyclable),
            (80, RecyclabilityTier::HighlyRecyclable),
            (100, RecyclabilityTier::HighlyRecyclable),
        ];
        for (score, expected) in cases {
            assert_eq!(RecyclabilityTier::from_score(score), expected, "score {}", score);
        }
    }

    #[test]
    fn test_co2_tier_boundaries() {
        let cases = [
            (0, Co2Tier::High),
            (39, Co2Tier::High),
            (40, Co2Tier::Medium),
            (69, Co2Tier::Medium),
            (70, Co2Tier::Low),
            (100, Co2Tier::Low),
        ];
        for (score, expected) in cases {
            assert_eq!(Co2Tier::from_score(score), expected, "score {}", score);
        }
    }

    #[test]
    fn test_tiers_serialize_as_labels() {
        assert_eq!(
            serde_json::to_value(RecyclabilityTier::LimitedRecyclability).unwrap(),
            serde_json::json!("Limited Recyclability")
        );
        assert_eq!(serde_json::to_value(Co2Tier::Medium).unwrap(), serde_json::json!("Medium"));
        assert_eq!(RecyclabilityTier::SpecialHandling.to_string(), "Special Handling");
        assert_eq!(Co2Tier::Medium.to_string(), "Medium");
    }

    #[test]
    fn test_scan_record_from_analysis() {
        let record = ScanRecord::from_analysis(&fixtures::plastic_bottle());

        assert_eq!(record.material, "plastic bottle");
        assert!(record.is_recyclable);
        assert_eq!(record.recycling_info, "PET plastic - rinse before disposal");
        assert_eq!(record.disposal_recommendation, "rinse and place in recycling bin");

        let breakdown = &record.materials[0];
        assert_eq!(breakdown.name, "PET plastic");
        assert_eq!(breakdown.percentage, 85);
        assert_eq!(breakdown.recyclability_tier, RecyclabilityTier::HighlyRecyclable);
        assert_eq!(breakdown.co2_tier, Co2Tier::Low);
        assert_eq!(breakdown.global_recycling_rate, "29%");
        assert_eq!(
            breakdown.disposal_tips,
            vec!["contamination", "rinse and place in recycling bin"]
        );
        assert!(breakdown.biodegradable.is_none());
    }

    #[test]
    fn test_scan_record_omits_absent_biotech_fields() {
        let record = ScanRecord::from_analysis(&fixtures::plastic_bottle());
        let value = serde_json::to_value(&record).unwrap();
        let breakdown = &value["materials"][0];

        assert_eq!(breakdown["recyclabilityTier"], "Highly Recyclable");
        assert!(breakdown.get("biodegradable").is_none());
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn test_mime_type_detection() {
        let png = ImageUpload::new(vec![0x89, b'P', b'N', b'G', 0, 0], None, None);
        assert_eq!(png.mime_type, "image/png");

        let by_name = ImageUpload::new(vec![1, 2, 3], None, Some("photo.JPG".to_string()));
        assert_eq!(by_name.mime_type, "image/jpeg");

        let declared = ImageUpload::new(vec![1, 2, 3], Some("image/webp"), Some("a.png".into()));
        assert_eq!(declared.mime_type, "image/webp");

        let unknown = ImageUpload::new(vec![1, 2, 3], Some("application/octet-stream"), None);
        assert_eq!(unknown.mime_type, "application/octet-stream");
    }
}
