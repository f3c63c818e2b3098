//! Read-only reference data: wards, hotspots, sensitive areas and alerts.

use serde::{Deserialize, Serialize};

/// Kind of place whose proximity raises a report's priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensitiveAreaType {
    Hospital,
    School,
    Metro,
}

impl SensitiveAreaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensitiveAreaType::Hospital => "hospital",
            SensitiveAreaType::School => "school",
            SensitiveAreaType::Metro => "metro",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hospital" => Some(SensitiveAreaType::Hospital),
            "school" => Some(SensitiveAreaType::School),
            "metro" => Some(SensitiveAreaType::Metro),
            _ => None,
        }
    }
}

/// A hospital, school or metro station.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensitiveArea {
    pub id: String,
    #[serde(rename = "type")]
    pub area_type: SensitiveAreaType,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub ward: String,
    pub ward_no: i64,
}

/// Pumps, personnel and vehicles available to a ward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WardResources {
    pub pumps: i64,
    pub personnel: i64,
    pub vehicles: i64,
}

/// An administrative subdivision of the city.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ward {
    pub ward_no: i64,
    pub name: String,
    pub readiness: i64,
    pub resources: WardResources,
    pub hotspots: i64,
    pub last_maintenance: String,
    pub coords: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "HIGH" => Some(RiskLevel::High),
            "MEDIUM" => Some(RiskLevel::Medium),
            "LOW" => Some(RiskLevel::Low),
            _ => None,
        }
    }
}

/// A historically flood-prone location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub id: String,
    pub name: String,
    pub coords: [f64; 2],
    pub risk: RiskLevel,
    pub last_flooded: String,
    pub depth: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ward_no: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "Critical",
            AlertSeverity::High => "High",
            AlertSeverity::Medium => "Medium",
            AlertSeverity::Low => "Low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Critical" => Some(AlertSeverity::Critical),
            "High" => Some(AlertSeverity::High),
            "Medium" => Some(AlertSeverity::Medium),
            "Low" => Some(AlertSeverity::Low),
            _ => None,
        }
    }
}

/// A waterlogging alert shown on the dashboards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub severity: AlertSeverity,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward_no: Option<i64>,
    pub message: String,
    pub timestamp: String,
    pub is_read: bool,
}

/// Optional ward filter for reference listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardFilter {
    #[serde(default)]
    pub ward_no: Option<i64>,
}
