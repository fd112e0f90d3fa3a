use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::solar::BuildingInsights;

// ============ Location ============

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of address resolution.
///
/// `Resolved` comes from the geocoding provider; `Synthetic` is a deterministic
/// stand-in produced when every provider tier failed. The synthetic address
/// still carries a display marker, but callers branch on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddressResolution {
    Resolved {
        coordinates: Coordinates,
        formatted_address: String,
    },
    Synthetic {
        coordinates: Coordinates,
        formatted_address: String,
    },
}

impl AddressResolution {
    pub fn coordinates(&self) -> Coordinates {
        match self {
            AddressResolution::Resolved { coordinates, .. }
            | AddressResolution::Synthetic { coordinates, .. } => *coordinates,
        }
    }

    pub fn formatted_address(&self) -> &str {
        match self {
            AddressResolution::Resolved {
                formatted_address, ..
            }
            | AddressResolution::Synthetic {
                formatted_address, ..
            } => formatted_address,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, AddressResolution::Synthetic { .. })
    }
}

// ============ Report ============

/// Qualitative roof label shown on the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoofQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl RoofQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoofQuality::Excellent => "Excellent",
            RoofQuality::Good => "Good",
            RoofQuality::Fair => "Fair",
            RoofQuality::Poor => "Poor",
        }
    }

    /// Parses a label, accepting the Portuguese names the model sometimes answers with.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "excellent" | "excelente" => Some(RoofQuality::Excellent),
            "good" | "bom" | "boa" => Some(RoofQuality::Good),
            "fair" | "regular" | "razoável" | "razoavel" => Some(RoofQuality::Fair),
            "poor" | "ruim" | "fraco" => Some(RoofQuality::Poor),
            _ => None,
        }
    }
}

/// The estimate handed to a homeowner. Immutable once built; a new bill
/// value produces a new report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarReport {
    pub id: Uuid,
    pub address: String,
    pub location: AddressResolution,
    pub monthly_bill: f64,
    pub system_size_kw: f64,
    pub annual_savings: f64,
    /// January first, always 12 entries.
    pub monthly_savings: Vec<f64>,
    pub estimated_cost: f64,
    /// `None` when the system yields no savings.
    pub payback_years: Option<f64>,
    pub co2_offset_tons: f64,
    pub roof_quality: RoofQuality,
    pub energy_tariff: f64,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solar_potential: Option<BuildingInsights>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/reports`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub address: String,
    pub monthly_bill: f64,
}

// ============ Leads ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Available,
    Sold,
}

/// CRM stage of a sold lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    New,
    Contacted,
    SiteVisit,
    ProposalSent,
    Closed,
}

impl PipelineStage {
    /// The stage after this one, `None` once closed.
    pub fn next(self) -> Option<Self> {
        match self {
            PipelineStage::New => Some(PipelineStage::Contacted),
            PipelineStage::Contacted => Some(PipelineStage::SiteVisit),
            PipelineStage::SiteVisit => Some(PipelineStage::ProposalSent),
            PipelineStage::ProposalSent => Some(PipelineStage::Closed),
            PipelineStage::Closed => None,
        }
    }
}

/// A homeowner contact captured after viewing a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub report_id: Uuid,
    pub name: String,
    pub email: String,
    /// E.164 (+55...)
    pub phone: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub system_size_kw: f64,
    pub created_at: DateTime<Utc>,
    pub status: LeadStatus,
    pub price: f64,
    pub buyer_id: Option<String>,
    pub pipeline_stage: Option<PipelineStage>,
}

/// Body of `POST /api/v1/leads`.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureLeadRequest {
    pub report_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Body of the buy and stage endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallerActionRequest {
    pub installer_id: String,
}

/// Installer account with its credit balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerAccount {
    pub id: String,
    pub credits: f64,
    pub purchased_leads: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stage_progression() {
        let mut stage = PipelineStage::New;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(stage, PipelineStage::Closed);
    }

    #[test]
    fn test_roof_quality_parse() {
        assert_eq!(RoofQuality::parse("Excellent"), Some(RoofQuality::Excellent));
        assert_eq!(RoofQuality::parse(" excelente "), Some(RoofQuality::Excellent));
        assert_eq!(RoofQuality::parse("Regular"), Some(RoofQuality::Fair));
        assert_eq!(RoofQuality::parse("amazing"), None);
    }

    #[test]
    fn test_address_resolution_tagged_serialization() {
        let resolution = AddressResolution::Synthetic {
            coordinates: Coordinates {
                latitude: -23.5,
                longitude: -46.6,
            },
            formatted_address: "Rua A (Simulado)".to_string(),
        };
        let value = serde_json::to_value(&resolution).unwrap();
        assert_eq!(value["kind"], "synthetic");
        assert!(resolution.is_synthetic());
    }
}
