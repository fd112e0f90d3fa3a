//! Report pipeline: address + bill → `SolarReport`.
//!
//! Steps run strictly in order:
//! 1. Resolve address to coordinates (never fails, may be synthetic)
//! 2. Fetch roof potential for those coordinates (absence tolerated)
//! 3. Look up the tariff from the address text
//! 4. Run the deterministic estimator
//! 5. Generate the narrative (never fails, may be the template)
//!
//! Only invalid input can make it fail.
use crate::errors::AppError;
use crate::estimator::{self, ensure_twelve_months};
use crate::geocoding::GeocodingClient;
use crate::models::SolarReport;
use crate::narrative::{generate_summary, GeminiSummarizer, SolarFacts, Summarizer};
use crate::services::ProviderServices;
use crate::solar::SolarPotentialClient;
use crate::tariff::lookup_tariff;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReportPipeline {
    geocoding: GeocodingClient,
    solar: SolarPotentialClient,
    summarizer: Arc<dyn Summarizer>,
}

impl ReportPipeline {
    pub fn new(
        geocoding: GeocodingClient,
        solar: SolarPotentialClient,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            geocoding,
            solar,
            summarizer,
        }
    }

    /// Pipeline over the configured providers with model-written summaries.
    pub fn from_services(services: &ProviderServices) -> Self {
        Self::new(
            services.geocoding.clone(),
            services.solar.clone(),
            Arc::new(GeminiSummarizer::new(services.gemini.clone())),
        )
    }

    pub async fn build_report(
        &self,
        address: &str,
        monthly_bill: f64,
    ) -> Result<SolarReport, AppError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::BadRequest("Informe um endereço".to_string()));
        }
        if !monthly_bill.is_finite() || monthly_bill <= 0.0 {
            return Err(AppError::BadRequest(
                "O valor da conta de luz deve ser maior que zero".to_string(),
            ));
        }

        tracing::info!("Building report for '{}' (bill R$ {:.2})", address, monthly_bill);

        // Step 1: Resolve address
        let location = self.geocoding.resolve_address(address).await;
        if location.is_synthetic() {
            tracing::warn!("⚠️  Using synthetic coordinates for '{}'", address);
        }

        // Step 2: Roof potential
        let solar_potential = self
            .solar
            .fetch_solar_potential(location.coordinates())
            .await;

        // Step 3: Tariff
        let energy_tariff = lookup_tariff(address);

        // Step 4: Estimate
        let estimate = estimator::estimate(energy_tariff, monthly_bill, solar_potential.as_ref())?;

        // Step 5: Narrative, overriding only summary and roof quality
        let facts = SolarFacts {
            address: location.formatted_address().to_string(),
            monthly_bill,
            energy_tariff,
            system_size_kw: estimate.system_size_kw,
            annual_savings: estimate.annual_savings,
            estimated_cost: estimate.estimated_cost,
            payback_years: estimate.payback_years,
            co2_offset_tons: estimate.co2_offset_tons,
            roof_quality: estimate.roof_quality,
            has_roof_data: solar_potential.is_some(),
        };
        let narrative = generate_summary(self.summarizer.as_ref(), &facts).await;

        let report = SolarReport {
            id: Uuid::new_v4(),
            address: address.to_string(),
            location,
            monthly_bill,
            system_size_kw: estimate.system_size_kw,
            annual_savings: estimate.annual_savings,
            monthly_savings: ensure_twelve_months(estimate.monthly_savings, estimate.annual_savings),
            estimated_cost: estimate.estimated_cost,
            payback_years: estimate.payback_years,
            co2_offset_tons: estimate.co2_offset_tons,
            roof_quality: narrative.roof_quality,
            energy_tariff,
            summary: narrative.summary,
            solar_potential,
            created_at: Utc::now(),
        };

        tracing::info!(
            "✓ Report {} built: {:.2} kWp, R$ {:.2}/year, roof {}",
            report.id,
            report.system_size_kw,
            report.annual_savings,
            report.roof_quality.as_str()
        );

        Ok(report)
    }
}
