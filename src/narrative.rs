//! Human-readable summary of an estimate.
//!
//! The model only phrases numbers that were already computed; it never
//! recomputes them. Any failure (network, empty answer, unparseable JSON)
//! degrades to a fixed template so report generation never blocks on it.
use crate::errors::AppError;
use crate::llm::{GeminiClient, GenerationRequest};
use crate::models::RoofQuality;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling temperature for summaries.
pub const SUMMARY_TEMPERATURE: f32 = 0.4;

/// Already-computed numbers handed to the summarizer.
#[derive(Debug, Clone, Serialize)]
pub struct SolarFacts {
    pub address: String,
    pub monthly_bill: f64,
    pub energy_tariff: f64,
    pub system_size_kw: f64,
    pub annual_savings: f64,
    pub estimated_cost: f64,
    pub payback_years: Option<f64>,
    pub co2_offset_tons: f64,
    pub roof_quality: RoofQuality,
    pub has_roof_data: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeOutput {
    pub summary: String,
    pub roof_quality: RoofQuality,
}

/// Anything that can turn facts into a summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, facts: &SolarFacts) -> Result<NarrativeOutput, AppError>;
}

/// Summaries from the text-generation provider.
pub struct GeminiSummarizer {
    client: GeminiClient,
}

impl GeminiSummarizer {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, facts: &SolarFacts) -> Result<NarrativeOutput, AppError> {
        let request =
            GenerationRequest::new(build_prompt(facts)).with_temperature(SUMMARY_TEMPERATURE);
        let text = self.client.generate_text(&request).await?;
        parse_narrative(&text, facts.roof_quality)
    }
}

/// Pure templating, no I/O.
pub struct TemplateSummarizer;

#[async_trait]
impl Summarizer for TemplateSummarizer {
    async fn summarize(&self, facts: &SolarFacts) -> Result<NarrativeOutput, AppError> {
        Ok(fallback_output(facts))
    }
}

/// Runs `summarizer`, substituting the template on any error.
///
/// The model's roof label is only taken when no roof data backed the estimate.
pub async fn generate_summary(summarizer: &dyn Summarizer, facts: &SolarFacts) -> NarrativeOutput {
    match summarizer.summarize(facts).await {
        Ok(mut output) => {
            // Roof-derived labels outrank the model's
            if facts.has_roof_data {
                output.roof_quality = facts.roof_quality;
            }
            output
        }
        Err(e) => {
            tracing::warn!("Narrative generation failed, using template: {}", e);
            fallback_output(facts)
        }
    }
}

pub fn fallback_summary(facts: &SolarFacts) -> String {
    format!(
        "Com um sistema de {:.1} kWp, você economiza R$ {:.2} por ano.",
        facts.system_size_kw, facts.annual_savings
    )
}

fn fallback_output(facts: &SolarFacts) -> NarrativeOutput {
    NarrativeOutput {
        summary: fallback_summary(facts),
        roof_quality: facts.roof_quality,
    }
}

pub fn build_prompt(facts: &SolarFacts) -> String {
    let payback = facts
        .payback_years
        .map(|years| format!("{:.1} anos", years))
        .unwrap_or_else(|| "não se aplica".to_string());
    let roof_source = if facts.has_roof_data {
        "análise do telhado por imagem de satélite"
    } else {
        "estimativa baseada apenas na conta de luz"
    };

    format!(
        "Você é um consultor de energia solar no Brasil. Escreva um parágrafo curto, \
em português, resumindo a estimativa abaixo para o proprietário do imóvel. \
Não recalcule nenhum número, use exatamente os valores fornecidos.\n\n\
Endereço: {}\n\
Conta de luz mensal: R$ {:.2}\n\
Tarifa local: R$ {:.2}/kWh\n\
Sistema recomendado: {:.2} kWp\n\
Economia anual: R$ {:.2}\n\
Custo estimado: R$ {:.2}\n\
Retorno do investimento: {}\n\
CO2 evitado: {:.2} toneladas/ano\n\
Qualidade do telhado: {} ({})\n\n\
Responda somente com JSON no formato \
{{\"summary\": \"...\", \"roofQuality\": \"Excellent|Good|Fair|Poor\"}}.",
        facts.address,
        facts.monthly_bill,
        facts.energy_tariff,
        facts.system_size_kw,
        facts.annual_savings,
        facts.estimated_cost,
        payback,
        facts.co2_offset_tons,
        facts.roof_quality.as_str(),
        roof_source,
    )
}

/// Cuts a JSON object out of a model answer.
///
/// Prefers the contents of a fenced code block when present, then trims to
/// the span between the first `{` and the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut body = text;

    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        let after_fence = after_fence
            .strip_prefix("json")
            .or_else(|| after_fence.strip_prefix("JSON"))
            .unwrap_or(after_fence);
        body = match after_fence.find("```") {
            Some(end) => &after_fence[..end],
            None => after_fence,
        };
    }

    let first = body.find('{')?;
    let last = body.rfind('}')?;
    if last < first {
        return None;
    }
    Some(&body[first..=last])
}

#[derive(Debug, Deserialize)]
struct ModelNarrative {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, rename = "roofQuality", alias = "roof_quality")]
    roof_quality: Option<String>,
}

/// Parses a model answer. The model's roof label is kept only if it is one of
/// the known labels; otherwise `computed_quality` stands.
pub fn parse_narrative(
    text: &str,
    computed_quality: RoofQuality,
) -> Result<NarrativeOutput, AppError> {
    let json = extract_json_object(text).ok_or_else(|| {
        AppError::ExternalApiError("No JSON object in model response".to_string())
    })?;

    let parsed: ModelNarrative = serde_json::from_str(json).map_err(|e| {
        AppError::ExternalApiError(format!("Invalid JSON in model response: {}", e))
    })?;

    let summary = parsed
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ExternalApiError("Model returned empty summary".to_string()))?;

    let roof_quality = parsed
        .roof_quality
        .as_deref()
        .and_then(RoofQuality::parse)
        .unwrap_or(computed_quality);

    Ok(NarrativeOutput {
        summary,
        roof_quality,
    })
}
