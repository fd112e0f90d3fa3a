//! Session-scoped application state: reports, leads and installer accounts.
//!
//! State lives only as long as the process. All mutations go through
//! [`AppStore::dispatch`] so a persistent store can replace this one without
//! touching the handlers or the pipeline.

use crate::errors::AppError;
use crate::leads::validate_contact;
use crate::models::{
    CaptureLeadRequest, InstallerAccount, Lead, LeadStatus, PipelineStage, SolarReport,
};
use chrono::Utc;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Reports expire after an hour; a homeowner captures a lead right after viewing one.
const REPORT_TTL: Duration = Duration::from_secs(3600);
const REPORT_CAPACITY: u64 = 10_000;

/// Store actions.
#[derive(Debug, Clone)]
pub enum Action {
    SubmitReport(SolarReport),
    CaptureLead(CaptureLeadRequest),
    BuyLead { lead_id: Uuid, installer_id: String },
    AdvancePipelineStage { lead_id: Uuid, installer_id: String },
}

/// Result of a dispatched action.
#[derive(Debug, Clone)]
pub enum Outcome {
    ReportStored(SolarReport),
    LeadCaptured(Lead),
    LeadSold {
        lead: Lead,
        installer: InstallerAccount,
    },
    StageAdvanced(Lead),
}

#[derive(Debug, Default)]
struct Marketplace {
    /// Capture order, never shrinks.
    leads: Vec<Lead>,
    installers: HashMap<String, InstallerAccount>,
}

impl Marketplace {
    fn lead_mut(&mut self, lead_id: Uuid) -> Result<&mut Lead, AppError> {
        self.leads
            .iter_mut()
            .find(|lead| lead.id == lead_id)
            .ok_or_else(|| AppError::NotFound(format!("Lead {} não encontrado", lead_id)))
    }

    fn account_mut(&mut self, installer_id: &str, initial_credits: f64) -> &mut InstallerAccount {
        self.installers
            .entry(installer_id.to_string())
            .or_insert_with(|| {
                tracing::info!(
                    "New installer account {} with {:.2} credits",
                    installer_id,
                    initial_credits
                );
                InstallerAccount {
                    id: installer_id.to_string(),
                    credits: initial_credits,
                    purchased_leads: Vec::new(),
                }
            })
    }
}

pub struct AppStore {
    reports: Cache<Uuid, SolarReport>,
    market: Mutex<Marketplace>,
    lead_price: f64,
    initial_credits: f64,
}

fn validate_installer_id(installer_id: &str) -> Result<&str, AppError> {
    let trimmed = installer_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("installer_id é obrigatório".to_string()));
    }
    Ok(trimmed)
}

impl AppStore {
    pub fn new(lead_price: f64, initial_credits: f64) -> Self {
        Self {
            reports: Cache::builder()
                .time_to_live(REPORT_TTL)
                .max_capacity(REPORT_CAPACITY)
                .build(),
            market: Mutex::new(Marketplace::default()),
            lead_price,
            initial_credits,
        }
    }

    fn market(&self) -> Result<std::sync::MutexGuard<'_, Marketplace>, AppError> {
        self.market
            .lock()
            .map_err(|_| AppError::InternalError("Marketplace state poisoned".to_string()))
    }

    pub async fn dispatch(&self, action: Action) -> Result<Outcome, AppError> {
        match action {
            Action::SubmitReport(report) => {
                self.reports.insert(report.id, report.clone()).await;
                tracing::debug!("Stored report {}", report.id);
                Ok(Outcome::ReportStored(report))
            }
            Action::CaptureLead(request) => {
                let report = self.get_report(request.report_id).await?;
                self.capture_lead(&report, &request).map(Outcome::LeadCaptured)
            }
            Action::BuyLead {
                lead_id,
                installer_id,
            } => self.buy_lead(lead_id, validate_installer_id(&installer_id)?),
            Action::AdvancePipelineStage {
                lead_id,
                installer_id,
            } => self
                .advance_stage(lead_id, validate_installer_id(&installer_id)?)
                .map(Outcome::StageAdvanced),
        }
    }

    pub async fn get_report(&self, report_id: Uuid) -> Result<SolarReport, AppError> {
        self.reports
            .get(&report_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Relatório {} não encontrado", report_id)))
    }

    pub fn leads(&self) -> Result<Vec<Lead>, AppError> {
        Ok(self.market()?.leads.clone())
    }

    /// Account for `installer_id`. Unknown installers see the balance they
    /// would start with; the account itself is opened on first purchase.
    pub fn installer(&self, installer_id: &str) -> Result<InstallerAccount, AppError> {
        let installer_id = validate_installer_id(installer_id)?;
        let market = self.market()?;
        Ok(market
            .installers
            .get(installer_id)
            .cloned()
            .unwrap_or_else(|| InstallerAccount {
                id: installer_id.to_string(),
                credits: self.initial_credits,
                purchased_leads: Vec::new(),
            }))
    }

    /// Leads bought by `installer_id`, with full contact details.
    pub fn purchased_leads(&self, installer_id: &str) -> Result<Vec<Lead>, AppError> {
        let installer_id = validate_installer_id(installer_id)?;
        let market = self.market()?;
        Ok(market
            .leads
            .iter()
            .filter(|lead| lead.buyer_id.as_deref() == Some(installer_id))
            .cloned()
            .collect())
    }

    fn capture_lead(
        &self,
        report: &SolarReport,
        request: &CaptureLeadRequest,
    ) -> Result<Lead, AppError> {
        let contact = validate_contact(request)?;
        let mut market = self.market()?;

        // Resubmitting the form for the same report returns the existing lead
        if let Some(existing) = market
            .leads
            .iter()
            .find(|lead| lead.report_id == report.id && lead.email == contact.email)
        {
            tracing::warn!("⚠️  Duplicate lead capture for report {}", report.id);
            return Ok(existing.clone());
        }

        let lead = Lead {
            id: Uuid::new_v4(),
            report_id: report.id,
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            address: report.location.formatted_address().to_string(),
            coordinates: report.location.coordinates(),
            system_size_kw: report.system_size_kw,
            created_at: Utc::now(),
            status: LeadStatus::Available,
            price: self.lead_price,
            buyer_id: None,
            pipeline_stage: None,
        };
        market.leads.push(lead.clone());

        tracing::info!("✓ Lead {} captured from report {}", lead.id, report.id);
        Ok(lead)
    }

    fn buy_lead(&self, lead_id: Uuid, installer_id: &str) -> Result<Outcome, AppError> {
        let mut market = self.market()?;

        let lead = market.lead_mut(lead_id)?;
        if lead.status == LeadStatus::Sold {
            return Err(AppError::Conflict(format!("Lead {} já foi vendido", lead_id)));
        }
        let price = lead.price;

        let account = market.account_mut(installer_id, self.initial_credits);
        if account.credits < price {
            return Err(AppError::InsufficientCredits {
                required: price,
                available: account.credits,
            });
        }
        account.credits -= price;
        account.purchased_leads.push(lead_id);
        let installer = account.clone();

        let lead = market.lead_mut(lead_id)?;
        lead.status = LeadStatus::Sold;
        lead.buyer_id = Some(installer_id.to_string());
        lead.pipeline_stage = Some(PipelineStage::New);

        tracing::info!(
            "✓ Lead {} sold to {} for {:.2} ({:.2} credits left)",
            lead_id,
            installer_id,
            price,
            installer.credits
        );

        Ok(Outcome::LeadSold {
            lead: lead.clone(),
            installer,
        })
    }

    fn advance_stage(&self, lead_id: Uuid, installer_id: &str) -> Result<Lead, AppError> {
        let mut market = self.market()?;
        let lead = market.lead_mut(lead_id)?;

        if lead.buyer_id.as_deref() != Some(installer_id) {
            return Err(AppError::Forbidden(format!(
                "Lead {} não pertence ao instalador {}",
                lead_id, installer_id
            )));
        }

        let current = lead.pipeline_stage.unwrap_or(PipelineStage::New);
        let next = current.next().ok_or_else(|| {
            AppError::Conflict(format!("Lead {} já está no estágio final", lead_id))
        })?;
        lead.pipeline_stage = Some(next);

        tracing::info!("Lead {} advanced {:?} → {:?}", lead_id, current, next);
        Ok(lead.clone())
    }
}
