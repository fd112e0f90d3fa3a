/// Unit tests for lead capture logic
/// Tests contact validation, masking and the marketplace state machine
use rust_solar_api::leads::{
    is_valid_email, mask_email, mask_phone, validate_br_phone, validate_contact, LeadListing,
};
use rust_solar_api::models::CaptureLeadRequest;
use uuid::Uuid;

fn capture_request(email: &str, phone: &str) -> CaptureLeadRequest {
    CaptureLeadRequest {
        report_id: Uuid::new_v4(),
        name: "Maria Souza".to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
    }
}

#[cfg(test)]
mod email_validation_tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(is_valid_email("user_name@example-domain.com"));
    }

    #[test]
    fn test_invalid_emails_basic() {
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@examplecom"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_invalid_emails_fake_patterns() {
        // Placeholder addresses typed into the capture form
        assert!(!is_valid_email("11999999999@example.com"));
        assert!(!is_valid_email("1111111111@gmail.com"));
        assert!(!is_valid_email("test123456789@example.com"));
    }

    #[test]
    fn test_invalid_emails_malformed() {
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("user@exam ple.com"));
    }
}

#[cfg(test)]
mod phone_validation_tests {
    use super::*;

    #[test]
    fn test_valid_brazilian_phones() {
        let (valid, normalized) = validate_br_phone("11987654321");
        assert!(valid);
        assert_eq!(normalized, "+5511987654321");

        let (valid, normalized) = validate_br_phone("(11) 98765-4321");
        assert!(valid);
        assert_eq!(normalized, "+5511987654321");

        let (valid, normalized) = validate_br_phone("+5511987654321");
        assert!(valid);
        assert_eq!(normalized, "+5511987654321");
    }

    #[test]
    fn test_valid_brazilian_landlines() {
        let (valid, normalized) = validate_br_phone("(11) 3333-4444");
        assert!(valid);
        assert_eq!(normalized, "+551133334444");
    }

    #[test]
    fn test_invalid_phones() {
        let (valid, _) = validate_br_phone("1234");
        assert!(!valid);

        let (valid, _) = validate_br_phone("");
        assert!(!valid);

        let (valid, _) = validate_br_phone("   ");
        assert!(!valid);
    }
}

#[cfg(test)]
mod contact_validation_tests {
    use super::*;
    use rust_solar_api::errors::AppError;

    #[test]
    fn test_contact_is_normalized() {
        let contact =
            validate_contact(&capture_request("  Maria@Example.COM ", "(21) 98765-4321"))
                .unwrap();
        assert_eq!(contact.name, "Maria Souza");
        assert_eq!(contact.email, "maria@example.com");
        assert_eq!(contact.phone, "+5521987654321");
    }

    #[test]
    fn test_contact_rejections_are_bad_requests() {
        let mut request = capture_request("maria@example.com", "11987654321");
        request.name = "   ".to_string();
        assert!(matches!(
            validate_contact(&request),
            Err(AppError::BadRequest(_))
        ));

        let request = capture_request("not-an-email", "11987654321");
        assert!(matches!(
            validate_contact(&request),
            Err(AppError::BadRequest(_))
        ));

        let request = capture_request("maria@example.com", "123");
        assert!(matches!(
            validate_contact(&request),
            Err(AppError::BadRequest(_))
        ));
    }
}

#[cfg(test)]
mod masking_tests {
    use super::*;

    #[test]
    fn test_mask_email_keeps_first_char_and_domain() {
        assert_eq!(mask_email("joao.silva@gmail.com"), "j*********@gmail.com");
        assert_eq!(mask_email("a@b.com"), "a@b.com");
        assert_eq!(mask_email("nodomain"), "********");
    }

    #[test]
    fn test_mask_phone_keeps_prefix_and_last_digits() {
        assert_eq!(mask_phone("+5511987654321"), "+5511*******21");
        assert_eq!(mask_phone("+55113"), "******");
    }
}

#[cfg(test)]
mod marketplace_tests {
    use super::*;
    use chrono::Utc;
    use rust_solar_api::errors::AppError;
    use rust_solar_api::models::{
        AddressResolution, Coordinates, LeadStatus, PipelineStage, RoofQuality, SolarReport,
    };
    use rust_solar_api::store::{Action, AppStore, Outcome};

    fn report() -> SolarReport {
        SolarReport {
            id: Uuid::new_v4(),
            address: "Rua Augusta, 500, São Paulo, SP".to_string(),
            location: AddressResolution::Resolved {
                coordinates: Coordinates {
                    latitude: -23.55,
                    longitude: -46.65,
                },
                formatted_address: "R. Augusta, 500 - São Paulo - SP, Brasil".to_string(),
            },
            monthly_bill: 300.0,
            system_size_kw: 2.98,
            annual_savings: 3600.0,
            monthly_savings: vec![300.0; 12],
            estimated_cost: 13392.0,
            payback_years: Some(3.72),
            co2_offset_tons: 0.35,
            roof_quality: RoofQuality::Good,
            energy_tariff: 0.84,
            summary: "Resumo".to_string(),
            solar_potential: None,
            created_at: Utc::now(),
        }
    }

    async fn store_with_lead() -> (AppStore, Uuid) {
        let store = AppStore::new(50.0, 120.0);
        let report = report();
        let report_id = report.id;
        store.dispatch(Action::SubmitReport(report)).await.unwrap();

        let mut request = capture_request("maria@example.com", "11987654321");
        request.report_id = report_id;
        let lead = match store.dispatch(Action::CaptureLead(request)).await.unwrap() {
            Outcome::LeadCaptured(lead) => lead,
            other => panic!("unexpected outcome: {:?}", other),
        };
        (store, lead.id)
    }

    #[tokio::test]
    async fn test_listing_stays_masked_after_sale() {
        let (store, lead_id) = store_with_lead().await;

        let listing = LeadListing::from_lead(&store.leads().unwrap()[0]);
        assert_eq!(listing.lead.email, "m****@example.com");
        assert_eq!(listing.lead.phone, "+5511*******21");

        store
            .dispatch(Action::BuyLead {
                lead_id,
                installer_id: "solartec".to_string(),
            })
            .await
            .unwrap();

        // Another installer browsing the marketplace still sees masked contacts
        let listing = LeadListing::from_lead(&store.leads().unwrap()[0]);
        assert_eq!(listing.lead.status, LeadStatus::Sold);
        assert_eq!(listing.lead.email, "m****@example.com");
        assert_eq!(listing.lead.phone, "+5511*******21");

        // Only the buyer reads the full contact
        let owned = store.purchased_leads("solartec").unwrap();
        assert_eq!(owned[0].email, "maria@example.com");
        assert_eq!(owned[0].phone, "+5511987654321");
        assert!(store.purchased_leads("concorrente").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_pipeline_walk_then_conflict() {
        let (store, lead_id) = store_with_lead().await;
        store
            .dispatch(Action::BuyLead {
                lead_id,
                installer_id: "solartec".to_string(),
            })
            .await
            .unwrap();

        let mut stages = Vec::new();
        for _ in 0..4 {
            match store
                .dispatch(Action::AdvancePipelineStage {
                    lead_id,
                    installer_id: "solartec".to_string(),
                })
                .await
                .unwrap()
            {
                Outcome::StageAdvanced(lead) => stages.push(lead.pipeline_stage),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert_eq!(
            stages,
            vec![
                Some(PipelineStage::Contacted),
                Some(PipelineStage::SiteVisit),
                Some(PipelineStage::ProposalSent),
                Some(PipelineStage::Closed),
            ]
        );

        let result = store
            .dispatch(Action::AdvancePipelineStage {
                lead_id,
                installer_id: "solartec".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_credits_run_out() {
        // 120 credits at 50 per lead: two purchases, third is refused
        let store = AppStore::new(50.0, 120.0);
        let report = report();
        let report_id = report.id;
        store.dispatch(Action::SubmitReport(report)).await.unwrap();

        let mut lead_ids = Vec::new();
        for email in ["a.one@example.com", "b.two@example.com", "c.three@example.com"] {
            let mut request = capture_request(email, "11987654321");
            request.report_id = report_id;
            if let Outcome::LeadCaptured(lead) =
                store.dispatch(Action::CaptureLead(request)).await.unwrap()
            {
                lead_ids.push(lead.id);
            }
        }
        assert_eq!(lead_ids.len(), 3);

        for lead_id in &lead_ids[..2] {
            store
                .dispatch(Action::BuyLead {
                    lead_id: *lead_id,
                    installer_id: "solartec".to_string(),
                })
                .await
                .unwrap();
        }

        let result = store
            .dispatch(Action::BuyLead {
                lead_id: lead_ids[2],
                installer_id: "solartec".to_string(),
            })
            .await;
        match result {
            Err(AppError::InsufficientCredits {
                required,
                available,
            }) => {
                assert_eq!(required, 50.0);
                assert_eq!(available, 20.0);
            }
            other => panic!("expected insufficient credits, got {:?}", other),
        }

        let account = store.installer("solartec").unwrap();
        assert_eq!(account.credits, 20.0);
        assert_eq!(account.purchased_leads, lead_ids[..2].to_vec());
    }
}
