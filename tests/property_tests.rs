/// Property-based tests using proptest
/// Tests invariants and properties that should hold for all inputs
use proptest::prelude::*;
use rust_solar_api::estimator::{estimate, GENERATION_FACTOR, SIZING_HEADROOM};
use rust_solar_api::geocoding::{synthetic_coordinates, BASE_COORDINATES};
use rust_solar_api::leads::{is_valid_email, mask_email, mask_phone, validate_br_phone};
use rust_solar_api::solar::BuildingInsights;
use rust_solar_api::tariff::{lookup_tariff, NATIONAL_AVERAGE_TARIFF, STATE_TARIFFS};

fn insights(panels: u32, watts: f64) -> BuildingInsights {
    serde_json::from_value(serde_json::json!({
        "name": "buildings/prop",
        "solarPotential": {
            "maxArrayPanelsCount": panels,
            "panelCapacityWatts": watts
        }
    }))
    .unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

// Property: Estimator sizing and savings
proptest! {
    #[test]
    fn bill_only_estimate_offsets_whole_bill(
        bill in 1.0f64..50_000.0,
        tariff in 0.3f64..2.0
    ) {
        let result = estimate(tariff, bill, None).unwrap();

        prop_assert!(close(result.system_size_kw, bill / tariff / GENERATION_FACTOR));
        // Production sized to the bill pays the whole bill every month
        prop_assert!(close(result.annual_savings, bill * 12.0));
    }

    #[test]
    fn monthly_savings_always_twelve_and_sum_to_annual(
        bill in 1.0f64..50_000.0,
        tariff in 0.3f64..2.0,
        panels in 0u32..200
    ) {
        let roof = insights(panels, 400.0);
        for potential in [None, Some(&roof)] {
            let result = estimate(tariff, bill, potential).unwrap();
            prop_assert_eq!(result.monthly_savings.len(), 12);
            let total: f64 = result.monthly_savings.iter().sum();
            prop_assert!(close(total, result.annual_savings));
        }
    }

    #[test]
    fn roof_limits_system_size(
        bill in 1.0f64..50_000.0,
        tariff in 0.3f64..2.0,
        panels in 0u32..200,
        watts in 250.0f64..600.0
    ) {
        let roof = insights(panels, watts);
        let result = estimate(tariff, bill, Some(&roof)).unwrap();
        let target = bill / tariff / GENERATION_FACTOR;

        prop_assert!(result.system_size_kw <= roof.roof_capacity_kw() + 1e-9);
        prop_assert!(result.system_size_kw <= target * SIZING_HEADROOM + 1e-9);
        prop_assert!(result.system_size_kw >= 0.0);
    }

    #[test]
    fn payback_absent_only_without_savings(
        bill in 1.0f64..50_000.0,
        tariff in 0.3f64..2.0,
        panels in 0u32..50
    ) {
        let roof = insights(panels, 400.0);
        let result = estimate(tariff, bill, Some(&roof)).unwrap();

        match result.payback_years {
            Some(years) => {
                prop_assert!(result.annual_savings > 0.0);
                prop_assert!(close(years, result.estimated_cost / result.annual_savings));
            }
            None => prop_assert!(result.annual_savings <= 0.0),
        }
    }

    #[test]
    fn non_positive_bill_always_rejected(bill in -50_000.0f64..=0.0) {
        prop_assert!(estimate(0.84, bill, None).is_err());
    }
}

// Property: Tariff lookup
proptest! {
    #[test]
    fn tariff_lookup_never_panics_and_is_known(address in "\\PC*") {
        let tariff = lookup_tariff(&address);
        let known = tariff == NATIONAL_AVERAGE_TARIFF
            || STATE_TARIFFS.iter().any(|(_, value)| *value == tariff);
        prop_assert!(known);
    }

    #[test]
    fn trailing_state_code_wins(
        street in "[A-Za-z ]{3,20}",
        index in 0usize..27
    ) {
        let (code, expected) = STATE_TARIFFS[index];
        let address = format!("{}, 100, Cidade, {}", street, code);
        prop_assert_eq!(lookup_tariff(&address), expected);
    }
}

// Property: Synthetic coordinates
proptest! {
    #[test]
    fn synthetic_coordinates_deterministic_and_bounded(address in "\\PC*") {
        let a = synthetic_coordinates(&address);
        let b = synthetic_coordinates(&address);
        prop_assert_eq!(a, b);
        prop_assert!((a.latitude - BASE_COORDINATES.latitude).abs() <= 0.05 + 1e-9);
        prop_assert!((a.longitude - BASE_COORDINATES.longitude).abs() <= 0.05 + 1e-9);
    }
}

// Property: Contact validation should never panic
proptest! {
    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn phone_validation_never_panics(phone in "\\PC*") {
        let _ = validate_br_phone(&phone);
    }

    #[test]
    fn valid_br_phones_normalize_to_e164(ddd in 11u8..=99u8, number in 900000000u32..=999999999u32) {
        let phone = format!("{}{}", ddd, number);
        let (valid, normalized) = validate_br_phone(&phone);
        if valid {
            prop_assert!(normalized.starts_with("+55"));
            prop_assert!(normalized[1..].chars().all(|c| c.is_ascii_digit()));
            prop_assert!(normalized.len() >= 13 && normalized.len() <= 14);
        }
    }

    #[test]
    fn very_short_phones_always_invalid(phone in "[0-9]{0,7}") {
        let (valid, _) = validate_br_phone(&phone);
        prop_assert!(!valid, "Very short phone should be invalid: {}", phone);
    }

    #[test]
    fn emails_with_repeated_digits_rejected(
        repeat_pattern in prop::sample::select(vec!["999999", "111111", "000000", "123456789"]),
        local_prefix in "[a-z]{1,5}",
        domain in "[a-z]{3,10}",
        tld in "[a-z]{2,3}"
    ) {
        let email = format!("{}{}@{}.{}", local_prefix, repeat_pattern, domain, tld);
        prop_assert!(!is_valid_email(&email), "Email with fake pattern should be rejected: {}", email);
    }
}

// Property: Masking hides contact details but keeps their shape
proptest! {
    #[test]
    fn masked_email_keeps_length_and_domain(
        local in "[a-z][a-z0-9.]{0,15}",
        domain in "[a-z]{3,10}\\.com"
    ) {
        let email = format!("{}@{}", local, domain);
        let masked = mask_email(&email);
        prop_assert_eq!(masked.chars().count(), email.chars().count());
        let expected_suffix = format!("@{}", domain);
        prop_assert!(masked.ends_with(&expected_suffix));
        if local.len() > 1 {
            prop_assert_ne!(masked, email);
        }
    }

    #[test]
    fn masked_phone_hides_subscriber_digits(rest in "[0-9]{9}") {
        let phone = format!("+5511{}", rest);
        let masked = mask_phone(&phone);
        prop_assert_eq!(masked.len(), phone.len());
        prop_assert!(masked.starts_with("+5511"));
        prop_assert!(masked.ends_with(&phone[phone.len() - 2..]));
        prop_assert!(!masked.contains(&rest[..7]));
    }
}
