//! Residential electricity tariffs per Brazilian state.
//!
//! Values are R$/kWh including taxes, fixed at build time. Addresses are
//! scanned for a standalone upper-case state abbreviation; anything else
//! falls back to the national average.

/// National average tariff used when no state code is found (R$/kWh).
pub const NATIONAL_AVERAGE_TARIFF: f64 = 0.85;

/// (state code, R$/kWh)
pub const STATE_TARIFFS: [(&str, f64); 27] = [
    ("AC", 0.88),
    ("AL", 0.87),
    ("AP", 0.82),
    ("AM", 0.95),
    ("BA", 0.89),
    ("CE", 0.86),
    ("DF", 0.80),
    ("ES", 0.78),
    ("GO", 0.84),
    ("MA", 0.86),
    ("MT", 0.95),
    ("MS", 0.93),
    ("MG", 0.96),
    ("PA", 1.02),
    ("PB", 0.79),
    ("PR", 0.82),
    ("PE", 0.87),
    ("PI", 0.93),
    ("RJ", 1.05),
    ("RN", 0.80),
    ("RS", 0.86),
    ("RO", 0.88),
    ("RR", 0.76),
    ("SC", 0.74),
    ("SP", 0.84),
    ("SE", 0.79),
    ("TO", 0.93),
];

/// Tariff for a single state code, if it is one.
pub fn tariff_for_state(code: &str) -> Option<f64> {
    STATE_TARIFFS
        .iter()
        .find(|(state, _)| *state == code)
        .map(|(_, tariff)| *tariff)
}

/// Finds the state code in a free-text address.
///
/// The state usually trails the city ("São Paulo, SP" or "Curitiba - PR"),
/// so the last matching token wins.
pub fn detect_state(address: &str) -> Option<&'static str> {
    address
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() == 2 && token.chars().all(|c| c.is_ascii_uppercase()))
        .filter_map(|token| {
            STATE_TARIFFS
                .iter()
                .find(|(state, _)| *state == token)
                .map(|(state, _)| *state)
        })
        .last()
}

/// Price per kWh for the state named in `address`, or the national average.
pub fn lookup_tariff(address: &str) -> f64 {
    match detect_state(address) {
        Some(state) => {
            let tariff = tariff_for_state(state).unwrap_or(NATIONAL_AVERAGE_TARIFF);
            tracing::debug!("Tariff for state {}: R$ {:.2}/kWh", state, tariff);
            tariff
        }
        None => {
            tracing::debug!(
                "No state code in address, using national average R$ {:.2}/kWh",
                NATIONAL_AVERAGE_TARIFF
            );
            NATIONAL_AVERAGE_TARIFF
        }
    }
}
