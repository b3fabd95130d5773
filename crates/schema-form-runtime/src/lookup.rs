// crates/schema-form-runtime/src/lookup.rs
// ============================================================================
// Module: Static Lookup Service
// Description: Built-in address, company, and document lookups.
// Purpose: Serve the built-in integration endpoints without a network.
// Dependencies: async-trait, schema-form-core, tokio, tokio-util
// ============================================================================

//! ## Overview
//! [`StaticLookupService`] answers the three built-in endpoints from fixed
//! tables and checksum rules. An optional simulated latency can be set; the
//! wait observes the cancellation token so superseded lookups stop early.
//!
//! Payload keys are matched either by full field path or by final segment,
//! so `postalCode` and `contactInfo.postalCode` both reach the address table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use schema_form_core::FormValue;
use schema_form_core::FormValues;
use schema_form_core::last_segment;
use tokio_util::sync::CancellationToken;

use crate::interfaces::LookupPayload;
use crate::interfaces::RemoteCall;
use crate::interfaces::RemoteCallError;

// ============================================================================
// SECTION: Endpoints
// ============================================================================

/// Address lookup by postal code.
pub const FETCH_ADDRESS_ENDPOINT: &str = "fetchAddressFromPostalCode";
/// Company lookup by EIK or BULSTAT.
pub const FETCH_COMPANY_ENDPOINT: &str = "fetchCompanyDetails";
/// Identity document number validation.
pub const VALIDATE_DOCUMENT_ENDPOINT: &str = "validateDocument";

/// Endpoints served by [`StaticLookupService`].
pub const BUILTIN_ENDPOINTS: [&str; 3] =
    [FETCH_ADDRESS_ENDPOINT, FETCH_COMPANY_ENDPOINT, VALIDATE_DOCUMENT_ENDPOINT];

/// EGN checksum weights for the first nine digits.
const EGN_WEIGHTS: [u32; 9] = [2, 4, 8, 5, 10, 9, 7, 3, 6];

// ============================================================================
// SECTION: Tables
// ============================================================================

/// Known addresses: postal code, city, oblast.
const ADDRESSES: &[(&str, &str, &str)] = &[
    ("1000", "София", "София-град"),
    ("1040", "София", "София-град"),
    ("1164", "София", "София-град"),
    ("1500", "София", "София-град"),
    ("1700", "Студентски град", "София-град"),
    ("2700", "Благоевград", "Благоевград"),
    ("4000", "Пловдив", "Пловдив"),
    ("5000", "Велико Търново", "Велико Търново"),
    ("6000", "Стара Загора", "Стара Загора"),
    ("7000", "Русе", "Русе"),
    ("8000", "Бургас", "Бургас"),
    ("9000", "Варна", "Варна"),
];

/// Country reported for every known address.
const ADDRESS_COUNTRY: &str = "България";

/// Known companies: EIK/BULSTAT, name, address, registration date.
const COMPANIES: &[(&str, &str, &str, &str)] = &[
    ("831600946", "Софтуерна Компания ООД", "бул. Витоша 100, София 1000", "2015-03-15"),
    ("175188113", "Технологии България АД", "ул. Шипка 34, Пловдив 4000", "2010-08-22"),
    ("200950412", "Търговска Фирма ЕООД", "ул. Преслав 15, Варна 9000", "2018-11-30"),
    ("1234567890123", "Голяма Компания с БУЛСТАТ", "бул. България 1, Бургас 8000", "2005-01-10"),
];

// ============================================================================
// SECTION: Service
// ============================================================================

/// Lookup service for the built-in endpoints.
#[derive(Debug, Clone, Default)]
pub struct StaticLookupService {
    /// Simulated latency before answering.
    latency: Option<Duration>,
}

impl StaticLookupService {
    /// Creates a service that answers immediately.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latency: None,
        }
    }

    /// Creates a service that waits `latency` before answering.
    #[must_use]
    pub const fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
        }
    }

    /// Answers a lookup synchronously.
    ///
    /// Unknown endpoints and unknown keys yield `None`.
    #[must_use]
    pub fn lookup(endpoint: &str, payload: &LookupPayload) -> Option<FormValues> {
        let normalized = normalize_payload(payload);
        let value = |key: &str| normalized.get(key).map(String::as_str);
        match endpoint {
            FETCH_ADDRESS_ENDPOINT => {
                fetch_address(value("postalCode").or_else(|| value("contactInfo.postalCode"))?)
            }
            FETCH_COMPANY_ENDPOINT => fetch_company(value("eik").or_else(|| value("bulstat"))?),
            VALIDATE_DOCUMENT_ENDPOINT => Some(validate_document(
                value("documentType").unwrap_or_default(),
                value("documentNumber").unwrap_or_default(),
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl RemoteCall for StaticLookupService {
    async fn call(
        &self,
        endpoint: &str,
        payload: &LookupPayload,
        cancel: &CancellationToken,
    ) -> Result<Option<FormValues>, RemoteCallError> {
        if cancel.is_cancelled() {
            return Err(RemoteCallError::Cancelled);
        }
        if let Some(latency) = self.latency {
            tokio::select! {
                () = cancel.cancelled() => return Err(RemoteCallError::Cancelled),
                () = tokio::time::sleep(latency) => {}
            }
        }
        Ok(Self::lookup(endpoint, payload))
    }
}

// ============================================================================
// SECTION: Lookups
// ============================================================================

/// Adds the final path segment of every key alongside the full key.
fn normalize_payload(payload: &LookupPayload) -> LookupPayload {
    let mut normalized = LookupPayload::new();
    for (key, value) in payload {
        normalized.insert(last_segment(key).to_string(), value.clone());
    }
    for (key, value) in payload {
        normalized.insert(key.clone(), value.clone());
    }
    normalized
}

/// Looks up an address by postal code.
fn fetch_address(postal_code: &str) -> Option<FormValues> {
    let (_, city, oblast) = ADDRESSES.iter().find(|(code, ..)| *code == postal_code)?;
    Some(
        [("city", *city), ("oblast", *oblast), ("country", ADDRESS_COUNTRY)]
            .into_iter()
            .collect(),
    )
}

/// Looks up a company by EIK or BULSTAT.
fn fetch_company(eik: &str) -> Option<FormValues> {
    let (_, name, address, registered) = COMPANIES.iter().find(|(id, ..)| *id == eik)?;
    Some(
        [("companyName", *name), ("companyAddress", *address), ("registrationDate", *registered)]
            .into_iter()
            .collect(),
    )
}

/// Validates a document number for its document type.
fn validate_document(document_type: &str, number: &str) -> FormValues {
    let (is_valid, message) = match document_type {
        "EGN" => {
            let valid = is_valid_egn(number);
            (
                valid,
                if valid { "ЕГН е валидно" } else { "ЕГН трябва да е точно 10 цифри и да е валидно" },
            )
        }
        "ID_CARD" => {
            let valid = is_digits(number, 9);
            (
                valid,
                if valid {
                    "Номерът на лична карта е валиден"
                } else {
                    "Номерът на лична карта трябва да е 9 цифри"
                },
            )
        }
        "PASSPORT" => {
            let valid = is_digits(number, 9);
            (
                valid,
                if valid {
                    "Номерът на паспорта е валиден"
                } else {
                    "Номерът на паспорта трябва да е 9 цифри"
                },
            )
        }
        "EIK" => {
            let valid = is_digits(number, 9) || is_digits(number, 13);
            (
                valid,
                if valid { "ЕИК/БУЛСТАТ е валиден" } else { "ЕИК трябва да е 9 цифри, БУЛСТАТ - 13 цифри" },
            )
        }
        _ => (false, "Невалиден документ"),
    };
    [("isValid", FormValue::Flag(is_valid)), ("message", FormValue::from(message))]
        .into_iter()
        .collect()
}

/// Returns true when `value` is exactly `len` ASCII digits.
fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Validates an EGN: ten digits with a weighted mod-11 check digit.
fn is_valid_egn(egn: &str) -> bool {
    if !is_digits(egn, 10) {
        return false;
    }
    let digits: Vec<u32> = egn.bytes().map(|byte| u32::from(byte - b'0')).collect();
    let sum: u32 = digits.iter().zip(EGN_WEIGHTS).map(|(digit, weight)| digit * weight).sum();
    let checksum = match sum % 11 {
        10 => 0,
        other => other,
    };
    digits.get(9) == Some(&checksum)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
