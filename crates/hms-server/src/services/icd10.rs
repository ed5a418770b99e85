//! Built-in ICD-10 code lookup.

use crate::error::{ApiError, ApiResult};
use once_cell::sync::Lazy;
use regex::RegexBuilder;
use serde::Serialize;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Icd10Code {
    pub code: &'static str,
    pub description: &'static str,
}

const fn entry(code: &'static str, description: &'static str) -> Icd10Code {
    Icd10Code { code, description }
}

static CODES: Lazy<Vec<Icd10Code>> = Lazy::new(|| {
    vec![
        entry("A09", "Infectious gastroenteritis and colitis, unspecified"),
        entry("B34.9", "Viral infection, unspecified"),
        entry("C50.911", "Malignant neoplasm of unspecified site of right female breast"),
        entry("D50.9", "Iron deficiency anemia, unspecified"),
        entry("E03.9", "Hypothyroidism, unspecified"),
        entry("E11.9", "Type 2 diabetes mellitus without complications"),
        entry("E11.65", "Type 2 diabetes mellitus with hyperglycemia"),
        entry("E66.9", "Obesity, unspecified"),
        entry("E78.5", "Hyperlipidemia, unspecified"),
        entry("F32.9", "Major depressive disorder, single episode, unspecified"),
        entry("F41.1", "Generalized anxiety disorder"),
        entry("G43.909", "Migraine, unspecified, not intractable, without status migrainosus"),
        entry("G47.00", "Insomnia, unspecified"),
        entry("I10", "Essential (primary) hypertension"),
        entry("I25.10", "Atherosclerotic heart disease of native coronary artery without angina pectoris"),
        entry("I48.91", "Unspecified atrial fibrillation"),
        entry("I50.9", "Heart failure, unspecified"),
        entry("I63.9", "Cerebral infarction, unspecified"),
        entry("J02.9", "Acute pharyngitis, unspecified"),
        entry("J06.9", "Acute upper respiratory infection, unspecified"),
        entry("J18.9", "Pneumonia, unspecified organism"),
        entry("J20.9", "Acute bronchitis, unspecified"),
        entry("J44.9", "Chronic obstructive pulmonary disease, unspecified"),
        entry("J45.909", "Unspecified asthma, uncomplicated"),
        entry("K21.9", "Gastro-esophageal reflux disease without esophagitis"),
        entry("K29.70", "Gastritis, unspecified, without bleeding"),
        entry("K35.80", "Unspecified acute appendicitis"),
        entry("K59.00", "Constipation, unspecified"),
        entry("L20.9", "Atopic dermatitis, unspecified"),
        entry("M17.9", "Osteoarthritis of knee, unspecified"),
        entry("M25.561", "Pain in right knee"),
        entry("M54.5", "Low back pain"),
        entry("M79.1", "Myalgia"),
        entry("N18.9", "Chronic kidney disease, unspecified"),
        entry("N39.0", "Urinary tract infection, site not specified"),
        entry("O80", "Encounter for full-term uncomplicated delivery"),
        entry("R05", "Cough"),
        entry("R07.9", "Chest pain, unspecified"),
        entry("R10.9", "Unspecified abdominal pain"),
        entry("R50.9", "Fever, unspecified"),
        entry("R51", "Headache"),
        entry("S06.0X0A", "Concussion without loss of consciousness, initial encounter"),
        entry("S52.501A", "Unspecified fracture of the lower end of right radius, initial encounter"),
        entry("S93.401A", "Sprain of unspecified ligament of right ankle, initial encounter"),
        entry("Z00.00", "Encounter for general adult medical examination without abnormal findings"),
        entry("Z23", "Encounter for immunization"),
    ]
});

/// Search code and description, ignoring case.
///
/// The query is matched literally. Codes that start with the query are
/// listed before description-only matches; each group keeps table order.
pub fn search(query: &str, limit: Option<usize>) -> ApiResult<Vec<Icd10Code>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Search query must not be empty".into()));
    }
    let limit = limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let pattern = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .map_err(|e| ApiError::BadRequest(format!("Invalid search query: {}", e)))?;
    let prefix = query.to_uppercase();

    let (mut ranked, rest): (Vec<Icd10Code>, Vec<Icd10Code>) = CODES
        .iter()
        .filter(|c| pattern.is_match(c.code) || pattern.is_match(c.description))
        .copied()
        .partition(|c| c.code.starts_with(&prefix));
    ranked.extend(rest);
    ranked.truncate(limit);
    Ok(ranked)
}
