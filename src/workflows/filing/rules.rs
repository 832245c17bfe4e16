//! Deterministic fallback ruleset used when the cross-validation collaborator
//! is unavailable or answers with something unusable. Four fixed rules,
//! evaluated in order; each yields a [`ComplianceRuleResult`] with detected
//! and reference values plus an explanation that embeds the source document's
//! narrative when one exists.

use super::catalog::{
    self, FLOOR_PLANS_DOCUMENT, SIGNAGE_DOCUMENT, SOIL_STUDY_DOCUMENT, STRUCTURAL_MEMO_DOCUMENT,
    TITLE_DOCUMENT,
};
use super::domain::{
    ComplianceRuleResult, DocumentRequirement, ProjectRecord, ValidationState,
};

/// Floor count assumed when the architectural extraction never produced one.
pub const ASSUMED_FLOORS: u32 = 5;

pub(crate) fn evaluate(
    project: &ProjectRecord,
    documents: &[DocumentRequirement],
) -> Vec<ComplianceRuleResult> {
    vec![
        title_consistency(project, documents),
        height_limit(project, documents),
        structural_consistency(documents),
        public_notice(documents),
    ]
}

fn find<'a>(documents: &'a [DocumentRequirement], id: &str) -> Option<&'a DocumentRequirement> {
    documents.iter().find(|doc| doc.id.as_str() == id)
}

fn with_narrative(base: String, document: Option<&DocumentRequirement>) -> String {
    match document.and_then(DocumentRequirement::narrative) {
        Some(narrative) => format!("{base} Dictamen del documento: {narrative}"),
        None => base,
    }
}

/// Rule 1: titleholder on the legal title document must match the declared
/// owner (case-insensitive containment of the owner's first name token).
fn title_consistency(
    project: &ProjectRecord,
    documents: &[DocumentRequirement],
) -> ComplianceRuleResult {
    let rule = "Titularidad del Predio".to_string();
    let reference = project.owner.clone();
    let title = find(documents, TITLE_DOCUMENT);

    let validated = title.map(|doc| doc.state == ValidationState::Validated);
    if validated != Some(true) {
        return ComplianceRuleResult {
            rule,
            detected: "No disponible".to_string(),
            reference,
            satisfied: false,
            explanation: with_narrative(
                "El Certificado de Tradición y Libertad no fue validado; no es posible \
                 verificar la titularidad."
                    .to_string(),
                title,
            ),
        };
    }

    let titleholder = title
        .and_then(|doc| doc.extracted.get("propietario_titular"))
        .map(String::as_str)
        .unwrap_or("");

    let first_token = project
        .owner
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();

    let satisfied =
        !first_token.is_empty() && titleholder.to_lowercase().contains(&first_token);

    let explanation = if satisfied {
        format!("El titular registrado '{titleholder}' coincide con el propietario declarado.")
    } else {
        with_narrative(
            format!(
                "El titular registrado '{titleholder}' no coincide con el propietario \
                 declarado '{}'.",
                project.owner
            ),
            title,
        )
    };

    ComplianceRuleResult {
        rule,
        detected: if titleholder.is_empty() {
            "No disponible".to_string()
        } else {
            titleholder.to_string()
        },
        reference,
        satisfied,
        explanation,
    }
}

/// Rule 2: declared floor count from the floor plans against the zone maximum.
fn height_limit(
    project: &ProjectRecord,
    documents: &[DocumentRequirement],
) -> ComplianceRuleResult {
    let plans = find(documents, FLOOR_PLANS_DOCUMENT);
    let zone = catalog::zone_profile_for(&project.locality);

    let declared = plans
        .and_then(|doc| doc.extracted.get("numero_pisos_detectado"))
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(ASSUMED_FLOORS);

    let satisfied = declared <= zone.max_floors;

    let explanation = if satisfied {
        format!(
            "Altura de {declared} pisos dentro del límite del tratamiento {}.",
            zone.treatment
        )
    } else {
        with_narrative(
            format!(
                "Exceso de altura: {declared} pisos proyectados en tratamiento {} \
                 (máximo permitido: {}).",
                zone.treatment, zone.max_floors
            ),
            plans,
        )
    };

    ComplianceRuleResult {
        rule: "Art. 345 - Edificabilidad".to_string(),
        detected: format!("{declared} Niveles"),
        reference: format!("Máx. {} Niveles", zone.max_floors),
        satisfied,
        explanation,
    }
}

/// Rule 3: the structural memo must cite a design code, and its use-type
/// classification must not contradict the soil-study narrative.
fn structural_consistency(documents: &[DocumentRequirement]) -> ComplianceRuleResult {
    let rule = "NSR-10 - Consistencia Estructural".to_string();
    let reference = "Norma NSR-10 referenciada y uso consistente".to_string();
    let memo = find(documents, STRUCTURAL_MEMO_DOCUMENT);
    let soil = find(documents, SOIL_STUDY_DOCUMENT);

    let code_reference = memo
        .and_then(|doc| doc.extracted.get("norma_referencia"))
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty());

    let Some(code_reference) = code_reference else {
        return ComplianceRuleResult {
            rule,
            detected: "Sin referencia normativa".to_string(),
            reference,
            satisfied: false,
            explanation: with_narrative(
                "Las memorias de cálculo no citan la norma de diseño sismorresistente."
                    .to_string(),
                memo,
            ),
        };
    };

    let commercial_use = memo
        .and_then(|doc| doc.extracted.get("grupo_uso_edificacion"))
        .map(|value| value.to_lowercase().contains("comercial"))
        .unwrap_or(false);
    let residential_soil = soil
        .map(|doc| {
            doc.extracted
                .values()
                .any(|value| value.to_lowercase().contains("residencial"))
        })
        .unwrap_or(false);

    let mismatch = commercial_use && residential_soil;

    ComplianceRuleResult {
        rule,
        detected: code_reference.to_string(),
        reference,
        satisfied: !mismatch,
        explanation: if mismatch {
            with_narrative(
                "Clasificación estructural comercial con estudio de suelos que describe \
                 uso residencial."
                    .to_string(),
                soil,
            )
        } else {
            format!("Referencia de diseño '{code_reference}' presente y uso consistente.")
        },
    }
}

/// Rule 4: the public-notice signage photo must have validated.
fn public_notice(documents: &[DocumentRequirement]) -> ComplianceRuleResult {
    let signage = find(documents, SIGNAGE_DOCUMENT);
    let state = signage.map(|doc| doc.state).unwrap_or(ValidationState::Pending);
    let satisfied = state == ValidationState::Validated;

    ComplianceRuleResult {
        rule: "Valla Informativa (Art. 2.2.6.1.2.3.6)".to_string(),
        detected: state.label().to_string(),
        reference: ValidationState::Validated.label().to_string(),
        satisfied,
        explanation: if satisfied {
            "Registro fotográfico de la valla validado.".to_string()
        } else {
            with_narrative(
                "La valla informativa no cuenta con validación; el trámite no puede \
                 notificarse a terceros."
                    .to_string(),
                signage,
            )
        },
    }
}
