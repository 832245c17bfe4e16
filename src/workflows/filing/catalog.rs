//! Fixed catalog backing a filing draft: the required-document templates, the
//! per-document analysis rule profiles sent to the document-analysis service,
//! the autofill target maps for source documents, and the zone profiles the
//! fallback ruleset consults.

use super::domain::{AutofillTarget, DocumentCategory, DocumentId, DocumentRequirement};

pub const IDENTITY_DOCUMENT: &str = "doc_cedula";
pub const TITLE_DOCUMENT: &str = "doc_tradicion";
pub const SIGNAGE_DOCUMENT: &str = "doc_valla";
pub const FLOOR_PLANS_DOCUMENT: &str = "arq_plantas";
pub const STRUCTURAL_MEMO_DOCUMENT: &str = "est_memorias";
pub const SOIL_STUDY_DOCUMENT: &str = "est_suelos";

/// Requirement templates a fresh draft starts from, in wizard order.
pub fn requirement_catalog() -> Vec<DocumentRequirement> {
    use DocumentCategory::*;

    vec![
        // Step 1: identification and property (autofill sources)
        DocumentRequirement::template(
            IDENTITY_DOCUMENT,
            Identification,
            "Documento de Identidad",
            "Cédula del propietario o representante legal. (Usado para autocompletar)",
            true,
        ),
        DocumentRequirement::template(
            TITLE_DOCUMENT,
            Legal,
            "Certificado de Tradición y Libertad",
            "Expedición reciente. (Usado para autocompletar)",
            true,
        ),
        // Complementary legal documents
        DocumentRequirement::template(
            "doc_formulario",
            Legal,
            "Formulario Único Nacional",
            "Diligenciado y firmado por propietario y profesionales.",
            true,
        ),
        DocumentRequirement::template(
            "doc_predial",
            Legal,
            "Copia del Impuesto Predial",
            "Último periodo gravable cancelado.",
            true,
        ),
        DocumentRequirement::template(
            SIGNAGE_DOCUMENT,
            Legal,
            "Fotos de la Valla Instalada",
            "Registro fotográfico de la valla amarilla visible al público (Formato Curaduría 1).",
            true,
        ),
        DocumentRequirement::template(
            "doc_vecinos",
            Legal,
            "Direcciones para Citación de Vecinos",
            "Requisito indispensable para notificaciones (Art. 2.2.6.1.2.2.1).",
            true,
        ),
        DocumentRequirement::template(
            "doc_poder",
            Legal,
            "Poder Especial o General",
            "Si se actúa mediante apoderado. Autenticado.",
            false,
        ),
        DocumentRequirement::template(
            "doc_propiedad_horizontal",
            Legal,
            "Acta de Asamblea / RPH",
            "Autorización de copropietarios si aplica.",
            false,
        ),
        // Architectural documents
        DocumentRequirement::template(
            "arq_localizacion",
            Architectural,
            "Plano de Localización",
            "Escala adecuada, relacionando el predio con la ciudad.",
            true,
        ),
        DocumentRequirement::template(
            FLOOR_PLANS_DOCUMENT,
            Architectural,
            "Plantas Arquitectónicas",
            "Por cada piso, cubierta y sótanos.",
            true,
        ),
        DocumentRequirement::template(
            "arq_cortes",
            Architectural,
            "Cortes (Longitudinal y Transversal)",
            "Relacionando niveles y alturas.",
            true,
        ),
        DocumentRequirement::template(
            "arq_fachadas",
            Architectural,
            "Fachadas",
            "Todas las fachadas del proyecto.",
            true,
        ),
        DocumentRequirement::template(
            "arq_cuadro_areas",
            Architectural,
            "Cuadro de Áreas",
            "Desglose de áreas construidas, libres y ocupación.",
            true,
        ),
        DocumentRequirement::template(
            "arq_memoria",
            Architectural,
            "Memoria Arquitectónica",
            "Descripción del proyecto y cumplimiento de normas.",
            false,
        ),
        // Structural documents
        DocumentRequirement::template(
            SOIL_STUDY_DOCUMENT,
            Structural,
            "Estudio de Suelos",
            "Según NSR-10.",
            true,
        ),
        DocumentRequirement::template(
            STRUCTURAL_MEMO_DOCUMENT,
            Structural,
            "Memorias de Cálculo Estructural",
            "Firmadas por Ingeniero Civil.",
            true,
        ),
        DocumentRequirement::template(
            "est_planos",
            Structural,
            "Planos Estructurales",
            "Cimentación, losas, columnas, despiece.",
            true,
        ),
        DocumentRequirement::template(
            "est_peritaje",
            Structural,
            "Peritaje Técnico",
            "Para reconocimiento o reforzamiento.",
            false,
        ),
    ]
}

/// Role-scoped instructions sent to the analysis service for one document
/// type. An absent profile means a generic analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisProfile {
    pub role: &'static str,
    pub focus_items: &'static [&'static str],
    pub expected_keys: &'static [&'static str],
}

/// Per-document analysis rule profile.
pub fn analysis_profile(id: &DocumentId) -> Option<AnalysisProfile> {
    let profile = match id.as_str() {
        TITLE_DOCUMENT => AnalysisProfile {
            role: "Abogado Urbanista",
            focus_items: &[
                "Número de Matrícula Inmobiliaria",
                "Dirección del predio",
                "Propietario actual (Titular de derecho real)",
                "Anotaciones de prohibición o embargo recientes",
            ],
            expected_keys: &[
                "matricula_inmobiliaria",
                "direccion_predio",
                "propietario_titular",
                "tiene_embargos",
            ],
        },
        IDENTITY_DOCUMENT => AnalysisProfile {
            role: "Funcionario de Radicación",
            focus_items: &[
                "Número de Cédula",
                "Nombre completo",
                "Vigencia del documento",
            ],
            expected_keys: &["numero_documento", "nombre_titular"],
        },
        "doc_vecinos" => AnalysisProfile {
            role: "Auxiliar de Correspondencia",
            focus_items: &[
                "Listado de direcciones",
                "Nomenclatura urbana (Calle/Carrera)",
                "Nombres de predios colindantes",
                "Indicación de linderos (Norte, Sur, Oriente, Occidente)",
            ],
            expected_keys: &["numero_vecinos_identificados", "contiene_direcciones_fisicas"],
        },
        SIGNAGE_DOCUMENT => AnalysisProfile {
            role: "Inspector de Policía Urbana",
            focus_items: &[
                "Color de fondo (Debe ser Amarillo Intenso)",
                "Texto \"CURADURÍA URBANA\"",
                "Visibilidad desde la vía pública",
                "Número de radicación (si ya cuenta con él) o texto \"TRÁMITE EN CURSO\"",
            ],
            expected_keys: &["color_fondo_detectado", "es_legible", "contiene_texto_curaduria"],
        },
        FLOOR_PLANS_DOCUMENT => AnalysisProfile {
            role: "Arquitecto Revisor de Curaduría",
            focus_items: &[
                "Cuadro de Áreas (Índice de Ocupación y Construcción)",
                "Ejes Estructurales (Nomenclatura)",
                "Muros y Elementos Estructurales (Representación gráfica)",
                "Cotas generales y parciales",
                "Niveles (N+0.00, N+3.50, etc.)",
                "Escala gráfica o numérica",
            ],
            expected_keys: &[
                "cuadro_areas_presente",
                "area_construida_total_m2",
                "sistema_ejes_detectado",
                "escalas_identificadas",
                "numero_pisos_detectado",
            ],
        },
        "arq_cortes" => AnalysisProfile {
            role: "Arquitecto Revisor",
            focus_items: &[
                "Altura libre entre placas",
                "Altura total de la edificación",
                "Relación con el nivel del andén",
                "Perfil del terreno natural",
            ],
            expected_keys: &[
                "altura_total_metros",
                "numero_niveles_corte",
                "altura_libre_piso_tipo",
            ],
        },
        "arq_localizacion" => AnalysisProfile {
            role: "Arquitecto Urbanista",
            focus_items: &[
                "Norte geográfico",
                "Vías circundantes con nomenclatura",
                "Antejardines y aislamientos representados",
                "Perfil vial",
            ],
            expected_keys: &["norte_indicado", "aislamientos_graficados", "via_acceso_principal"],
        },
        SOIL_STUDY_DOCUMENT => AnalysisProfile {
            role: "Ingeniero Geotecnista",
            focus_items: &[
                "Firma del Ingeniero Geotecnista",
                "Matrícula Profesional",
                "Capacidad Portante Admisible",
                "Nivel Freático detectado",
                "Recomendaciones de cimentación (Zapatas, Pilotes, Losa)",
            ],
            expected_keys: &[
                "nombre_ingeniero_firmante",
                "matricula_profesional",
                "capacidad_portante_valor",
                "tipo_cimentacion_sugerida",
            ],
        },
        STRUCTURAL_MEMO_DOCUMENT => AnalysisProfile {
            role: "Ingeniero Civil Estructural",
            focus_items: &[
                "Mención a norma NSR-10",
                "Sistema de Resistencia Sísmica (Pórticos, Muros)",
                "Grado de Disipación de Energía (DMO, DES)",
                "Espectro de diseño",
            ],
            expected_keys: &["norma_referencia", "sistema_estructural", "grupo_uso_edificacion"],
        },
        _ => return None,
    };

    Some(profile)
}

/// Canonical autofill targets for a source document: `(source key, form
/// field)` pairs applied when the document validates.
pub fn autofill_targets(id: &DocumentId) -> &'static [(&'static str, AutofillTarget)] {
    match id.as_str() {
        IDENTITY_DOCUMENT => &[
            ("nombre_titular", AutofillTarget::Owner),
            ("numero_documento", AutofillTarget::OwnerIdNumber),
        ],
        TITLE_DOCUMENT => &[
            ("direccion_predio", AutofillTarget::Address),
            ("matricula_inmobiliaria", AutofillTarget::RegistrationNumber),
        ],
        _ => &[],
    }
}

pub fn is_autofill_source(id: &DocumentId) -> bool {
    !autofill_targets(id).is_empty()
}

/// Regulatory parameters for an urban-planning treatment zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneProfile {
    pub treatment: &'static str,
    pub max_floors: u32,
}

const DEFAULT_ZONE: ZoneProfile = ZoneProfile {
    treatment: "Consolidación Nivel 2",
    max_floors: 6,
};

/// Fixed treatment lookup by locality. Illustrative values; localities outside
/// the table fall back to the consolidation default.
pub fn zone_profile_for(locality: &str) -> ZoneProfile {
    match locality.trim().to_ascii_lowercase().as_str() {
        "chapinero" | "usaquén" | "usaquen" => ZoneProfile {
            treatment: "Renovación Urbana",
            max_floors: 12,
        },
        "teusaquillo" | "la candelaria" => ZoneProfile {
            treatment: "Conservación",
            max_floors: 3,
        },
        "suba" | "engativá" | "engativa" | "kennedy" => ZoneProfile {
            treatment: "Consolidación Nivel 1",
            max_floors: 4,
        },
        _ => DEFAULT_ZONE,
    }
}
