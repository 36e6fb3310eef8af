/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// RNC FORM OPTIONS
// =============================================================================

pub const CATEGORIES: &[&str] = &[
    "Segurança",
    "Qualidade",
    "Meio Ambiente",
    "Operação",
    "Manutenção",
    "Outros",
];

pub const SEVERITIES: &[&str] = &["Baixa", "Média", "Alta", "Crítica"];

pub const CAUSES: &[&str] = &[
    "Solda",
    "Pintura",
    "Engenharia",
    "Fornecedor",
    "Cliente",
    "Caldeiraria",
    "Usinagem",
    "Planejamento",
    "Qualidade",
    "RH",
    "Outros",
];

pub const PROCESSES: &[&str] = &[
    "Comercial",
    "Compras",
    "Planejamento",
    "Recebimento",
    "Produção",
    "Inspeção Final",
    "Segurança",
    "Meio Ambiente",
    "5S",
    "RH",
    "Outros",
];

pub const ORIGINS: &[&str] = &[
    "Pintura",
    "Orçamento",
    "Usinagem",
    "Almoxarifado",
    "Solda",
    "Montagem",
    "Cliente",
    "Expedição",
    "Preparação",
    "RH",
    "Outros",
];

/// Effectiveness assessment recorded when closing
pub const EFFECTIVENESS: &[&str] = &["A verificar", "Eficaz", "Não eficaz"];

pub const DEFAULT_EFFECTIVENESS: &str = "A verificar";

/// Word that must be typed to permanently delete an RNC
pub const DELETE_CONFIRMATION: &str = "CONFIRMAR";

// =============================================================================
// UPLOAD LIMITS
// =============================================================================

/// Maximum size of a single photo (10MB)
pub const MAX_PHOTO_SIZE: usize = 10 * 1024 * 1024;

/// Maximum number of photos per upload request
pub const MAX_PHOTOS_PER_UPLOAD: usize = 20;

/// Maximum size of the company logo (2MB)
pub const MAX_LOGO_SIZE: usize = 2 * 1024 * 1024;

/// Maximum size of an imported CSV file (5MB)
pub const MAX_CSV_SIZE: usize = 5 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Settings key holding the PDF logo
pub const LOGO_SETTING_KEY: &str = "logo";
