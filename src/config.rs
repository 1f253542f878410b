/// Engine-wide settings, passed explicitly into the import and aggregation
/// entry points so each call (and each test) can run with its own values.
#[derive(Debug, Clone)]
pub(crate) struct EngineConfig {
    /// Currency all aggregated figures are normalized into.
    pub(crate) base_currency: String,
    /// Date formats tried in order when validating import rows.
    pub(crate) date_formats: Vec<String>,
    /// Hard cap on data rows per import file.
    pub(crate) max_import_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_currency: "EUR".into(),
            date_formats: vec![
                "%Y-%m-%d".into(),
                "%d.%m.%Y".into(),
                "%m/%d/%Y".into(),
                "%d/%m/%Y".into(),
            ],
            max_import_rows: 10_000,
        }
    }
}
