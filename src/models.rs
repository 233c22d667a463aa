use serde::Deserialize;

/// Identifying fields shared by every input file. Value columns differ per
/// dataset and are read positionally next to this record.
#[derive(Debug, Deserialize)]
pub(crate) struct KeyRecord {
    #[serde(rename = "Entity")]
    pub(crate) entity: String,

    // Empty cell or absent column both read as `None`.
    #[serde(rename = "Code")]
    pub(crate) code: Option<String>,

    #[serde(rename = "Year")]
    pub(crate) year: i32,
}

impl KeyRecord {
    /// Aggregates such as "Europe" or "World" carry no country code.
    pub(crate) fn is_country(&self) -> bool {
        self.code.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}
