use serde::{Deserialize, Serialize};

/// One structured perfume suggestion returned by the external model.
///
/// Immutable once parsed: a new query always replaces the whole result set,
/// nothing is edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfumeRecommendation {
    /// Full English name of the perfume
    pub name: String,
    /// Full English brand name
    pub brand: String,
    /// 3-4 key scent notes in display order (Persian)
    pub scent_profile: Vec<String>,
    /// Poetic Persian paragraph; key notes wrapped in `**...**`
    pub story: String,
    /// Direct product image URL found by the model; unchecked, may be dead
    pub image_url: String,
}

/// Number of recommendations every successful call must contain.
pub const RECOMMENDATION_COUNT: usize = 3;

impl PerfumeRecommendation {
    /// Checks the parsed record against the response schema's required fields.
    ///
    /// The schema marks every field as required, so a blank string here means
    /// the model violated the contract and the whole payload is rejected.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.brand.trim().is_empty()
            && !self.scent_profile.is_empty()
            && self.scent_profile.iter().all(|note| !note.trim().is_empty())
            && !self.story.trim().is_empty()
            && !self.image_url.trim().is_empty()
    }
}
