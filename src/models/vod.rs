use serde::{Deserialize, Serialize};

/// A single streaming offer scraped for a title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VodOffer {
    pub service: String,
    pub url: String,
    /// Absent for subscription and free offers
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// Response of `GET /api/vod`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VodResult {
    pub title: String,
    /// Detail page the offers were read from
    pub source_url: String,
    pub offers: Vec<VodOffer>,
}
