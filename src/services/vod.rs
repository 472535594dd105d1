/// Video-on-demand offer lookup by scraping a streaming-availability site
///
/// Flow:
/// 1. GET {base}/{country}/search?q={title} and take the first result link
/// 2. GET the detail page and read its JSON-LD block
/// 3. Flatten `potentialAction` into {service, url, price, currency} records
///
/// Best effort: no retries and no caching. A markup change upstream shows up
/// as "not found" or a scrape error.
use reqwest::{Client as HttpClient, Url};
use scraper::{Html, Selector};
use serde_json::Value;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{VodOffer, VodResult},
};

const RESULT_LINK_SELECTOR: &str = "a.title-list-row__column-header";
const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Offers whose service name contains one of these (case-insensitive) are not shown
const HIDDEN_SERVICES: &[&str] = &[
    "amazon channel",
    "apple tv channel",
    "roku premium channel",
    "with ads",
];

#[async_trait::async_trait]
pub trait VodLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> AppResult<VodResult>;
}

#[derive(Clone)]
pub struct VodScraper {
    http_client: HttpClient,
    base_url: String,
    country: String,
}

impl VodScraper {
    pub fn new(base_url: &str, country: &str) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country: country.to_string(),
        })
    }

    async fn fetch_page(&self, url: &str, query: &[(&str, &str)]) -> AppResult<String> {
        let response = self.http_client.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "VOD page request failed");
            return Err(AppError::Scrape(format!(
                "Streaming site returned status {}",
                status
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl VodLookup for VodScraper {
    async fn lookup(&self, title: &str) -> AppResult<VodResult> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("title is required".to_string()));
        }

        let search_url = format!("{}/{}/search", self.base_url, self.country);
        let search_html = self.fetch_page(&search_url, &[("q", title)]).await?;

        let detail_url = first_result_link(&search_html, &self.base_url)?.ok_or_else(|| {
            AppError::NotFound(format!("No streaming results found for \"{}\"", title))
        })?;

        let detail_html = self.fetch_page(&detail_url, &[]).await?;
        let json_ld = extract_json_ld(&detail_html)?
            .ok_or_else(|| AppError::Scrape("Detail page has no structured data".to_string()))?;

        let offers = parse_offers(&json_ld)?;

        tracing::info!(
            title = %title,
            source_url = %detail_url,
            offers = offers.len(),
            "VOD offers scraped"
        );

        Ok(VodResult {
            title: title.to_string(),
            source_url: detail_url,
            offers,
        })
    }
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| AppError::Internal(format!("Invalid selector {}: {:?}", css, e)))
}

/// Absolute URL of the first search result, if any
pub fn first_result_link(html: &str, base_url: &str) -> AppResult<Option<String>> {
    let document = Html::parse_document(html);
    let link = selector(RESULT_LINK_SELECTOR)?;

    let Some(href) = document
        .select(&link)
        .find_map(|element| element.value().attr("href"))
    else {
        return Ok(None);
    };

    let base = Url::parse(base_url)
        .map_err(|e| AppError::Internal(format!("Invalid VOD base URL: {}", e)))?;
    let absolute = base
        .join(href)
        .map_err(|e| AppError::Scrape(format!("Invalid result link {}: {}", href, e)))?;

    Ok(Some(absolute.to_string()))
}

/// Raw text of the first JSON-LD block on the page
pub fn extract_json_ld(html: &str) -> AppResult<Option<String>> {
    let document = Html::parse_document(html);
    let script = selector(JSON_LD_SELECTOR)?;

    Ok(document
        .select(&script)
        .map(|element| element.text().collect::<String>())
        .find(|text| !text.trim().is_empty()))
}

/// Parses a JSON-LD document into visible offers
pub fn parse_offers(json_ld: &str) -> AppResult<Vec<VodOffer>> {
    let document: Value = serde_json::from_str(json_ld)
        .map_err(|e| AppError::Scrape(format!("Failed to parse structured data: {}", e)))?;

    let Some(node) = find_action_node(&document) else {
        return Ok(Vec::new());
    };

    let offers = one_or_many(&node["potentialAction"])
        .into_iter()
        .flat_map(offers_from_action)
        .filter(|offer| !is_hidden(&offer.service))
        .collect();

    Ok(offers)
}

/// The node carrying `potentialAction`: the root, an array element, or an `@graph` entry
fn find_action_node(document: &Value) -> Option<&Value> {
    if document.get("potentialAction").is_some() {
        return Some(document);
    }

    let candidates: &[Value] = match document {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("@graph")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    candidates
        .iter()
        .find(|item| item.get("potentialAction").is_some())
}

fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn offers_from_action(action: &Value) -> Vec<VodOffer> {
    let Some(url) = action_url(&action["target"]) else {
        return Vec::new();
    };

    let offers = one_or_many(&action["expectsAcceptanceOf"]);
    if offers.is_empty() {
        return text(&action["provider"]["name"])
            .or_else(|| text(&action["name"]))
            .map(|service| VodOffer {
                service,
                url,
                price: None,
                currency: None,
            })
            .into_iter()
            .collect();
    }

    offers
        .into_iter()
        .filter_map(|offer| {
            let service = text(&offer["offeredBy"]["name"])
                .or_else(|| text(&offer["seller"]["name"]))
                .or_else(|| text(&action["provider"]["name"]))?;

            Some(VodOffer {
                service,
                url: url.clone(),
                price: price(&offer["price"]),
                currency: text(&offer["priceCurrency"]),
            })
        })
        .collect()
}

/// `target` is a URL string, an EntryPoint with `urlTemplate`, or a list of either
fn action_url(target: &Value) -> Option<String> {
    match target {
        Value::String(url) if !url.trim().is_empty() => Some(url.trim().to_string()),
        Value::Object(_) => text(&target["urlTemplate"]).or_else(|| text(&target["url"])),
        Value::Array(items) => items.iter().find_map(action_url),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn is_hidden(service: &str) -> bool {
    let service = service.to_lowercase();
    HIDDEN_SERVICES.iter().any(|hidden| service.contains(hidden))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <div class="title-list-row">
            <a class="title-list-row__column-header" href="/us/movie/spirited-away">Spirited Away</a>
          </div>
          <div class="title-list-row">
            <a class="title-list-row__column-header" href="/us/movie/the-boy-and-the-heron">The Boy and the Heron</a>
          </div>
        </body></html>
    "#;

    const DETAIL_JSON_LD: &str = r#"{
        "@context": "http://schema.org",
        "@type": "Movie",
        "name": "Spirited Away",
        "potentialAction": [
            {
                "@type": "WatchAction",
                "target": {"@type": "EntryPoint", "urlTemplate": "https://www.max.com/movies/spirited-away"},
                "expectsAcceptanceOf": {"@type": "Offer", "offeredBy": {"@type": "Organization", "name": "Max"}}
            },
            {
                "@type": "WatchAction",
                "target": [{"@type": "EntryPoint", "urlTemplate": "https://tv.apple.com/movie/spirited-away"}],
                "expectsAcceptanceOf": [
                    {"@type": "Offer", "price": 3.99, "priceCurrency": "USD", "offeredBy": {"name": "Apple TV"}},
                    {"@type": "Offer", "price": "14.99", "priceCurrency": "USD", "offeredBy": {"name": "Apple TV"}}
                ]
            },
            {
                "@type": "WatchAction",
                "target": "https://www.amazon.com/channels/max",
                "expectsAcceptanceOf": {"offeredBy": {"name": "Max Amazon Channel"}}
            },
            {
                "@type": "WatchAction",
                "expectsAcceptanceOf": {"offeredBy": {"name": "No Link TV"}}
            }
        ]
    }"#;

    #[test]
    fn test_first_result_link_is_absolute() {
        let link = first_result_link(SEARCH_PAGE, "https://www.justwatch.com").unwrap();
        assert_eq!(
            link.as_deref(),
            Some("https://www.justwatch.com/us/movie/spirited-away")
        );
    }

    #[test]
    fn test_first_result_link_missing() {
        let html = "<html><body><p>No results</p></body></html>";
        assert_eq!(first_result_link(html, "https://www.justwatch.com").unwrap(), None);
    }

    #[test]
    fn test_extract_json_ld() {
        let html = format!(
            r#"<html><head>
                <script type="text/javascript">var x = 1;</script>
                <script type="application/ld+json">{}</script>
            </head><body></body></html>"#,
            DETAIL_JSON_LD
        );

        let json = extract_json_ld(&html).unwrap().unwrap();
        assert!(json.contains("potentialAction"));
    }

    #[test]
    fn test_extract_json_ld_missing() {
        assert_eq!(extract_json_ld("<html></html>").unwrap(), None);
    }

    #[test]
    fn test_parse_offers_flattens_and_filters() {
        let offers = parse_offers(DETAIL_JSON_LD).unwrap();

        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].service, "Max");
        assert_eq!(offers[0].price, None);
        assert_eq!(offers[1].url, "https://tv.apple.com/movie/spirited-away");
        assert_eq!(offers[1].price, Some(3.99));
        assert_eq!(offers[1].currency.as_deref(), Some("USD"));
        assert_eq!(offers[2].price, Some(14.99));
        assert!(offers.iter().all(|o| !o.service.contains("Channel")));
    }

    #[test]
    fn test_parse_offers_invalid_json_is_scrape_error() {
        assert!(matches!(
            parse_offers("{not json"),
            Err(AppError::Scrape(_))
        ));
    }

    #[test]
    fn test_parse_offers_graph_document() {
        let json = r#"{"@graph":[{"@type":"BreadcrumbList"},{"@type":"TVSeries","potentialAction":{"target":"https://www.crunchyroll.com/series/x","provider":{"name":"Crunchyroll"}}}]}"#;
        let offers = parse_offers(json).unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].service, "Crunchyroll");
    }

    #[test]
    fn test_parse_offers_without_actions() {
        assert!(parse_offers(r#"{"@type":"Movie","name":"X"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_is_hidden_case_insensitive() {
        assert!(is_hidden("Paramount+ Amazon Channel"));
        assert!(is_hidden("Peacock Premium With Ads"));
        assert!(!is_hidden("Netflix"));
    }

    #[tokio::test]
    async fn test_lookup_rejects_blank_title() {
        let scraper = VodScraper::new("https://www.justwatch.com", "us").unwrap();
        assert!(matches!(
            scraper.lookup("  ").await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
