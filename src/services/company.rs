// src/services/company.rs
use async_trait::async_trait;
use log::info;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::providers::CompanyProvider;
use crate::error::{InsightsError, Result};
use crate::models::{CompanyMetrics, CompanyProfile};

const PROVIDER: &str = "clearbit";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetrics {
    employees: Option<u64>,
    market_cap: Option<f64>,
    annual_revenue: Option<f64>,
    raised: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCompany {
    name: Option<String>,
    domain: Option<String>,
    description: Option<String>,
    logo: Option<String>,
    location: Option<String>,
    #[serde(default)]
    metrics: RawMetrics,
}

/// `15e9` -> `$15B`, `2.5e9` -> `$2.5B`.
pub fn format_usd(amount: f64) -> String {
    let (scaled, suffix) = if amount.abs() >= 1e12 {
        (amount / 1e12, "T")
    } else if amount.abs() >= 1e9 {
        (amount / 1e9, "B")
    } else if amount.abs() >= 1e6 {
        (amount / 1e6, "M")
    } else if amount.abs() >= 1e3 {
        (amount / 1e3, "K")
    } else {
        (amount, "")
    };
    let rounded = (scaled * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("${}{}", rounded as i64, suffix)
    } else {
        format!("${:.1}{}", rounded, suffix)
    }
}

fn into_profile(raw: RawCompany, requested_domain: &str) -> CompanyProfile {
    CompanyProfile {
        company_name: raw.name.unwrap_or_else(|| requested_domain.to_string()),
        domain: raw.domain.unwrap_or_else(|| requested_domain.to_string()),
        description: raw.description,
        logo: raw.logo,
        location: raw.location,
        metrics: CompanyMetrics {
            employees: raw.metrics.employees,
            market_cap: raw.metrics.market_cap.map(format_usd),
            annual_revenue: raw.metrics.annual_revenue.map(format_usd),
            raised: raw.metrics.raised.map(format_usd),
        },
    }
}

pub struct ClearbitProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ClearbitProvider {
    pub fn new(client: Client, api_key: String) -> Self {
        ClearbitProvider {
            client,
            api_key,
            base_url: "https://company.clearbit.com".to_string(),
        }
    }
}

#[async_trait]
impl CompanyProvider for ClearbitProvider {
    async fn fetch_company(&self, domain: &str) -> Result<CompanyProfile> {
        let url = format!("{}/v2/companies/find", self.base_url);
        info!("Fetching company profile for {}", domain);

        let response = self
            .client
            .get(&url)
            .query(&[("domain", domain)])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| InsightsError::provider(PROVIDER, e))?;

        // 202 means the lookup was queued and has nothing to return yet
        if response.status() == StatusCode::ACCEPTED {
            return Err(InsightsError::provider(PROVIDER, format!("lookup for {} still pending", domain)));
        }

        let raw = response
            .error_for_status()
            .map_err(|e| InsightsError::provider(PROVIDER, e))?
            .json::<RawCompany>()
            .await
            .map_err(|e| InsightsError::provider(PROVIDER, e))?;

        Ok(into_profile(raw, domain))
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

pub struct MockCompanyProvider;

#[async_trait]
impl CompanyProvider for MockCompanyProvider {
    async fn fetch_company(&self, domain: &str) -> Result<CompanyProfile> {
        info!("Returning mock company profile for {}", domain);
        Ok(CompanyProfile {
            company_name: "Innovate Inc.".into(),
            domain: "innovateinc.com".into(),
            description: Some(
                "Innovate Inc. is a leading provider of cutting-edge technology solutions, \
                 specializing in AI-driven analytics and cloud computing services."
                    .into(),
            ),
            logo: Some("https://picsum.photos/seed/innovate/100/100".into()),
            location: Some("San Francisco, CA".into()),
            metrics: CompanyMetrics {
                employees: Some(1200),
                market_cap: Some("$15B".into()),
                annual_revenue: Some("$2.5B".into()),
                raised: Some("$500M".into()),
            },
        })
    }

    fn name(&self) -> &'static str {
        "mock-company"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_amounts_with_suffix() {
        assert_eq!(format_usd(15e9), "$15B");
        assert_eq!(format_usd(2.5e9), "$2.5B");
        assert_eq!(format_usd(500e6), "$500M");
        assert_eq!(format_usd(1.2e12), "$1.2T");
        assert_eq!(format_usd(950.0), "$950");
    }

    #[test]
    fn raw_company_narrows_to_profile() {
        let raw: RawCompany = serde_json::from_value(serde_json::json!({
            "name": "Innovate Inc.",
            "domain": "innovateinc.com",
            "description": null,
            "logo": "https://logo.example/innovate.png",
            "location": "San Francisco, CA",
            "metrics": { "employees": 1200, "marketCap": 15000000000.0, "annualRevenue": null, "raised": 500000000 }
        }))
        .unwrap();

        let profile = into_profile(raw, "innovateinc.com");
        assert_eq!(profile.company_name, "Innovate Inc.");
        assert_eq!(profile.metrics.employees, Some(1200));
        assert_eq!(profile.metrics.market_cap.as_deref(), Some("$15B"));
        assert_eq!(profile.metrics.annual_revenue, None);
        assert_eq!(profile.metrics.raised.as_deref(), Some("$500M"));
    }

    #[test]
    fn missing_fields_fall_back_to_requested_domain() {
        let raw: RawCompany = serde_json::from_value(serde_json::json!({})).unwrap();
        let profile = into_profile(raw, "acme.io");
        assert_eq!(profile.company_name, "acme.io");
        assert_eq!(profile.domain, "acme.io");
        assert_eq!(profile.metrics, CompanyMetrics::default());
    }
}
