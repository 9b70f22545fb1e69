//! The recruiter browse/grid/table screen.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{ListError, Result};
use crate::list::ListOptions;
use crate::preferences::PreferenceStore;
use crate::query::{
    FilterField, FilterKind, FilterSet, FilterValue, ListState, SortOrder, checked_value,
};
use crate::remote::{HttpLookup, HttpTransport};
use crate::types::Identified;

pub const RECRUITERS_RESOURCE: &str = "recruiters";
pub const COMPANIES_RESOURCE: &str = "companies";

/// Related data requested alongside every recruiter page
pub const RECRUITER_INCLUDE: &str = "company";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecruiterFilters {
    pub status: Option<String>,
    pub years_experience: Option<i64>,
    pub location: Option<String>,
    pub verified: Option<bool>,
    pub skills: Vec<String>,
}

impl Default for RecruiterFilters {
    fn default() -> Self {
        Self {
            status: Some("active".to_string()),
            years_experience: None,
            location: None,
            verified: None,
            skills: Vec::new(),
        }
    }
}

impl FilterSet for RecruiterFilters {
    const FIELDS: &'static [FilterField] = &[
        FilterField::new("status", FilterKind::Text),
        FilterField::new("years_experience", FilterKind::Integer),
        FilterField::new("location", FilterKind::Text),
        FilterField::new("verified", FilterKind::Boolean),
        FilterField::new("skills", FilterKind::TextList),
    ];

    fn get(&self, key: &str) -> Option<FilterValue> {
        match key {
            "status" => self.status.clone().map(FilterValue::Text),
            "years_experience" => self.years_experience.map(FilterValue::Integer),
            "location" => self.location.clone().map(FilterValue::Text),
            "verified" => self.verified.map(FilterValue::Boolean),
            "skills" => FilterValue::TextList(self.skills.clone()).normalize(),
            _ => None,
        }
    }

    fn put(&mut self, key: &str, value: Option<FilterValue>) -> Result<()> {
        let value = checked_value::<Self>(key, value)?;
        match key {
            "status" => self.status = value.and_then(FilterValue::into_text),
            "years_experience" => self.years_experience = value.and_then(FilterValue::into_integer),
            "location" => self.location = value.and_then(FilterValue::into_text),
            "verified" => self.verified = value.and_then(FilterValue::into_boolean),
            "skills" => self.skills = value.map(FilterValue::into_text_list).unwrap_or_default(),
            _ => return Err(ListError::UnknownFilter(key.to_string())),
        }
        Ok(())
    }
}

/// Newest recruiters first, active only.
pub fn recruiter_defaults(page_size: u32) -> ListState<RecruiterFilters> {
    ListState::default()
        .with_sort("created_at", SortOrder::Desc)
        .with_page_size(page_size)
}

/// Screen options from the config, with the page size taken from the stored
/// preference when there is one.
pub fn recruiter_options(
    config: &Config,
    preferences: Option<&PreferenceStore>,
) -> ListOptions<RecruiterFilters> {
    let page_size = preferences.map_or(config.default_page_size, |p| {
        p.page_size_or(config.default_page_size)
    });
    ListOptions::from_config(config, recruiter_defaults(page_size)).with_include(RECRUITER_INCLUDE)
}

pub fn recruiter_transport(config: &Config) -> Result<HttpTransport> {
    HttpTransport::from_config(config, RECRUITERS_RESOURCE)
}

/// Company lookup sharing the recruiter transport's client and credentials
pub fn company_lookup(config: &Config, recruiters: &HttpTransport) -> Result<HttpLookup> {
    let transport = recruiters.for_resource(&config.api_base_url, COMPANIES_RESOURCE)?;
    Ok(HttpLookup::new(transport, "ids"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recruiter {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Everything else the API sends, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Recruiter {
    /// Key for the company cache
    pub fn company_key(&self) -> Option<u64> {
        self.company_id
    }
}

impl Identified for Recruiter {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identified for Company {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}
