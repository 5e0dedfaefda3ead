use jf_core::{Archetype, Client, LocationType};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryStep {
    pub archetype: Archetype,
    #[serde(default)]
    pub client_industry_filter: Option<String>,
    #[serde(default)]
    pub client_region_filter: Option<String>,
    #[serde(default)]
    pub client_location_type_filter: Option<LocationType>,
    /// Forces the step timed or untimed; absent leaves it to chance.
    #[serde(default)]
    pub has_timed: Option<bool>,
    #[serde(default)]
    pub referral_text: Option<String>,
    pub narrative_template: String,
}

impl StoryStep {
    pub fn has_client_filter(&self) -> bool {
        self.client_industry_filter.is_some()
            || self.client_region_filter.is_some()
            || self.client_location_type_filter.is_some()
    }

    /// True when `client` passes every filter set on this step.
    pub fn matches(&self, client: &Client) -> bool {
        if let Some(industry) = &self.client_industry_filter {
            if &client.industry != industry {
                return false;
            }
        }
        if let Some(region) = &self.client_region_filter {
            if client.location.as_ref().map(|l| &l.region) != Some(region) {
                return false;
            }
        }
        if let Some(kind) = self.client_location_type_filter {
            if client.location.as_ref().map(|l| l.location_type) != Some(kind) {
                return false;
            }
        }
        true
    }

    pub fn render_narrative(&self, client_name: &str) -> String {
        self.narrative_template.replace("{client}", client_name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Storyline {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub length: usize,
    pub mission_sequence: Vec<StoryStep>,
}

impl Storyline {
    pub fn len(&self) -> usize {
        self.mission_sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mission_sequence.is_empty()
    }
}
