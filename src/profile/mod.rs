use serde::{Deserialize, Serialize};

use crate::errors::OnboardingError;

/// The business description entered at onboarding. Requests take an owned
/// clone, so nothing done to the session afterwards reaches a request that is
/// already running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub website_url: String,
    pub business_name: String,
    pub industry: String,
    pub location: String,
    pub primary_keywords: String,
    pub competitors: String,
}

impl Profile {
    /// Form-level check for leaving onboarding. Only url and name are required.
    pub fn validate(&self) -> Result<(), OnboardingError> {
        if self.website_url.trim().is_empty() {
            return Err(OnboardingError::MissingUrl);
        }
        if self.business_name.trim().is_empty() {
            return Err(OnboardingError::MissingName);
        }
        Ok(())
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Profile {
        Profile {
            website_url: self.website_url.trim().to_string(),
            business_name: self.business_name.trim().to_string(),
            industry: self.industry.trim().to_string(),
            location: self.location.trim().to_string(),
            primary_keywords: self.primary_keywords.trim().to_string(),
            competitors: self.competitors.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn url_and_name_are_required() {
        let mut p = Profile::default();
        assert_eq!(p.validate(), Err(OnboardingError::MissingUrl));
        p.website_url = "https://acme.test".into();
        assert_eq!(p.validate(), Err(OnboardingError::MissingName));
        p.business_name = "   ".into();
        assert_eq!(p.validate(), Err(OnboardingError::MissingName));
        p.business_name = "Acme".into();
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn trimmed_strips_every_field() {
        let p = Profile {
            website_url: " https://acme.test ".into(),
            business_name: "Acme\n".into(),
            industry: "\tRetail".into(),
            location: " Austin".into(),
            primary_keywords: "shoe repair ".into(),
            competitors: "  ".into(),
        };
        let t = p.trimmed();
        assert_eq!(t.website_url, "https://acme.test");
        assert_eq!(t.business_name, "Acme");
        assert_eq!(t.industry, "Retail");
        assert_eq!(t.location, "Austin");
        assert_eq!(t.primary_keywords, "shoe repair");
        assert_eq!(t.competitors, "");
    }
}
