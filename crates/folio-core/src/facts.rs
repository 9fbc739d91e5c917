//! Static contact and profile facts about the portfolio owner.
//!
//! Every lookup is a pure function of the configured values. A missing link
//! produces an explicit "not available" sentence rather than an error, so the
//! reasoning model can relay the absence instead of inventing a link.

use serde::Serialize;

/// Owner facts, read once from configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FactStore {
    pub name: String,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,
    pub scheduling_url: Option<String>,
}

impl FactStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_linkedin(mut self, url: impl Into<String>) -> Self {
        self.linkedin_url = Some(url.into());
        self
    }

    pub fn with_resume(mut self, url: impl Into<String>) -> Self {
        self.resume_url = Some(url.into());
        self
    }

    pub fn with_scheduling(mut self, url: impl Into<String>) -> Self {
        self.scheduling_url = Some(url.into());
        self
    }

    /// Name plus every configured link, one per line.
    pub fn personal_info(&self) -> String {
        let mut lines = vec![format!("**Name:** {}", self.name)];
        if let Some(url) = &self.linkedin_url {
            lines.push(format!("**LinkedIn:** {}", url));
        }
        if let Some(url) = &self.scheduling_url {
            lines.push(format!("**Schedule a Meeting:** {}", url));
        }
        if let Some(url) = &self.resume_url {
            lines.push(format!("**Resume:** {}", url));
        }
        lines.join("\n")
    }

    pub fn scheduling_link(&self) -> String {
        match &self.scheduling_url {
            Some(url) => format!(
                "You can schedule a meeting with {} using this Calendly link: {}",
                self.name, url
            ),
            None => "Sorry, the scheduling link is not available at the moment.".to_string(),
        }
    }

    pub fn linkedin_link(&self) -> String {
        match &self.linkedin_url {
            Some(url) => format!("Here is {}'s LinkedIn profile: {}", self.name, url),
            None => "Sorry, the LinkedIn profile is not available.".to_string(),
        }
    }

    pub fn resume_link(&self) -> String {
        match &self.resume_url {
            Some(url) => format!("Here is {}'s resume: {}", self.name, url),
            None => "Sorry, the resume link is not available at the moment.".to_string(),
        }
    }
}
