//! Keyword rules
//!
//! A rule fires when the lowercased message contains one of its keywords as
//! a whole word (or phrase), so "mission" does not fire on "transmission"
//! and "yo" does not fire on "you". Rules are checked in order and the
//! first match wins.

use crate::errors::ResponderError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub keywords: Vec<String>,
    pub reply: String,
}

impl Rule {
    pub fn new(name: &str, keywords: &[&str], reply: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            reply: reply.to_string(),
        }
    }

    /// `message` must already be lowercased
    pub fn matches(&self, message: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| contains_word(message, keyword))
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    let is_boundary = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());

    haystack.match_indices(needle).any(|(start, matched)| {
        is_boundary(haystack[..start].chars().next_back())
            && is_boundary(haystack[start + matched.len()..].chars().next())
    })
}

/// Ordered list of rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// First rule matching the lowercased message
    pub fn first_match(&self, message: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(message))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Parse a JSON array of `{name, keywords, reply}` objects.
    ///
    /// `origin` only labels errors. Keywords are lowercased; empty keywords
    /// are rejected since they would match every message.
    pub fn from_json(bytes: &[u8], origin: &str) -> Result<Self, ResponderError> {
        let invalid = |message: String| ResponderError::InvalidRules {
            path: origin.to_string(),
            message,
        };

        let mut rules: Vec<Rule> =
            serde_json::from_slice(bytes).map_err(|e| invalid(e.to_string()))?;

        for rule in &mut rules {
            if rule.keywords.is_empty() {
                return Err(invalid(format!("rule '{}' has no keywords", rule.name)));
            }
            for keyword in &mut rule.keywords {
                *keyword = keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(invalid(format!("rule '{}' has an empty keyword", rule.name)));
                }
            }
        }

        Ok(Self { rules })
    }

    /// Load rules from a JSON file
    pub async fn load(path: &Path) -> Result<Self, ResponderError> {
        let bytes = tokio::fs::read(path).await?;
        let rules = Self::from_json(&bytes, &path.display().to_string())?;
        info!(path = %path.display(), rules = rules.len(), "Loaded chat rules");
        Ok(rules)
    }
}

impl Default for RuleSet {
    /// The site's built-in intents, highest priority first
    fn default() -> Self {
        Self::new(vec![
            Rule::new(
                "greeting",
                &[
                    "hi", "hii", "hello", "hey", "yo", "hola", "vanakkam",
                    "good morning", "good evening", "good afternoon",
                ],
                "Hello there! 👋 Always happy to help. Ask me anything about our services, \
                 projects, company profile, or EPC capabilities!",
            ),
            Rule::new(
                "about",
                &["about", "story", "company", "who are you"],
                "Ayyappan & Co was founded in 2009 and has grown into one of India’s trusted \
                 power infrastructure companies — over 100+ completed projects, 500+ skilled \
                 technicians, and 14+ years of engineering excellence. We power progress with \
                 quality, safety, and reliability. ⚡",
            ),
            Rule::new(
                "vision",
                &["vision"],
                "Our Vision: To be India’s most trusted and innovative power infrastructure \
                 company — built on engineering excellence and sustainable practices.",
            ),
            Rule::new(
                "mission",
                &["mission"],
                "Our Mission: Deliver world-class transmission and distribution infrastructure \
                 with safety, innovation, and client-first execution.",
            ),
            Rule::new(
                "values",
                &["value", "values"],
                "Our core values are Quality, Safety, Excellence, and Integrity — these guide \
                 every project and every decision.",
            ),
            Rule::new(
                "services",
                &["service", "services"],
                "Our services include:\n• Transmission Line EPC up to 800 kV\n• Distribution \
                 Network EPC\n• AIS & GIS Substation Construction\n• Last-mile rural & urban \
                 electrification\n• Turnkey power infrastructure execution\nNeed details on any one? 😊",
            ),
            Rule::new(
                "transmission",
                &["transmission"],
                "We execute high-voltage Transmission Line projects up to 800kV — survey, \
                 foundations, tower erection, and stringing. Our team excels in all terrains \
                 and climates.",
            ),
            Rule::new(
                "distribution",
                &["distribution"],
                "We develop large-scale distribution networks, including rural electrification \
                 and urban power upgrades with TNEB and other utilities.",
            ),
            Rule::new(
                "substation",
                &["substation", "substations"],
                "We execute AIS & GIS Extra High Voltage substations on a turnkey EPC basis — \
                 design, procurement, construction, testing & commissioning.",
            ),
            Rule::new(
                "projects",
                &["project", "projects", "experience"],
                "We’ve completed 100+ Transmission and Distribution projects across Tamil Nadu, \
                 Kerala, AP, and Karnataka — 400kV, 230kV, 110kV lines, substations, and rural \
                 electrification works.",
            ),
            Rule::new(
                "contact",
                &["contact", "reach"],
                "You can always reach us via the Contact page or email at \
                 **info@ayyappanco.com**. Our team will get back to you quickly! 📩",
            ),
            Rule::new(
                "location",
                &["location", "where"],
                "We operate pan-India, especially across Tamil Nadu, Kerala, Andhra Pradesh, \
                 and Karnataka. Wherever the grid goes, we follow. ⚡🌍",
            ),
            Rule::new(
                "brochure",
                &["pdf", "brochure", "profile"],
                "You can download our full Company Profile PDF from the Homepage — it includes \
                 services, project history, credentials, and capabilities.",
            ),
        ])
    }
}
