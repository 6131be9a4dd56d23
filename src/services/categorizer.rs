use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::text::contains_term;

/// Job category assigned by keyword match.
/// Stored and serialized by display name ("Full Stack", "AI/ML", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Internship")]
    Internship,
    #[serde(rename = "Full Stack")]
    FullStack,
    #[serde(rename = "Mobile")]
    Mobile,
    #[serde(rename = "Frontend")]
    Frontend,
    #[serde(rename = "Backend")]
    Backend,
    #[serde(rename = "DevOps")]
    DevOps,
    #[serde(rename = "AI/ML")]
    AiMl,
    #[serde(rename = "Data")]
    Data,
    #[serde(rename = "Security")]
    Security,
    #[serde(rename = "Web3")]
    Web3,
    #[serde(rename = "Design")]
    Design,
    #[serde(rename = "Product")]
    Product,
    #[serde(rename = "Marketing")]
    Marketing,
    #[serde(rename = "QA")]
    Qa,
    #[serde(rename = "Other")]
    Other,
}

/// Ordered rule table: the first rule with a matching keyword wins.
/// More specific categories sit above the generic ones they overlap with
/// ("react native" before "react", "full stack" before "frontend").
const RULES: &[(Category, &[&str])] = &[
    (
        Category::Internship,
        &["intern", "interns", "internship", "internships", "summer intern", "graduate program", "apprenticeship"],
    ),
    (
        Category::FullStack,
        &["full stack", "full-stack", "fullstack", "mern", "mean stack", "t3 stack"],
    ),
    (
        Category::Mobile,
        &["react native", "ios", "android", "flutter", "mobile", "swiftui", "swift", "kotlin", "expo"],
    ),
    (
        Category::Frontend,
        &[
            "frontend", "front-end", "front end", "react", "reactjs", "react.js", "nextjs", "next.js",
            "vue", "vuejs", "angular", "svelte", "tailwind", "css", "html",
        ],
    ),
    (
        Category::Backend,
        &[
            "backend", "back-end", "back end", "node.js", "nodejs", "express", "django", "fastapi",
            "flask", "golang", "rust", "java", "spring boot", "rails", "laravel", "php", "microservices",
            "api",
        ],
    ),
    (
        Category::DevOps,
        &[
            "devops", "sre", "site reliability", "kubernetes", "k8s", "terraform", "cloud engineer",
            "platform engineer", "infrastructure", "aws", "gcp", "azure",
        ],
    ),
    (
        Category::AiMl,
        &[
            "machine learning", "ml engineer", "ai engineer", "llm", "llms", "deep learning", "nlp",
            "computer vision", "genai", "generative ai", "mlops", "ai",
        ],
    ),
    (
        Category::Data,
        &[
            "data scientist", "data science", "data engineer", "data analyst", "analytics", "sql",
            "etl", "power bi", "tableau", "data",
        ],
    ),
    (
        Category::Security,
        &[
            "security engineer", "cybersecurity", "cyber security", "pentest", "pentester",
            "penetration tester", "appsec", "infosec", "soc analyst",
        ],
    ),
    (
        Category::Web3,
        &["web3", "blockchain", "solidity", "smart contract", "smart contracts", "defi", "crypto", "nft"],
    ),
    (
        Category::Design,
        &["designer", "ui/ux", "ux", "ui", "figma", "product design", "graphic design"],
    ),
    (
        Category::Product,
        &["product manager", "product owner", "program manager", "project manager", "product lead"],
    ),
    (
        Category::Marketing,
        &[
            "marketing", "growth", "seo", "content writer", "copywriter", "social media manager",
            "community manager", "devrel", "developer advocate",
        ],
    ),
    (
        Category::Qa,
        &["qa", "quality assurance", "test engineer", "sdet", "automation tester", "tester"],
    ),
];

impl Category {
    /// Categories the ingestion job searches for (everything but `Other`)
    pub const ALL: [Category; 14] = [
        Category::Internship,
        Category::FullStack,
        Category::Mobile,
        Category::Frontend,
        Category::Backend,
        Category::DevOps,
        Category::AiMl,
        Category::Data,
        Category::Security,
        Category::Web3,
        Category::Design,
        Category::Product,
        Category::Marketing,
        Category::Qa,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Internship => "Internship",
            Category::FullStack => "Full Stack",
            Category::Mobile => "Mobile",
            Category::Frontend => "Frontend",
            Category::Backend => "Backend",
            Category::DevOps => "DevOps",
            Category::AiMl => "AI/ML",
            Category::Data => "Data",
            Category::Security => "Security",
            Category::Web3 => "Web3",
            Category::Design => "Design",
            Category::Product => "Product",
            Category::Marketing => "Marketing",
            Category::Qa => "QA",
            Category::Other => "Other",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Internship => "internship",
            Category::FullStack => "full-stack",
            Category::Mobile => "mobile",
            Category::Frontend => "frontend",
            Category::Backend => "backend",
            Category::DevOps => "devops",
            Category::AiMl => "ai-ml",
            Category::Data => "data",
            Category::Security => "security",
            Category::Web3 => "web3",
            Category::Design => "design",
            Category::Product => "product",
            Category::Marketing => "marketing",
            Category::Qa => "qa",
            Category::Other => "other",
        }
    }

    /// Search phrase sent to the external search API
    pub fn search_query(&self) -> &'static str {
        match self {
            Category::Internship => "hiring intern developer",
            Category::FullStack => "hiring full stack developer",
            Category::Mobile => "hiring mobile developer",
            Category::Frontend => "hiring frontend developer",
            Category::Backend => "hiring backend engineer",
            Category::DevOps => "hiring devops engineer",
            Category::AiMl => "hiring machine learning engineer",
            Category::Data => "hiring data engineer",
            Category::Security => "hiring security engineer",
            Category::Web3 => "hiring web3 developer",
            Category::Design => "hiring product designer",
            Category::Product => "hiring product manager",
            Category::Marketing => "hiring marketing",
            Category::Qa => "hiring qa engineer",
            Category::Other => "we are hiring",
        }
    }

    /// Keywords that put a text in this category
    pub fn keywords(&self) -> &'static [&'static str] {
        RULES
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts display names or slugs, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .chain(std::iter::once(&Category::Other))
            .find(|c| c.slug() == wanted || c.display_name().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Assigns a category to free text. Best effort: `Other` when nothing matches.
pub fn categorize(text: &str) -> Category {
    let lowered = text.to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| contains_term(&lowered, kw)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_categories() {
        assert_eq!(categorize("We're hiring a Senior Backend Engineer (Go)"), Category::Backend);
        assert_eq!(categorize("Looking for a React developer"), Category::Frontend);
        assert_eq!(categorize("Hiring: DevOps / SRE with Kubernetes"), Category::DevOps);
        assert_eq!(categorize("Product Designer wanted, Figma pros"), Category::Design);
        assert_eq!(categorize("Seeking a Solidity dev for our DeFi protocol"), Category::Web3);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(categorize("Full Stack engineer: React frontend + Node backend"), Category::FullStack);
        assert_eq!(categorize("React Native developer for our app"), Category::Mobile);
        assert_eq!(categorize("Backend internship, Rust"), Category::Internship);
    }

    #[test]
    fn test_word_boundaries() {
        // "java" must not fire on "javascript", "ui" not on "build"
        assert_eq!(categorize("javascript wizard needed"), Category::Other);
        assert_eq!(categorize("help us build the future"), Category::Other);
        assert_eq!(categorize("International sales role"), Category::Other);
    }

    #[test]
    fn test_nothing_matches() {
        assert_eq!(categorize(""), Category::Other);
        assert_eq!(categorize("Good morning everyone"), Category::Other);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("full-stack".parse::<Category>().unwrap(), Category::FullStack);
        assert_eq!("AI/ML".parse::<Category>().unwrap(), Category::AiMl);
        assert_eq!("qa".parse::<Category>().unwrap(), Category::Qa);
        assert_eq!("other".parse::<Category>().unwrap(), Category::Other);
        assert!("astronaut".parse::<Category>().is_err());
        assert_eq!(Category::FullStack.to_string(), "Full Stack");
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&Category::AiMl).unwrap();
        assert_eq!(json, "\"AI/ML\"");
        let back: Category = serde_json::from_str("\"Full Stack\"").unwrap();
        assert_eq!(back, Category::FullStack);
    }

    #[test]
    fn test_every_ingestible_category_has_rules() {
        for category in Category::ALL {
            assert!(!category.keywords().is_empty(), "{} has no keywords", category);
        }
        assert!(Category::Other.keywords().is_empty());
    }
}
