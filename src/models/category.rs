#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeveloperCategory {
    LargeGameCompany,
    IndieDeveloper,
    RegionalDeveloper,
}

impl DeveloperCategory {
    pub const ALL: [DeveloperCategory; 3] = [
        DeveloperCategory::LargeGameCompany,
        DeveloperCategory::IndieDeveloper,
        DeveloperCategory::RegionalDeveloper,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DeveloperCategory::LargeGameCompany => "Large Game Company",
            DeveloperCategory::IndieDeveloper => "Indie Developer",
            DeveloperCategory::RegionalDeveloper => "Regional Developer",
        }
    }

    /// Exact inverse of [`label`](Self::label).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.label() == label)
    }

    /// Matches a model reply against the canonical labels, ignoring case,
    /// surrounding quotes and trailing punctuation.
    pub fn from_reply(reply: &str) -> Option<Self> {
        let cleaned = reply
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '*' || c == '`')
            .trim_end_matches(|c: char| c == '.' || c == '!')
            .trim();

        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(cleaned))
    }
}

impl std::fmt::Display for DeveloperCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A successful reply from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub reply: String,
    pub category: Option<DeveloperCategory>,
}

impl Classification {
    pub fn from_reply(reply: impl Into<String>) -> Self {
        let reply = reply.into().trim().to_string();
        let category = DeveloperCategory::from_reply(&reply);
        Self { reply, category }
    }

    /// Cell text for the output table: the canonical label when recognised,
    /// the raw reply otherwise.
    pub fn cell(&self) -> &str {
        match self.category {
            Some(category) => category.label(),
            None => &self.reply,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Classified(Classification),
    Failed(String),
    Skipped,
}

impl ClassificationOutcome {
    pub fn cell(&self) -> &str {
        match self {
            ClassificationOutcome::Classified(classification) => classification.cell(),
            ClassificationOutcome::Failed(_) | ClassificationOutcome::Skipped => "",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ClassificationOutcome::Failed(_))
    }
}
