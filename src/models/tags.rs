use serde::{Deserialize, Serialize};

/// Ordered set of normalized labels (trimmed, lower-cased, unique, insertion order kept).
///
/// Storage keeps these as a single comma-joined column; splitting and joining
/// only happens at the repository boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a comma-joined list such as `"Early-Exit, greed,,early-exit"`.
    pub fn parse(raw: &str) -> Self {
        raw.split(',').collect()
    }

    /// Returns false when the label is blank or already present.
    pub fn insert(&mut self, label: &str) -> bool {
        let label = label.trim().to_lowercase();
        if label.is_empty() || self.0.contains(&label) {
            return false;
        }
        self.0.push(label);
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        let label = label.trim().to_lowercase();
        self.0.iter().any(|l| *l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_storage(&self) -> String {
        self.0.join(",")
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for label in iter {
            set.insert(label.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for TagSet {
    fn from(labels: Vec<String>) -> Self {
        labels.into_iter().collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistakeTag {
    pub id: i64,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionTag {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub category: String,
    pub usage_count: i64,
}

/// Category assigned to an emotion label the first time it is used.
pub fn emotion_category(label: &str) -> &'static str {
    match label {
        "calm" | "confident" | "focused" | "patient" | "disciplined" => "positive",
        "fearful" | "anxious" | "greedy" | "overconfident" | "fomo" | "revenge" | "impatient"
        | "frustrated" => "negative",
        _ => "custom",
    }
}
