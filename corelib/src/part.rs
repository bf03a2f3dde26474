/// Catalog entry. Value-equal by `id`; immutable once created.
#[derive(Clone, Debug, Eq, serde::Serialize, serde::Deserialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Part {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

impl PartialEq for Part {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::hash::Hash for Part {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
