use serde::Serialize;
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which renderer a model is meant for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Display, AsRefStr, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    View,
    Json,
}

/// A template name, its variables and nested child models.
///
/// Children are rendered first and captured into the parent's variables
/// under their `capture_to` name (`content` by default).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    template: String,
    variables: Map<String, Value>,
    children: Vec<ViewModel>,
    capture_to: String,
    terminal: bool,
    kind: ModelKind,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewModel {
    pub fn new() -> Self {
        Self {
            template: String::new(),
            variables: Map::new(),
            children: Vec::new(),
            capture_to: "content".to_string(),
            terminal: false,
            kind: ModelKind::View,
        }
    }

    /// A JSON model; terminal, so it replaces the layout instead of nesting in it.
    pub fn json() -> Self {
        Self::of_kind(ModelKind::Json)
    }

    pub fn of_kind(kind: ModelKind) -> Self {
        let mut model = Self::new();
        model.kind = kind;
        model.terminal = kind == ModelKind::Json;
        model
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_variable(name, value);
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
    }

    pub fn has_template(&self) -> bool {
        !self.template.is_empty()
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn add_child(&mut self, child: ViewModel) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[ViewModel] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    pub fn capture_to(&self) -> &str {
        &self.capture_to
    }

    pub fn set_capture_to(&mut self, capture_to: impl Into<String>) {
        self.capture_to = capture_to.into();
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn set_terminal(&mut self, terminal: bool) {
        self.terminal = terminal;
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }
}
