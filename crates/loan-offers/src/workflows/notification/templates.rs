use std::fs;
use std::io;
use std::path::PathBuf;

use super::dispatcher::NotificationError;

/// Fixed tier key to template file mapping.
pub const TEMPLATE_MAP: [(&str, &str); 3] = [
    ("vip_promo", "vip_promo.html"),
    ("standard", "standard.html"),
    ("high_recall", "high_recall.html"),
];

const RECIPIENT_PLACEHOLDER: &str = "{{recipient_name}}";

/// Directory of static HTML offer templates.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    root: PathBuf,
}

impl TemplateCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn template_name(tier: &str) -> Result<&'static str, NotificationError> {
        TEMPLATE_MAP
            .iter()
            .find(|(key, _)| *key == tier)
            .map(|(_, file)| *file)
            .ok_or_else(|| NotificationError::UnknownTier {
                tier: tier.to_string(),
                expected: TEMPLATE_MAP.iter().map(|(key, _)| *key).collect(),
            })
    }

    pub fn path_for(&self, tier: &str) -> Result<PathBuf, NotificationError> {
        Ok(self.root.join(Self::template_name(tier)?))
    }

    pub fn load(&self, tier: &str) -> Result<String, NotificationError> {
        let path = self.path_for(tier)?;
        fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => NotificationError::TemplateNotFound { path },
            _ => NotificationError::TemplateUnreadable { path, source },
        })
    }
}

/// Fills the recipient placeholder; templates without one are returned unchanged.
pub fn render(template: &str, recipient_name: &str) -> String {
    if !template.contains(RECIPIENT_PLACEHOLDER) {
        return template.to_string();
    }
    template.replace(RECIPIENT_PLACEHOLDER, &escape_html(recipient_name.trim()))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
