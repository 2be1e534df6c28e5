use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every notice the organizer can send to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    TrayOpened,
    TrayEmpty,
    OrganizeStarted,
    SearchContainers,
    NoContainers,
    ContainersFound,
    OrganizingProgress,
    OrganizeComplete,
    ItemsOrganized,
    ItemsRemaining,
    AllItemsOrganized,
    ItemsDropped,
    ErrorOccurred,
}

impl MessageKey {
    pub const ALL: [MessageKey; 13] = [
        MessageKey::TrayOpened,
        MessageKey::TrayEmpty,
        MessageKey::OrganizeStarted,
        MessageKey::SearchContainers,
        MessageKey::NoContainers,
        MessageKey::ContainersFound,
        MessageKey::OrganizingProgress,
        MessageKey::OrganizeComplete,
        MessageKey::ItemsOrganized,
        MessageKey::ItemsRemaining,
        MessageKey::AllItemsOrganized,
        MessageKey::ItemsDropped,
        MessageKey::ErrorOccurred,
    ];

    pub const fn default_template(self) -> &'static str {
        match self {
            MessageKey::TrayOpened => {
                "Put the items to sort into the tray; sorting starts when you close it."
            }
            MessageKey::TrayEmpty => "No items to sort were found in the tray.",
            MessageKey::OrganizeStarted => "Sorting your items...",
            MessageKey::SearchContainers => {
                "Searching nearby containers (about {estimated_ticks} ticks)..."
            }
            MessageKey::NoContainers => "No containers found nearby; your items were returned.",
            MessageKey::ContainersFound => "Found {count} containers.",
            MessageKey::OrganizingProgress => "Sorting: {progress}% ({current}/{total})",
            MessageKey::OrganizeComplete => "Sorting complete.",
            MessageKey::ItemsOrganized => "{count} stacks were put away.",
            MessageKey::ItemsRemaining => "{count} stacks had no matching container and were returned.",
            MessageKey::AllItemsOrganized => "Every item found a home.",
            MessageKey::ItemsDropped => "Your inventory is full; some items were dropped at your feet.",
            MessageKey::ErrorOccurred => "Sorting failed; your items were returned.",
        }
    }
}

/// Message templates with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    templates: BTreeMap<MessageKey, String>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            templates: MessageKey::ALL
                .iter()
                .map(|key| (*key, key.default_template().to_string()))
                .collect(),
        }
    }
}

impl Messages {
    /// Defaults with the given keys replaced.
    pub fn with_overrides(overrides: &BTreeMap<MessageKey, String>) -> Self {
        let mut messages = Self::default();
        for (key, template) in overrides {
            messages.templates.insert(*key, template.clone());
        }
        messages
    }

    pub fn template(&self, key: MessageKey) -> &str {
        self.templates
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_template())
    }

    /// Fills `{name}` placeholders. Unknown placeholders stay as written.
    pub fn render(&self, key: MessageKey, args: &[(&str, String)]) -> String {
        let mut text = self.template(key).to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        text
    }

    pub fn plain(&self, key: MessageKey) -> String {
        self.render(key, &[])
    }
}
