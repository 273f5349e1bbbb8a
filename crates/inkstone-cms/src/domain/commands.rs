//! Commands for the Pages context.
//!
//! All page mutations run inside a transaction boundary when one is
//! configured on the command bus.

use inkstone_core::command::Command;
use uuid::Uuid;

/// Creates a new page in draft status.
#[derive(Debug, Clone)]
pub struct CreatePage {
    /// The id the new page aggregate will use.
    pub page_id: Uuid,
    /// The page name.
    pub name: String,
    /// The page slug.
    pub slug: String,
}

impl Command for CreatePage {
    fn command_type(&self) -> &'static str {
        "cms.page.create"
    }

    fn transactional(&self) -> bool {
        true
    }
}

/// Publishes a draft page.
#[derive(Debug, Clone)]
pub struct PublishPage {
    /// The page to publish.
    pub page_id: Uuid,
}

impl Command for PublishPage {
    fn command_type(&self) -> &'static str {
        "cms.page.publish"
    }

    fn transactional(&self) -> bool {
        true
    }
}

/// Renames a page.
#[derive(Debug, Clone)]
pub struct RenamePage {
    /// The page to rename.
    pub page_id: Uuid,
    /// The new name.
    pub new_name: String,
}

impl Command for RenamePage {
    fn command_type(&self) -> &'static str {
        "cms.page.rename"
    }

    fn transactional(&self) -> bool {
        true
    }
}

/// Marks a page deleted.
#[derive(Debug, Clone)]
pub struct DeletePage {
    /// The page to delete.
    pub page_id: Uuid,
}

impl Command for DeletePage {
    fn command_type(&self) -> &'static str {
        "cms.page.delete"
    }

    fn transactional(&self) -> bool {
        true
    }
}
