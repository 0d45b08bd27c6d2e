use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection parameters of the database a change feed reads from.
///
/// Forwarded opaquely from configuration; the bridge never opens this
/// connection itself.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConnection {
    pub driver: Option<String>,
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A running stream of rows from `query` into the `type_name` index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFeed {
    /// Feed name, unique per engine. One feed per index type.
    pub name: String,
    pub type_name: String,
    pub query: String,
    pub database: DatabaseConnection,
}

impl ChangeFeed {
    pub fn new(
        type_name: impl Into<String>,
        query: impl Into<String>,
        database: DatabaseConnection,
    ) -> Self {
        let type_name = type_name.into();
        Self {
            name: Self::name_for(&type_name),
            type_name,
            query: query.into(),
            database,
        }
    }

    /// The feed name used for an index type.
    pub fn name_for(type_name: &str) -> String {
        format!("{type_name}_river")
    }
}
