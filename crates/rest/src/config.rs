//! Server configuration for the Docket REST API.
//!
//! This module provides configuration types for the REST server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DOCKET_SERVER_PORT` | 8080 | Server port |
//! | `DOCKET_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `DOCKET_LOG_LEVEL` | info | Log level |
//! | `DOCKET_INSTANCE_DIR` | ./instance | Instance-local state directory |
//! | `DOCKET_DATABASE_URL` | `<instance>/docket.db` | SQLite path or `:memory:` |
//! | `DOCKET_INDEX_NAME` | records-record-v1.0.0 | Default search index |
//! | `DOCKET_BASE_URL` | http://localhost:8080 | Base URL for links |
//! | `DOCKET_MAX_BODY_SIZE` | 10485760 | Max request body (bytes) |
//! | `DOCKET_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `DOCKET_ENABLE_CORS` | true | Enable CORS |
//! | `DOCKET_CORS_ORIGINS` | * | Allowed origins |
//! | `DOCKET_DEFAULT_PAGE_SIZE` | 10 | Default search page size |
//! | `DOCKET_MAX_PAGE_SIZE` | 100 | Maximum search page size |
//! | `DOCKET_PERMISSION_CREATE` | allow | Permission check for create |
//! | `DOCKET_PERMISSION_READ` | allow | Permission check for read |
//! | `DOCKET_PERMISSION_UPDATE` | allow | Permission check for update |
//! | `DOCKET_PERMISSION_DELETE` | allow | Permission check for delete |
//! | `DOCKET_PERMISSION_SEARCH` | allow | Permission check for search |
//!
//! # Example
//!
//! ```rust
//! use docket_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use docket_persistence::types::{SortDirective, SortField};

/// Outcome of a per-verb permission check.
///
/// The default everywhere is [`Allow`](PermissionCheck::Allow) - the
/// no-check policy. [`Deny`](PermissionCheck::Deny) turns the verb off
/// entirely (HTTP 403).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionCheck {
    /// The verb is allowed for every caller.
    Allow,
    /// The verb is rejected for every caller.
    Deny,
}

/// A REST verb subject to permission checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `POST /records`
    Create,
    /// `GET /records/{pid}`
    Read,
    /// `PUT /records/{pid}`
    Update,
    /// `DELETE /records/{pid}`
    Delete,
    /// `GET /records` and `GET /records/_suggest`
    Search,
}

impl Verb {
    /// Returns the verb's lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Delete => "delete",
            Verb::Search => "search",
        }
    }
}

/// The per-verb permission policy assembled from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PermissionPolicy {
    create: PermissionCheck,
    read: PermissionCheck,
    update: PermissionCheck,
    delete: PermissionCheck,
    search: PermissionCheck,
}

impl PermissionPolicy {
    /// Returns `true` if the policy allows the verb.
    pub fn allows(&self, verb: Verb) -> bool {
        let check = match verb {
            Verb::Create => self.create,
            Verb::Read => self.read,
            Verb::Update => self.update,
            Verb::Delete => self.delete,
            Verb::Search => self.search,
        };
        check == PermissionCheck::Allow
    }
}

/// A configured sort option exposed on the search endpoint.
#[derive(Debug, Clone)]
pub struct SortOption {
    /// The field the option sorts by.
    pub field: SortField,
    /// Human-readable title for API consumers.
    pub title: &'static str,
}

/// Completion suggester configuration.
#[derive(Debug, Clone)]
pub struct SuggesterConfig {
    /// Name of the suggester as exposed in responses.
    pub name: &'static str,
    /// The indexed field completions are drawn from.
    pub field: &'static str,
    /// Maximum number of completions returned.
    pub size: usize,
}

/// Search-surface configuration: sort options, default sorts, the facet
/// field and the completion suggester.
///
/// This is configuration data rather than environment-driven settings; the
/// defaults describe the whole search surface.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Sort options callers may request by name.
    pub sort_options: Vec<SortOption>,
    /// Sort applied when the request carries a query string.
    pub default_sort_query: SortDirective,
    /// Sort applied when the request carries no query string.
    pub default_sort_noquery: SortDirective,
    /// The payload field the terms facet and filter run on.
    pub facet_field: &'static str,
    /// The completion suggester over indexed titles.
    pub suggester: SuggesterConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sort_options: vec![
                SortOption {
                    field: SortField::Title,
                    title: "Title",
                },
                SortOption {
                    field: SortField::ControlNumber,
                    title: "Record identifier",
                },
            ],
            default_sort_query: SortDirective::asc(SortField::ControlNumber),
            default_sort_noquery: SortDirective::desc(SortField::ControlNumber),
            facet_field: "type",
            suggester: SuggesterConfig {
                name: "title-complete",
                field: "suggest_title",
                size: 10,
            },
        }
    }
}

impl SearchConfig {
    /// Returns `true` if the field is one of the configured sort options.
    pub fn is_sort_allowed(&self, field: SortField) -> bool {
        self.sort_options.iter().any(|option| option.field == field)
    }
}

/// Server configuration for the Docket REST API.
///
/// This struct can be constructed from command line arguments and
/// environment variables using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "docket")]
#[command(about = "Docket record registry server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "DOCKET_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "DOCKET_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "DOCKET_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Directory for instance-local state (created at startup if absent).
    #[arg(long, env = "DOCKET_INSTANCE_DIR", default_value = "./instance")]
    pub instance_dir: PathBuf,

    /// Database location: a SQLite file path or `:memory:`.
    ///
    /// Defaults to `docket.db` inside the instance directory.
    #[arg(long, env = "DOCKET_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Name of the search index records are indexed into.
    #[arg(long, env = "DOCKET_INDEX_NAME", default_value = "records-record-v1.0.0")]
    pub index_name: String,

    /// Base URL for the server (used in Location headers and result links).
    #[arg(long, env = "DOCKET_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "DOCKET_MAX_BODY_SIZE", default_value = "10485760")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "DOCKET_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "DOCKET_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "DOCKET_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Default page size for search results.
    #[arg(long, env = "DOCKET_DEFAULT_PAGE_SIZE", default_value = "10")]
    pub default_page_size: usize,

    /// Maximum page size for search results.
    #[arg(long, env = "DOCKET_MAX_PAGE_SIZE", default_value = "100")]
    pub max_page_size: usize,

    /// Permission check for record creation.
    #[arg(long, env = "DOCKET_PERMISSION_CREATE", value_enum, default_value = "allow")]
    pub permission_create: PermissionCheck,

    /// Permission check for record reads.
    #[arg(long, env = "DOCKET_PERMISSION_READ", value_enum, default_value = "allow")]
    pub permission_read: PermissionCheck,

    /// Permission check for record updates.
    #[arg(long, env = "DOCKET_PERMISSION_UPDATE", value_enum, default_value = "allow")]
    pub permission_update: PermissionCheck,

    /// Permission check for record deletion.
    #[arg(long, env = "DOCKET_PERMISSION_DELETE", value_enum, default_value = "allow")]
    pub permission_delete: PermissionCheck,

    /// Permission check for search and suggestions.
    #[arg(long, env = "DOCKET_PERMISSION_SEARCH", value_enum, default_value = "allow")]
    pub permission_search: PermissionCheck,

    /// Load the two example records (mint identifiers, index them) at startup.
    #[arg(long, env = "DOCKET_SEED_DEMO", default_value = "false")]
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            instance_dir: PathBuf::from("./instance"),
            database_url: None,
            index_name: "records-record-v1.0.0".to_string(),
            base_url: "http://localhost:8080".to_string(),
            max_body_size: 10 * 1024 * 1024, // 10MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            default_page_size: 10,
            max_page_size: 100,
            permission_create: PermissionCheck::Allow,
            permission_read: PermissionCheck::Allow,
            permission_update: PermissionCheck::Allow,
            permission_delete: PermissionCheck::Allow,
            permission_search: PermissionCheck::Allow,
            seed_demo: false,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolves the database location, defaulting to a file inside the
    /// instance directory.
    pub fn resolved_database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| self.instance_dir.join("docket.db").display().to_string())
    }

    /// Assembles the per-verb permission policy.
    pub fn policy(&self) -> PermissionPolicy {
        PermissionPolicy {
            create: self.permission_create,
            read: self.permission_read,
            update: self.permission_update,
            delete: self.permission_delete,
            search: self.permission_search,
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if self.index_name.is_empty() {
            errors.push("Index name cannot be empty".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            log_level: "debug".to_string(),
            index_name: "testrecords-testrecord-v1.0.0".to_string(),
            base_url: "http://localhost:0".to_string(),
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            default_page_size: 10,
            max_page_size: 100,
            ..Default::default()
        }
    }
}
