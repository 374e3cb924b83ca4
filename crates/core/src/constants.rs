use std::time::Duration;

// Environment variables holding the store's endpoint and privileged credential.
pub const ENV_STORE_URL: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

pub const DEFAULT_COLLECTION: &str = "faqs";
pub const DEFAULT_ID_COLUMN: &str = "id";
pub const DEFAULT_ENTITY_LABEL: &str = "FAQ";
pub const DEFAULT_RLS_RPC: &str = "disable_rls";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_ADDRESS: &str = "localhost:8000";

/// Returned in place of any failure that isn't a validation or store-reported error. The cause
/// only ever goes to the server logs.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

// Public APIs
pub const API_PATH: &str = "api";
pub const HEALTHCHECK_PATH: &str = "api/healthcheck";
