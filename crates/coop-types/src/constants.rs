//! System-wide constants for the wallet ledger.

/// Tenant used when no coop is configured.
pub const DEFAULT_COOP: &str = "default";

/// Length of deposit reference codes.
pub const DEFAULT_REFERENCE_CODE_LENGTH: usize = 8;

/// Shortest reference code the configuration accepts.
pub const MIN_REFERENCE_CODE_LENGTH: usize = 6;

/// Longest reference code the configuration accepts (bank transfer
/// reference fields are short).
pub const MAX_REFERENCE_CODE_LENGTH: usize = 16;

/// Reference-code alphabet: upper case and digits without the look-alikes
/// `0 O 1 I`.
pub const REFERENCE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Attempts at drawing a reference code not already used by a deposit.
pub const REFERENCE_CODE_ATTEMPTS: usize = 16;

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
