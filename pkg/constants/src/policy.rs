//! Policy model constants.

/// Effective order of a policy declared without one. Sorts last.
pub const POLICY_ORDER_LOWEST: u64 = u64::MAX;

/// Tenant assigned to host endpoints created without an explicit tenant.
pub const DEFAULT_TENANT_ID: u64 = 1;

/// Fixed identity of the IPv4 "match nothing" placeholder set.
pub const GNS_V4_EMPTY_UUID: &str = "00000000-0000-4000-8000-000000000004";

/// Fixed identity of the IPv6 "match nothing" placeholder set.
pub const GNS_V6_EMPTY_UUID: &str = "00000000-0000-4000-8000-000000000006";

pub const GNS_V4_EMPTY_NAME: &str = "v4-empty";
pub const GNS_V6_EMPTY_NAME: &str = "v6-empty";

/// Maximum length of a label name accepted by the selector tokenizer.
pub const MAX_LABEL_NAME_LEN: usize = 512;
