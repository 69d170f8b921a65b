use chrono::Utc;
use uuid::Uuid;

const RANDOM_SUFFIX_LEN: usize = 12;

/// A new record id: the current Unix time in milliseconds followed by
/// random hex digits. Holds no shared state, so concurrent callers never
/// contend and rapid calls within one millisecond still differ.
pub(crate) fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let random = Uuid::new_v4().simple().to_string();
    format!("{millis}{}", &random[..RANDOM_SUFFIX_LEN])
}
