//! Members of host types that hide them from reflection.
//!
//! Some built-in host types keep their state in slots that reflection does
//! not report. For those, member descriptors are synthesized from a fixed
//! table and read through the introspector like any other property.

use phf::phf_map;
use spyglass_foundation::Visibility;

static HIDDEN_MEMBERS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "Timestamp" => &["date", "zone_type", "zone"],
    "TimeZone" => &["zone_type", "zone"],
    "Interval" => &["years", "months", "days", "hours", "minutes", "seconds", "micros", "invert", "total_days"],
    "Period" => &["start", "current", "end", "interval", "recurrences", "include_start"],
    "ArrayView" => &["storage"],
    "ArrayCursor" => &["storage"],
    "ObjectStore" => &["storage"],
};

static FORCED_PROTECTED: &[(&str, &str)] = &[("ArrayView", "storage"), ("ArrayCursor", "storage")];

/// Member names a hiding type exposes, in table order.
#[must_use]
pub fn hidden_members(type_name: &str) -> &'static [&'static str] {
    HIDDEN_MEMBERS.get(type_name).copied().unwrap_or(&[])
}

/// Visibility to report for a synthesized member.
#[must_use]
pub fn visibility_of(type_name: &str, member: &str) -> Visibility {
    if FORCED_PROTECTED
        .iter()
        .any(|&(t, m)| t == type_name && m == member)
    {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}
