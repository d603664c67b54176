//! Reconciliation of `xctrace` and `devicectl` sightings.

use xcpilot_api::DeviceRecord;

/// Decides whether two display names denote the same physical device.
///
/// The two listings share no identifier, so names are all there is to go on.
pub trait IdentityPolicy: Send + Sync {
    fn same_device(&self, known: &str, sighted: &str) -> bool;
}

/// Exact match, or either name contained in the other (case-sensitive).
///
/// Ambiguous by nature: "iPhone" and "Jane's iPhone 15" are treated as one device.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameContainment;

impl IdentityPolicy for NameContainment {
    fn same_device(&self, known: &str, sighted: &str) -> bool {
        known == sighted || known.contains(sighted) || sighted.contains(known)
    }
}

/// Add an `xctrace` sighting, merging into a record with the same name.
pub fn merge_primary(records: &mut Vec<DeviceRecord>, sighting: DeviceRecord) {
    match records.iter_mut().find(|r| r.name == sighting.name) {
        Some(existing) => {
            if existing.udid.is_none() {
                existing.udid = sighting.udid;
            }
        }
        None => records.push(sighting),
    }
}

/// Add a `devicectl` sighting.
///
/// A record with exactly the same name wins; otherwise the first record the policy
/// matches, in list order.
pub fn merge_secondary(
    records: &mut Vec<DeviceRecord>,
    sighting: DeviceRecord,
    policy: &dyn IdentityPolicy,
) {
    let target = records
        .iter()
        .position(|r| r.name == sighting.name)
        .or_else(|| {
            records
                .iter()
                .position(|r| policy.same_device(&r.name, &sighting.name))
        });
    match target.map(|i| &mut records[i]) {
        Some(existing) => {
            existing.coredevice_id = sighting.coredevice_id;
            existing.available |= sighting.available;
            if existing.model.is_none() {
                existing.model = sighting.model;
            }
            if existing.os_version.is_none() {
                existing.os_version = sighting.os_version;
            }
        }
        None => records.push(sighting),
    }
}
