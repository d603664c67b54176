use super::identity::{IdentityPolicy, merge_primary, merge_secondary};
use super::parse::{parse_devicectl, parse_xctrace};
use crate::toolchain::command::{DeviceCtl, xctrace_list_devices};
use crate::toolchain::ToolPathResolver;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use xcpilot_api::{
    CommandRequest, CommandRunner, DeviceRecord, IdentifierKind, PilotError, Result,
};

/// Result of scanning one device listing.
#[derive(Debug)]
pub enum DiscoveryOutcome {
    Found(Vec<DeviceRecord>),
    /// The tool ran but reported no physical devices.
    Empty,
    /// The tool could not be run or exited with an error.
    Unavailable(PilotError),
}

impl DiscoveryOutcome {
    fn from_scan(result: Result<Vec<DeviceRecord>>) -> Self {
        match result {
            Ok(records) if records.is_empty() => DiscoveryOutcome::Empty,
            Ok(records) => DiscoveryOutcome::Found(records),
            Err(e) => DiscoveryOutcome::Unavailable(e),
        }
    }

    /// Records contributed by this source; an unavailable source is logged and contributes none.
    pub fn into_records(self, source: &str) -> Vec<DeviceRecord> {
        match self {
            DiscoveryOutcome::Found(records) => records,
            DiscoveryOutcome::Empty => {
                debug!("{} reported no devices", source);
                Vec::new()
            }
            DiscoveryOutcome::Unavailable(e) => {
                warn!("{} device discovery failed: {}", source, e);
                Vec::new()
            }
        }
    }
}

struct DeviceSnapshot {
    devices: Vec<DeviceRecord>,
    captured_at: Instant,
}

/// Discovers physical devices and answers lookups by name, UDID or CoreDevice id.
///
/// One discovery cycle runs `xctrace` then `devicectl` and reconciles the two
/// listings. The result is cached for `ttl`; the cache is only ever replaced whole.
pub struct DeviceRegistry {
    runner: Arc<dyn CommandRunner>,
    tools: Arc<ToolPathResolver>,
    policy: Box<dyn IdentityPolicy>,
    ttl: Duration,
    timeout: Duration,
    // Held across a discovery cycle so concurrent callers share one scan.
    snapshot: Mutex<Option<DeviceSnapshot>>,
}

impl DeviceRegistry {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        tools: Arc<ToolPathResolver>,
        policy: Box<dyn IdentityPolicy>,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            tools,
            policy,
            ttl,
            timeout,
            snapshot: Mutex::new(None),
        }
    }

    pub async fn all_devices(&self, force_refresh: bool) -> Vec<DeviceRecord> {
        let mut snapshot = self.snapshot.lock().await;

        if !force_refresh {
            if let Some(cached) = snapshot.as_ref() {
                if cached.captured_at.elapsed() < self.ttl {
                    debug!("Serving {} cached device(s)", cached.devices.len());
                    return cached.devices.clone();
                }
            }
        }

        let mut devices = Vec::new();
        for sighting in self.scan_xctrace().await.into_records("xctrace") {
            merge_primary(&mut devices, sighting);
        }
        for sighting in self.scan_devicectl().await.into_records("devicectl") {
            merge_secondary(&mut devices, sighting, self.policy.as_ref());
        }

        info!(
            "Discovered {} device(s), {} with both identifiers",
            devices.len(),
            devices.iter().filter(|d| d.is_reconciled()).count()
        );
        *snapshot = Some(DeviceSnapshot {
            devices: devices.clone(),
            captured_at: Instant::now(),
        });
        devices
    }

    pub async fn scan_xctrace(&self) -> DiscoveryOutcome {
        let request = CommandRequest::new(xctrace_list_devices()).with_timeout(self.timeout);
        let result = self
            .runner
            .execute(request)
            .await
            .map(|out| parse_xctrace(&out.combined()));
        DiscoveryOutcome::from_scan(result)
    }

    pub async fn scan_devicectl(&self) -> DiscoveryOutcome {
        let devicectl = self.tools.resolve(None).await;
        let request = CommandRequest::new(DeviceCtl::new(&devicectl).list_devices())
            .with_timeout(self.timeout);
        let result = self
            .runner
            .execute(request)
            .await
            .map(|out| parse_devicectl(&out.stdout));
        DiscoveryOutcome::from_scan(result)
    }

    /// Resolve a device by UDID, CoreDevice id, exact name, then partial name.
    pub async fn find_device(&self, name_or_id: &str) -> Result<DeviceRecord> {
        let devices = self.all_devices(false).await;
        lookup(&devices, name_or_id)
            .cloned()
            .ok_or_else(|| PilotError::DeviceNotFound(name_or_id.to_string()))
    }

    pub async fn find_udid(&self, name_or_id: &str) -> Result<String> {
        let device = self.find_device(name_or_id).await?;
        device.require(IdentifierKind::Primary).map(str::to_string)
    }

    pub async fn find_coredevice_id(&self, name_or_id: &str) -> Result<String> {
        let device = self.find_device(name_or_id).await?;
        device.require(IdentifierKind::Secondary).map(str::to_string)
    }

    #[cfg(test)]
    async fn backdate(&self, by: Duration) {
        if let Some(snapshot) = self.snapshot.lock().await.as_mut() {
            snapshot.captured_at -= by;
        }
    }
}

/// First rule that matches wins; within a rule, list order decides.
pub fn lookup<'a>(devices: &'a [DeviceRecord], query: &str) -> Option<&'a DeviceRecord> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    devices
        .iter()
        .find(|d| d.udid.as_deref() == Some(query))
        .or_else(|| devices.iter().find(|d| d.coredevice_id.as_deref() == Some(query)))
        .or_else(|| devices.iter().find(|d| d.name == query))
        .or_else(|| {
            devices
                .iter()
                .find(|d| d.name.contains(query) || query.contains(d.name.as_str()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NameContainment;
    use crate::test_support::{Reply, ScriptedRunner};
    use crate::toolchain::InstallationLocator;

    const XCTRACE: &str = "\
== Devices ==
Jane's iPhone (17.4) (AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE)
Jane (17.0) (11111111-2222-3333-4444-555555555555)
== Simulators ==
iPhone 15 Simulator (17.4) (99999999-2222-3333-4444-555555555555)
";

    const DEVICECTL: &str = "\
Name            Hostname                        Identifier                  State                Model
-------------   -----------------------------   -------------------------   ------------------   -----
Jane's iPhone   Janes-iPhone.coredevice.local   00008110-001234567890ABCD   available (paired)   iPhone 15 Pro (iPhone16,1)
John's iPad     Johns-iPad.coredevice.local     00008103-000A1B2C3D4E5F60   available (paired)   iPad Pro (iPad13,4)
";

    fn registry(runner: Arc<ScriptedRunner>, apps: &std::path::Path) -> DeviceRegistry {
        let locator = Arc::new(InstallationLocator::new(
            apps.to_path_buf(),
            apps.join("Xcode.app"),
            runner.clone(),
            Duration::from_secs(5),
        ));
        DeviceRegistry::new(
            runner,
            Arc::new(ToolPathResolver::new(locator)),
            Box::new(NameContainment),
            Duration::from_secs(300),
            Duration::from_secs(5),
        )
    }

    fn scripted() -> Arc<ScriptedRunner> {
        Arc::new(
            ScriptedRunner::new()
                .on("xctrace list devices", XCTRACE)
                .on(" list devices", DEVICECTL),
        )
    }

    #[tokio::test]
    async fn test_reconciles_both_sources() {
        let temp = tempfile::tempdir().unwrap();
        let runner = scripted();
        let devices = registry(runner.clone(), temp.path()).all_devices(false).await;

        assert_eq!(devices.len(), 3);
        let jane_phone = &devices[0];
        assert_eq!(jane_phone.name, "Jane's iPhone");
        assert_eq!(
            jane_phone.udid.as_deref(),
            Some("AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE")
        );
        assert_eq!(
            jane_phone.coredevice_id.as_deref(),
            Some("00008110-001234567890ABCD")
        );
        assert_eq!(jane_phone.model.as_deref(), Some("iPhone16,1"));

        assert_eq!(devices[1].name, "Jane");
        assert!(devices[1].coredevice_id.is_none());
        assert_eq!(devices[2].name, "John's iPad");
        assert!(devices[2].udid.is_none());
    }

    #[tokio::test]
    async fn test_cached_within_ttl() {
        let temp = tempfile::tempdir().unwrap();
        let runner = scripted();
        let registry = registry(runner.clone(), temp.path());

        let first = registry.all_devices(false).await;
        let scans = runner.count("list devices");
        let second = registry.all_devices(false).await;

        assert_eq!(first, second);
        assert_eq!(scans, 2);
        assert_eq!(runner.count("list devices"), scans);
    }

    #[tokio::test]
    async fn test_expired_cache_rediscovers() {
        let temp = tempfile::tempdir().unwrap();
        let runner = scripted();
        let registry = registry(runner.clone(), temp.path());

        registry.all_devices(false).await;
        registry.backdate(Duration::from_secs(301)).await;
        registry.all_devices(false).await;

        assert_eq!(runner.count("xctrace list devices"), 2);
        assert_eq!(runner.count("devicectl"), 2);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let temp = tempfile::tempdir().unwrap();
        let runner = scripted();
        let registry = registry(runner.clone(), temp.path());

        registry.all_devices(false).await;
        registry.all_devices(true).await;
        assert_eq!(runner.count("xctrace list devices"), 2);
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .fail("xctrace list devices", "xcrun: error: unable to find utility")
                .on(" list devices", DEVICECTL),
        );
        let registry = registry(runner.clone(), temp.path());

        assert!(matches!(
            registry.scan_xctrace().await,
            DiscoveryOutcome::Unavailable(_)
        ));
        let devices = registry.all_devices(true).await;
        assert_eq!(devices.len(), 2);
        assert!(devices.iter().all(|d| d.udid.is_none()));
    }

    #[tokio::test]
    async fn test_empty_listing_is_distinct_from_failure() {
        let temp = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("xctrace list devices", "== Devices ==\n== Simulators ==\n")
                .script(" list devices", vec![Reply::Timeout]),
        );
        let registry = registry(runner, temp.path());

        assert!(matches!(registry.scan_xctrace().await, DiscoveryOutcome::Empty));
        assert!(matches!(
            registry.scan_devicectl().await,
            DiscoveryOutcome::Unavailable(PilotError::Timeout { .. })
        ));
        assert!(registry.all_devices(false).await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_precedence() {
        let temp = tempfile::tempdir().unwrap();
        let registry = registry(scripted(), temp.path());

        // "Jane" is both an exact name and a substring of "Jane's iPhone"
        let device = registry.find_device("Jane").await.unwrap();
        assert_eq!(device.name, "Jane");

        let device = registry.find_device("00008103-000A1B2C3D4E5F60").await.unwrap();
        assert_eq!(device.name, "John's iPad");

        let device = registry.find_device("iPad").await.unwrap();
        assert_eq!(device.name, "John's iPad");

        assert!(matches!(
            registry.find_device("Pixel").await,
            Err(PilotError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_identifier_beats_name_substring() {
        let uuid = "AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE";
        let decoy = DeviceRecord::new(format!("Lab rig {uuid}"));
        let mut target = DeviceRecord::new("Jane's iPhone");
        target.udid = Some(uuid.to_string());

        let devices = vec![decoy, target];
        assert_eq!(lookup(&devices, uuid).unwrap().name, "Jane's iPhone");
    }

    #[tokio::test]
    async fn test_missing_identifier() {
        let temp = tempfile::tempdir().unwrap();
        let registry = registry(scripted(), temp.path());

        assert_eq!(
            registry.find_udid("Jane's iPhone").await.unwrap(),
            "AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE"
        );
        assert!(matches!(
            registry.find_udid("John's iPad").await,
            Err(PilotError::MissingIdentifier {
                kind: IdentifierKind::Primary,
                ..
            })
        ));
        assert!(matches!(
            registry.find_coredevice_id("Jane").await,
            Err(PilotError::MissingIdentifier {
                kind: IdentifierKind::Secondary,
                ..
            })
        ));
    }
}
