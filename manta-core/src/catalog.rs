//! Service catalog
//!
//! The fixed, ordered set of services that make up a Manta deployment, and
//! the image names each service accepts. While images are being renamed from
//! the `manta-` to the `mantav2-` prefix, some services accept both.

/// Name of the application every service belongs to
pub const APPLICATION_NAME: &str = "manta";

/// Major version of the application this tooling deploys
pub const MANTA_VERSION: u64 = 2;

/// Services deployed under the application, in creation order
pub const SERVICES: &[&str] = &[
    "nameservice",
    "postgres",
    "moray",
    "electric-moray",
    "storage",
    "authcache",
    "webapi",
    "loadbalancer",
    "ops",
    "madtom",
    "garbage-collector",
    "prometheus",
    "buckets-postgres",
    "buckets-mdplacement",
    "buckets-api",
    "boray",
    "rebalancer",
    "storinfo",
];

/// Services whose images still carry a legacy name in some channels
const LEGACY_IMAGE_NAMES: &[(&str, &str)] = &[
    ("nameservice", "manta-nameservice"),
    ("moray", "manta-moray"),
    ("electric-moray", "manta-electric-moray"),
    ("authcache", "manta-authcache"),
    ("loadbalancer", "manta-loadbalancer"),
    ("madtom", "manta-madtom"),
    ("prometheus", "manta-prometheus"),
];

/// Image names accepted for `service`, preferred name first
pub fn image_names(service: &str) -> Vec<String> {
    let mut names = vec![format!("mantav2-{}", service)];
    names.extend(
        LEGACY_IMAGE_NAMES
            .iter()
            .filter(|(svc, _)| *svc == service)
            .map(|(_, legacy)| legacy.to_string()),
    );
    names
}
