mod license_policy;

pub use license_policy::{LicensePolicy, RESTRICTIVE_LICENSES};
