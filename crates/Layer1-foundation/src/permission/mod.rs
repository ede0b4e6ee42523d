//! Review policy for gated tool actions
//!
//! - `service`: runtime checks and session grants (`PermissionService`)
//! - `settings`: `permissions.json` grants, denies and per-tool decision sets
//! - `decision`: the decisions a reviewer may hand back for a suspended action
//!
//! ```rust,ignore
//! let service = PermissionService::load(&project_root)?;
//! match service.check("write_file", &action) {
//!     PermissionStatus::Granted | PermissionStatus::AutoApproved => { /* run */ }
//!     PermissionStatus::Denied => { /* synthetic denial */ }
//!     PermissionStatus::Unknown => {
//!         let allowed = service.allowed_decisions("write_file");
//!         /* suspend and wait for a reviewer */
//!     }
//! }
//! ```

mod decision;
mod service;
mod settings;

pub use decision::DecisionKind;
pub use service::{PermissionAction, PermissionService, PermissionStatus};
pub use settings::{
    PermissionActionType, PermissionDeny, PermissionGrant, PermissionSettings, PERMISSIONS_FILE,
};
