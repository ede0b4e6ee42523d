//! # orca-foundation
//!
//! Foundation layer for Orca:
//! - Core: `Tool` / `ToolContext` traits shared by every layer
//! - Permission: review policy for gated tool actions
//! - Storage: `JsonStore` for global and project JSON files
//! - Config: `OrcaConfig` (global + project merged)
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Agent loop                                  │
//! │     │ tool call                              │
//! │     ▼                                        │
//! │  PermissionService ── Unknown ──► interrupt  │
//! │     │ Granted / AutoApproved                 │
//! │     ▼                                        │
//! │  Tool::execute(input, &dyn ToolContext)      │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod permission;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core
// ============================================================================
pub use core::{Tool, ToolContext, ToolExecutionResult, ToolMeta, ToolResult};

// ============================================================================
// Config
// ============================================================================
pub use config::{
    AgentSettings, DelegationSettings, FilterMode, OrcaConfig, ProcessSettings, ReviewSettings,
    ShellSettings, SubAgentConfig, TaskStoreSettings, ORCA_CONFIG_FILE,
};

// ============================================================================
// Permission
// ============================================================================
pub use permission::{
    DecisionKind, PermissionAction, PermissionActionType, PermissionDeny, PermissionGrant,
    PermissionService, PermissionSettings, PermissionStatus, PERMISSIONS_FILE,
};

// ============================================================================
// Storage
// ============================================================================
pub use storage::{JsonStore, APP_DIR, PROJECT_DIR};
