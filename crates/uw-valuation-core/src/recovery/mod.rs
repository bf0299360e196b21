//! Retail expense recoveries: each tenant is billed its square-foot share of
//! the retail expenses its lease type admits.

pub mod allocation;

pub use allocation::{
    allocate, allocate_recoveries, RecoveryAllocation, RecoveryPools, TenantRecovery,
};
