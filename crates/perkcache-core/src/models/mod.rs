//! Data models for the loyalty backend.
//!
//! This module contains all the data structures exchanged with the REST API:
//!
//! - `ApiResponse`, `Paginated`: the response envelope and list pagination
//! - `User`, `Profile`, `App`: accounts and per-app member profiles
//! - `Category`, `Voucher`: the redeemable catalog
//! - `WalletItem`, `HistoryItem`: redeemed vouchers and the point ledger
//! - `LoginRequest`, `LoginResponse`: the identity-for-token exchange
//!
//! The backend speaks snake_case JSON, so field names map directly.

pub mod common;
pub mod login;
pub mod profile;
pub mod voucher;
pub mod wallet;

pub use common::{ApiResponse, ErrorDetail, PageLink, Paginated};
pub use login::{LoginRequest, LoginResponse};
pub use profile::{App, Profile, UpdateProfileRequest, User};
pub use voucher::{Category, Voucher, VouchersQuery};
pub use wallet::{
    HistoryItem, HistoryKind, HistoryMetadata, HistoryQuery, HistoryStatus, RedeemedVoucher,
    WalletItem, WalletQuery, WalletStatus,
};
