// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - WordPress Inventory Library
 * Component inventory and version detection with CPE output
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod cpe;
pub mod errors;
pub mod types;

// Detection infrastructure
pub mod evidence;
pub mod fingerprint;
pub mod http_client;
pub mod limiter;
pub mod refdata;

// Acquisition strategies
pub mod inventory;
pub mod remote;
pub mod shell;

// Opportunistic exposure checks
pub mod audit;
