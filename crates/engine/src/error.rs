// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fatal pipeline errors.

use bitmover_adapters::FsError;
use thiserror::Error;

/// Errors a worker cannot handle in place. Receiving one causes the
/// supervisor to drain the pipeline and exit non-zero. Everything else is
/// classified and handled where it occurs to preserve liveness.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("stage directories span filesystems: {0}")]
    CrossDevice(#[source] FsError),
    #[error("persistent filesystem failure in {component}: {source}")]
    PersistentIo {
        component: &'static str,
        #[source]
        source: FsError,
    },
}
