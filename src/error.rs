// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Failures a sweep can survive.  The pure kernel, mapping, and
//! palette are total over their domains and have no error cases of
//! their own; what can actually go wrong is a worker task dying
//! mid-frame or an artifact refusing to hit the disk.

/// The error taxonomy of a sweep.
#[derive(Debug, Fail)]
pub enum Error {
    /// A worker task failed, the frame's remaining tiles were
    /// abandoned, and no sample was recorded for the frame.  The pool
    /// itself survives and the sweep moves on to the next grain size.
    #[fail(display = "frame abandoned: {}", reason)]
    Frame {
        /// What took the frame down.
        reason: String,
    },

    /// An image, report, or plot could not be persisted.  Non-fatal to
    /// the sweep, but the run reports a failure status at the end.
    #[fail(display = "could not write {}: {}", path, reason)]
    Persist {
        /// The artifact that failed to write.
        path: String,
        /// The underlying I/O complaint.
        reason: String,
    },
}

impl Error {
    pub(crate) fn frame<S: Into<String>>(reason: S) -> Error {
        Error::Frame {
            reason: reason.into(),
        }
    }

    pub(crate) fn persist<E: ::std::fmt::Display>(path: &::std::path::Path, cause: E) -> Error {
        Error::Persist {
            path: path.display().to_string(),
            reason: cause.to_string(),
        }
    }
}
