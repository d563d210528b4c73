//! # Platform-Specific Implementations
//!
//! Process supervision is tied to one kernel interface and one CPU's debug
//! registers, so the live backend only exists where both are available:
//!
//! - **Linux x86-64**: `ptrace(2)`, `waitpid(2)`, `/proc/<pid>/maps` and the
//!   `u_debugreg` slots of the user area
//!   - See: [ptrace(2) man page](https://man7.org/linux/man-pages/man2/ptrace.2.html)
//!
//! Everything above this module (resolver, encoders, dispatch loop) is
//! platform independent and talks to the backend through
//! [`crate::tracee::Tracee`].

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
pub mod linux;
