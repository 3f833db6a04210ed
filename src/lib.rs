//! Binary-side plumbing for the `biotica` CLI: the application shell that
//! couples the kernel to wall-clock frames and save storage.

pub mod app;
